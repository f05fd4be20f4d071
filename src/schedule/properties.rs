//! Invariants every solved roster must satisfy, checked on random small rosters.

use std::collections::HashMap;
use proptest::prelude::*;
use super::types::*;
use super::solve;

fn roster() -> impl Strategy<Value = (Problem, Caps)> {
    (2usize..6, 1usize..5).prop_flat_map(|(n, m)| {
        (
            prop::collection::vec((0u32..3, prop::option::of(0usize..3), any::<bool>()), m),
            prop::collection::vec(prop::collection::vec(0..m, 0..4), n),
            prop::collection::vec(prop::collection::vec(0..n, 0..3), m),
            prop::collection::vec((0..n, 0..m), 0..2),
            prop::collection::vec((0..n, 0..m), 0..3),
            prop::collection::vec((0..n, 0..n), 0..2),
            prop::collection::vec((0..m, 0..m), 0..2),
            prop::collection::vec(0..m, 0..3),
            (1usize..4, 0usize..3),
        )
            .prop_map(move |(acts, prefs, perf, mandatory, banned, peers, links, group, (cap, builds))| {
                let s = |i: usize| format!("S{i}");
                let e = |i: usize| format!("E{i}");
                let problem = Problem {
                    participants: prefs
                        .iter()
                        .enumerate()
                        .map(|(i, p)| Participant {
                            id: s(i),
                            preferences: p.iter().map(|&a| e(a)).collect(),
                        })
                        .collect(),
                    activities: acts
                        .iter()
                        .enumerate()
                        .map(|(i, &(capacity, block, build))| Activity {
                            id: e(i),
                            capacity,
                            block: block.map(|b| format!("Block {b}")),
                            build,
                        })
                        .collect(),
                    performance: perf
                        .iter()
                        .enumerate()
                        .map(|(a, ps)| (e(a), ps.iter().map(|&p| s(p)).collect()))
                        .collect::<HashMap<_, _>>(),
                    affinity_groups: vec![AffinityGroup {
                        name: "Group1".into(),
                        activities: group.iter().map(|&a| e(a)).collect(),
                    }],
                    rules: RuleSet {
                        mandatory: mandatory.iter().map(|&(p, a)| (s(p), e(a))).collect(),
                        banned_activities: banned.iter().map(|&(p, a)| (s(p), e(a))).collect(),
                        banned_peers: peers.iter().map(|&(a, b)| (s(a), s(b))).collect(),
                        pair_together: links.iter().map(|&(a, b)| (e(a), e(b))).collect(),
                    },
                };
                let caps = Caps {
                    max_per_participant: cap,
                    max_builds: builds,
                };
                (problem, caps)
            })
    })
}

fn check_invariants(problem: &Problem, caps: &Caps, assignment: &Assignment) -> Result<(), TestCaseError> {
    let build: HashMap<&str, bool> = problem.activities.iter().map(|a| (a.id.as_str(), a.build)).collect();
    let block: HashMap<&str, Option<&str>> = problem
        .activities
        .iter()
        .map(|a| (a.id.as_str(), a.block.as_deref()))
        .collect();

    for activity in &problem.activities {
        prop_assert_eq!(assignment.holders_of(&activity.id).len(), activity.capacity as usize);
    }

    for (participant, held) in &assignment.by_participant {
        prop_assert!(held.len() <= caps.max_per_participant);
        prop_assert!(held.iter().filter(|a| build[a.as_str()]).count() <= caps.max_builds);
        for (i, a) in held.iter().enumerate() {
            for b in &held[i + 1..] {
                prop_assert_ne!(a, b);
                if let Some(blk) = block[a.as_str()] {
                    prop_assert_ne!(Some(blk), block[b.as_str()]);
                }
            }
        }
        for (p, a) in &problem.rules.banned_activities {
            prop_assert!(!(p == participant && held.contains(a)));
        }
    }

    for (a, b) in &problem.rules.banned_peers {
        if a == b {
            continue;
        }
        for activity in assignment.activities_of(a) {
            prop_assert!(!assignment.holds(b, activity));
        }
    }

    for (p, a) in &problem.rules.mandatory {
        prop_assert!(assignment.holds(p, a));
    }

    for (a, b) in &problem.rules.pair_together {
        for participant in problem.participants.iter().map(|p| p.id.as_str()) {
            prop_assert_eq!(assignment.holds(participant, a), assignment.holds(participant, b));
        }
    }

    Ok(())
}

proptest! {
    #[test]
    fn solved_rosters_respect_every_hard_constraint((problem, caps) in roster()) {
        let budget = SearchBudget { node_limit: Some(5_000), time_limit: None };
        if let Ok(report) = solve(&problem, &caps, &budget) {
            if let Some(assignment) = report.assignment() {
                check_invariants(&problem, &caps, assignment)?;
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical((problem, caps) in roster()) {
        let budget = SearchBudget { node_limit: Some(5_000), time_limit: None };
        let first = solve(&problem, &caps, &budget);
        let second = solve(&problem, &caps, &budget);
        match (first, second) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a.outcome, b.outcome),
            (Err(a), Err(b)) => prop_assert_eq!(a, b),
            _ => prop_assert!(false, "runs disagree on success"),
        }
    }
}
