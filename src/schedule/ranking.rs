use super::eligibility::is_eligible;
use super::instance::{AssignmentState, Instance};
use super::types::Caps;

/// Rank used for activities a participant never listed and for participants
/// without a tryout result. Larger than any real rank.
pub const UNRANKED: usize = usize::MAX;

/// Sort key for one candidate; lower sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CandidateKey {
    pub preference: usize,
    pub performance: usize,
    pub group_penalty: u8,
    pub load: usize,
}

pub fn candidate_key(p: usize, a: usize, state: &AssignmentState, instance: &Instance) -> CandidateKey {
    let group_penalty = match instance.group_of(a) {
        Some(group) if state.held(p).iter().any(|&other| instance.group_of(other) == Some(group)) => 0,
        _ => 1,
    };
    CandidateKey {
        preference: instance.preference_rank(p, a).unwrap_or(UNRANKED),
        performance: instance.performance_rank(p, a).unwrap_or(UNRANKED),
        group_penalty,
        load: state.held(p).len(),
    }
}

/// Eligible participants for activity `a`, best candidate first.
/// Full ties keep roster order.
pub fn candidates_for(a: usize, state: &AssignmentState, instance: &Instance, caps: &Caps) -> Vec<usize> {
    let mut candidates: Vec<(CandidateKey, usize)> = (0..instance.participant_count())
        .filter(|&p| is_eligible(p, a, state, instance, caps))
        .map(|p| (candidate_key(p, a, state, instance), p))
        .collect();
    candidates.sort_by_key(|(key, _)| *key);
    candidates.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::schedule::types::{Activity, AffinityGroup, Participant, Problem};

    fn names(inst: &Instance, ps: &[usize]) -> Vec<String> {
        ps.iter().map(|&p| inst.participant_id(p).to_string()).collect()
    }

    #[test]
    fn preference_then_performance_then_roster_order() {
        let problem = Problem {
            participants: vec![
                Participant::new("Cleo", &[]),
                Participant::new("Dev", &["Circuit Lab"]),
                Participant::new("Eli", &["Circuit Lab"]),
                Participant::new("Fay", &[]),
            ],
            activities: vec![Activity::new("Circuit Lab", 2, Some("Block 6"))],
            performance: HashMap::from([(
                "Circuit Lab".to_string(),
                vec!["Eli".to_string(), "Dev".to_string()],
            )]),
            ..Problem::default()
        };
        let inst = Instance::resolve(&problem).unwrap();
        let state = AssignmentState::new(&inst);
        let circuit = inst.activity("Circuit Lab").unwrap();
        let ranked = candidates_for(circuit, &state, &inst, &Caps::default());
        assert_eq!(names(&inst, &ranked), vec!["Eli", "Dev", "Cleo", "Fay"]);
    }

    #[test]
    fn group_match_and_load_break_ties() {
        let problem = Problem {
            participants: vec![
                Participant::new("Gus", &[]),
                Participant::new("Hal", &[]),
                Participant::new("Ivy", &[]),
            ],
            activities: vec![
                Activity::new("Rocks and Minerals", 1, Some("Block 5")),
                Activity::new("Dynamic Planet", 1, Some("Block 6")),
                Activity::new("Codebusters", 1, None),
                Activity::new("Forensics", 1, Some("Block 2")),
                Activity::new("Astronomy", 1, Some("Block 1")),
            ],
            affinity_groups: vec![AffinityGroup {
                name: "Group1".into(),
                activities: vec!["Rocks and Minerals".into(), "Dynamic Planet".into()],
            }],
            ..Problem::default()
        };
        let inst = Instance::resolve(&problem).unwrap();
        let mut state = AssignmentState::new(&inst);
        let gus = inst.participant("Gus").unwrap();
        let hal = inst.participant("Hal").unwrap();
        let ivy = inst.participant("Ivy").unwrap();

        // Ivy holds a related activity, Hal holds two unrelated ones, Gus holds one
        state.place(ivy, inst.activity("Rocks and Minerals").unwrap());
        state.place(hal, inst.activity("Codebusters").unwrap());
        state.place(hal, inst.activity("Forensics").unwrap());
        state.place(gus, inst.activity("Astronomy").unwrap());

        let planet = inst.activity("Dynamic Planet").unwrap();
        let ranked = candidates_for(planet, &state, &inst, &Caps::default());
        assert_eq!(names(&inst, &ranked), vec!["Ivy", "Gus", "Hal"]);
    }

    #[test]
    fn unranked_sorts_last_but_stays_eligible() {
        let problem = Problem {
            participants: vec![Participant::new("Jo", &[]), Participant::new("Kim", &["Astronomy"])],
            activities: vec![Activity::new("Astronomy", 1, None)],
            ..Problem::default()
        };
        let inst = Instance::resolve(&problem).unwrap();
        let state = AssignmentState::new(&inst);
        let jo = inst.participant("Jo").unwrap();
        let astro = inst.activity("Astronomy").unwrap();
        let key = candidate_key(jo, astro, &state, &inst);
        assert_eq!(key.preference, UNRANKED);
        assert_eq!(key.performance, UNRANKED);
        assert_eq!(names(&inst, &candidates_for(astro, &state, &inst, &Caps::default())), vec!["Kim", "Jo"]);
    }

    #[test]
    fn no_eligible_participant_gives_empty_list() {
        let problem = Problem {
            participants: vec![Participant::new("Lou", &["Astronomy"])],
            activities: vec![Activity::new("Astronomy", 1, None)],
            ..Problem::default()
        };
        let inst = Instance::resolve(&problem).unwrap();
        let state = AssignmentState::new(&inst);
        let caps = Caps { max_per_participant: 0, max_builds: 0 };
        assert!(candidates_for(inst.activity("Astronomy").unwrap(), &state, &inst, &caps).is_empty());
    }
}
