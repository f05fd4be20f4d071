use std::collections::{HashMap, HashSet};
use crate::error::SolveError;
use super::types::{Assignment, Problem};

/// A `Problem` with every name resolved to an index.
///
/// Participants and activities keep their roster order, so index order is
/// declaration order. Block and affinity-group lookups are built here once
/// and never looked up by name again during the search.
#[derive(Debug)]
pub struct Instance<'a> {
    pub problem: &'a Problem,
    participant_index: HashMap<&'a str, usize>,
    activity_index: HashMap<&'a str, usize>,
    block_of: Vec<Option<usize>>,
    group_of: Vec<Option<usize>>,
    build: Vec<bool>,
    pref_rank: Vec<HashMap<usize, usize>>,  // participant -> activity -> rank
    perf_rank: Vec<HashMap<usize, usize>>,  // activity -> participant -> rank
    ranked_count: Vec<usize>,
    banned_activities: HashSet<(usize, usize)>,
    banned_peers: Vec<Vec<usize>>,
    links: Vec<Vec<usize>>,
    mandatory: Vec<(usize, usize)>,
}

impl<'a> Instance<'a> {
    /// Resolves every rule against the roster. Dangling names fail here,
    /// before any search work happens.
    pub fn resolve(problem: &'a Problem) -> Result<Self, SolveError> {
        let mut participant_index = HashMap::new();
        for (i, p) in problem.participants.iter().enumerate() {
            if participant_index.insert(p.id.as_str(), i).is_some() {
                return Err(SolveError::DuplicateParticipant(p.id.clone()));
            }
        }
        let mut activity_index = HashMap::new();
        for (i, a) in problem.activities.iter().enumerate() {
            if activity_index.insert(a.id.as_str(), i).is_some() {
                return Err(SolveError::DuplicateActivity(a.id.clone()));
            }
        }

        let participant = |name: &str, context: &'static str| {
            participant_index
                .get(name)
                .copied()
                .ok_or_else(|| SolveError::UnknownParticipant {
                    participant: name.to_string(),
                    context,
                })
        };
        let activity = |name: &str, context: &'static str| {
            activity_index
                .get(name)
                .copied()
                .ok_or_else(|| SolveError::UnknownActivity {
                    activity: name.to_string(),
                    context,
                })
        };

        let rules = &problem.rules;
        let mut mandatory = Vec::with_capacity(rules.mandatory.len());
        for (p, a) in &rules.mandatory {
            mandatory.push((participant(p, "mandatory rule")?, activity(a, "mandatory rule")?));
        }

        let mut banned_activities = HashSet::new();
        for (p, a) in &rules.banned_activities {
            banned_activities.insert((participant(p, "banned rule")?, activity(a, "banned rule")?));
        }

        let mut banned_peers = vec![Vec::new(); problem.participants.len()];
        for (a, b) in &rules.banned_peers {
            let a = participant(a, "banned pair")?;
            let b = participant(b, "banned pair")?;
            banned_peers[a].push(b);
            banned_peers[b].push(a);
        }

        let mut links: Vec<Vec<usize>> = vec![Vec::new(); problem.activities.len()];
        for (a, b) in &rules.pair_together {
            let a = activity(a, "pair-together rule")?;
            let b = activity(b, "pair-together rule")?;
            if !links[a].contains(&b) {
                links[a].push(b);
            }
            if !links[b].contains(&a) {
                links[b].push(a);
            }
        }

        // Blocks and groups become small integer ids
        let mut block_ids: HashMap<&str, usize> = HashMap::new();
        let block_of = problem
            .activities
            .iter()
            .map(|a| {
                a.block.as_deref().map(|b| {
                    let next = block_ids.len();
                    *block_ids.entry(b).or_insert(next)
                })
            })
            .collect();

        let mut group_of = vec![None; problem.activities.len()];
        for (gi, group) in problem.affinity_groups.iter().enumerate() {
            for name in &group.activities {
                match activity_index.get(name.as_str()) {
                    Some(&ai) => group_of[ai] = Some(gi),
                    None => tracing::debug!(group = %group.name, activity = %name, "affinity group names an unknown activity"),
                }
            }
        }

        let pref_rank = problem
            .participants
            .iter()
            .map(|p| {
                let mut ranks = HashMap::new();
                for (rank, name) in p.preferences.iter().enumerate() {
                    if let Some(&ai) = activity_index.get(name.as_str()) {
                        ranks.entry(ai).or_insert(rank);
                    }
                }
                ranks
            })
            .collect();

        let mut perf_rank = vec![HashMap::new(); problem.activities.len()];
        for (name, ranking) in &problem.performance {
            let Some(&ai) = activity_index.get(name.as_str()) else {
                tracing::debug!(activity = %name, "performance ranking for an activity that is not offered");
                continue;
            };
            for (rank, p) in ranking.iter().enumerate() {
                if let Some(&pi) = participant_index.get(p.as_str()) {
                    perf_rank[ai].entry(pi).or_insert(rank);
                }
            }
        }
        let ranked_count = perf_rank.iter().map(|r| r.len()).collect();

        Ok(Instance {
            problem,
            build: problem.activities.iter().map(|a| a.build).collect(),
            participant_index,
            activity_index,
            block_of,
            group_of,
            pref_rank,
            perf_rank,
            ranked_count,
            banned_activities,
            banned_peers,
            links,
            mandatory,
        })
    }

    pub fn participant_count(&self) -> usize {
        self.problem.participants.len()
    }

    pub fn activity_count(&self) -> usize {
        self.problem.activities.len()
    }

    pub fn participant_id(&self, p: usize) -> &'a str {
        &self.problem.participants[p].id
    }

    pub fn activity_id(&self, a: usize) -> &'a str {
        &self.problem.activities[a].id
    }

    pub fn participant(&self, name: &str) -> Option<usize> {
        self.participant_index.get(name).copied()
    }

    pub fn activity(&self, name: &str) -> Option<usize> {
        self.activity_index.get(name).copied()
    }

    pub fn capacity(&self, a: usize) -> u32 {
        self.problem.activities[a].capacity
    }

    pub fn block_of(&self, a: usize) -> Option<usize> {
        self.block_of[a]
    }

    pub fn group_of(&self, a: usize) -> Option<usize> {
        self.group_of[a]
    }

    pub fn is_build(&self, a: usize) -> bool {
        self.build[a]
    }

    pub fn preference_rank(&self, p: usize, a: usize) -> Option<usize> {
        self.pref_rank[p].get(&a).copied()
    }

    pub fn performance_rank(&self, p: usize, a: usize) -> Option<usize> {
        self.perf_rank[a].get(&p).copied()
    }

    /// True when exactly one participant has a tryout result for `a`
    pub fn has_single_tryout(&self, a: usize) -> bool {
        self.ranked_count[a] == 1
    }

    pub fn is_banned(&self, p: usize, a: usize) -> bool {
        self.banned_activities.contains(&(p, a))
    }

    pub fn banned_peers(&self, p: usize) -> &[usize] {
        &self.banned_peers[p]
    }

    pub fn links(&self, a: usize) -> &[usize] {
        &self.links[a]
    }

    pub fn mandatory(&self) -> &[(usize, usize)] {
        &self.mandatory
    }

    /// One entry per slot, grouped by activity in roster order
    pub fn initial_slots(&self) -> Vec<usize> {
        self.problem
            .activities
            .iter()
            .enumerate()
            .flat_map(|(ai, a)| std::iter::repeat(ai).take(a.capacity as usize))
            .collect()
    }
}

/// Mutable partial assignment owned by one search run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentState {
    held: Vec<Vec<usize>>,
    remaining: Vec<u32>,
}

impl AssignmentState {
    pub fn new(instance: &Instance) -> Self {
        AssignmentState {
            held: vec![Vec::new(); instance.participant_count()],
            remaining: (0..instance.activity_count()).map(|a| instance.capacity(a)).collect(),
        }
    }

    pub fn held(&self, p: usize) -> &[usize] {
        &self.held[p]
    }

    pub fn holds(&self, p: usize, a: usize) -> bool {
        self.held[p].contains(&a)
    }

    pub fn remaining(&self, a: usize) -> u32 {
        self.remaining[a]
    }

    /// Callers check eligibility first; this only does the bookkeeping
    pub fn place(&mut self, p: usize, a: usize) {
        debug_assert!(self.remaining[a] > 0, "placing into a full activity");
        debug_assert!(!self.holds(p, a), "participant already holds activity");
        self.held[p].push(a);
        self.remaining[a] -= 1;
    }

    pub fn unplace(&mut self, p: usize, a: usize) {
        if let Some(pos) = self.held[p].iter().position(|&x| x == a) {
            self.held[p].remove(pos);
            self.remaining[a] += 1;
        } else {
            debug_assert!(false, "unplacing an activity that is not held");
        }
    }

    /// Undoes a commit trail, newest first
    pub fn rollback(&mut self, trail: &[(usize, usize)]) {
        for &(p, a) in trail.iter().rev() {
            self.unplace(p, a);
        }
    }

    pub fn to_assignment(&self, instance: &Instance) -> Assignment {
        let by_participant = self
            .held
            .iter()
            .enumerate()
            .map(|(p, acts)| {
                (
                    instance.participant_id(p).to_string(),
                    acts.iter().map(|&a| instance.activity_id(a).to_string()).collect(),
                )
            })
            .collect();
        Assignment { by_participant }
    }
}
