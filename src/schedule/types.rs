use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use serde::{Serialize, Deserialize};

/// A participant with activities ordered best-first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub preferences: Vec<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, preferences: &[&str]) -> Self {
        Participant {
            id: id.into(),
            preferences: preferences.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// An activity with a number of slots to fill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub capacity: u32,
    /// Conflict block; `None` conflicts with nothing
    pub block: Option<String>,
    pub build: bool,
}

impl Activity {
    pub fn new(id: impl Into<String>, capacity: u32, block: Option<&str>) -> Self {
        Activity {
            id: id.into(),
            capacity,
            block: block.map(|b| b.to_string()),
            build: false,
        }
    }

    pub fn build(mut self) -> Self {
        self.build = true;
        self
    }
}

/// Hard rules layered on top of capacities and blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// (participant, activity) pairs committed before the search starts
    pub mandatory: Vec<(String, String)>,
    /// (participant, activity) pairs that may never be assigned
    pub banned_activities: Vec<(String, String)>,
    /// (participant, participant) pairs that may never share an activity
    pub banned_peers: Vec<(String, String)>,
    /// Symmetric (activity, activity) links that must be held together
    pub pair_together: Vec<(String, String)>,
}

/// Named cluster of related activities, only used as a tie-break
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinityGroup {
    pub name: String,
    pub activities: Vec<String>,
}

/// Everything the search needs, as produced by the loader
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Problem {
    pub participants: Vec<Participant>,
    pub activities: Vec<Activity>,
    /// activity -> participants ordered best tryout first
    pub performance: HashMap<String, Vec<String>>,
    pub affinity_groups: Vec<AffinityGroup>,
    pub rules: RuleSet,
}

impl Problem {
    pub fn total_slots(&self) -> u64 {
        self.activities.iter().map(|a| a.capacity as u64).sum()
    }

    /// Smallest number of activities per participant that could fill every slot
    pub fn minimum_load(&self) -> u64 {
        let n = self.participants.len() as u64;
        if n == 0 {
            return 0;
        }
        self.total_slots().div_ceil(n)
    }

    pub fn preference_rank(&self, participant: &str, activity: &str) -> Option<usize> {
        self.participants
            .iter()
            .find(|p| p.id == participant)
            .and_then(|p| p.preferences.iter().position(|a| a == activity))
    }
}

/// Per-participant limits applied in every eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Caps {
    pub max_per_participant: usize,
    pub max_builds: usize,
}

impl Default for Caps {
    fn default() -> Self {
        Caps {
            max_per_participant: 4,
            max_builds: 2,
        }
    }
}

/// Optional bounds on how long the search may run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBudget {
    pub node_limit: Option<u64>,
    pub time_limit: Option<Duration>,
}

/// A complete assignment: participant -> activities held
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub by_participant: BTreeMap<String, Vec<String>>,
}

impl Assignment {
    pub fn activities_of(&self, participant: &str) -> &[String] {
        self.by_participant
            .get(participant)
            .map(|a| a.as_slice())
            .unwrap_or(&[])
    }

    pub fn holders_of(&self, activity: &str) -> Vec<&str> {
        self.by_participant
            .iter()
            .filter(|(_, acts)| acts.iter().any(|a| a == activity))
            .map(|(p, _)| p.as_str())
            .collect()
    }

    pub fn holds(&self, participant: &str, activity: &str) -> bool {
        self.activities_of(participant).iter().any(|a| a == activity)
    }
}

/// Which budget stopped the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLimit {
    Nodes,
    Time,
}

/// Result of a search that got past validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    Solved { assignment: Assignment },
    /// The whole space was explored without a completion
    Exhausted,
    BudgetExhausted { limit: BudgetLimit },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub nodes: u64,
    pub backtracks: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolveReport {
    pub outcome: SearchOutcome,
    pub stats: SearchStats,
}

impl SolveReport {
    pub fn assignment(&self) -> Option<&Assignment> {
        match &self.outcome {
            SearchOutcome::Solved { assignment } => Some(assignment),
            _ => None,
        }
    }
}
