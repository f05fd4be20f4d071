pub mod types;
pub mod instance;
pub mod eligibility;
pub mod ranking;
pub mod pairing;
pub mod search;

#[cfg(test)]
mod properties;

pub use types::{Activity, AffinityGroup, Assignment, BudgetLimit, Caps, Participant, Problem, RuleSet, SearchBudget, SearchOutcome, SearchStats, SolveReport};
pub use search::solve;
