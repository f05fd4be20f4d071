use std::time::Instant;
use tracing::{debug, info};
use crate::error::SolveError;
use super::eligibility::is_eligible;
use super::instance::{AssignmentState, Instance};
use super::pairing::{is_pair_feasible, reserve_partners};
use super::ranking::candidates_for;
use super::types::{BudgetLimit, Caps, Problem, SearchBudget, SearchOutcome, SearchStats, SolveReport};

/// Finds the first complete assignment that honours every hard constraint.
///
/// Reference errors and unsatisfiable mandatory pairings are returned as
/// `Err` before any search happens. Everything else, including "no assignment
/// exists", is a `SearchOutcome`.
pub fn solve(problem: &Problem, caps: &Caps, budget: &SearchBudget) -> Result<SolveReport, SolveError> {
    let started = Instant::now();
    let instance = Instance::resolve(problem)?;

    info!(
        event = "solve_start",
        participants = instance.participant_count(),
        activities = instance.activity_count(),
        slots = problem.total_slots(),
        max_per_participant = caps.max_per_participant,
        max_builds = caps.max_builds,
    );

    let mut state = AssignmentState::new(&instance);
    let mut residual = instance.initial_slots();
    apply_mandatory(&instance, caps, &mut state, &mut residual)?;

    let mut search = Search {
        instance: &instance,
        caps,
        budget,
        started,
        stats: SearchStats::default(),
        tripped: None,
    };

    let capacity = (instance.participant_count() as u64).saturating_mul(caps.max_per_participant as u64);
    let outcome = if problem.total_slots() > capacity {
        info!(event = "capacity_shortfall", slots = problem.total_slots(), capacity);
        SearchOutcome::Exhausted
    } else {
        match search.backtrack(&mut state, &residual) {
            Step::Solved => SearchOutcome::Solved {
                assignment: state.to_assignment(&instance),
            },
            Step::Failed => SearchOutcome::Exhausted,
            Step::Aborted => SearchOutcome::BudgetExhausted {
                limit: search.tripped.unwrap_or(BudgetLimit::Nodes),
            },
        }
    };

    let mut stats = search.stats;
    stats.elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        event = "solve_end",
        outcome = outcome_name(&outcome),
        nodes = stats.nodes,
        backtracks = stats.backtracks,
        elapsed_ms = stats.elapsed_ms,
    );

    Ok(SolveReport { outcome, stats })
}

fn outcome_name(outcome: &SearchOutcome) -> &'static str {
    match outcome {
        SearchOutcome::Solved { .. } => "solved",
        SearchOutcome::Exhausted => "exhausted",
        SearchOutcome::BudgetExhausted { .. } => "budget_exhausted",
    }
}

/// Commits every mandatory pairing in order, then reserves their partners.
/// Partners are reserved only after all pairings are in so that a later
/// mandatory rule naming the partner still finds it unassigned.
fn apply_mandatory(
    instance: &Instance,
    caps: &Caps,
    state: &mut AssignmentState,
    residual: &mut Vec<usize>,
) -> Result<(), SolveError> {
    let infeasible = |p: usize, a: usize, reason: &str| SolveError::InfeasibleMandatory {
        participant: instance.participant_id(p).to_string(),
        activity: instance.activity_id(a).to_string(),
        reason: reason.to_string(),
    };

    for &(p, a) in instance.mandatory() {
        if !is_eligible(p, a, state, instance, caps) {
            return Err(infeasible(p, a, "participant is not eligible"));
        }
        let Some(pos) = residual.iter().position(|&slot| slot == a) else {
            return Err(infeasible(p, a, "no open slot"));
        };
        residual.remove(pos);
        state.place(p, a);
        debug!(participant = instance.participant_id(p), activity = instance.activity_id(a), "mandatory pairing committed");
    }

    for &(p, a) in instance.mandatory() {
        let mut trail = Vec::new();
        if !reserve_partners(p, a, state, residual, &mut trail, instance, caps) {
            return Err(infeasible(p, a, "a paired activity cannot be reserved"));
        }
    }

    Ok(())
}

enum Step {
    Solved,
    Failed,
    Aborted,
}

struct Search<'s, 'a> {
    instance: &'s Instance<'a>,
    caps: &'s Caps,
    budget: &'s SearchBudget,
    started: Instant,
    stats: SearchStats,
    tripped: Option<BudgetLimit>,
}

impl Search<'_, '_> {
    fn over_budget(&mut self) -> bool {
        if let Some(limit) = self.budget.node_limit {
            if self.stats.nodes > limit {
                self.tripped = Some(BudgetLimit::Nodes);
                return true;
            }
        }
        if let Some(limit) = self.budget.time_limit {
            if self.started.elapsed() >= limit {
                self.tripped = Some(BudgetLimit::Time);
                return true;
            }
        }
        false
    }

    /// Picks the most constrained activity left in `residual`.
    ///
    /// Key: single-tryout activities first, then fewest candidates. Ties keep
    /// the activity whose slot appears first in `residual`. Returns `None` if
    /// some activity has no candidate at all.
    fn most_constrained(&self, state: &AssignmentState, residual: &[usize]) -> Option<(usize, usize, Vec<usize>)> {
        let mut best: Option<((u8, usize), usize, usize, Vec<usize>)> = None;
        let mut seen = Vec::new();

        for (idx, &a) in residual.iter().enumerate() {
            if seen.contains(&a) {
                continue;
            }
            seen.push(a);

            let candidates = candidates_for(a, state, self.instance, self.caps);
            if candidates.is_empty() {
                return None;
            }
            let single = if self.instance.has_single_tryout(a) { 0 } else { 1 };
            let key = (single, candidates.len());
            if best.as_ref().map_or(true, |(best_key, ..)| key < *best_key) {
                best = Some((key, idx, a, candidates));
            }
        }

        best.map(|(_, idx, a, candidates)| (idx, a, candidates))
    }

    fn backtrack(&mut self, state: &mut AssignmentState, residual: &[usize]) -> Step {
        if residual.is_empty() {
            return Step::Solved;
        }

        self.stats.nodes += 1;
        if self.over_budget() {
            return Step::Aborted;
        }

        let Some((idx, activity, candidates)) = self.most_constrained(state, residual) else {
            return Step::Failed;
        };

        for p in candidates {
            if !is_pair_feasible(p, activity, state, self.instance, self.caps) {
                continue;
            }

            let mut next = residual.to_vec();
            next.remove(idx);
            state.place(p, activity);
            let mut trail = vec![(p, activity)];

            if reserve_partners(p, activity, state, &mut next, &mut trail, self.instance, self.caps) {
                match self.backtrack(state, &next) {
                    Step::Solved => return Step::Solved,
                    Step::Aborted => {
                        state.rollback(&trail);
                        return Step::Aborted;
                    }
                    Step::Failed => {}
                }
            }

            state.rollback(&trail);
            self.stats.backtracks += 1;
        }

        Step::Failed
    }
}
