use super::eligibility::is_eligible;
use super::instance::{AssignmentState, Instance};
use super::types::Caps;

/// Every partner of `a` that `p` does not hold yet must still have a slot,
/// and `p` must be eligible for it in the current state.
pub fn is_pair_feasible(p: usize, a: usize, state: &AssignmentState, instance: &Instance, caps: &Caps) -> bool {
    instance
        .links(a)
        .iter()
        .filter(|&&partner| !state.holds(p, partner))
        .all(|&partner| state.remaining(partner) > 0 && is_eligible(p, partner, state, instance, caps))
}

/// Commits every partner activity `p` still owes after taking `a`.
///
/// Partners are checked one at a time against the state left by the previous
/// commit, and their own links are followed too. Each reserved partner takes
/// its first slot out of `residual` and is appended to `trail`. On failure the
/// caller rolls back `trail`; `residual` must then be discarded.
pub fn reserve_partners(
    p: usize,
    a: usize,
    state: &mut AssignmentState,
    residual: &mut Vec<usize>,
    trail: &mut Vec<(usize, usize)>,
    instance: &Instance,
    caps: &Caps,
) -> bool {
    let mut pending = vec![a];
    while let Some(current) = pending.pop() {
        for &partner in instance.links(current) {
            if state.holds(p, partner) {
                continue;
            }
            let Some(pos) = residual.iter().position(|&slot| slot == partner) else {
                return false;
            };
            if !is_eligible(p, partner, state, instance, caps) {
                return false;
            }
            residual.remove(pos);
            state.place(p, partner);
            trail.push((p, partner));
            pending.push(partner);
        }
    }
    true
}
