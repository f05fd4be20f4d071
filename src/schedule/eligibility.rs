use super::instance::{AssignmentState, Instance};
use super::types::Caps;

/// Whether participant `p` may newly take activity `a` in the current state.
///
/// Used for candidate generation as well as for validating mandatory
/// pairings and partner reservations. Has no side effects.
pub fn is_eligible(p: usize, a: usize, state: &AssignmentState, instance: &Instance, caps: &Caps) -> bool {
    // slot available
    if state.remaining(a) == 0 {
        return false;
    }

    let held = state.held(p);
    if held.contains(&a) {
        return false;
    }

    if held.len() >= caps.max_per_participant {
        return false;
    }

    if instance.is_banned(p, a) {
        return false;
    }

    // a banned peer already sitting in this activity
    if instance.banned_peers(p).iter().any(|&peer| state.holds(peer, a)) {
        return false;
    }

    if let Some(block) = instance.block_of(a) {
        if held.iter().any(|&other| instance.block_of(other) == Some(block)) {
            return false;
        }
    }

    if instance.is_build(a) {
        let builds = held.iter().filter(|&&other| instance.is_build(other)).count();
        if builds >= caps.max_builds {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::types::{Activity, Participant, Problem, RuleSet};

    fn problem() -> Problem {
        Problem {
            participants: vec![
                Participant::new("Ana", &["Astronomy", "Forensics"]),
                Participant::new("Ben", &["Astronomy"]),
            ],
            activities: vec![
                Activity::new("Astronomy", 1, Some("Block 1")),
                Activity::new("Entomology", 2, Some("Block 1")),
                Activity::new("Forensics", 2, Some("Block 2")),
                Activity::new("Boomilever", 2, None).build(),
                Activity::new("Hovercraft", 2, None).build(),
                Activity::new("Helicopter", 2, None).build(),
            ],
            rules: RuleSet {
                banned_activities: vec![("Ben".into(), "Forensics".into())],
                banned_peers: vec![("Ana".into(), "Ben".into())],
                ..RuleSet::default()
            },
            ..Problem::default()
        }
    }

    #[test]
    fn full_activity_is_not_eligible() {
        let problem = problem();
        let inst = Instance::resolve(&problem).unwrap();
        let mut state = AssignmentState::new(&inst);
        let astro = inst.activity("Astronomy").unwrap();
        let ana = inst.participant("Ana").unwrap();
        assert!(is_eligible(ana, astro, &state, &inst, &Caps::default()));
        state.place(ana, astro);
        assert!(!is_eligible(ana, astro, &state, &inst, &Caps::default()));
        // Ben would be blocked by capacity even without the banned pair
        assert_eq!(state.remaining(astro), 0);
    }

    #[test]
    fn same_block_conflicts() {
        let problem = problem();
        let inst = Instance::resolve(&problem).unwrap();
        let mut state = AssignmentState::new(&inst);
        let ana = inst.participant("Ana").unwrap();
        state.place(ana, inst.activity("Astronomy").unwrap());
        assert!(!is_eligible(ana, inst.activity("Entomology").unwrap(), &state, &inst, &Caps::default()));
        assert!(is_eligible(ana, inst.activity("Forensics").unwrap(), &state, &inst, &Caps::default()));
    }

    #[test]
    fn banned_pairs_are_respected() {
        let problem = problem();
        let inst = Instance::resolve(&problem).unwrap();
        let mut state = AssignmentState::new(&inst);
        let ana = inst.participant("Ana").unwrap();
        let ben = inst.participant("Ben").unwrap();
        let forensics = inst.activity("Forensics").unwrap();
        let ento = inst.activity("Entomology").unwrap();

        assert!(!is_eligible(ben, forensics, &state, &inst, &Caps::default()));
        assert!(is_eligible(ben, ento, &state, &inst, &Caps::default()));

        state.place(ana, ento);
        assert!(!is_eligible(ben, ento, &state, &inst, &Caps::default()));
    }

    #[test]
    fn caps_come_from_configuration() {
        let problem = problem();
        let inst = Instance::resolve(&problem).unwrap();
        let mut state = AssignmentState::new(&inst);
        let ana = inst.participant("Ana").unwrap();
        let boom = inst.activity("Boomilever").unwrap();
        let hover = inst.activity("Hovercraft").unwrap();
        let heli = inst.activity("Helicopter").unwrap();
        let forensics = inst.activity("Forensics").unwrap();

        state.place(ana, boom);
        state.place(ana, hover);
        assert!(!is_eligible(ana, heli, &state, &inst, &Caps::default()));
        assert!(is_eligible(ana, forensics, &state, &inst, &Caps::default()));

        let loose = Caps { max_per_participant: 4, max_builds: 3 };
        assert!(is_eligible(ana, heli, &state, &inst, &loose));

        let tight = Caps { max_per_participant: 2, max_builds: 3 };
        assert!(!is_eligible(ana, forensics, &state, &inst, &tight));
    }
}
