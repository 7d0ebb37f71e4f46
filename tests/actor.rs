use ajaw::actor::{ActorState, Health, StateMachine};
use pretty_assertions::assert_eq;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use speculoos::prelude::*;
use strum_macros::IntoStaticStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
enum Lamp {
    Off,
    On,
    Blinking,
    Broken,
}

impl ActorState for Lamp {
    fn is_terminal(self) -> bool {
        self == Lamp::Broken
    }
}

const LAMPS: [Lamp; 4] = [Lamp::Off, Lamp::On, Lamp::Blinking, Lamp::Broken];

#[derive(Debug, PartialEq, Eq)]
enum Hook {
    Exit(Lamp),
    Enter(Lamp),
}

/// Drives the machine the way the controllers do: exit hook of the old state, then enter hook of the new one.
fn drive(fsm: &mut StateMachine<Lamp>, next: Lamp, hooks: &mut Vec<Hook>) {
    if let Some(transition) = fsm.request(next) {
        hooks.push(Hook::Exit(transition.from));
        hooks.push(Hook::Enter(transition.to));
    }
}

#[test]
fn test_current_state_tracks_the_last_request() {
    let mut rng = SmallRng::seed_from_u64(11);
    let mut fsm = StateMachine::new("lamp", Lamp::Off);
    let mut hooks = Vec::new();

    for _ in 0..500 {
        let previous = fsm.current();
        let next = LAMPS[rng.random_range(0..LAMPS.len())];
        let before = hooks.len();

        drive(&mut fsm, next, &mut hooks);

        assert_that(&fsm.current()).is_equal_to(next);
        if previous == next {
            assert_that(&hooks.len()).is_equal_to(before);
        } else {
            assert_eq!(hooks[before..], [Hook::Exit(previous), Hook::Enter(next)]);
        }
    }
}

#[test]
fn test_any_state_may_follow_any_other() {
    for from in LAMPS {
        for to in LAMPS.into_iter().filter(|to| *to != from) {
            let mut fsm = StateMachine::new("lamp", from);
            let transition = fsm.request(to).expect("transitions are unguarded");
            assert_that(&transition.from).is_equal_to(from);
            assert_that(&transition.to).is_equal_to(to);
        }
    }
}

#[test]
fn test_health_stays_within_bounds() {
    let mut health = Health::full(3);
    for _ in 0..5 {
        health.damage();
    }
    assert_that(&health.current()).is_equal_to(0);

    for _ in 0..5 {
        health.heal();
    }
    assert_that(&health.current()).is_equal_to(health.max());
}
