//! The finite-state machine and health counter shared by every actor.
//!
//! Transitions are deliberately unguarded: any state may be requested from any
//! other. Re-requesting the current state is a no-op, so callers never restart a
//! looping animation by accident. Requests that leave a terminal state are still
//! accepted but logged, since no controller should issue them.

use std::fmt::Debug;

use tracing::{trace, warn};

/// A state of an actor's machine.
pub trait ActorState: Copy + Eq + Debug + Into<&'static str> {
    /// Terminal states are never left by a well-behaved controller.
    fn is_terminal(self) -> bool {
        false
    }
}

/// An accepted state change. The controller that requested it runs the exit hook
/// of `from` and then the enter hook of `to`, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub to: S,
}

#[derive(Debug, Clone)]
pub struct StateMachine<S> {
    name: &'static str,
    current: S,
}

impl<S: ActorState> StateMachine<S> {
    pub fn new(name: &'static str, initial: S) -> Self {
        Self { name, current: initial }
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Moves the machine to `next`. Returns `None` when `next` is already active.
    pub fn request(&mut self, next: S) -> Option<Transition<S>> {
        if next == self.current {
            return None;
        }

        let from = self.current;
        if from.is_terminal() {
            let (from_name, to_name): (&'static str, &'static str) = (from.into(), next.into());
            warn!(machine = self.name, from = from_name, to = to_name, "Leaving a terminal state");
        }

        self.current = next;
        trace!(machine = self.name, ?from, to = ?next, "State transition");
        Some(Transition { from, to: next })
    }
}

/// A health counter clamped to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    current: u8,
    max: u8,
}

impl Health {
    /// Creates a full health counter.
    pub fn full(max: u8) -> Self {
        Self { current: max, max }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn max(&self) -> u8 {
        self.max
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Removes one point, never going below zero. Returns the new value.
    pub fn damage(&mut self) -> u8 {
        self.current = self.current.saturating_sub(1);
        self.current
    }

    /// Restores one point, never exceeding the maximum. Returns the new value.
    pub fn heal(&mut self) -> u8 {
        self.current = self.current.saturating_add(1).min(self.max);
        self.current
    }
}
