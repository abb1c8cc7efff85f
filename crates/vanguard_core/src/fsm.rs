//! Generic squad state machine driver.
//!
//! Each squad owns exactly one active state at any time. Transitions
//! follow a strict protocol: the old state's `deactivate` runs before
//! the new state's `activate`, which runs before any `tick` of the new
//! state. A state may request a transition from within its own `tick`;
//! the replacement happens immediately, so the remainder of that tick
//! never re-enters the old state and the next tick sees the new one.

use std::mem;

/// Outcome of a state tick.
#[derive(Debug)]
pub enum Transition<S> {
    /// Remain in the current state.
    Stay,
    /// Replace the current state.
    To(S),
}

/// Behavior contract for a squad state.
///
/// `S` is the subject the state operates on (the squad plus its tick
/// context). States are plain data; shared logic lives in free
/// functions, not base types.
pub trait State<S> {
    /// Called when this state becomes active.
    fn activate(&mut self, subject: &mut S);

    /// Advance one simulation step; optionally request a transition.
    fn tick(&mut self, subject: &mut S) -> Transition<Self>
    where
        Self: Sized;

    /// Called when this state is replaced.
    fn deactivate(&mut self, subject: &mut S);
}

/// Holds the single active state and drives transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine<St> {
    current: St,
}

impl<St> StateMachine<St> {
    /// Create a machine in its initial state.
    ///
    /// Construction is not a transition: the initial state's `activate`
    /// is not invoked (there is no prior state to deactivate).
    pub const fn new(initial: St) -> Self {
        Self { current: initial }
    }

    /// The active state.
    pub const fn current(&self) -> &St {
        &self.current
    }

    /// Tick the active state, applying any transition it requests.
    pub fn tick<S>(&mut self, subject: &mut S)
    where
        St: State<S>,
    {
        if let Transition::To(next) = self.current.tick(subject) {
            self.replace(subject, next);
        }
    }

    /// Force a transition from outside the state's own tick.
    ///
    /// When `reset_if_same` is false and `next` is the same variant as
    /// the active state, the call is a no-op.
    pub fn change_state<S>(&mut self, subject: &mut S, next: St, reset_if_same: bool)
    where
        St: State<S>,
    {
        if !reset_if_same && mem::discriminant(&self.current) == mem::discriminant(&next) {
            return;
        }
        self.replace(subject, next);
    }

    fn replace<S>(&mut self, subject: &mut S, mut next: St)
    where
        St: State<S>,
    {
        self.current.deactivate(subject);
        next.activate(subject);
        self.current = next;
    }
}
