//! Reducer for the lifecycle status.

use super::intent::LifecycleIntent;
use super::state::LifecycleStatus;

/// Reducer transforms state based on intents.
///
/// The reducer is the only place where state transitions happen.
/// It must be a pure function: (State, Intent) -> State
pub trait Reducer {
    /// The state type this reducer operates on.
    type State;

    /// The intent type this reducer handles.
    type Intent;

    /// Process an intent and return the new state.
    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}

/// Reducer for supervised-process lifecycle transitions.
///
/// Intents that do not apply to the current status leave it unchanged.
pub struct LifecycleReducer;

impl Reducer for LifecycleReducer {
    type State = LifecycleStatus;
    type Intent = LifecycleIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            LifecycleIntent::Spawned => match state {
                LifecycleStatus::Stopped => LifecycleStatus::Starting,
                other => other,
            },

            LifecycleIntent::ReadinessObserved => match state {
                LifecycleStatus::Starting => LifecycleStatus::Running,
                other => other,
            },

            LifecycleIntent::StopRequested => match state {
                LifecycleStatus::Starting | LifecycleStatus::Running => LifecycleStatus::Stopping,
                other => other,
            },

            // Crash while starting, crash while running, clean exit after stop.
            LifecycleIntent::Exited => LifecycleStatus::Stopped,
        }
    }
}
