//! Lifecycle status of the supervised process.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::intent::LifecycleIntent;
use super::reducer::{LifecycleReducer, Reducer};

/// Current phase of the supervised process. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    /// No process. Initial state and the state at rest.
    #[default]
    Stopped,
    /// Process spawned, readiness markers not seen yet.
    Starting,
    /// Readiness markers seen. Best-effort signal, not a health check.
    Running,
    /// Shutdown command written, waiting for the process to exit.
    Stopping,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Stopped => "stopped",
            LifecycleStatus::Starting => "starting",
            LifecycleStatus::Running => "running",
            LifecycleStatus::Stopping => "stopping",
        }
    }

    /// True while a process exists (anything but `Stopped`).
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status change produced by [`LifecycleMachine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: LifecycleStatus,
    pub to: LifecycleStatus,
}

/// Holds the current status and runs intents through the reducer.
///
/// No history is kept beyond the current value.
#[derive(Debug, Default)]
pub struct LifecycleMachine {
    status: LifecycleStatus,
}

impl LifecycleMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    /// Apply `intent`, returning the transition if the status changed.
    pub fn apply(&mut self, intent: LifecycleIntent) -> Option<Transition> {
        let from = self.status;
        let to = LifecycleReducer::reduce(from, intent);
        if from == to {
            return None;
        }
        self.status = to;
        Some(Transition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_stopped() {
        assert_eq!(LifecycleMachine::new().status(), LifecycleStatus::Stopped);
        assert!(!LifecycleStatus::default().is_active());
    }

    #[test]
    fn apply_reports_only_real_changes() {
        let mut machine = LifecycleMachine::new();
        assert_eq!(machine.apply(LifecycleIntent::ReadinessObserved), None);

        let transition = machine.apply(LifecycleIntent::Spawned);
        assert_eq!(
            transition,
            Some(Transition {
                from: LifecycleStatus::Stopped,
                to: LifecycleStatus::Starting,
            })
        );
        assert_eq!(machine.apply(LifecycleIntent::Spawned), None);
        assert_eq!(machine.status(), LifecycleStatus::Starting);
    }

    #[test]
    fn full_cycle() {
        let mut machine = LifecycleMachine::new();
        machine.apply(LifecycleIntent::Spawned);
        machine.apply(LifecycleIntent::ReadinessObserved);
        assert_eq!(machine.status(), LifecycleStatus::Running);
        machine.apply(LifecycleIntent::StopRequested);
        assert_eq!(machine.status(), LifecycleStatus::Stopping);
        machine.apply(LifecycleIntent::Exited);
        assert_eq!(machine.status(), LifecycleStatus::Stopped);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&LifecycleStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
        assert_eq!(LifecycleStatus::Stopping.to_string(), "stopping");
    }
}
