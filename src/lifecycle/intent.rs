//! Events that drive the lifecycle reducer.

/// Observed events fed into [`LifecycleReducer`](super::LifecycleReducer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleIntent {
    /// The process was created successfully.
    Spawned,

    /// A sanitized output line satisfied the readiness probe.
    ReadinessObserved,

    /// The graceful-shutdown command was written to the process.
    StopRequested,

    /// The process exited, for whatever reason.
    Exited,
}
