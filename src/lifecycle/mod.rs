//! Supervised-process lifecycle state machine.
//!
//! # Architecture
//!
//! MVI-style layout:
//! - `state.rs` - Lifecycle status enum (Stopped → Starting → Running → Stopping)
//! - `intent.rs` - Observed events (Spawned, ReadinessObserved, StopRequested, Exited)
//! - `reducer.rs` - State transitions (pure, no side effects)
//! - `readiness.rs` - Pluggable readiness predicate over sanitized output
//!
//! The machine reflects observed reality. It never retries, rolls back or
//! enforces a desired state; rejecting an operation is the supervisor's job.

mod intent;
mod readiness;
mod reducer;
mod state;

pub use intent::LifecycleIntent;
pub use readiness::{LineScanner, MarkerProbe, ReadinessProbe};
pub use reducer::{LifecycleReducer, Reducer};
pub use state::{LifecycleMachine, LifecycleStatus, Transition};
