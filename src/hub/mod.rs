//! Broadcast hub: fans console output and status changes out to observers
//! and routes observer commands back into the supervisor.
//!
//! - `event.rs` - Wire-level event records with a global sequence number
//! - `bus.rs` - Observer registry and non-blocking fan-out
//! - `broadcast.rs` - Access-checked command path and echo

mod broadcast;
mod bus;
mod event;

pub use broadcast::{BroadcastHub, CommandRequest, HubError};
pub use bus::{EventBus, ObserverId, Subscription};
pub use event::{EventKind, HubEvent};
