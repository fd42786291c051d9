//! Pseudo-terminal process launching.
//!
//! The game server is run inside a PTY, as an interactive console expects.
//! Output and exit are delivered as one ordered stream of [`ProcessEvent`]s:
//! a reader thread forwards output chunks and a waiter thread reports the
//! exit after the last chunk has been forwarded.

mod launcher;
mod session;
mod spawn_config;

pub use launcher::{LaunchedProcess, ProcessEvent, ProcessLauncher, EVENT_BUFFER};
pub use session::PtyLauncher;
pub use spawn_config::LaunchSpec;
