//! Web control panel for a single Minecraft server process.

pub mod config;
pub mod gate;
pub mod hub;
pub mod lifecycle;
pub mod logging;
pub mod panel;
pub mod pty;
pub mod sanitize;
pub mod server;
pub mod supervisor;
