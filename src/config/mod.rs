//! Panel configuration.
//!
//! Loaded once at startup from a TOML file; every field has a default so a
//! missing file or a partial file is fine.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{
    AuthConfig, Config, HubConfig, ProcessConfig, ServerConfig, TokenEntry,
};
