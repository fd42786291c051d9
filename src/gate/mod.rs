//! Access gate: who is calling, and may they do this.
//!
//! Account storage and login live outside the panel. All the rest of the
//! crate sees is an [`AccessGate`] that turns a presented bearer token into an
//! [`Identity`] and answers whether that identity holds a [`Privilege`].

mod secure;
mod token;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AuthConfig;

pub use secure::SecureString;
pub use token::{OpenGate, TokenGate};

/// What a token holder may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Watch status and console output.
    #[default]
    Viewer,
    /// Also start, stop and send console commands.
    Operator,
}

/// Capabilities checked at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Read status, connect as an observer.
    Observe,
    /// Start, stop, send commands.
    Control,
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Privilege::Observe => f.write_str("observe"),
            Privilege::Control => f.write_str("control"),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub name: String,
    pub role: Role,
}

impl Identity {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    pub fn allows(&self, privilege: Privilege) -> bool {
        match privilege {
            Privilege::Observe => true,
            Privilege::Control => self.role == Role::Operator,
        }
    }
}

/// Why a caller was turned away.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("Access token required")]
    MissingCredentials,

    #[error("Invalid access token")]
    InvalidCredentials,

    #[error("'{name}' is not allowed to {privilege}")]
    Forbidden { name: String, privilege: Privilege },
}

/// Authorization decisions consumed by the hub and the HTTP layer.
pub trait AccessGate: Send + Sync {
    /// Resolve a presented token (if any) to an identity.
    fn authenticate(&self, token: Option<&str>) -> Result<Identity, GateError>;

    /// Check that `identity` holds `privilege`.
    fn authorize(&self, identity: &Identity, privilege: Privilege) -> Result<(), GateError> {
        if identity.allows(privilege) {
            Ok(())
        } else {
            Err(GateError::Forbidden {
                name: identity.name.clone(),
                privilege,
            })
        }
    }
}

/// Build the gate described by `[auth]`.
pub fn gate_from_config(config: &AuthConfig) -> Arc<dyn AccessGate> {
    if config.enabled {
        Arc::new(TokenGate::from_config(config))
    } else {
        Arc::new(OpenGate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_can_only_observe() {
        let viewer = Identity::new("watcher", Role::Viewer);
        assert!(viewer.allows(Privilege::Observe));
        assert!(!viewer.allows(Privilege::Control));
    }

    #[test]
    fn default_authorize_reports_forbidden_privilege() {
        let gate = OpenGate;
        let viewer = Identity::new("watcher", Role::Viewer);
        let err = gate.authorize(&viewer, Privilege::Control).unwrap_err();
        assert_eq!(
            err,
            GateError::Forbidden {
                name: "watcher".to_string(),
                privilege: Privilege::Control,
            }
        );
        assert_eq!(err.to_string(), "'watcher' is not allowed to control");
    }

    #[test]
    fn disabled_auth_yields_open_gate() {
        let gate = gate_from_config(&AuthConfig::default());
        let identity = gate.authenticate(None).unwrap();
        assert!(identity.allows(Privilege::Control));
    }
}
