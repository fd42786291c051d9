use crate::config::AuthConfig;
use crate::gate::{AccessGate, GateError, Identity, Role, SecureString};

/// Static bearer tokens from the config file.
#[derive(Debug, Clone)]
pub struct TokenGate {
    entries: Vec<(SecureString, Identity)>,
}

impl TokenGate {
    pub fn new(entries: Vec<(SecureString, Identity)>) -> Self {
        Self { entries }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let entries = config
            .tokens
            .iter()
            .map(|entry| {
                (
                    SecureString::new(entry.token.clone()),
                    Identity::new(entry.name.clone(), entry.role),
                )
            })
            .collect();
        Self::new(entries)
    }
}

impl AccessGate for TokenGate {
    fn authenticate(&self, token: Option<&str>) -> Result<Identity, GateError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(GateError::MissingCredentials)?;
        self.entries
            .iter()
            .find(|(secret, _)| secret.matches(token))
            .map(|(_, identity)| identity.clone())
            .ok_or(GateError::InvalidCredentials)
    }
}

/// Used when auth is disabled: everyone is an anonymous operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl AccessGate for OpenGate {
    fn authenticate(&self, _token: Option<&str>) -> Result<Identity, GateError> {
        Ok(Identity::new("anonymous", Role::Operator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenEntry;
    use crate::gate::Privilege;

    fn gate() -> TokenGate {
        TokenGate::from_config(&AuthConfig {
            enabled: true,
            tokens: vec![
                TokenEntry {
                    name: "alice".to_string(),
                    token: "op-token".to_string(),
                    role: Role::Operator,
                },
                TokenEntry {
                    name: "bob".to_string(),
                    token: "view-token".to_string(),
                    role: Role::Viewer,
                },
            ],
        })
    }

    #[test]
    fn resolves_known_tokens() {
        let gate = gate();
        assert_eq!(
            gate.authenticate(Some("op-token")).unwrap(),
            Identity::new("alice", Role::Operator)
        );
        assert_eq!(gate.authenticate(Some("view-token")).unwrap().name, "bob");
    }

    #[test]
    fn missing_and_unknown_tokens_are_rejected() {
        let gate = gate();
        assert_eq!(gate.authenticate(None), Err(GateError::MissingCredentials));
        assert_eq!(gate.authenticate(Some("")), Err(GateError::MissingCredentials));
        assert_eq!(
            gate.authenticate(Some("nope")),
            Err(GateError::InvalidCredentials)
        );
    }

    #[test]
    fn viewer_token_cannot_control() {
        let gate = gate();
        let bob = gate.authenticate(Some("view-token")).unwrap();
        assert!(gate.authorize(&bob, Privilege::Observe).is_ok());
        assert!(matches!(
            gate.authorize(&bob, Privilege::Control),
            Err(GateError::Forbidden { .. })
        ));
    }
}
