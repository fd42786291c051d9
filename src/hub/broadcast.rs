use std::sync::Arc;
use thiserror::Error;

use crate::gate::{AccessGate, GateError, Identity, Privilege};
use crate::hub::bus::{EventBus, ObserverId, Subscription};
use crate::hub::event::EventKind;
use crate::supervisor::{Supervisor, SupervisorError};

#[derive(Debug, Error)]
pub enum HubError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("Command must not be empty")]
    EmptyCommand,

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

/// A console command on its way to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub text: String,
    pub issuer: Identity,
}

impl CommandRequest {
    /// Trailing line breaks are dropped since the supervisor adds its own
    /// terminator. Blank commands are rejected.
    pub fn new(text: &str, issuer: Identity) -> Result<Self, HubError> {
        let text = text.trim_end_matches(['\r', '\n']);
        if text.trim().is_empty() {
            return Err(HubError::EmptyCommand);
        }
        Ok(Self {
            text: text.to_string(),
            issuer,
        })
    }
}

/// Couples the event bus to the supervisor and the access gate.
#[derive(Clone)]
pub struct BroadcastHub {
    bus: EventBus,
    supervisor: Supervisor,
    gate: Arc<dyn AccessGate>,
    echo_prefix: String,
}

impl BroadcastHub {
    pub fn new(
        bus: EventBus,
        supervisor: Supervisor,
        gate: Arc<dyn AccessGate>,
        echo_prefix: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            supervisor,
            gate,
            echo_prefix: echo_prefix.into(),
        }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn gate(&self) -> &Arc<dyn AccessGate> {
        &self.gate
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn publish(&self, kind: EventKind) -> u64 {
        self.bus.publish(kind)
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.bus.observer_count()
    }

    /// Forward a command to the server console and echo it to every
    /// observer. Requires the control privilege.
    pub fn submit_command(&self, issuer: &Identity, text: &str) -> Result<(), HubError> {
        self.gate.authorize(issuer, Privilege::Control)?;
        let request = CommandRequest::new(text, issuer.clone())?;

        self.supervisor.send_input(&request.text)?;
        tracing::info!(issuer = %request.issuer.name, command = %request.text, "Console command");

        self.bus.publish(EventKind::OutputLine {
            text: format!("{}{}\n", self.echo_prefix, request.text),
        });
        Ok(())
    }
}
