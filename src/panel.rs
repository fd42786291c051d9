//! Assembly of the panel's long-lived parts from a [`Config`].

use std::sync::Arc;

use crate::config::Config;
use crate::gate::gate_from_config;
use crate::hub::{BroadcastHub, EventBus};
use crate::pty::ProcessLauncher;
use crate::supervisor::{Supervisor, SupervisorSettings};

/// Bus, supervisor and hub, wired together.
///
/// The supervisor publishes into the bus; the hub reads from it and routes
/// commands back into the supervisor.
#[derive(Clone)]
pub struct Panel {
    pub supervisor: Supervisor,
    pub hub: BroadcastHub,
}

impl Panel {
    pub fn new(config: &Config, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self::with_settings(config, SupervisorSettings::from_config(&config.process), launcher)
    }

    /// Like [`new`](Self::new) with explicit supervisor settings.
    pub fn with_settings(
        config: &Config,
        settings: SupervisorSettings,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        let bus = EventBus::new(config.hub.observer_queue);
        let supervisor = Supervisor::new(settings, launcher, bus.clone());
        let hub = BroadcastHub::new(
            bus,
            supervisor.clone(),
            gate_from_config(&config.auth),
            config.hub.echo_prefix.clone(),
        );
        Self { supervisor, hub }
    }
}
