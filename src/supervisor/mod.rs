//! Supervision of the single game server process.
//!
//! [`Supervisor`] owns the lifecycle machine and the handles of the running
//! process. Every state change happens under one lock, which is what makes
//! concurrent `spawn` calls mutually exclusive and keeps status events in
//! the same order as the transitions that produced them.
//!
//! Output flows through a per-process pump task:
//! raw chunks → [`ChunkDecoder`] → [`sanitize`] → hub + readiness probe.

mod error;

use parking_lot::Mutex;
use portable_pty::ChildKiller;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

use crate::config::ProcessConfig;
use crate::hub::{EventBus, EventKind};
use crate::lifecycle::{
    LifecycleIntent, LifecycleMachine, LifecycleStatus, LineScanner, MarkerProbe, ReadinessProbe,
};
use crate::pty::{LaunchSpec, ProcessEvent, ProcessLauncher};
use crate::sanitize::{sanitize, ChunkDecoder};

pub use error::SupervisorError;

/// How long to wait for the exit after a forced kill during shutdown.
const KILL_WAIT: Duration = Duration::from_secs(5);

/// Static inputs for a [`Supervisor`].
#[derive(Clone)]
pub struct SupervisorSettings {
    pub launch: LaunchSpec,
    /// Must exist as a file before a spawn is attempted.
    pub artifact: PathBuf,
    /// Appended to every line written to the console.
    pub line_terminator: String,
    pub stop_command: String,
    pub probe: Arc<dyn ReadinessProbe>,
    /// Kill the process if it is still around this long after a stop
    /// request. `None` waits indefinitely.
    pub force_kill_after: Option<Duration>,
}

impl SupervisorSettings {
    pub fn from_config(config: &ProcessConfig) -> Self {
        Self {
            launch: LaunchSpec::from_config(config),
            artifact: config.artifact_path(),
            line_terminator: config.line_terminator.clone(),
            stop_command: config.stop_command.clone(),
            probe: Arc::new(MarkerProbe::new(config.readiness_markers.clone())),
            force_kill_after: config.force_kill_after(),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.probe = probe;
        self
    }
}

/// Point-in-time view returned by [`Supervisor::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub status: LifecycleStatus,
    #[serde(rename = "processId")]
    pub pid: Option<u32>,
}

/// Extended view for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub status: LifecycleStatus,
    #[serde(rename = "processId")]
    pub pid: Option<u32>,
    pub input_open: bool,
    pub uptime_seconds: Option<u64>,
    pub command: String,
}

/// Handle to the process supervisor. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Supervisor {
    shared: Arc<Shared>,
}

struct Shared {
    settings: SupervisorSettings,
    launcher: Arc<dyn ProcessLauncher>,
    bus: EventBus,
    state: Mutex<State>,
    status_tx: watch::Sender<LifecycleStatus>,
}

#[derive(Default)]
struct State {
    machine: LifecycleMachine,
    process: Option<ProcessSlot>,
    generation: u64,
}

/// Handles of the live process. Present exactly while the status is active.
struct ProcessSlot {
    generation: u64,
    pid: Option<u32>,
    /// `None` once a write found the console closed.
    input: Option<Box<dyn Write + Send>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    spawned_at: Instant,
}

impl Supervisor {
    pub fn new(
        settings: SupervisorSettings,
        launcher: Arc<dyn ProcessLauncher>,
        bus: EventBus,
    ) -> Self {
        let (status_tx, _) = watch::channel(LifecycleStatus::Stopped);
        Self {
            shared: Arc::new(Shared {
                settings,
                launcher,
                bus,
                state: Mutex::new(State::default()),
                status_tx,
            }),
        }
    }

    pub fn status(&self) -> StatusSnapshot {
        let state = self.shared.state.lock();
        StatusSnapshot {
            status: state.machine.status(),
            pid: state.process.as_ref().and_then(|p| p.pid),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let state = self.shared.state.lock();
        let process = state.process.as_ref();
        Diagnostics {
            status: state.machine.status(),
            pid: process.and_then(|p| p.pid),
            input_open: process.is_some_and(|p| p.input.is_some()),
            uptime_seconds: process.map(|p| p.spawned_at.elapsed().as_secs()),
            command: self.shared.settings.launch.display_command(),
        }
    }

    /// Watch channel that always holds the latest status.
    pub fn watch_status(&self) -> watch::Receiver<LifecycleStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Wait until the status equals `target`. Returns false on timeout.
    pub async fn wait_for_status(&self, target: LifecycleStatus, timeout: Duration) -> bool {
        let mut rx = self.watch_status();
        let reached = matches!(
            tokio::time::timeout(timeout, rx.wait_for(|status| *status == target)).await,
            Ok(Ok(_))
        );
        reached
    }

    /// Start the server process.
    ///
    /// Returns the pid if the platform reports one. Must be called from
    /// within a Tokio runtime, since the output pump is spawned onto it.
    pub fn spawn(&self) -> Result<Option<u32>, SupervisorError> {
        let settings = &self.shared.settings;
        let mut state = self.shared.state.lock();

        if state.machine.status().is_active() {
            return Err(SupervisorError::AlreadyRunning);
        }
        if !settings.artifact.is_file() {
            tracing::warn!(path = %settings.artifact.display(), "Server jar missing");
            return Err(SupervisorError::MissingArtifact {
                path: settings.artifact.clone(),
            });
        }

        let launched = self.shared.launcher.launch(&settings.launch).map_err(|err| {
            tracing::error!(error = %err, "Failed to launch server process");
            err
        })?;

        state.generation += 1;
        let generation = state.generation;
        let pid = launched.pid;
        state.process = Some(ProcessSlot {
            generation,
            pid,
            input: Some(launched.input),
            killer: launched.killer,
            spawned_at: Instant::now(),
        });
        self.apply(&mut state, LifecycleIntent::Spawned, None);

        tokio::spawn(pump(self.clone(), generation, launched.events));

        tracing::info!(
            pid = ?pid,
            command = %settings.launch.display_command(),
            "Server process spawned"
        );
        Ok(pid)
    }

    /// Ask the server to shut down by writing the stop command.
    ///
    /// The process exiting is what eventually moves the status to `Stopped`.
    pub fn terminate(&self) -> Result<(), SupervisorError> {
        let settings = &self.shared.settings;
        let mut state = self.shared.state.lock();
        if !state.machine.status().is_active() {
            return Err(SupervisorError::NotRunning);
        }

        let line = format!("{}{}", settings.stop_command, settings.line_terminator);
        write_line(&mut state, &line)?;
        self.apply(&mut state, LifecycleIntent::StopRequested, None);
        tracing::info!("Stop command sent");

        if let Some(after) = settings.force_kill_after {
            let generation = state.generation;
            let this = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                this.kill_generation(generation);
            });
        }
        Ok(())
    }

    /// Write one console line. The line terminator is appended here.
    pub fn send_input(&self, text: &str) -> Result<(), SupervisorError> {
        let mut state = self.shared.state.lock();
        if !state.machine.status().is_active() {
            return Err(SupervisorError::NotRunning);
        }
        let line = format!("{}{}", text, self.shared.settings.line_terminator);
        write_line(&mut state, &line)?;
        tracing::debug!(command = %text, "Console input written");
        Ok(())
    }

    /// Forcibly kill the current process. The exit still arrives through
    /// the normal path and moves the status to `Stopped`.
    pub fn kill(&self) -> Result<(), SupervisorError> {
        let mut state = self.shared.state.lock();
        let slot = state.process.as_mut().ok_or(SupervisorError::NotRunning)?;
        tracing::warn!(pid = ?slot.pid, "Killing server process");
        slot.killer
            .kill()
            .map_err(|source| SupervisorError::KillFailure { source })
    }

    /// Bring the server down for panel shutdown: send the stop command,
    /// wait up to `grace`, then kill. No-op when nothing is running.
    pub async fn shutdown(&self, grace: Duration) {
        let status = self.status().status;
        if !status.is_active() {
            return;
        }
        if status != LifecycleStatus::Stopping {
            if let Err(err) = self.terminate() {
                tracing::warn!(error = %err, "Could not send stop command");
            }
        }
        if self.wait_for_status(LifecycleStatus::Stopped, grace).await {
            return;
        }

        tracing::warn!(grace_seconds = grace.as_secs(), "Server did not stop in time");
        if let Err(err) = self.kill() {
            tracing::error!(error = %err, "Failed to kill server process");
            return;
        }
        self.wait_for_status(LifecycleStatus::Stopped, KILL_WAIT).await;
    }

    fn kill_generation(&self, generation: u64) {
        let mut state = self.shared.state.lock();
        let still_stopping = state.machine.status() == LifecycleStatus::Stopping;
        let Some(slot) = state.process.as_mut() else {
            return;
        };
        if slot.generation != generation || !still_stopping {
            return;
        }
        tracing::warn!(pid = ?slot.pid, "Server did not stop in time, killing");
        if let Err(err) = slot.killer.kill() {
            tracing::error!(error = %err, "Failed to kill server process");
        }
    }

    fn apply(&self, state: &mut State, intent: LifecycleIntent, exit_code: Option<i32>) {
        let Some(transition) = state.machine.apply(intent) else {
            return;
        };
        tracing::info!(from = %transition.from, to = %transition.to, "Lifecycle transition");
        self.shared.bus.publish(EventKind::StatusChanged {
            status: transition.to,
            exit_code,
        });
        self.shared.status_tx.send_replace(transition.to);
    }

    fn handle_output(&self, generation: u64, raw: &str, scanner: &mut LineScanner) {
        let text = sanitize(raw);
        if text.is_empty() {
            return;
        }
        tracing::debug!(target: "mcpanel::console", "{}", text.trim_end());
        let ready = scanner.feed(&text, self.shared.settings.probe.as_ref());

        let mut state = self.shared.state.lock();
        if state.generation != generation || state.process.is_none() {
            return;
        }
        self.shared.bus.publish(EventKind::OutputLine { text });
        if ready {
            self.apply(&mut state, LifecycleIntent::ReadinessObserved, None);
        }
    }

    fn handle_exit(&self, generation: u64, code: Option<i32>) {
        let mut state = self.shared.state.lock();
        let current = state
            .process
            .as_ref()
            .is_some_and(|slot| slot.generation == generation);
        if !current {
            return;
        }
        let slot = state.process.take();
        let uptime = slot.map(|s| s.spawned_at.elapsed().as_secs());
        tracing::info!(code = ?code, uptime_seconds = ?uptime, "Server process exited");
        self.apply(&mut state, LifecycleIntent::Exited, code);
    }
}

fn write_line(state: &mut State, line: &str) -> Result<(), SupervisorError> {
    let slot = state.process.as_mut().ok_or(SupervisorError::NotRunning)?;
    let Some(input) = slot.input.as_mut() else {
        return Err(SupervisorError::WriteFailure {
            source: io::Error::new(io::ErrorKind::BrokenPipe, "console input is closed"),
        });
    };
    let result = input.write_all(line.as_bytes()).and_then(|()| input.flush());
    if let Err(source) = result {
        tracing::warn!(error = %source, "Console write failed");
        if source.kind() == io::ErrorKind::BrokenPipe {
            slot.input = None;
        }
        return Err(SupervisorError::WriteFailure { source });
    }
    Ok(())
}

/// Drains one process's events until it exits. A channel that closes
/// without an exit event is treated as an exit with unknown code.
async fn pump(
    supervisor: Supervisor,
    generation: u64,
    mut events: mpsc::Receiver<ProcessEvent>,
) {
    let mut decoder = ChunkDecoder::new();
    let mut scanner = LineScanner::new();
    let mut exit_code = None;

    while let Some(event) = events.recv().await {
        match event {
            ProcessEvent::Output(bytes) => {
                let text = decoder.decode(&bytes);
                supervisor.handle_output(generation, &text, &mut scanner);
            }
            ProcessEvent::Exited { code } => {
                exit_code = code;
                break;
            }
        }
    }

    let tail = decoder.flush();
    if !tail.is_empty() {
        supervisor.handle_output(generation, &tail, &mut scanner);
    }
    supervisor.handle_exit(generation, exit_code);
}
