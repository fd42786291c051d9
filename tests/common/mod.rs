//! Shared test utilities and fake process infrastructure.

#![allow(dead_code, unused_imports)]

use mcpanel::config::{Config, ProcessConfig};
use mcpanel::hub::{HubEvent, Subscription};
use mcpanel::lifecycle::LifecycleStatus;
use mcpanel::panel::Panel;
use mcpanel::pty::{LaunchSpec, LaunchedProcess, ProcessEvent, ProcessLauncher, EVENT_BUFFER};
use mcpanel::supervisor::{Supervisor, SupervisorError};
use parking_lot::Mutex;
use portable_pty::ChildKiller;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const READY_LINE: &str = "[12:00:00 INFO]: Done (1.234s)! For help, type \"help\"\n";
pub const JAR_NAME: &str = "server.jar";
pub const TIMEOUT: Duration = Duration::from_secs(2);

pub type SpyBuffer = Arc<Mutex<Vec<u8>>>;

/// Console input that records everything written to it.
pub struct SpyWriter {
    buffer: SpyBuffer,
    broken: bool,
}

impl Write for SpyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.broken {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        }
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Kill handle that turns a kill into an exit event.
#[derive(Debug, Clone)]
pub struct FakeKiller {
    kills: Arc<AtomicUsize>,
    events: mpsc::Sender<ProcessEvent>,
}

impl ChildKiller for FakeKiller {
    fn kill(&mut self) -> io::Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.try_send(ProcessEvent::Exited { code: Some(137) });
        Ok(())
    }

    fn clone_killer(&self) -> Box<dyn ChildKiller + Send + Sync> {
        Box::new(self.clone())
    }
}

/// Test-side view of one fake process.
#[derive(Clone)]
pub struct FakeProcess {
    pub pid: u32,
    pub input: SpyBuffer,
    pub kills: Arc<AtomicUsize>,
    events: mpsc::Sender<ProcessEvent>,
}

impl FakeProcess {
    pub async fn emit(&self, text: &str) {
        self.emit_bytes(text.as_bytes()).await;
    }

    pub async fn emit_bytes(&self, bytes: &[u8]) {
        self.events
            .send(ProcessEvent::Output(bytes.to_vec()))
            .await
            .expect("pump gone");
    }

    pub async fn exit(&self, code: i32) {
        let _ = self.events.send(ProcessEvent::Exited { code: Some(code) }).await;
    }

    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.input.lock()).into_owned()
    }

    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

/// Launcher that hands out in-memory processes.
#[derive(Default)]
pub struct FakeLauncher {
    processes: Mutex<Vec<FakeProcess>>,
    failure: Mutex<Option<String>>,
    broken_input: bool,
    launch_delay: Option<Duration>,
}

impl FakeLauncher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Launches take `delay` on the calling thread.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            launch_delay: Some(delay),
            ..Self::default()
        })
    }

    /// Every launched process has a console that rejects writes.
    pub fn with_broken_input() -> Arc<Self> {
        Arc::new(Self {
            broken_input: true,
            ..Self::default()
        })
    }

    pub fn fail_next(&self, reason: &str) {
        *self.failure.lock() = Some(reason.to_string());
    }

    pub fn launch_count(&self) -> usize {
        self.processes.lock().len()
    }

    pub fn last(&self) -> FakeProcess {
        self.processes.lock().last().cloned().expect("nothing launched")
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&self, _spec: &LaunchSpec) -> Result<LaunchedProcess, SupervisorError> {
        if let Some(delay) = self.launch_delay {
            std::thread::sleep(delay);
        }
        if let Some(reason) = self.failure.lock().take() {
            return Err(SupervisorError::SpawnFailure { reason });
        }

        let (events, receiver) = mpsc::channel(EVENT_BUFFER);
        let input: SpyBuffer = Arc::new(Mutex::new(Vec::new()));
        let kills = Arc::new(AtomicUsize::new(0));

        let mut processes = self.processes.lock();
        let pid = 4242 + processes.len() as u32;
        processes.push(FakeProcess {
            pid,
            input: input.clone(),
            kills: kills.clone(),
            events: events.clone(),
        });

        Ok(LaunchedProcess {
            pid: Some(pid),
            input: Box::new(SpyWriter {
                buffer: input,
                broken: self.broken_input,
            }),
            killer: Box::new(FakeKiller { kills, events }),
            events: receiver,
        })
    }
}

/// A temp server directory containing an (empty) jar.
pub fn server_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join(JAR_NAME), b"").expect("Failed to write jar");
    dir
}

pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.server.bind_addr = "127.0.0.1:0".to_string();
    config.process = ProcessConfig {
        server_dir: dir.to_path_buf(),
        jar_file: JAR_NAME.to_string(),
        ..ProcessConfig::default()
    };
    config
}

pub fn make_panel(config: &Config, launcher: Arc<FakeLauncher>) -> Panel {
    Panel::new(config, launcher)
}

/// Panel over a fresh server dir with default settings.
pub fn default_panel() -> (Panel, Arc<FakeLauncher>, TempDir) {
    let dir = server_dir();
    let launcher = FakeLauncher::new();
    let panel = make_panel(&test_config(dir.path()), launcher.clone());
    (panel, launcher, dir)
}

pub async fn wait_status(supervisor: &Supervisor, status: LifecycleStatus) {
    assert!(
        supervisor.wait_for_status(status, TIMEOUT).await,
        "timed out waiting for {status}, currently {}",
        supervisor.status().status
    );
}

pub async fn next_event(subscription: &mut Subscription) -> HubEvent {
    tokio::time::timeout(TIMEOUT, subscription.recv())
        .await
        .expect("timed out waiting for event")
        .expect("subscription closed")
}

/// Skip status events until an output event arrives.
pub async fn next_output(subscription: &mut Subscription) -> String {
    loop {
        let event = next_event(subscription).await;
        if let Some(text) = event.output_text() {
            return text.to_string();
        }
    }
}

/// Skip output events until a status event arrives.
pub async fn next_status(subscription: &mut Subscription) -> LifecycleStatus {
    loop {
        let event = next_event(subscription).await;
        if let Some(status) = event.status() {
            return status;
        }
    }
}
