use portable_pty::ChildKiller;
use std::io::Write;
use tokio::sync::mpsc;

use crate::pty::spawn_config::LaunchSpec;
use crate::supervisor::SupervisorError;

/// Bound of the per-process event channel.
///
/// A full channel blocks the reader thread, which leaves further output in
/// the OS pipe until the consumer catches up.
pub const EVENT_BUFFER: usize = 64;

/// Something observed on a running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A raw chunk of console output, exactly as read.
    Output(Vec<u8>),
    /// The process exited. Always the last event on the channel.
    Exited { code: Option<i32> },
}

/// A freshly created process and the handles to drive it.
pub struct LaunchedProcess {
    /// OS process id, if the platform reports one.
    pub pid: Option<u32>,
    /// Console input.
    pub input: Box<dyn Write + Send>,
    /// Forced termination. Only used when a kill timeout is configured.
    pub killer: Box<dyn ChildKiller + Send + Sync>,
    /// Output chunks followed by a single exit event.
    pub events: mpsc::Receiver<ProcessEvent>,
}

/// Creates processes for the supervisor.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, spec: &LaunchSpec) -> Result<LaunchedProcess, SupervisorError>;
}
