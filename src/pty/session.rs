use portable_pty::{native_pty_system, CommandBuilder, ExitStatus, PtySize};
use std::io::{self, Read};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::pty::launcher::{LaunchedProcess, ProcessEvent, ProcessLauncher, EVENT_BUFFER};
use crate::pty::spawn_config::LaunchSpec;
use crate::supervisor::SupervisorError;

/// How long the waiter lets the reader drain after the child exits.
///
/// The reader holds its own duplicate of the master side, so if a
/// grandchild keeps the terminal open it never sees EOF. Past this limit the
/// exit is reported anyway and whatever the reader forwards later is dropped.
const READER_DRAIN: Duration = Duration::from_secs(2);

/// Launches processes attached to a native pseudo-terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct PtyLauncher;

impl PtyLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLauncher for PtyLauncher {
    fn launch(&self, spec: &LaunchSpec) -> Result<LaunchedProcess, SupervisorError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: spec.rows,
                cols: spec.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(spawn_failure)?;

        let mut cmd = CommandBuilder::new(&spec.program);
        cmd.args(&spec.args);
        cmd.cwd(&spec.cwd);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let mut child = pair.slave.spawn_command(cmd).map_err(spawn_failure)?;
        drop(pair.slave);

        let pid = child.process_id();
        let mut killer = child.clone_killer();

        let handles = pair
            .master
            .try_clone_reader()
            .and_then(|reader| Ok((reader, pair.master.take_writer()?)));
        let (reader, input) = match handles {
            Ok(handles) => handles,
            Err(err) => {
                let _ = killer.kill();
                return Err(spawn_failure(err));
            }
        };

        let (events, receiver) = mpsc::channel(EVENT_BUFFER);
        let master = pair.master;

        let output_events = events.clone();
        let reader_thread = thread::Builder::new()
            .name("pty-reader".to_string())
            .spawn(move || forward_output(reader, output_events));
        let reader_thread = match reader_thread {
            Ok(handle) => handle,
            Err(err) => {
                let _ = killer.kill();
                return Err(spawn_failure(err));
            }
        };

        let waiter = thread::Builder::new()
            .name("pty-waiter".to_string())
            .spawn(move || {
                let code = match child.wait() {
                    Ok(status) => exit_code(&status),
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to collect server exit status");
                        None
                    }
                };
                // Closing our end lets the reader hit EOF once the
                // remaining output is drained.
                drop(master);
                join_reader(reader_thread, READER_DRAIN);
                let _ = events.blocking_send(ProcessEvent::Exited { code });
            });
        if let Err(err) = waiter {
            let _ = killer.kill();
            return Err(spawn_failure(err));
        }

        tracing::debug!(pid = ?pid, command = %spec.display_command(), "PTY process launched");

        Ok(LaunchedProcess {
            pid,
            input,
            killer,
            events: receiver,
        })
    }
}

fn forward_output(mut reader: Box<dyn Read + Send>, events: mpsc::Sender<ProcessEvent>) {
    let mut buffer = [0u8; 8192];
    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            // EIO is how Linux reports a PTY whose other side has gone away.
            Err(_) => break,
        };
        if events
            .blocking_send(ProcessEvent::Output(buffer[..count].to_vec()))
            .is_err()
        {
            break;
        }
    }
}

/// Exit code as reported to observers. Codes that do not fit an `i32`
/// are reported as unknown rather than wrapped.
fn exit_code(status: &ExitStatus) -> Option<i32> {
    i32::try_from(status.exit_code()).ok()
}

/// Join the reader unless it is still running after `limit`.
fn join_reader(reader: JoinHandle<()>, limit: Duration) {
    let started = Instant::now();
    while !reader.is_finished() {
        if started.elapsed() >= limit {
            tracing::warn!("Terminal still held open after exit, not waiting for more output");
            return;
        }
        thread::sleep(Duration::from_millis(20));
    }
    let _ = reader.join();
}

fn spawn_failure(err: impl std::fmt::Display) -> SupervisorError {
    SupervisorError::SpawnFailure {
        reason: err.to_string(),
    }
}
