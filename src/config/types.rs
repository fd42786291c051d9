use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::gate::Role;

/// Root configuration container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub process: ProcessConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the panel (host:port).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// How long shutdown waits for the game server to stop (default: 30).
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

/// How the supervised server is launched and talked to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Java executable (absolute path or a name on PATH).
    #[serde(default = "default_java_path")]
    pub java_path: String,
    /// Working directory of the server; the jar lives here.
    #[serde(default = "default_server_dir")]
    pub server_dir: PathBuf,
    /// Server jar file name, relative to `server_dir`.
    #[serde(default = "default_jar_file")]
    pub jar_file: String,
    /// Initial heap, passed as `-Xms`.
    #[serde(default = "default_min_memory")]
    pub min_memory: String,
    /// Maximum heap, passed as `-Xmx`.
    #[serde(default = "default_max_memory")]
    pub max_memory: String,
    /// Arguments appended after the jar (default: `nogui`).
    #[serde(default = "default_extra_args")]
    pub extra_args: Vec<String>,
    /// TERM value for the pseudo-terminal.
    #[serde(default = "default_term_name")]
    pub term_name: String,
    #[serde(default = "default_pty_cols")]
    pub pty_cols: u16,
    #[serde(default = "default_pty_rows")]
    pub pty_rows: u16,
    /// Appended to every line written to the server console.
    #[serde(default = "default_line_terminator")]
    pub line_terminator: String,
    /// Console command that makes the server shut down by itself.
    #[serde(default = "default_stop_command")]
    pub stop_command: String,
    /// All of these must appear in one output line to count as ready.
    #[serde(default = "default_readiness_markers")]
    pub readiness_markers: Vec<String>,
    /// Kill the process if it is still alive this long after a stop request.
    /// Unset means never.
    #[serde(default)]
    pub force_kill_after_seconds: Option<u64>,
}

/// Observer fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Per-observer queue bound. Observers that fall this far behind are dropped.
    #[serde(default = "default_observer_queue")]
    pub observer_queue: usize,
    /// Prefix marking echoed commands in the console stream.
    #[serde(default = "default_echo_prefix")]
    pub echo_prefix: String,
}

/// Access control for the HTTP and WebSocket surface.
///
/// Disabled by default, in which case every caller acts as an anonymous
/// operator. Keep the default bind address on loopback in that case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

/// A bearer token and the identity it grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Name used in logs and command audit.
    pub name: String,
    pub token: String,
    /// `viewer` (default) or `operator`.
    #[serde(default)]
    pub role: Role,
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_java_path() -> String {
    "java".to_string()
}

fn default_server_dir() -> PathBuf {
    PathBuf::from("server")
}

fn default_jar_file() -> String {
    "craftbukkit-1.21.5.jar".to_string()
}

fn default_min_memory() -> String {
    "1G".to_string()
}

fn default_max_memory() -> String {
    "2G".to_string()
}

fn default_extra_args() -> Vec<String> {
    vec!["nogui".to_string()]
}

fn default_term_name() -> String {
    "xterm-color".to_string()
}

fn default_pty_cols() -> u16 {
    120
}

fn default_pty_rows() -> u16 {
    40
}

fn default_line_terminator() -> String {
    "\r".to_string()
}

fn default_stop_command() -> String {
    "stop".to_string()
}

fn default_readiness_markers() -> Vec<String> {
    vec!["Done".to_string(), "For help, type \"help\"".to_string()]
}

fn default_observer_queue() -> usize {
    256
}

fn default_echo_prefix() -> String {
    "> ".to_string()
}

fn default_auth_enabled() -> bool {
    false
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            shutdown_grace_seconds: default_shutdown_grace(),
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            java_path: default_java_path(),
            server_dir: default_server_dir(),
            jar_file: default_jar_file(),
            min_memory: default_min_memory(),
            max_memory: default_max_memory(),
            extra_args: default_extra_args(),
            term_name: default_term_name(),
            pty_cols: default_pty_cols(),
            pty_rows: default_pty_rows(),
            line_terminator: default_line_terminator(),
            stop_command: default_stop_command(),
            readiness_markers: default_readiness_markers(),
            force_kill_after_seconds: None,
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            observer_queue: default_observer_queue(),
            echo_prefix: default_echo_prefix(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: default_auth_enabled(),
            tokens: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }
}

impl ProcessConfig {
    /// Location of the jar that must exist before a spawn is attempted.
    pub fn artifact_path(&self) -> PathBuf {
        self.server_dir.join(&self.jar_file)
    }

    pub fn force_kill_after(&self) -> Option<Duration> {
        self.force_kill_after_seconds.map(Duration::from_secs)
    }
}
