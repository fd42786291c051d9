use std::path::PathBuf;

use crate::config::ProcessConfig;

/// Everything needed to start the server process.
///
/// Built from [`ProcessConfig`] with a fixed argument layout:
/// `-Xmx<max> -Xms<min> -jar <jar> <extra...>`, run from the server directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub cols: u16,
    pub rows: u16,
}

impl LaunchSpec {
    pub fn from_config(config: &ProcessConfig) -> Self {
        let mut args = vec![
            format!("-Xmx{}", config.max_memory),
            format!("-Xms{}", config.min_memory),
            "-jar".to_string(),
            config.jar_file.clone(),
        ];
        args.extend(config.extra_args.iter().cloned());

        Self {
            program: config.java_path.clone(),
            args,
            cwd: config.server_dir.clone(),
            env: vec![("TERM".to_string(), config.term_name.clone())],
            cols: config.pty_cols,
            rows: config.pty_rows,
        }
    }

    /// The full command line, for logging.
    pub fn display_command(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}
