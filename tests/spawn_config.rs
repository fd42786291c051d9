use mcpanel::config::ProcessConfig;
use mcpanel::pty::LaunchSpec;
use std::path::PathBuf;

#[test]
fn default_command_line() {
    let spec = LaunchSpec::from_config(&ProcessConfig::default());
    assert_eq!(spec.program, "java");
    assert_eq!(
        spec.args,
        vec!["-Xmx2G", "-Xms1G", "-jar", "craftbukkit-1.21.5.jar", "nogui"]
    );
    assert_eq!(spec.cwd, PathBuf::from("server"));
}

#[test]
fn memory_and_extra_args_come_from_config() {
    let config = ProcessConfig {
        java_path: "/opt/jdk21/bin/java".to_string(),
        jar_file: "paper.jar".to_string(),
        min_memory: "512M".to_string(),
        max_memory: "6G".to_string(),
        extra_args: vec!["--nogui".to_string(), "--port".to_string(), "25570".to_string()],
        ..ProcessConfig::default()
    };
    let spec = LaunchSpec::from_config(&config);
    assert_eq!(
        spec.display_command(),
        "/opt/jdk21/bin/java -Xmx6G -Xms512M -jar paper.jar --nogui --port 25570"
    );
}

#[test]
fn terminal_settings_are_passed_through() {
    let config = ProcessConfig {
        term_name: "dumb".to_string(),
        pty_cols: 200,
        pty_rows: 50,
        ..ProcessConfig::default()
    };
    let spec = LaunchSpec::from_config(&config);
    assert_eq!(spec.env, vec![("TERM".to_string(), "dumb".to_string())]);
    assert_eq!((spec.cols, spec.rows), (200, 50));
}

#[test]
fn no_extra_args() {
    let config = ProcessConfig {
        extra_args: vec![],
        ..ProcessConfig::default()
    };
    let spec = LaunchSpec::from_config(&config);
    assert_eq!(spec.args.last().map(String::as_str), Some("craftbukkit-1.21.5.jar"));
}
