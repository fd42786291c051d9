//! Real pseudo-terminal launches of small shell scripts.

#![cfg(unix)]

use mcpanel::pty::{LaunchSpec, ProcessEvent, ProcessLauncher, PtyLauncher};
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

fn shell(script: &str) -> LaunchSpec {
    LaunchSpec {
        program: "/bin/sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        cwd: std::env::temp_dir(),
        env: vec![("TERM".to_string(), "dumb".to_string())],
        cols: 80,
        rows: 24,
    }
}

/// Collect output until the exit event. Returns (output, exit code).
async fn drain(mut events: mpsc::Receiver<ProcessEvent>) -> (String, Option<i32>) {
    let mut output = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("process did not finish");
        match event {
            Some(ProcessEvent::Output(bytes)) => output.extend_from_slice(&bytes),
            Some(ProcessEvent::Exited { code }) => {
                return (String::from_utf8_lossy(&output).into_owned(), code)
            }
            None => panic!("channel closed without exit event"),
        }
    }
}

#[tokio::test]
async fn output_then_exit_code() {
    let launched = PtyLauncher::new()
        .launch(&shell("echo booting; echo ready; exit 3"))
        .unwrap();
    assert!(launched.pid.is_some());

    let (output, code) = drain(launched.events).await;
    assert!(output.contains("booting"));
    assert!(output.contains("ready"));
    assert_eq!(code, Some(3));
}

#[tokio::test]
async fn input_reaches_the_process() {
    let mut launched = PtyLauncher::new()
        .launch(&shell("read line; echo \"got:$line\""))
        .unwrap();
    launched.input.write_all(b"stop\r").unwrap();
    launched.input.flush().unwrap();

    let (output, code) = drain(launched.events).await;
    assert!(output.contains("got:stop"));
    assert_eq!(code, Some(0));
}

#[tokio::test]
async fn missing_program_fails_to_launch() {
    let spec = LaunchSpec {
        program: "/definitely/not/a/java".to_string(),
        ..shell("true")
    };
    assert!(PtyLauncher::new().launch(&spec).is_err());
}

#[tokio::test]
async fn killer_ends_the_process() {
    let mut launched = PtyLauncher::new().launch(&shell("sleep 30")).unwrap();
    launched.killer.kill().unwrap();

    let (_, code) = drain(launched.events).await;
    assert_ne!(code, Some(0));
}

#[tokio::test]
async fn exit_is_reported_while_a_grandchild_holds_the_terminal() {
    let launched = PtyLauncher::new()
        .launch(&shell("sleep 30 & echo started; exit 0"))
        .unwrap();

    let (output, code) = drain(launched.events).await;
    assert!(output.contains("started"));
    assert_eq!(code, Some(0));
}
