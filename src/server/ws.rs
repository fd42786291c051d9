//! WebSocket observer channel.
//!
//! Outbound frames are serialized [`HubEvent`]s. The only inbound frame is
//! `{"type": "command", "command": "..."}`; failures are answered with
//! `{"type": "error", "message": "..."}` on the same socket.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

use crate::gate::{Identity, Privilege};
use crate::hub::BroadcastHub;
use crate::server::auth::Caller;
use crate::server::error::ApiError;
use crate::server::routes::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum InboundFrame {
    Command { command: String },
}

/// GET /api/ws
pub async fn observe(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Response, ApiError> {
    state.hub.gate().authorize(&caller, Privilege::Observe)?;
    Ok(ws.on_upgrade(move |socket| run_observer(socket, state, caller)))
}

async fn run_observer(mut socket: WebSocket, state: AppState, identity: Identity) {
    let hub = state.hub;
    let mut subscription = hub.subscribe();
    let id = subscription.id();
    tracing::info!(observer = %id, caller = %identity.name, "Observer connected");

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    tracing::info!(observer = %id, "Observer fell behind, closing socket");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(err) => {
                        tracing::error!(error = %err, "Failed to serialize event");
                        continue;
                    }
                };
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_frame(&hub, &identity, text.as_str()) {
                            if socket.send(Message::Text(reply.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = state.shutdown.wait_for_shutdown() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    hub.unsubscribe(id);
    tracing::info!(observer = %id, "Observer disconnected");
}

/// Handle one inbound text frame. Returns an error frame to send back, if any.
fn handle_frame(hub: &BroadcastHub, identity: &Identity, text: &str) -> Option<String> {
    let result = match serde_json::from_str::<InboundFrame>(text) {
        Ok(InboundFrame::Command { command }) => hub
            .submit_command(identity, &command)
            .map_err(|err| err.to_string()),
        Err(err) => Err(format!("Malformed message: {err}")),
    };
    result
        .err()
        .map(|message| json!({ "type": "error", "message": message }).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessConfig;
    use crate::gate::{OpenGate, Role};
    use crate::hub::EventBus;
    use crate::pty::{LaunchSpec, LaunchedProcess, ProcessLauncher};
    use crate::supervisor::{Supervisor, SupervisorError, SupervisorSettings};
    use serde_json::Value;
    use std::sync::Arc;

    struct NoLaunch;

    impl ProcessLauncher for NoLaunch {
        fn launch(&self, _spec: &LaunchSpec) -> Result<LaunchedProcess, SupervisorError> {
            Err(SupervisorError::SpawnFailure {
                reason: "not in this test".to_string(),
            })
        }
    }

    fn hub() -> BroadcastHub {
        let bus = EventBus::new(8);
        let settings = SupervisorSettings::from_config(&ProcessConfig::default());
        let supervisor = Supervisor::new(settings, Arc::new(NoLaunch), bus.clone());
        BroadcastHub::new(bus, supervisor, Arc::new(OpenGate), "> ")
    }

    fn error_message(frame: Option<String>) -> String {
        let value: Value = serde_json::from_str(&frame.expect("expected an error frame")).unwrap();
        assert_eq!(value["type"], "error");
        value["message"].as_str().unwrap().to_string()
    }

    #[test]
    fn malformed_frames_get_an_error_reply() {
        let hub = hub();
        let me = Identity::new("op", Role::Operator);
        assert!(error_message(handle_frame(&hub, &me, "not json")).starts_with("Malformed"));
        assert!(
            error_message(handle_frame(&hub, &me, r#"{"type":"resize","cols":80}"#))
                .starts_with("Malformed")
        );
    }

    #[test]
    fn command_errors_are_reported_to_the_sender() {
        let hub = hub();
        let me = Identity::new("op", Role::Operator);
        let frame = handle_frame(&hub, &me, r#"{"type":"command","command":"list"}"#);
        assert_eq!(error_message(frame), "Server is not running");

        let viewer = Identity::new("bob", Role::Viewer);
        let frame = handle_frame(&hub, &viewer, r#"{"type":"command","command":"list"}"#);
        assert_eq!(error_message(frame), "'bob' is not allowed to control");
    }
}
