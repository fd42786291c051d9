use serde::Serialize;

use crate::lifecycle::LifecycleStatus;

/// One event as delivered to observers.
///
/// `seq` is assigned at publish time and strictly increases across every
/// event the hub emits, so observers can order what they receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubEvent {
    pub seq: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    /// A sanitized chunk of console text, or a command echo.
    OutputLine { text: String },
    /// The lifecycle status changed, or the current status on join.
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        status: LifecycleStatus,
        exit_code: Option<i32>,
    },
}

impl HubEvent {
    pub fn output_text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::OutputLine { text } => Some(text),
            EventKind::StatusChanged { .. } => None,
        }
    }

    pub fn status(&self) -> Option<LifecycleStatus> {
        match &self.kind {
            EventKind::StatusChanged { status, .. } => Some(*status),
            EventKind::OutputLine { .. } => None,
        }
    }
}
