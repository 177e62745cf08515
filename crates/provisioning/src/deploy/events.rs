use serde::Serialize;
use serde_json::Value;

use voxdesk_core::domain::ProvisioningState;

pub const START_STEP: i32 = 0;
pub const DONE_STEP: i32 = 99;
pub const FATAL_STEP: i32 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Running,
    Ok,
    Error,
    Done,
}

/// One entry of the deploy progress log, serialized as a server-sent event payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeployEvent {
    pub step: i32,
    pub status: StepStatus,
    pub message: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl DeployEvent {
    pub fn running(step: i32, message: impl Into<String>) -> Self {
        Self::new(step, StepStatus::Running, message)
    }

    pub fn ok(step: i32, message: impl Into<String>) -> Self {
        Self::new(step, StepStatus::Ok, message)
    }

    pub fn skipped(step: i32, message: impl Into<String>) -> Self {
        Self { skipped: true, ..Self::new(step, StepStatus::Ok, message) }
    }

    pub fn error(step: i32, message: impl Into<String>) -> Self {
        Self::new(step, StepStatus::Error, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(FATAL_STEP, StepStatus::Error, message)
    }

    pub fn done(summary: &DeploySummary) -> Self {
        Self {
            extra: serde_json::to_value(summary).ok(),
            ..Self::new(DONE_STEP, StepStatus::Done, "Agent ready to receive calls")
        }
    }

    pub fn with_extra(mut self, extra: Option<Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.step == DONE_STEP || self.step == FATAL_STEP
    }

    fn new(step: i32, status: StepStatus, message: impl Into<String>) -> Self {
        Self { step, status, message: message.into(), skipped: false, extra: None }
    }
}

/// Final known provisioning values, reported with the `done` event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeploySummary {
    pub agent_id: Option<String>,
    pub phone_number: Option<String>,
    pub webhook_url: Option<String>,
    pub calendar_event_type_id: Option<i64>,
    pub workflow_id: Option<String>,
}

impl From<&ProvisioningState> for DeploySummary {
    fn from(state: &ProvisioningState) -> Self {
        Self {
            agent_id: state.voice_agent_id.clone(),
            phone_number: state.phone_number.clone(),
            webhook_url: state.webhook_url.clone(),
            calendar_event_type_id: state.calendar_event_type_id,
            workflow_id: state.workflow_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DeployEvent, DeploySummary};

    #[test]
    fn skipped_flag_is_only_serialized_when_set() {
        let plain = serde_json::to_value(DeployEvent::ok(1, "done")).expect("encode");
        assert_eq!(plain, json!({ "step": 1, "status": "ok", "message": "done" }));

        let skipped = serde_json::to_value(DeployEvent::skipped(3, "omitted")).expect("encode");
        assert_eq!(skipped["skipped"], true);
        assert_eq!(skipped["status"], "ok");
    }

    #[test]
    fn done_event_carries_the_summary() {
        let summary = DeploySummary {
            agent_id: Some("agent_1".to_string()),
            ..DeploySummary::default()
        };
        let event = DeployEvent::done(&summary);

        assert!(event.is_terminal());
        let encoded = serde_json::to_value(&event).expect("encode");
        assert_eq!(encoded["step"], 99);
        assert_eq!(encoded["status"], "done");
        assert_eq!(encoded["extra"]["agent_id"], "agent_1");
        assert_eq!(encoded["extra"]["calendar_event_type_id"], serde_json::Value::Null);
    }
}
