//! Contracts for the external services a client deployment depends on.
//!
//! Adapters never retry. A failed call surfaces as a [`ProviderError`] which the
//! deploy pipeline turns into a step-level error event.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{CallQuery, CallRecord, ClientSlug};

pub const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{provider} {operation}: {status} - {body}")]
    Status { provider: String, operation: String, status: u16, body: String },
    #[error("{provider} {operation}: request failed: {message}")]
    Transport { provider: String, operation: String, message: String },
    #[error("{provider} {operation}: unexpected response: {message}")]
    Decode { provider: String, operation: String, message: String },
}

impl ProviderError {
    pub fn status(
        provider: impl Into<String>,
        operation: impl Into<String>,
        status: u16,
        body: &str,
    ) -> Self {
        Self::Status {
            provider: provider.into(),
            operation: operation.into(),
            status,
            body: truncate_body(body),
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            Self::Status { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Decode { provider, .. } => provider,
        }
    }
}

pub fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventTypeRequest {
    pub title: String,
    pub slug: String,
    pub length_minutes: u32,
    pub description: String,
    pub location_address: String,
}

/// A callable capability attached to the agent's LLM.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_destination: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speak_during_execution: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speak_after_execution: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_message_description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LlmRequest {
    pub model: String,
    pub general_prompt: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// Conversation behaviour applied to every agent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentTuning {
    pub ambient_sound: String,
    pub responsiveness: f64,
    pub interruption_sensitivity: f64,
    pub enable_backchannel: bool,
    pub backchannel_frequency: f64,
    pub reminder_trigger_ms: u64,
    pub reminder_max_count: u32,
    pub voicemail_detection_timeout_ms: u64,
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            ambient_sound: "coffee-shop".to_string(),
            responsiveness: 1.0,
            interruption_sensitivity: 1.0,
            enable_backchannel: true,
            backchannel_frequency: 0.8,
            reminder_trigger_ms: 10_000,
            reminder_max_count: 2,
            voicemail_detection_timeout_ms: 30_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentRequest {
    pub agent_name: String,
    pub llm_id: String,
    pub voice_id: String,
    pub language: String,
    pub tuning: AgentTuning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhoneNumberRequest {
    pub area_code: u16,
    pub inbound_agent_id: String,
    pub nickname: String,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn create_event_type(&self, request: &EventTypeRequest) -> Result<i64, ProviderError>;
}

#[async_trait]
pub trait VoiceAgentProvider: Send + Sync {
    async fn create_llm(&self, request: &LlmRequest) -> Result<String, ProviderError>;
    async fn create_agent(&self, request: &AgentRequest) -> Result<String, ProviderError>;
    async fn update_agent_webhook(
        &self,
        agent_id: &str,
        webhook_url: &str,
    ) -> Result<(), ProviderError>;
    async fn create_phone_number(
        &self,
        request: &PhoneNumberRequest,
    ) -> Result<String, ProviderError>;
    async fn list_calls(&self, query: &CallQuery) -> Result<Vec<CallRecord>, ProviderError>;
}

#[async_trait]
pub trait WorkflowProvider: Send + Sync {
    async fn create_workflow(&self, definition: &Value) -> Result<String, ProviderError>;
    async fn activate_workflow(&self, workflow_id: &str) -> Result<(), ProviderError>;
    fn webhook_url(&self, slug: &ClientSlug) -> String;
}
