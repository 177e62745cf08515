//! The five provisioning steps, in dependency order.
//!
//! Each step is a descriptor: a gate deciding whether it runs, an executor calling
//! the providers, and the [`ProvisioningUpdate`] the orchestrator persists on success.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use voxdesk_core::config::{AppConfig, CalendarConfig, VoiceConfig, WorkflowConfig};
use voxdesk_core::domain::{ClientProfile, ClientRecord, ProvisioningUpdate};
use voxdesk_core::providers::{
    AgentRequest, AgentTuning, CalendarProvider, EventTypeRequest, LlmRequest, PhoneNumberRequest,
    ProviderError, VoiceAgentProvider, WorkflowProvider,
};

use crate::tools::{calendar_tools, transfer_tool};
use crate::workflow::call_report_workflow;

const MISSING_CALENDAR_KEY: &str =
    "Missing calendar.api_key (VOXDESK_CALENDAR_API_KEY); calendar not configured";
const MISSING_VOICE_KEY: &str = "Missing voice.api_key (VOXDESK_VOICE_API_KEY)";
const MISSING_WORKFLOW: &str =
    "Missing workflow.base_url or workflow.api_key (VOXDESK_WORKFLOW_BASE_URL / VOXDESK_WORKFLOW_API_KEY)";

/// Provider credentials and defaults the steps read.
#[derive(Clone, Debug)]
pub struct DeploySettings {
    pub calendar: CalendarConfig,
    pub voice: VoiceConfig,
    pub workflow: WorkflowConfig,
}

impl DeploySettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            calendar: config.calendar.clone(),
            voice: config.voice.clone(),
            workflow: config.workflow.clone(),
        }
    }
}

pub struct DeployContext {
    pub calendar: Arc<dyn CalendarProvider>,
    pub voice: Arc<dyn VoiceAgentProvider>,
    pub workflow: Arc<dyn WorkflowProvider>,
    pub settings: DeploySettings,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    Run,
    /// Precondition already holds or a prerequisite is absent.
    Skip(String),
    /// A required credential is missing; reported as a step error without calling out.
    Misconfigured(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepOutcome {
    pub update: ProvisioningUpdate,
    pub message: String,
    pub extra: Option<Value>,
}

#[async_trait]
pub trait ProvisioningStep: Send + Sync {
    fn number(&self) -> i32;

    fn name(&self) -> &'static str;

    fn running_message(&self) -> &'static str;

    fn gate(&self, profile: &ClientProfile, settings: &DeploySettings) -> Gate;

    async fn execute(
        &self,
        record: &ClientRecord,
        context: &DeployContext,
    ) -> Result<StepOutcome, ProviderError>;
}

pub fn default_steps() -> Vec<Box<dyn ProvisioningStep>> {
    vec![
        Box::new(CalendarStep),
        Box::new(VoiceAgentStep),
        Box::new(PhoneNumberStep),
        Box::new(WorkflowStep),
        Box::new(WebhookLinkStep),
    ]
}

pub struct CalendarStep;

#[async_trait]
impl ProvisioningStep for CalendarStep {
    fn number(&self) -> i32 {
        1
    }

    fn name(&self) -> &'static str {
        "calendar"
    }

    fn running_message(&self) -> &'static str {
        "Configuring appointment scheduling..."
    }

    fn gate(&self, profile: &ClientProfile, settings: &DeploySettings) -> Gate {
        if !profile.calendar_enabled {
            return Gate::Skip("Calendar disabled for this client".to_string());
        }
        if let Some(id) = profile.provisioning.calendar_event_type_id {
            return Gate::Skip(format!("Calendar already configured: {id}"));
        }
        if !settings.calendar.is_configured() {
            return Gate::Misconfigured(MISSING_CALENDAR_KEY.to_string());
        }
        Gate::Run
    }

    async fn execute(
        &self,
        record: &ClientRecord,
        context: &DeployContext,
    ) -> Result<StepOutcome, ProviderError> {
        let profile = &record.profile;
        let address = if profile.address.trim().is_empty() {
            "Consultar".to_string()
        } else {
            profile.address.clone()
        };

        let id = context
            .calendar
            .create_event_type(&EventTypeRequest {
                title: format!("Cita en {}", profile.business_name),
                slug: profile.slug.hyphenated(),
                length_minutes: profile.appointment_duration_minutes,
                description: format!(
                    "Cita agendada por la recepcionista virtual de {}",
                    profile.business_name
                ),
                location_address: address,
            })
            .await?;

        Ok(StepOutcome {
            update: ProvisioningUpdate {
                calendar_event_type_id: Some(id),
                ..ProvisioningUpdate::default()
            },
            message: format!("Calendar configured: ID {id}"),
            extra: None,
        })
    }
}

pub struct VoiceAgentStep;

#[async_trait]
impl ProvisioningStep for VoiceAgentStep {
    fn number(&self) -> i32 {
        2
    }

    fn name(&self) -> &'static str {
        "voice_agent"
    }

    fn running_message(&self) -> &'static str {
        "Creating the voice agent..."
    }

    fn gate(&self, profile: &ClientProfile, settings: &DeploySettings) -> Gate {
        if let Some(agent_id) = &profile.provisioning.voice_agent_id {
            return Gate::Skip(format!("Agent already exists: {agent_id}"));
        }
        if !settings.voice.is_configured() {
            return Gate::Misconfigured(MISSING_VOICE_KEY.to_string());
        }
        Gate::Run
    }

    async fn execute(
        &self,
        record: &ClientRecord,
        context: &DeployContext,
    ) -> Result<StepOutcome, ProviderError> {
        let profile = &record.profile;
        let settings = &context.settings;

        let mut tools = Vec::new();
        if let (true, Some(event_type_id)) =
            (profile.calendar_enabled, profile.provisioning.calendar_event_type_id)
        {
            tools.extend(calendar_tools(
                &settings.calendar,
                event_type_id,
                profile.appointment_duration_minutes,
            ));
        }
        if let Some(number) = profile.forwarding_number() {
            tools.push(transfer_tool(&profile.professional_name, number));
        }

        let llm_id = context
            .voice
            .create_llm(&LlmRequest {
                model: settings.voice.model.clone(),
                general_prompt: record.prompt.clone(),
                tools,
            })
            .await?;

        let voice_id = if profile.voice_id.trim().is_empty() {
            settings.voice.default_voice_id.clone()
        } else {
            profile.voice_id.clone()
        };
        let agent_id = context
            .voice
            .create_agent(&AgentRequest {
                agent_name: profile.agent_name.clone(),
                llm_id: llm_id.clone(),
                voice_id,
                language: settings.voice.language.clone(),
                tuning: AgentTuning::default(),
            })
            .await?;

        Ok(StepOutcome {
            message: format!("Agent created: {agent_id}"),
            extra: Some(json!({ "agent_id": agent_id })),
            update: ProvisioningUpdate {
                voice_agent_id: Some(agent_id),
                llm_id: Some(llm_id),
                ..ProvisioningUpdate::default()
            },
        })
    }
}

pub struct PhoneNumberStep;

#[async_trait]
impl ProvisioningStep for PhoneNumberStep {
    fn number(&self) -> i32 {
        3
    }

    fn name(&self) -> &'static str {
        "phone_number"
    }

    fn running_message(&self) -> &'static str {
        "Purchasing a phone number..."
    }

    fn gate(&self, profile: &ClientProfile, settings: &DeploySettings) -> Gate {
        if let Some(number) = &profile.provisioning.phone_number {
            return Gate::Skip(format!("Number already assigned: {number}"));
        }
        if !profile.buy_phone_number {
            return Gate::Skip("Number omitted: client uses call forwarding".to_string());
        }
        if profile.provisioning.voice_agent_id.is_none() {
            return Gate::Skip("Number omitted: no agent id yet".to_string());
        }
        if !settings.voice.is_configured() {
            return Gate::Misconfigured(MISSING_VOICE_KEY.to_string());
        }
        Gate::Run
    }

    async fn execute(
        &self,
        record: &ClientRecord,
        context: &DeployContext,
    ) -> Result<StepOutcome, ProviderError> {
        let profile = &record.profile;
        let agent_id = profile.provisioning.voice_agent_id.clone().unwrap_or_default();

        let number = context
            .voice
            .create_phone_number(&PhoneNumberRequest {
                area_code: profile.area_code.unwrap_or(context.settings.voice.default_area_code),
                inbound_agent_id: agent_id,
                nickname: profile.business_name.clone(),
            })
            .await?;

        Ok(StepOutcome {
            message: format!("Number purchased: {number}"),
            extra: Some(json!({ "phone_number": number })),
            update: ProvisioningUpdate {
                phone_number: Some(number),
                ..ProvisioningUpdate::default()
            },
        })
    }
}

pub struct WorkflowStep;

#[async_trait]
impl ProvisioningStep for WorkflowStep {
    fn number(&self) -> i32 {
        4
    }

    fn name(&self) -> &'static str {
        "workflow"
    }

    fn running_message(&self) -> &'static str {
        "Creating the call-report workflow..."
    }

    fn gate(&self, profile: &ClientProfile, settings: &DeploySettings) -> Gate {
        if let Some(workflow_id) = &profile.provisioning.workflow_id {
            return Gate::Skip(format!("Workflow already exists: {workflow_id}"));
        }
        if !settings.workflow.is_configured() {
            return Gate::Misconfigured(MISSING_WORKFLOW.to_string());
        }
        Gate::Run
    }

    async fn execute(
        &self,
        record: &ClientRecord,
        context: &DeployContext,
    ) -> Result<StepOutcome, ProviderError> {
        let profile = &record.profile;
        let workflow_id =
            context.workflow.create_workflow(&call_report_workflow(profile)).await?;
        context.workflow.activate_workflow(&workflow_id).await?;

        Ok(StepOutcome {
            message: format!("Workflow active: {workflow_id}"),
            extra: None,
            update: ProvisioningUpdate {
                workflow_id: Some(workflow_id),
                webhook_url: Some(context.workflow.webhook_url(&profile.slug)),
                ..ProvisioningUpdate::default()
            },
        })
    }
}

pub struct WebhookLinkStep;

#[async_trait]
impl ProvisioningStep for WebhookLinkStep {
    fn number(&self) -> i32 {
        5
    }

    fn name(&self) -> &'static str {
        "webhook_link"
    }

    fn running_message(&self) -> &'static str {
        "Linking the workflow webhook to the agent..."
    }

    fn gate(&self, profile: &ClientProfile, settings: &DeploySettings) -> Gate {
        let state = &profile.provisioning;
        if state.voice_agent_id.is_none() || state.webhook_url.is_none() {
            return Gate::Skip("Link omitted: missing agent id or webhook url".to_string());
        }
        if state.webhook_linked() {
            return Gate::Skip("Webhook already linked to the agent".to_string());
        }
        if !settings.voice.is_configured() {
            return Gate::Misconfigured(MISSING_VOICE_KEY.to_string());
        }
        Gate::Run
    }

    async fn execute(
        &self,
        record: &ClientRecord,
        context: &DeployContext,
    ) -> Result<StepOutcome, ProviderError> {
        let state = &record.profile.provisioning;
        let agent_id = state.voice_agent_id.clone().unwrap_or_default();
        let webhook_url = state.webhook_url.clone().unwrap_or_default();

        context.voice.update_agent_webhook(&agent_id, &webhook_url).await?;

        Ok(StepOutcome {
            message: "Webhook linked to the agent".to_string(),
            extra: None,
            update: ProvisioningUpdate {
                linked_webhook_url: Some(webhook_url),
                ..ProvisioningUpdate::default()
            },
        })
    }
}
