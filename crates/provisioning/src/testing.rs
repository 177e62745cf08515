//! Recording in-memory providers for exercising the deploy pipeline and the
//! analytics aggregator without network access.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use voxdesk_core::config::AppConfig;
use voxdesk_core::domain::{CallQuery, CallRecord, ClientSlug};
use voxdesk_core::providers::{
    AgentRequest, CalendarProvider, EventTypeRequest, LlmRequest, PhoneNumberRequest,
    ProviderError, VoiceAgentProvider, WorkflowProvider,
};

use crate::deploy::DeploySettings;

pub const WORKFLOW_BASE_URL: &str = "https://automation.test";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Settings with every provider credential present.
pub fn configured_settings() -> DeploySettings {
    let mut config = AppConfig::default();
    config.calendar.api_key = Some("cal_test_key".to_string().into());
    config.voice.api_key = Some("voice_test_key".to_string().into());
    config.workflow.base_url = Some(WORKFLOW_BASE_URL.to_string());
    config.workflow.api_key = Some("workflow_test_key".to_string().into());
    DeploySettings::from_config(&config)
}

fn injected(provider: &str, operation: &str) -> ProviderError {
    ProviderError::status(provider, operation, 500, "injected failure")
}

#[derive(Default)]
pub struct FakeCalendar {
    requests: Mutex<Vec<EventTypeRequest>>,
    failing: Mutex<bool>,
}

impl FakeCalendar {
    pub const EVENT_TYPE_ID: i64 = 4242;

    pub fn failing() -> Self {
        Self { failing: Mutex::new(true), ..Self::default() }
    }

    pub fn requests(&self) -> Vec<EventTypeRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    async fn create_event_type(&self, request: &EventTypeRequest) -> Result<i64, ProviderError> {
        lock(&self.requests).push(request.clone());
        if *lock(&self.failing) {
            return Err(injected("Cal.com", "/event-types"));
        }
        Ok(Self::EVENT_TYPE_ID)
    }
}

#[derive(Default)]
pub struct FakeVoice {
    llms: Mutex<Vec<LlmRequest>>,
    agents: Mutex<Vec<AgentRequest>>,
    numbers: Mutex<Vec<PhoneNumberRequest>>,
    webhooks: Mutex<Vec<(String, String)>>,
    call_queries: Mutex<Vec<CallQuery>>,
    calls: Mutex<HashMap<String, Vec<CallRecord>>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl FakeVoice {
    pub const LLM_ID: &'static str = "llm_test_1";
    pub const AGENT_ID: &'static str = "agent_test_1";
    pub const PHONE_NUMBER: &'static str = "+13055550123";

    /// Makes one operation (`create_llm`, `create_agent`, `create_phone_number`,
    /// `update_agent_webhook`, `list_calls`) fail.
    pub fn fail_on(&self, operation: &'static str) {
        lock(&self.failing).insert(operation);
    }

    pub fn with_calls(&self, agent_id: &str, calls: Vec<CallRecord>) {
        lock(&self.calls).insert(agent_id.to_string(), calls);
    }

    pub fn llm_requests(&self) -> Vec<LlmRequest> {
        lock(&self.llms).clone()
    }

    pub fn agent_requests(&self) -> Vec<AgentRequest> {
        lock(&self.agents).clone()
    }

    pub fn number_requests(&self) -> Vec<PhoneNumberRequest> {
        lock(&self.numbers).clone()
    }

    pub fn webhook_updates(&self) -> Vec<(String, String)> {
        lock(&self.webhooks).clone()
    }

    pub fn call_queries(&self) -> Vec<CallQuery> {
        lock(&self.call_queries).clone()
    }

    fn check(&self, operation: &'static str) -> Result<(), ProviderError> {
        if lock(&self.failing).contains(operation) {
            return Err(injected("Retell", operation));
        }
        Ok(())
    }
}

#[async_trait]
impl VoiceAgentProvider for FakeVoice {
    async fn create_llm(&self, request: &LlmRequest) -> Result<String, ProviderError> {
        lock(&self.llms).push(request.clone());
        self.check("create_llm")?;
        Ok(Self::LLM_ID.to_string())
    }

    async fn create_agent(&self, request: &AgentRequest) -> Result<String, ProviderError> {
        lock(&self.agents).push(request.clone());
        self.check("create_agent")?;
        Ok(Self::AGENT_ID.to_string())
    }

    async fn update_agent_webhook(
        &self,
        agent_id: &str,
        webhook_url: &str,
    ) -> Result<(), ProviderError> {
        lock(&self.webhooks).push((agent_id.to_string(), webhook_url.to_string()));
        self.check("update_agent_webhook")
    }

    async fn create_phone_number(
        &self,
        request: &PhoneNumberRequest,
    ) -> Result<String, ProviderError> {
        lock(&self.numbers).push(request.clone());
        self.check("create_phone_number")?;
        Ok(Self::PHONE_NUMBER.to_string())
    }

    async fn list_calls(&self, query: &CallQuery) -> Result<Vec<CallRecord>, ProviderError> {
        lock(&self.call_queries).push(query.clone());
        self.check("list_calls")?;
        let calls = lock(&self.calls);
        let found = match &query.agent_id {
            Some(agent_id) => calls.get(agent_id).cloned().unwrap_or_default(),
            None => calls.values().flatten().cloned().collect(),
        };
        Ok(found.into_iter().take(query.limit as usize).collect())
    }
}

#[derive(Default)]
pub struct FakeWorkflow {
    definitions: Mutex<Vec<Value>>,
    activated: Mutex<Vec<String>>,
    failing: Mutex<bool>,
}

impl FakeWorkflow {
    pub const WORKFLOW_ID: &'static str = "wf_test_1";

    pub fn failing() -> Self {
        Self { failing: Mutex::new(true), ..Self::default() }
    }

    pub fn definitions(&self) -> Vec<Value> {
        lock(&self.definitions).clone()
    }

    pub fn activated(&self) -> Vec<String> {
        lock(&self.activated).clone()
    }
}

#[async_trait]
impl WorkflowProvider for FakeWorkflow {
    async fn create_workflow(&self, definition: &Value) -> Result<String, ProviderError> {
        lock(&self.definitions).push(definition.clone());
        if *lock(&self.failing) {
            return Err(injected("n8n", "/workflows"));
        }
        Ok(Self::WORKFLOW_ID.to_string())
    }

    async fn activate_workflow(&self, workflow_id: &str) -> Result<(), ProviderError> {
        lock(&self.activated).push(workflow_id.to_string());
        Ok(())
    }

    fn webhook_url(&self, slug: &ClientSlug) -> String {
        format!("{WORKFLOW_BASE_URL}/webhook/{slug}")
    }
}
