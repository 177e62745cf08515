use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::SecretString;
use serde_json::{json, Value};

use voxdesk_core::config::VoiceConfig;
use voxdesk_core::domain::{CallQuery, CallRecord};
use voxdesk_core::providers::{
    AgentRequest, LlmRequest, PhoneNumberRequest, ProviderError, VoiceAgentProvider,
};

use super::{credential, decode_error, send_json, string_field, trim_base};

const PROVIDER: &str = "Retell";
const CREATE_LLM: &str = "/create-retell-llm";
const CREATE_AGENT: &str = "/create-agent";
const CREATE_PHONE_NUMBER: &str = "/create-phone-number";
const LIST_CALLS: &str = "/v2/list-calls";

/// Retell AI client covering LLMs, agents, telephony and call history.
pub struct RetellClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl RetellClient {
    pub fn new(http: Client, config: &VoiceConfig) -> Self {
        Self { http, base_url: trim_base(&config.base_url), api_key: config.api_key.clone() }
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ProviderError> {
        let key = credential(PROVIDER, endpoint, self.api_key.as_ref())?;
        Ok(self.http.request(method, format!("{}{endpoint}", self.base_url)).bearer_auth(key))
    }

    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        operation: &str,
        payload: &Value,
    ) -> Result<Value, ProviderError> {
        let request = self.request(method, endpoint)?.json(payload);
        send_json(PROVIDER, operation, request).await
    }
}

fn agent_body(request: &AgentRequest) -> Result<Value, ProviderError> {
    let mut body = serde_json::to_value(&request.tuning)
        .map_err(|error| decode_error(PROVIDER, CREATE_AGENT, error))?;
    if let Value::Object(fields) = &mut body {
        fields.insert("agent_name".into(), json!(request.agent_name));
        fields.insert(
            "response_engine".into(),
            json!({ "type": "retell-llm", "llm_id": request.llm_id }),
        );
        fields.insert("voice_id".into(), json!(request.voice_id));
        fields.insert("language".into(), json!(request.language));
    }
    Ok(body)
}

fn list_calls_body(query: &CallQuery) -> Value {
    let mut body = json!({ "limit": query.limit });
    if let Some(agent_id) = &query.agent_id {
        body["filter_criteria"] = json!({ "agent_id": [agent_id] });
    }
    body
}

#[async_trait]
impl VoiceAgentProvider for RetellClient {
    async fn create_llm(&self, request: &LlmRequest) -> Result<String, ProviderError> {
        let payload =
            serde_json::to_value(request)
                .map_err(|error| decode_error(PROVIDER, CREATE_LLM, error))?;
        let body = self.call(Method::POST, CREATE_LLM, CREATE_LLM, &payload).await?;
        string_field(PROVIDER, CREATE_LLM, &body, "llm_id")
    }

    async fn create_agent(&self, request: &AgentRequest) -> Result<String, ProviderError> {
        let payload = agent_body(request)?;
        let body = self.call(Method::POST, CREATE_AGENT, CREATE_AGENT, &payload).await?;
        string_field(PROVIDER, CREATE_AGENT, &body, "agent_id")
    }

    async fn update_agent_webhook(
        &self,
        agent_id: &str,
        webhook_url: &str,
    ) -> Result<(), ProviderError> {
        let endpoint = format!("/update-agent/{agent_id}");
        self.call(Method::PATCH, &endpoint, &endpoint, &json!({ "webhook_url": webhook_url }))
            .await
            .map(|_| ())
    }

    async fn create_phone_number(
        &self,
        request: &PhoneNumberRequest,
    ) -> Result<String, ProviderError> {
        let payload = serde_json::to_value(request)
            .map_err(|error| decode_error(PROVIDER, CREATE_PHONE_NUMBER, error))?;
        let body =
            self.call(Method::POST, CREATE_PHONE_NUMBER, CREATE_PHONE_NUMBER, &payload).await?;
        string_field(PROVIDER, CREATE_PHONE_NUMBER, &body, "phone_number")
    }

    /// A body that is not a JSON array is treated as an empty history.
    async fn list_calls(&self, query: &CallQuery) -> Result<Vec<CallRecord>, ProviderError> {
        let body = self.call(Method::POST, LIST_CALLS, LIST_CALLS, &list_calls_body(query)).await?;
        match body {
            Value::Array(_) => serde_json::from_value(body)
                .map_err(|error| decode_error(PROVIDER, LIST_CALLS, error)),
            _ => Ok(Vec::new()),
        }
    }
}
