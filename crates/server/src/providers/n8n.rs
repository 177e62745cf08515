use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::SecretString;
use serde_json::Value;

use voxdesk_core::config::WorkflowConfig;
use voxdesk_core::domain::ClientSlug;
use voxdesk_core::providers::{ProviderError, WorkflowProvider};

use super::{credential, send_json, string_field, trim_base};

const PROVIDER: &str = "n8n";
const API_KEY_HEADER: &str = "X-N8N-API-KEY";

pub struct N8nClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl N8nClient {
    pub fn new(http: Client, config: &WorkflowConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.as_deref().map(trim_base).unwrap_or_default(),
            api_key: config.api_key.clone(),
        }
    }

    fn post(&self, endpoint: &str) -> Result<RequestBuilder, ProviderError> {
        if self.base_url.is_empty() {
            return Err(ProviderError::Transport {
                provider: PROVIDER.to_string(),
                operation: endpoint.to_string(),
                message: "base url not configured".to_string(),
            });
        }
        let key = credential(PROVIDER, endpoint, self.api_key.as_ref())?;
        Ok(self
            .http
            .post(format!("{}/api/v1{endpoint}", self.base_url))
            .header(API_KEY_HEADER, key))
    }
}

#[async_trait]
impl WorkflowProvider for N8nClient {
    async fn create_workflow(&self, definition: &Value) -> Result<String, ProviderError> {
        let endpoint = "/workflows";
        let body = send_json(PROVIDER, endpoint, self.post(endpoint)?.json(definition)).await?;
        string_field(PROVIDER, endpoint, &body, "id")
    }

    async fn activate_workflow(&self, workflow_id: &str) -> Result<(), ProviderError> {
        let endpoint = format!("/workflows/{workflow_id}/activate");
        send_json(PROVIDER, &endpoint, self.post(&endpoint)?).await.map(|_| ())
    }

    fn webhook_url(&self, slug: &ClientSlug) -> String {
        format!("{}/webhook/{slug}", self.base_url)
    }
}
