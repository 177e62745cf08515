//! reqwest-backed adapters for the calendar, voice-agent and workflow services.
//!
//! Every adapter funnels through [`send_json`], so non-2xx responses carry the
//! provider name, the endpoint, the status and a truncated body.

pub mod calcom;
pub mod n8n;
pub mod retell;

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

use voxdesk_core::config::HttpConfig;
use voxdesk_core::providers::ProviderError;

pub use calcom::CalComClient;
pub use n8n::N8nClient;
pub use retell::RetellClient;

/// Shared client with a bounded per-request timeout.
pub fn http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

pub(crate) fn credential<'a>(
    provider: &str,
    operation: &str,
    key: Option<&'a SecretString>,
) -> Result<&'a str, ProviderError> {
    key.map(|secret| secret.expose_secret())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ProviderError::Transport {
            provider: provider.to_string(),
            operation: operation.to_string(),
            message: "api key not configured".to_string(),
        })
}

/// Sends the request and decodes the body as JSON. An empty 2xx body decodes to `{}`.
///
/// Transport errors drop the request URL, which can carry an API key.
pub(crate) async fn send_json(
    provider: &str,
    operation: &str,
    request: RequestBuilder,
) -> Result<Value, ProviderError> {
    let response = request.send().await.map_err(|error| ProviderError::Transport {
        provider: provider.to_string(),
        operation: operation.to_string(),
        message: error.without_url().to_string(),
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|error| ProviderError::Transport {
        provider: provider.to_string(),
        operation: operation.to_string(),
        message: error.without_url().to_string(),
    })?;

    if !status.is_success() {
        return Err(ProviderError::status(provider, operation, status.as_u16(), &text));
    }
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_str(&text).map_err(|error| decode_error(provider, operation, error))
}

pub(crate) fn decode_error(
    provider: &str,
    operation: &str,
    message: impl ToString,
) -> ProviderError {
    ProviderError::Decode {
        provider: provider.to_string(),
        operation: operation.to_string(),
        message: message.to_string(),
    }
}

pub(crate) fn string_field(
    provider: &str,
    operation: &str,
    body: &Value,
    field: &str,
) -> Result<String, ProviderError> {
    match body.get(field) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        Some(Value::Number(value)) => Ok(value.to_string()),
        _ => Err(decode_error(provider, operation, format!("missing `{field}` in response"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use voxdesk_core::config::AppConfig;
    use voxdesk_core::providers::{ProviderError, MAX_ERROR_BODY_CHARS};

    use super::{http_client, send_json, string_field};

    #[tokio::test]
    async fn non_success_status_carries_truncated_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/boom"))
            .respond_with(ResponseTemplate::new(502).set_body_string("e".repeat(2_000)))
            .mount(&server)
            .await;

        let client = http_client(&AppConfig::default().http).expect("client");
        let error = send_json("Retell", "/boom", client.post(format!("{}/boom", server.uri())))
            .await
            .expect_err("502 should fail");

        match error {
            ProviderError::Status { provider, operation, status, body } => {
                assert_eq!(provider, "Retell");
                assert_eq!(operation, "/boom");
                assert_eq!(status, 502);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_success_body_is_an_empty_object() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = http_client(&AppConfig::default().http).expect("client");
        let body = send_json("Retell", "/update-agent", client.patch(server.uri()))
            .await
            .expect("204 is success");
        assert_eq!(body, json!({}));
    }

    #[test]
    fn string_field_accepts_numeric_ids() {
        let id = string_field("n8n", "/workflows", &json!({ "id": 17 }), "id");
        assert_eq!(id.as_deref(), Ok("17"));
        assert!(string_field("n8n", "/workflows", &json!({}), "id").is_err());
    }
}
