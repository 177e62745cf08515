use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::SecretString;
use serde_json::{json, Value};

use voxdesk_core::config::CalendarConfig;
use voxdesk_core::providers::{CalendarProvider, EventTypeRequest, ProviderError};

use super::{credential, decode_error, send_json, trim_base};

const PROVIDER: &str = "Cal.com";
const EVENT_TYPES: &str = "/event-types";

/// Cal.com v1 client. Authenticates with the `apiKey` query parameter.
pub struct CalComClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl CalComClient {
    pub fn new(http: Client, config: &CalendarConfig) -> Self {
        Self { http, base_url: trim_base(&config.base_url), api_key: config.api_key.clone() }
    }

    fn url(&self, endpoint: &str) -> Result<Url, ProviderError> {
        let key = credential(PROVIDER, endpoint, self.api_key.as_ref())?;
        Url::parse_with_params(&format!("{}{endpoint}", self.base_url), &[("apiKey", key)])
            .map_err(|error| decode_error(PROVIDER, endpoint, error))
    }
}

fn event_type_body(request: &EventTypeRequest) -> Value {
    json!({
        "title": request.title,
        "slug": request.slug,
        "length": request.length_minutes,
        "description": request.description,
        "hidden": false,
        "locations": [{ "type": "inPerson", "address": request.location_address }],
    })
}

/// The id arrives either under `event_type.id` or at the top level.
fn event_type_id(body: &Value) -> Option<i64> {
    body.get("event_type")
        .and_then(|event_type| event_type.get("id"))
        .and_then(Value::as_i64)
        .or_else(|| body.get("id").and_then(Value::as_i64))
}

#[async_trait]
impl CalendarProvider for CalComClient {
    async fn create_event_type(&self, request: &EventTypeRequest) -> Result<i64, ProviderError> {
        let url = self.url(EVENT_TYPES)?;
        let body =
            send_json(PROVIDER, EVENT_TYPES, self.http.post(url).json(&event_type_body(request)))
                .await?;

        event_type_id(&body)
            .ok_or_else(|| decode_error(PROVIDER, EVENT_TYPES, "missing event type id"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use voxdesk_core::config::{AppConfig, CalendarConfig};
    use voxdesk_core::providers::{CalendarProvider, EventTypeRequest, ProviderError};

    use super::CalComClient;
    use crate::providers::http_client;

    fn config(server: &MockServer) -> CalendarConfig {
        let mut calendar = AppConfig::default().calendar;
        calendar.base_url = format!("{}/v1/", server.uri());
        calendar.api_key = Some("cal_live_key".to_string().into());
        calendar
    }

    fn request() -> EventTypeRequest {
        EventTypeRequest {
            title: "Cita en Clínica Sonrisa".to_string(),
            slug: "clinica-sonrisa".to_string(),
            length_minutes: 45,
            description: "Cita agendada por la recepcionista virtual".to_string(),
            location_address: "Calle 10 # 4-20".to_string(),
        }
    }

    fn client(server: &MockServer) -> CalComClient {
        CalComClient::new(http_client(&AppConfig::default().http).expect("http"), &config(server))
    }

    #[tokio::test]
    async fn creates_event_type_with_query_key_and_nested_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/event-types"))
            .and(query_param("apiKey", "cal_live_key"))
            .and(body_partial_json(json!({
                "slug": "clinica-sonrisa",
                "length": 45,
                "hidden": false,
                "locations": [{ "type": "inPerson", "address": "Calle 10 # 4-20" }]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "event_type": { "id": 901 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).create_event_type(&request()).await.expect("event type");
        assert_eq!(id, 901);
    }

    #[tokio::test]
    async fn accepts_a_top_level_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/event-types"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 77 })))
            .mount(&server)
            .await;

        assert_eq!(client(&server).create_event_type(&request()).await, Ok(77));
    }

    #[tokio::test]
    async fn rejection_names_provider_and_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let error = client(&server).create_event_type(&request()).await.expect_err("401");
        assert_eq!(error.to_string(), "Cal.com /event-types: 401 - invalid api key");
    }

    #[tokio::test]
    async fn connection_failure_does_not_echo_the_query_key() {
        let server = MockServer::builder().start().await;
        let calendar = config(&server);
        drop(server);
        let client =
            CalComClient::new(http_client(&AppConfig::default().http).expect("http"), &calendar);

        let error = client.create_event_type(&request()).await.expect_err("closed port");
        assert!(matches!(error, ProviderError::Transport { .. }));
        assert!(!error.to_string().contains("cal_live_key"), "leaked key: {error}");
    }

    #[tokio::test]
    async fn missing_key_never_reaches_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut calendar = config(&server);
        calendar.api_key = None;
        let client =
            CalComClient::new(http_client(&AppConfig::default().http).expect("http"), &calendar);

        let error = client.create_event_type(&request()).await.expect_err("no key");
        assert!(matches!(error, ProviderError::Transport { .. }));
    }
}
