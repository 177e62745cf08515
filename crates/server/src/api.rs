//! Dashboard JSON API.
//!
//! - `POST /api/clients`        intake a new client
//! - `GET  /api/clients`        every client with live usage and margin metrics
//! - `GET  /api/clients/{slug}` stored profile and prompt
//! - `POST /api/deploy`         provision a client, streamed as server-sent events
//! - `GET  /api/calls`          call history pass-through, optional `agent_id` filter
//! - `GET  /api/voices`         selectable voice catalog

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use voxdesk_core::config::AppConfig;
use voxdesk_core::domain::{CallQuery, CallRecord, ClientRecord, ClientSlug};
use voxdesk_core::errors::{ApplicationError, DomainError, InterfaceError};
use voxdesk_core::providers::VoiceAgentProvider;
use voxdesk_core::voices::{self, VoiceOption};
use voxdesk_db::ClientRepository;
use voxdesk_provisioning::{
    AnalyticsAggregator, ChannelSink, ClientAnalytics, DeployContext, DeployEvent,
    DeployOrchestrator, DeployRequest, IntakeOutcome, IntakeRequest, IntakeService,
};

const DEPLOY_EVENT_BUFFER: usize = 32;

#[derive(Clone)]
pub struct AppState {
    repository: Arc<dyn ClientRepository>,
    intake: Arc<IntakeService>,
    deploy: Arc<DeployOrchestrator>,
    analytics: Arc<AnalyticsAggregator>,
    voice: Arc<dyn VoiceAgentProvider>,
    voice_configured: bool,
    call_page_size: u32,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        repository: Arc<dyn ClientRepository>,
        context: DeployContext,
    ) -> Self {
        let voice = context.voice.clone();
        let voice_configured = config.voice.is_configured();
        Self {
            intake: Arc::new(IntakeService::new(
                repository.clone(),
                config.voice.default_voice_id.clone(),
            )),
            analytics: Arc::new(AnalyticsAggregator::new(
                repository.clone(),
                voice.clone(),
                config.billing.clone(),
                voice_configured,
            )),
            deploy: Arc::new(DeployOrchestrator::new(repository.clone(), context)),
            repository,
            voice,
            voice_configured,
            call_page_size: config.billing.call_list_page_size,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/clients", get(list_clients).post(create_client))
        .route("/api/clients/{slug}", get(get_client))
        .route("/api/deploy", post(deploy))
        .route("/api/calls", get(list_calls))
        .route("/api/voices", get(list_voices))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn from_application(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::from_application(DomainError::Validation(message.into()).into())
    }

    fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(
            event_name = "api.request.failed",
            correlation_id = self.0.correlation_id(),
            status = status.as_u16(),
            error = %self.0,
            "api request failed"
        );
        let body = ErrorBody {
            error: self.0.user_message().to_string(),
            detail: self.0.message().to_string(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn persistence(error: impl ToString) -> ApiError {
    ApiError::from_application(ApplicationError::Persistence(error.to_string()))
}

fn client_not_found(slug: &str) -> ApiError {
    ApiError::from_application(DomainError::ClientNotFound(slug.to_string()).into())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<IntakeRequest>,
) -> Result<(StatusCode, Json<IntakeOutcome>), ApiError> {
    let outcome = state.intake.create_client(request).await.map_err(ApiError::from_application)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClientAnalytics>>, ApiError> {
    let rows = state.analytics.client_dashboard().await.map_err(persistence)?;
    Ok(Json(rows))
}

async fn get_client(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ClientRecord>, ApiError> {
    let parsed = ClientSlug::parse(&slug).map_err(|_| client_not_found(&slug))?;
    let record = state.repository.find(&parsed).await.map_err(persistence)?;
    record.map(Json).ok_or_else(|| client_not_found(&slug))
}

async fn deploy(
    State(state): State<AppState>,
    Json(request): Json<DeployRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    if request.slug.trim().is_empty() {
        return Err(ApiError::bad_request("slug is required"));
    }

    info!(
        event_name = "api.deploy.accepted",
        correlation_id = "deploy",
        slug = %request.slug,
        "deploy stream opened"
    );

    let slug = request.slug.clone();
    let (sender, receiver) = mpsc::channel::<DeployEvent>(DEPLOY_EVENT_BUFFER);
    let orchestrator = state.deploy.clone();
    tokio::spawn(async move {
        let sink = ChannelSink::new(sender);
        // Fatal outcomes are already streamed and logged by the orchestrator.
        let _ = orchestrator.run(request, &sink).await;
    });

    let stream = ReceiverStream::new(receiver).map(move |event| {
        if event.is_terminal() {
            info!(
                event_name = "api.deploy.finished",
                correlation_id = "deploy",
                slug = %slug,
                step = event.step,
                "deploy stream reached its final event"
            );
        }
        Ok(sse_event(&event))
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn sse_event(event: &DeployEvent) -> Event {
    Event::default().data(serde_json::to_string(event).unwrap_or_default())
}

#[derive(Debug, Default, Deserialize)]
struct CallsQuery {
    agent_id: Option<String>,
}

async fn list_calls(
    State(state): State<AppState>,
    Query(query): Query<CallsQuery>,
) -> Result<Json<Vec<CallRecord>>, ApiError> {
    if !state.voice_configured {
        return Err(ApiError::from_application(ApplicationError::Configuration(
            "voice.api_key is not configured".to_string(),
        )));
    }

    let query = CallQuery {
        agent_id: query.agent_id.filter(|id| !id.trim().is_empty()),
        limit: state.call_page_size,
    };
    let calls = state.voice.list_calls(&query).await.map_err(|error| {
        ApiError::from_application(ApplicationError::Integration(error.to_string()))
    })?;
    Ok(Json(calls))
}

async fn list_voices() -> Json<&'static [VoiceOption]> {
    Json(voices::catalog())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use voxdesk_core::config::AppConfig;
    use voxdesk_core::domain::CallRecord;
    use voxdesk_db::InMemoryClientRepository;
    use voxdesk_provisioning::testing::{
        configured_settings, FakeCalendar, FakeVoice, FakeWorkflow, WORKFLOW_BASE_URL,
    };
    use voxdesk_provisioning::DeployContext;

    use super::{router, AppState};

    struct Harness {
        app: Router,
        voice: Arc<FakeVoice>,
    }

    fn harness(voice_configured: bool) -> Harness {
        let mut config = AppConfig::default();
        if voice_configured {
            config.voice.api_key = Some("voice_test_key".to_string().into());
        }
        let voice = Arc::new(FakeVoice::default());
        let context = DeployContext {
            calendar: Arc::new(FakeCalendar::default()),
            voice: voice.clone(),
            workflow: Arc::new(FakeWorkflow::default()),
            settings: configured_settings(),
        };
        let state =
            AppState::new(&config, Arc::new(InMemoryClientRepository::default()), context);
        Harness { app: router(state), voice }
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, String) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
    }

    fn sonrisa() -> Value {
        json!({
            "business_name": "Clínica Sonrisa",
            "business_type": "dental",
            "professional_name": "Dra. Ruiz",
            "forwarding_number": "+573001112233"
        })
    }

    fn stream_events(body: &str) -> Vec<Value> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
            .map(|data| serde_json::from_str(data.trim()).expect("event json"))
            .collect()
    }

    #[tokio::test]
    async fn intake_returns_created_with_slug_and_prompt() {
        let harness = harness(true);
        let (status, body) = send(&harness.app, "POST", "/api/clients", Some(sonrisa())).await;

        assert_eq!(status, StatusCode::CREATED);
        let outcome: Value = serde_json::from_str(&body).expect("json");
        assert_eq!(outcome["slug"], "clinica_sonrisa");
        assert!(outcome["prompt"].as_str().expect("prompt").contains("Dra. Ruiz"));
    }

    #[tokio::test]
    async fn intake_errors_map_to_bad_request_and_conflict() {
        let harness = harness(true);
        let (status, body) = send(
            &harness.app,
            "POST",
            "/api/clients",
            Some(json!({ "business_name": "Alfa", "business_type": "dental" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_str(&body).expect("json");
        assert!(error["detail"].as_str().expect("detail").contains("professional_name"));
        assert!(error["correlation_id"].as_str().is_some());

        send(&harness.app, "POST", "/api/clients", Some(sonrisa())).await;
        let (status, _) = send(&harness.app, "POST", "/api/clients", Some(sonrisa())).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn client_detail_returns_profile_and_prompt_or_404() {
        let harness = harness(true);
        send(&harness.app, "POST", "/api/clients", Some(sonrisa())).await;

        let (status, body) = send(&harness.app, "GET", "/api/clients/clinica_sonrisa", None).await;
        assert_eq!(status, StatusCode::OK);
        let record: Value = serde_json::from_str(&body).expect("json");
        assert_eq!(record["profile"]["business_name"], "Clínica Sonrisa");
        assert!(record["prompt"].as_str().is_some());

        let (status, _) = send(&harness.app, "GET", "/api/clients/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&harness.app, "GET", "/api/clients/Not%20A%20Slug", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deploy_streams_every_step_and_ends_with_summary() {
        let harness = harness(true);
        send(&harness.app, "POST", "/api/clients", Some(sonrisa())).await;

        let (status, body) = send(
            &harness.app,
            "POST",
            "/api/deploy",
            Some(json!({ "slug": "clinica_sonrisa" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let events = stream_events(&body);
        assert_eq!(events.first().map(|event| event["step"].clone()), Some(json!(0)));
        let done = events.last().expect("terminal event");
        assert_eq!(done["step"], 99);
        assert_eq!(done["status"], "done");
        assert_eq!(done["extra"]["agent_id"], FakeVoice::AGENT_ID);
        assert_eq!(done["extra"]["calendar_event_type_id"], Value::Null);
        assert_eq!(
            done["extra"]["webhook_url"],
            format!("{WORKFLOW_BASE_URL}/webhook/clinica_sonrisa")
        );

        let tools = &harness.voice.llm_requests()[0].tools;
        assert!(tools.iter().any(|tool| tool.kind == "transfer_call"));
        assert_eq!(tools.len(), 1);
    }

    #[tokio::test]
    async fn deploy_of_unknown_client_streams_a_single_fatal_event() {
        let harness = harness(true);
        let (status, body) =
            send(&harness.app, "POST", "/api/deploy", Some(json!({ "slug": "ghost" }))).await;

        assert_eq!(status, StatusCode::OK);
        let events = stream_events(&body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["step"], -1);
        assert_eq!(events[0]["status"], "error");
    }

    #[tokio::test]
    async fn deploy_without_slug_is_rejected_before_streaming() {
        let harness = harness(true);
        let (status, _) =
            send(&harness.app, "POST", "/api/deploy", Some(json!({ "slug": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dashboard_lists_clients_with_metrics() {
        let harness = harness(true);
        send(&harness.app, "POST", "/api/clients", Some(sonrisa())).await;

        let (status, body) = send(&harness.app, "GET", "/api/clients", None).await;
        assert_eq!(status, StatusCode::OK);
        let rows: Vec<Value> = serde_json::from_str(&body).expect("json");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["slug"], "clinica_sonrisa");
        assert_eq!(rows[0]["calls"], 0);
        assert_eq!(rows[0]["alert"], false);
    }

    #[tokio::test]
    async fn call_history_passes_filter_and_page_size() {
        let harness = harness(true);
        harness.voice.with_calls(
            "agent_a",
            vec![CallRecord { call_id: "c1".to_string(), ..CallRecord::default() }],
        );

        let (status, body) = send(&harness.app, "GET", "/api/calls?agent_id=agent_a", None).await;
        assert_eq!(status, StatusCode::OK);
        let calls: Vec<Value> = serde_json::from_str(&body).expect("json");
        assert_eq!(calls[0]["call_id"], "c1");

        let queries = harness.voice.call_queries();
        assert_eq!(queries[0].agent_id.as_deref(), Some("agent_a"));
        assert_eq!(queries[0].limit, 50);
    }

    #[tokio::test]
    async fn call_history_reports_provider_and_configuration_failures() {
        let configured = harness(true);
        configured.voice.fail_on("list_calls");
        let (status, _) = send(&configured.app, "GET", "/api/calls", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let unconfigured = harness(false);
        let (status, _) = send(&unconfigured.app, "GET", "/api/calls", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(unconfigured.voice.call_queries().is_empty());
    }

    #[tokio::test]
    async fn voices_catalog_is_static() {
        let harness = harness(false);
        let (status, body) = send(&harness.app, "GET", "/api/voices", None).await;

        assert_eq!(status, StatusCode::OK);
        let voices: Vec<Value> = serde_json::from_str(&body).expect("json");
        assert!(voices.iter().any(|voice| voice["recommended"] == true));
    }
}
