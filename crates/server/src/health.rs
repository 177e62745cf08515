use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use voxdesk_core::config::AppConfig;
use voxdesk_db::{client_count, DbPool};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    providers: ProviderReadiness,
}

impl HealthState {
    pub fn new(db_pool: DbPool, config: &AppConfig) -> Self {
        Self { db_pool, providers: ProviderReadiness::from_config(config) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

/// Which provider credentials are present. Missing ones degrade individual deploy
/// steps, never the service itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProviderReadiness {
    pub calendar: bool,
    pub voice: bool,
    pub workflow: bool,
}

impl ProviderReadiness {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            calendar: config.calendar.is_configured(),
            voice: config.voice.is_configured(),
            workflow: config.workflow.is_configured(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub providers: ProviderReadiness,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "voxdesk-server runtime initialized".to_string(),
        },
        database,
        providers: state.providers,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match client_count(pool).await {
        Ok(clients) => HealthCheck {
            status: "ready",
            detail: format!("client store reachable ({clients} clients)"),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("client store query failed: {error}"),
        },
    }
}
