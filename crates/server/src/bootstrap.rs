use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use voxdesk_core::config::{AppConfig, ConfigError};
use voxdesk_db::{connect_with_settings, migrations, DbPool, SqlClientRepository};
use voxdesk_provisioning::{DeployContext, DeploySettings};

use crate::api::{self, AppState};
use crate::health::{self, HealthState};
use crate::providers::{http_client, CalComClient, N8nClient, RetellClient};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let http = http_client(&config.http).map_err(BootstrapError::HttpClient)?;
    let context = DeployContext {
        calendar: Arc::new(CalComClient::new(http.clone(), &config.calendar)),
        voice: Arc::new(RetellClient::new(http.clone(), &config.voice)),
        workflow: Arc::new(N8nClient::new(http, &config.workflow)),
        settings: DeploySettings::from_config(&config),
    };
    info!(
        event_name = "system.bootstrap.providers_ready",
        correlation_id = "bootstrap",
        calendar = config.calendar.is_configured(),
        voice = config.voice.is_configured(),
        workflow = config.workflow.is_configured(),
        "provider adapters constructed"
    );

    let repository = Arc::new(SqlClientRepository::new(db_pool.clone()));
    let state = AppState::new(&config, repository, context);

    Ok(Application { config, db_pool, state })
}

impl Application {
    /// API and health routes behind request tracing and the optional dashboard CORS origin.
    pub fn router(&self) -> Router {
        let router = api::router(self.state.clone())
            .merge(health::router(HealthState::new(self.db_pool.clone(), &self.config)));
        let router = match cors_layer(self.config.server.allowed_origin.as_deref()) {
            Some(cors) => router.layer(cors),
            None => router,
        };
        router.layer(TraceLayer::new_for_http())
    }
}

fn cors_layer(allowed_origin: Option<&str>) -> Option<CorsLayer> {
    let origin = allowed_origin?;
    match origin.parse::<HeaderValue>() {
        Ok(value) => {
            Some(CorsLayer::new().allow_origin(value).allow_methods(Any).allow_headers(Any))
        }
        Err(error) => {
            warn!(
                event_name = "system.bootstrap.cors_ignored",
                correlation_id = "bootstrap",
                origin,
                error = %error,
                "allowed_origin is not a valid header value; CORS disabled"
            );
            None
        }
    }
}
