use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use voxdesk_core::domain::{ClientRecord, ClientSlug};
use voxdesk_db::{ClientRepository, RepositoryError};

use super::events::{DeployEvent, DeploySummary, START_STEP};
use super::sink::EventSink;
use super::steps::{default_steps, DeployContext, Gate, ProvisioningStep};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeployRequest {
    pub slug: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Errors that abort a whole run. Step-level provider failures never surface here.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("client not found: {0}")]
    ClientNotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

pub struct DeployOrchestrator {
    repository: Arc<dyn ClientRepository>,
    context: DeployContext,
    steps: Vec<Box<dyn ProvisioningStep>>,
}

impl DeployOrchestrator {
    pub fn new(repository: Arc<dyn ClientRepository>, context: DeployContext) -> Self {
        Self::with_steps(repository, context, default_steps())
    }

    pub fn with_steps(
        repository: Arc<dyn ClientRepository>,
        context: DeployContext,
        steps: Vec<Box<dyn ProvisioningStep>>,
    ) -> Self {
        Self { repository, context, steps }
    }

    /// Runs every step in order and ends the event log with either the summary or a
    /// single fatal event.
    pub async fn run(
        &self,
        request: DeployRequest,
        sink: &dyn EventSink,
    ) -> Result<DeploySummary, DeployError> {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "deploy.run.start",
            correlation_id = %correlation_id,
            slug = %request.slug,
            "deploy run started"
        );

        match self.run_steps(&correlation_id, request, sink).await {
            Ok(summary) => {
                sink.emit(DeployEvent::done(&summary)).await;
                info!(
                    event_name = "deploy.run.completed",
                    correlation_id = %correlation_id,
                    agent_id = summary.agent_id.as_deref().unwrap_or("none"),
                    "deploy run finished"
                );
                Ok(summary)
            }
            Err(fatal) => {
                error!(
                    event_name = "deploy.fatal",
                    correlation_id = %correlation_id,
                    error = %fatal,
                    "deploy run aborted"
                );
                sink.emit(DeployEvent::fatal(format!("Fatal error: {fatal}"))).await;
                Err(fatal)
            }
        }
    }

    async fn run_steps(
        &self,
        correlation_id: &str,
        request: DeployRequest,
        sink: &dyn EventSink,
    ) -> Result<DeploySummary, DeployError> {
        let slug = ClientSlug::parse(&request.slug)
            .map_err(|_| DeployError::ClientNotFound(request.slug.clone()))?;
        let record = self.load(&slug).await?;

        if let Some(prompt) = request.prompt.as_deref().filter(|text| !text.trim().is_empty()) {
            self.repository.write(&slug, &record.profile, Some(prompt)).await?;
        }

        sink.emit(DeployEvent::ok(
            START_STEP,
            format!("Starting deployment: {}", record.profile.business_name),
        ))
        .await;

        for step in &self.steps {
            let mut record = self.load(&slug).await?;
            let number = step.number();

            match step.gate(&record.profile, &self.context.settings) {
                Gate::Skip(message) => {
                    debug!(
                        event_name = "deploy.step.skipped",
                        correlation_id,
                        step = step.name(),
                        reason = %message,
                        "deploy step skipped"
                    );
                    sink.emit(DeployEvent::skipped(number, message)).await;
                }
                Gate::Misconfigured(message) => {
                    warn!(
                        event_name = "deploy.step.misconfigured",
                        correlation_id,
                        step = step.name(),
                        reason = %message,
                        "deploy step not attempted"
                    );
                    sink.emit(DeployEvent::error(number, message)).await;
                }
                Gate::Run => {
                    sink.emit(DeployEvent::running(number, step.running_message())).await;
                    match step.execute(&record, &self.context).await {
                        Ok(outcome) => {
                            if !outcome.update.is_empty() {
                                record.profile.provisioning.apply(outcome.update);
                                self.repository.write(&slug, &record.profile, None).await?;
                            }
                            info!(
                                event_name = "deploy.step.completed",
                                correlation_id,
                                step = step.name(),
                                slug = %slug,
                                "deploy step completed"
                            );
                            let event =
                                DeployEvent::ok(number, outcome.message).with_extra(outcome.extra);
                            sink.emit(event).await;
                        }
                        Err(failure) => {
                            warn!(
                                event_name = "deploy.step.failed",
                                correlation_id,
                                step = step.name(),
                                provider = failure.provider(),
                                error = %failure,
                                "deploy step failed; continuing"
                            );
                            sink.emit(DeployEvent::error(number, failure.to_string())).await;
                        }
                    }
                }
            }
        }

        let record = self.load(&slug).await?;
        Ok(DeploySummary::from(&record.profile.provisioning))
    }

    async fn load(&self, slug: &ClientSlug) -> Result<ClientRecord, DeployError> {
        self.repository
            .find(slug)
            .await?
            .ok_or_else(|| DeployError::ClientNotFound(slug.to_string()))
    }
}
