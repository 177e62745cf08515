//! Per-client dashboard rows: stored profile plus usage and margin derived from live
//! call history.

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use voxdesk_core::analytics::{
    cost_in_local_currency, derive_economics, package_usage, usage_from_calls,
};
use voxdesk_core::config::BillingConfig;
use voxdesk_core::domain::{CallQuery, CallRecord, ClientProfile};
use voxdesk_core::providers::VoiceAgentProvider;
use voxdesk_db::{ClientRepository, RepositoryError};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClientAnalytics {
    #[serde(flatten)]
    pub profile: ClientProfile,
    pub calls: usize,
    pub minutes: Decimal,
    pub cost_usd: Decimal,
    pub last_call_at: Option<String>,
    pub revenue: i64,
    pub cost_local: i64,
    pub profit: i64,
    pub margin_percent: i64,
    pub alert: bool,
    pub usage_percent: i64,
    pub over_package: bool,
}

pub struct AnalyticsAggregator {
    repository: Arc<dyn ClientRepository>,
    voice: Arc<dyn VoiceAgentProvider>,
    billing: BillingConfig,
    voice_configured: bool,
}

impl AnalyticsAggregator {
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        voice: Arc<dyn VoiceAgentProvider>,
        billing: BillingConfig,
        voice_configured: bool,
    ) -> Self {
        Self { repository, voice, billing, voice_configured }
    }

    /// One row per stored client. Call history is fetched concurrently; a failed fetch
    /// counts as zero calls for that client only.
    pub async fn client_dashboard(&self) -> Result<Vec<ClientAnalytics>, RepositoryError> {
        let records = self.repository.list().await?;
        let rows = records.into_iter().map(|record| self.analyze(record.profile));
        Ok(join_all(rows).await)
    }

    async fn analyze(&self, mut profile: ClientProfile) -> ClientAnalytics {
        let calls = match profile.provisioning.voice_agent_id.clone() {
            Some(agent_id) => self.calls_for(&agent_id, &profile).await,
            None => Vec::new(),
        };

        let usage = usage_from_calls(&calls, &self.billing);
        let revenue = if profile.monthly_revenue > 0 {
            profile.monthly_revenue
        } else {
            self.billing.default_monthly_revenue
        };
        let cost_local = cost_in_local_currency(usage.cost_usd, &self.billing);
        let economics = derive_economics(revenue, cost_local, self.billing.alert_margin_percent);
        let package = package_usage(usage.minutes, profile.included_minutes);

        profile.minutes_used = usage.minutes.round().to_u32().unwrap_or(u32::MAX);

        ClientAnalytics {
            profile,
            calls: usage.calls,
            minutes: usage.minutes,
            cost_usd: usage.cost_usd,
            last_call_at: usage.last_call_at,
            revenue: economics.revenue,
            cost_local: economics.cost_local,
            profit: economics.profit,
            margin_percent: economics.margin_percent,
            alert: economics.alert,
            usage_percent: package.usage_percent,
            over_package: package.over_package,
        }
    }

    async fn calls_for(&self, agent_id: &str, profile: &ClientProfile) -> Vec<CallRecord> {
        if !self.voice_configured {
            return Vec::new();
        }

        let query = CallQuery {
            agent_id: Some(agent_id.to_string()),
            limit: self.billing.call_history_limit,
        };
        match self.voice.list_calls(&query).await {
            Ok(calls) => calls,
            Err(error) => {
                warn!(
                    event_name = "analytics.calls.degraded",
                    correlation_id = "analytics",
                    slug = %profile.slug,
                    error = %error,
                    "call history unavailable; reporting zero usage"
                );
                Vec::new()
            }
        }
    }
}
