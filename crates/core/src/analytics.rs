//! Usage and unit-economics figures derived from provider call history.
//!
//! Nothing here is persisted: the dashboard recomputes every figure from the
//! live call list on each read instead of trusting `minutes_used`.

use chrono::{DateTime, FixedOffset};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::config::BillingConfig;
use crate::domain::CallRecord;

const MS_PER_MINUTE: i64 = 60_000;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub calls: usize,
    pub minutes: Decimal,
    pub cost_usd: Decimal,
    pub last_call_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitEconomics {
    pub revenue: i64,
    pub cost_local: i64,
    pub profit: i64,
    pub margin_percent: i64,
    pub alert: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PackageUsage {
    pub included_minutes: u32,
    pub usage_percent: i64,
    pub over_package: bool,
}

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

pub fn usage_from_calls(calls: &[CallRecord], billing: &BillingConfig) -> UsageStats {
    if calls.is_empty() {
        return UsageStats::default();
    }

    let total_ms: u64 = calls.iter().map(|call| call.duration_ms.unwrap_or(0)).sum();
    let raw_minutes = Decimal::from(total_ms) / Decimal::from(MS_PER_MINUTE);

    let reported: Option<Vec<Decimal>> = calls
        .iter()
        .map(|call| call.reported_cost_usd().and_then(Decimal::from_f64))
        .collect();
    let cost_usd = match reported {
        Some(costs) => costs.into_iter().sum(),
        None => raw_minutes * billing.cost_per_minute_usd,
    };

    let last_call_at = calls
        .iter()
        .filter_map(|call| call.start_timestamp)
        .max()
        .and_then(|timestamp| format_local(timestamp, billing.utc_offset_minutes));

    UsageStats {
        calls: calls.len(),
        minutes: round_half_up(raw_minutes, 1),
        cost_usd: round_half_up(cost_usd, 2),
        last_call_at,
    }
}

pub fn format_local(timestamp_ms: i64, utc_offset_minutes: i32) -> Option<String> {
    let offset = FixedOffset::east_opt(utc_offset_minutes.checked_mul(60)?)?;
    let instant = DateTime::from_timestamp_millis(timestamp_ms)?;
    Some(instant.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string())
}

pub fn cost_in_local_currency(cost_usd: Decimal, billing: &BillingConfig) -> i64 {
    round_half_up(cost_usd * billing.usd_to_local_rate, 0).to_i64().unwrap_or(i64::MAX)
}

pub fn derive_economics(revenue: i64, cost_local: i64, alert_margin_percent: i64) -> UnitEconomics {
    let profit = revenue - cost_local;
    let margin_percent = if revenue > 0 {
        let ratio = Decimal::from(profit) * Decimal::from(100) / Decimal::from(revenue);
        round_half_up(ratio, 0).to_i64().unwrap_or(0)
    } else {
        0
    };

    UnitEconomics {
        revenue,
        cost_local,
        profit,
        margin_percent,
        alert: margin_percent < alert_margin_percent,
    }
}

pub fn package_usage(minutes: Decimal, included_minutes: u32) -> PackageUsage {
    let usage_percent = if included_minutes == 0 {
        0
    } else {
        let ratio = minutes * Decimal::from(100) / Decimal::from(included_minutes);
        round_half_up(ratio, 0).to_i64().unwrap_or(0)
    };

    PackageUsage {
        included_minutes,
        usage_percent,
        over_package: minutes > Decimal::from(included_minutes),
    }
}
