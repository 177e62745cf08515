use serde::Serialize;
use voxdesk_core::config::{AppConfig, LoadOptions};
use voxdesk_db::{client_count, connect_with_settings};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_provider_credentials(&config));
            checks.extend(check_client_store(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in PROVIDER_CHECKS.into_iter().chain(STORE_CHECKS) {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

const PROVIDER_CHECKS: [&str; 3] =
    ["calendar_credentials", "voice_credentials", "workflow_credentials"];
const STORE_CHECKS: [&str; 2] = ["database_connectivity", "client_store_schema"];

/// A missing credential only disables the matching deploy step, so it fails the check
/// without hiding the others.
fn check_provider_credentials(config: &AppConfig) -> Vec<DoctorCheck> {
    let readiness = [
        (config.calendar.is_configured(), "calendar.api_key (VOXDESK_CALENDAR_API_KEY)"),
        (config.voice.is_configured(), "voice.api_key (VOXDESK_VOICE_API_KEY)"),
        (
            config.workflow.is_configured(),
            "workflow.base_url and workflow.api_key (VOXDESK_WORKFLOW_BASE_URL / VOXDESK_WORKFLOW_API_KEY)",
        ),
    ];

    PROVIDER_CHECKS
        .into_iter()
        .zip(readiness)
        .map(|(name, (configured, setting))| {
            if configured {
                DoctorCheck {
                    name,
                    status: CheckStatus::Pass,
                    details: format!("{setting} is set"),
                }
            } else {
                DoctorCheck {
                    name,
                    status: CheckStatus::Fail,
                    details: format!(
                        "{setting} is missing; dependent deploy steps will report errors"
                    ),
                }
            }
        })
        .collect()
}

/// Connectivity first; the schema check only runs once a connection is open.
fn check_client_store(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                skipped_schema_check(),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    skipped_schema_check(),
                ];
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        };
        let schema = match client_count(&pool).await {
            Ok(clients) => DoctorCheck {
                name: "client_store_schema",
                status: CheckStatus::Pass,
                details: format!("client table present ({clients} clients)"),
            },
            Err(error) => DoctorCheck {
                name: "client_store_schema",
                status: CheckStatus::Fail,
                details: format!("client table unavailable ({error}); run `voxdesk migrate`"),
            },
        };

        pool.close().await;
        vec![connectivity, schema]
    })
}

fn skipped_schema_check() -> DoctorCheck {
    DoctorCheck {
        name: "client_store_schema",
        status: CheckStatus::Skipped,
        details: "skipped because the database is unreachable".to_string(),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
