use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use voxdesk_cli::commands::{config, doctor, migrate, seed};

const MEMORY_DB: [(&str, &str); 2] =
    [("VOXDESK_DATABASE_URL", "sqlite::memory:"), ("VOXDESK_DATABASE_MAX_CONNECTIONS", "1")];

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&MEMORY_DB, || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("VOXDESK_DATABASE_URL", "postgres://localhost/voxdesk")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_loads_demo_clients_once_per_store() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("voxdesk.db").display());

    with_env(&[("VOXDESK_DATABASE_URL", url.as_str())], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["command"], "seed");
        let first_message = first_payload["message"].as_str().unwrap_or_default();
        assert!(first_message.starts_with("demo clients: 3 seeded, 0 already present"));
        assert!(first_message.contains("  + clinica_sonrisa"));

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        let second_message = second_payload["message"].as_str().unwrap_or_default();
        assert!(second_message.starts_with("demo clients: 0 seeded, 3 already present"));
    });
}

#[test]
fn config_redacts_provider_keys_and_names_env_sources() {
    with_env(
        &[
            ("VOXDESK_DATABASE_URL", "sqlite::memory:"),
            ("VOXDESK_VOICE_API_KEY", "key_live_0123456789"),
        ],
        || {
            let output = config::run();
            assert!(output.contains(
                "- voice.api_key = key_*** (source: env (VOXDESK_VOICE_API_KEY))"
            ));
            assert!(output.contains("- calendar.api_key = <unset> (source: default)"));
            assert!(!output.contains("0123456789"));
        },
    );
}

#[test]
fn doctor_json_reports_missing_credentials_per_provider() {
    with_env(&MEMORY_DB, || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "fail");

        let checks = payload["checks"].as_array().expect("checks");
        let status_of = |name: &str| {
            checks
                .iter()
                .find(|check| check["name"] == name)
                .map(|check| check["status"].clone())
                .unwrap_or(Value::Null)
        };
        assert_eq!(status_of("config_validation"), "pass");
        assert_eq!(status_of("calendar_credentials"), "fail");
        assert_eq!(status_of("database_connectivity"), "pass");
        assert_eq!(status_of("client_store_schema"), "fail");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "VOXDESK_DATABASE_URL",
        "VOXDESK_DATABASE_MAX_CONNECTIONS",
        "VOXDESK_DATABASE_TIMEOUT_SECS",
        "VOXDESK_SERVER_BIND_ADDRESS",
        "VOXDESK_SERVER_PORT",
        "VOXDESK_SERVER_ALLOWED_ORIGIN",
        "VOXDESK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "VOXDESK_LOGGING_LEVEL",
        "VOXDESK_LOGGING_FORMAT",
        "VOXDESK_LOG_LEVEL",
        "VOXDESK_LOG_FORMAT",
        "VOXDESK_HTTP_TIMEOUT_SECS",
        "VOXDESK_CALENDAR_API_KEY",
        "VOXDESK_CALENDAR_BASE_URL",
        "VOXDESK_CALENDAR_TIME_ZONE",
        "VOXDESK_VOICE_API_KEY",
        "VOXDESK_VOICE_BASE_URL",
        "VOXDESK_VOICE_MODEL",
        "VOXDESK_VOICE_DEFAULT_AREA_CODE",
        "VOXDESK_WORKFLOW_BASE_URL",
        "VOXDESK_WORKFLOW_API_KEY",
        "VOXDESK_BILLING_COST_PER_MINUTE_USD",
        "VOXDESK_BILLING_USD_TO_LOCAL_RATE",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
