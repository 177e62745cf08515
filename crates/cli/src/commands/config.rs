use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use toml::Value;
use voxdesk_core::config::{AppConfig, LoadOptions};

struct Source<'a> {
    doc: Option<&'a Value>,
    path: Option<&'a Path>,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = Source { doc: config_file_doc.as_ref(), path: config_file_path.as_deref() };

    let workflow_base_url = config.workflow.base_url.as_deref().unwrap_or("<unset>");
    let allowed_origin = config.server.allowed_origin.as_deref().unwrap_or("<unset>");

    let rows: Vec<(&str, String, Option<&str>)> = vec![
        ("database.url", config.database.url.clone(), Some("VOXDESK_DATABASE_URL")),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            Some("VOXDESK_DATABASE_MAX_CONNECTIONS"),
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            Some("VOXDESK_DATABASE_TIMEOUT_SECS"),
        ),
        ("server.bind_address", config.server.bind_address.clone(), Some("VOXDESK_SERVER_BIND_ADDRESS")),
        ("server.port", config.server.port.to_string(), Some("VOXDESK_SERVER_PORT")),
        ("server.allowed_origin", allowed_origin.to_string(), Some("VOXDESK_SERVER_ALLOWED_ORIGIN")),
        ("logging.level", config.logging.level.clone(), Some("VOXDESK_LOGGING_LEVEL")),
        ("logging.format", format!("{:?}", config.logging.format), Some("VOXDESK_LOGGING_FORMAT")),
        ("http.timeout_secs", config.http.timeout_secs.to_string(), Some("VOXDESK_HTTP_TIMEOUT_SECS")),
        ("calendar.base_url", config.calendar.base_url.clone(), Some("VOXDESK_CALENDAR_BASE_URL")),
        ("calendar.api_key", redact(config.calendar.api_key.as_ref()), Some("VOXDESK_CALENDAR_API_KEY")),
        ("calendar.time_zone", config.calendar.time_zone.clone(), Some("VOXDESK_CALENDAR_TIME_ZONE")),
        ("voice.base_url", config.voice.base_url.clone(), Some("VOXDESK_VOICE_BASE_URL")),
        ("voice.api_key", redact(config.voice.api_key.as_ref()), Some("VOXDESK_VOICE_API_KEY")),
        ("voice.model", config.voice.model.clone(), Some("VOXDESK_VOICE_MODEL")),
        ("voice.default_voice_id", config.voice.default_voice_id.clone(), None),
        (
            "voice.default_area_code",
            config.voice.default_area_code.to_string(),
            Some("VOXDESK_VOICE_DEFAULT_AREA_CODE"),
        ),
        ("workflow.base_url", workflow_base_url.to_string(), Some("VOXDESK_WORKFLOW_BASE_URL")),
        ("workflow.api_key", redact(config.workflow.api_key.as_ref()), Some("VOXDESK_WORKFLOW_API_KEY")),
        (
            "billing.cost_per_minute_usd",
            config.billing.cost_per_minute_usd.to_string(),
            Some("VOXDESK_BILLING_COST_PER_MINUTE_USD"),
        ),
        (
            "billing.usd_to_local_rate",
            config.billing.usd_to_local_rate.to_string(),
            Some("VOXDESK_BILLING_USD_TO_LOCAL_RATE"),
        ),
        (
            "billing.default_monthly_revenue",
            config.billing.default_monthly_revenue.to_string(),
            None,
        ),
        ("billing.alert_margin_percent", config.billing.alert_margin_percent.to_string(), None),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(rows.into_iter().map(|(key, value, env_key)| {
        render_line(key, &value, field_source(key, env_key, &source))
    }));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("voxdesk.toml"), PathBuf::from("config/voxdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, env_key: Option<&str>, source: &Source<'_>) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = source.doc {
        if contains_path(doc, key_path) {
            let file_path = source
                .path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps at most a four-character prefix of an API key.
fn redact(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if trimmed.chars().count() <= 8 {
        return "<redacted>".to_string();
    }
    let prefix: String = trimmed.chars().take(4).collect();
    format!("{prefix}***")
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{contains_path, redact};

    #[test]
    fn redaction_never_reveals_short_keys() {
        let short: SecretString = "abc123".to_string().into();
        let long: SecretString = "key_live_0123456789".to_string().into();

        assert_eq!(redact(None), "<unset>");
        assert_eq!(redact(Some(&short)), "<redacted>");
        assert_eq!(redact(Some(&long)), "key_***");
    }

    #[test]
    fn nested_keys_are_found_in_file_documents() {
        let doc: toml::Value = "[voice]\nmodel = \"gpt-4o\"".parse().expect("toml");
        assert!(contains_path(&doc, "voice.model"));
        assert!(!contains_path(&doc, "voice.api_key"));
    }
}
