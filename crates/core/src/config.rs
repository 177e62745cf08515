use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub calendar: CalendarConfig,
    pub voice: VoiceConfig,
    pub workflow: WorkflowConfig,
    pub billing: BillingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub allowed_origin: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

/// Scheduling provider used for event types and the booking tools handed to the agent.
#[derive(Clone, Debug)]
pub struct CalendarConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub time_zone: String,
    pub booking_email: String,
    pub language: String,
}

/// Voice-agent provider. Also owns telephony and call history.
#[derive(Clone, Debug)]
pub struct VoiceConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub default_voice_id: String,
    pub language: String,
    pub default_area_code: u16,
}

#[derive(Clone, Debug)]
pub struct WorkflowConfig {
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct BillingConfig {
    pub cost_per_minute_usd: Decimal,
    pub usd_to_local_rate: Decimal,
    pub default_monthly_revenue: i64,
    pub alert_margin_percent: i64,
    pub utc_offset_minutes: i32,
    pub call_history_limit: u32,
    pub call_list_page_size: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub calendar_api_key: Option<String>,
    pub calendar_base_url: Option<String>,
    pub voice_api_key: Option<String>,
    pub voice_base_url: Option<String>,
    pub workflow_base_url: Option<String>,
    pub workflow_api_key: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://voxdesk.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
                allowed_origin: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            http: HttpConfig { timeout_secs: 30 },
            calendar: CalendarConfig {
                api_key: None,
                base_url: "https://api.cal.com/v1".to_string(),
                time_zone: "America/Bogota".to_string(),
                booking_email: "noreply@voxdesk.local".to_string(),
                language: "es".to_string(),
            },
            voice: VoiceConfig {
                api_key: None,
                base_url: "https://api.retellai.com".to_string(),
                model: "gpt-4o".to_string(),
                default_voice_id: crate::voices::DEFAULT_VOICE_ID.to_string(),
                language: "es-419".to_string(),
                default_area_code: 305,
            },
            workflow: WorkflowConfig { base_url: None, api_key: None },
            billing: BillingConfig {
                cost_per_minute_usd: Decimal::new(7, 2),
                usd_to_local_rate: Decimal::from(4200),
                default_monthly_revenue: 200_000,
                alert_margin_percent: 50,
                utc_offset_minutes: -300,
                call_history_limit: 100,
                call_list_page_size: 50,
            },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("voxdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(allowed_origin) = server.allowed_origin {
                self.server.allowed_origin = Some(allowed_origin);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        if let Some(http) = patch.http {
            if let Some(timeout_secs) = http.timeout_secs {
                self.http.timeout_secs = timeout_secs;
            }
        }

        if let Some(calendar) = patch.calendar {
            if let Some(calendar_api_key_value) = calendar.api_key {
                self.calendar.api_key = Some(secret_value(calendar_api_key_value));
            }
            if let Some(base_url) = calendar.base_url {
                self.calendar.base_url = base_url;
            }
            if let Some(time_zone) = calendar.time_zone {
                self.calendar.time_zone = time_zone;
            }
            if let Some(booking_email) = calendar.booking_email {
                self.calendar.booking_email = booking_email;
            }
            if let Some(language) = calendar.language {
                self.calendar.language = language;
            }
        }

        if let Some(voice) = patch.voice {
            if let Some(voice_api_key_value) = voice.api_key {
                self.voice.api_key = Some(secret_value(voice_api_key_value));
            }
            if let Some(base_url) = voice.base_url {
                self.voice.base_url = base_url;
            }
            if let Some(model) = voice.model {
                self.voice.model = model;
            }
            if let Some(default_voice_id) = voice.default_voice_id {
                self.voice.default_voice_id = default_voice_id;
            }
            if let Some(language) = voice.language {
                self.voice.language = language;
            }
            if let Some(default_area_code) = voice.default_area_code {
                self.voice.default_area_code = default_area_code;
            }
        }

        if let Some(workflow) = patch.workflow {
            if let Some(base_url) = workflow.base_url {
                self.workflow.base_url = Some(base_url);
            }
            if let Some(workflow_api_key_value) = workflow.api_key {
                self.workflow.api_key = Some(secret_value(workflow_api_key_value));
            }
        }

        if let Some(billing) = patch.billing {
            if let Some(cost_per_minute_usd) = billing.cost_per_minute_usd {
                self.billing.cost_per_minute_usd = cost_per_minute_usd;
            }
            if let Some(usd_to_local_rate) = billing.usd_to_local_rate {
                self.billing.usd_to_local_rate = usd_to_local_rate;
            }
            if let Some(default_monthly_revenue) = billing.default_monthly_revenue {
                self.billing.default_monthly_revenue = default_monthly_revenue;
            }
            if let Some(alert_margin_percent) = billing.alert_margin_percent {
                self.billing.alert_margin_percent = alert_margin_percent;
            }
            if let Some(utc_offset_minutes) = billing.utc_offset_minutes {
                self.billing.utc_offset_minutes = utc_offset_minutes;
            }
            if let Some(call_history_limit) = billing.call_history_limit {
                self.billing.call_history_limit = call_history_limit;
            }
            if let Some(call_list_page_size) = billing.call_list_page_size {
                self.billing.call_list_page_size = call_list_page_size;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("VOXDESK_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("VOXDESK_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("VOXDESK_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("VOXDESK_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("VOXDESK_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("VOXDESK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("VOXDESK_SERVER_PORT") {
            self.server.port = parse_u16("VOXDESK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("VOXDESK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("VOXDESK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("VOXDESK_SERVER_ALLOWED_ORIGIN") {
            self.server.allowed_origin = Some(value);
        }

        if let Some(value) = read_env("VOXDESK_HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = parse_u64("VOXDESK_HTTP_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("VOXDESK_CALENDAR_API_KEY") {
            self.calendar.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("VOXDESK_CALENDAR_BASE_URL") {
            self.calendar.base_url = value;
        }
        if let Some(value) = read_env("VOXDESK_CALENDAR_TIME_ZONE") {
            self.calendar.time_zone = value;
        }

        if let Some(value) = read_env("VOXDESK_VOICE_API_KEY") {
            self.voice.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("VOXDESK_VOICE_BASE_URL") {
            self.voice.base_url = value;
        }
        if let Some(value) = read_env("VOXDESK_VOICE_MODEL") {
            self.voice.model = value;
        }
        if let Some(value) = read_env("VOXDESK_VOICE_DEFAULT_AREA_CODE") {
            self.voice.default_area_code = parse_u16("VOXDESK_VOICE_DEFAULT_AREA_CODE", &value)?;
        }

        if let Some(value) = read_env("VOXDESK_WORKFLOW_BASE_URL") {
            self.workflow.base_url = Some(value);
        }
        if let Some(value) = read_env("VOXDESK_WORKFLOW_API_KEY") {
            self.workflow.api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("VOXDESK_BILLING_USD_TO_LOCAL_RATE") {
            self.billing.usd_to_local_rate =
                parse_decimal("VOXDESK_BILLING_USD_TO_LOCAL_RATE", &value)?;
        }
        if let Some(value) = read_env("VOXDESK_BILLING_COST_PER_MINUTE_USD") {
            self.billing.cost_per_minute_usd =
                parse_decimal("VOXDESK_BILLING_COST_PER_MINUTE_USD", &value)?;
        }

        let log_level = read_env("VOXDESK_LOGGING_LEVEL").or_else(|| read_env("VOXDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("VOXDESK_LOGGING_FORMAT").or_else(|| read_env("VOXDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(calendar_api_key) = overrides.calendar_api_key {
            self.calendar.api_key = Some(secret_value(calendar_api_key));
        }
        if let Some(calendar_base_url) = overrides.calendar_base_url {
            self.calendar.base_url = calendar_base_url;
        }
        if let Some(voice_api_key) = overrides.voice_api_key {
            self.voice.api_key = Some(secret_value(voice_api_key));
        }
        if let Some(voice_base_url) = overrides.voice_base_url {
            self.voice.base_url = voice_base_url;
        }
        if let Some(workflow_base_url) = overrides.workflow_base_url {
            self.workflow.base_url = Some(workflow_base_url);
        }
        if let Some(workflow_api_key) = overrides.workflow_api_key {
            self.workflow.api_key = Some(secret_value(workflow_api_key));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        validate_http(&self.http)?;
        validate_calendar(&self.calendar)?;
        validate_voice(&self.voice)?;
        validate_workflow(&self.workflow)?;
        validate_billing(&self.billing)?;
        Ok(())
    }
}

impl CalendarConfig {
    pub fn is_configured(&self) -> bool {
        has_secret(self.api_key.as_ref())
    }
}

impl VoiceConfig {
    pub fn is_configured(&self) -> bool {
        has_secret(self.api_key.as_ref())
    }
}

impl WorkflowConfig {
    pub fn is_configured(&self) -> bool {
        let has_base = self.base_url.as_ref().map(|url| !url.trim().is_empty()).unwrap_or(false);
        has_base && has_secret(self.api_key.as_ref())
    }
}

fn has_secret(secret: Option<&SecretString>) -> bool {
    secret.map(|value| !value.expose_secret().trim().is_empty()).unwrap_or(false)
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("voxdesk.toml"), PathBuf::from("config/voxdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if let Some(origin) = &server.allowed_origin {
        validate_url("server.allowed_origin", origin)?;
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_http(http: &HttpConfig) -> Result<(), ConfigError> {
    if http.timeout_secs == 0 || http.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "http.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    Ok(())
}

fn validate_calendar(calendar: &CalendarConfig) -> Result<(), ConfigError> {
    validate_url("calendar.base_url", &calendar.base_url)?;
    if calendar.time_zone.trim().is_empty() {
        return Err(ConfigError::Validation(
            "calendar.time_zone must not be empty (e.g. `America/Bogota`)".to_string(),
        ));
    }
    Ok(())
}

fn validate_voice(voice: &VoiceConfig) -> Result<(), ConfigError> {
    validate_url("voice.base_url", &voice.base_url)?;
    if voice.model.trim().is_empty() {
        return Err(ConfigError::Validation("voice.model must not be empty".to_string()));
    }
    if voice.default_voice_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "voice.default_voice_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_workflow(workflow: &WorkflowConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = &workflow.base_url {
        validate_url("workflow.base_url", base_url)?;
    }
    Ok(())
}

fn validate_billing(billing: &BillingConfig) -> Result<(), ConfigError> {
    if billing.cost_per_minute_usd.is_sign_negative() {
        return Err(ConfigError::Validation(
            "billing.cost_per_minute_usd must not be negative".to_string(),
        ));
    }
    if billing.usd_to_local_rate <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "billing.usd_to_local_rate must be greater than zero".to_string(),
        ));
    }
    if billing.default_monthly_revenue <= 0 {
        return Err(ConfigError::Validation(
            "billing.default_monthly_revenue must be greater than zero".to_string(),
        ));
    }
    if !(0..=100).contains(&billing.alert_margin_percent) {
        return Err(ConfigError::Validation(
            "billing.alert_margin_percent must be in range 0..=100".to_string(),
        ));
    }
    if billing.call_history_limit == 0 || billing.call_list_page_size == 0 {
        return Err(ConfigError::Validation(
            "billing.call_history_limit and billing.call_list_page_size must be greater than zero"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
    http: Option<HttpPatch>,
    calendar: Option<CalendarPatch>,
    voice: Option<VoicePatch>,
    workflow: Option<WorkflowPatch>,
    billing: Option<BillingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    allowed_origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpPatch {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    time_zone: Option<String>,
    booking_email: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VoicePatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    default_voice_id: Option<String>,
    language: Option<String>,
    default_area_code: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkflowPatch {
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BillingPatch {
    cost_per_minute_usd: Option<Decimal>,
    usd_to_local_rate: Option<Decimal>,
    default_monthly_revenue: Option<i64>,
    alert_margin_percent: Option<i64>,
    utc_offset_minutes: Option<i32>,
    call_history_limit: Option<u32>,
    call_list_page_size: Option<u32>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_load_without_any_provider_credentials() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(!config.calendar.is_configured(), "calendar should start unconfigured")?;
        ensure(!config.voice.is_configured(), "voice should start unconfigured")?;
        ensure(!config.workflow.is_configured(), "workflow should start unconfigured")?;
        ensure(
            config.billing.cost_per_minute_usd == Decimal::new(7, 2),
            "default per-minute cost should be 0.07",
        )?;
        ensure(
            config.billing.usd_to_local_rate == Decimal::from(4200),
            "default conversion rate should be 4200",
        )?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact is the default")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_VOICE_KEY", "key_from_env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("voxdesk.toml");
            fs::write(
                &path,
                r#"
[voice]
api_key = "${TEST_VOICE_KEY}"

[workflow]
base_url = "https://automation.example.com"
api_key = "wf-key"

[billing]
usd_to_local_rate = "4100"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let voice_key =
                config.voice.api_key.as_ref().map(|key| key.expose_secret().to_string());
            ensure(
                voice_key.as_deref() == Some("key_from_env"),
                "voice key should be interpolated from environment",
            )?;
            ensure(config.workflow.is_configured(), "workflow should be configured from file")?;
            ensure(
                config.billing.usd_to_local_rate == Decimal::from(4100),
                "conversion rate should come from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_VOICE_KEY"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOXDESK_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("VOXDESK_CALENDAR_API_KEY", "cal-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("voxdesk.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[calendar]
api_key = "cal-from-file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            let calendar_key =
                config.calendar.api_key.as_ref().map(|key| key.expose_secret().to_string());
            ensure(
                calendar_key.as_deref() == Some("cal-from-env"),
                "env calendar key should win over file",
            )?;
            Ok(())
        })();

        clear_vars(&["VOXDESK_DATABASE_URL", "VOXDESK_CALENDAR_API_KEY"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOXDESK_WORKFLOW_BASE_URL", "automation.example.com");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("workflow.base_url")
            );
            ensure(has_message, "validation failure should mention workflow.base_url")
        })();

        clear_vars(&["VOXDESK_WORKFLOW_BASE_URL"]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOXDESK_SERVER_PORT", "not-a-port");

        let result = (|| -> Result<(), String> {
            match AppConfig::load(LoadOptions::default()) {
                Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                    ensure(key == "VOXDESK_SERVER_PORT", "error should name the env key")
                }
                Err(other) => Err(format!("unexpected error: {other}")),
                Ok(_) => Err("expected invalid override failure".to_string()),
            }
        })();

        clear_vars(&["VOXDESK_SERVER_PORT"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("VOXDESK_VOICE_API_KEY", "voice-secret-value");
        env::set_var("VOXDESK_WORKFLOW_API_KEY", "workflow-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("voice-secret-value"), "debug output should not contain voice key")?;
            ensure(
                !debug.contains("workflow-secret-value"),
                "debug output should not contain workflow key",
            )?;
            Ok(())
        })();

        clear_vars(&["VOXDESK_VOICE_API_KEY", "VOXDESK_WORKFLOW_API_KEY"]);
        result
    }
}
