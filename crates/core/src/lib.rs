pub mod analytics;
pub mod config;
pub mod domain;
pub mod errors;
pub mod prompts;
pub mod providers;
pub mod voices;

pub use analytics::{PackageUsage, UnitEconomics, UsageStats};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::{
    BusinessType, CallQuery, CallRecord, ClientProfile, ClientRecord, ClientSlug, Faq,
    MinutePackage, ProvisioningState, ProvisioningUpdate,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use providers::{
    CalendarProvider, ProviderError, VoiceAgentProvider, WorkflowProvider,
};
