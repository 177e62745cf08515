pub mod analytics;
pub mod deploy;
pub mod intake;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod tools;
pub mod workflow;

pub use analytics::{AnalyticsAggregator, ClientAnalytics};
pub use deploy::{
    ChannelSink, DeployContext, DeployError, DeployEvent, DeployOrchestrator, DeployRequest,
    DeploySettings, DeploySummary, EventSink, StepStatus,
};
pub use intake::{IntakeOutcome, IntakeRequest, IntakeService};
