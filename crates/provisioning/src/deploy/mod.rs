//! Dependency-ordered provisioning of a client's external resources with streamed progress.

pub mod events;
pub mod orchestrator;
pub mod sink;
pub mod steps;

pub use events::{DeployEvent, DeploySummary, StepStatus, DONE_STEP, FATAL_STEP, START_STEP};
pub use orchestrator::{DeployError, DeployOrchestrator, DeployRequest};
pub use sink::{ChannelSink, EventSink, RecordingSink};
pub use steps::{default_steps, DeployContext, DeploySettings, Gate, ProvisioningStep, StepOutcome};
