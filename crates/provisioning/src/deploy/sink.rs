use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::events::DeployEvent;

/// Destination for deploy progress. Emission never fails; a vanished consumer is ignored.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: DeployEvent);
}

/// Forwards events to a bounded channel drained by the streaming transport.
pub struct ChannelSink {
    sender: mpsc::Sender<DeployEvent>,
    disconnected: AtomicBool,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<DeployEvent>) -> Self {
        Self { sender, disconnected: AtomicBool::new(false) }
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: DeployEvent) {
        if self.is_disconnected() {
            return;
        }
        if self.sender.send(event).await.is_err() {
            self.disconnected.store(true, Ordering::Relaxed);
            debug!(
                event_name = "deploy.stream.disconnected",
                "deploy consumer went away; continuing without streaming"
            );
        }
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DeployEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DeployEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: DeployEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
