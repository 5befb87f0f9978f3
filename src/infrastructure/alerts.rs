use crate::domain::ports::{AlertEvent, AlertSink};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;

/// Captures alert events in memory and mirrors them to the log. The CLI and
/// tests read the captured events back; a deployment would swap in a sink
/// backed by the paging system.
#[derive(Default, Clone)]
pub struct RecordingAlertSink {
    events: Arc<RwLock<Vec<AlertEvent>>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<AlertEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn alert(&self, event: AlertEvent) -> Result<()> {
        error!(
            host = event.host,
            amount = %event.amount.value(),
            attempts = event.attempts,
            error = %event.error,
            "settlement alert"
        );
        self.events.write().await.push(event);
        Ok(())
    }
}
