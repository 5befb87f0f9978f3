use crate::domain::ports::{TransferGateway, TransferReceipt, TransferRequest};
use crate::error::ProcessorError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct MockState {
    /// Failures to serve, in order, per destination host.
    scripted: HashMap<u64, VecDeque<ProcessorError>>,
    requests: Vec<TransferRequest>,
    next_transfer: u64,
}

/// Stand-in for the external payment processor. Succeeds with sequential
/// transfer ids unless failures have been scripted for the host, and records
/// every request it receives so tests can assert on idempotency keys and
/// amounts.
#[derive(Default, Clone)]
pub struct MockProcessorGateway {
    state: Arc<RwLock<MockState>>,
}

impl MockProcessorGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues failures for the next transfer calls targeting `host`.
    pub async fn script_failures(
        &self,
        host: u64,
        failures: impl IntoIterator<Item = ProcessorError>,
    ) {
        let mut state = self.state.write().await;
        state.scripted.entry(host).or_default().extend(failures);
    }

    pub async fn requests(&self) -> Vec<TransferRequest> {
        self.state.read().await.requests.clone()
    }
}

#[async_trait]
impl TransferGateway for MockProcessorGateway {
    async fn create_transfer(
        &self,
        request: TransferRequest,
    ) -> std::result::Result<TransferReceipt, ProcessorError> {
        let mut state = self.state.write().await;
        let host = request.metadata.host;
        state.requests.push(request);

        if let Some(queue) = state.scripted.get_mut(&host)
            && let Some(failure) = queue.pop_front()
        {
            debug!(host, %failure, "mock processor serving scripted failure");
            return Err(failure);
        }

        state.next_transfer += 1;
        Ok(TransferReceipt {
            transfer_id: format!("tr_{}", state.next_transfer),
        })
    }
}
