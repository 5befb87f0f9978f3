use thiserror::Error;

pub type Result<T> = std::result::Result<T, SettlementError>;

/// Failure reported by the payment processor for a transfer attempt.
///
/// Every variant is retryable inside the executor's attempt budget;
/// eligibility problems never reach the processor in the first place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("network error: {0}")]
    Network(String),
    #[error("transfer request timed out")]
    Timeout,
    #[error("transfer declined: {0}")]
    Declined(String),
}

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("processor error: {0}")]
    Processor(#[from] ProcessorError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("invalid payout transition: {0}")]
    InvalidTransition(String),
    #[error("no account on record for host {0}")]
    UnknownHost(u64),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}
