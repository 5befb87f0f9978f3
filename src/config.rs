use std::time::Duration;

/// Engine tunables with production defaults. The CLI overrides a subset;
/// tests construct the struct directly.
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    /// Transfer attempts per payout before it is marked failed.
    pub max_attempts: u32,
    /// Base delay of the linear retry backoff; attempt n is followed by a
    /// wait of `n * backoff_base`.
    pub backoff_base: Duration,
    /// How far a payout is pushed out when its booking has an open dispute.
    pub dispute_hold_days: i64,
    /// Upper bound on hosts settled concurrently within one run.
    pub max_concurrent_hosts: usize,
    /// ISO currency code passed to the processor.
    pub currency: String,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            dispute_hold_days: 7,
            max_concurrent_hosts: 4,
            currency: "usd".to_string(),
        }
    }
}

impl SettlementConfig {
    pub fn dispute_hold(&self) -> chrono::Duration {
        chrono::Duration::days(self.dispute_hold_days)
    }
}
