use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only view of a trip, supplied by the booking service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub booking: u64,
    /// Absent while the trip is still in progress.
    #[serde(default)]
    pub trip_ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    Open,
    UnderReview,
    Resolved,
    Closed,
}

impl DisputeStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, DisputeStatus::Open | DisputeStatus::UnderReview)
    }
}

/// Read-only view of a dispute on a booking, supplied by the booking service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisputeRecord {
    pub booking: u64,
    pub status: DisputeStatus,
}
