use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::iso_millis;
use super::meeting_type::MeetingTypeSummary;

/// An ephemeral bookable interval. Computed fresh on every read, never
/// persisted; its identity is its timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    #[serde(with = "iso_millis")]
    pub starts_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub ends_at: DateTime<Utc>,
}

/// A half-open UTC interval: blocks and confirmed bookings are fed to the
/// slot engine in this shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtcRange {
    #[serde(with = "iso_millis")]
    pub starts_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsResponse {
    pub timezone: String,
    pub meeting_type: MeetingTypeSummary,
    pub range: DateRange,
    pub slots: Vec<Slot>,
}
