use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slotwise_core::models::availability::AvailabilityRule;
use slotwise_core::models::slot::UtcRange;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbOwner {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub email: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbMeetingType {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub slug: String,
    pub name: String,
    pub duration_minutes: i32,
    pub location_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityRule {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub day_of_week: i16,
    pub start_minute: i32,
    pub end_minute: i32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl DbAvailabilityRule {
    /// Project the row into the domain rule shape the slot engine consumes.
    pub fn to_rule(&self) -> AvailabilityRule {
        AvailabilityRule {
            day_of_week: self.day_of_week,
            start_minute: self.start_minute,
            end_minute: self.end_minute,
            enabled: self.enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailabilityBlock {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DbAvailabilityBlock {
    pub fn to_range(&self) -> UtcRange {
        UtcRange {
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub meeting_type_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: String,
    pub cancel_token: String,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl DbBooking {
    pub fn to_range(&self) -> UtcRange {
        UtcRange {
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }
}

/// Insert payload for a new booking; the row is always created CONFIRMED.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub owner_id: Uuid,
    pub meeting_type_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub cancel_token: String,
}
