use serde::{Deserialize, Serialize};

/// Compact meeting-type projection used in slot listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTypeSummary {
    pub slug: String,
    pub duration_minutes: i32,
}

/// Fuller projection returned on the public booking page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTypeDetail {
    pub slug: String,
    pub name: String,
    pub duration_minutes: i32,
    pub location_value: Option<String>,
}
