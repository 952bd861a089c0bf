use serde::{Deserialize, Serialize};

/// Public projection of a scheduling owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub slug: String,
    pub name: String,
    pub timezone: String,
}
