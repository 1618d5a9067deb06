//! Persisted report snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rendered report kept for offline viewing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReport {
    pub route_id: String,
    pub route_name: String,
    pub generated_at: DateTime<Utc>,
    pub content: String,
}

impl SavedReport {
    /// Key under which the snapshot is stored
    pub fn key_for(route_id: &str) -> String {
        format!("route_report_{}", route_id)
    }

    pub fn key(&self) -> String {
        Self::key_for(&self.route_id)
    }
}
