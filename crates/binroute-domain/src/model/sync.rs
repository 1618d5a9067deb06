//! Offline mutation records queued for replay against the remote store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::checklist::Checklist;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationKind {
    StartRoute,
    CollectBin,
    SkipBin,
    CompleteRoute,
    CancelRoute,
}

/// A remote write that failed in transport and waits for replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMutation {
    #[serde(rename = "type")]
    pub kind: MutationKind,
    pub route_id: String,
    #[serde(default)]
    pub bin_id: Option<String>,
    #[serde(default)]
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl PendingMutation {
    pub fn start_route(route_id: &str, checklist: &Checklist, at: DateTime<Utc>) -> Self {
        Self {
            kind: MutationKind::StartRoute,
            route_id: route_id.to_string(),
            bin_id: None,
            payload: json!({ "checklist": checklist }),
            timestamp: at,
        }
    }

    pub fn collect_bin(route_id: &str, bin_id: &str, actual_weight: f64, at: DateTime<Utc>) -> Self {
        Self {
            kind: MutationKind::CollectBin,
            route_id: route_id.to_string(),
            bin_id: Some(bin_id.to_string()),
            payload: json!({ "actualWeight": actual_weight }),
            timestamp: at,
        }
    }

    pub fn skip_bin(route_id: &str, bin_id: &str, reason: &str, at: DateTime<Utc>) -> Self {
        Self {
            kind: MutationKind::SkipBin,
            route_id: route_id.to_string(),
            bin_id: Some(bin_id.to_string()),
            payload: json!({ "reason": reason }),
            timestamp: at,
        }
    }

    pub fn complete_route(route_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            kind: MutationKind::CompleteRoute,
            route_id: route_id.to_string(),
            bin_id: None,
            payload: Value::Null,
            timestamp: at,
        }
    }

    pub fn cancel_route(route_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            kind: MutationKind::CancelRoute,
            route_id: route_id.to_string(),
            bin_id: None,
            payload: Value::Null,
            timestamp: at,
        }
    }

    pub fn checklist(&self) -> Option<Checklist> {
        serde_json::from_value(self.payload.get("checklist")?.clone()).ok()
    }

    pub fn actual_weight(&self) -> Option<f64> {
        self.payload.get("actualWeight")?.as_f64()
    }

    pub fn reason(&self) -> Option<&str> {
        self.payload.get("reason")?.as_str()
    }
}
