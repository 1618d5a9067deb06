//! Route and bin-stop type definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use binroute_types::{Error, Result};

use super::bin::WasteCategory;
use super::checklist::Checklist;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub const ALL: [RouteStatus; 4] = [
        RouteStatus::Scheduled,
        RouteStatus::InProgress,
        RouteStatus::Completed,
        RouteStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RouteStatus::Scheduled => "scheduled",
            RouteStatus::InProgress => "in-progress",
            RouteStatus::Completed => "completed",
            RouteStatus::Cancelled => "cancelled",
        }
    }

    /// scheduled -> in-progress -> completed, and scheduled -> cancelled
    pub fn can_transition_to(&self, next: RouteStatus) -> bool {
        matches!(
            (self, next),
            (RouteStatus::Scheduled, RouteStatus::InProgress)
                | (RouteStatus::InProgress, RouteStatus::Completed)
                | (RouteStatus::Scheduled, RouteStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteStatus::Completed | RouteStatus::Cancelled)
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RouteStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RouteStatus::ALL
            .into_iter()
            .find(|st| st.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("unknown route status: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopStatus {
    Pending,
    Collected,
    Skipped,
}

impl StopStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StopStatus::Pending => "pending",
            StopStatus::Collected => "collected",
            StopStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One bin's participation in one route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinStop {
    pub bin_id: String,
    /// 1-based display order, unique within the route
    pub order: u32,
    /// Location copied from the bin at route creation
    pub location: String,
    /// Category copied from the bin at route creation
    pub category: WasteCategory,
    pub status: StopStatus,
    pub expected_weight: f64,
    #[serde(default)]
    pub actual_weight: Option<f64>,
    #[serde(default)]
    pub fill_level_at_collection: Option<f64>,
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BinStop {
    pub fn is_pending(&self) -> bool {
        self.status == StopStatus::Pending
    }

    fn check_invariants(&self) -> Result<()> {
        let collected = self.status == StopStatus::Collected;
        let skipped = self.status == StopStatus::Skipped;
        if self.actual_weight.is_some() != collected {
            return Err(Error::conflict(format!(
                "stop {} has actual weight in status {}",
                self.bin_id, self.status
            )));
        }
        if collected && self.fill_level_at_collection.is_none() {
            return Err(Error::conflict(format!(
                "collected stop {} has no fill level",
                self.bin_id
            )));
        }
        let has_notes = self.notes.as_deref().is_some_and(|n| !n.trim().is_empty());
        if skipped && !has_notes {
            return Err(Error::conflict(format!(
                "skipped stop {} has no reason",
                self.bin_id
            )));
        }
        Ok(())
    }
}

/// A scheduled collection assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub name: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    #[serde(default)]
    pub collector: Option<String>,
    pub stops: Vec<BinStop>,
    pub status: RouteStatus,
    #[serde(default)]
    pub checklist: Option<Checklist>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Total kg collected, set on completion
    #[serde(default)]
    pub waste_collected: Option<f64>,
    /// Recyclable kg collected, set on completion
    #[serde(default)]
    pub recyclable_waste: Option<f64>,
    /// Whole minutes between start and completion
    #[serde(default)]
    pub route_duration: Option<i64>,
}

impl Route {
    pub fn stop(&self, bin_id: &str) -> Option<&BinStop> {
        self.stops.iter().find(|s| s.bin_id == bin_id)
    }

    pub fn stop_mut(&mut self, bin_id: &str) -> Option<&mut BinStop> {
        self.stops.iter_mut().find(|s| s.bin_id == bin_id)
    }

    /// Stops in display order
    pub fn ordered_stops(&self) -> Vec<&BinStop> {
        let mut stops: Vec<_> = self.stops.iter().collect();
        stops.sort_by_key(|s| s.order);
        stops
    }

    pub fn collector_label(&self) -> &str {
        self.collector.as_deref().unwrap_or("Unassigned")
    }

    /// Verify timestamp, order, and stop invariants of a record
    pub fn check_invariants(&self) -> Result<()> {
        let started = matches!(self.status, RouteStatus::InProgress | RouteStatus::Completed);
        if self.started_at.is_some() != started {
            return Err(Error::conflict(format!(
                "route {} has inconsistent start time for status {}",
                self.id, self.status
            )));
        }
        if self.completed_at.is_some() != (self.status == RouteStatus::Completed) {
            return Err(Error::conflict(format!(
                "route {} has inconsistent completion time for status {}",
                self.id, self.status
            )));
        }
        if let (Some(start), Some(end)) = (self.started_at, self.completed_at) {
            if end < start {
                return Err(Error::conflict(format!(
                    "route {} completed before it started",
                    self.id
                )));
            }
        }
        let mut orders: Vec<u32> = self.stops.iter().map(|s| s.order).collect();
        orders.sort_unstable();
        orders.dedup();
        if orders.len() != self.stops.len() || orders.first().is_some_and(|o| *o == 0) {
            return Err(Error::conflict(format!(
                "route {} has duplicate or zero stop order",
                self.id
            )));
        }
        self.stops.iter().try_for_each(BinStop::check_invariants)
    }
}

/// Precomputed route counts served by the remote store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatistics {
    pub total_routes: usize,
    pub scheduled: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub total_waste_collected: f64,
    pub total_recyclable_waste: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use RouteStatus::*;
        assert!(Scheduled.can_transition_to(InProgress));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Completed));

        assert!(!Scheduled.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Cancelled));
        assert!(!InProgress.can_transition_to(Scheduled));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Scheduled));
        for status in RouteStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(RouteStatus::InProgress).unwrap(),
            "in-progress"
        );
        assert_eq!("in-progress".parse::<RouteStatus>().unwrap(), RouteStatus::InProgress);
        assert_eq!(serde_json::to_value(StopStatus::Skipped).unwrap(), "skipped");
    }
}
