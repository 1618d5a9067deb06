//! Per-stop classification within a route

use serde::{Deserialize, Serialize};

use crate::model::{BinStop, Route, StopStatus};

fn stops_with(route: &Route, status: StopStatus) -> Vec<&BinStop> {
    route.stops.iter().filter(|s| s.status == status).collect()
}

pub fn pending_stops(route: &Route) -> Vec<&BinStop> {
    stops_with(route, StopStatus::Pending)
}

pub fn collected_stops(route: &Route) -> Vec<&BinStop> {
    stops_with(route, StopStatus::Collected)
}

pub fn skipped_stops(route: &Route) -> Vec<&BinStop> {
    stops_with(route, StopStatus::Skipped)
}

/// Bin counts of one route by stop status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopCounts {
    pub total_bins: usize,
    pub collected_bins: usize,
    pub skipped_bins: usize,
    pub pending_bins: usize,
}

impl StopCounts {
    pub fn processed(&self) -> usize {
        self.collected_bins + self.skipped_bins
    }
}

pub fn stop_counts(route: &Route) -> StopCounts {
    route
        .stops
        .iter()
        .fold(StopCounts::default(), |mut counts, stop| {
            counts.total_bins += 1;
            match stop.status {
                StopStatus::Pending => counts.pending_bins += 1,
                StopStatus::Collected => counts.collected_bins += 1,
                StopStatus::Skipped => counts.skipped_bins += 1,
            }
            counts
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RouteStatus, WasteCategory};
    use chrono::{NaiveDate, NaiveTime};

    fn route_with(statuses: &[StopStatus]) -> Route {
        Route {
            id: "r".to_string(),
            name: "r".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            collector: None,
            stops: statuses
                .iter()
                .enumerate()
                .map(|(i, status)| BinStop {
                    bin_id: format!("b{}", i),
                    order: i as u32 + 1,
                    location: String::new(),
                    category: WasteCategory::General,
                    status: *status,
                    expected_weight: 0.0,
                    actual_weight: None,
                    fill_level_at_collection: None,
                    collected_at: None,
                    notes: None,
                })
                .collect(),
            status: RouteStatus::InProgress,
            checklist: None,
            started_at: None,
            completed_at: None,
            waste_collected: None,
            recyclable_waste: None,
            route_duration: None,
        }
    }

    #[test]
    fn test_classification() {
        let route = route_with(&[
            StopStatus::Pending,
            StopStatus::Collected,
            StopStatus::Collected,
            StopStatus::Skipped,
        ]);
        assert_eq!(pending_stops(&route).len(), 1);
        assert_eq!(collected_stops(&route).len(), 2);
        assert_eq!(skipped_stops(&route).len(), 1);

        let counts = stop_counts(&route);
        assert_eq!(counts.total_bins, 4);
        assert_eq!(counts.processed(), 3);
        assert_eq!(counts.pending_bins, 1);
    }

    #[test]
    fn test_empty_route_counts() {
        assert_eq!(stop_counts(&route_with(&[])), StopCounts::default());
    }
}
