//! Collector dashboard figures derived from the bin snapshot

use chrono::{DateTime, Local};
use serde::Serialize;

use binroute_domain::model::{Bin, RouteStatistics};
use binroute_domain::service::statistics::{
    bin_statistics, collections_by_category, completion_summary, eta, impact_metrics,
    prioritized_pending, BinStatistics, CategoryCollection, CompletionSummary, ImpactMetrics,
    Priority,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBin {
    pub bin_id: String,
    pub location: String,
    pub fill_level: f64,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub bins: BinStatistics,
    pub completion: CompletionSummary,
    pub efficiency: u32,
    /// Local "HH:MM" when the pending bins should be done
    pub eta: String,
    pub impact: ImpactMetrics,
    pub by_category: Vec<CategoryCollection>,
    /// Highest priority first
    pub pending: Vec<PendingBin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<RouteStatistics>,
}

impl DashboardSnapshot {
    pub fn compute(bins: &[Bin], now: DateTime<Local>) -> Self {
        let completion = completion_summary(bins);
        let pending = prioritized_pending(bins)
            .into_iter()
            .map(|(bin, priority)| PendingBin {
                bin_id: bin.bin_id.clone(),
                location: bin.location.clone(),
                fill_level: bin.fill_level,
                priority,
            })
            .collect();

        Self {
            bins: bin_statistics(bins),
            efficiency: completion.efficiency(),
            eta: eta(completion.pending, now),
            completion,
            impact: impact_metrics(bins),
            by_category: collections_by_category(bins),
            pending,
            routes: None,
        }
    }

    /// Attach the remote route counts
    pub fn with_routes(mut self, routes: RouteStatistics) -> Self {
        self.routes = Some(routes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binroute_domain::model::{BinStatus, WasteCategory};
    use chrono::TimeZone;

    fn bin(id: &str, fill: f64, status: BinStatus) -> Bin {
        let mut bin = Bin::new(id, format!("{} street", id), "North", WasteCategory::Recyclable, 100.0);
        bin.fill_level = fill;
        bin.status = status;
        bin
    }

    #[test]
    fn test_compute_dashboard() {
        let bins = vec![
            bin("B-1", 10.0, BinStatus::Active),
            bin("B-2", 70.0, BinStatus::Active),
            bin("B-3", 90.0, BinStatus::Full),
            bin("B-4", 20.0, BinStatus::Maintenance),
        ];
        let now = Local.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();
        let snapshot = DashboardSnapshot::compute(&bins, now);

        assert_eq!(snapshot.completion.completed, 1);
        assert_eq!(snapshot.completion.pending, 2);
        assert_eq!(snapshot.completion.issue, 1);
        assert_eq!(snapshot.efficiency, 25);
        assert_eq!(snapshot.eta, "09:30");
        assert_eq!(snapshot.impact.recycled, 100.0);
        assert_eq!(snapshot.impact.co2_saved, 50.0);
        assert_eq!(snapshot.pending[0].bin_id, "B-3");
        assert_eq!(snapshot.pending[0].priority, Priority::High);
        assert!(snapshot.routes.is_none());
    }
}
