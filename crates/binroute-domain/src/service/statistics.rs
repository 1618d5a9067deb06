//! Derived statistics and environmental impact
//!
//! Every function here is a pure derivation over a snapshot of bins (and,
//! where noted, a route). Nothing is cached; callers recompute after each
//! mutation.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

use crate::model::{Bin, BinStatus, BinStop, Route, WasteCategory};
use crate::service::tracker;

/// Fill level at which a bin needs collection
pub const NEEDS_COLLECTION_FILL: f64 = 50.0;

/// Minutes assumed per remaining bin when estimating arrival
pub const MINUTES_PER_BIN: i64 = 15;

/// kg CO2 saved per kg recycled
pub const CO2_PER_KG_RECYCLED: f64 = 0.5;

/// kg CO2 absorbed by one tree
pub const CO2_PER_TREE: f64 = 0.06;

/// `round(part / total * 100)`, 0 for an empty total
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

/// Share of stops already collected
pub fn route_progress(route: &Route) -> u32 {
    let counts = tracker::stop_counts(route);
    percentage(counts.collected_bins, counts.total_bins)
}

/// Counts of bins by status and by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinStatistics {
    pub total: usize,
    pub by_status: BTreeMap<BinStatus, usize>,
    pub by_category: BTreeMap<WasteCategory, usize>,
}

impl BinStatistics {
    pub fn status_count(&self, status: BinStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn category_count(&self, category: WasteCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

pub fn bin_statistics(bins: &[Bin]) -> BinStatistics {
    let mut stats = BinStatistics {
        total: bins.len(),
        by_status: BinStatus::ALL.into_iter().map(|s| (s, 0)).collect(),
        by_category: WasteCategory::ALL.into_iter().map(|c| (c, 0)).collect(),
    };
    for bin in bins {
        *stats.by_status.entry(bin.status).or_default() += 1;
        *stats.by_category.entry(bin.category).or_default() += 1;
    }
    stats
}

/// Dashboard classification of a bin, independent of any route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionClass {
    Completed,
    Pending,
    Issue,
}

/// Issue wins over everything, then full/over-threshold bins are pending,
/// and only an active bin under the threshold counts as completed.
pub fn classify(bin: &Bin) -> CompletionClass {
    match bin.status {
        BinStatus::Maintenance | BinStatus::Inactive => CompletionClass::Issue,
        BinStatus::Full => CompletionClass::Pending,
        BinStatus::Active if bin.fill_level >= NEEDS_COLLECTION_FILL => CompletionClass::Pending,
        BinStatus::Active => CompletionClass::Completed,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub issue: usize,
}

impl CompletionSummary {
    /// Completion percentage over the dashboard classification
    pub fn efficiency(&self) -> u32 {
        percentage(self.completed, self.total)
    }
}

pub fn completion_summary(bins: &[Bin]) -> CompletionSummary {
    bins.iter()
        .fold(CompletionSummary::default(), |mut summary, bin| {
            summary.total += 1;
            match classify(bin) {
                CompletionClass::Completed => summary.completed += 1,
                CompletionClass::Pending => summary.pending += 1,
                CompletionClass::Issue => summary.issue += 1,
            }
            summary
        })
}

pub fn efficiency(bins: &[Bin]) -> u32 {
    completion_summary(bins).efficiency()
}

/// Estimated finish time for `pending` remaining bins, as "HH:MM" local time
pub fn eta(pending: usize, now: DateTime<Local>) -> String {
    let finish = now + Duration::minutes(pending as i64 * MINUTES_PER_BIN);
    finish.format("%H:%M").to_string()
}

/// Collection urgency; sorts high first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    pub fn from_fill_level(fill_level: f64) -> Self {
        if fill_level >= 85.0 {
            Priority::High
        } else if fill_level >= 60.0 {
            Priority::Normal
        } else {
            Priority::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

/// Bins needing collection, high priority first (stable within a rank)
pub fn prioritized_pending(bins: &[Bin]) -> Vec<(&Bin, Priority)> {
    let mut pending: Vec<_> = bins
        .iter()
        .filter(|b| classify(b) == CompletionClass::Pending)
        .map(|b| (b, Priority::from_fill_level(b.fill_level)))
        .collect();
    pending.sort_by_key(|(_, priority)| *priority);
    pending
}

/// Pending stops of a route ordered by the current fill level of their bins
///
/// Stops whose bin is missing from the snapshot rank as low.
pub fn prioritized_stops<'a>(route: &'a Route, bins: &[Bin]) -> Vec<(&'a BinStop, Priority)> {
    let mut stops: Vec<_> = tracker::pending_stops(route)
        .into_iter()
        .map(|stop| {
            let priority = bins
                .iter()
                .find(|b| b.bin_id == stop.bin_id)
                .map(|b| Priority::from_fill_level(b.fill_level))
                .unwrap_or(Priority::Low);
            (stop, priority)
        })
        .collect();
    stops.sort_by_key(|(stop, priority)| (*priority, stop.order));
    stops
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMetrics {
    /// kg, capacity of bins currently classified completed
    pub recycled: f64,
    pub co2_saved: f64,
    pub trees_saved: f64,
}

pub fn impact_metrics(bins: &[Bin]) -> ImpactMetrics {
    let recycled: f64 = bins
        .iter()
        .filter(|b| classify(b) == CompletionClass::Completed)
        .map(|b| b.capacity)
        .sum();
    let co2_saved = (recycled * CO2_PER_KG_RECYCLED).round();
    let trees_saved = (co2_saved / CO2_PER_TREE).round();
    ImpactMetrics {
        recycled,
        co2_saved,
        trees_saved,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCollection {
    pub category: WasteCategory,
    pub count: usize,
    pub capacity: f64,
}

/// Completed bins per category, always one entry per category
pub fn collections_by_category(bins: &[Bin]) -> Vec<CategoryCollection> {
    WasteCategory::ALL
        .into_iter()
        .map(|category| {
            let completed: Vec<_> = bins
                .iter()
                .filter(|b| b.category == category && classify(b) == CompletionClass::Completed)
                .collect();
            CategoryCollection {
                category,
                count: completed.len(),
                capacity: completed.iter().map(|b| b.capacity).sum(),
            }
        })
        .collect()
}
