//! Gateway and repository trait definitions
//!
//! The remote store owns durable bin and route state. Everything here is a
//! request/response contract; implementations live in `binroute-infra` (and in
//! test fakes).

use std::path::PathBuf;

use crate::model::{
    Bin, BinFilter, BinPatch, BinUpdate, Checklist, PendingMutation, Route, RouteStatistics,
    SavedReport,
};
use binroute_types::Result;

/// Request/response contract with the remote collaborator
pub trait CollectionGateway: Send + Sync {
    /// Fetch bins matching the filter, in no particular order
    fn fetch_bins(&self, filter: &BinFilter) -> Result<Vec<Bin>>;

    fn create_bin(&self, bin: &Bin) -> Result<Bin>;

    fn update_bin(&self, bin_id: &str, patch: &BinPatch) -> Result<Bin>;

    fn delete_bin(&self, bin_id: &str) -> Result<()>;

    /// Apply several patches in one request; all or nothing
    fn bulk_update_bins(&self, updates: &[BinUpdate]) -> Result<Vec<Bin>>;

    /// Fetch routes, optionally only those assigned to `collector`
    fn fetch_routes(&self, collector: Option<&str>) -> Result<Vec<Route>>;

    fn fetch_route(&self, route_id: &str) -> Result<Route>;

    fn create_route(&self, route: &Route) -> Result<Route>;

    fn start_route(&self, route_id: &str, checklist: &Checklist) -> Result<Route>;

    fn collect_bin(&self, route_id: &str, bin_id: &str, actual_weight: f64) -> Result<Route>;

    fn skip_bin(&self, route_id: &str, bin_id: &str, reason: &str) -> Result<Route>;

    fn complete_route(&self, route_id: &str) -> Result<Route>;

    fn cancel_route(&self, route_id: &str) -> Result<Route>;

    fn fetch_route_statistics(&self) -> Result<RouteStatistics>;
}

/// Keyed store of rendered report snapshots
pub trait ReportStore {
    fn save(&self, report: &SavedReport) -> Result<()>;

    /// `Ok(None)` when nothing was saved for the route
    fn load(&self, route_id: &str) -> Result<Option<SavedReport>>;

    fn find_all(&self) -> Result<Vec<SavedReport>>;

    /// Write the rendered text where it can be handed to a share target
    fn write_text(&self, report: &SavedReport) -> Result<PathBuf>;
}

/// FIFO queue of writes waiting for connectivity
pub trait MutationQueue: Send {
    fn enqueue(&self, mutation: PendingMutation) -> Result<()>;

    /// All queued mutations in enqueue order
    fn pending(&self) -> Result<Vec<PendingMutation>>;

    /// Drop the first `count` entries after they have been replayed
    fn acknowledge(&self, count: usize) -> Result<()>;

    fn len(&self) -> Result<usize> {
        Ok(self.pending()?.len())
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
