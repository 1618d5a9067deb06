//! Route Lifecycle Manager
//!
//! Drives every route transition:
//! 1. Validate the transition locally against the last confirmed snapshot
//! 2. Send the request to the remote store
//! 3. Adopt the returned route record, never the local preview
//!
//! A transport failure leaves local state untouched and, when a queue is
//! attached, records the mutation for later replay.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use binroute_domain::model::{
    BinFilter, BinStop, Checklist, PendingMutation, Route, RouteStatus, StopStatus,
};
use binroute_domain::repository::{CollectionGateway, MutationQueue};
use binroute_domain::service::lifecycle;
use binroute_domain::service::statistics::{prioritized_stops, Priority};
use binroute_store::{lock, BinRegistry, RouteBook, SharedRegistry};
use binroute_types::{Error, Result};

/// Input for creating a route
#[derive(Debug, Clone)]
pub struct RouteDraft {
    pub name: String,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub collector: Option<String>,
    /// Bins in visiting order
    pub bin_ids: Vec<String>,
}

pub struct RouteLifecycleManager {
    gateway: Arc<dyn CollectionGateway>,
    registry: SharedRegistry,
    routes: RouteBook,
    queue: Option<Box<dyn MutationQueue>>,
}

impl RouteLifecycleManager {
    pub fn new(gateway: Arc<dyn CollectionGateway>, registry: SharedRegistry) -> Self {
        Self {
            gateway,
            registry,
            routes: RouteBook::new(),
            queue: None,
        }
    }

    /// Record transport failures in `queue` for later replay
    pub fn with_queue(mut self, queue: Box<dyn MutationQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn routes(&self) -> &RouteBook {
        &self.routes
    }

    pub fn route(&self, route_id: &str) -> Result<&Route> {
        self.routes.get(route_id)
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Reload routes (optionally one collector's) and all bins from the remote store
    pub fn refresh(&mut self, collector: Option<&str>) -> Result<()> {
        let routes = self.gateway.fetch_routes(collector)?;
        let bins = self.gateway.fetch_bins(&BinFilter::default())?;
        for route in &routes {
            if let Err(e) = route.check_invariants() {
                warn!(route_id = %route.id, error = %e, "remote route record is inconsistent");
            }
        }
        debug!(routes = routes.len(), bins = bins.len(), "refreshed from remote");
        self.routes.replace_all(routes);
        lock(&self.registry)?.replace_all(bins)?;
        Ok(())
    }

    /// Pending stops of a route, fullest bins first
    pub fn next_stops(&self, route_id: &str) -> Result<Vec<(BinStop, Priority)>> {
        let route = self.routes.get(route_id)?;
        let bins = lock(&self.registry)?.snapshot();
        Ok(prioritized_stops(route, &bins)
            .into_iter()
            .map(|(stop, priority)| (stop.clone(), priority))
            .collect())
    }

    /// Create a scheduled route over registered bins
    pub fn create_route(&mut self, draft: &RouteDraft) -> Result<&Route> {
        let route = {
            let registry = lock(&self.registry)?;
            build_route(draft, &registry, Uuid::new_v4().to_string())?
        };
        let created = self.gateway.create_route(&route)?;
        info!(route_id = %created.id, name = %created.name, stops = created.stops.len(), "route created");
        Ok(self.adopt(created))
    }

    pub fn start_route(&mut self, route_id: &str, checklist: &Checklist) -> Result<&Route> {
        let now = Utc::now();
        lifecycle::start_route(self.routes.get(route_id)?, checklist, now)?;

        match self.gateway.start_route(route_id, checklist) {
            Ok(route) => {
                info!(route_id, "route started");
                Ok(self.adopt(route))
            }
            Err(e) => Err(self.remote_failed(e, PendingMutation::start_route(route_id, checklist, now))),
        }
    }

    /// Record a collection and empty the bin
    pub fn collect_bin(&mut self, route_id: &str, bin_id: &str, actual_weight: f64) -> Result<&Route> {
        let now = Utc::now();
        let route = self.routes.get(route_id)?;

        // Held until the local bin is emptied so a daily reset cannot interleave.
        let mut registry = lock(&self.registry)?;
        let fill_level = registry.get(bin_id).map(|b| b.fill_level).unwrap_or_default();
        lifecycle::collect_bin(route, bin_id, actual_weight, fill_level, now)?;

        let confirmed = match self.gateway.collect_bin(route_id, bin_id, actual_weight) {
            Ok(route) => route,
            Err(e) => {
                drop(registry);
                let mutation = PendingMutation::collect_bin(route_id, bin_id, actual_weight, now);
                return Err(self.remote_failed(e, mutation));
            }
        };

        let collected_at = confirmed
            .stop(bin_id)
            .and_then(|s| s.collected_at)
            .unwrap_or(now);
        match registry.get(bin_id).cloned() {
            Some(mut bin) => {
                bin.mark_collected(collected_at);
                registry.upsert(bin)?;
            }
            None => debug!(bin_id, "collected bin not in local registry"),
        }
        drop(registry);

        info!(route_id, bin_id, actual_weight, "bin collected");
        Ok(self.adopt(confirmed))
    }

    pub fn skip_bin(&mut self, route_id: &str, bin_id: &str, reason: &str) -> Result<&Route> {
        let now = Utc::now();
        let fill_level = lock(&self.registry)?.get(bin_id).map(|b| b.fill_level);
        lifecycle::skip_bin(self.routes.get(route_id)?, bin_id, reason, fill_level)?;

        match self.gateway.skip_bin(route_id, bin_id, reason) {
            Ok(route) => {
                info!(route_id, bin_id, reason, "bin skipped");
                Ok(self.adopt(route))
            }
            Err(e) => Err(self.remote_failed(e, PendingMutation::skip_bin(route_id, bin_id, reason, now))),
        }
    }

    pub fn complete_route(&mut self, route_id: &str) -> Result<&Route> {
        let now = Utc::now();
        lifecycle::complete_route(self.routes.get(route_id)?, now)?;

        match self.gateway.complete_route(route_id) {
            Ok(route) => {
                info!(
                    route_id,
                    waste = route.waste_collected.unwrap_or_default(),
                    minutes = route.route_duration.unwrap_or_default(),
                    "route completed"
                );
                Ok(self.adopt(route))
            }
            Err(e) => Err(self.remote_failed(e, PendingMutation::complete_route(route_id, now))),
        }
    }

    pub fn cancel_route(&mut self, route_id: &str) -> Result<&Route> {
        let now = Utc::now();
        lifecycle::cancel_route(self.routes.get(route_id)?)?;

        match self.gateway.cancel_route(route_id) {
            Ok(route) => {
                info!(route_id, "route cancelled");
                Ok(self.adopt(route))
            }
            Err(e) => Err(self.remote_failed(e, PendingMutation::cancel_route(route_id, now))),
        }
    }

    fn adopt(&mut self, route: Route) -> &Route {
        if let Err(e) = route.check_invariants() {
            warn!(route_id = %route.id, error = %e, "remote returned an inconsistent route");
        }
        self.routes.put(route)
    }

    fn remote_failed(&self, error: Error, mutation: PendingMutation) -> Error {
        if !error.is_retryable() {
            warn!(route_id = %mutation.route_id, error = %error, "remote rejected mutation");
            return error;
        }
        match &self.queue {
            Some(queue) => match queue.enqueue(mutation) {
                Ok(()) => info!(error = %error, "remote unavailable, mutation queued for replay"),
                Err(e) => warn!(error = %e, "failed to queue mutation"),
            },
            None => warn!(error = %error, "remote unavailable, mutation dropped"),
        }
        error
    }
}

/// Build a scheduled route from registered bins
///
/// Stops are numbered from 1 in the given order. Each stop copies the bin's
/// location, category, and current weight as the expected weight.
pub fn build_route(draft: &RouteDraft, registry: &BinRegistry, id: String) -> Result<Route> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(Error::validation("route name required"));
    }

    let mut seen = HashSet::new();
    let mut stops = Vec::with_capacity(draft.bin_ids.len());
    for (idx, bin_id) in draft.bin_ids.iter().enumerate() {
        if !seen.insert(bin_id.as_str()) {
            return Err(Error::validation(format!("bin {} listed twice", bin_id)));
        }
        let bin = registry
            .get(bin_id)
            .ok_or_else(|| Error::not_found(format!("bin {}", bin_id)))?;
        stops.push(BinStop {
            bin_id: bin.bin_id.clone(),
            order: idx as u32 + 1,
            location: bin.location.clone(),
            category: bin.category,
            status: StopStatus::Pending,
            expected_weight: bin.weight,
            actual_weight: None,
            fill_level_at_collection: None,
            collected_at: None,
            notes: None,
        });
    }

    Ok(Route {
        id,
        name: name.to_string(),
        scheduled_date: draft.scheduled_date,
        scheduled_time: draft.scheduled_time,
        collector: draft
            .collector
            .as_ref()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        stops,
        status: RouteStatus::Scheduled,
        checklist: None,
        started_at: None,
        completed_at: None,
        waste_collected: None,
        recyclable_waste: None,
        route_duration: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use binroute_domain::model::{Bin, WasteCategory};

    fn registry() -> BinRegistry {
        let mut a = Bin::new("B-1", "Elm St", "North", WasteCategory::Recyclable, 120.0);
        a.weight = 40.0;
        let b = Bin::new("B-2", "Oak Ave", "North", WasteCategory::General, 240.0);
        BinRegistry::from_bins(vec![a, b]).unwrap()
    }

    fn draft(bins: &[&str]) -> RouteDraft {
        RouteDraft {
            name: "Morning North".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            collector: Some(" alex ".to_string()),
            bin_ids: bins.iter().map(|b| b.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_route_numbers_and_copies() {
        let route = build_route(&draft(&["B-2", "B-1"]), &registry(), "r1".to_string()).unwrap();
        assert_eq!(route.status, RouteStatus::Scheduled);
        assert_eq!(route.collector.as_deref(), Some("alex"));
        assert_eq!(route.stops[0].bin_id, "B-2");
        assert_eq!(route.stops[0].order, 1);
        assert_eq!(route.stops[1].order, 2);
        assert_eq!(route.stops[1].expected_weight, 40.0);
        assert_eq!(route.stops[1].category, WasteCategory::Recyclable);
        route.check_invariants().unwrap();
    }

    #[test]
    fn test_build_route_rejects_unknown_and_duplicate() {
        assert!(matches!(
            build_route(&draft(&["B-9"]), &registry(), "r".to_string()),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            build_route(&draft(&["B-1", "B-1"]), &registry(), "r".to_string()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_build_route_requires_name() {
        let mut d = draft(&["B-1"]);
        d.name = "  ".to_string();
        assert!(matches!(
            build_route(&d, &registry(), "r".to_string()),
            Err(Error::Validation(_))
        ));
    }
}
