//! In-memory route snapshot

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use binroute_domain::model::{Route, RouteStatus};
use binroute_types::{Error, Result};

/// Routes keyed by id, as last confirmed by the remote store
#[derive(Debug, Default, Clone)]
pub struct RouteBook {
    routes: BTreeMap<String, Route>,
}

impl RouteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&mut self, routes: Vec<Route>) {
        self.routes = routes.into_iter().map(|r| (r.id.clone(), r)).collect();
    }

    /// Adopt a route record confirmed by the remote store
    pub fn put(&mut self, route: Route) -> &Route {
        match self.routes.entry(route.id.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(route);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(route),
        }
    }

    pub fn get(&self, route_id: &str) -> Result<&Route> {
        self.routes
            .get(route_id)
            .ok_or_else(|| Error::not_found(format!("route {}", route_id)))
    }

    pub fn list(&self) -> Vec<&Route> {
        let mut routes: Vec<_> = self.routes.values().collect();
        routes.sort_by(|a, b| {
            (a.scheduled_date, a.scheduled_time, &a.name).cmp(&(
                b.scheduled_date,
                b.scheduled_time,
                &b.name,
            ))
        });
        routes
    }

    pub fn for_collector(&self, collector: &str) -> Vec<&Route> {
        self.list()
            .into_iter()
            .filter(|r| r.collector.as_deref() == Some(collector))
            .collect()
    }

    pub fn with_status(&self, status: RouteStatus) -> Vec<&Route> {
        self.list()
            .into_iter()
            .filter(|r| r.status == status)
            .collect()
    }

    /// True if any scheduled or running route still visits the bin
    pub fn references_bin(&self, bin_id: &str) -> bool {
        self.routes
            .values()
            .filter(|r| !r.status.is_terminal())
            .any(|r| r.stop(bin_id).is_some())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
