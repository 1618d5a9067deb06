//! Remote store backed by a JSON document on disk
//!
//! Stands in for the remote collaborator when running from the command line.
//! It enforces the same transition rules as the lifecycle manager and owns
//! the durable copy of bins and routes.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use binroute_domain::model::{
    Bin, BinFilter, BinPatch, BinUpdate, Checklist, Route, RouteStatistics, RouteStatus,
};
use binroute_domain::repository::CollectionGateway;
use binroute_domain::service::lifecycle;
use binroute_types::{Error, Result, TransportError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RemoteDocument {
    #[serde(default)]
    bins: BTreeMap<String, Bin>,
    #[serde(default)]
    routes: BTreeMap<String, Route>,
}

impl RemoteDocument {
    fn bin(&self, bin_id: &str) -> Result<&Bin> {
        self.bins
            .get(bin_id)
            .ok_or_else(|| Error::not_found(format!("bin {}", bin_id)))
    }

    fn route(&self, route_id: &str) -> Result<&Route> {
        self.routes
            .get(route_id)
            .ok_or_else(|| Error::not_found(format!("route {}", route_id)))
    }

    fn replace_route(&mut self, route: Route) -> Route {
        self.routes.insert(route.id.clone(), route.clone());
        route
    }
}

pub struct JsonFileGateway {
    document_path: PathBuf,
    document: Mutex<RemoteDocument>,
    offline: AtomicBool,
}

impl JsonFileGateway {
    /// Create or load the document at `<store_dir>/remote.json`
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        let document_path = store_dir.join("remote.json");

        let document = if document_path.exists() {
            let file = File::open(&document_path)?;
            serde_json::from_reader(BufReader::new(file))?
        } else {
            RemoteDocument::default()
        };

        Ok(Self {
            document_path,
            document: Mutex::new(document),
            offline: AtomicBool::new(false),
        })
    }

    /// Simulate lost connectivity; every call fails with a transport error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn with_offline(self, offline: bool) -> Self {
        self.set_offline(offline);
        self
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable("remote store offline".to_string()).into());
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&RemoteDocument) -> Result<T>) -> Result<T> {
        self.ensure_online()?;
        let document = self
            .document
            .lock()
            .map_err(|_| TransportError::Storage("remote document lock poisoned".to_string()))?;
        f(&document)
    }

    /// Apply `f` to a copy, persist it, then swap it in
    fn write<T>(&self, f: impl FnOnce(&mut RemoteDocument) -> Result<T>) -> Result<T> {
        self.ensure_online()?;
        let mut document = self
            .document
            .lock()
            .map_err(|_| TransportError::Storage("remote document lock poisoned".to_string()))?;
        let mut next = document.clone();
        let value = f(&mut next)?;
        self.persist(&next)?;
        *document = next;
        Ok(value)
    }

    fn persist(&self, document: &RemoteDocument) -> Result<()> {
        let storage = |e: std::io::Error| TransportError::Storage(format!("remote document: {}", e));
        let file = File::create(&self.document_path).map_err(storage)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, document).map_err(|e| storage(e.into()))?;
        writer.flush().map_err(storage)?;
        debug!(path = %self.document_path.display(), "remote document saved");
        Ok(())
    }
}

impl CollectionGateway for JsonFileGateway {
    fn fetch_bins(&self, filter: &BinFilter) -> Result<Vec<Bin>> {
        self.read(|doc| Ok(doc.bins.values().filter(|b| filter.matches(b)).cloned().collect()))
    }

    fn create_bin(&self, bin: &Bin) -> Result<Bin> {
        self.write(|doc| {
            bin.validate()?;
            if doc.bins.contains_key(&bin.bin_id) {
                return Err(Error::conflict(format!("bin {} already exists", bin.bin_id)));
            }
            doc.bins.insert(bin.bin_id.clone(), bin.clone());
            Ok(bin.clone())
        })
    }

    fn update_bin(&self, bin_id: &str, patch: &BinPatch) -> Result<Bin> {
        self.write(|doc| {
            let next = patch.applied_to(doc.bin(bin_id)?)?;
            doc.bins.insert(bin_id.to_string(), next.clone());
            Ok(next)
        })
    }

    fn delete_bin(&self, bin_id: &str) -> Result<()> {
        self.write(|doc| {
            doc.bin(bin_id)?;
            let referenced = doc.routes.values().any(|r| r.stop(bin_id).is_some());
            if referenced {
                return Err(Error::conflict(format!(
                    "bin {} is referenced by a route",
                    bin_id
                )));
            }
            doc.bins.remove(bin_id);
            Ok(())
        })
    }

    fn bulk_update_bins(&self, updates: &[BinUpdate]) -> Result<Vec<Bin>> {
        self.write(|doc| {
            let mut updated = Vec::with_capacity(updates.len());
            for update in updates {
                let next = update.patch.applied_to(doc.bin(&update.bin_id)?)?;
                doc.bins.insert(update.bin_id.clone(), next.clone());
                updated.push(next);
            }
            Ok(updated)
        })
    }

    fn fetch_routes(&self, collector: Option<&str>) -> Result<Vec<Route>> {
        self.read(|doc| {
            Ok(doc
                .routes
                .values()
                .filter(|r| collector.map_or(true, |c| r.collector.as_deref() == Some(c)))
                .cloned()
                .collect())
        })
    }

    fn fetch_route(&self, route_id: &str) -> Result<Route> {
        self.read(|doc| doc.route(route_id).cloned())
    }

    fn create_route(&self, route: &Route) -> Result<Route> {
        self.write(|doc| {
            if doc.routes.contains_key(&route.id) {
                return Err(Error::conflict(format!("route {} already exists", route.id)));
            }
            for stop in &route.stops {
                doc.bin(&stop.bin_id)?;
            }
            route.check_invariants()?;
            info!(route_id = %route.id, stops = route.stops.len(), "route created");
            Ok(doc.replace_route(route.clone()))
        })
    }

    fn start_route(&self, route_id: &str, checklist: &Checklist) -> Result<Route> {
        self.write(|doc| {
            let next = lifecycle::start_route(doc.route(route_id)?, checklist, Utc::now())?;
            Ok(doc.replace_route(next))
        })
    }

    fn collect_bin(&self, route_id: &str, bin_id: &str, actual_weight: f64) -> Result<Route> {
        self.write(|doc| {
            let now = Utc::now();
            let fill_level = doc.bin(bin_id)?.fill_level;
            let next =
                lifecycle::collect_bin(doc.route(route_id)?, bin_id, actual_weight, fill_level, now)?;
            if let Some(bin) = doc.bins.get_mut(bin_id) {
                bin.mark_collected(now);
            }
            Ok(doc.replace_route(next))
        })
    }

    fn skip_bin(&self, route_id: &str, bin_id: &str, reason: &str) -> Result<Route> {
        self.write(|doc| {
            let fill_level = doc.bins.get(bin_id).map(|b| b.fill_level);
            let next = lifecycle::skip_bin(doc.route(route_id)?, bin_id, reason, fill_level)?;
            Ok(doc.replace_route(next))
        })
    }

    fn complete_route(&self, route_id: &str) -> Result<Route> {
        self.write(|doc| {
            let next = lifecycle::complete_route(doc.route(route_id)?, Utc::now())?;
            Ok(doc.replace_route(next))
        })
    }

    fn cancel_route(&self, route_id: &str) -> Result<Route> {
        self.write(|doc| {
            let next = lifecycle::cancel_route(doc.route(route_id)?)?;
            Ok(doc.replace_route(next))
        })
    }

    fn fetch_route_statistics(&self) -> Result<RouteStatistics> {
        self.read(|doc| {
            let mut stats = RouteStatistics {
                total_routes: doc.routes.len(),
                ..Default::default()
            };
            for route in doc.routes.values() {
                match route.status {
                    RouteStatus::Scheduled => stats.scheduled += 1,
                    RouteStatus::InProgress => stats.in_progress += 1,
                    RouteStatus::Completed => stats.completed += 1,
                    RouteStatus::Cancelled => stats.cancelled += 1,
                }
                stats.total_waste_collected += route.waste_collected.unwrap_or(0.0);
                stats.total_recyclable_waste += route.recyclable_waste.unwrap_or(0.0);
            }
            Ok(stats)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binroute_domain::model::{BinStatus, BinStop, StopStatus, WasteCategory};
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::tempdir;

    fn seeded(dir: &std::path::Path) -> JsonFileGateway {
        let gateway = JsonFileGateway::open(dir.to_path_buf()).unwrap();
        let mut bin = Bin::new("b1", "Main St", "North", WasteCategory::Recyclable, 100.0);
        bin.fill_level = 90.0;
        bin.weight = 80.0;
        bin.status = BinStatus::Full;
        gateway.create_bin(&bin).unwrap();
        gateway
            .create_route(&Route {
                id: "r1".to_string(),
                name: "North".to_string(),
                scheduled_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                scheduled_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                collector: Some("jo".to_string()),
                stops: vec![BinStop {
                    bin_id: "b1".to_string(),
                    order: 1,
                    location: "Main St".to_string(),
                    category: WasteCategory::Recyclable,
                    status: StopStatus::Pending,
                    expected_weight: 80.0,
                    actual_weight: None,
                    fill_level_at_collection: None,
                    collected_at: None,
                    notes: None,
                }],
                status: RouteStatus::Scheduled,
                checklist: None,
                started_at: None,
                completed_at: None,
                waste_collected: None,
                recyclable_waste: None,
                route_duration: None,
            })
            .unwrap();
        gateway
    }

    fn ready() -> Checklist {
        let mut checklist = Checklist::standard();
        checklist.check_all();
        checklist.complete(Utc::now()).unwrap();
        checklist
    }

    #[test]
    fn test_collect_empties_bin_and_persists() {
        let dir = tempdir().unwrap();
        {
            let gateway = seeded(dir.path());
            gateway.start_route("r1", &ready()).unwrap();
            let route = gateway.collect_bin("r1", "b1", 78.0).unwrap();
            assert_eq!(route.stop("b1").unwrap().fill_level_at_collection, Some(90.0));
        }
        let gateway = JsonFileGateway::open(dir.path().to_path_buf()).unwrap();
        let bins = gateway.fetch_bins(&BinFilter::default()).unwrap();
        assert_eq!(bins[0].fill_level, 0.0);
        assert_eq!(bins[0].status, BinStatus::Active);
        let route = gateway.complete_route("r1").unwrap();
        assert_eq!(route.recyclable_waste, Some(78.0));
        let stats = gateway.fetch_route_statistics().unwrap();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total_waste_collected, 78.0);
    }

    #[test]
    fn test_rejected_write_leaves_document_untouched() {
        let dir = tempdir().unwrap();
        let gateway = seeded(dir.path());
        assert!(gateway.collect_bin("r1", "b1", 5.0).is_err());
        let route = gateway.fetch_route("r1").unwrap();
        assert_eq!(route.status, RouteStatus::Scheduled);
    }

    #[test]
    fn test_offline_is_transport_error() {
        let dir = tempdir().unwrap();
        let gateway = seeded(dir.path()).with_offline(true);
        let err = gateway.fetch_routes(None).unwrap_err();
        assert!(err.is_retryable());
        gateway.set_offline(false);
        assert_eq!(gateway.fetch_routes(Some("jo")).unwrap().len(), 1);
        assert!(gateway.fetch_routes(Some("max")).unwrap().is_empty());
    }

    #[test]
    fn test_delete_referenced_bin_conflicts() {
        let dir = tempdir().unwrap();
        let gateway = seeded(dir.path());
        assert!(matches!(gateway.delete_bin("b1"), Err(Error::Conflict(_))));
    }

    #[test]
    fn test_bulk_update_all_or_nothing() {
        let dir = tempdir().unwrap();
        let gateway = seeded(dir.path());
        let updates = vec![
            BinUpdate {
                bin_id: "b1".to_string(),
                patch: BinPatch {
                    fill_level: Some(10.0),
                    ..Default::default()
                },
            },
            BinUpdate {
                bin_id: "missing".to_string(),
                patch: BinPatch::default(),
            },
        ];
        assert!(gateway.bulk_update_bins(&updates).is_err());
        let bins = gateway.fetch_bins(&BinFilter::default()).unwrap();
        assert_eq!(bins[0].fill_level, 90.0);
    }

    #[cfg(unix)]
    #[test]
    fn test_full_disk_write_keeps_previous_document() {
        let dir = tempdir().unwrap();
        let gateway = seeded(dir.path());
        let remote = dir.path().join("remote.json");
        fs::remove_file(&remote).unwrap();
        std::os::unix::fs::symlink("/dev/full", &remote).unwrap();

        let err = gateway.start_route("r1", &ready()).unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Storage(_))));
        assert_eq!(gateway.fetch_route("r1").unwrap().status, RouteStatus::Scheduled);
    }
}
