#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tempfile::TempDir;

use binroute_app::app::{BinAdmin, RouteDraft, RouteLifecycleManager};
use binroute_domain::model::{Bin, BinStatus, Checklist, WasteCategory};
use binroute_domain::repository::CollectionGateway;
use binroute_infra::persistence::{FileMutationQueue, JsonFileGateway};
use binroute_store::{shared, BinRegistry, SharedRegistry};

/// Everything a test needs, backed by a temp directory
pub struct Harness {
    pub dir: TempDir,
    pub gateway: Arc<JsonFileGateway>,
    pub registry: SharedRegistry,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(JsonFileGateway::open(dir.path().to_path_buf()).unwrap());
        Self {
            dir,
            gateway,
            registry: shared(BinRegistry::new()),
        }
    }

    pub fn remote(&self) -> Arc<dyn CollectionGateway> {
        self.gateway.clone()
    }

    pub fn admin(&self) -> BinAdmin {
        BinAdmin::new(self.remote(), self.registry.clone())
    }

    pub fn manager(&self) -> RouteLifecycleManager {
        let queue = FileMutationQueue::open(self.dir.path().to_path_buf()).unwrap();
        RouteLifecycleManager::new(self.remote(), self.registry.clone()).with_queue(Box::new(queue))
    }

    /// Reopen the queue file to see what was persisted
    pub fn queue(&self) -> FileMutationQueue {
        FileMutationQueue::open(self.dir.path().to_path_buf()).unwrap()
    }

    /// B-1 recyclable at 90%, B-2 general at 60%, B-3 organic at 40%
    pub fn seed_bins(&self) {
        let admin = self.admin();
        for (id, category, fill, capacity) in [
            ("B-1", WasteCategory::Recyclable, 90.0, 120.0),
            ("B-2", WasteCategory::General, 60.0, 240.0),
            ("B-3", WasteCategory::Organic, 40.0, 60.0),
        ] {
            let mut bin = Bin::new(id, format!("{} Main St", id), "North", category, capacity);
            bin.fill_level = fill;
            bin.weight = (capacity * fill / 100.0).round();
            if fill >= 85.0 {
                bin.status = BinStatus::Full;
            }
            admin.create(&bin).unwrap();
        }
    }

    pub fn bin(&self, bin_id: &str) -> Bin {
        binroute_store::lock(&self.registry)
            .unwrap()
            .get(bin_id)
            .cloned()
            .unwrap()
    }
}

pub fn draft(bins: &[&str]) -> RouteDraft {
    RouteDraft {
        name: "Morning North".to_string(),
        scheduled_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        scheduled_time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
        collector: Some("alex".to_string()),
        bin_ids: bins.iter().map(|b| b.to_string()).collect(),
    }
}

pub fn ready_checklist() -> Checklist {
    let mut checklist = Checklist::standard();
    checklist.check_all();
    checklist.complete(Utc::now()).unwrap();
    checklist
}

/// Create and start a three-stop route, returning its id
pub fn started_route(manager: &mut RouteLifecycleManager) -> String {
    let id = manager.create_route(&draft(&["B-1", "B-2", "B-3"])).unwrap().id.clone();
    manager.start_route(&id, &ready_checklist()).unwrap();
    id
}
