//! File-based saved report store

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use binroute_domain::model::SavedReport;
use binroute_domain::repository::ReportStore;
use binroute_types::{Error, ExportError, Result};

/// Keyed report snapshots (`route_report_<id>` -> report) in one JSON file,
/// plus a plain text copy of each report for sharing.
pub struct FileReportStore {
    store_dir: PathBuf,
    store_path: PathBuf,
    entries: RefCell<HashMap<String, SavedReport>>,
}

impl FileReportStore {
    /// Create or load a report store
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        let store_path = store_dir.join("reports.json");

        let entries = if store_path.exists() {
            let file = File::open(&store_path)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader).unwrap_or_else(|e| {
                warn!(path = %store_path.display(), error = %e, "report store unreadable, starting empty");
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        Ok(Self {
            store_dir,
            store_path,
            entries: RefCell::new(entries),
        })
    }

    /// Where the text copy of a route's report lives
    pub fn report_path(&self, route_id: &str) -> PathBuf {
        self.store_dir
            .join(format!("{}.csv", SavedReport::key_for(route_id)))
    }

    fn persist(&self) -> Result<()> {
        let file = File::create(&self.store_path).map_err(|e| write_error(&self.store_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &*self.entries.borrow())
            .map_err(|e| write_error(&self.store_path, e.into()))?;
        writer
            .flush()
            .map_err(|e| write_error(&self.store_path, e))?;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.entries.borrow().len()
    }
}

fn write_error(path: &Path, source: std::io::Error) -> Error {
    ExportError::Write {
        path: path.to_path_buf(),
        source,
    }
    .into()
}

impl ReportStore for FileReportStore {
    fn save(&self, report: &SavedReport) -> Result<()> {
        let previous = self
            .entries
            .borrow_mut()
            .insert(report.key(), report.clone());
        if let Err(e) = self.persist() {
            // keep memory in line with disk
            let mut entries = self.entries.borrow_mut();
            match previous {
                Some(prev) => entries.insert(report.key(), prev),
                None => entries.remove(&report.key()),
            };
            return Err(e);
        }
        Ok(())
    }

    fn load(&self, route_id: &str) -> Result<Option<SavedReport>> {
        Ok(self
            .entries
            .borrow()
            .get(&SavedReport::key_for(route_id))
            .cloned())
    }

    fn find_all(&self) -> Result<Vec<SavedReport>> {
        let mut reports: Vec<_> = self.entries.borrow().values().cloned().collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(reports)
    }

    fn write_text(&self, report: &SavedReport) -> Result<PathBuf> {
        let path = self.report_path(&report.route_id);
        fs::write(&path, &report.content).map_err(|e| write_error(&path, e))?;
        Ok(path)
    }
}
