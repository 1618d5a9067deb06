//! Route report export with share fallback
//!
//! The report is always saved under `route_report_<id>` before anything is
//! shared, so it survives a failed or unavailable share target.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use binroute_domain::model::{Route, RouteStatus, SavedReport};
use binroute_domain::repository::ReportStore;
use binroute_domain::service::render_route_report;
use binroute_types::{Error, ExportError, Result};

/// Somewhere a written report file can be handed to
pub trait ShareTarget {
    fn is_available(&self) -> bool;

    /// Share the file and return where it ended up
    fn share(&self, path: &Path, title: &str) -> Result<PathBuf>;
}

/// Copies reports into a directory (a synced folder, a mounted drive)
pub struct DirectoryShare {
    dir: PathBuf,
}

impl DirectoryShare {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl ShareTarget for DirectoryShare {
    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }

    fn share(&self, path: &Path, _title: &str) -> Result<PathBuf> {
        let file_name = path
            .file_name()
            .ok_or_else(|| ExportError::ShareUnavailable(format!("{} has no file name", path.display())))?;
        let target = self.dir.join(file_name);
        fs::copy(path, &target).map_err(|source| ExportError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

/// No share facility configured
pub struct NoShare;

impl ShareTarget for NoShare {
    fn is_available(&self) -> bool {
        false
    }

    fn share(&self, _path: &Path, _title: &str) -> Result<PathBuf> {
        Err(ExportError::ShareUnavailable("no share target configured".to_string()).into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Shared { path: PathBuf },
    /// Sharing was unavailable or failed; show the text instead
    Inline { content: String, saved_path: PathBuf },
}

pub struct ReportExporter<'a, S: ReportStore> {
    store: &'a S,
    share: &'a dyn ShareTarget,
}

impl<'a, S: ReportStore> ReportExporter<'a, S> {
    pub fn new(store: &'a S, share: &'a dyn ShareTarget) -> Self {
        Self { store, share }
    }

    /// Render, save, then share a completed route's report
    pub fn export(&self, route: &Route) -> Result<ExportOutcome> {
        if route.status != RouteStatus::Completed {
            return Err(Error::conflict(format!(
                "route {} is not completed",
                route.id
            )));
        }

        let report = SavedReport {
            route_id: route.id.clone(),
            route_name: route.name.clone(),
            generated_at: Utc::now(),
            content: render_route_report(route)?,
        };
        self.store.save(&report)?;
        let saved_path = self.store.write_text(&report)?;
        info!(route_id = %route.id, path = %saved_path.display(), "report saved");

        if !self.share.is_available() {
            info!("share target unavailable, showing report inline");
            return Ok(ExportOutcome::Inline {
                content: report.content,
                saved_path,
            });
        }

        let title = format!("Route Report - {}", route.name);
        match self.share.share(&saved_path, &title) {
            Ok(path) => {
                info!(path = %path.display(), "report shared");
                Ok(ExportOutcome::Shared { path })
            }
            Err(e) => {
                warn!(error = %e, "share failed, showing report inline");
                Ok(ExportOutcome::Inline {
                    content: report.content,
                    saved_path,
                })
            }
        }
    }

    /// Previously saved report for a route, if any
    pub fn load_saved_report(&self, route_id: &str) -> Result<Option<SavedReport>> {
        self.store.load(route_id)
    }
}
