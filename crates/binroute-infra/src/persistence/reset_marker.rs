//! Persisted date of the last successful daily reset

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use binroute_types::{ConfigError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct FileResetMarker {
    path: PathBuf,
}

impl FileResetMarker {
    pub fn new(store_dir: PathBuf) -> Self {
        Self {
            path: store_dir.join("last_reset"),
        }
    }

    pub fn load(&self) -> Result<Option<NaiveDate>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let date = NaiveDate::parse_from_str(content.trim(), DATE_FORMAT).map_err(|e| {
            ConfigError::ParseError(format!("reset marker {}: {}", self.path.display(), e))
        })?;
        Ok(Some(date))
    }

    pub fn save(&self, date: NaiveDate) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, date.format(DATE_FORMAT).to_string())?;
        Ok(())
    }
}
