//! Repository adapters for persistence layer

use std::path::PathBuf;

use binroute_infra::persistence::{
    FileMutationQueue, FileReportStore, FileResetMarker, JsonFileGateway,
};
use binroute_types::Result;

use crate::config::Config;

/// Open the file-backed remote document
pub fn open_gateway(config: &Config) -> Result<JsonFileGateway> {
    JsonFileGateway::open(config.data_dir()?)
}

/// Open saved report store
pub fn open_report_store(config: &Config) -> Result<FileReportStore> {
    FileReportStore::open(config.reports_dir()?)
}

/// Open offline mutation queue
pub fn open_mutation_queue(config: &Config) -> Result<FileMutationQueue> {
    FileMutationQueue::open(config.data_dir()?)
}

/// Open reset marker
pub fn open_reset_marker(config: &Config) -> Result<FileResetMarker> {
    Ok(FileResetMarker::new(config.data_dir()?))
}

/// Open saved report store at a custom directory
pub fn open_report_store_at(store_dir: PathBuf) -> Result<FileReportStore> {
    FileReportStore::open(store_dir)
}
