//! Persistence implementations
//!
//! File-based implementations of the gateway and repository traits.

mod file_mutation_queue;
mod file_report_store;
mod json_file_gateway;
mod reset_marker;

pub use file_mutation_queue::FileMutationQueue;
pub use file_report_store::FileReportStore;
pub use json_file_gateway::JsonFileGateway;
pub use reset_marker::FileResetMarker;
