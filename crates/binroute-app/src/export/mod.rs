//! Report export: persist, then share or fall back to inline display

pub mod excel;
pub mod report_exporter;

pub use excel::export_to_excel;
pub use report_exporter::{DirectoryShare, ExportOutcome, NoShare, ReportExporter, ShareTarget};
