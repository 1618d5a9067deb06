//! Domain model types

pub mod bin;
pub mod checklist;
pub mod report;
pub mod route;
pub mod sync;

pub use bin::{Bin, BinFilter, BinPatch, BinStatus, BinUpdate, WasteCategory};
pub use checklist::{Checklist, ChecklistItem};
pub use report::SavedReport;
pub use route::{BinStop, Route, RouteStatistics, RouteStatus, StopStatus};
pub use sync::{MutationKind, PendingMutation};
