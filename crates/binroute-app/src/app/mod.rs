//! Use cases driven by the CLI

pub mod admin;
pub mod dashboard;
pub mod lifecycle_manager;
pub mod replay;
pub mod reset_scheduler;

pub use admin::{BinAdmin, ImportSummary};
pub use dashboard::{DashboardSnapshot, PendingBin};
pub use lifecycle_manager::{RouteDraft, RouteLifecycleManager};
pub use replay::{OfflineReplayer, ReplaySummary};
pub use reset_scheduler::{ResetPoller, ResetScheduler, TickOutcome};
