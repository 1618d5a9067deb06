//! Domain services

pub mod daily_reset;
pub mod lifecycle;
pub mod report;
pub mod statistics;
pub mod tracker;

pub use daily_reset::{reset_updates, DailyReset, ResetDecision, ResetPhase};
pub use report::{format_duration, render_route_report, RouteReport};
pub use tracker::{collected_stops, pending_stops, skipped_stops, stop_counts, StopCounts};
