//! Route state transitions
//!
//! Each transition takes the current route by reference and returns the next
//! version. The input is never touched, so a caller can validate locally,
//! send the request, and only adopt the new state once the remote store agrees.

use chrono::{DateTime, Utc};

use binroute_types::{Error, Result};

use crate::model::{Checklist, Route, RouteStatus, StopStatus};
use crate::service::tracker;

/// Weight must be a finite, non-negative number of kg
pub fn validate_weight(weight: f64) -> Result<f64> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(weight)
    } else {
        Err(Error::validation("invalid weight"))
    }
}

/// Parse user input into a weight
pub fn parse_weight(input: &str) -> Result<f64> {
    let weight: f64 = input
        .trim()
        .parse()
        .map_err(|_| Error::validation("invalid weight"))?;
    validate_weight(weight)
}

/// Blank reasons are rejected; the reason itself is kept as given
pub fn validate_reason(reason: &str) -> Result<&str> {
    if reason.trim().is_empty() {
        Err(Error::validation("reason required"))
    } else {
        Ok(reason)
    }
}

fn require_in_progress(route: &Route) -> Result<()> {
    match route.status {
        RouteStatus::InProgress => Ok(()),
        RouteStatus::Scheduled => Err(Error::conflict("route has not been started")),
        RouteStatus::Completed => Err(Error::conflict("route is already completed")),
        RouteStatus::Cancelled => Err(Error::conflict("route is cancelled")),
    }
}

fn require_pending_stop(route: &Route, bin_id: &str) -> Result<()> {
    let stop = route
        .stop(bin_id)
        .ok_or_else(|| Error::not_found(format!("bin {} is not on route {}", bin_id, route.id)))?;
    match stop.status {
        StopStatus::Pending => Ok(()),
        StopStatus::Collected => Err(Error::conflict("bin already collected")),
        StopStatus::Skipped => Err(Error::conflict("bin already skipped")),
    }
}

/// scheduled -> in-progress, gated by a complete checklist
pub fn start_route(route: &Route, checklist: &Checklist, now: DateTime<Utc>) -> Result<Route> {
    if !checklist.is_complete() {
        return Err(Error::validation("checklist incomplete"));
    }
    if route.status != RouteStatus::Scheduled {
        return Err(Error::conflict("already in progress"));
    }
    let mut next = route.clone();
    next.status = RouteStatus::InProgress;
    next.started_at = Some(now);
    next.checklist = Some(checklist.clone());
    Ok(next)
}

/// pending -> collected for one stop
///
/// `fill_level` is the bin's level just before it is emptied.
pub fn collect_bin(
    route: &Route,
    bin_id: &str,
    actual_weight: f64,
    fill_level: f64,
    now: DateTime<Utc>,
) -> Result<Route> {
    let actual_weight = validate_weight(actual_weight)?;
    require_in_progress(route)?;
    require_pending_stop(route, bin_id)?;

    let mut next = route.clone();
    if let Some(stop) = next.stop_mut(bin_id) {
        stop.status = StopStatus::Collected;
        stop.actual_weight = Some(actual_weight);
        stop.fill_level_at_collection = Some(fill_level);
        stop.collected_at = Some(now);
    }
    Ok(next)
}

/// pending -> skipped for one stop; weight stays unset
pub fn skip_bin(
    route: &Route,
    bin_id: &str,
    reason: &str,
    fill_level: Option<f64>,
) -> Result<Route> {
    let reason = validate_reason(reason)?;
    require_in_progress(route)?;
    require_pending_stop(route, bin_id)?;

    let mut next = route.clone();
    if let Some(stop) = next.stop_mut(bin_id) {
        stop.status = StopStatus::Skipped;
        stop.notes = Some(reason.to_string());
        stop.fill_level_at_collection = fill_level;
    }
    Ok(next)
}

/// in-progress -> completed once no stop is pending
pub fn complete_route(route: &Route, now: DateTime<Utc>) -> Result<Route> {
    require_in_progress(route)?;
    if !tracker::pending_stops(route).is_empty() {
        return Err(Error::conflict("not all bins processed"));
    }
    let started_at = route
        .started_at
        .ok_or_else(|| Error::conflict("route has not been started"))?;
    let completed_at = now.max(started_at);

    let collected = tracker::collected_stops(route);
    let waste_collected: f64 = collected.iter().filter_map(|s| s.actual_weight).sum();
    let recyclable_waste: f64 = collected
        .iter()
        .filter(|s| s.category == crate::model::WasteCategory::Recyclable)
        .filter_map(|s| s.actual_weight)
        .sum();

    let mut next = route.clone();
    next.status = RouteStatus::Completed;
    next.completed_at = Some(completed_at);
    next.route_duration = Some((completed_at - started_at).num_minutes());
    next.waste_collected = Some(waste_collected);
    next.recyclable_waste = Some(recyclable_waste);
    Ok(next)
}

/// scheduled -> cancelled
pub fn cancel_route(route: &Route) -> Result<Route> {
    if !route.status.can_transition_to(RouteStatus::Cancelled) {
        return Err(Error::conflict("only scheduled routes can be cancelled"));
    }
    let mut next = route.clone();
    next.status = RouteStatus::Cancelled;
    Ok(next)
}
