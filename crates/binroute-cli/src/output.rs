//! Output formatting module

use serde::Serialize;

use binroute_app::app::{DashboardSnapshot, ReplaySummary};
use binroute_domain::model::{Bin, BinStop, Route, SavedReport};
use binroute_domain::service::statistics::{percentage, route_progress, Priority};
use binroute_domain::service::{format_duration, stop_counts};
use binroute_types::{OutputFormat, Result};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

pub fn output_bins(output_format: OutputFormat, bins: &[Bin]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(bins);
    }

    println!("Bins");
    println!("====");
    if bins.is_empty() {
        println!("No bins found.");
        return Ok(());
    }

    println!(
        "{:<10} {:<28} {:<10} {:<11} {:>6} {:>8} {:>9} {:<12}",
        "ID", "Location", "Zone", "Category", "Fill", "Weight", "Capacity", "Status"
    );
    println!("{}", "-".repeat(100));
    for bin in bins {
        println!(
            "{:<10} {:<28} {:<10} {:<11} {:>5.0}% {:>8.1} {:>9.1} {:<12}",
            truncate(&bin.bin_id, 10),
            truncate(&bin.location, 28),
            truncate(&bin.zone, 10),
            bin.category.label(),
            bin.fill_level,
            bin.weight,
            bin.capacity,
            bin.status.label(),
        );
    }
    println!();
    println!("Total: {}", bins.len());
    Ok(())
}

pub fn output_bin(output_format: OutputFormat, bin: &Bin) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(bin);
    }
    println!("Bin {}", bin.bin_id);
    println!("  Location:  {}", bin.location);
    println!("  Zone:      {}", bin.zone);
    println!("  Category:  {}", bin.category);
    println!("  Fill:      {:.0}%", bin.fill_level);
    println!("  Weight:    {:.1} kg / {:.1} kg", bin.weight, bin.capacity);
    println!("  Status:    {}", bin.status);
    if let Some(at) = bin.last_collected {
        println!("  Collected: {}", at.format("%Y-%m-%d %H:%M"));
    }
    Ok(())
}

pub fn output_routes(output_format: OutputFormat, routes: &[&Route]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(routes);
    }

    println!("Routes");
    println!("======");
    if routes.is_empty() {
        println!("No routes found.");
        return Ok(());
    }

    println!(
        "{:<36} {:<20} {:<16} {:<12} {:<12} {:>6} {:>9}",
        "ID", "Name", "Scheduled", "Collector", "Status", "Bins", "Progress"
    );
    println!("{}", "-".repeat(117));
    for route in routes {
        let counts = stop_counts(route);
        println!(
            "{:<36} {:<20} {:<16} {:<12} {:<12} {:>6} {:>8}%",
            route.id,
            truncate(&route.name, 20),
            format!(
                "{} {}",
                route.scheduled_date.format("%Y-%m-%d"),
                route.scheduled_time.format("%H:%M")
            ),
            truncate(route.collector_label(), 12),
            route.status.label(),
            counts.total_bins,
            route_progress(route),
        );
    }
    Ok(())
}

pub fn output_route(output_format: OutputFormat, route: &Route) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(route);
    }

    let counts = stop_counts(route);
    println!("\nRoute: {}", route.name);
    println!("{}", "=".repeat(route.name.chars().count() + 7));
    println!("ID:         {}", route.id);
    println!(
        "Scheduled:  {} {}",
        route.scheduled_date.format("%Y-%m-%d"),
        route.scheduled_time.format("%H:%M")
    );
    println!("Collector:  {}", route.collector_label());
    println!("Status:     {}", route.status);
    if let Some(at) = route.started_at {
        println!("Started:    {}", at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(at) = route.completed_at {
        println!("Completed:  {}", at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(minutes) = route.route_duration {
        println!("Duration:   {}", format_duration(minutes));
    }
    println!(
        "Progress:   {}/{} collected, {} skipped ({}%)",
        counts.collected_bins,
        counts.total_bins,
        counts.skipped_bins,
        route_progress(route)
    );
    if let Some(waste) = route.waste_collected {
        println!(
            "Waste:      {:.1} kg ({:.1} kg recyclable)",
            waste,
            route.recyclable_waste.unwrap_or_default()
        );
    }

    println!();
    println!(
        "{:>3} {:<10} {:<28} {:<11} {:<10} {:>9} {:>9}  {}",
        "#", "Bin", "Location", "Category", "Status", "Expected", "Actual", "Notes"
    );
    println!("{}", "-".repeat(100));
    for stop in route.ordered_stops() {
        println!(
            "{:>3} {:<10} {:<28} {:<11} {:<10} {:>9.1} {:>9}  {}",
            stop.order,
            truncate(&stop.bin_id, 10),
            truncate(&stop.location, 28),
            stop.category.label(),
            stop.status.label(),
            stop.expected_weight,
            stop.actual_weight
                .map(|w| format!("{:.1}", w))
                .unwrap_or_else(|| "-".to_string()),
            stop.notes.as_deref().unwrap_or(""),
        );
    }
    Ok(())
}

/// Table only; JSON output carries the stops on the route itself
pub fn output_next_stops(output_format: OutputFormat, stops: &[(BinStop, Priority)]) -> Result<()> {
    if output_format == OutputFormat::Json || stops.is_empty() {
        return Ok(());
    }
    println!("\n--- Next Stops ---");
    for (stop, priority) in stops {
        println!(
            "  [{:<6}] {:<10} {}",
            priority.label(),
            truncate(&stop.bin_id, 10),
            truncate(&stop.location, 28)
        );
    }
    Ok(())
}

pub fn output_dashboard(output_format: OutputFormat, snapshot: &DashboardSnapshot) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(snapshot);
    }

    println!("\nCollection Dashboard");
    println!("====================");
    println!("Bins:        {}", snapshot.bins.total);
    for (status, count) in &snapshot.bins.by_status {
        println!("  {:<12} {}", status.label(), count);
    }
    println!();
    println!(
        "Completed:   {}   Pending: {}   Issues: {}",
        snapshot.completion.completed, snapshot.completion.pending, snapshot.completion.issue
    );
    println!("Efficiency:  {}%", snapshot.efficiency);
    println!("ETA:         {}", snapshot.eta);

    if let Some(routes) = &snapshot.routes {
        println!();
        println!(
            "Routes:      {} total, {} scheduled, {} in progress, {} completed, {} cancelled",
            routes.total_routes, routes.scheduled, routes.in_progress, routes.completed, routes.cancelled
        );
        println!(
            "Collected:   {:.1} kg ({:.1} kg recyclable)",
            routes.total_waste_collected, routes.total_recyclable_waste
        );
    }

    println!("\n--- Environmental Impact ---");
    println!("Recycled:    {:.1} kg", snapshot.impact.recycled);
    println!("CO2 saved:   {:.0} kg", snapshot.impact.co2_saved);
    println!("Trees:       {:.0}", snapshot.impact.trees_saved);

    println!("\n--- By Category ---");
    for entry in &snapshot.by_category {
        println!(
            "  {:<12} {:>3} bins {:>9.1} kg",
            entry.category.label(),
            entry.count,
            entry.capacity
        );
    }

    println!("\n--- Pending Bins ---");
    if snapshot.pending.is_empty() {
        println!("Nothing to collect.");
    }
    for bin in &snapshot.pending {
        println!(
            "  [{:<6}] {:<10} {:<28} {:>4.0}%",
            bin.priority.label(),
            truncate(&bin.bin_id, 10),
            truncate(&bin.location, 28),
            bin.fill_level
        );
    }
    Ok(())
}

pub fn output_saved_reports(output_format: OutputFormat, reports: &[SavedReport]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(reports);
    }
    println!("Saved Reports");
    println!("=============");
    if reports.is_empty() {
        println!("No reports saved.");
        return Ok(());
    }
    for report in reports {
        println!(
            "{:<36} {:<24} {}",
            report.route_id,
            truncate(&report.route_name, 24),
            report.generated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub fn output_replay(output_format: OutputFormat, summary: &ReplaySummary) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "applied": summary.applied,
            "dropped": summary.dropped,
            "remaining": summary.remaining,
        }));
    }
    let total = summary.applied + summary.dropped + summary.remaining;
    println!(
        "Replayed {} of {} queued writes ({}%)",
        summary.applied + summary.dropped,
        total,
        percentage(summary.applied + summary.dropped, total)
    );
    if summary.dropped > 0 {
        println!("  {} rejected by the remote and dropped", summary.dropped);
    }
    if summary.remaining > 0 {
        println!("  {} still queued (remote unreachable)", summary.remaining);
    }
    Ok(())
}
