//! Route completion report

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use binroute_types::{ExportError, Result};

use crate::model::{Route, StopStatus, WasteCategory};
use crate::service::tracker;

const NOT_AVAILABLE: &str = "N/A";

/// "2h 25m" from an hour up, "45 min" below
pub fn format_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

/// Weight/percent figure with at most two decimals and no trailing zeros
pub fn format_quantity(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{}", rounded)
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn or_na(value: Option<f64>, suffix: &str) -> String {
    value
        .map(|v| format!("{}{}", format_quantity(v), suffix))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub bin_id: String,
    pub location: String,
    pub status: StopStatus,
    pub fill_level: Option<f64>,
    pub weight: Option<f64>,
    pub collected_at: Option<DateTime<Utc>>,
    pub notes: String,
}

/// Structured form of a route report; rendered as CSV text or a workbook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteReport {
    pub route_id: String,
    pub route_name: String,
    pub collector: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub total_bins: usize,
    pub collected_bins: usize,
    pub skipped_bins: usize,
    pub total_waste: f64,
    pub recyclable_waste: f64,
    pub rows: Vec<ReportRow>,
}

impl RouteReport {
    pub fn from_route(route: &Route) -> Self {
        let counts = tracker::stop_counts(route);
        let collected = tracker::collected_stops(route);
        let total_waste = route
            .waste_collected
            .unwrap_or_else(|| collected.iter().filter_map(|s| s.actual_weight).sum());
        let recyclable_waste = route.recyclable_waste.unwrap_or_else(|| {
            collected
                .iter()
                .filter(|s| s.category == WasteCategory::Recyclable)
                .filter_map(|s| s.actual_weight)
                .sum()
        });

        let rows = route
            .ordered_stops()
            .into_iter()
            .map(|stop| ReportRow {
                bin_id: stop.bin_id.clone(),
                location: stop.location.clone(),
                status: stop.status,
                fill_level: stop.fill_level_at_collection,
                weight: stop.actual_weight,
                collected_at: stop.collected_at,
                notes: stop.notes.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            route_id: route.id.clone(),
            route_name: route.name.clone(),
            collector: route.collector_label().to_string(),
            started_at: route.started_at,
            completed_at: route.completed_at,
            duration_minutes: route.route_duration,
            total_bins: counts.total_bins,
            collected_bins: counts.collected_bins,
            skipped_bins: counts.skipped_bins,
            total_waste,
            recyclable_waste,
            rows,
        }
    }

    pub fn duration_label(&self) -> String {
        self.duration_minutes
            .map(format_duration)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn header_block(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Route Name", self.route_name.clone()),
            ("Collector", self.collector.clone()),
            ("Start Time", format_timestamp(self.started_at)),
            ("End Time", format_timestamp(self.completed_at)),
            ("Total Duration", self.duration_label()),
        ]
    }

    pub fn statistics_block(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total Bins", self.total_bins.to_string()),
            ("Collected Bins", self.collected_bins.to_string()),
            ("Skipped Bins", self.skipped_bins.to_string()),
            ("Total Waste Collected", format_quantity(self.total_waste)),
            ("Recyclable Waste", format_quantity(self.recyclable_waste)),
        ]
    }

    pub const ROW_HEADERS: [&'static str; 7] = [
        "Bin ID",
        "Location",
        "Status",
        "Fill Level",
        "Weight (kg)",
        "Collection Time",
        "Notes",
    ];

    pub fn row_fields(row: &ReportRow) -> [String; 7] {
        [
            row.bin_id.clone(),
            row.location.clone(),
            row.status.to_string(),
            or_na(row.fill_level, "%"),
            or_na(row.weight, ""),
            format_timestamp(row.collected_at),
            row.notes.clone(),
        ]
    }

    /// Tabular text: header block, statistics block, then one row per stop.
    /// Fields containing commas, quotes, or newlines are quoted.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        writer.write_record(["Route Collection Report"])?;
        for (label, value) in self.header_block() {
            writer.write_record([label, value.as_str()])?;
        }
        writer.write_record([""])?;
        writer.write_record(["Statistics"])?;
        for (label, value) in self.statistics_block() {
            writer.write_record([label, value.as_str()])?;
        }
        writer.write_record([""])?;
        writer.write_record(Self::ROW_HEADERS)?;
        for row in &self.rows {
            writer.write_record(Self::row_fields(row))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Render(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| ExportError::Render(e.to_string()))?;
        Ok(text)
    }
}

/// Render a route into report text
pub fn render_route_report(route: &Route) -> Result<String> {
    RouteReport::from_route(route).to_csv()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinStop, Checklist, RouteStatus};
    use crate::service::lifecycle;
    use chrono::{Duration, NaiveDate, NaiveTime};

    fn stop(bin_id: &str, order: u32, location: &str) -> BinStop {
        BinStop {
            bin_id: bin_id.to_string(),
            order,
            location: location.to_string(),
            category: WasteCategory::General,
            status: StopStatus::Pending,
            expected_weight: 50.0,
            actual_weight: None,
            fill_level_at_collection: None,
            collected_at: None,
            notes: None,
        }
    }

    fn completed_route() -> Route {
        let route = Route {
            id: "r1".to_string(),
            name: "Harbor loop".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            collector: Some("sam".to_string()),
            stops: vec![
                stop("bin1", 1, "Dock 1"),
                stop("bin2", 2, "Dock 2"),
                stop("bin3", 3, "Pier \"B\", gate 4"),
            ],
            status: RouteStatus::Scheduled,
            checklist: None,
            started_at: None,
            completed_at: None,
            waste_collected: None,
            recyclable_waste: None,
            route_duration: None,
        };
        let mut checklist = Checklist::standard();
        checklist.check_all();
        let start = Utc::now();
        checklist.complete(start).unwrap();
        let route = lifecycle::start_route(&route, &checklist, start).unwrap();
        let route = lifecycle::collect_bin(&route, "bin1", 52.0, 90.0, start).unwrap();
        let route = lifecycle::collect_bin(&route, "bin2", 58.0, 75.0, start).unwrap();
        let route = lifecycle::skip_bin(&route, "bin3", "Access blocked, gate \"locked\"", None).unwrap();
        lifecycle::complete_route(&route, start + Duration::minutes(145)).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(145), "2h 25m");
        assert_eq!(format_duration(45), "45 min");
        assert_eq!(format_duration(0), "0 min");
        assert_eq!(format_duration(60), "1h 0m");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(110.0), "110");
        assert_eq!(format_quantity(52.25), "52.25");
        assert_eq!(format_quantity(0.1 + 0.2), "0.3");
    }

    #[test]
    fn test_report_totals_and_skip_reason() {
        let report = RouteReport::from_route(&completed_route());
        assert_eq!(report.total_bins, 3);
        assert_eq!(report.collected_bins, 2);
        assert_eq!(report.skipped_bins, 1);
        assert_eq!(report.total_waste, 110.0);
        assert_eq!(report.duration_label(), "2h 25m");

        let text = report.to_csv().unwrap();
        assert!(text.contains("Total Waste Collected,110\n"));
        assert!(text.contains("Total Duration,2h 25m\n"));

        // read the bin rows back and compare the skip reason verbatim
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        let skipped = rows.iter().find(|r| r.get(0) == Some("bin3")).unwrap();
        assert_eq!(skipped.get(1), Some("Pier \"B\", gate 4"));
        assert_eq!(skipped.get(2), Some("skipped"));
        assert_eq!(skipped.get(3), Some("N/A"));
        assert_eq!(skipped.get(4), Some("N/A"));
        assert_eq!(skipped.get(5), Some("N/A"));
        assert_eq!(skipped.get(6), Some("Access blocked, gate \"locked\""));

        let collected = rows.iter().find(|r| r.get(0) == Some("bin1")).unwrap();
        assert_eq!(collected.get(3), Some("90%"));
        assert_eq!(collected.get(4), Some("52"));
    }

    #[test]
    fn test_report_for_unstarted_route() {
        let mut route = completed_route();
        route.status = RouteStatus::Scheduled;
        route.started_at = None;
        route.completed_at = None;
        route.route_duration = None;
        let text = render_route_report(&route).unwrap();
        assert!(text.contains("Start Time,N/A"));
        assert!(text.contains("Total Duration,N/A"));
    }
}
