//! Excel export of a route report

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use binroute_domain::service::RouteReport;
use binroute_types::{ExportError, Result};

fn render_error(e: XlsxError) -> ExportError {
    ExportError::Render(e.to_string())
}

/// Export a route report to an Excel workbook (Summary + Stops sheets)
pub fn export_to_excel(report: &RouteReport, output_path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    let summary_sheet = workbook.add_worksheet();
    write_summary_sheet(summary_sheet, report)?;

    let stops_sheet = workbook.add_worksheet();
    write_stops_sheet(stops_sheet, report)?;

    workbook.save(output_path).map_err(render_error)?;

    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, report: &RouteReport) -> Result<()> {
    sheet.set_name("Summary").map_err(render_error)?;

    let header_format = Format::new().set_bold();

    sheet
        .write_string_with_format(0, 0, "Route Collection Report", &header_format)
        .map_err(render_error)?;

    let mut row = 2;
    for (label, value) in report.header_block() {
        sheet.write_string(row, 0, label).map_err(render_error)?;
        sheet.write_string(row, 1, &value).map_err(render_error)?;
        row += 1;
    }

    row += 1;
    sheet
        .write_string_with_format(row, 0, "Statistics", &header_format)
        .map_err(render_error)?;
    row += 1;

    let figures = [
        report.total_bins as f64,
        report.collected_bins as f64,
        report.skipped_bins as f64,
        report.total_waste,
        report.recyclable_waste,
    ];
    for ((label, _), value) in report.statistics_block().into_iter().zip(figures) {
        sheet.write_string(row, 0, label).map_err(render_error)?;
        sheet.write_number(row, 1, value).map_err(render_error)?;
        row += 1;
    }

    sheet.set_column_width(0, 24).map_err(render_error)?;
    sheet.set_column_width(1, 28).map_err(render_error)?;

    Ok(())
}

fn write_stops_sheet(sheet: &mut Worksheet, report: &RouteReport) -> Result<()> {
    sheet.set_name("Stops").map_err(render_error)?;

    let header_format = Format::new().set_bold();

    for (col, header) in RouteReport::ROW_HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(render_error)?;
    }

    for (idx, row) in report.rows.iter().enumerate() {
        let line = idx as u32 + 1;
        let fields = RouteReport::row_fields(row);
        for (col, field) in fields.iter().enumerate() {
            let col = col as u16;
            // numeric cells where a value exists so the sheet can be summed
            let written = match (col, row.fill_level, row.weight) {
                (3, Some(fill), _) => sheet.write_number(line, col, fill),
                (4, _, Some(weight)) => sheet.write_number(line, col, weight),
                _ => sheet.write_string(line, col, field),
            };
            written.map_err(render_error)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use binroute_domain::model::{BinStop, Route, RouteStatus, StopStatus, WasteCategory};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;

    fn completed_route() -> Route {
        let start = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 9, 50, 0).unwrap();
        Route {
            id: "r1".to_string(),
            name: "North".to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            collector: Some("alex".to_string()),
            stops: vec![BinStop {
                bin_id: "B-1".to_string(),
                order: 1,
                location: "Elm St".to_string(),
                category: WasteCategory::Recyclable,
                status: StopStatus::Collected,
                expected_weight: 40.0,
                actual_weight: Some(30.0),
                fill_level_at_collection: Some(90.0),
                collected_at: Some(end),
                notes: None,
            }],
            status: RouteStatus::Completed,
            checklist: None,
            started_at: Some(start),
            completed_at: Some(end),
            waste_collected: Some(30.0),
            recyclable_waste: Some(30.0),
            route_duration: Some(110),
        }
    }

    #[test]
    fn test_export_to_excel_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        let report = RouteReport::from_route(&completed_route());
        export_to_excel(&report, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
