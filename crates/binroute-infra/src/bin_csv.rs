//! CSV loader for registering bins in bulk
//!
//! Expected header:
//! bin_id, location, zone, category, capacity, [fill_level], [status]

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use binroute_domain::model::{Bin, BinStatus, WasteCategory};
use binroute_types::{Error, Result};

#[derive(Debug, Deserialize)]
struct BinRow {
    bin_id: String,
    location: String,
    zone: String,
    category: String,
    capacity: f64,
    #[serde(default)]
    fill_level: Option<f64>,
    #[serde(default)]
    status: Option<String>,
}

impl BinRow {
    fn into_bin(self, line: usize) -> Result<Bin> {
        let category: WasteCategory = self
            .category
            .parse()
            .map_err(|e| Error::validation(format!("line {}: {}", line, e)))?;
        let mut bin = Bin::new(self.bin_id.trim(), self.location, self.zone, category, self.capacity);
        if let Some(fill) = self.fill_level {
            bin.fill_level = fill;
        }
        if let Some(status) = self.status.filter(|s| !s.trim().is_empty()) {
            bin.status = status
                .parse::<BinStatus>()
                .map_err(|e| Error::validation(format!("line {}: {}", line, e)))?;
        }
        bin.validate()
            .map_err(|e| Error::validation(format!("line {}: {}", line, e)))?;
        Ok(bin)
    }
}

pub fn load_bins_from_csv(path: &Path) -> Result<Vec<Bin>> {
    let file = std::fs::File::open(path)?;
    read_bins(file)
}

pub fn read_bins<R: Read>(reader: R) -> Result<Vec<Bin>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut bins = Vec::new();
    for (idx, row) in reader.deserialize::<BinRow>().enumerate() {
        // header is line 1
        bins.push(row?.into_bin(idx + 2)?);
    }
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bins() {
        let data = "bin_id,location,zone,category,capacity,fill_level,status\n\
                    B-1,\"Elm St, corner\",North,recyclable,120,40,\n\
                    B-2,Oak Ave,South,General,240,,full\n";
        let bins = read_bins(data.as_bytes()).unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].location, "Elm St, corner");
        assert_eq!(bins[0].category, WasteCategory::Recyclable);
        assert_eq!(bins[0].fill_level, 40.0);
        assert_eq!(bins[1].status, BinStatus::Full);
        assert_eq!(bins[1].fill_level, 0.0);
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let data = "bin_id,location,zone,category,capacity\nB-9,Pier,Harbor,Organic,60\n";
        let bins = read_bins(data.as_bytes()).unwrap();
        assert_eq!(bins[0].status, BinStatus::Active);
    }

    #[test]
    fn test_bad_category_reports_line() {
        let data = "bin_id,location,zone,category,capacity\nB-1,Elm,North,glass,10\n";
        let err = read_bins(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_out_of_range_fill_rejected() {
        let data = "bin_id,location,zone,category,capacity,fill_level\nB-1,Elm,North,General,10,180\n";
        assert!(matches!(read_bins(data.as_bytes()), Err(Error::Validation(_))));
    }
}
