//! Bin (collection point) type definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use binroute_types::{Error, Result};

/// Fill level a bin is set to by the daily reset
pub const RESET_FILL_LEVEL: f64 = 85.0;

/// Fraction of capacity assumed to be loaded after the daily reset
pub const RESET_WEIGHT_RATIO: f64 = 0.85;

/// Waste category of a bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WasteCategory {
    General,
    Recyclable,
    Organic,
    Hazardous,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 4] = [
        WasteCategory::General,
        WasteCategory::Recyclable,
        WasteCategory::Organic,
        WasteCategory::Hazardous,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WasteCategory::General => "General",
            WasteCategory::Recyclable => "Recyclable",
            WasteCategory::Organic => "Organic",
            WasteCategory::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WasteCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WasteCategory::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("unknown waste category: {}", s)))
    }
}

/// Operational status of a bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinStatus {
    Active,
    Full,
    Maintenance,
    Inactive,
}

impl BinStatus {
    pub const ALL: [BinStatus; 4] = [
        BinStatus::Active,
        BinStatus::Full,
        BinStatus::Maintenance,
        BinStatus::Inactive,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BinStatus::Active => "active",
            BinStatus::Full => "full",
            BinStatus::Maintenance => "maintenance",
            BinStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for BinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BinStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BinStatus::ALL
            .into_iter()
            .find(|st| st.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("unknown bin status: {}", s)))
    }
}

/// A physical collection point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    /// Stable public identifier (e.g. "BIN-001")
    pub bin_id: String,
    pub location: String,
    pub zone: String,
    pub category: WasteCategory,
    /// Capacity in kg
    pub capacity: f64,
    /// Fill level in percent, 0..=100
    pub fill_level: f64,
    /// Current weight in kg
    pub weight: f64,
    pub status: BinStatus,
    #[serde(default)]
    pub last_collected: Option<DateTime<Utc>>,
}

impl Bin {
    pub fn new(
        bin_id: impl Into<String>,
        location: impl Into<String>,
        zone: impl Into<String>,
        category: WasteCategory,
        capacity: f64,
    ) -> Self {
        Self {
            bin_id: bin_id.into(),
            location: location.into(),
            zone: zone.into(),
            category,
            capacity,
            fill_level: 0.0,
            weight: 0.0,
            status: BinStatus::Active,
            last_collected: None,
        }
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<()> {
        if self.bin_id.trim().is_empty() {
            return Err(Error::validation("bin id required"));
        }
        if !self.fill_level.is_finite() || !(0.0..=100.0).contains(&self.fill_level) {
            return Err(Error::validation(format!(
                "fill level out of range for {}: {}",
                self.bin_id, self.fill_level
            )));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(Error::validation(format!(
                "invalid weight for {}: {}",
                self.bin_id, self.weight
            )));
        }
        if !self.capacity.is_finite() || self.capacity < 0.0 {
            return Err(Error::validation(format!(
                "invalid capacity for {}: {}",
                self.bin_id, self.capacity
            )));
        }
        Ok(())
    }

    /// Empty the bin after a collection
    pub fn mark_collected(&mut self, at: DateTime<Utc>) {
        self.fill_level = 0.0;
        self.weight = 0.0;
        self.status = BinStatus::Active;
        self.last_collected = Some(at);
    }

    /// The patch the daily reset applies to this bin
    pub fn needs_collection_patch(&self) -> BinPatch {
        BinPatch {
            fill_level: Some(RESET_FILL_LEVEL),
            weight: Some((self.capacity * RESET_WEIGHT_RATIO).round()),
            status: Some(BinStatus::Full),
            ..Default::default()
        }
    }
}

/// Partial update of a bin; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<WasteCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BinStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_collected: Option<DateTime<Utc>>,
}

impl BinPatch {
    pub fn is_empty(&self) -> bool {
        *self == BinPatch::default()
    }

    /// Apply onto a copy of `bin`, validating the result
    pub fn applied_to(&self, bin: &Bin) -> Result<Bin> {
        let mut next = bin.clone();
        if let Some(ref location) = self.location {
            next.location = location.clone();
        }
        if let Some(ref zone) = self.zone {
            next.zone = zone.clone();
        }
        if let Some(category) = self.category {
            next.category = category;
        }
        if let Some(capacity) = self.capacity {
            next.capacity = capacity;
        }
        if let Some(fill_level) = self.fill_level {
            next.fill_level = fill_level;
        }
        if let Some(weight) = self.weight {
            next.weight = weight;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if self.last_collected.is_some() {
            next.last_collected = self.last_collected;
        }
        next.validate()?;
        Ok(next)
    }
}

/// One entry of a bulk update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinUpdate {
    pub bin_id: String,
    pub patch: BinPatch,
}

/// Query filter for bins; empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinFilter {
    #[serde(default)]
    pub status: Option<BinStatus>,
    #[serde(default)]
    pub category: Option<WasteCategory>,
    #[serde(default)]
    pub zone: Option<String>,
}

impl BinFilter {
    pub fn matches(&self, bin: &Bin) -> bool {
        self.status.map_or(true, |s| bin.status == s)
            && self.category.map_or(true, |c| bin.category == c)
            && self
                .zone
                .as_deref()
                .map_or(true, |z| bin.zone.eq_ignore_ascii_case(z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bin() -> Bin {
        Bin::new("BIN-001", "Main St 12", "North", WasteCategory::Recyclable, 120.0)
    }

    #[test]
    fn test_new_bin_is_valid_and_empty() {
        let bin = sample_bin();
        assert!(bin.validate().is_ok());
        assert_eq!(bin.fill_level, 0.0);
        assert_eq!(bin.status, BinStatus::Active);
    }

    #[test]
    fn test_validate_rejects_fill_out_of_range() {
        let mut bin = sample_bin();
        bin.fill_level = 101.0;
        assert!(matches!(bin.validate(), Err(Error::Validation(_))));
        bin.fill_level = -1.0;
        assert!(bin.validate().is_err());
        bin.fill_level = f64::NAN;
        assert!(bin.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut bin = sample_bin();
        bin.weight = -0.5;
        assert!(matches!(bin.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_mark_collected_clears_bin() {
        let mut bin = sample_bin();
        bin.fill_level = 90.0;
        bin.weight = 100.0;
        bin.status = BinStatus::Full;
        let now = Utc::now();
        bin.mark_collected(now);
        assert_eq!(bin.fill_level, 0.0);
        assert_eq!(bin.weight, 0.0);
        assert_eq!(bin.status, BinStatus::Active);
        assert_eq!(bin.last_collected, Some(now));
    }

    #[test]
    fn test_needs_collection_patch_rounds_weight() {
        let mut bin = sample_bin();
        bin.capacity = 75.0;
        let patched = bin.needs_collection_patch().applied_to(&bin).unwrap();
        assert_eq!(patched.fill_level, 85.0);
        assert_eq!(patched.status, BinStatus::Full);
        // 75 * 0.85 = 63.75
        assert_eq!(patched.weight, 64.0);
    }

    #[test]
    fn test_patch_rejects_invalid_result() {
        let bin = sample_bin();
        let patch = BinPatch {
            fill_level: Some(150.0),
            ..Default::default()
        };
        assert!(patch.applied_to(&bin).is_err());
    }

    #[test]
    fn test_filter_matches() {
        let bin = sample_bin();
        assert!(BinFilter::default().matches(&bin));
        let by_cat = BinFilter {
            category: Some(WasteCategory::Recyclable),
            ..Default::default()
        };
        assert!(by_cat.matches(&bin));
        let by_status = BinFilter {
            status: Some(BinStatus::Full),
            ..Default::default()
        };
        assert!(!by_status.matches(&bin));
        let by_zone = BinFilter {
            zone: Some("north".to_string()),
            ..Default::default()
        };
        assert!(by_zone.matches(&bin));
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("recyclable".parse::<WasteCategory>().unwrap(), WasteCategory::Recyclable);
        assert_eq!("Maintenance".parse::<BinStatus>().unwrap(), BinStatus::Maintenance);
        assert!("plastic".parse::<WasteCategory>().is_err());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(sample_bin()).unwrap();
        assert_eq!(json["binId"], "BIN-001");
        assert_eq!(json["status"], "active");
        assert_eq!(json["category"], "Recyclable");
    }
}
