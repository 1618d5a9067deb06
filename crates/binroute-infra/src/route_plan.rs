//! Route plan loader from TOML
//!
//! ```toml
//! [[routes]]
//! name = "Morning North"
//! date = "2024-05-02"
//! time = "07:30"
//! collector = "alex"
//! bins = ["B-1", "B-2"]
//! ```

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use binroute_types::{ConfigError, Error, Result};

/// One route to be created
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlannedRoute {
    pub name: String,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub collector: Option<String>,
    pub bins: Vec<String>,
}

impl PlannedRoute {
    pub fn scheduled_time(&self) -> Result<NaiveTime> {
        parse_schedule_time(&self.time)
    }
}

#[derive(Debug, Deserialize)]
struct RoutePlanFile {
    #[serde(default)]
    routes: Vec<PlannedRoute>,
}

/// Accepts "07:30" or "07:30:00"
pub fn parse_schedule_time(input: &str) -> Result<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| Error::validation(format!("invalid time: {}", input)))
}

pub fn load_route_plan(path: &Path) -> Result<Vec<PlannedRoute>> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to read route plan {}: {}",
            path.display(),
            e
        )))
    })?;
    parse_route_plan(&content)
}

pub fn parse_route_plan(toml_content: &str) -> Result<Vec<PlannedRoute>> {
    let plan: RoutePlanFile = toml::from_str(toml_content).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to parse route plan TOML: {}",
            e
        )))
    })?;
    for route in &plan.routes {
        route.scheduled_time()?;
    }
    Ok(plan.routes)
}
