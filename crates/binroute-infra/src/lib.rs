//! Infrastructure layer - file-backed implementations of the domain traits

pub mod bin_csv;
pub mod persistence;
pub mod route_plan;
