//! Collection route domain: bins, routes, checklists, and the pure services
//! that move them through their lifecycle.

pub mod model;
pub mod repository;
pub mod service;
