//! HTTP routes for countersign

pub mod health;
pub mod status;

pub use health::{health_check, readiness_check, version_info};
pub use status::status_check;
