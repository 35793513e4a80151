//! Logging infrastructure for countersign
//!
//! Tracing handles operational logs; the audit module keeps the durable
//! signing trail.

pub mod audit;

pub use audit::{AuditEventType, AuditLogger, AuditRecord};
