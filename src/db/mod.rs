//! Database layer for countersign
//!
//! Provides:
//! - Typed MongoDB collection wrapper with automatic index creation
//! - Document schemas for drafts, dashboard links, and access codes

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
