//! Countersign - attorney signing flows for lasting power of attorney
//! documents
//!
//! Countersign lets attorneys, replacement attorneys and trust corporations
//! confirm a donor's document, keeps their progress as MongoDB drafts, and
//! reports signatures to the remote document store as diff updates.
//!
//! ## Services
//!
//! - **Store**: actor drafts, donor records and one-time access codes in
//!   MongoDB, with transactional draft creation
//! - **Document**: snapshot, fetch and diff-update client for the remote
//!   document store, JWT bearer auth
//! - **Resolve**: merged local + remote view of a document
//! - **Signing**: the confirmation state machine, including trust
//!   corporation signatory slots and the second-signatory decision
//! - **Progress**: dashboard milestone vocabularies for donors and
//!   supporters

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod document;
pub mod logging;
pub mod progress;
pub mod resolve;
pub mod routes;
pub mod server;
pub mod signing;
pub mod store;
pub mod types;

pub use config::Args;
pub use context::ActorSession;
pub use server::{run, AppState};
pub use types::{CountersignError, Result};
