//! Database schemas for countersign
//!
//! Defines MongoDB document structures for actor drafts, donor drafts,
//! dashboard links, and access codes.

pub mod access_code;
pub mod actor_draft;
pub mod dashboard_link;
pub mod donor_draft;
mod metadata;

pub use access_code::{hash_code, AccessCodeDoc, CodeKind, ACCESS_CODE_COLLECTION};
pub use actor_draft::{
    ActorDraftDoc, ActorKind, ActorVariant, DraftTasks, SecondSignatoryChoice, SignatoryDoc,
    TaskState, ACTOR_DRAFT_COLLECTION,
};
pub use dashboard_link::{DashboardLinkDoc, DASHBOARD_LINK_COLLECTION};
pub use donor_draft::{DonorDraftDoc, DONOR_DRAFT_COLLECTION};
pub use metadata::Metadata;
