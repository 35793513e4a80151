//! Local persistence for countersign
//!
//! Provides:
//! - Draft store with transactional creation (draft + dashboard link +
//!   access-code consumption, all or nothing)
//! - Access code store with hashed lookup and expiry
//! - Donor store with milestone progress append

pub mod access_code;
pub mod draft;
pub mod donor;

pub use access_code::AccessCodeStore;
pub use draft::DraftStore;
pub use donor::DonorStore;

use crate::context::ActorSession;
use crate::db::schemas::{ActorDraftDoc, DonorDraftDoc};
use crate::types::Result;

/// Actor draft persistence operations (allows mocking in tests)
#[async_trait::async_trait]
pub trait DraftStorage: Send + Sync {
    /// The draft for the session's (document, actor-session) pair
    async fn get(&self, ctx: &ActorSession) -> Result<ActorDraftDoc>;

    /// Persist a draft, last writer wins
    async fn put(&self, draft: &ActorDraftDoc) -> Result<()>;

    /// Remove the session's draft (opt-out)
    async fn delete(&self, ctx: &ActorSession) -> Result<()>;

    /// Every live draft for a document
    async fn all(&self, lpa_id: &str) -> Result<Vec<ActorDraftDoc>>;
}

/// Donor draft persistence operations (allows mocking in tests)
#[async_trait::async_trait]
pub trait DonorStorage: Send + Sync {
    /// The donor draft for a document, whichever session owns it
    async fn get_any(&self, lpa_id: &str) -> Result<DonorDraftDoc>;

    /// Persist the donor draft, last writer wins
    async fn put(&self, donor: &DonorDraftDoc) -> Result<()>;
}
