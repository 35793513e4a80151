//! Remote document store integration
//!
//! The document store holds the authoritative copy of every document. This
//! module covers the wire shapes, the diff builders, the HTTP client, and
//! the narrow gateway trait the signing flows depend on.

pub mod client;
pub mod resolved;
pub mod update;
pub mod wire;

pub use client::{DocumentClient, HttpSend, ReqwestSend};
pub use resolved::{
    AttorneySet, RemoteAttorney, RemoteCertificateProvider, RemoteSignatory,
    RemoteTrustCorporation, ResolvedDocument,
};
pub use update::{CertificateProviderDetails, Change, Update, UpdateKind};
pub use wire::{DocumentResponse, DocumentSnapshot};

use async_trait::async_trait;

use crate::db::schemas::{ActorDraftDoc, ActorKind};
use crate::types::Result;

/// What the signing flows need from the document store (allows mocking in
/// tests)
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    /// Fetch and flatten a document by its remote uid
    async fn fetch(&self, uid: &str) -> Result<ResolvedDocument>;

    /// Report an attorney draft's recorded signatures as a diff
    async fn send_attorney_signed(
        &self,
        resolved: &ResolvedDocument,
        draft: &ActorDraftDoc,
    ) -> Result<()>;

    /// Report an actor's withdrawal
    async fn send_opt_out(&self, uid: &str, actor_uid: &str, kind: ActorKind) -> Result<()>;
}

#[async_trait]
impl DocumentGateway for DocumentClient {
    async fn fetch(&self, uid: &str) -> Result<ResolvedDocument> {
        DocumentClient::fetch(self, uid).await
    }

    async fn send_attorney_signed(
        &self,
        resolved: &ResolvedDocument,
        draft: &ActorDraftDoc,
    ) -> Result<()> {
        let update = Update::attorney_sign(resolved, draft)?;
        self.send_update(&resolved.uid, Some(&draft.actor_uid), &update)
            .await
    }

    async fn send_opt_out(&self, uid: &str, actor_uid: &str, kind: ActorKind) -> Result<()> {
        self.send_update(uid, Some(actor_uid), &Update::opt_out(kind))
            .await
    }
}
