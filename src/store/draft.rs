//! Actor draft store
//!
//! Creation is the only multi-document write in the system: the draft, its
//! dashboard link, and the consumption of the access code commit together or
//! not at all. Everything else is a single-document read or write.

use bson::{doc, DateTime};
use chrono::Utc;
use mongodb::ClientSession;
use tracing::{info, warn};

use crate::context::ActorSession;
use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{
    AccessCodeDoc, ActorDraftDoc, DashboardLinkDoc, ACCESS_CODE_COLLECTION,
    ACTOR_DRAFT_COLLECTION, DASHBOARD_LINK_COLLECTION,
};
use crate::store::DraftStorage;
use crate::types::{CountersignError, Result};

/// MongoDB-backed actor draft store
#[derive(Clone)]
pub struct DraftStore {
    client: MongoClient,
    drafts: MongoCollection<ActorDraftDoc>,
    links: MongoCollection<DashboardLinkDoc>,
    codes: MongoCollection<AccessCodeDoc>,
    now: fn() -> chrono::DateTime<Utc>,
}

impl DraftStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            client: client.clone(),
            drafts: client.collection(ACTOR_DRAFT_COLLECTION).await?,
            links: client.collection(DASHBOARD_LINK_COLLECTION).await?,
            codes: client.collection(ACCESS_CODE_COLLECTION).await?,
            now: Utc::now,
        })
    }

    /// Replace the clock, for deterministic tests
    pub fn with_clock(mut self, now: fn() -> chrono::DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Create the draft an access code grants, writing the draft, its
    /// dashboard link, and the code deletion in one transaction. No partial
    /// state is observable on failure.
    pub async fn create(
        &self,
        ctx: &ActorSession,
        code: &AccessCodeDoc,
        email: &str,
    ) -> Result<ActorDraftDoc> {
        let (lpa_id, session_id) = ctx.require_keys()?;

        let mut draft = ActorDraftDoc::new(
            lpa_id.to_string(),
            code.actor_uid.clone(),
            session_id.to_string(),
            email.to_string(),
            code.is_replacement,
            code.is_trust_corporation,
        );
        let link = DashboardLinkDoc::new(
            lpa_id.to_string(),
            session_id.to_string(),
            code.lpa_uid.clone(),
            code.donor_session_id.clone(),
            draft.kind(),
        );

        let mut session = self.client.start_session().await?;
        session.start_transaction().await.map_err(|e| {
            CountersignError::Database(format!("Failed to start transaction: {}", e))
        })?;

        match self
            .create_in_transaction(&mut session, draft.clone(), link, code)
            .await
        {
            Ok(inserted_id) => {
                session.commit_transaction().await.map_err(|e| {
                    CountersignError::Database(format!("Failed to commit transaction: {}", e))
                })?;

                info!(
                    "Created draft for document {} ({:?})",
                    draft.lpa_id,
                    draft.kind()
                );
                draft._id = Some(inserted_id);
                Ok(draft)
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    warn!("Failed to abort draft creation: {}", abort_err);
                }
                Err(e)
            }
        }
    }

    async fn create_in_transaction(
        &self,
        session: &mut ClientSession,
        draft: ActorDraftDoc,
        link: DashboardLinkDoc,
        code: &AccessCodeDoc,
    ) -> Result<bson::oid::ObjectId> {
        let inserted_id = self.drafts.insert_one_with_session(draft, session).await?;
        self.links.insert_one_with_session(link, session).await?;

        // Consume the one-time code
        self.codes
            .delete_one_with_session(
                doc! {
                    "actor_kind": code.actor_kind.as_str(),
                    "code_hash": &code.code_hash,
                },
                session,
            )
            .await?;

        Ok(inserted_id)
    }
}

#[async_trait::async_trait]
impl DraftStorage for DraftStore {
    async fn get(&self, ctx: &ActorSession) -> Result<ActorDraftDoc> {
        let (lpa_id, session_id) = ctx.require_keys()?;

        self.drafts
            .find_one(doc! { "lpa_id": lpa_id, "session_id": session_id })
            .await?
            .ok_or(CountersignError::NotFound)
    }

    async fn put(&self, draft: &ActorDraftDoc) -> Result<()> {
        let mut item = draft.clone();
        let stamp = DateTime::from_chrono((self.now)());
        if item.metadata.created_at.is_none() {
            item.metadata.created_at = Some(stamp);
        }
        item.metadata.touch(stamp);

        self.drafts
            .replace_one(
                doc! { "lpa_id": &item.lpa_id, "session_id": &item.session_id },
                item,
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, ctx: &ActorSession) -> Result<()> {
        let (lpa_id, session_id) = ctx.require_keys()?;

        self.drafts
            .soft_delete(doc! { "lpa_id": lpa_id, "session_id": session_id })
            .await?;
        Ok(())
    }

    async fn all(&self, lpa_id: &str) -> Result<Vec<ActorDraftDoc>> {
        self.drafts.find_many(doc! { "lpa_id": lpa_id }).await
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running MongoDB instance
    // (transactions additionally need a replica set); see
    // docker-compose.dev.yml for local testing. The trait-level behavior is
    // covered through the in-memory stores in the signing service tests.
}
