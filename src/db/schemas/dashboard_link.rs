//! Dashboard link document schema
//!
//! Cross-reference written alongside a new actor draft so the actor's
//! dashboard can list the document and find its owning donor session. Created
//! only inside the draft-creation transaction.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::actor_draft::ActorKind;
use crate::db::schemas::Metadata;

/// Collection name for dashboard links
pub const DASHBOARD_LINK_COLLECTION: &str = "dashboard_links";

/// Dashboard cross-reference stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DashboardLinkDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Document this link refers to
    pub lpa_id: String,

    /// The actor session the link belongs to
    pub session_id: String,

    /// Remote store uid of the document
    pub lpa_uid: String,

    /// Session of the donor who owns the document
    pub donor_session_id: String,

    /// Role the linked actor plays on the document
    pub actor_kind: ActorKind,
}

impl DashboardLinkDoc {
    pub fn new(
        lpa_id: String,
        session_id: String,
        lpa_uid: String,
        donor_session_id: String,
        actor_kind: ActorKind,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            lpa_id,
            session_id,
            lpa_uid,
            donor_session_id,
            actor_kind,
        }
    }
}

impl IntoIndexes for DashboardLinkDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One link per (document, actor-session)
            (
                doc! { "lpa_id": 1, "session_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("lpa_session_unique".to_string())
                        .build(),
                ),
            ),
            // Dashboard listing by session
            (
                doc! { "session_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("session_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for DashboardLinkDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
