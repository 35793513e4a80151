//! Donor draft document schema
//!
//! The donor's own record for a document: fee state, signing and submission
//! timestamps, and the append-only milestone progress list shown on the
//! dashboard.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::progress::{CompletedStep, StepName};

/// Collection name for donor drafts
pub const DONOR_DRAFT_COLLECTION: &str = "donor_drafts";

fn default_true() -> bool {
    true
}

/// Donor draft stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DonorDraftDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Local document id
    pub lpa_id: String,

    /// Remote store uid, absent until the snapshot has been sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lpa_uid: Option<String>,

    /// Session that owns this document
    pub session_id: String,

    /// Whether the full fee was paid; false routes through fee evidence
    #[serde(default = "default_true")]
    pub paid_full_fee: bool,

    /// When the donor signed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime>,

    /// When the document was submitted to the remote store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime>,

    /// Completed milestone steps, append-only
    #[serde(default)]
    pub progress: Vec<CompletedStep>,
}

impl DonorDraftDoc {
    pub fn new(lpa_id: String, session_id: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            lpa_id,
            lpa_uid: None,
            session_id,
            paid_full_fee: true,
            signed_at: None,
            submitted_at: None,
            progress: Vec::new(),
        }
    }

    pub fn has_completed(&self, name: StepName) -> bool {
        self.progress.iter().any(|step| step.name == name)
    }

    /// Append a completed milestone unless it is already recorded. Returns
    /// whether the list changed.
    pub fn complete_step(&mut self, name: StepName, at: DateTime) -> bool {
        if self.has_completed(name) {
            return false;
        }
        self.progress.push(CompletedStep {
            name,
            completed_at: at,
        });
        true
    }
}

impl IntoIndexes for DonorDraftDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "lpa_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("lpa_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for DonorDraftDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
