//! Actor draft document schema
//!
//! One draft per (document, actor-session) pair, tracking an attorney's or
//! trust corporation's progress through the signing task list. The
//! individual and trust-corporation shapes are a tagged union so that a
//! second signatory on an individual attorney is unrepresentable.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for actor drafts
pub const ACTOR_DRAFT_COLLECTION: &str = "actor_drafts";

/// Role an actor plays on the document
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    #[default]
    Attorney,
    ReplacementAttorney,
    TrustCorporation,
    ReplacementTrustCorporation,
}

impl ActorKind {
    pub fn is_trust_corporation(&self) -> bool {
        matches!(
            self,
            ActorKind::TrustCorporation | ActorKind::ReplacementTrustCorporation
        )
    }

    pub fn from_flags(is_replacement: bool, is_trust_corporation: bool) -> Self {
        match (is_trust_corporation, is_replacement) {
            (true, true) => ActorKind::ReplacementTrustCorporation,
            (true, false) => ActorKind::TrustCorporation,
            (false, true) => ActorKind::ReplacementAttorney,
            (false, false) => ActorKind::Attorney,
        }
    }
}

/// State of one task-list entry
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl TaskState {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskState::Completed)
    }
}

/// Independent per-step task state for the actor's task list
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DraftTasks {
    #[serde(default)]
    pub confirm_details: TaskState,

    #[serde(default)]
    pub read_document: TaskState,

    #[serde(default)]
    pub sign: TaskState,

    /// Second trust-corporation signatory; unused for individuals
    #[serde(default)]
    pub sign_second: TaskState,
}

/// Whether a trust corporation wants a second authorised signatory
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SecondSignatoryChoice {
    #[default]
    Unknown,
    Yes,
    No,
}

/// One authorised signatory slot on a trust corporation draft
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SignatoryDoc {
    pub first_names: String,
    pub last_name: String,
    pub professional_title: String,

    /// When this signatory confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime>,

    /// Donor signing timestamp the confirmation was made against. A donor
    /// re-sign invalidates signatures recorded against the old timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_signed_at: Option<DateTime>,
}

impl SignatoryDoc {
    pub fn is_signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

/// Individual-vs-corporate shape of a draft
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "actor_type", rename_all = "snake_case")]
pub enum ActorVariant {
    Individual {
        /// When the attorney confirmed
        #[serde(skip_serializing_if = "Option::is_none")]
        signed_at: Option<DateTime>,

        /// Donor signing timestamp the confirmation was made against
        #[serde(skip_serializing_if = "Option::is_none")]
        document_signed_at: Option<DateTime>,
    },
    TrustCorporation {
        /// Up to two authorised signatory slots
        #[serde(default)]
        signatories: Vec<SignatoryDoc>,

        #[serde(default)]
        would_like_second_signatory: SecondSignatoryChoice,
    },
}

impl Default for ActorVariant {
    fn default() -> Self {
        ActorVariant::Individual {
            signed_at: None,
            document_signed_at: None,
        }
    }
}

/// Actor draft stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ActorDraftDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Document this draft belongs to
    pub lpa_id: String,

    /// The actor's unique id on the document
    pub actor_uid: String,

    /// Session that owns this draft
    pub session_id: String,

    /// Email the actor redeemed their access code with
    #[serde(default)]
    pub email: String,

    /// Mobile number collected during the task list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,

    /// Preferred contact language code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_language: Option<String>,

    /// Whether this actor is a replacement appointment
    #[serde(default)]
    pub is_replacement: bool,

    /// Individual or trust-corporation shape
    #[serde(flatten)]
    pub actor: ActorVariant,

    /// Task-list progress
    #[serde(default)]
    pub tasks: DraftTasks,
}

impl ActorDraftDoc {
    /// Create a new draft for an actor joining a document
    pub fn new(
        lpa_id: String,
        actor_uid: String,
        session_id: String,
        email: String,
        is_replacement: bool,
        is_trust_corporation: bool,
    ) -> Self {
        let actor = if is_trust_corporation {
            ActorVariant::TrustCorporation {
                signatories: Vec::new(),
                would_like_second_signatory: SecondSignatoryChoice::Unknown,
            }
        } else {
            ActorVariant::Individual {
                signed_at: None,
                document_signed_at: None,
            }
        };

        Self {
            _id: None,
            metadata: Metadata::new(),
            lpa_id,
            actor_uid,
            session_id,
            email,
            mobile: None,
            contact_language: None,
            is_replacement,
            actor,
            tasks: DraftTasks::default(),
        }
    }

    pub fn is_trust_corporation(&self) -> bool {
        matches!(self.actor, ActorVariant::TrustCorporation { .. })
    }

    /// Role this draft plays on the document
    pub fn kind(&self) -> ActorKind {
        ActorKind::from_flags(self.is_replacement, self.is_trust_corporation())
    }

    /// The signatory slot at `index`, when present
    pub fn signatory(&self, index: usize) -> Option<&SignatoryDoc> {
        match &self.actor {
            ActorVariant::TrustCorporation { signatories, .. } => signatories.get(index),
            ActorVariant::Individual { .. } => None,
        }
    }

    /// Whether the slot at `index` has been signed. For individuals only
    /// index 0 is meaningful.
    pub fn signed_for(&self, index: usize) -> bool {
        match &self.actor {
            ActorVariant::Individual { signed_at, .. } => index == 0 && signed_at.is_some(),
            ActorVariant::TrustCorporation { signatories, .. } => {
                signatories.get(index).map(|s| s.is_signed()).unwrap_or(false)
            }
        }
    }

    /// Whether this actor's signing is complete. For a trust corporation the
    /// answer depends on the second-signatory choice: until the corporation
    /// decides, a single signed slot does not finish the job.
    pub fn signed(&self) -> bool {
        match &self.actor {
            ActorVariant::Individual { signed_at, .. } => signed_at.is_some(),
            ActorVariant::TrustCorporation {
                signatories,
                would_like_second_signatory,
            } => {
                let slot_signed =
                    |i: usize| signatories.get(i).map(|s| s.is_signed()).unwrap_or(false);

                match would_like_second_signatory {
                    SecondSignatoryChoice::No => slot_signed(0),
                    SecondSignatoryChoice::Yes => slot_signed(0) && slot_signed(1),
                    SecondSignatoryChoice::Unknown => false,
                }
            }
        }
    }

    /// The corporation's second-signatory choice; Unknown for individuals
    pub fn second_signatory_choice(&self) -> SecondSignatoryChoice {
        match &self.actor {
            ActorVariant::TrustCorporation {
                would_like_second_signatory,
                ..
            } => *would_like_second_signatory,
            ActorVariant::Individual { .. } => SecondSignatoryChoice::Unknown,
        }
    }

    /// Write a signatory slot, growing the vec as needed. No-op for
    /// individuals and for indexes past the second slot.
    pub fn set_signatory(&mut self, index: usize, signatory: SignatoryDoc) {
        if index > 1 {
            return;
        }
        if let ActorVariant::TrustCorporation { signatories, .. } = &mut self.actor {
            while signatories.len() <= index {
                signatories.push(SignatoryDoc::default());
            }
            signatories[index] = signatory;
        }
    }

    pub fn set_second_signatory_choice(&mut self, choice: SecondSignatoryChoice) {
        if let ActorVariant::TrustCorporation {
            would_like_second_signatory,
            ..
        } = &mut self.actor
        {
            *would_like_second_signatory = choice;
        }
    }
}

impl IntoIndexes for ActorDraftDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One draft per (document, actor-session)
            (
                doc! { "lpa_id": 1, "session_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("lpa_session_unique".to_string())
                        .build(),
                ),
            ),
            // Lookup by actor uid for aggregation
            (
                doc! { "lpa_id": 1, "actor_uid": 1 },
                Some(
                    IndexOptions::builder()
                        .name("lpa_actor_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ActorDraftDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_slot() -> SignatoryDoc {
        SignatoryDoc {
            first_names: "Ana".to_string(),
            last_name: "Olan".to_string(),
            professional_title: "Director".to_string(),
            signed_at: Some(DateTime::now()),
            document_signed_at: Some(DateTime::now()),
        }
    }

    #[test]
    fn test_individual_signed() {
        let mut draft = ActorDraftDoc::new(
            "lpa-1".into(),
            "uid-1".into(),
            "session-1".into(),
            "a@example.com".into(),
            false,
            false,
        );
        assert!(!draft.signed());
        assert_eq!(draft.kind(), ActorKind::Attorney);

        draft.actor = ActorVariant::Individual {
            signed_at: Some(DateTime::now()),
            document_signed_at: Some(DateTime::now()),
        };
        assert!(draft.signed());
        assert!(draft.signed_for(0));
        assert!(!draft.signed_for(1));
    }

    #[test]
    fn test_trust_corporation_signed_depends_on_choice() {
        let mut draft = ActorDraftDoc::new(
            "lpa-1".into(),
            "uid-1".into(),
            "session-1".into(),
            "tc@example.com".into(),
            true,
            true,
        );
        assert_eq!(draft.kind(), ActorKind::ReplacementTrustCorporation);

        draft.set_signatory(0, signed_slot());

        // Choice not yet made: one signed slot is not completion
        assert!(!draft.signed());
        assert!(draft.signed_for(0));

        draft.set_second_signatory_choice(SecondSignatoryChoice::No);
        assert!(draft.signed());

        draft.set_second_signatory_choice(SecondSignatoryChoice::Yes);
        assert!(!draft.signed());

        draft.set_signatory(1, signed_slot());
        assert!(draft.signed());
    }

    #[test]
    fn test_set_signatory_ignores_individuals_and_third_slots() {
        let mut individual = ActorDraftDoc::default();
        individual.set_signatory(0, signed_slot());
        assert!(individual.signatory(0).is_none());

        let mut corp = ActorDraftDoc::new(
            "lpa-1".into(),
            "uid-1".into(),
            "session-1".into(),
            "tc@example.com".into(),
            false,
            true,
        );
        corp.set_signatory(2, signed_slot());
        assert!(corp.signatory(2).is_none());
        assert!(corp.signatory(0).is_none());
    }

    #[test]
    fn test_variant_serialization_round_trip() {
        let mut draft = ActorDraftDoc::new(
            "lpa-1".into(),
            "uid-1".into(),
            "session-1".into(),
            "tc@example.com".into(),
            false,
            true,
        );
        draft.set_signatory(0, signed_slot());

        let bytes = bson::to_document(&draft).unwrap();
        assert_eq!(bytes.get_str("actor_type").unwrap(), "trust_corporation");

        let back: ActorDraftDoc = bson::from_document(bytes).unwrap();
        assert!(back.is_trust_corporation());
        assert_eq!(back.signatory(0).unwrap().first_names, "Ana");
    }
}
