//! Resolved document view
//!
//! The merged picture of a document: the remote store's snapshot overlaid
//! with locally known donor state. Never persisted; recomputed on every
//! read by the resolving service.

use chrono::{DateTime, Utc};

use crate::db::schemas::{ActorDraftDoc, ActorVariant};

/// An individual attorney as the remote store records them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteAttorney {
    pub uid: String,
    pub first_names: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub signed_at: Option<DateTime<Utc>>,
}

/// One authorised signatory as the remote store records them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteSignatory {
    pub first_names: String,
    pub last_name: String,
    pub professional_title: String,
    pub signed_at: Option<DateTime<Utc>>,
}

/// A trust corporation as the remote store records it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteTrustCorporation {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub signatories: Vec<RemoteSignatory>,
}

/// One appointment side of the document: the individual attorneys plus at
/// most one trust corporation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttorneySet {
    pub attorneys: Vec<RemoteAttorney>,
    pub trust_corporation: Option<RemoteTrustCorporation>,
}

impl AttorneySet {
    /// Number of named appointments, counting a trust corporation as one
    pub fn len(&self) -> usize {
        self.attorneys.len() + usize::from(self.trust_corporation.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of an individual among this side's individuals
    pub fn index_of(&self, uid: &str) -> Option<usize> {
        self.attorneys.iter().position(|a| a.uid == uid)
    }

    pub fn get(&self, uid: &str) -> Option<&RemoteAttorney> {
        self.attorneys.iter().find(|a| a.uid == uid)
    }
}

/// The certificate provider as the remote store records them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteCertificateProvider {
    pub uid: String,
    pub first_names: String,
    pub last_name: String,
    pub email: String,
    pub contact_language: String,
    pub signed_at: Option<DateTime<Utc>>,
}

/// Remote document state merged with local donor-owned state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedDocument {
    /// Local document id, overlaid by the resolving service
    pub lpa_id: String,

    /// Remote store uid
    pub uid: String,

    /// When the donor signed; amending and re-signing moves this forward
    /// and logically resets every attorney signature
    pub signed_at: Option<DateTime<Utc>>,

    pub certificate_provider: RemoteCertificateProvider,

    pub attorneys: AttorneySet,
    pub replacement_attorneys: AttorneySet,

    /// Whether the donor has submitted; locally known, never remote
    pub submitted: bool,

    /// Registration date reported by the remote store
    pub registered_at: Option<DateTime<Utc>>,
}

impl ResolvedDocument {
    /// The appointment side a draft belongs to
    pub fn side_for(&self, draft: &ActorDraftDoc) -> &AttorneySet {
        if draft.is_replacement {
            &self.replacement_attorneys
        } else {
            &self.attorneys
        }
    }

    /// The trust corporation record matching a corporate draft
    pub fn trust_corporation_for(&self, draft: &ActorDraftDoc) -> Option<&RemoteTrustCorporation> {
        self.side_for(draft).trust_corporation.as_ref()
    }

    /// The remotely recorded signed timestamp for an individual draft's
    /// attorney, when the remote store already shows them signed
    pub fn remote_signed_at(&self, draft: &ActorDraftDoc) -> Option<DateTime<Utc>> {
        match draft.actor {
            ActorVariant::Individual { .. } => self
                .side_for(draft)
                .get(&draft.actor_uid)
                .and_then(|a| a.signed_at),
            ActorVariant::TrustCorporation { .. } => None,
        }
    }

    /// The remotely recorded signed timestamp for one trust corporation
    /// signatory slot
    pub fn remote_signatory_signed_at(
        &self,
        draft: &ActorDraftDoc,
        index: usize,
    ) -> Option<DateTime<Utc>> {
        self.trust_corporation_for(draft)
            .and_then(|tc| tc.signatories.get(index))
            .and_then(|s| s.signed_at)
    }

    /// Whether the remote trust corporation for this draft has any
    /// signatories recorded yet
    pub fn has_remote_signatories(&self, draft: &ActorDraftDoc) -> bool {
        self.trust_corporation_for(draft)
            .map(|tc| !tc.signatories.is_empty())
            .unwrap_or(false)
    }

    /// Whether the document names any attorneys at all
    pub fn names_attorneys(&self) -> bool {
        !self.attorneys.is_empty() || !self.replacement_attorneys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::SignatoryDoc;
    use chrono::TimeZone;

    fn signed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn individual_draft(uid: &str, replacement: bool) -> ActorDraftDoc {
        ActorDraftDoc::new(
            "lpa-1".into(),
            uid.into(),
            "session-1".into(),
            "a@example.com".into(),
            replacement,
            false,
        )
    }

    fn corporate_draft(replacement: bool) -> ActorDraftDoc {
        let mut draft = ActorDraftDoc::new(
            "lpa-1".into(),
            "tc-uid".into(),
            "session-1".into(),
            "tc@example.com".into(),
            replacement,
            true,
        );
        draft.set_signatory(0, SignatoryDoc::default());
        draft
    }

    fn resolved_with_sides() -> ResolvedDocument {
        ResolvedDocument {
            attorneys: AttorneySet {
                attorneys: vec![
                    RemoteAttorney {
                        uid: "a1".into(),
                        signed_at: Some(signed_time()),
                        ..Default::default()
                    },
                    RemoteAttorney {
                        uid: "a2".into(),
                        ..Default::default()
                    },
                ],
                trust_corporation: Some(RemoteTrustCorporation {
                    uid: "tc-1".into(),
                    name: "Trust Ltd".into(),
                    signatories: vec![RemoteSignatory {
                        signed_at: Some(signed_time()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            replacement_attorneys: AttorneySet {
                attorneys: vec![RemoteAttorney {
                    uid: "r1".into(),
                    ..Default::default()
                }],
                trust_corporation: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_side_selection_follows_replacement_flag() {
        let resolved = resolved_with_sides();

        assert_eq!(
            resolved.remote_signed_at(&individual_draft("a1", false)),
            Some(signed_time())
        );
        assert_eq!(resolved.remote_signed_at(&individual_draft("a2", false)), None);

        // r1 exists only on the replacement side
        assert_eq!(resolved.remote_signed_at(&individual_draft("r1", false)), None);
        assert_eq!(resolved.remote_signed_at(&individual_draft("r1", true)), None);
    }

    #[test]
    fn test_corporate_drafts_never_resolve_an_individual_timestamp() {
        let resolved = resolved_with_sides();
        assert_eq!(resolved.remote_signed_at(&corporate_draft(false)), None);
    }

    #[test]
    fn test_signatory_lookup() {
        let resolved = resolved_with_sides();
        let draft = corporate_draft(false);

        assert!(resolved.has_remote_signatories(&draft));
        assert_eq!(
            resolved.remote_signatory_signed_at(&draft, 0),
            Some(signed_time())
        );
        assert_eq!(resolved.remote_signatory_signed_at(&draft, 1), None);

        // No trust corporation on the replacement side
        let replacement = corporate_draft(true);
        assert!(!resolved.has_remote_signatories(&replacement));
        assert_eq!(resolved.remote_signatory_signed_at(&replacement, 0), None);
    }

    #[test]
    fn test_names_attorneys() {
        assert!(!ResolvedDocument::default().names_attorneys());
        assert!(resolved_with_sides().names_attorneys());

        let tc_only = ResolvedDocument {
            attorneys: AttorneySet {
                trust_corporation: Some(RemoteTrustCorporation::default()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(tc_only.names_attorneys());
        assert_eq!(tc_only.attorneys.len(), 1);
    }
}
