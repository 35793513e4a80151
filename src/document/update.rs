//! Document update requests
//!
//! Builders for the diff bodies POSTed to `/documents/{uid}/updates`. Each
//! update carries a type tag and a list of key/old/new changes; keys address
//! into the remote document's single attorney array, so replacement
//! individuals sit after every primary individual and a replacement trust
//! corporation sits at index 1 only when a primary one exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::schemas::{ActorDraftDoc, ActorKind, ActorVariant, SignatoryDoc};
use crate::document::resolved::ResolvedDocument;
use crate::types::{CountersignError, Result};

/// Update type tag understood by the document store
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateKind {
    AttorneySign,
    TrustCorporationSign,
    CertificateProviderSign,
    Register,
    Perfect,
    AttorneyOptOut,
    TrustCorporationOptOut,
}

/// One field-level change; `old` and `new` are always on the wire,
/// `null` when there is no value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub key: String,
    pub old: Value,
    pub new: Value,
}

/// Body of `POST /documents/{uid}/updates`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    pub changes: Vec<Change>,
}

/// Certificate provider state as submitted, compared against the remote
/// record to decide whether an email correction rides along
#[derive(Clone, Debug)]
pub struct CertificateProviderDetails {
    pub signed_at: DateTime<Utc>,
    pub contact_language: String,
    pub email: String,
}

impl Update {
    /// Signing diff for an attorney draft.
    ///
    /// Individuals produce a single `signedAt` change; trust corporations
    /// produce the four signatory fields for every slot that has signed.
    pub fn attorney_sign(resolved: &ResolvedDocument, draft: &ActorDraftDoc) -> Result<Update> {
        match &draft.actor {
            ActorVariant::Individual { signed_at, .. } => {
                let at = signed_at.ok_or(CountersignError::NotReady(
                    "attorney draft has no signed timestamp",
                ))?;
                let index = individual_index(resolved, draft)?;

                Ok(Update {
                    kind: UpdateKind::AttorneySign,
                    changes: vec![Change {
                        key: format!("/attorneys/{}/signedAt", index),
                        old: Value::Null,
                        new: json!(at.to_chrono()),
                    }],
                })
            }
            ActorVariant::TrustCorporation { signatories, .. } => {
                let base = trust_corporation_key(resolved, draft)?;

                let mut changes = Vec::new();
                for (slot, signatory) in signatories.iter().enumerate().take(2) {
                    if signatory.is_signed() {
                        changes.extend(signatory_changes(&base, slot, signatory));
                    }
                }
                if changes.is_empty() {
                    return Err(CountersignError::NotReady(
                        "trust corporation draft has no signed signatories",
                    ));
                }

                Ok(Update {
                    kind: UpdateKind::TrustCorporationSign,
                    changes,
                })
            }
        }
    }

    /// Signing diff for the certificate provider; includes an email
    /// correction only when the submitted address differs from the record
    pub fn certificate_provider_sign(
        resolved: &ResolvedDocument,
        details: &CertificateProviderDetails,
    ) -> Update {
        let mut changes = vec![
            Change {
                key: "/certificateProvider/signedAt".to_string(),
                old: Value::Null,
                new: json!(details.signed_at),
            },
            Change {
                key: "/certificateProvider/contactLanguagePreference".to_string(),
                old: Value::Null,
                new: json!(details.contact_language),
            },
        ];

        if details.email != resolved.certificate_provider.email {
            changes.push(Change {
                key: "/certificateProvider/email".to_string(),
                old: json!(resolved.certificate_provider.email),
                new: json!(details.email),
            });
        }

        Update {
            kind: UpdateKind::CertificateProviderSign,
            changes,
        }
    }

    /// Registration event; no changes, sent under the service identity
    pub fn register() -> Update {
        Update {
            kind: UpdateKind::Register,
            changes: Vec::new(),
        }
    }

    /// Perfection event; no changes, sent under the service identity
    pub fn perfect() -> Update {
        Update {
            kind: UpdateKind::Perfect,
            changes: Vec::new(),
        }
    }

    /// Withdrawal event for an attorney or trust corporation
    pub fn opt_out(kind: ActorKind) -> Update {
        Update {
            kind: if kind.is_trust_corporation() {
                UpdateKind::TrustCorporationOptOut
            } else {
                UpdateKind::AttorneyOptOut
            },
            changes: Vec::new(),
        }
    }
}

/// Position of an individual in the remote store's single attorney array
fn individual_index(resolved: &ResolvedDocument, draft: &ActorDraftDoc) -> Result<usize> {
    if draft.is_replacement {
        let offset = resolved.attorneys.attorneys.len();
        resolved
            .replacement_attorneys
            .index_of(&draft.actor_uid)
            .map(|i| offset + i)
            .ok_or(CountersignError::NotFound)
    } else {
        resolved
            .attorneys
            .index_of(&draft.actor_uid)
            .ok_or(CountersignError::NotFound)
    }
}

/// Base key of the trust corporation a corporate draft addresses
fn trust_corporation_key(resolved: &ResolvedDocument, draft: &ActorDraftDoc) -> Result<String> {
    if resolved.trust_corporation_for(draft).is_none() {
        return Err(CountersignError::NotFound);
    }

    let index = if draft.is_replacement && resolved.attorneys.trust_corporation.is_some() {
        1
    } else {
        0
    };
    Ok(format!("/trustCorporations/{}", index))
}

fn signatory_changes(base: &str, slot: usize, signatory: &SignatoryDoc) -> Vec<Change> {
    let mut changes = vec![
        Change {
            key: format!("{}/signatories/{}/firstNames", base, slot),
            old: Value::Null,
            new: json!(signatory.first_names),
        },
        Change {
            key: format!("{}/signatories/{}/lastName", base, slot),
            old: Value::Null,
            new: json!(signatory.last_name),
        },
        Change {
            key: format!("{}/signatories/{}/professionalTitle", base, slot),
            old: Value::Null,
            new: json!(signatory.professional_title),
        },
    ];
    if let Some(at) = signatory.signed_at {
        changes.push(Change {
            key: format!("{}/signatories/{}/signedAt", base, slot),
            old: Value::Null,
            new: json!(at.to_chrono()),
        });
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::resolved::{AttorneySet, RemoteAttorney, RemoteTrustCorporation};
    use chrono::TimeZone;

    fn signing_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap()
    }

    fn remote(uid: &str) -> RemoteAttorney {
        RemoteAttorney {
            uid: uid.into(),
            ..Default::default()
        }
    }

    fn resolved_two_primaries_one_replacement() -> ResolvedDocument {
        ResolvedDocument {
            attorneys: AttorneySet {
                attorneys: vec![remote("a1"), remote("a2")],
                trust_corporation: None,
            },
            replacement_attorneys: AttorneySet {
                attorneys: vec![remote("r1")],
                trust_corporation: None,
            },
            ..Default::default()
        }
    }

    fn signed_individual(uid: &str, replacement: bool) -> ActorDraftDoc {
        let mut draft = ActorDraftDoc::new(
            "lpa-1".into(),
            uid.into(),
            "session-1".into(),
            "a@example.com".into(),
            replacement,
            false,
        );
        draft.actor = ActorVariant::Individual {
            signed_at: Some(bson::DateTime::from_chrono(signing_time())),
            document_signed_at: None,
        };
        draft
    }

    fn signed_signatory(first: &str) -> SignatoryDoc {
        SignatoryDoc {
            first_names: first.into(),
            last_name: "Smith".into(),
            professional_title: "Director".into(),
            signed_at: Some(bson::DateTime::from_chrono(signing_time())),
            document_signed_at: None,
        }
    }

    fn corporate_draft(replacement: bool) -> ActorDraftDoc {
        ActorDraftDoc::new(
            "lpa-1".into(),
            "tc-uid".into(),
            "session-1".into(),
            "tc@example.com".into(),
            replacement,
            true,
        )
    }

    fn with_trust_corporations(primary: bool, replacement: bool) -> ResolvedDocument {
        let tc = |uid: &str| RemoteTrustCorporation {
            uid: uid.into(),
            name: "Trust Ltd".into(),
            ..Default::default()
        };
        ResolvedDocument {
            attorneys: AttorneySet {
                trust_corporation: primary.then(|| tc("tc-p")),
                ..Default::default()
            },
            replacement_attorneys: AttorneySet {
                trust_corporation: replacement.then(|| tc("tc-r")),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_individual_sign_is_a_single_signed_at_change() {
        let resolved = resolved_two_primaries_one_replacement();
        let update = Update::attorney_sign(&resolved, &signed_individual("a2", false)).unwrap();

        assert_eq!(update.kind, UpdateKind::AttorneySign);
        assert_eq!(update.changes.len(), 1);
        assert_eq!(update.changes[0].key, "/attorneys/1/signedAt");
        assert_eq!(update.changes[0].old, Value::Null);
        assert_eq!(update.changes[0].new, json!("2024-03-02T09:00:00Z"));
    }

    #[test]
    fn test_replacement_individual_indexes_after_primaries() {
        let resolved = resolved_two_primaries_one_replacement();
        let update = Update::attorney_sign(&resolved, &signed_individual("r1", true)).unwrap();

        assert_eq!(update.changes[0].key, "/attorneys/2/signedAt");
    }

    #[test]
    fn test_unknown_individual_is_not_found() {
        let resolved = resolved_two_primaries_one_replacement();
        let err = Update::attorney_sign(&resolved, &signed_individual("gone", false)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unsigned_individual_is_not_ready() {
        let resolved = resolved_two_primaries_one_replacement();
        let mut draft = signed_individual("a1", false);
        draft.actor = ActorVariant::Individual {
            signed_at: None,
            document_signed_at: None,
        };

        assert!(matches!(
            Update::attorney_sign(&resolved, &draft),
            Err(CountersignError::NotReady(_))
        ));
    }

    #[test]
    fn test_trust_corporation_sign_first_signatory_only() {
        let resolved = with_trust_corporations(true, false);
        let mut draft = corporate_draft(false);
        draft.set_signatory(0, signed_signatory("Sam"));

        let update = Update::attorney_sign(&resolved, &draft).unwrap();

        assert_eq!(update.kind, UpdateKind::TrustCorporationSign);
        let keys: Vec<&str> = update.changes.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "/trustCorporations/0/signatories/0/firstNames",
                "/trustCorporations/0/signatories/0/lastName",
                "/trustCorporations/0/signatories/0/professionalTitle",
                "/trustCorporations/0/signatories/0/signedAt",
            ]
        );
        assert_eq!(update.changes[0].new, json!("Sam"));
    }

    #[test]
    fn test_trust_corporation_sign_includes_second_signed_slot() {
        let resolved = with_trust_corporations(true, false);
        let mut draft = corporate_draft(false);
        draft.set_signatory(0, signed_signatory("Sam"));
        draft.set_signatory(1, signed_signatory("Sonia"));

        let update = Update::attorney_sign(&resolved, &draft).unwrap();

        assert_eq!(update.changes.len(), 8);
        assert_eq!(
            update.changes[4].key,
            "/trustCorporations/0/signatories/1/firstNames"
        );
        assert_eq!(update.changes[4].new, json!("Sonia"));
    }

    #[test]
    fn test_replacement_trust_corporation_index_depends_on_primary() {
        let mut draft = corporate_draft(true);
        draft.set_signatory(0, signed_signatory("Sam"));

        let alongside_primary = with_trust_corporations(true, true);
        let update = Update::attorney_sign(&alongside_primary, &draft).unwrap();
        assert!(update.changes[0].key.starts_with("/trustCorporations/1/"));

        let alone = with_trust_corporations(false, true);
        let update = Update::attorney_sign(&alone, &draft).unwrap();
        assert!(update.changes[0].key.starts_with("/trustCorporations/0/"));
    }

    #[test]
    fn test_corporate_draft_without_remote_record_is_not_found() {
        let mut draft = corporate_draft(false);
        draft.set_signatory(0, signed_signatory("Sam"));

        let err = Update::attorney_sign(&with_trust_corporations(false, false), &draft)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_certificate_provider_email_change_only_when_differing() {
        let mut resolved = ResolvedDocument::default();
        resolved.certificate_provider.email = "old@example.com".into();

        let mut details = CertificateProviderDetails {
            signed_at: signing_time(),
            contact_language: "en".into(),
            email: "old@example.com".into(),
        };
        let update = Update::certificate_provider_sign(&resolved, &details);
        assert_eq!(update.kind, UpdateKind::CertificateProviderSign);
        assert_eq!(update.changes.len(), 2);

        details.email = "new@example.com".into();
        let update = Update::certificate_provider_sign(&resolved, &details);
        assert_eq!(update.changes.len(), 3);
        assert_eq!(update.changes[2].key, "/certificateProvider/email");
        assert_eq!(update.changes[2].old, json!("old@example.com"));
        assert_eq!(update.changes[2].new, json!("new@example.com"));
    }

    #[test]
    fn test_opt_out_kind_follows_actor_kind() {
        assert_eq!(
            Update::opt_out(ActorKind::Attorney).kind,
            UpdateKind::AttorneyOptOut
        );
        assert_eq!(
            Update::opt_out(ActorKind::ReplacementTrustCorporation).kind,
            UpdateKind::TrustCorporationOptOut
        );
        assert!(Update::opt_out(ActorKind::Attorney).changes.is_empty());
    }

    #[test]
    fn test_update_wire_shape() {
        let resolved = resolved_two_primaries_one_replacement();
        let update = Update::attorney_sign(&resolved, &signed_individual("a1", false)).unwrap();

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "ATTORNEY_SIGN");
        assert!(value["changes"][0]["old"].is_null());
        assert_eq!(value["changes"][0]["key"], "/attorneys/0/signedAt");

        assert_eq!(
            serde_json::to_value(Update::register()).unwrap()["type"],
            "REGISTER"
        );
        assert_eq!(
            serde_json::to_value(Update::perfect()).unwrap()["changes"],
            json!([])
        );
    }
}
