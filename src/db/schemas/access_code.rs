//! Access code schema
//!
//! One-time codes a donor hands to each actor so they can claim their draft.
//! Codes are stored as SHA-256 digests, never in clear, and are consumed
//! (hard-deleted) inside the draft-creation transaction.

use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Duration, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for access codes
pub const ACCESS_CODE_COLLECTION: &str = "access_codes";

/// Namespace a code was issued under. Codes for different roles live in
/// separate namespaces so the same clear code can never cross roles.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    #[default]
    Attorney,
    CertificateProvider,
    Donor,
}

impl CodeKind {
    /// Filter-key form; must stay in step with the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Attorney => "attorney",
            CodeKind::CertificateProvider => "certificate_provider",
            CodeKind::Donor => "donor",
        }
    }
}

/// Hash a clear access code for storage or lookup.
pub fn hash_code(clear: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(clear.as_bytes());
    hex::encode(hasher.finalize())
}

/// Access code stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AccessCodeDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Role namespace the code was issued under
    pub actor_kind: CodeKind,

    /// SHA-256 digest of the clear code, hex encoded
    pub code_hash: String,

    /// Local id of the document the code grants access to
    pub lpa_id: String,

    /// Remote store uid of the document
    pub lpa_uid: String,

    /// The actor the code was issued for
    pub actor_uid: String,

    /// Session of the donor who issued the code
    pub donor_session_id: String,

    /// Whether the actor is a replacement appointment
    #[serde(default)]
    pub is_replacement: bool,

    /// Whether the actor is a trust corporation
    #[serde(default)]
    pub is_trust_corporation: bool,

    /// When the code stops working; stored as a BSON date so the TTL index
    /// can reap it
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl AccessCodeDoc {
    /// Create a code record from its clear text; only the digest is kept.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        actor_kind: CodeKind,
        clear_code: &str,
        lpa_id: String,
        lpa_uid: String,
        actor_uid: String,
        donor_session_id: String,
        is_replacement: bool,
        is_trust_corporation: bool,
        ttl: Duration,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            actor_kind,
            code_hash: hash_code(clear_code),
            lpa_id,
            lpa_uid,
            actor_uid,
            donor_session_id,
            is_replacement,
            is_trust_corporation,
            expires_at: Utc::now() + ttl,
        }
    }

    /// An expired code behaves exactly like a missing one.
    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

impl IntoIndexes for AccessCodeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One record per (namespace, digest)
            (
                doc! { "actor_kind": 1, "code_hash": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("kind_code_unique".to_string())
                        .build(),
                ),
            ),
            // TTL index for automatic expiration cleanup
            (
                doc! { "expires_at": 1 },
                Some(
                    IndexOptions::builder()
                        .expire_after(std::time::Duration::from_secs(0))
                        .name("expires_at_ttl".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for AccessCodeDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> AccessCodeDoc {
        AccessCodeDoc::new(
            CodeKind::Attorney,
            "ABCD1234EFGH",
            "lpa-1".to_string(),
            "M-1111-2222-3333".to_string(),
            "attorney-uid".to_string(),
            "donor-session".to_string(),
            false,
            false,
            Duration::days(90),
        )
    }

    #[test]
    fn test_clear_code_is_not_stored() {
        let doc = code();
        assert_ne!(doc.code_hash, "ABCD1234EFGH");
        assert_eq!(doc.code_hash, hash_code("ABCD1234EFGH"));
        assert_eq!(doc.code_hash.len(), 64);
    }

    #[test]
    fn test_expiry_window() {
        let doc = code();
        assert!(!doc.has_expired(Utc::now()));
        assert!(doc.has_expired(Utc::now() + Duration::days(91)));
    }

    #[test]
    fn test_kind_filter_form_matches_serde_rename() {
        for kind in [CodeKind::Attorney, CodeKind::CertificateProvider, CodeKind::Donor] {
            let serialized = serde_json::to_string(&kind).unwrap();
            assert_eq!(serialized, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_hash_is_deterministic_and_namespaced_by_kind() {
        assert_eq!(hash_code("same"), hash_code("same"));
        assert_ne!(hash_code("same"), hash_code("SAME"));

        // Namespacing lives in the index, not the digest
        let attorney = code();
        let mut donor = code();
        donor.actor_kind = CodeKind::Donor;
        assert_eq!(attorney.code_hash, donor.code_hash);
        assert_ne!(attorney.actor_kind, donor.actor_kind);
    }
}
