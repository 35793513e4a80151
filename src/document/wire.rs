//! Remote document store wire types
//!
//! JSON bodies exchanged with the document store. The store keeps primary
//! and replacement appointments in single arrays tagged with a `status`
//! field; [`DocumentResponse::flatten`] partitions them back into the two
//! sets the rest of the crate works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resolved::{
    AttorneySet, RemoteAttorney, RemoteCertificateProvider, RemoteSignatory,
    RemoteTrustCorporation, ResolvedDocument,
};

/// Appointment status tag carried on attorneys and trust corporations
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireStatus {
    #[default]
    Active,
    Replacement,
    /// Anything else the store reports; dropped on flatten
    #[serde(other)]
    Removed,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAttorney {
    pub uid: String,
    #[serde(default)]
    pub first_names: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: WireStatus,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSignatory {
    #[serde(default)]
    pub first_names: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub professional_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTrustCorporation {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatories: Vec<WireSignatory>,
    #[serde(default)]
    pub status: WireStatus,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCertificateProvider {
    pub uid: String,
    #[serde(default)]
    pub first_names: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub contact_language_preference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDonor {
    pub uid: String,
    pub first_names: String,
    pub last_name: String,
    pub email: String,
    pub contact_language_preference: String,
}

/// Full document body for `PUT /documents/{uid}`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub donor: SnapshotDonor,
    pub attorneys: Vec<WireAttorney>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trust_corporations: Vec<WireTrustCorporation>,
    pub certificate_provider: WireCertificateProvider,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub restrictions_and_conditions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}

/// Body of `GET /documents/{uid}`; unknown fields ignored
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub uid: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub signed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attorneys: Vec<WireAttorney>,
    #[serde(default)]
    pub trust_corporations: Vec<WireTrustCorporation>,
    #[serde(default)]
    pub certificate_provider: WireCertificateProvider,
    #[serde(default)]
    pub registration_date: Option<DateTime<Utc>>,
}

impl DocumentResponse {
    /// Partition the status-tagged arrays into primary/replacement sets.
    ///
    /// `lpa_id` and `submitted` are local overlays; the resolving service
    /// fills them in.
    pub fn flatten(self) -> ResolvedDocument {
        let mut attorneys = AttorneySet::default();
        let mut replacement_attorneys = AttorneySet::default();

        for a in self.attorneys {
            let set = match a.status {
                WireStatus::Active => &mut attorneys,
                WireStatus::Replacement => &mut replacement_attorneys,
                WireStatus::Removed => continue,
            };
            set.attorneys.push(RemoteAttorney {
                uid: a.uid,
                first_names: a.first_names,
                last_name: a.last_name,
                email: a.email,
                mobile: a.mobile,
                signed_at: a.signed_at,
            });
        }

        for tc in self.trust_corporations {
            let set = match tc.status {
                WireStatus::Active => &mut attorneys,
                WireStatus::Replacement => &mut replacement_attorneys,
                WireStatus::Removed => continue,
            };
            set.trust_corporation = Some(RemoteTrustCorporation {
                uid: tc.uid,
                name: tc.name,
                email: tc.email,
                mobile: tc.mobile,
                signatories: tc
                    .signatories
                    .into_iter()
                    .map(|s| RemoteSignatory {
                        first_names: s.first_names,
                        last_name: s.last_name,
                        professional_title: s.professional_title,
                        signed_at: s.signed_at,
                    })
                    .collect(),
            });
        }

        ResolvedDocument {
            lpa_id: String::new(),
            uid: self.uid,
            signed_at: self.signed_at,
            certificate_provider: RemoteCertificateProvider {
                uid: self.certificate_provider.uid,
                first_names: self.certificate_provider.first_names,
                last_name: self.certificate_provider.last_name,
                email: self.certificate_provider.email,
                contact_language: self.certificate_provider.contact_language_preference,
                signed_at: self.certificate_provider.signed_at,
            },
            attorneys,
            replacement_attorneys,
            submitted: false,
            registered_at: self.registration_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_partitions_by_status() {
        let body = json!({
            "uid": "M-1111-2222-3333",
            "status": "in-progress",
            "signedAt": "2024-03-01T10:00:00Z",
            "attorneys": [
                {"uid": "a1", "firstNames": "Amy", "lastName": "Adams",
                 "email": "amy@example.com", "status": "active",
                 "signedAt": "2024-03-02T09:00:00Z"},
                {"uid": "r1", "firstNames": "Rex", "lastName": "Reed",
                 "status": "replacement"}
            ],
            "trustCorporations": [
                {"uid": "tc1", "name": "First Choice Trust", "status": "active",
                 "signatories": [
                     {"firstNames": "Sam", "lastName": "Smith",
                      "professionalTitle": "Director",
                      "signedAt": "2024-03-02T09:30:00Z"}
                 ]}
            ],
            "certificateProvider": {
                "uid": "cp1", "firstNames": "Carol", "lastName": "Cert",
                "email": "carol@example.com", "contactLanguagePreference": "en"
            },
            "registrationDate": "2024-04-01T00:00:00Z"
        });

        let response: DocumentResponse = serde_json::from_value(body).unwrap();
        let resolved = response.flatten();

        assert_eq!(resolved.uid, "M-1111-2222-3333");
        assert!(resolved.signed_at.is_some());
        assert!(resolved.registered_at.is_some());
        assert!(!resolved.submitted);

        assert_eq!(resolved.attorneys.attorneys.len(), 1);
        assert_eq!(resolved.attorneys.attorneys[0].uid, "a1");
        assert!(resolved.attorneys.attorneys[0].signed_at.is_some());

        assert_eq!(resolved.replacement_attorneys.attorneys.len(), 1);
        assert_eq!(resolved.replacement_attorneys.attorneys[0].uid, "r1");

        let tc = resolved.attorneys.trust_corporation.as_ref().unwrap();
        assert_eq!(tc.name, "First Choice Trust");
        assert_eq!(tc.signatories.len(), 1);
        assert_eq!(tc.signatories[0].professional_title, "Director");
        assert!(resolved.replacement_attorneys.trust_corporation.is_none());

        assert_eq!(resolved.certificate_provider.contact_language, "en");
    }

    #[test]
    fn test_flatten_drops_removed_actors() {
        let body = json!({
            "uid": "M-1",
            "attorneys": [
                {"uid": "a1", "status": "active"},
                {"uid": "a2", "status": "removed"}
            ],
            "trustCorporations": [
                {"uid": "tc1", "name": "Gone Ltd", "status": "removed"}
            ],
            "certificateProvider": {"uid": "cp1"}
        });

        let resolved: ResolvedDocument =
            serde_json::from_value::<DocumentResponse>(body).unwrap().flatten();

        assert_eq!(resolved.attorneys.attorneys.len(), 1);
        assert!(resolved.attorneys.trust_corporation.is_none());
    }

    #[test]
    fn test_response_tolerates_minimal_body() {
        let resolved: ResolvedDocument =
            serde_json::from_value::<DocumentResponse>(json!({"uid": "M-2"}))
                .unwrap()
                .flatten();

        assert_eq!(resolved.uid, "M-2");
        assert!(resolved.signed_at.is_none());
        assert!(!resolved.names_attorneys());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = DocumentSnapshot {
            donor: SnapshotDonor {
                uid: "d1".into(),
                first_names: "Donna".into(),
                last_name: "Donor".into(),
                email: "donna@example.com".into(),
                contact_language_preference: "cy".into(),
            },
            attorneys: vec![WireAttorney {
                uid: "a1".into(),
                status: WireStatus::Replacement,
                ..Default::default()
            }],
            ..Default::default()
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["donor"]["firstNames"], "Donna");
        assert_eq!(value["donor"]["contactLanguagePreference"], "cy");
        assert_eq!(value["attorneys"][0]["status"], "replacement");

        // Empty collections and unset timestamps stay off the wire
        assert!(value.get("trustCorporations").is_none());
        assert!(value.get("signedAt").is_none());
        assert!(value["attorneys"][0].get("signedAt").is_none());
    }
}
