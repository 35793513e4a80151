//! Document resolution
//!
//! Merges the donor's locally held draft with the remote document store's
//! copy into one [`ResolvedDocument`]. The remote copy wins wherever both
//! sides know a value; locally known donor state fills the gaps until the
//! document reaches the store. Neither source is ever written here.

use std::sync::Arc;

use tracing::debug;

use crate::context::ActorSession;
use crate::document::{DocumentGateway, ResolvedDocument};
use crate::store::DonorStorage;
use crate::types::Result;

pub struct ResolvingService {
    donors: Arc<dyn DonorStorage>,
    documents: Arc<dyn DocumentGateway>,
}

impl ResolvingService {
    pub fn new(donors: Arc<dyn DonorStorage>, documents: Arc<dyn DocumentGateway>) -> Self {
        Self { donors, documents }
    }

    /// The merged view of the document this session acts on.
    ///
    /// Requires `lpa_id` in the context. A document the remote store does
    /// not know yet resolves to donor-known state alone.
    pub async fn get(&self, ctx: &ActorSession) -> Result<ResolvedDocument> {
        let lpa_id = ctx.require_lpa_id()?;
        let donor = self.donors.get_any(lpa_id).await?;

        let mut remote_found = false;
        let mut resolved = match &donor.lpa_uid {
            Some(uid) => match self.documents.fetch(uid).await {
                Ok(resolved) => {
                    remote_found = true;
                    resolved
                }
                Err(e) if e.is_not_found() => {
                    debug!("Document {} not in the remote store yet", uid);
                    ResolvedDocument::default()
                }
                Err(e) => return Err(e),
            },
            None => ResolvedDocument::default(),
        };

        resolved.lpa_id = donor.lpa_id.clone();
        if let Some(uid) = &donor.lpa_uid {
            resolved.uid = uid.clone();
        }
        resolved.submitted = donor.submitted_at.is_some();
        if !remote_found {
            resolved.signed_at = donor.signed_at.map(|at| at.to_chrono());
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{ActorDraftDoc, ActorKind, DonorDraftDoc};
    use crate::document::{AttorneySet, RemoteAttorney};
    use crate::types::CountersignError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeDonors {
        donor: Option<DonorDraftDoc>,
    }

    #[async_trait]
    impl DonorStorage for FakeDonors {
        async fn get_any(&self, _lpa_id: &str) -> Result<DonorDraftDoc> {
            self.donor.clone().ok_or(CountersignError::NotFound)
        }

        async fn put(&self, _donor: &DonorDraftDoc) -> Result<()> {
            Ok(())
        }
    }

    struct FakeGateway {
        response: Result<ResolvedDocument>,
        fetches: AtomicUsize,
    }

    impl FakeGateway {
        fn returning(response: Result<ResolvedDocument>) -> Self {
            Self {
                response,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentGateway for FakeGateway {
        async fn fetch(&self, _uid: &str) -> Result<ResolvedDocument> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(resolved) => Ok(resolved.clone()),
                Err(CountersignError::NotFound) => Err(CountersignError::NotFound),
                Err(e) => Err(CountersignError::Database(e.to_string())),
            }
        }

        async fn send_attorney_signed(
            &self,
            _resolved: &ResolvedDocument,
            _draft: &ActorDraftDoc,
        ) -> Result<()> {
            Ok(())
        }

        async fn send_opt_out(
            &self,
            _uid: &str,
            _actor_uid: &str,
            _kind: ActorKind,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn donor_with_uid() -> DonorDraftDoc {
        let mut donor = DonorDraftDoc::new("lpa-1".into(), "donor-session".into());
        donor.lpa_uid = Some("M-1111".into());
        donor.signed_at = Some(bson::DateTime::from_chrono(
            chrono::Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        ));
        donor
    }

    fn service(
        donor: Option<DonorDraftDoc>,
        gateway: FakeGateway,
    ) -> (ResolvingService, Arc<FakeGateway>) {
        let gateway = Arc::new(gateway);
        (
            ResolvingService::new(Arc::new(FakeDonors { donor }), gateway.clone()),
            gateway,
        )
    }

    #[tokio::test]
    async fn test_merges_remote_document_with_donor_state() {
        let remote = ResolvedDocument {
            uid: "M-1111".into(),
            signed_at: Some(chrono::Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap()),
            attorneys: AttorneySet {
                attorneys: vec![RemoteAttorney {
                    uid: "a1".into(),
                    ..Default::default()
                }],
                trust_corporation: None,
            },
            ..Default::default()
        };

        let mut donor = donor_with_uid();
        donor.submitted_at = Some(bson::DateTime::now());

        let (service, _) = service(Some(donor), FakeGateway::returning(Ok(remote)));
        let resolved = service
            .get(&ActorSession::new("lpa-1", "session-1"))
            .await
            .unwrap();

        assert_eq!(resolved.lpa_id, "lpa-1");
        assert_eq!(resolved.uid, "M-1111");
        assert!(resolved.submitted);
        // Remote signing time wins over the stale local copy
        assert_eq!(
            resolved.signed_at,
            Some(chrono::Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap())
        );
        assert_eq!(resolved.attorneys.attorneys.len(), 1);
    }

    #[tokio::test]
    async fn test_tolerates_document_missing_from_remote_store() {
        let (service, _) = service(
            Some(donor_with_uid()),
            FakeGateway::returning(Err(CountersignError::NotFound)),
        );

        let resolved = service
            .get(&ActorSession::new("lpa-1", "session-1"))
            .await
            .unwrap();

        assert_eq!(resolved.lpa_id, "lpa-1");
        assert_eq!(resolved.uid, "M-1111");
        assert!(!resolved.submitted);
        // Donor-known signing time stands in until the store has the document
        assert_eq!(
            resolved.signed_at,
            Some(chrono::Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert!(!resolved.names_attorneys());
    }

    #[tokio::test]
    async fn test_donor_without_uid_never_fetches() {
        let mut donor = donor_with_uid();
        donor.lpa_uid = None;

        let (service, gateway) = service(
            Some(donor),
            FakeGateway::returning(Ok(ResolvedDocument::default())),
        );

        let resolved = service
            .get(&ActorSession::new("lpa-1", "session-1"))
            .await
            .unwrap();

        assert_eq!(gateway.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(resolved.uid, "");
        assert!(resolved.signed_at.is_some());
    }

    #[tokio::test]
    async fn test_remote_failures_propagate() {
        let (service, _) = service(
            Some(donor_with_uid()),
            FakeGateway::returning(Err(CountersignError::RemoteDocument {
                status: 500,
                body: "boom".into(),
            })),
        );

        let err = service
            .get(&ActorSession::new("lpa-1", "session-1"))
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_donor_draft_propagates() {
        let (service, _) = service(
            None,
            FakeGateway::returning(Ok(ResolvedDocument::default())),
        );

        let err = service
            .get(&ActorSession::new("lpa-1", "session-1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_requires_lpa_id() {
        let (service, _) = service(
            Some(donor_with_uid()),
            FakeGateway::returning(Ok(ResolvedDocument::default())),
        );

        let err = service
            .get(&ActorSession::new("", "session-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CountersignError::MissingSession("LpaID")));
    }
}
