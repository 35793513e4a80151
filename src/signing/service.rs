//! Signing state machine
//!
//! Drives an attorney or trust corporation signatory through confirmation:
//! assessing whether signing is possible, recording the confirmation,
//! reporting it to the remote document store, and advancing the donor's
//! progress once every appointment has confirmed.
//!
//! Sends happen before local persistence. If the send succeeds and the
//! write does not, the remote store already shows the signature and the
//! next submission adopts it instead of sending again.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::context::ActorSession;
use crate::db::schemas::{
    ActorDraftDoc, ActorVariant, SecondSignatoryChoice, SignatoryDoc, TaskState,
};
use crate::document::{DocumentGateway, ResolvedDocument};
use crate::logging::AuditLogger;
use crate::progress::StepName;
use crate::store::{DonorStorage, DraftStorage};
use crate::types::Result;

use super::all_attorneys_signed;
use super::form::{FieldErrors, SignForm};

/// Where an actor stands in the signing flow
#[derive(Clone, Debug, PartialEq)]
pub enum SigningState {
    /// Preconditions unmet; the actor goes back to their task list
    NotSignable,
    /// Signing already complete
    AlreadySigned,
    /// Signing can proceed; the form is prefilled for the slot being signed
    ReadyToSign { form: SignForm },
}

/// Where a submission lands
#[derive(Clone, Debug, PartialEq)]
pub enum SigningOutcome {
    TaskList,
    WhatHappensNext,
    WouldLikeSecondSignatory,
    Invalid(FieldErrors),
}

/// A trust corporation's answer to the second-signatory question
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WantsSecond {
    Yes,
    No,
}

pub struct SigningService {
    drafts: Arc<dyn DraftStorage>,
    donors: Arc<dyn DonorStorage>,
    documents: Arc<dyn DocumentGateway>,
    audit: AuditLogger,
    now: fn() -> DateTime<Utc>,
}

impl SigningService {
    pub fn new(
        drafts: Arc<dyn DraftStorage>,
        donors: Arc<dyn DonorStorage>,
        documents: Arc<dyn DocumentGateway>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            drafts,
            donors,
            documents,
            audit,
            now: Utc::now,
        }
    }

    /// Override the clock, for tests
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Where the actor stands. Completion is checked before signability so
    /// an already-signed actor on a document the donor has since amended
    /// still sees what-happens-next rather than a dead task list.
    pub fn assess(
        &self,
        draft: &ActorDraftDoc,
        resolved: &ResolvedDocument,
        signatory_index: usize,
    ) -> SigningState {
        if draft.signed() {
            return SigningState::AlreadySigned;
        }

        if resolved.signed_at.is_none()
            || resolved.certificate_provider.signed_at.is_none()
            || !draft.tasks.confirm_details.is_completed()
            || !draft.tasks.read_document.is_completed()
        {
            return SigningState::NotSignable;
        }

        SigningState::ReadyToSign {
            form: prefill(draft, resolved, signatory_index),
        }
    }

    /// Record a confirmation submission for an individual attorney
    /// (`signatory_index` 0) or a trust corporation signatory slot
    pub async fn submit(
        &self,
        ctx: &ActorSession,
        resolved: &ResolvedDocument,
        form: &SignForm,
        signatory_index: usize,
    ) -> Result<SigningOutcome> {
        let mut draft = self.drafts.get(ctx).await?;

        match self.assess(&draft, resolved, signatory_index) {
            SigningState::AlreadySigned => return Ok(SigningOutcome::WhatHappensNext),
            SigningState::NotSignable => return Ok(SigningOutcome::TaskList),
            SigningState::ReadyToSign { .. } => {}
        }

        let errors = form.validate(draft.is_trust_corporation());
        if !errors.is_empty() {
            return Ok(SigningOutcome::Invalid(errors));
        }

        if draft.is_trust_corporation() {
            self.submit_signatory(ctx, resolved, &mut draft, form, signatory_index)
                .await
        } else {
            self.submit_individual(ctx, resolved, &mut draft).await
        }
    }

    async fn submit_individual(
        &self,
        ctx: &ActorSession,
        resolved: &ResolvedDocument,
        draft: &mut ActorDraftDoc,
    ) -> Result<SigningOutcome> {
        // Adopt a signature the remote store already has rather than
        // sending a duplicate; that is the recovery path after a send
        // succeeded but the local write did not.
        let (signed_at, send) = match resolved.remote_signed_at(draft) {
            Some(remote) => (bson::DateTime::from_chrono(remote), false),
            None => (bson::DateTime::from_chrono((self.now)()), true),
        };

        draft.actor = ActorVariant::Individual {
            signed_at: Some(signed_at),
            document_signed_at: resolved.signed_at.map(bson::DateTime::from_chrono),
        };
        draft.tasks.sign = TaskState::Completed;

        if send {
            self.documents.send_attorney_signed(resolved, draft).await?;
        }
        self.drafts.put(draft).await?;

        info!(
            "Attorney {} signed document {}",
            draft.actor_uid, resolved.uid
        );
        self.audit
            .log_attorney_signed(&resolved.uid, &draft.actor_uid, draft.kind())
            .await;

        self.check_all_signed(ctx, resolved).await?;
        Ok(SigningOutcome::WhatHappensNext)
    }

    async fn submit_signatory(
        &self,
        ctx: &ActorSession,
        resolved: &ResolvedDocument,
        draft: &mut ActorDraftDoc,
        form: &SignForm,
        signatory_index: usize,
    ) -> Result<SigningOutcome> {
        if signatory_index > 1 {
            return Ok(SigningOutcome::TaskList);
        }

        let (signed_at, send) = match resolved.remote_signatory_signed_at(draft, signatory_index) {
            Some(remote) => (bson::DateTime::from_chrono(remote), false),
            // Slot 0 alone is not the corporation's full signing, so its
            // send waits for the second-signatory decision; a slot 1
            // submission reports both slots at once.
            None => (
                bson::DateTime::from_chrono((self.now)()),
                signatory_index == 1,
            ),
        };

        draft.set_signatory(
            signatory_index,
            SignatoryDoc {
                first_names: form.first_names.trim().to_string(),
                last_name: form.last_name.trim().to_string(),
                professional_title: form.professional_title.trim().to_string(),
                signed_at: Some(signed_at),
                document_signed_at: resolved.signed_at.map(bson::DateTime::from_chrono),
            },
        );
        if signatory_index == 0 {
            draft.tasks.sign = TaskState::Completed;
        } else {
            draft.tasks.sign_second = TaskState::Completed;
        }

        if send {
            self.documents.send_attorney_signed(resolved, draft).await?;
        }
        self.drafts.put(draft).await?;

        info!(
            "Trust corporation {} signatory {} signed document {}",
            draft.actor_uid, signatory_index, resolved.uid
        );
        self.audit
            .log_signatory_signed(&resolved.uid, &draft.actor_uid, draft.kind(), signatory_index)
            .await;

        if signatory_index == 0 {
            Ok(SigningOutcome::WouldLikeSecondSignatory)
        } else {
            self.check_all_signed(ctx, resolved).await?;
            Ok(SigningOutcome::WhatHappensNext)
        }
    }

    /// Record the corporation's second-signatory decision. Answering no
    /// completes the corporation's signing, which triggers the deferred
    /// diff send unless the remote store already shows it.
    pub async fn record_second_signatory_choice(
        &self,
        ctx: &ActorSession,
        resolved: &ResolvedDocument,
        choice: WantsSecond,
    ) -> Result<()> {
        let mut draft = self.drafts.get(ctx).await?;

        match choice {
            WantsSecond::Yes => {
                draft.set_second_signatory_choice(SecondSignatoryChoice::Yes);
                self.drafts.put(&draft).await?;
            }
            WantsSecond::No => {
                draft.set_second_signatory_choice(SecondSignatoryChoice::No);
                if !resolved.has_remote_signatories(&draft) {
                    self.documents.send_attorney_signed(resolved, &draft).await?;
                }
                self.drafts.put(&draft).await?;
                self.check_all_signed(ctx, resolved).await?;
            }
        }

        self.audit
            .log_second_signatory_decided(
                &resolved.uid,
                &draft.actor_uid,
                draft.kind(),
                matches!(choice, WantsSecond::Yes),
            )
            .await;
        Ok(())
    }

    /// Withdraw this actor: report the opt-out, then delete the draft
    pub async fn opt_out(&self, ctx: &ActorSession, resolved: &ResolvedDocument) -> Result<()> {
        let draft = self.drafts.get(ctx).await?;

        self.documents
            .send_opt_out(&resolved.uid, &draft.actor_uid, draft.kind())
            .await?;
        self.drafts.delete(ctx).await?;

        info!(
            "Actor {} opted out of document {}",
            draft.actor_uid, resolved.uid
        );
        self.audit
            .log_opted_out(&resolved.uid, &draft.actor_uid, draft.kind())
            .await;
        Ok(())
    }

    /// Advance the donor's progress when the last appointment confirms
    async fn check_all_signed(&self, ctx: &ActorSession, resolved: &ResolvedDocument) -> Result<()> {
        let lpa_id = ctx.require_lpa_id()?;
        let drafts = self.drafts.all(lpa_id).await?;
        if !all_attorneys_signed(resolved, &drafts) {
            return Ok(());
        }

        let mut donor = self.donors.get_any(lpa_id).await?;
        if donor.complete_step(
            StepName::AllAttorneysSignedLpa,
            bson::DateTime::from_chrono((self.now)()),
        ) {
            self.donors.put(&donor).await?;
            info!("All attorneys have signed document {}", resolved.uid);
            self.audit.log_all_attorneys_signed(&resolved.uid).await;
        }
        Ok(())
    }
}

/// Prefill the sign form for a trust corporation slot from locally
/// recorded signatory data, falling back to the remote record
fn prefill(draft: &ActorDraftDoc, resolved: &ResolvedDocument, signatory_index: usize) -> SignForm {
    if !draft.is_trust_corporation() {
        return SignForm::default();
    }

    if let Some(s) = draft.signatory(signatory_index) {
        if !s.first_names.is_empty() || !s.last_name.is_empty() || !s.professional_title.is_empty()
        {
            return SignForm {
                confirmed: false,
                first_names: s.first_names.clone(),
                last_name: s.last_name.clone(),
                professional_title: s.professional_title.clone(),
            };
        }
    }

    if let Some(s) = resolved
        .trust_corporation_for(draft)
        .and_then(|tc| tc.signatories.get(signatory_index))
    {
        return SignForm {
            confirmed: false,
            first_names: s.first_names.clone(),
            last_name: s.last_name.clone(),
            professional_title: s.professional_title.clone(),
        };
    }

    SignForm::default()
}
