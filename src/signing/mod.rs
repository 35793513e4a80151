//! Attorney Signing
//!
//! The signing state machine for attorneys and trust corporation
//! signatories, form validation, and the all-signed query that advances the
//! donor's progress once every appointment has confirmed.
//!
//! # State machine
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  assess(draft, resolved)                                          │
//! │      │                                                            │
//! │      ├─ draft.signed()            ──▶ AlreadySigned ─▶ next page  │
//! │      ├─ donor/provider unsigned   ──▶ NotSignable   ─▶ task list  │
//! │      └─ tasks complete            ──▶ ReadyToSign                 │
//! │                                          │ submit(form)           │
//! │                                          ▼                        │
//! │   individual ── record + send diff ──▶ WhatHappensNext            │
//! │   corporation slot 0 ── record ──▶ WouldLikeSecondSignatory       │
//! │   corporation slot 1 ── record + send both slots ──▶ next page    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Confirmations are recorded against the donor's `signed_at`; if the donor
//! amends and re-signs, previously recorded confirmations stop counting and
//! the actors sign again.

pub mod form;
pub mod service;

pub use form::{FieldErrors, SignForm};
pub use service::{SigningOutcome, SigningService, SigningState, WantsSecond};

use crate::db::schemas::{ActorDraftDoc, ActorVariant, SecondSignatoryChoice};
use crate::document::ResolvedDocument;

/// Whether every attorney the document names has confirmed against the
/// current donor signing.
///
/// Signatures only count when recorded against the document's present
/// `signed_at`. Drafts for actors the document no longer names are ignored.
/// A document naming no attorneys at all is never all-signed.
pub fn all_attorneys_signed(resolved: &ResolvedDocument, drafts: &[ActorDraftDoc]) -> bool {
    if !resolved.names_attorneys() {
        return false;
    }

    let stamp = resolved.signed_at.map(bson::DateTime::from_chrono);
    let sides = [
        (&resolved.attorneys, false),
        (&resolved.replacement_attorneys, true),
    ];

    for (set, replacement) in sides {
        for attorney in &set.attorneys {
            if !individual_signed(drafts, &attorney.uid, stamp) {
                return false;
            }
        }
        if set.trust_corporation.is_some() && !corporation_signed(drafts, replacement, stamp) {
            return false;
        }
    }

    true
}

fn individual_signed(drafts: &[ActorDraftDoc], uid: &str, stamp: Option<bson::DateTime>) -> bool {
    drafts.iter().any(|d| {
        d.actor_uid == uid
            && matches!(
                &d.actor,
                ActorVariant::Individual {
                    signed_at: Some(_),
                    document_signed_at,
                } if *document_signed_at == stamp
            )
    })
}

fn corporation_signed(
    drafts: &[ActorDraftDoc],
    replacement: bool,
    stamp: Option<bson::DateTime>,
) -> bool {
    drafts.iter().any(|d| {
        if !d.is_trust_corporation() || d.is_replacement != replacement {
            return false;
        }

        let slot_counts = |i: usize| {
            d.signatory(i)
                .map(|s| s.is_signed() && s.document_signed_at == stamp)
                .unwrap_or(false)
        };

        match d.second_signatory_choice() {
            SecondSignatoryChoice::No => slot_counts(0),
            SecondSignatoryChoice::Yes => slot_counts(0) && slot_counts(1),
            SecondSignatoryChoice::Unknown => false,
        }
    })
}
