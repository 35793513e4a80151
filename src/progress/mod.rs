//! Milestone progress tracking
//!
//! Sequences the fixed step vocabulary shown on the donor and supporter
//! dashboards. Steps marked as notifications represent events the user is
//! told about rather than states they can watch, so they stay hidden until
//! their completion timestamp is set.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Fixed vocabulary of milestone steps
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepName {
    FeeEvidenceSubmitted,
    FeeEvidenceNotified,
    FeeEvidenceApproved,
    DonorPaid,
    DonorProvedIdentity,
    DonorSignedLpa,
    CertificateProvided,
    AllAttorneysSignedLpa,
    LpaSubmitted,
    NoticesOfIntentSent,
    StatutoryWaitingPeriodFinished,
    LpaRegistered,
}

impl StepName {
    /// Notification steps announce an event; they have no observable
    /// in-progress state.
    pub fn is_notification(&self) -> bool {
        matches!(
            self,
            StepName::FeeEvidenceNotified | StepName::NoticesOfIntentSent
        )
    }
}

/// A completed milestone as persisted on the donor draft
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct CompletedStep {
    pub name: StepName,
    pub completed_at: DateTime,
}

/// One step prepared for display
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub name: StepName,
    pub notification: bool,
    pub completed_at: Option<DateTime>,
}

impl Step {
    fn pending(name: StepName) -> Self {
        Self {
            name,
            notification: name.is_notification(),
            completed_at: None,
        }
    }

    fn done(name: StepName, at: DateTime) -> Self {
        Self {
            name,
            notification: name.is_notification(),
            completed_at: Some(at),
        }
    }

    /// Whether this step may appear in a remaining list
    pub fn show(&self) -> bool {
        !self.notification || self.completed_at.is_some()
    }
}

// Registration order of the shared tail of both vocabularies
const DONOR_STEPS: [StepName; 7] = [
    StepName::DonorSignedLpa,
    StepName::CertificateProvided,
    StepName::AllAttorneysSignedLpa,
    StepName::LpaSubmitted,
    StepName::NoticesOfIntentSent,
    StepName::StatutoryWaitingPeriodFinished,
    StepName::LpaRegistered,
];

const SUPPORTER_PREFIX: [StepName; 2] = [StepName::DonorPaid, StepName::DonorProvedIdentity];

const FEE_EVIDENCE_STEPS: [StepName; 3] = [
    StepName::FeeEvidenceSubmitted,
    StepName::FeeEvidenceNotified,
    StepName::FeeEvidenceApproved,
];

/// Orders the milestone vocabulary for one viewer against the set of steps
/// already completed
#[derive(Clone, Debug)]
pub struct ProgressTracker {
    paid_full_fee: bool,
    supporter: bool,
    completed: Vec<CompletedStep>,
}

impl ProgressTracker {
    pub fn new(paid_full_fee: bool, supporter: bool, completed: Vec<CompletedStep>) -> Self {
        Self {
            paid_full_fee,
            supporter,
            completed,
        }
    }

    /// Step vocabulary for the donor view, in registration order
    pub fn donor_steps(&self) -> Vec<StepName> {
        let mut steps = Vec::with_capacity(FEE_EVIDENCE_STEPS.len() + DONOR_STEPS.len());
        if !self.paid_full_fee {
            steps.extend_from_slice(&FEE_EVIDENCE_STEPS);
        }
        steps.extend_from_slice(&DONOR_STEPS);
        steps
    }

    /// Step vocabulary for the supporter view; adds the payment and identity
    /// steps donors do not see
    pub fn supporter_steps(&self) -> Vec<StepName> {
        let mut steps =
            Vec::with_capacity(FEE_EVIDENCE_STEPS.len() + SUPPORTER_PREFIX.len() + DONOR_STEPS.len());
        if !self.paid_full_fee {
            steps.extend_from_slice(&FEE_EVIDENCE_STEPS);
        }
        steps.extend_from_slice(&SUPPORTER_PREFIX);
        steps.extend_from_slice(&DONOR_STEPS);
        steps
    }

    fn vocabulary(&self) -> Vec<StepName> {
        if self.supporter {
            self.supporter_steps()
        } else {
            self.donor_steps()
        }
    }

    fn completion(&self, name: StepName) -> Option<DateTime> {
        self.completed
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.completed_at)
    }

    /// The step currently in progress plus the steps still ahead of it.
    /// Completed steps are dropped, and notification steps stay hidden until
    /// they complete.
    pub fn remaining(&self) -> (Option<Step>, Vec<Step>) {
        let mut ahead: Vec<Step> = self
            .vocabulary()
            .into_iter()
            .filter(|name| self.completion(*name).is_none())
            .map(Step::pending)
            .filter(|step| step.show())
            .collect();

        if ahead.is_empty() {
            return (None, Vec::new());
        }
        let next = ahead.remove(0);
        (Some(next), ahead)
    }

    /// Completed steps restricted to the active vocabulary, ordered by when
    /// they completed
    pub fn completed(&self) -> Vec<Step> {
        let vocabulary = self.vocabulary();
        let mut done: Vec<Step> = self
            .completed
            .iter()
            .filter(|c| vocabulary.contains(&c.name))
            .map(|c| Step::done(c.name, c.completed_at))
            .collect();
        done.sort_by_key(|step| step.completed_at);
        done
    }
}
