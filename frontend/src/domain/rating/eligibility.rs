//! Whether a meal may be rated right now.

use super::model::{RatingRecord, RatingSubject};

/// Shown in place of the rating form for meals that cannot be rated yet.
pub const AWAITING_DELIVERY_NOTICE: &str = "You can rate this meal after it has been delivered.";

/// Outcome of an eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The rating form may be shown.
    Eligible,
    /// The meal has not reached a rateable status and was never rated.
    AwaitingDelivery,
}

impl Eligibility {
    /// Whether the form may be shown.
    #[must_use]
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }

    /// Explanation to render instead of the form.
    #[must_use]
    pub fn notice(self) -> Option<&'static str> {
        match self {
            Self::Eligible => None,
            Self::AwaitingDelivery => Some(AWAITING_DELIVERY_NOTICE),
        }
    }
}

/// Gatekeeper for the rating form.
///
/// A meal is rateable once delivered, completed or rated. An existing rating
/// always keeps it rateable so the user can revise it whatever the status
/// says later.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingEligibility;

impl RatingEligibility {
    /// Classify `subject` given any rating already stored for it.
    #[must_use]
    pub fn assess(&self, subject: &RatingSubject, existing: Option<&RatingRecord>) -> Eligibility {
        if existing.is_some() || subject.status.permits_rating() {
            Eligibility::Eligible
        } else {
            Eligibility::AwaitingDelivery
        }
    }

    /// Whether `subject` may be rated.
    #[must_use]
    pub fn is_rateable(&self, subject: &RatingSubject, existing: Option<&RatingRecord>) -> bool {
        self.assess(subject, existing).is_eligible()
    }
}
