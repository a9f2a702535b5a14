//! Meal and dish ratings: eligibility, drafts and submission.

mod coordinator;
mod eligibility;
mod model;

pub use coordinator::{
    ALREADY_RATED_MESSAGE, LOGIN_REQUIRED_MESSAGE, RatingCoordinator, RatingState,
    SUBMIT_FAILED_MESSAGE, SubmissionMode,
};
pub use eligibility::{AWAITING_DELIVERY_NOTICE, Eligibility, RatingEligibility};
pub use model::{
    Dish, DishId, IdentifierValidationError, MAX_SCORE, MealId, RatingDraft, RatingDraftError,
    RatingId, RatingPayload, RatingRecord, RatingSubject, SubjectStatus, UNSET_SCORE,
};
