//! Rating session for one meal: load, edit, submit.
//!
//! The session moves through [`RatingState`]:
//!
//! ```text
//! Unloaded -> NotEligible
//! Unloaded -> Unrated -> Submitting -> Rated
//!                        Submitting -> Failed -> Unrated
//!                        Submitting -> Unrated        (call abandoned)
//! ```
//!
//! Whether a submission creates or updates is fixed when the meal is loaded
//! and never re-derived from the draft.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::ports::{RatingRepository, RatingRepositoryError};
use crate::domain::{Error, ErrorCode, Session, TraceId};

use super::eligibility::RatingEligibility;
use super::model::{
    DishId, RatingDraft, RatingDraftError, RatingId, RatingPayload, RatingRecord, RatingSubject,
};

/// Shown when an anonymous user tries to submit.
pub const LOGIN_REQUIRED_MESSAGE: &str = "You must be logged in to rate a meal";
/// Shown when a submission fails without a usable reason.
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit rating. Please try again.";
/// Shown when a finished session is submitted again.
pub const ALREADY_RATED_MESSAGE: &str = "This meal has already been rated";

/// How the next submission reaches the rating collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionMode {
    /// No rating existed at load time; create one for the meal.
    Create,
    /// Replace the rating found at load time.
    Update(RatingId),
}

/// Observable state of the rating session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RatingState {
    /// No meal loaded yet.
    #[default]
    Unloaded,
    /// The meal cannot be rated; show `notice` instead of the form.
    NotEligible {
        /// Explanation for the user.
        notice: String,
    },
    /// The form is editable. `error` holds the last inline error, if any.
    Unrated {
        /// Message from the last refused or failed submission.
        error: Option<String>,
    },
    /// A create or update call is in flight.
    Submitting,
    /// The last call failed; immediately followed by `Unrated`.
    Failed {
        /// Message shown to the user.
        message: String,
    },
    /// The collaborator confirmed the rating.
    Rated(RatingRecord),
}

impl RatingState {
    fn accepts_edits(&self) -> bool {
        matches!(self, Self::Unrated { .. })
    }
}

/// Marks the session `Submitting` for the duration of one remote call.
///
/// If the submission future is dropped before the call returns, the session
/// goes back to `Unrated` with the generic failure message and the draft
/// untouched.
struct InFlight<'a> {
    state: &'a watch::Sender<RatingState>,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a watch::Sender<RatingState>) -> Self {
        state.send_replace(RatingState::Submitting);
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!("rating submission abandoned before the collaborator answered");
        self.state.send_replace(RatingState::Unrated {
            error: Some(SUBMIT_FAILED_MESSAGE.to_owned()),
        });
    }
}

struct ActiveSubject {
    subject: RatingSubject,
    mode: SubmissionMode,
    draft: RatingDraft,
}

/// Drives the rating form for one meal at a time.
///
/// Loading another meal discards the previous draft. `submit` takes
/// `&mut self`, so a second submission cannot start while one is in flight.
pub struct RatingCoordinator<R> {
    repository: Arc<R>,
    session: Session,
    active: Option<ActiveSubject>,
    state: watch::Sender<RatingState>,
}

impl<R> RatingCoordinator<R>
where
    R: RatingRepository,
{
    /// Create a coordinator acting for `session`.
    pub fn new(repository: Arc<R>, session: Session) -> Self {
        let (state, _) = watch::channel(RatingState::Unloaded);
        Self {
            repository,
            session,
            active: None,
            state,
        }
    }

    /// Load `subject`, resolving any existing rating and the submission mode.
    ///
    /// A failed lookup counts as "no existing rating" and never prevents the
    /// form from showing. Anonymous sessions skip the lookup.
    pub async fn load_subject(&mut self, subject: RatingSubject) -> RatingState {
        let existing = self.lookup_existing(&subject).await;
        let eligibility = RatingEligibility.assess(&subject, existing.as_ref());

        let (mode, draft) = match existing {
            Some(record) => (
                SubmissionMode::Update(record.id.clone()),
                RatingDraft::from_record(&subject, &record),
            ),
            None => (SubmissionMode::Create, RatingDraft::for_subject(&subject)),
        };
        debug!(meal = %subject.id, ?mode, ?eligibility, "rating subject loaded");

        let state = match eligibility.notice() {
            Some(notice) => RatingState::NotEligible {
                notice: notice.to_owned(),
            },
            None => RatingState::Unrated { error: None },
        };
        self.active = Some(ActiveSubject {
            subject,
            mode,
            draft,
        });
        self.state.send_replace(state.clone());
        state
    }

    /// Submit the draft for the loaded meal.
    ///
    /// Refused locally, with no remote call, when nobody is signed in or the
    /// overall rating is unset. On a failed call the draft is kept and the
    /// state returns to `Unrated` carrying the error; the submission mode is
    /// unchanged, so a retry takes the same path. Dropping the returned
    /// future mid-call has the same effect as a failed call.
    pub async fn submit(&mut self) -> Result<RatingRecord, Error> {
        let trace_id = TraceId::generate();
        TraceId::scope(trace_id, self.submit_inner(trace_id)).await
    }

    async fn submit_inner(&self, trace_id: TraceId) -> Result<RatingRecord, Error> {
        let Some(active) = self.active.as_ref() else {
            return Err(Error::invalid_input(RatingDraftError::NoSubject.to_string()));
        };
        match self.current_state() {
            RatingState::Unrated { .. } => {}
            RatingState::Rated(_) => return Err(Error::invalid_input(ALREADY_RATED_MESSAGE)),
            RatingState::NotEligible { notice } => return Err(Error::invalid_input(notice)),
            other => {
                debug!(%trace_id, state = ?other, "rating submission ignored");
                return Err(Error::invalid_input(RatingDraftError::NotEditable.to_string()));
            }
        }
        if !self.session.is_authenticated() {
            return Err(self.refuse(Error::unauthenticated(LOGIN_REQUIRED_MESSAGE)));
        }
        let payload = RatingPayload::from_draft(&active.draft)
            .map_err(|error| self.refuse(Error::invalid_input(error.to_string())))?;

        let in_flight = InFlight::begin(&self.state);
        let meal = &active.subject.id;
        let outcome = match &active.mode {
            SubmissionMode::Create => self.repository.create_rating(meal, &payload).await,
            SubmissionMode::Update(rating) => {
                self.repository.update_rating(rating, &payload).await
            }
        };
        in_flight.settle();

        match outcome {
            Ok(record) => {
                info!(%trace_id, %meal, rating = %record.id, mode = ?active.mode, "rating saved");
                self.state.send_replace(RatingState::Rated(record.clone()));
                Ok(record)
            }
            Err(error) => {
                warn!(%trace_id, %meal, %error, mode = ?active.mode, "rating submission failed");
                let error = Self::map_failure(error);
                self.state.send_replace(RatingState::Failed {
                    message: error.message().to_owned(),
                });
                self.state.send_replace(RatingState::Unrated {
                    error: Some(error.message().to_owned()),
                });
                Err(error)
            }
        }
    }

    async fn lookup_existing(&self, subject: &RatingSubject) -> Option<RatingRecord> {
        if !self.session.is_authenticated() {
            return None;
        }
        match self.repository.fetch_existing(&subject.id).await {
            Ok(existing) => existing,
            Err(error) => {
                warn!(meal = %subject.id, %error, "existing rating lookup failed; starting fresh");
                None
            }
        }
    }

    fn map_failure(error: RatingRepositoryError) -> Error {
        if error.is_transient() {
            return Error::transport_failure(SUBMIT_FAILED_MESSAGE);
        }
        match error {
            RatingRepositoryError::Rejected { message } => {
                Error::try_new(ErrorCode::Rejected, message)
                    .unwrap_or_else(|_| Error::rejected(SUBMIT_FAILED_MESSAGE))
            }
            _ => Error::rejected(SUBMIT_FAILED_MESSAGE),
        }
    }
}

impl<R> RatingCoordinator<R> {
    /// Current state.
    #[must_use]
    pub fn current_state(&self) -> RatingState {
        self.state.borrow().clone()
    }

    /// Observe state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RatingState> {
        self.state.subscribe()
    }

    /// The loaded meal, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&RatingSubject> {
        self.active.as_ref().map(|active| &active.subject)
    }

    /// Submission mode fixed at load time.
    #[must_use]
    pub fn mode(&self) -> Option<&SubmissionMode> {
        self.active.as_ref().map(|active| &active.mode)
    }

    /// The in-progress draft.
    #[must_use]
    pub fn draft(&self) -> Option<&RatingDraft> {
        self.active.as_ref().map(|active| &active.draft)
    }

    /// Replace the overall score.
    pub fn set_meal_rating(&mut self, score: u8) -> Result<(), RatingDraftError> {
        self.editable_draft()?.set_meal_rating(score)
    }

    /// Replace the score of one dish.
    pub fn set_dish_rating(&mut self, dish: DishId, score: u8) -> Result<(), RatingDraftError> {
        self.editable_draft()?.set_dish_rating(dish, score)
    }

    /// Replace the feedback text.
    pub fn set_feedback(&mut self, feedback: impl Into<String>) -> Result<(), RatingDraftError> {
        self.editable_draft()?.set_feedback(feedback);
        Ok(())
    }

    fn editable_draft(&mut self) -> Result<&mut RatingDraft, RatingDraftError> {
        let editable = self.state.borrow().accepts_edits();
        let active = self.active.as_mut().ok_or(RatingDraftError::NoSubject)?;
        if !editable {
            return Err(RatingDraftError::NotEditable);
        }
        Ok(&mut active.draft)
    }

    /// Record a locally refused submission as an inline error.
    fn refuse(&self, error: Error) -> Error {
        self.state.send_replace(RatingState::Unrated {
            error: Some(error.message().to_owned()),
        });
        error
    }
}
