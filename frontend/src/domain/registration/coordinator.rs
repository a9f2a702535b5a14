//! Registration session: field verdicts, submit readiness and submission.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::domain::auth::LoginPrefill;
use crate::domain::ports::{AccountRegistration, AccountRegistrationError, UsernameAvailability};
use crate::domain::{Error, ErrorCode, TraceId};

use super::availability::{AvailabilityChecker, AvailabilitySnapshot, AvailabilityState};
use super::fields::{FieldError, RegistrationField, RegistrationForm, ValidationVerdict};
use super::request::RegistrationRequest;
use super::validator::FieldValidator;

/// Shown when submission is attempted with invalid fields.
pub const INCOMPLETE_FORM_MESSAGE: &str = "Please correct the highlighted fields";
/// Shown for a rejection that carried no reason.
pub const REJECTED_FALLBACK_MESSAGE: &str = "Registration failed";
/// Shown when the registration call failed unexpectedly.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Verdict for every registration field, derived from one form snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldVerdicts {
    /// `username` verdict, including the availability overlay.
    pub username: ValidationVerdict,
    /// `email` verdict.
    pub email: ValidationVerdict,
    /// `password` verdict.
    pub password: ValidationVerdict,
    /// `confirmPassword` verdict against the current password.
    pub confirm_password: ValidationVerdict,
}

impl FieldVerdicts {
    /// Evaluate every field of `form`, marking the username as taken when
    /// `availability` says so.
    #[must_use]
    pub fn evaluate(form: &RegistrationForm, availability: AvailabilityState) -> Self {
        let validator = FieldValidator;
        let mut username = validator.validate_in(RegistrationField::Username, form);
        if username.is_valid() && availability.blocks_submission() {
            username = ValidationVerdict::Invalid(FieldError::UsernameTaken);
        }
        Self {
            username,
            email: validator.validate_in(RegistrationField::Email, form),
            password: validator.validate_in(RegistrationField::Password, form),
            confirm_password: validator.validate_in(RegistrationField::ConfirmPassword, form),
        }
    }

    /// Verdict for one field.
    #[must_use]
    pub fn get(&self, field: RegistrationField) -> ValidationVerdict {
        match field {
            RegistrationField::Username => self.username,
            RegistrationField::Email => self.email,
            RegistrationField::Password => self.password,
            RegistrationField::ConfirmPassword => self.confirm_password,
        }
    }

    /// Whether every field is valid.
    #[must_use]
    pub fn all_valid(&self) -> bool {
        RegistrationField::ALL
            .into_iter()
            .all(|field| self.get(field).is_valid())
    }

    /// Messages keyed by wire field name, for invalid fields only.
    #[must_use]
    pub fn messages(&self) -> Map<String, Value> {
        RegistrationField::ALL
            .into_iter()
            .filter_map(|field| {
                self.get(field)
                    .message()
                    .map(|message| (field.as_str().to_owned(), Value::String(message)))
            })
            .collect()
    }
}

/// Whether a form may be submitted given the latest availability state.
///
/// True iff every field is valid and the username is not known to be taken.
/// A failed availability check does not block.
#[must_use]
pub fn can_submit(form: &RegistrationForm, availability: AvailabilityState) -> bool {
    FieldVerdicts::evaluate(form, availability).all_valid()
}

/// Drives one registration form from first keystroke to submission.
///
/// `submit` takes `&mut self`, so a second submission cannot start while one
/// is awaiting the collaborator.
pub struct RegistrationCoordinator<A, R> {
    form: RegistrationForm,
    availability: AvailabilityChecker<A>,
    registration: Arc<R>,
}

impl<A, R> RegistrationCoordinator<A, R>
where
    A: UsernameAvailability + 'static,
    R: AccountRegistration,
{
    /// Start an empty registration session.
    pub fn new(availability: Arc<A>, registration: Arc<R>, quiet_period: Duration) -> Self {
        Self {
            form: RegistrationForm::default(),
            availability: AvailabilityChecker::new(availability, quiet_period),
            registration,
        }
    }

    /// Store a new value for `field` and return its fresh verdict.
    ///
    /// Username changes also schedule a debounced availability check.
    pub fn update_field(
        &mut self,
        field: RegistrationField,
        value: impl Into<String>,
    ) -> ValidationVerdict {
        self.form.set(field, value);
        if field == RegistrationField::Username {
            self.availability.on_username_changed(self.form.username());
        }
        self.verdict(field)
    }

    /// Current verdict for `field`, derived from the latest snapshot.
    #[must_use]
    pub fn verdict(&self, field: RegistrationField) -> ValidationVerdict {
        self.verdicts().get(field)
    }

    /// Current verdicts for every field.
    #[must_use]
    pub fn verdicts(&self) -> FieldVerdicts {
        FieldVerdicts::evaluate(&self.form, self.current_availability())
    }

    /// Availability of the username currently in the form.
    #[must_use]
    pub fn availability(&self) -> AvailabilityState {
        self.current_availability()
    }

    /// Whether the form may be submitted right now.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        can_submit(&self.form, self.current_availability())
    }

    /// Form values as currently typed.
    #[must_use]
    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    /// Wait for any pending availability check to finish.
    pub async fn settle_availability(&mut self) {
        self.availability.settle().await;
    }

    /// Submit the form.
    ///
    /// Readiness is re-derived from the latest snapshot first; an invalid
    /// form is refused locally with per-field messages in the error details
    /// and no remote call is made. On success the caller should navigate to
    /// the login page using the returned [`LoginPrefill`].
    pub async fn submit(&mut self) -> Result<LoginPrefill, Error> {
        let trace_id = TraceId::generate();
        TraceId::scope(trace_id, self.submit_inner(trace_id)).await
    }

    async fn submit_inner(&self, trace_id: TraceId) -> Result<LoginPrefill, Error> {
        let verdicts = self.verdicts();
        if !verdicts.all_valid() {
            debug!(%trace_id, "registration blocked by field validation");
            return Err(Self::incomplete(&verdicts));
        }
        let request = RegistrationRequest::try_from_form(&self.form).map_err(|(field, error)| {
            debug!(%trace_id, %field, %error, "registration request could not be built");
            Self::incomplete(&verdicts)
        })?;

        match self.registration.register_account(&request).await {
            Ok(()) => {
                info!(%trace_id, username = %request.username(), "account registered");
                Ok(LoginPrefill::after_registration(request.username()))
            }
            Err(AccountRegistrationError::Rejected { message }) => {
                debug!(%trace_id, %message, "registration rejected");
                Err(Error::try_new(ErrorCode::Rejected, message)
                    .unwrap_or_else(|_| Error::rejected(REJECTED_FALLBACK_MESSAGE)))
            }
            Err(error @ AccountRegistrationError::Transport { .. }) => {
                warn!(%trace_id, %error, "registration request failed");
                Err(Error::transport_failure(TRANSPORT_FAILURE_MESSAGE))
            }
        }
    }

    fn incomplete(verdicts: &FieldVerdicts) -> Error {
        Error::invalid_input(INCOMPLETE_FORM_MESSAGE).with_details(Value::Object(verdicts.messages()))
    }
}

impl<A, R> RegistrationCoordinator<A, R> {
    fn current_availability(&self) -> AvailabilityState {
        let AvailabilitySnapshot {
            username, state, ..
        } = self.availability_snapshot();
        if username == self.form.username() {
            state
        } else {
            AvailabilityState::Unknown
        }
    }

    fn availability_snapshot(&self) -> AvailabilitySnapshot {
        self.availability.snapshot()
    }
}

#[cfg(test)]
mod tests {
    //! Submit readiness and outcome mapping.
    use super::*;
    use crate::domain::ports::{MockAccountRegistration, MockUsernameAvailability};
    use crate::domain::registration::DEFAULT_QUIET_PERIOD;
    use rstest::rstest;
    use serde_json::json;

    type Coordinator = RegistrationCoordinator<MockUsernameAvailability, MockAccountRegistration>;

    fn coordinator(
        availability: MockUsernameAvailability,
        registration: MockAccountRegistration,
    ) -> Coordinator {
        RegistrationCoordinator::new(
            Arc::new(availability),
            Arc::new(registration),
            DEFAULT_QUIET_PERIOD,
        )
    }

    fn available(answer: bool) -> MockUsernameAvailability {
        let mut mock = MockUsernameAvailability::new();
        mock.expect_check_username_available()
            .returning(move |_| Ok(answer));
        mock
    }

    fn fill(coordinator: &mut Coordinator) {
        coordinator.update_field(RegistrationField::Username, "diner777");
        coordinator.update_field(RegistrationField::Email, "diner@example.com");
        coordinator.update_field(RegistrationField::Password, "Abcdefg1");
        coordinator.update_field(RegistrationField::ConfirmPassword, "Abcdefg1");
    }

    #[rstest]
    #[case(AvailabilityState::Unknown, true)]
    #[case(AvailabilityState::Checking, true)]
    #[case(AvailabilityState::Available, true)]
    #[case(AvailabilityState::CheckFailed, true)]
    #[case(AvailabilityState::Taken, false)]
    fn only_taken_blocks_a_valid_form(#[case] state: AvailabilityState, #[case] expected: bool) {
        let form = RegistrationForm::new("diner777", "diner@example.com", "Abcdefg1", "Abcdefg1");
        assert_eq!(can_submit(&form, state), expected);
    }

    #[rstest]
    fn any_invalid_field_blocks() {
        let form = RegistrationForm::new("diner777", "diner@example", "Abcdefg1", "Abcdefg1");
        assert!(!can_submit(&form, AvailabilityState::Available));
    }

    #[rstest]
    fn taken_overlays_only_a_format_valid_username() {
        let form = RegistrationForm::new("diner", "", "", "");
        let verdicts = FieldVerdicts::evaluate(&form, AvailabilityState::Taken);
        assert_eq!(
            verdicts.username.error(),
            Some(FieldError::UsernameTooShort { min: 6 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn password_change_invalidates_an_earlier_confirmation() {
        let mut coordinator = coordinator(available(true), MockAccountRegistration::new());
        fill(&mut coordinator);
        assert!(coordinator.verdict(RegistrationField::ConfirmPassword).is_valid());

        let verdict = coordinator.update_field(RegistrationField::Password, "Zyxwvut9");
        assert!(verdict.is_valid());
        assert_eq!(
            coordinator.verdict(RegistrationField::ConfirmPassword),
            ValidationVerdict::Invalid(FieldError::PasswordMismatch)
        );
        assert!(!coordinator.can_submit());
    }

    #[tokio::test(start_paused = true)]
    async fn taken_username_blocks_submission_without_remote_call() {
        let mut registration = MockAccountRegistration::new();
        registration.expect_register_account().times(0);
        let mut coordinator = coordinator(available(false), registration);
        fill(&mut coordinator);
        coordinator.settle_availability().await;

        assert_eq!(
            coordinator.verdict(RegistrationField::Username).message().as_deref(),
            Some("This username is already taken")
        );
        let err = coordinator.submit().await.expect_err("blocked");
        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert_eq!(
            err.details(),
            Some(&json!({ "username": "This username is already taken" }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn editing_the_username_clears_a_stale_taken_verdict() {
        let mut coordinator = coordinator(available(false), MockAccountRegistration::new());
        fill(&mut coordinator);
        coordinator.settle_availability().await;
        assert_eq!(coordinator.availability(), AvailabilityState::Taken);

        coordinator.update_field(RegistrationField::Username, "diner778");
        assert_eq!(coordinator.availability(), AvailabilityState::Unknown);
        assert!(coordinator.can_submit());
    }

    #[tokio::test(start_paused = true)]
    async fn successful_submission_returns_login_prefill() {
        let mut registration = MockAccountRegistration::new();
        registration
            .expect_register_account()
            .withf(|request: &RegistrationRequest| {
                request.username().as_ref() == "diner777"
                    && request.email().as_ref() == "diner@example.com"
            })
            .times(1)
            .returning(|_| Ok(()));
        let mut coordinator = coordinator(available(true), registration);
        fill(&mut coordinator);
        coordinator.settle_availability().await;

        let prefill = coordinator.submit().await.expect("registered");
        assert_eq!(prefill.username(), Some("diner777"));
        assert!(prefill.just_registered());
    }

    #[rstest]
    #[case(
        AccountRegistrationError::rejected("Email is already registered"),
        ErrorCode::Rejected,
        "Email is already registered"
    )]
    #[case(
        AccountRegistrationError::rejected("  "),
        ErrorCode::Rejected,
        REJECTED_FALLBACK_MESSAGE
    )]
    #[case(
        AccountRegistrationError::transport("503 from gateway"),
        ErrorCode::TransportFailure,
        TRANSPORT_FAILURE_MESSAGE
    )]
    #[tokio::test(start_paused = true)]
    async fn remote_failures_map_to_distinct_errors(
        #[case] failure: AccountRegistrationError,
        #[case] code: ErrorCode,
        #[case] message: &str,
    ) {
        let mut registration = MockAccountRegistration::new();
        registration
            .expect_register_account()
            .times(1)
            .return_once(move |_| Err(failure));
        let mut coordinator = coordinator(available(true), registration);
        fill(&mut coordinator);

        let err = coordinator.submit().await.expect_err("failure");
        assert_eq!(err.code(), code);
        assert_eq!(err.message(), message);
    }
}
