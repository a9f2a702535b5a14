//! Account registration: field rules, username availability and submission.

mod availability;
mod coordinator;
mod fields;
mod request;
mod validator;

pub use availability::{
    AvailabilityChecker, AvailabilitySnapshot, AvailabilityState, DEFAULT_QUIET_PERIOD,
};
pub use coordinator::{
    FieldVerdicts, INCOMPLETE_FORM_MESSAGE, REJECTED_FALLBACK_MESSAGE, RegistrationCoordinator,
    TRANSPORT_FAILURE_MESSAGE, can_submit,
};
pub use fields::{
    EmailAddress, FieldError, PASSWORD_MIN, Password, RegistrationField, RegistrationForm,
    USERNAME_MIN, UnknownField, Username, ValidationVerdict,
};
pub use request::RegistrationRequest;
pub use validator::FieldValidator;
