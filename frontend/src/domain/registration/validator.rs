//! Synchronous per-field validation.

use super::fields::{
    EmailAddress, FieldError, Password, RegistrationField, RegistrationForm, Username,
    ValidationVerdict,
};

/// Stateless rule evaluator for registration fields.
///
/// Validation is pure: the same field, value and context always yield the
/// same verdict. The context is the rest of the form, which only matters for
/// `confirmPassword`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldValidator;

impl FieldValidator {
    /// Validate `value` as the content of `field`.
    ///
    /// # Examples
    /// ```
    /// use frontend::domain::registration::{
    ///     FieldValidator, RegistrationField, RegistrationForm,
    /// };
    ///
    /// let context = RegistrationForm::default();
    /// let verdict = FieldValidator.validate(RegistrationField::Username, "abc123", &context);
    /// assert!(verdict.is_valid());
    /// ```
    #[must_use]
    pub fn validate(
        &self,
        field: RegistrationField,
        value: &str,
        context: &RegistrationForm,
    ) -> ValidationVerdict {
        match field {
            RegistrationField::Username => Username::new(value).into(),
            RegistrationField::Email => EmailAddress::new(value).into(),
            RegistrationField::Password => Password::new(value).into(),
            RegistrationField::ConfirmPassword => {
                if value == context.password() {
                    ValidationVerdict::Valid
                } else {
                    ValidationVerdict::Invalid(FieldError::PasswordMismatch)
                }
            }
        }
    }

    /// Validate the current value of `field` within `form`.
    #[must_use]
    pub fn validate_in(&self, field: RegistrationField, form: &RegistrationForm) -> ValidationVerdict {
        self.validate(field, form.value(field), form)
    }
}
