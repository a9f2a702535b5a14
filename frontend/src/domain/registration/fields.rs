//! Registration form fields and their validated value types.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 6;
/// Minimum allowed length for a password.
pub const PASSWORD_MIN: usize = 8;

/// Reason a field value was refused.
///
/// The `Display` text is the message shown next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Username is shorter than [`USERNAME_MIN`] characters.
    #[error("Username must be at least {min} characters long")]
    UsernameTooShort {
        /// Required minimum length.
        min: usize,
    },
    /// Username contains something other than ASCII letters and digits.
    #[error("Username must contain only letters and numbers")]
    UsernameInvalidCharacters,
    /// Username lacks a letter or a digit.
    #[error("Username must contain both letters and numbers")]
    UsernameNeedsLetterAndDigit,
    /// The availability check reported the username as taken.
    #[error("This username is already taken")]
    UsernameTaken,
    /// Email does not look like `local@domain.tld`.
    #[error("Please enter a valid email address")]
    EmailMalformed,
    /// Password is shorter than [`PASSWORD_MIN`] characters.
    #[error("Password must be at least {min} characters long")]
    PasswordTooShort {
        /// Required minimum length.
        min: usize,
    },
    /// Password has no lowercase letter.
    #[error("Password must contain at least one lowercase letter")]
    PasswordMissingLowercase,
    /// Password has no uppercase letter.
    #[error("Password must contain at least one uppercase letter")]
    PasswordMissingUppercase,
    /// Password has no digit.
    #[error("Password must contain at least one digit")]
    PasswordMissingDigit,
    /// Confirmation does not equal the current password.
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Outcome of validating a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationVerdict {
    /// The value satisfies every rule for its field.
    Valid,
    /// The value failed the first rule listed for its field.
    Invalid(FieldError),
}

impl ValidationVerdict {
    /// Whether the value was accepted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<FieldError> {
        match self {
            Self::Valid => None,
            Self::Invalid(error) => Some(*error),
        }
    }

    /// Message to render next to the field, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.error().map(|error| error.to_string())
    }
}

impl<T> From<Result<T, FieldError>> for ValidationVerdict {
    fn from(value: Result<T, FieldError>) -> Self {
        match value {
            Ok(_) => Self::Valid,
            Err(error) => Self::Invalid(error),
        }
    }
}

/// Names of the registration form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationField {
    /// `username`
    Username,
    /// `email`
    Email,
    /// `password`
    Password,
    /// `confirmPassword`
    ConfirmPassword,
}

impl RegistrationField {
    /// Every field, in form order.
    pub const ALL: [Self; 4] = [
        Self::Username,
        Self::Email,
        Self::Password,
        Self::ConfirmPassword,
    ];

    /// Wire name of the field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirmPassword",
        }
    }
}

impl fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a field name is not part of the registration form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown registration field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for RegistrationField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_owned()))
    }
}

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length and letter/digit mix are checked separately.
        Regex::new("^[A-Za-z0-9]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Deliberately loose: a shape check, not RFC 5322.
        Regex::new(r"\S+@\S+\.\S+")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Username that satisfies the format rules.
///
/// ## Invariants
/// - at least [`USERNAME_MIN`] characters;
/// - ASCII letters and digits only;
/// - contains at least one letter and at least one digit.
///
/// Availability is a separate, asynchronous concern; a `Username` may still
/// be taken.
///
/// # Examples
/// ```
/// use frontend::domain::registration::{FieldError, Username};
///
/// assert!(Username::new("abc123").is_ok());
/// assert_eq!(
///     Username::new("abcdef").unwrap_err(),
///     FieldError::UsernameNeedsLetterAndDigit,
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(username: impl Into<String>) -> Result<Self, FieldError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, FieldError> {
        // Length is in Unicode scalar values, so "😀😀😀" is too short
        // rather than malformed.
        if username.chars().count() < USERNAME_MIN {
            return Err(FieldError::UsernameTooShort { min: USERNAME_MIN });
        }
        if !username_regex().is_match(&username) {
            return Err(FieldError::UsernameInvalidCharacters);
        }
        let has_letter = username.chars().any(|c| c.is_ascii_alphabetic());
        let has_digit = username.chars().any(|c| c.is_ascii_digit());
        if !(has_letter && has_digit) {
            return Err(FieldError::UsernameNeedsLetterAndDigit);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Email address with a plausible `local@domain.tld` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    pub fn new(email: impl Into<String>) -> Result<Self, FieldError> {
        let email = email.into();
        if email_regex().is_match(&email) {
            Ok(Self(email))
        } else {
            Err(FieldError::EmailMalformed)
        }
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Password that satisfies the strength rules.
///
/// The secret is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate and construct a [`Password`].
    ///
    /// Rules are checked in order and the first failure is returned: length,
    /// lowercase letter, uppercase letter, digit.
    pub fn new(password: &str) -> Result<Self, FieldError> {
        // Unicode scalar values, as for usernames.
        if password.chars().count() < PASSWORD_MIN {
            return Err(FieldError::PasswordTooShort { min: PASSWORD_MIN });
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(FieldError::PasswordMissingLowercase);
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(FieldError::PasswordMissingUppercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(FieldError::PasswordMissingDigit);
        }
        Ok(Self(Zeroizing::new(password.to_owned())))
    }

    /// Expose the secret for the outbound request.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Raw values currently typed into the registration form.
///
/// Values are kept exactly as typed; validation never rewrites them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    username: String,
    email: String,
    password: Zeroizing<String>,
    confirm_password: Zeroizing<String>,
}

impl RegistrationForm {
    /// Build a form from its four values.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: Zeroizing::new(password.into()),
            confirm_password: Zeroizing::new(confirm_password.into()),
        }
    }

    /// Current value of `field`.
    #[must_use]
    pub fn value(&self, field: RegistrationField) -> &str {
        match field {
            RegistrationField::Username => self.username.as_str(),
            RegistrationField::Email => self.email.as_str(),
            RegistrationField::Password => self.password.as_str(),
            RegistrationField::ConfirmPassword => self.confirm_password.as_str(),
        }
    }

    /// Replace the value of `field`.
    pub fn set(&mut self, field: RegistrationField, value: impl Into<String>) {
        let value = value.into();
        match field {
            RegistrationField::Username => self.username = value,
            RegistrationField::Email => self.email = value,
            RegistrationField::Password => self.password = Zeroizing::new(value),
            RegistrationField::ConfirmPassword => self.confirm_password = Zeroizing::new(value),
        }
    }

    /// Current username value.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Current password value; the context `confirmPassword` is checked against.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .field("confirm_password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Rule ordering and message coverage for the field value types.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("a1")]
    #[case("ab 1!")]
    #[case("ä1ö2ü")]
    fn short_usernames_report_length_first(#[case] raw: &str) {
        assert_eq!(
            Username::new(raw).expect_err("too short"),
            FieldError::UsernameTooShort { min: USERNAME_MIN }
        );
    }

    #[rstest]
    #[case("abc 123", FieldError::UsernameInvalidCharacters)]
    #[case("abc_123", FieldError::UsernameInvalidCharacters)]
    #[case("abcdef", FieldError::UsernameNeedsLetterAndDigit)]
    #[case("123456", FieldError::UsernameNeedsLetterAndDigit)]
    fn invalid_usernames(#[case] raw: &str, #[case] expected: FieldError) {
        assert_eq!(Username::new(raw).expect_err("invalid"), expected);
    }

    #[rstest]
    #[case("abc123")]
    #[case("User2024")]
    fn valid_usernames(#[case] raw: &str) {
        let username = Username::new(raw).expect("valid");
        assert_eq!(username.as_ref(), raw);
    }

    #[rstest]
    #[case("a@b.co", true)]
    #[case("first.last@example.org", true)]
    #[case("no-at-sign.com", false)]
    #[case("user@nodot", false)]
    #[case("@example.com", false)]
    #[case("", false)]
    fn email_shape(#[case] raw: &str, #[case] accepted: bool) {
        assert_eq!(EmailAddress::new(raw).is_ok(), accepted);
    }

    #[rstest]
    #[case("Ab1", FieldError::PasswordTooShort { min: PASSWORD_MIN })]
    #[case("ABCDEFG1", FieldError::PasswordMissingLowercase)]
    #[case("abcdefg1", FieldError::PasswordMissingUppercase)]
    #[case("Abcdefgh", FieldError::PasswordMissingDigit)]
    fn invalid_passwords(#[case] raw: &str, #[case] expected: FieldError) {
        assert_eq!(Password::new(raw).expect_err("invalid"), expected);
    }

    #[rstest]
    fn valid_password_is_redacted_in_debug() {
        let password = Password::new("Abcdefg1").expect("valid");
        assert_eq!(password.expose(), "Abcdefg1");
        assert_eq!(format!("{password:?}"), "Password(***)");
    }

    #[rstest]
    fn messages_match_the_form_copy() {
        assert_eq!(
            FieldError::UsernameTooShort { min: 6 }.to_string(),
            "Username must be at least 6 characters long"
        );
        assert_eq!(
            FieldError::UsernameTaken.to_string(),
            "This username is already taken"
        );
        assert_eq!(
            FieldError::PasswordTooShort { min: 8 }.to_string(),
            "Password must be at least 8 characters long"
        );
    }

    #[rstest]
    fn field_names_round_trip_through_from_str() {
        for field in RegistrationField::ALL {
            assert_eq!(field.as_str().parse::<RegistrationField>(), Ok(field));
        }
        assert!("nickname".parse::<RegistrationField>().is_err());
    }

    #[rstest]
    fn form_debug_hides_passwords() {
        let form = RegistrationForm::new("abc123", "a@b.co", "Secret123", "Secret123");
        let rendered = format!("{form:?}");
        assert!(!rendered.contains("Secret123"));
        assert!(rendered.contains("abc123"));
    }
}
