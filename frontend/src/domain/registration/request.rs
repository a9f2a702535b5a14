//! Registration request sent to the account collaborator.

use serde::Serialize;

use super::fields::{
    EmailAddress, FieldError, Password, RegistrationField, RegistrationForm, Username,
};

/// Fully validated registration payload.
///
/// ## Invariants
/// - every field passed its format rules;
/// - `confirm_password` equals `password`.
///
/// Serialises as `{username, email, password, confirmPassword}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "RegistrationRequestDto")]
pub struct RegistrationRequest {
    username: Username,
    email: EmailAddress,
    password: Password,
    confirm_password: Password,
}

impl RegistrationRequest {
    /// Build a request from the form, failing on the first invalid field.
    ///
    /// Fields are checked in form order.
    pub fn try_from_form(
        form: &RegistrationForm,
    ) -> Result<Self, (RegistrationField, FieldError)> {
        let username = Username::new(form.username())
            .map_err(|error| (RegistrationField::Username, error))?;
        let email = EmailAddress::new(form.value(RegistrationField::Email))
            .map_err(|error| (RegistrationField::Email, error))?;
        let password =
            Password::new(form.password()).map_err(|error| (RegistrationField::Password, error))?;
        let confirmation = form.value(RegistrationField::ConfirmPassword);
        if confirmation != password.expose() {
            return Err((
                RegistrationField::ConfirmPassword,
                FieldError::PasswordMismatch,
            ));
        }
        let confirm_password = password.clone();

        Ok(Self {
            username,
            email,
            password,
            confirm_password,
        })
    }

    /// Requested username.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Contact email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Chosen password.
    pub fn password(&self) -> &Password {
        &self.password
    }

    /// Password confirmation, identical to [`Self::password`].
    pub fn confirm_password(&self) -> &Password {
        &self.confirm_password
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationRequestDto {
    username: String,
    email: String,
    password: String,
    confirm_password: String,
}

impl From<RegistrationRequest> for RegistrationRequestDto {
    fn from(value: RegistrationRequest) -> Self {
        Self {
            password: value.password.expose().to_owned(),
            confirm_password: value.confirm_password.expose().to_owned(),
            username: value.username.into(),
            email: value.email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn serialises_with_camel_case_keys() {
        let form = RegistrationForm::new("diner777", "d@example.com", "Abcdefg1", "Abcdefg1");
        let request = RegistrationRequest::try_from_form(&form).expect("valid form");

        let value = serde_json::to_value(&request).expect("serialise");
        assert_eq!(
            value,
            json!({
                "username": "diner777",
                "email": "d@example.com",
                "password": "Abcdefg1",
                "confirmPassword": "Abcdefg1",
            })
        );
    }

    #[rstest]
    #[case(
        RegistrationForm::new("diner", "d@example.com", "Abcdefg1", "Abcdefg1"),
        RegistrationField::Username
    )]
    #[case(
        RegistrationForm::new("diner777", "d@example", "Abcdefg1", "Abcdefg1"),
        RegistrationField::Email
    )]
    #[case(
        RegistrationForm::new("diner777", "d@example.com", "abcdefg1", "abcdefg1"),
        RegistrationField::Password
    )]
    #[case(
        RegistrationForm::new("diner777", "d@example.com", "Abcdefg1", "Abcdefg2"),
        RegistrationField::ConfirmPassword
    )]
    fn reports_first_invalid_field(
        #[case] form: RegistrationForm,
        #[case] expected: RegistrationField,
    ) {
        let (field, _) = RegistrationRequest::try_from_form(&form).expect_err("invalid form");
        assert_eq!(field, expected);
    }
}
