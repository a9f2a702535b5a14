//! Driven port creating customer accounts.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::registration::RegistrationRequest;

use super::define_port_error;

define_port_error! {
    /// Errors raised by the account registration collaborator.
    pub enum AccountRegistrationError {
        /// The collaborator refused the request; `message` is shown verbatim.
        Rejected { message: String } => "registration rejected: {message}",
        /// Network or unexpected failure.
        Transport { message: String } => "registration request failed: {message}" [transient],
    }
}

/// Remote account creation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRegistration: Send + Sync {
    /// Create the account described by `request`.
    async fn register_account(
        &self,
        request: &RegistrationRequest,
    ) -> Result<(), AccountRegistrationError>;
}

/// In-memory registration that refuses a fixed set of email addresses.
#[derive(Debug, Clone, Default)]
pub struct FixtureAccountRegistration {
    registered_emails: HashSet<String>,
}

impl FixtureAccountRegistration {
    /// Treat every address in `emails` as already in use.
    pub fn with_registered_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registered_emails: emails.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl AccountRegistration for FixtureAccountRegistration {
    async fn register_account(
        &self,
        request: &RegistrationRequest,
    ) -> Result<(), AccountRegistrationError> {
        if self.registered_emails.contains(request.email().as_ref()) {
            return Err(AccountRegistrationError::rejected(
                "Email is already registered",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::registration::RegistrationForm;
    use rstest::rstest;

    fn request(email: &str) -> RegistrationRequest {
        let form = RegistrationForm::new("diner777", email, "Abcdefg1", "Abcdefg1");
        RegistrationRequest::try_from_form(&form).expect("valid form")
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_rejects_known_email() {
        let port = FixtureAccountRegistration::with_registered_emails(["used@example.com"]);

        let err = port
            .register_account(&request("used@example.com"))
            .await
            .expect_err("duplicate email");
        assert_eq!(
            err,
            AccountRegistrationError::rejected("Email is already registered")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_accepts_new_email() {
        let port = FixtureAccountRegistration::default();
        port.register_account(&request("new@example.com"))
            .await
            .expect("registration succeeds");
    }
}
