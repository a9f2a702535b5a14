//! Driven port asking whether a username is still free.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::registration::Username;

use super::define_port_error;

define_port_error! {
    /// Errors raised while checking username availability.
    pub enum AvailabilityCheckError {
        /// The check could not be completed.
        Transport { message: String }
            => "username availability check failed: {message}" [transient],
    }
}

/// Remote uniqueness check for usernames.
///
/// The call is idempotent. Callers debounce it so that at most one request is
/// made per settled input.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsernameAvailability: Send + Sync {
    /// Return `true` when no account uses `username` yet.
    async fn check_username_available(
        &self,
        username: &Username,
    ) -> Result<bool, AvailabilityCheckError>;
}

/// In-memory availability check backed by a fixed set of taken names.
#[derive(Debug, Clone, Default)]
pub struct FixtureUsernameAvailability {
    taken: HashSet<String>,
}

impl FixtureUsernameAvailability {
    /// Treat every name in `taken` as already registered.
    pub fn with_taken<I, S>(taken: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: taken.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl UsernameAvailability for FixtureUsernameAvailability {
    async fn check_username_available(
        &self,
        username: &Username,
    ) -> Result<bool, AvailabilityCheckError> {
        Ok(!self.taken.contains(username.as_ref()))
    }
}
