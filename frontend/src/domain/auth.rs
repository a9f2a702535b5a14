//! Hand-off from a successful registration to the login page.
//!
//! Keep query-string parsing here so the login page only renders what
//! [`LoginPrefill`] hands back.

use url::form_urlencoded;

use super::registration::Username;

/// Banner shown on the login form right after a successful registration.
pub const JUST_REGISTERED_NOTICE: &str =
    "Registration successful! Please login with your credentials.";

/// What the login page should pre-fill when it is opened.
///
/// Registration hands one of these to the caller on success; the caller
/// navigates to the login page carrying [`LoginPrefill::to_query`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginPrefill {
    username: Option<String>,
    just_registered: bool,
}

impl LoginPrefill {
    /// Prefill produced by a successful registration.
    #[must_use]
    pub fn after_registration(username: &Username) -> Self {
        Self {
            username: Some(username.as_ref().to_owned()),
            just_registered: true,
        }
    }

    /// Username to place in the login form, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Whether the user arrived straight from registration.
    #[must_use]
    pub fn just_registered(&self) -> bool {
        self.just_registered
    }

    /// Success banner to display, if any.
    #[must_use]
    pub fn notice(&self) -> Option<&'static str> {
        self.just_registered.then_some(JUST_REGISTERED_NOTICE)
    }

    /// Encode as a URL query string, e.g. `username=diner777&registered=true`.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(username) = &self.username {
            query.append_pair("username", username);
        }
        if self.just_registered {
            query.append_pair("registered", "true");
        }
        query.finish()
    }

    /// Decode from a URL query string; unknown keys are ignored.
    ///
    /// A leading `?` is tolerated. Only the literal value `true` sets the
    /// registration flag.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let raw = query.strip_prefix('?').unwrap_or(query);
        let mut prefill = Self::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "username" if !value.is_empty() => prefill.username = Some(value.into_owned()),
                "registered" => prefill.just_registered = value == "true",
                _ => {}
            }
        }
        prefill
    }
}
