//! Driven ports for the remote collaborators the core talks to.

mod macros;
pub(crate) use macros::define_port_error;

mod account_registration;
mod rating_repository;
mod username_availability;

#[cfg(test)]
pub use account_registration::MockAccountRegistration;
pub use account_registration::{
    AccountRegistration, AccountRegistrationError, FixtureAccountRegistration,
};
#[cfg(test)]
pub use rating_repository::MockRatingRepository;
pub use rating_repository::{FixtureRatingRepository, RatingRepository, RatingRepositoryError};
#[cfg(test)]
pub use username_availability::MockUsernameAvailability;
pub use username_availability::{
    AvailabilityCheckError, FixtureUsernameAvailability, UsernameAvailability,
};
