//! Scripted walk through registration and rating against in-memory adapters.
//!
//! Useful for eyeballing the log stream the coordinators emit:
//! `RUST_LOG=debug cargo run -p frontend`.

use std::env;
use std::sync::Arc;

use color_eyre::eyre::{Result, eyre};
use ortho_config::OrthoConfig;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use frontend::config::ClientSettings;
use frontend::domain::ports::{
    FixtureAccountRegistration, FixtureRatingRepository, FixtureUsernameAvailability,
};
use frontend::domain::rating::{DishId, RatingCoordinator, RatingSubject};
use frontend::domain::registration::{RegistrationCoordinator, RegistrationField};
use frontend::domain::{LoginPrefill, Session, SessionUser, UserId};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ClientSettings::load_from_iter(env::args_os())
        .map_err(|err| eyre!("failed to load client settings: {err}"))?;

    let prefill = register(&settings).await?;
    info!(query = %prefill.to_query(), "redirecting to login");

    let username = prefill
        .username()
        .ok_or_else(|| eyre!("registration did not return a username"))?;
    let session = Session::signed_in(SessionUser {
        id: UserId::new(format!("demo-{username}"))?,
        username: username.to_owned(),
    });
    rate(session).await
}

async fn register(settings: &ClientSettings) -> Result<LoginPrefill> {
    let availability = Arc::new(FixtureUsernameAvailability::with_taken(["foodie123"]));
    let registration = Arc::new(FixtureAccountRegistration::with_registered_emails([
        "taken@example.com",
    ]));
    let mut coordinator = RegistrationCoordinator::new(
        availability,
        registration,
        settings.availability_quiet_period(),
    );

    for (field, value) in [
        (RegistrationField::Username, "foodie"),
        (RegistrationField::Username, "foodie123"),
        (RegistrationField::Email, "diner@example.com"),
        (RegistrationField::Password, "Abcdefg1"),
        (RegistrationField::ConfirmPassword, "Abcdefg1"),
    ] {
        let verdict = coordinator.update_field(field, value);
        info!(%field, valid = verdict.is_valid(), message = ?verdict.message(), "field edited");
    }
    coordinator.settle_availability().await;
    info!(
        availability = ?coordinator.availability(),
        can_submit = coordinator.can_submit(),
        "username checked"
    );

    if let Err(error) = coordinator.submit().await {
        info!(code = ?error.code(), message = error.message(), "registration refused");
    }

    coordinator.update_field(RegistrationField::Username, "foodie777");
    coordinator.settle_availability().await;
    Ok(coordinator.submit().await?)
}

async fn rate(session: Session) -> Result<()> {
    let subject: RatingSubject = serde_json::from_value(json!({
        "id": "order-1042",
        "status": "DELIVERED",
        "dishes": [
            { "id": "dish-7", "name": "Suya platter" },
            { "id": "dish-9", "name": "Puff-puff" }
        ]
    }))?;
    let repository = Arc::new(FixtureRatingRepository::default());
    let mut coordinator = RatingCoordinator::new(repository, session);

    let state = coordinator.load_subject(subject).await;
    info!(?state, mode = ?coordinator.mode(), "rating form ready");

    coordinator.set_meal_rating(4)?;
    coordinator.set_dish_rating(DishId::new("dish-7")?, 5)?;
    coordinator.set_feedback("Arrived hot")?;
    let record = coordinator.submit().await?;
    info!(rating = %record.id, meal_rating = record.meal_rating, "meal rated");
    Ok(())
}
