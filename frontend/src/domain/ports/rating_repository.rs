//! Driven port for loading and persisting meal ratings.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::rating::{MealId, RatingId, RatingPayload, RatingRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by the rating collaborator.
    pub enum RatingRepositoryError {
        /// No rating exists under the given identifier.
        NotFound => "rating not found",
        /// The collaborator refused the rating.
        Rejected { message: String } => "rating rejected: {message}",
        /// Network or unexpected failure.
        Transport { message: String } => "rating request failed: {message}" [transient],
    }
}

/// Remote storage for meal ratings.
///
/// Creates are addressed by meal, updates by rating identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Existing rating for `meal`, if the signed-in user has one.
    async fn fetch_existing(
        &self,
        meal: &MealId,
    ) -> Result<Option<RatingRecord>, RatingRepositoryError>;

    /// Store a first rating for `meal`.
    async fn create_rating(
        &self,
        meal: &MealId,
        payload: &RatingPayload,
    ) -> Result<RatingRecord, RatingRepositoryError>;

    /// Replace the rating stored as `rating`.
    async fn update_rating(
        &self,
        rating: &RatingId,
        payload: &RatingPayload,
    ) -> Result<RatingRecord, RatingRepositoryError>;
}

/// In-memory rating store keyed by meal.
#[derive(Debug, Default)]
pub struct FixtureRatingRepository {
    ratings: Mutex<HashMap<MealId, RatingRecord>>,
}

impl FixtureRatingRepository {
    /// Store seeded with `records`; records without a meal are ignored.
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = RatingRecord>,
    {
        let ratings = records
            .into_iter()
            .filter_map(|record| record.meal_id.clone().map(|meal| (meal, record)))
            .collect();
        Self {
            ratings: Mutex::new(ratings),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, HashMap<MealId, RatingRecord>>, RatingRepositoryError> {
        self.ratings
            .lock()
            .map_err(|_| RatingRepositoryError::transport("rating store poisoned"))
    }
}

fn record_from(id: RatingId, meal: Option<MealId>, payload: &RatingPayload) -> RatingRecord {
    RatingRecord {
        id,
        meal_id: meal,
        meal_rating: payload.meal_rating(),
        dish_ratings: payload.dish_ratings().clone(),
        feedback: payload.feedback().to_owned(),
    }
}

#[async_trait]
impl RatingRepository for FixtureRatingRepository {
    async fn fetch_existing(
        &self,
        meal: &MealId,
    ) -> Result<Option<RatingRecord>, RatingRepositoryError> {
        Ok(self.store()?.get(meal).cloned())
    }

    async fn create_rating(
        &self,
        meal: &MealId,
        payload: &RatingPayload,
    ) -> Result<RatingRecord, RatingRepositoryError> {
        let mut store = self.store()?;
        if store.contains_key(meal) {
            return Err(RatingRepositoryError::rejected(
                "You have already rated this meal",
            ));
        }
        let id = RatingId::new(Uuid::new_v4().to_string())
            .map_err(|error| RatingRepositoryError::transport(error.to_string()))?;
        let record = record_from(id, Some(meal.clone()), payload);
        store.insert(meal.clone(), record.clone());
        Ok(record)
    }

    async fn update_rating(
        &self,
        rating: &RatingId,
        payload: &RatingPayload,
    ) -> Result<RatingRecord, RatingRepositoryError> {
        let mut store = self.store()?;
        let existing = store
            .values_mut()
            .find(|record| &record.id == rating)
            .ok_or_else(RatingRepositoryError::not_found)?;
        *existing = record_from(rating.clone(), existing.meal_id.clone(), payload);
        Ok(existing.clone())
    }
}
