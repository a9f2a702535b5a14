//! Rating subjects, drafts and persisted rating records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest score a star rating can carry.
pub const MAX_SCORE: u8 = 5;
/// Score meaning "no selection yet".
pub const UNSET_SCORE: u8 = 0;

/// Validation errors returned by identifier constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierValidationError {
    /// Identifier was empty.
    #[error("identifier must not be empty")]
    Empty,
    /// Identifier had leading or trailing whitespace.
    #[error("identifier must not contain surrounding whitespace")]
    SurroundingWhitespace,
}

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Validate and construct a [`", stringify!($name), "`].")]
            pub fn new(id: impl Into<String>) -> Result<Self, IdentifierValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(IdentifierValidationError::Empty);
                }
                if id.trim() != id {
                    return Err(IdentifierValidationError::SurroundingWhitespace);
                }
                Ok(Self(id))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_ref())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

string_identifier! {
    /// Identifier of an order/meal that can be rated.
    MealId
}

string_identifier! {
    /// Identifier of a dish within a meal.
    DishId
}

string_identifier! {
    /// Identifier of a persisted rating, distinct from the meal it rates.
    RatingId
}

/// Lifecycle status of an order/meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectStatus {
    /// Order received.
    Placed,
    /// Kitchen is preparing the meal.
    Preparing,
    /// Meal reached the customer.
    Delivered,
    /// Order closed.
    Completed,
    /// Customer has rated the meal.
    Rated,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl SubjectStatus {
    /// Whether the status alone allows rating.
    #[must_use]
    pub fn permits_rating(self) -> bool {
        matches!(self, Self::Delivered | Self::Completed | Self::Rated)
    }
}

/// A dish that can be rated individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    /// Dish identifier.
    pub id: DishId,
    /// Display name.
    pub name: String,
}

/// An order/meal offered for rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubject {
    /// Meal identifier; create requests are addressed by it.
    pub id: MealId,
    /// Current lifecycle status.
    pub status: SubjectStatus,
    /// Constituent dishes, in display order.
    #[serde(default)]
    pub dishes: Vec<Dish>,
}

/// A rating as stored by the rating collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    /// Rating identifier; update requests are addressed by it.
    pub id: RatingId,
    /// Meal the rating belongs to, when the collaborator reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<MealId>,
    /// Overall score, `0` when absent.
    #[serde(default)]
    pub meal_rating: u8,
    /// Per-dish scores.
    #[serde(default)]
    pub dish_ratings: BTreeMap<DishId, u8>,
    /// Free-text feedback.
    #[serde(default)]
    pub feedback: String,
}

/// Errors raised while editing or finalising a draft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingDraftError {
    /// Score above [`MAX_SCORE`].
    #[error("rating must be between 0 and {max}, got {score}")]
    ScoreOutOfRange {
        /// Rejected score.
        score: u8,
        /// Highest allowed score.
        max: u8,
    },
    /// The overall rating has not been chosen.
    #[error("Please provide an overall rating for the meal")]
    MissingMealRating,
    /// No subject is loaded.
    #[error("no meal is loaded for rating")]
    NoSubject,
    /// The draft is not editable in the current state.
    #[error("this rating can no longer be edited")]
    NotEditable,
}

fn check_score(score: u8) -> Result<u8, RatingDraftError> {
    if score > MAX_SCORE {
        return Err(RatingDraftError::ScoreOutOfRange {
            score,
            max: MAX_SCORE,
        });
    }
    Ok(score)
}

/// In-progress rating for one subject.
///
/// `0` means "not selected" for both the overall and the per-dish scores.
/// Setting one value never touches the others.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RatingDraft {
    meal_rating: u8,
    dish_ratings: BTreeMap<DishId, u8>,
    feedback: String,
}

impl RatingDraft {
    /// Empty draft listing every dish of `subject` as unset.
    #[must_use]
    pub fn for_subject(subject: &RatingSubject) -> Self {
        Self {
            meal_rating: UNSET_SCORE,
            dish_ratings: subject
                .dishes
                .iter()
                .map(|dish| (dish.id.clone(), UNSET_SCORE))
                .collect(),
            feedback: String::new(),
        }
    }

    /// Draft pre-populated from an existing rating.
    ///
    /// Dishes of `subject` missing from the record are listed as unset.
    #[must_use]
    pub fn from_record(subject: &RatingSubject, record: &RatingRecord) -> Self {
        let mut draft = Self::for_subject(subject);
        draft.meal_rating = record.meal_rating.min(MAX_SCORE);
        for (dish, score) in &record.dish_ratings {
            draft.dish_ratings.insert(dish.clone(), (*score).min(MAX_SCORE));
        }
        draft.feedback.clone_from(&record.feedback);
        draft
    }

    /// Overall score, `0` when unset.
    #[must_use]
    pub fn meal_rating(&self) -> u8 {
        self.meal_rating
    }

    /// Score for `dish`, `0` when unset.
    #[must_use]
    pub fn dish_rating(&self, dish: &DishId) -> u8 {
        self.dish_ratings.get(dish).copied().unwrap_or(UNSET_SCORE)
    }

    /// Every per-dish entry, including unset ones.
    #[must_use]
    pub fn dish_ratings(&self) -> &BTreeMap<DishId, u8> {
        &self.dish_ratings
    }

    /// Feedback text.
    #[must_use]
    pub fn feedback(&self) -> &str {
        self.feedback.as_str()
    }

    /// Replace the overall score.
    pub fn set_meal_rating(&mut self, score: u8) -> Result<(), RatingDraftError> {
        self.meal_rating = check_score(score)?;
        Ok(())
    }

    /// Replace the score of one dish; `0` clears it.
    pub fn set_dish_rating(&mut self, dish: DishId, score: u8) -> Result<(), RatingDraftError> {
        self.dish_ratings.insert(dish, check_score(score)?);
        Ok(())
    }

    /// Replace the feedback text.
    pub fn set_feedback(&mut self, feedback: impl Into<String>) {
        self.feedback = feedback.into();
    }
}

/// Body of a create or update request.
///
/// ## Invariants
/// - `meal_rating` is between 1 and [`MAX_SCORE`];
/// - `dish_ratings` holds only selected dishes (score > 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingPayload {
    meal_rating: u8,
    dish_ratings: BTreeMap<DishId, u8>,
    feedback: String,
}

impl RatingPayload {
    /// Build the payload, dropping unselected dishes.
    pub fn from_draft(draft: &RatingDraft) -> Result<Self, RatingDraftError> {
        if draft.meal_rating == UNSET_SCORE {
            return Err(RatingDraftError::MissingMealRating);
        }
        let meal_rating = check_score(draft.meal_rating)?;
        let dish_ratings = draft
            .dish_ratings
            .iter()
            .filter(|(_, score)| **score > UNSET_SCORE)
            .map(|(dish, score)| (dish.clone(), *score))
            .collect();
        Ok(Self {
            meal_rating,
            dish_ratings,
            feedback: draft.feedback.clone(),
        })
    }

    /// Overall score.
    #[must_use]
    pub fn meal_rating(&self) -> u8 {
        self.meal_rating
    }

    /// Selected per-dish scores.
    #[must_use]
    pub fn dish_ratings(&self) -> &BTreeMap<DishId, u8> {
        &self.dish_ratings
    }

    /// Feedback text.
    #[must_use]
    pub fn feedback(&self) -> &str {
        self.feedback.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn dish(id: &str) -> DishId {
        DishId::new(id).expect("valid dish id")
    }

    #[fixture]
    fn subject() -> RatingSubject {
        RatingSubject {
            id: MealId::new("m1").expect("valid meal id"),
            status: SubjectStatus::Delivered,
            dishes: vec![
                Dish {
                    id: dish("d1"),
                    name: "Lentil soup".into(),
                },
                Dish {
                    id: dish("d2"),
                    name: "Flatbread".into(),
                },
            ],
        }
    }

    #[rstest]
    fn unselected_dishes_are_absent_from_the_payload(subject: RatingSubject) {
        let mut draft = RatingDraft::for_subject(&subject);
        draft.set_meal_rating(4).expect("in range");
        draft.set_dish_rating(dish("d1"), 5).expect("in range");

        let payload = RatingPayload::from_draft(&draft).expect("payload");
        assert_eq!(
            serde_json::to_value(&payload).expect("serialise"),
            json!({ "mealRating": 4, "dishRatings": { "d1": 5 }, "feedback": "" })
        );
    }

    #[rstest]
    fn missing_overall_rating_is_refused(subject: RatingSubject) {
        let draft = RatingDraft::for_subject(&subject);
        assert_eq!(
            RatingPayload::from_draft(&draft),
            Err(RatingDraftError::MissingMealRating)
        );
    }

    #[rstest]
    fn setters_leave_siblings_alone(subject: RatingSubject) {
        let mut draft = RatingDraft::for_subject(&subject);
        draft.set_feedback("More chilli please");
        draft.set_dish_rating(dish("d2"), 3).expect("in range");
        draft.set_meal_rating(5).expect("in range");
        draft.set_dish_rating(dish("d1"), 2).expect("in range");

        assert_eq!(draft.meal_rating(), 5);
        assert_eq!(draft.dish_rating(&dish("d2")), 3);
        assert_eq!(draft.dish_rating(&dish("d1")), 2);
        assert_eq!(draft.feedback(), "More chilli please");
    }

    #[rstest]
    #[case(6)]
    #[case(u8::MAX)]
    fn scores_above_five_are_refused(subject: RatingSubject, #[case] score: u8) {
        let mut draft = RatingDraft::for_subject(&subject);
        assert_eq!(
            draft.set_meal_rating(score),
            Err(RatingDraftError::ScoreOutOfRange { score, max: 5 })
        );
        assert_eq!(draft.meal_rating(), 0);
    }

    #[rstest]
    fn record_prefills_draft_and_keeps_unrated_dishes(subject: RatingSubject) {
        let record: RatingRecord = serde_json::from_value(json!({
            "id": "r9",
            "mealRating": 3,
            "dishRatings": { "d2": 4 },
        }))
        .expect("record");

        let draft = RatingDraft::from_record(&subject, &record);
        assert_eq!(draft.meal_rating(), 3);
        assert_eq!(draft.dish_rating(&dish("d2")), 4);
        assert_eq!(draft.dish_rating(&dish("d1")), 0);
        assert_eq!(draft.feedback(), "");
    }

    #[rstest]
    #[case("\"DELIVERED\"", SubjectStatus::Delivered, true)]
    #[case("\"COMPLETED\"", SubjectStatus::Completed, true)]
    #[case("\"RATED\"", SubjectStatus::Rated, true)]
    #[case("\"PLACED\"", SubjectStatus::Placed, false)]
    #[case("\"PREPARING\"", SubjectStatus::Preparing, false)]
    #[case("\"OUT_FOR_DELIVERY\"", SubjectStatus::Unknown, false)]
    fn statuses_deserialise(
        #[case] raw: &str,
        #[case] expected: SubjectStatus,
        #[case] rateable: bool,
    ) {
        let status: SubjectStatus = serde_json::from_str(raw).expect("status");
        assert_eq!(status, expected);
        assert_eq!(status.permits_rating(), rateable);
    }

    #[rstest]
    #[case("")]
    #[case(" m1")]
    fn identifiers_reject_blank_or_padded_input(#[case] raw: &str) {
        assert!(MealId::new(raw).is_err());
    }
}
