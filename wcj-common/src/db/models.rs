//! Database models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Canonical goal: one hikeable/visitable natural feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub parking_location_id: Option<i64>,
    pub feature_location_id: Option<i64>,
    pub rt_hike_distance: Option<String>,
    pub difficulty_rating: Option<String>,
    pub beauty_rating: Option<i64>,
    pub photo_rating: Option<i64>,
    pub solitude_rating: Option<i64>,
    pub hwnc_id: Option<i64>,
    pub cmc_hike_no: Option<i64>,
    pub book_page: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// The part of a goal the importer needs to reconcile against
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct GoalSummary {
    pub id: i64,
    pub feature_location_id: Option<i64>,
}

/// Rating and distance columns written by an import
///
/// `None` writes NULL: imported values replace stored ones wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GoalRatings {
    pub rt_hike_distance: Option<String>,
    pub beauty_rating: Option<i64>,
    pub photo_rating: Option<i64>,
    pub solitude_rating: Option<i64>,
}

/// Reference columns only the seed list carries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalDetails {
    pub difficulty_rating: Option<String>,
    pub hwnc_id: Option<i64>,
    pub cmc_hike_no: Option<i64>,
    pub book_page: Option<i64>,
}

/// Fields for inserting a goal
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub name: String,
    pub ratings: GoalRatings,
    pub details: GoalDetails,
    pub feature_location_id: Option<i64>,
}

/// Latitude/longitude pair linked to goals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

/// A recorded visit to a goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Visit {
    pub id: i64,
    pub goal_id: i64,
    /// Date as given by the source, not normalized
    pub visited_on: String,
}

/// Free-text note attached to a goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: i64,
    pub goal_id: i64,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

/// How goal names are compared when looking up an existing goal
///
/// Names are the only identity key. `Exact` is the default; `IgnoreAsciiCase`
/// uses SQLite's NOCASE collation. Neither trims whitespace or tolerates
/// spelling variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    #[default]
    Exact,
    IgnoreAsciiCase,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::IgnoreAsciiCase => "ignore-ascii-case",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(MatchStrategy::Exact),
            "ignore-ascii-case" => Ok(MatchStrategy::IgnoreAsciiCase),
            other => Err(Error::InvalidInput(format!(
                "unknown match strategy '{}' (expected 'exact' or 'ignore-ascii-case')",
                other
            ))),
        }
    }
}
