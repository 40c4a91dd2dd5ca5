//! Reconciliation policy
//!
//! The decision core. Given a decoded record and the lookup result for its
//! name, decide what the store should do and compute the exact mutation:
//!
//! | Existing goal | `is_explicitly_new` | Decision |
//! |---------------|---------------------|----------|
//! | none          | true                | `Create`, location first if coordinates are valid |
//! | none          | false               | `Defer`, no mutation, reported at run end |
//! | found         | any                 | `Update` ratings/distance, backfill missing location |
//!
//! An unflagged record without a match is never created: it may be a naming
//! mismatch with an existing goal, and the operator must confirm novelty.
//!
//! This module performs no I/O; [`crate::reconciler`] applies decisions.

use serde::Serialize;
use wcj_common::db::{GoalRatings, GoalSummary};

use crate::decoder::{GeoPoint, NormalizedRecord};

/// Record held back for operator review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredEntry {
    pub name: String,
    pub source_url: String,
}

/// What to do with one record
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Insert a new goal; create and link `location` in the same insert
    Create {
        name: String,
        ratings: GoalRatings,
        location: Option<GeoPoint>,
    },
    /// Overwrite ratings/distance; create and link `backfill` if set
    Update {
        goal_id: i64,
        ratings: GoalRatings,
        backfill: Option<GeoPoint>,
    },
    /// No mutation; report the record
    Defer(DeferredEntry),
}

pub fn decide(record: &NormalizedRecord, existing: Option<&GoalSummary>) -> Decision {
    match existing {
        Some(goal) => Decision::Update {
            goal_id: goal.id,
            ratings: record.ratings(),
            // Additive only: an existing link is never replaced or cleared
            backfill: match goal.feature_location_id {
                Some(_) => None,
                None => record.valid_point(),
            },
        },
        None if record.is_explicitly_new => Decision::Create {
            name: record.name.clone(),
            ratings: record.ratings(),
            location: record.valid_point(),
        },
        None => Decision::Defer(DeferredEntry {
            name: record.name.clone(),
            source_url: record.source_url.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Coordinates;

    const POINT: GeoPoint = GeoPoint { latitude: 35.1, longitude: -82.3 };

    fn record(name: &str, is_new: bool, coordinates: Option<Coordinates>) -> NormalizedRecord {
        NormalizedRecord {
            name: name.to_string(),
            beauty_rating: Some(4),
            photo_rating: None,
            solitude_rating: Some(2),
            distance: Some("1.50".to_string()),
            coordinates,
            is_explicitly_new: is_new,
            source_url: format!("https://example.org/{}", name),
            warnings: Vec::new(),
        }
    }

    fn expected_ratings() -> GoalRatings {
        GoalRatings {
            rt_hike_distance: Some("1.50".to_string()),
            beauty_rating: Some(4),
            photo_rating: None,
            solitude_rating: Some(2),
        }
    }

    #[test]
    fn test_flagged_new_without_match_creates_with_location() {
        let decision = decide(&record("New Falls", true, Some(Coordinates::Valid(POINT))), None);
        assert_eq!(
            decision,
            Decision::Create {
                name: "New Falls".to_string(),
                ratings: expected_ratings(),
                location: Some(POINT),
            }
        );
    }

    #[test]
    fn test_flagged_new_with_raw_gps_creates_without_location() {
        let decision = decide(
            &record("New Falls", true, Some(Coordinates::Raw("unknown".to_string()))),
            None,
        );
        assert!(matches!(decision, Decision::Create { location: None, .. }));
    }

    #[test]
    fn test_unflagged_without_match_defers() {
        let mystery = record("Mystery Falls", false, Some(Coordinates::Valid(POINT)));
        let decision = decide(&mystery, None);
        assert_eq!(
            decision,
            Decision::Defer(DeferredEntry {
                name: "Mystery Falls".to_string(),
                source_url: "https://example.org/Mystery Falls".to_string(),
            })
        );
    }

    #[test]
    fn test_match_without_location_backfills() {
        let existing = GoalSummary { id: 7, feature_location_id: None };
        let old = record("Old Falls", false, Some(Coordinates::Valid(POINT)));
        let decision = decide(&old, Some(&existing));
        assert_eq!(
            decision,
            Decision::Update {
                goal_id: 7,
                ratings: expected_ratings(),
                backfill: Some(POINT),
            }
        );
    }

    #[test]
    fn test_match_with_location_never_backfills() {
        let existing = GoalSummary { id: 7, feature_location_id: Some(3) };
        let old = record("Old Falls", false, Some(Coordinates::Valid(POINT)));
        let decision = decide(&old, Some(&existing));
        assert!(matches!(decision, Decision::Update { goal_id: 7, backfill: None, .. }));
    }

    #[test]
    fn test_match_ignores_new_flag() {
        // A flagged record that already exists is an update, not a duplicate
        let existing = GoalSummary { id: 9, feature_location_id: None };
        let decision = decide(&record("Old Falls", true, None), Some(&existing));
        assert!(matches!(decision, Decision::Update { goal_id: 9, backfill: None, .. }));
    }

    #[test]
    fn test_update_writes_absent_fields_as_null() {
        let mut sparse = record("Old Falls", false, None);
        sparse.beauty_rating = None;
        sparse.distance = None;
        let existing = GoalSummary { id: 1, feature_location_id: None };

        match decide(&sparse, Some(&existing)) {
            Decision::Update { ratings, .. } => {
                assert_eq!(ratings.beauty_rating, None);
                assert_eq!(ratings.rt_hike_distance, None);
                assert_eq!(ratings.solitude_rating, Some(2));
            }
            other => panic!("expected update, got {:?}", other),
        }
    }
}
