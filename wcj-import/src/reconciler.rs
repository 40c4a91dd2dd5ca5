//! Applies reconciliation decisions to the goal store
//!
//! Each record runs in its own transaction: lookup, decide, mutate, then
//! commit. Any failure drops the transaction, which rolls back everything the
//! record wrote, so a failed goal insert never leaves an orphaned location.
//! Records already committed earlier in the run stay committed.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use wcj_common::db::{
    create_goal, create_location, set_goal_feature_location, update_goal_ratings, GoalDetails,
    GoalRatings, NewGoal,
};

use crate::decoder::{GeoPoint, NormalizedRecord};
use crate::error::{RecordError, StoreOperation};
use crate::lookup::CanonicalLookup;
use crate::policy::{self, Decision, DeferredEntry};

/// Terminal state of a successfully handled record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Created {
        goal_id: i64,
        location_id: Option<i64>,
    },
    Updated {
        goal_id: i64,
        /// Location created by backfill, if any
        location_id: Option<i64>,
    },
    Deferred(DeferredEntry),
}

impl RecordOutcome {
    pub fn created_location(&self) -> bool {
        matches!(
            self,
            RecordOutcome::Created { location_id: Some(_), .. }
                | RecordOutcome::Updated { location_id: Some(_), .. }
        )
    }
}

/// Per-record transactional applier
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    lookup: CanonicalLookup,
    dry_run: bool,
}

impl Reconciler {
    /// `dry_run` rolls every record back after computing its outcome
    pub fn new(lookup: CanonicalLookup, dry_run: bool) -> Self {
        Self { lookup, dry_run }
    }

    pub fn lookup(&self) -> &CanonicalLookup {
        &self.lookup
    }

    pub async fn reconcile(
        &self,
        pool: &SqlitePool,
        record: &NormalizedRecord,
    ) -> Result<RecordOutcome, RecordError> {
        let name = record.name.as_str();
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| RecordError::store(name, StoreOperation::BeginTransaction, e))?;

        let existing = self.lookup.find(&mut tx, name).await?;

        if let Some(raw) = record.raw_coordinates() {
            warn!(name, raw, "Invalid GPS data, location left for manual correction");
        }

        let outcome = match policy::decide(record, existing.as_ref()) {
            Decision::Create {
                name,
                ratings,
                location,
            } => apply_create(&mut tx, name, ratings, location).await?,
            Decision::Update {
                goal_id,
                ratings,
                backfill,
            } => apply_update(&mut tx, name, goal_id, &ratings, backfill).await?,
            Decision::Defer(entry) => {
                debug!(name, "No existing goal and not flagged new, deferring");
                RecordOutcome::Deferred(entry)
            }
        };

        if self.dry_run {
            tx.rollback()
                .await
                .map_err(|e| RecordError::store(name, StoreOperation::Rollback, e))?;
        } else {
            tx.commit()
                .await
                .map_err(|e| RecordError::store(name, StoreOperation::Commit, e))?;
        }

        Ok(outcome)
    }
}

/// Location first, then the goal already linked to it
async fn apply_create(
    conn: &mut SqliteConnection,
    name: String,
    ratings: GoalRatings,
    location: Option<GeoPoint>,
) -> Result<RecordOutcome, RecordError> {
    let location_id = match location {
        Some(point) => Some(
            create_location(&mut *conn, point.latitude, point.longitude)
                .await
                .map_err(|e| RecordError::store(&name, StoreOperation::CreateLocation, e))?,
        ),
        None => None,
    };

    let goal = NewGoal {
        name,
        ratings,
        details: GoalDetails::default(),
        feature_location_id: location_id,
    };
    let goal_id = create_goal(&mut *conn, &goal)
        .await
        .map_err(|e| RecordError::store(&goal.name, StoreOperation::CreateGoal, e))?;

    info!(name = %goal.name, goal_id, location_id = ?location_id, "Added new goal");

    Ok(RecordOutcome::Created {
        goal_id,
        location_id,
    })
}

async fn apply_update(
    conn: &mut SqliteConnection,
    name: &str,
    goal_id: i64,
    ratings: &GoalRatings,
    backfill: Option<GeoPoint>,
) -> Result<RecordOutcome, RecordError> {
    update_goal_ratings(&mut *conn, goal_id, ratings)
        .await
        .map_err(|e| RecordError::store(name, StoreOperation::UpdateRatings, e))?;

    let location_id = match backfill {
        Some(point) => Some(backfill_location(conn, name, goal_id, point).await?),
        None => None,
    };

    info!(name, goal_id, backfilled_location = ?location_id, "Updated existing goal");

    Ok(RecordOutcome::Updated {
        goal_id,
        location_id,
    })
}

/// Create a location and link it to a goal that has none
async fn backfill_location(
    conn: &mut SqliteConnection,
    name: &str,
    goal_id: i64,
    point: GeoPoint,
) -> Result<i64, RecordError> {
    let location_id = create_location(&mut *conn, point.latitude, point.longitude)
        .await
        .map_err(|e| RecordError::store(name, StoreOperation::CreateLocation, e))?;

    let linked = set_goal_feature_location(&mut *conn, goal_id, location_id)
        .await
        .map_err(|e| RecordError::store(name, StoreOperation::LinkLocation, e))?;

    // Lookup and link share one transaction, so this only trips if the goal
    // vanished or gained a location underneath us
    if !linked {
        return Err(RecordError::store(
            name,
            StoreOperation::LinkLocation,
            wcj_common::Error::NotFound(format!("goal {} without a feature location", goal_id)),
        ));
    }

    info!(name, goal_id, location_id, "Backfilled feature location");

    Ok(location_id)
}
