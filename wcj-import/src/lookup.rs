//! Canonical lookup: resolve a feed name to an existing goal

use sqlx::SqliteConnection;
use wcj_common::db::{find_goal_by_name, GoalSummary, MatchStrategy};

use crate::error::{RecordError, StoreOperation};

/// Name-keyed lookup against the goal store
///
/// Names are the only identity key. Near-duplicates (case or whitespace
/// variants, spelling differences) are not reconciled; with the default
/// `Exact` strategy they surface as deferred records or, when flagged new, as
/// separate goals.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalLookup {
    strategy: MatchStrategy,
}

impl CanonicalLookup {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// `Ok(None)` when no goal matches; errors only on store failure
    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Option<GoalSummary>, RecordError> {
        find_goal_by_name(&mut *conn, name, self.strategy)
            .await
            .map_err(|e| RecordError::store(name, StoreOperation::Lookup, e))
    }
}
