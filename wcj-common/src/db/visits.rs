//! Visit database operations

use sqlx::{Executor, Sqlite};

use super::models::Visit;
use crate::Result;

/// Record a visit to a goal and return its id
pub async fn create_visit<'e, E>(executor: E, goal_id: i64, visited_on: &str) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO visits (goal_id, visited_on) VALUES (?, ?)")
        .bind(goal_id)
        .bind(visited_on)
        .execute(executor)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Visits of one goal, oldest first
pub async fn list_visits_for_goal<'e, E>(executor: E, goal_id: i64) -> Result<Vec<Visit>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let visits = sqlx::query_as::<_, Visit>(
        "SELECT id, goal_id, visited_on FROM visits WHERE goal_id = ? ORDER BY id",
    )
    .bind(goal_id)
    .fetch_all(executor)
    .await?;

    Ok(visits)
}
