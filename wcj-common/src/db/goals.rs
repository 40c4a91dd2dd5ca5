//! Goal database operations
//!
//! Every function takes a generic executor so callers can run it against the
//! pool directly or inside an open transaction (`&mut *tx`).

use sqlx::{Executor, Sqlite};

use super::models::{Goal, GoalRatings, GoalSummary, MatchStrategy, NewGoal};
use crate::{Error, Result};

/// Find an existing goal by name
///
/// With duplicate names the lowest id wins, so repeated runs resolve the same
/// goal.
pub async fn find_goal_by_name<'e, E>(
    executor: E,
    name: &str,
    strategy: MatchStrategy,
) -> Result<Option<GoalSummary>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = match strategy {
        MatchStrategy::Exact => {
            "SELECT id, feature_location_id FROM goals WHERE name = ? ORDER BY id LIMIT 1"
        }
        MatchStrategy::IgnoreAsciiCase => {
            "SELECT id, feature_location_id FROM goals \
             WHERE name = ? COLLATE NOCASE ORDER BY id LIMIT 1"
        }
    };

    let summary = sqlx::query_as::<_, GoalSummary>(sql)
        .bind(name)
        .fetch_optional(executor)
        .await?;

    Ok(summary)
}

/// Insert a goal, optionally already linked to its feature location
pub async fn create_goal<'e, E>(executor: E, goal: &NewGoal) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO goals (
            name, rt_hike_distance, difficulty_rating, beauty_rating, photo_rating,
            solitude_rating, hwnc_id, cmc_hike_no, book_page, feature_location_id,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(&goal.name)
    .bind(&goal.ratings.rt_hike_distance)
    .bind(&goal.details.difficulty_rating)
    .bind(goal.ratings.beauty_rating)
    .bind(goal.ratings.photo_rating)
    .bind(goal.ratings.solitude_rating)
    .bind(goal.details.hwnc_id)
    .bind(goal.details.cmc_hike_no)
    .bind(goal.details.book_page)
    .bind(goal.feature_location_id)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite the rating and distance columns of a goal
pub async fn update_goal_ratings<'e, E>(
    executor: E,
    goal_id: i64,
    ratings: &GoalRatings,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE goals
        SET rt_hike_distance = ?,
            beauty_rating = ?,
            photo_rating = ?,
            solitude_rating = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&ratings.rt_hike_distance)
    .bind(ratings.beauty_rating)
    .bind(ratings.photo_rating)
    .bind(ratings.solitude_rating)
    .bind(goal_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("goal {}", goal_id)));
    }

    Ok(())
}

/// Link a feature location to a goal that has none
///
/// Returns `false` when the goal already had a location (or does not exist);
/// an existing link is never replaced.
pub async fn set_goal_feature_location<'e, E>(
    executor: E,
    goal_id: i64,
    location_id: i64,
) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE goals
        SET feature_location_id = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ? AND feature_location_id IS NULL
        "#,
    )
    .bind(location_id)
    .bind(goal_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Load a full goal row
pub async fn get_goal<'e, E>(executor: E, goal_id: i64) -> Result<Option<Goal>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let goal = sqlx::query_as::<_, Goal>(
        r#"
        SELECT id, name, parking_location_id, feature_location_id, rt_hike_distance,
               difficulty_rating, beauty_rating, photo_rating, solitude_rating,
               hwnc_id, cmc_hike_no, book_page, created_at, updated_at
        FROM goals
        WHERE id = ?
        "#,
    )
    .bind(goal_id)
    .fetch_optional(executor)
    .await?;

    Ok(goal)
}

pub async fn count_goals<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM goals")
        .fetch_one(executor)
        .await?;
    Ok(count)
}
