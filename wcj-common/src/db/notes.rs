//! Note database operations

use sqlx::{Executor, Sqlite};

use super::models::Note;
use crate::Result;

/// Attach a note to a goal and return its id
pub async fn create_note<'e, E>(executor: E, goal_id: i64, text: &str) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO notes (goal_id, text, created_at, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(goal_id)
    .bind(text)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn list_notes_for_goal<'e, E>(executor: E, goal_id: i64) -> Result<Vec<Note>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let notes = sqlx::query_as::<_, Note>(
        r#"
        SELECT id, goal_id, text, created_at, updated_at
        FROM notes
        WHERE goal_id = ?
        ORDER BY id
        "#,
    )
    .bind(goal_id)
    .fetch_all(executor)
    .await?;

    Ok(notes)
}
