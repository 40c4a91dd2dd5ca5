//! Location database operations

use sqlx::{Executor, Sqlite};

use super::models::Location;
use crate::Result;

/// Insert a location and return its id
pub async fn create_location<'e, E>(executor: E, latitude: f64, longitude: f64) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("INSERT INTO locations (latitude, longitude) VALUES (?, ?)")
        .bind(latitude)
        .bind(longitude)
        .execute(executor)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_location<'e, E>(executor: E, location_id: i64) -> Result<Option<Location>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let location = sqlx::query_as::<_, Location>(
        "SELECT id, latitude, longitude FROM locations WHERE id = ?",
    )
    .bind(location_id)
    .fetch_optional(executor)
    .await?;

    Ok(location)
}

pub async fn count_locations<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
        .fetch_one(executor)
        .await?;
    Ok(count)
}
