//! Shared integration test utilities

#![allow(dead_code)]

use anyhow::Result;
use sqlx::SqlitePool;
use std::io::Cursor;
use tempfile::TempDir;
use wcj_common::db::{
    create_goal, create_location, init_database, GoalDetails, GoalRatings, NewGoal,
};
use wcj_import::{
    BatchDriver, ImportError, ImportOptions, ImportReport, SeedImporter, SeedReport,
};

/// Create a temporary goal store
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let pool = init_database(&temp_dir.path().join("test_wcj.db")).await?;
    Ok((temp_dir, pool))
}

/// Insert a goal, optionally with an already linked location
pub async fn insert_goal(
    pool: &SqlitePool,
    name: &str,
    location: Option<(f64, f64)>,
) -> Result<i64> {
    let feature_location_id = match location {
        Some((latitude, longitude)) => Some(create_location(pool, latitude, longitude).await?),
        None => None,
    };
    let goal = NewGoal {
        name: name.to_string(),
        ratings: GoalRatings::default(),
        details: GoalDetails::default(),
        feature_location_id,
    };
    Ok(create_goal(pool, &goal).await?)
}

/// Run the importer over an in-memory JSON document
pub async fn run_import(
    pool: &SqlitePool,
    json: &str,
    options: ImportOptions,
) -> std::result::Result<ImportReport, ImportError> {
    let driver = BatchDriver::new(pool.clone(), options);
    driver
        .run(Cursor::new(json.as_bytes().to_vec()), "test-input")
        .await
}

/// Run the seed importer over an in-memory CSV document
pub async fn run_seed(
    pool: &SqlitePool,
    csv: &str,
    options: ImportOptions,
) -> std::result::Result<SeedReport, ImportError> {
    let importer = SeedImporter::new(pool.clone(), options);
    importer
        .run(Cursor::new(csv.as_bytes().to_vec()), "test-seed")
        .await
}
