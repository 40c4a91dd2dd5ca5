//! Seed list import
//!
//! The seed list is a personal CSV log used to populate an empty store: a
//! header row, then one row per goal with the date it was visited, free-form
//! notes, ratings and guidebook references. Columns are addressed by position.
//!
//! Every row runs in its own transaction. The goal, its visit and its note are
//! written together or not at all. A row whose name already names a goal is
//! skipped, so seeding the same file twice changes nothing.

use csv::StringRecord;
use sqlx::SqlitePool;
use std::io::Read;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wcj_common::db::{create_goal, create_note, create_visit, GoalDetails, GoalRatings, NewGoal};

use crate::decoder::{integer_field, trimmed_text, FieldWarning};
use crate::driver::{payload_excerpt, ImportOptions};
use crate::error::{DecodeError, ImportError, RecordError, StoreOperation};
use crate::lookup::CanonicalLookup;
use crate::report::{SeedReport, SeedTally};

/// Zero-based column positions
mod column {
    pub const NAME: usize = 0;
    pub const VISITED_ON: usize = 1;
    pub const NOTES: usize = 2;
    pub const DISTANCE: usize = 6;
    pub const DIFFICULTY: usize = 7;
    pub const BEAUTY: usize = 8;
    pub const PHOTO: usize = 9;
    pub const SOLITUDE: usize = 10;
    pub const HWNC_ID: usize = 11;
    pub const CMC_HIKE_NO: usize = 14;
    pub const BOOK_PAGE: usize = 15;
}

const NOT_A_RATING: &str = "not an integer rating";
const NOT_AN_INTEGER: &str = "not an integer";

/// One decoded seed row
#[derive(Debug, Clone, PartialEq)]
pub struct SeedRow {
    pub name: String,
    pub visited_on: Option<String>,
    pub notes: Option<String>,
    pub ratings: GoalRatings,
    pub details: GoalDetails,
    pub warnings: Vec<FieldWarning>,
}

impl SeedRow {
    /// Decode a row with the feed's field rules
    ///
    /// Cells are trimmed and blank cells are absent. Missing trailing columns
    /// are absent too. Only a blank name fails the row.
    pub fn from_record(record: &StringRecord) -> Result<Self, DecodeError> {
        let name = record
            .get(column::NAME)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| DecodeError::MissingName {
                key: "name".to_string(),
            })?
            .to_string();

        let cell = |index: usize| record.get(index).and_then(trimmed_text);
        let mut warnings = Vec::new();
        let mut integer = |field: &str, index: usize, message: &'static str| {
            integer_field(field, cell(index), message, &mut warnings)
        };

        let ratings = GoalRatings {
            rt_hike_distance: cell(column::DISTANCE),
            beauty_rating: integer("beauty_rating", column::BEAUTY, NOT_A_RATING),
            photo_rating: integer("photo_rating", column::PHOTO, NOT_A_RATING),
            solitude_rating: integer("solitude_rating", column::SOLITUDE, NOT_A_RATING),
        };
        let details = GoalDetails {
            difficulty_rating: cell(column::DIFFICULTY),
            hwnc_id: integer("hwnc_id", column::HWNC_ID, NOT_AN_INTEGER),
            cmc_hike_no: integer("cmc_hike_no", column::CMC_HIKE_NO, NOT_AN_INTEGER),
            book_page: integer("book_page", column::BOOK_PAGE, NOT_AN_INTEGER),
        };

        for warning in &warnings {
            warn!(name = %name, "Ignoring unparseable column: {}", warning);
        }

        Ok(Self {
            name,
            visited_on: cell(column::VISITED_ON),
            notes: cell(column::NOTES),
            ratings,
            details,
            warnings,
        })
    }
}

/// Terminal state of a successfully handled seed row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created {
        goal_id: i64,
        visit_id: Option<i64>,
        note_id: Option<i64>,
    },
    /// A goal with this name was already present; nothing was written
    Existing { goal_id: i64 },
}

type RowResult = csv::Result<StringRecord>;

fn read_rows<R: Read>(input: R, tx: mpsc::Sender<RowResult>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    for row in reader.records() {
        let stop = matches!(&row, Err(e) if e.is_io_error());
        if tx.blocking_send(row).is_err() || stop {
            break;
        }
    }
}

/// Read CSV rows on the blocking pool, in file order
///
/// The header row is consumed and never sent. An I/O error is the last item
/// sent; malformed rows are sent as errors and reading continues.
pub fn spawn_row_reader<R>(
    input: R,
    capacity: usize,
) -> (mpsc::Receiver<RowResult>, JoinHandle<()>)
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::task::spawn_blocking(move || read_rows(input, tx));
    (rx, handle)
}

pub struct SeedImporter {
    pool: SqlitePool,
    lookup: CanonicalLookup,
    dry_run: bool,
    channel_capacity: usize,
}

impl SeedImporter {
    /// Uses the match strategy, dry-run flag and channel capacity of `options`
    pub fn new(pool: SqlitePool, options: ImportOptions) -> Self {
        Self {
            pool,
            lookup: CanonicalLookup::new(options.match_strategy),
            dry_run: options.dry_run,
            channel_capacity: options.channel_capacity,
        }
    }

    /// Seed the store from every row of `input`
    pub async fn run<R>(&self, input: R, input_name: &str) -> Result<SeedReport, ImportError>
    where
        R: Read + Send + 'static,
    {
        info!(
            input = input_name,
            match_strategy = %self.lookup.strategy(),
            dry_run = self.dry_run,
            "Starting seed import"
        );

        let (mut rows, reader) = spawn_row_reader(input, self.channel_capacity);
        let mut tally = SeedTally::new();

        while let Some(row) = rows.recv().await {
            tally.record_row();
            let record = match row {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    return Err(ImportError::Io {
                        input: input_name.to_string(),
                        source: e.into(),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable row");
                    tally.record_failure();
                    continue;
                }
            };
            let line = record.position().map_or(0, |p| p.line());

            match self.import_row(&record, &mut tally).await {
                Ok(outcome) => tally.record_outcome(outcome),
                Err(RecordError::Decode(e)) => {
                    let text = record.iter().collect::<Vec<_>>().join(",");
                    warn!(
                        line,
                        error = %e,
                        row = %payload_excerpt(&text),
                        "Skipping undecodable row"
                    );
                    tally.record_failure();
                }
                Err(RecordError::Store {
                    name,
                    operation,
                    source,
                }) if source.is_connection() => {
                    error!(line, name = %name, operation = %operation, "Store connection lost");
                    return Err(ImportError::StoreConnection {
                        resource: format!("{} for `{}`", operation, name),
                        source,
                    });
                }
                Err(e) => {
                    error!(line, error = %e, "Row failed, skipping");
                    tally.record_failure();
                }
            }
        }

        reader
            .await
            .map_err(|e| ImportError::Internal(format!("Seed reader task failed: {}", e)))?;

        let report = tally.finish(self.dry_run);
        let counts = &report.counts;
        info!(
            rows = counts.rows,
            created = counts.created,
            existing = counts.existing,
            failed = counts.failed,
            visits_created = counts.visits_created,
            notes_created = counts.notes_created,
            "Seed import complete"
        );

        Ok(report)
    }

    async fn import_row(
        &self,
        record: &StringRecord,
        tally: &mut SeedTally,
    ) -> Result<SeedOutcome, RecordError> {
        let row = SeedRow::from_record(record)?;
        tally.record_warnings(row.warnings.len());
        self.apply(&row).await
    }

    /// Goal, visit and note in one transaction
    pub async fn apply(&self, row: &SeedRow) -> Result<SeedOutcome, RecordError> {
        let name = row.name.as_str();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RecordError::store(name, StoreOperation::BeginTransaction, e))?;

        if let Some(existing) = self.lookup.find(&mut tx, name).await? {
            debug!(name, goal_id = existing.id, "Goal already present, skipping row");
            return Ok(SeedOutcome::Existing {
                goal_id: existing.id,
            });
        }

        let goal = NewGoal {
            name: row.name.clone(),
            ratings: row.ratings.clone(),
            details: row.details.clone(),
            feature_location_id: None,
        };
        let goal_id = create_goal(&mut *tx, &goal)
            .await
            .map_err(|e| RecordError::store(name, StoreOperation::CreateGoal, e))?;

        let visit_id = match &row.visited_on {
            Some(visited_on) => Some(
                create_visit(&mut *tx, goal_id, visited_on)
                    .await
                    .map_err(|e| RecordError::store(name, StoreOperation::CreateVisit, e))?,
            ),
            None => None,
        };

        let note_id = match &row.notes {
            Some(text) => Some(
                create_note(&mut *tx, goal_id, text)
                    .await
                    .map_err(|e| RecordError::store(name, StoreOperation::CreateNote, e))?,
            ),
            None => None,
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

        info!(name, goal_id, visit_id = ?visit_id, note_id = ?note_id, "Seeded goal");

        Ok(SeedOutcome::Created {
            goal_id,
            visit_id,
            note_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn row(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    #[test]
    fn test_full_row_decodes_by_position() {
        let record = row(&[
            "Looking Glass Falls",
            "2023-06-04",
            "Crowded at noon",
            "",
            "",
            "",
            "0.2",
            "easy",
            "4",
            "5",
            "1",
            "42",
            "",
            "",
            "17",
            "88",
        ]);

        let decoded = SeedRow::from_record(&record).unwrap();
        assert_eq!(decoded.name, "Looking Glass Falls");
        assert_eq!(decoded.visited_on.as_deref(), Some("2023-06-04"));
        assert_eq!(decoded.notes.as_deref(), Some("Crowded at noon"));
        assert_eq!(
            decoded.ratings,
            GoalRatings {
                rt_hike_distance: Some("0.2".to_string()),
                beauty_rating: Some(4),
                photo_rating: Some(5),
                solitude_rating: Some(1),
            }
        );
        assert_eq!(
            decoded.details,
            GoalDetails {
                difficulty_rating: Some("easy".to_string()),
                hwnc_id: Some(42),
                cmc_hike_no: Some(17),
                book_page: Some(88),
            }
        );
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn test_short_row_leaves_trailing_columns_absent() {
        let decoded = SeedRow::from_record(&row(&["Skinny Dip Falls", " "])).unwrap();
        assert_eq!(decoded.visited_on, None);
        assert_eq!(decoded.notes, None);
        assert_eq!(decoded.ratings, GoalRatings::default());
        assert_eq!(decoded.details, GoalDetails::default());
    }

    #[test]
    fn test_bad_integer_cells_warn_and_are_absent() {
        let mut cells = vec![""; 16];
        cells[0] = "Catawba Falls";
        cells[8] = "great";
        cells[15] = "4.00";
        cells[11] = "n/a";
        let decoded = SeedRow::from_record(&row(&cells)).unwrap();

        assert_eq!(decoded.ratings.beauty_rating, None);
        assert_eq!(decoded.details.book_page, Some(4));
        assert_eq!(decoded.details.hwnc_id, None);
        let fields: Vec<&str> = decoded.warnings.iter().map(|w| w.field.as_str()).collect();
        assert_eq!(fields, vec!["beauty_rating", "hwnc_id"]);
        assert_eq!(decoded.warnings[0].message, NOT_A_RATING);
        assert_eq!(decoded.warnings[1].message, NOT_AN_INTEGER);
    }

    #[test]
    fn test_blank_name_fails_row() {
        let err = SeedRow::from_record(&row(&["   ", "2023-06-04"])).unwrap_err();
        assert!(matches!(err, DecodeError::MissingName { .. }));
    }

    #[tokio::test]
    async fn test_reader_skips_header_and_keeps_order() {
        let input = "name,date\nA,2023-01-01\nB\nC,2023-03-03,note\n";
        let (mut rx, handle) = spawn_row_reader(Cursor::new(input.as_bytes().to_vec()), 1);

        let mut names = Vec::new();
        while let Some(row) = rx.recv().await {
            names.push(row.unwrap().get(0).unwrap().to_string());
        }
        handle.await.unwrap();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
