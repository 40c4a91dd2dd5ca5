//! Batch driver
//!
//! Streams records from the input reader and runs each one through
//! decode -> lookup -> decide -> apply, strictly in input order. Per-record
//! failures are logged and counted; only a lost store connection or broken
//! input framing stops the run.

use serde_json::value::RawValue;
use sqlx::SqlitePool;
use std::io::Read;
use tracing::{error, info, warn};
use wcj_common::db::MatchStrategy;

use crate::decoder::Decoder;
use crate::error::{ImportError, RecordError};
use crate::lookup::CanonicalLookup;
use crate::profile::FeedProfile;
use crate::reader::{spawn_record_reader, DEFAULT_CHANNEL_CAPACITY};
use crate::reconciler::{Reconciler, RecordOutcome};
use crate::report::{ImportReport, RunTally};

/// Longest payload excerpt written to the log for an undecodable record
const PAYLOAD_EXCERPT_CHARS: usize = 200;

/// Settings for one import run
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub profile: FeedProfile,
    pub match_strategy: MatchStrategy,
    /// Roll back every record after computing its outcome
    pub dry_run: bool,
    /// Parsed records buffered between the reader and the reconciler
    pub channel_capacity: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            profile: FeedProfile::default(),
            match_strategy: MatchStrategy::default(),
            dry_run: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

pub struct BatchDriver {
    pool: SqlitePool,
    decoder: Decoder,
    reconciler: Reconciler,
    dry_run: bool,
    channel_capacity: usize,
}

impl BatchDriver {
    pub fn new(pool: SqlitePool, options: ImportOptions) -> Self {
        let lookup = CanonicalLookup::new(options.match_strategy);
        Self {
            pool,
            decoder: Decoder::new(options.profile),
            reconciler: Reconciler::new(lookup, options.dry_run),
            dry_run: options.dry_run,
            channel_capacity: options.channel_capacity,
        }
    }

    /// Import every record of `input`
    ///
    /// `input_name` identifies the input in logs and errors. Records
    /// committed before a run-fatal error stay committed.
    pub async fn run<R>(&self, input: R, input_name: &str) -> Result<ImportReport, ImportError>
    where
        R: Read + Send + 'static,
    {
        info!(
            input = input_name,
            match_strategy = %self.reconciler.lookup().strategy(),
            dry_run = self.dry_run,
            "Starting import"
        );

        let (mut records, reader) = spawn_record_reader(input, self.channel_capacity);
        let mut tally = RunTally::new();
        let mut index = 0usize;

        while let Some(raw) = records.recv().await {
            tally.record_read();
            match self.import_record(&raw, &mut tally).await {
                Ok(outcome) => tally.record_outcome(outcome),
                Err(RecordError::Decode(e)) => {
                    warn!(
                        index,
                        error = %e,
                        payload = %payload_excerpt(raw.get()),
                        "Skipping undecodable record"
                    );
                    tally.record_failure();
                }
                Err(RecordError::Store {
                    name,
                    operation,
                    source,
                }) if source.is_connection() => {
                    error!(index, name = %name, operation = %operation, "Store connection lost");
                    return Err(ImportError::StoreConnection {
                        resource: format!("{} for `{}`", operation, name),
                        source,
                    });
                }
                Err(e) => {
                    error!(index, error = %e, "Record failed, skipping");
                    tally.record_failure();
                }
            }
            index += 1;
        }

        let read = reader
            .await
            .map_err(|e| ImportError::Internal(format!("Input reader task failed: {}", e)))?
            .map_err(|e| {
                if e.is_io() {
                    ImportError::Io {
                        input: input_name.to_string(),
                        source: e.into(),
                    }
                } else {
                    ImportError::InputFormat {
                        input: input_name.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let report = tally.finish(self.dry_run);
        let counts = &report.counts;
        info!(
            records = read,
            created = counts.created,
            updated = counts.updated,
            deferred = counts.deferred,
            failed = counts.failed,
            locations_created = counts.locations_created,
            warnings = counts.warnings,
            "Import complete"
        );

        Ok(report)
    }

    async fn import_record(
        &self,
        raw: &RawValue,
        tally: &mut RunTally,
    ) -> Result<RecordOutcome, RecordError> {
        let record = self.decoder.decode_raw(raw)?;
        tally.record_warnings(record.warnings.len());
        self.reconciler.reconcile(&self.pool, &record).await
    }
}

pub(crate) fn payload_excerpt(text: &str) -> String {
    match text.char_indices().nth(PAYLOAD_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
