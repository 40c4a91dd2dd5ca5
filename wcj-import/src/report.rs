//! End-of-run report
//!
//! Counts per terminal state plus the unmatched (deferred) records, sorted by
//! name for operator follow-up. Nothing here is persisted; every run rebuilds
//! the report from scratch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::policy::DeferredEntry;
use crate::reconciler::RecordOutcome;
use crate::seed::SeedOutcome;

/// Run counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    /// Records read from the input
    pub records: usize,
    pub created: usize,
    pub updated: usize,
    pub deferred: usize,
    /// Decode or store-write failures (record skipped)
    pub failed: usize,
    pub locations_created: usize,
    /// Field-level decode warnings across all records
    pub warnings: usize,
}

/// Deferred records in arrival order
#[derive(Debug, Clone, Default)]
pub struct UnmatchedReport {
    entries: Vec<DeferredEntry>,
}

impl UnmatchedReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DeferredEntry) {
        self.entries.push(entry);
    }

    /// Entries sorted ascending by name (case-sensitive, stable)
    pub fn into_sorted(mut self) -> Vec<DeferredEntry> {
        self.entries.sort_by(|a, b| a.name.cmp(&b.name));
        self.entries
    }
}

/// Accumulates outcomes while a run is in progress
#[derive(Debug, Clone)]
pub struct RunTally {
    counts: ImportCounts,
    unmatched: UnmatchedReport,
    started_at: DateTime<Utc>,
}

impl RunTally {
    pub fn new() -> Self {
        Self {
            counts: ImportCounts::default(),
            unmatched: UnmatchedReport::new(),
            started_at: Utc::now(),
        }
    }

    pub fn record_read(&mut self) {
        self.counts.records += 1;
    }

    pub fn record_warnings(&mut self, count: usize) {
        self.counts.warnings += count;
    }

    pub fn record_failure(&mut self) {
        self.counts.failed += 1;
    }

    pub fn record_outcome(&mut self, outcome: RecordOutcome) {
        if outcome.created_location() {
            self.counts.locations_created += 1;
        }
        match outcome {
            RecordOutcome::Created { .. } => self.counts.created += 1,
            RecordOutcome::Updated { .. } => self.counts.updated += 1,
            RecordOutcome::Deferred(entry) => {
                self.counts.deferred += 1;
                self.unmatched.push(entry);
            }
        }
    }

    pub fn finish(self, dry_run: bool) -> ImportReport {
        ImportReport {
            counts: self.counts,
            unmatched: self.unmatched.into_sorted(),
            dry_run,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

impl Default for RunTally {
    fn default() -> Self {
        Self::new()
    }
}

/// Final report of one run
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub counts: ImportCounts,
    /// Deferred records sorted by name
    pub unmatched: Vec<DeferredEntry>,
    /// Counts describe what would have been written; nothing was committed
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportReport {
    pub fn unmatched_names(&self) -> Vec<&str> {
        self.unmatched.iter().map(|e| e.name.as_str()).collect()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        if self.dry_run {
            writeln!(f, "Dry run: no changes were committed")?;
        }
        writeln!(
            f,
            "Import summary: records={} created={} updated={} deferred={} failed={} \
             locations_created={} warnings={}",
            c.records, c.created, c.updated, c.deferred, c.failed, c.locations_created, c.warnings
        )?;
        writeln!(f, "Unmatched records ({}):", self.unmatched.len())?;
        for entry in &self.unmatched {
            if entry.source_url.is_empty() {
                writeln!(f, "- {}", entry.name)?;
            } else {
                writeln!(f, "- {} ({})", entry.name, entry.source_url)?;
            }
        }
        Ok(())
    }
}

/// Seed run counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    /// Data rows read (header excluded)
    pub rows: usize,
    pub created: usize,
    /// Rows skipped because a goal with that name already exists
    pub existing: usize,
    pub failed: usize,
    pub visits_created: usize,
    pub notes_created: usize,
    pub warnings: usize,
}

/// Accumulates seed row outcomes
#[derive(Debug, Clone)]
pub struct SeedTally {
    counts: SeedCounts,
    started_at: DateTime<Utc>,
}

impl SeedTally {
    pub fn new() -> Self {
        Self {
            counts: SeedCounts::default(),
            started_at: Utc::now(),
        }
    }

    pub fn record_row(&mut self) {
        self.counts.rows += 1;
    }

    pub fn record_warnings(&mut self, count: usize) {
        self.counts.warnings += count;
    }

    pub fn record_failure(&mut self) {
        self.counts.failed += 1;
    }

    pub fn record_outcome(&mut self, outcome: SeedOutcome) {
        match outcome {
            SeedOutcome::Created {
                visit_id, note_id, ..
            } => {
                self.counts.created += 1;
                self.counts.visits_created += usize::from(visit_id.is_some());
                self.counts.notes_created += usize::from(note_id.is_some());
            }
            SeedOutcome::Existing { .. } => self.counts.existing += 1,
        }
    }

    pub fn finish(self, dry_run: bool) -> SeedReport {
        SeedReport {
            counts: self.counts,
            dry_run,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

impl Default for SeedTally {
    fn default() -> Self {
        Self::new()
    }
}

/// Final report of one seed run
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub counts: SeedCounts,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        if self.dry_run {
            writeln!(f, "Dry run: no changes were committed")?;
        }
        writeln!(
            f,
            "Seed summary: rows={} created={} existing={} failed={} visits_created={} \
             notes_created={} warnings={}",
            c.rows, c.created, c.existing, c.failed, c.visits_created, c.notes_created, c.warnings
        )
    }
}
