//! wcj-import library interface
//!
//! Reconciles scraped waterfall feed records against the WC Journey goal
//! store, and seeds an empty store from the personal CSV log. Exposed as a
//! library for integration testing.

pub mod config;
pub mod decoder;
pub mod driver;
pub mod error;
pub mod lookup;
pub mod policy;
pub mod profile;
pub mod reader;
pub mod reconciler;
pub mod report;
pub mod seed;

pub use crate::driver::{BatchDriver, ImportOptions};
pub use crate::error::{DecodeError, ImportError, RecordError};
pub use crate::profile::{FeedKind, FeedProfile};
pub use crate::report::{ImportReport, SeedReport};
pub use crate::seed::SeedImporter;
