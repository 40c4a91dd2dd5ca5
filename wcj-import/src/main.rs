//! wcj-import - Waterfall feed importer
//!
//! Reads one JSON array of waterfall records, updates goals that already
//! exist, creates goals the feed flags as new, and reports the rest for
//! manual review. With `--input-kind seed` it instead seeds the store from the
//! personal CSV log. The report goes to stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wcj_common::config::default_config_path;
use wcj_common::db::{init_database, MatchStrategy};
use wcj_import::config::{load_import_config, CliOverrides, ImportSettings, CONFIG_FILE};
use wcj_import::{BatchDriver, FeedKind, ImportError, SeedImporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputKind {
    /// JSON array of scraped feed records
    Feed,
    /// Personal CSV log with visits and notes
    Seed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Import waterfall feed data into the WC Journey goal store
#[derive(Debug, Parser)]
#[command(name = "wcj-import", version, about)]
struct Args {
    /// Input file ("-" reads stdin)
    input: PathBuf,

    /// What the input holds
    #[arg(short, long, value_enum, env = "WCJ_INPUT_KIND", default_value_t = InputKind::Feed)]
    input_kind: InputKind,

    /// SQLite database path
    #[arg(short, long, env = "WCJ_DATABASE")]
    database: Option<PathBuf>,

    /// Feed layout of the input
    #[arg(short, long, value_enum, env = "WCJ_PROFILE")]
    profile: Option<FeedKind>,

    /// How names are matched against existing goals (exact, ignore-ascii-case)
    #[arg(short, long, env = "WCJ_MATCH_STRATEGY")]
    match_strategy: Option<MatchStrategy>,

    /// Config file (default: <config_dir>/wcj/import.toml)
    #[arg(short, long, env = "WCJ_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report_format: ReportFormat,

    /// Compute the full report without committing anything
    #[arg(long)]
    dry_run: bool,
}

fn render<T: fmt::Display + Serialize>(report: &T, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(report.to_string()),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("Failed to render report")?;
            Ok(format!("{}\n", json))
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let level = level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wcj_import={level},wcj_common={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read first so its [logging] level can seed the subscriber
    let (config_path, file) = match load_import_config(args.config.as_deref())? {
        Some((path, file)) => (Some(path), Some(file)),
        None => (None, None),
    };
    init_tracing(file.as_ref().and_then(|f| f.logging.level.as_deref()));

    info!("Starting WC Journey importer (wcj-import) v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => match default_config_path(CONFIG_FILE) {
            Some(path) => info!("No config file at {}, using defaults", path.display()),
            None => info!("No config directory found, using defaults"),
        },
    }

    let settings = ImportSettings::resolve(
        CliOverrides {
            database: args.database,
            profile: args.profile,
            match_strategy: args.match_strategy,
            dry_run: args.dry_run,
        },
        file,
    )?;
    info!("Database path: {}", settings.database.display());

    let pool = init_database(&settings.database)
        .await
        .map_err(|source| ImportError::StoreConnection {
            resource: settings.database.display().to_string(),
            source,
        })?;

    let (input, input_name): (Box<dyn Read + Send>, String) = if args.input == Path::new("-") {
        (Box::new(std::io::stdin()), "stdin".to_string())
    } else {
        let input_name = args.input.display().to_string();
        match File::open(&args.input) {
            Ok(file) => (Box::new(file), input_name),
            Err(source) => {
                pool.close().await;
                let e = ImportError::Io {
                    input: input_name,
                    source,
                };
                error!("Import aborted: {}", e);
                return Err(e.into());
            }
        }
    };

    let result = match args.input_kind {
        InputKind::Feed => BatchDriver::new(pool.clone(), settings.options)
            .run(input, &input_name)
            .await
            .map(|report| render(&report, args.report_format)),
        InputKind::Seed => SeedImporter::new(pool.clone(), settings.options)
            .run(input, &input_name)
            .await
            .map(|report| render(&report, args.report_format)),
    };
    pool.close().await;

    match result {
        Ok(rendered) => print!("{}", rendered?),
        Err(e) => {
            error!("Import aborted: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
