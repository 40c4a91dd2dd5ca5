//! wcj-import configuration
//!
//! Settings resolve as: CLI flag (or its environment variable) > `import.toml`
//! > compiled default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use wcj_common::config::{default_database_path, load_optional_toml, LoggingConfig};
use wcj_common::db::MatchStrategy;

use crate::driver::ImportOptions;
use crate::error::ImportError;
use crate::profile::{FeedKind, ProfileKeys};
use crate::reader::DEFAULT_CHANNEL_CAPACITY;

/// Config file name under `<config_dir>/wcj/`
pub const CONFIG_FILE: &str = "import.toml";

/// Contents of `import.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportToml {
    pub database: Option<PathBuf>,
    pub profile: Option<FeedKind>,
    pub match_strategy: Option<MatchStrategy>,
    pub channel_capacity: Option<usize>,
    pub logging: LoggingConfig,
    /// Per-field key overrides applied on top of the selected profile
    pub profile_keys: Option<ProfileKeys>,
}

/// Load `import.toml` from `explicit` or the platform default location
///
/// Returns the path it was read from alongside the parsed file.
pub fn load_import_config(
    explicit: Option<&Path>,
) -> Result<Option<(PathBuf, ImportToml)>, ImportError> {
    load_optional_toml(explicit, CONFIG_FILE).map_err(|e| ImportError::Config(e.to_string()))
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database: Option<PathBuf>,
    pub profile: Option<FeedKind>,
    pub match_strategy: Option<MatchStrategy>,
    pub dry_run: bool,
}

/// Fully resolved run settings
#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub database: PathBuf,
    pub options: ImportOptions,
}

impl ImportSettings {
    pub fn resolve(cli: CliOverrides, file: Option<ImportToml>) -> Result<Self, ImportError> {
        let file = file.unwrap_or_default();

        let database = cli
            .database
            .or(file.database)
            .unwrap_or_else(default_database_path);

        let kind = cli.profile.or(file.profile).unwrap_or_default();
        let profile = match &file.profile_keys {
            Some(keys) => kind.profile().with_overrides(keys),
            None => kind.profile(),
        };

        let channel_capacity = file.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY);
        if channel_capacity == 0 {
            return Err(ImportError::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database,
            options: ImportOptions {
                profile,
                match_strategy: cli.match_strategy.or(file.match_strategy).unwrap_or_default(),
                dry_run: cli.dry_run,
                channel_capacity,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::FeedProfile;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_config() {
        let settings = ImportSettings::resolve(CliOverrides::default(), None).unwrap();
        assert_eq!(settings.database, default_database_path());
        assert_eq!(settings.options.profile, FeedProfile::hiking_wnc());
        assert_eq!(settings.options.match_strategy, MatchStrategy::Exact);
        assert_eq!(settings.options.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert!(!settings.options.dry_run);
    }

    #[test]
    fn test_file_values_apply() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            database = "/srv/wcj/journey.db"
            profile = "curated"
            match_strategy = "ignore-ascii-case"
            channel_capacity = 8

            [logging]
            level = "debug"
            "#,
        );

        let (loaded_from, file) = load_import_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(file.logging.level.as_deref(), Some("debug"));

        let settings = ImportSettings::resolve(CliOverrides::default(), Some(file)).unwrap();
        assert_eq!(settings.database, PathBuf::from("/srv/wcj/journey.db"));
        assert_eq!(settings.options.profile, FeedProfile::curated());
        assert_eq!(settings.options.match_strategy, MatchStrategy::IgnoreAsciiCase);
        assert_eq!(settings.options.channel_capacity, 8);
    }

    #[test]
    fn test_cli_beats_file() {
        let file = ImportToml {
            database: Some(PathBuf::from("/from/file.db")),
            profile: Some(FeedKind::Curated),
            match_strategy: Some(MatchStrategy::IgnoreAsciiCase),
            ..Default::default()
        };
        let cli = CliOverrides {
            database: Some(PathBuf::from("/from/cli.db")),
            profile: Some(FeedKind::HikingWnc),
            match_strategy: Some(MatchStrategy::Exact),
            dry_run: true,
        };

        let settings = ImportSettings::resolve(cli, Some(file)).unwrap();
        assert_eq!(settings.database, PathBuf::from("/from/cli.db"));
        assert_eq!(settings.options.profile, FeedProfile::hiking_wnc());
        assert_eq!(settings.options.match_strategy, MatchStrategy::Exact);
        assert!(settings.options.dry_run);
    }

    #[test]
    fn test_profile_keys_override_selected_profile() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
            profile = "curated"

            [profile_keys]
            name = "title"
            coordinates = "location"
            "#,
        );
        let (_, file) = load_import_config(Some(&path)).unwrap().unwrap();

        let settings = ImportSettings::resolve(CliOverrides::default(), Some(file)).unwrap();
        let profile = settings.options.profile;
        assert_eq!(profile.name, "title");
        assert_eq!(profile.coordinates, "location");
        assert_eq!(profile.beauty_rating, "beauty_rating");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "databse = \"typo.db\"\n");

        let err = load_import_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_import_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_zero_channel_capacity_is_rejected() {
        let file = ImportToml {
            channel_capacity: Some(0),
            ..Default::default()
        };
        assert!(ImportSettings::resolve(CliOverrides::default(), Some(file)).is_err());
    }
}
