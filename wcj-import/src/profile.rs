//! Feed profiles
//!
//! Each external feed names its fields differently. A [`FeedProfile`] maps the
//! normalized fields onto one feed's key names, so a single decoder and a
//! single reconciliation policy serve every feed.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Built-in feed layouts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedKind {
    /// Scraped hikingwnc.com waterfall list (`Name`, `GPS`, `new_fall`, ...)
    #[default]
    HikingWnc,
    /// Hand-curated supplemental list with snake_case keys
    Curated,
}

impl FeedKind {
    pub fn profile(self) -> FeedProfile {
        match self {
            FeedKind::HikingWnc => FeedProfile::hiking_wnc(),
            FeedKind::Curated => FeedProfile::curated(),
        }
    }
}

/// Key names a feed uses for each field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedProfile {
    pub name: String,
    pub beauty_rating: String,
    pub photo_rating: String,
    pub solitude_rating: String,
    pub distance: String,
    /// Object holding `latitude`/`longitude`, or free text
    pub coordinates: String,
    pub latitude: String,
    pub longitude: String,
    pub is_new: String,
    pub source_url: String,
}

impl FeedProfile {
    pub fn hiking_wnc() -> Self {
        Self {
            name: "Name".to_string(),
            beauty_rating: "Beauty".to_string(),
            photo_rating: "Photo Rating".to_string(),
            solitude_rating: "Solitude".to_string(),
            distance: "Distance".to_string(),
            coordinates: "GPS".to_string(),
            latitude: "Latitude".to_string(),
            longitude: "Longitude".to_string(),
            is_new: "new_fall".to_string(),
            source_url: "url".to_string(),
        }
    }

    pub fn curated() -> Self {
        Self {
            name: "name".to_string(),
            beauty_rating: "beauty_rating".to_string(),
            photo_rating: "photo_rating".to_string(),
            solitude_rating: "solitude_rating".to_string(),
            distance: "distance".to_string(),
            coordinates: "coordinates".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            is_new: "is_new".to_string(),
            source_url: "source_url".to_string(),
        }
    }

    /// Replace the keys named in `overrides`, keeping the rest
    pub fn with_overrides(mut self, overrides: &ProfileKeys) -> Self {
        let fields = [
            (&mut self.name, &overrides.name),
            (&mut self.beauty_rating, &overrides.beauty_rating),
            (&mut self.photo_rating, &overrides.photo_rating),
            (&mut self.solitude_rating, &overrides.solitude_rating),
            (&mut self.distance, &overrides.distance),
            (&mut self.coordinates, &overrides.coordinates),
            (&mut self.latitude, &overrides.latitude),
            (&mut self.longitude, &overrides.longitude),
            (&mut self.is_new, &overrides.is_new),
            (&mut self.source_url, &overrides.source_url),
        ];
        for (key, replacement) in fields {
            if let Some(replacement) = replacement {
                *key = replacement.clone();
            }
        }
        self
    }
}

impl Default for FeedProfile {
    fn default() -> Self {
        FeedKind::default().profile()
    }
}

/// `[profile_keys]` config table: per-field key overrides for custom feeds
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileKeys {
    pub name: Option<String>,
    pub beauty_rating: Option<String>,
    pub photo_rating: Option<String>,
    pub solitude_rating: Option<String>,
    pub distance: Option<String>,
    pub coordinates: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub is_new: Option<String>,
    pub source_url: Option<String>,
}
