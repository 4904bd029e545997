//! Catalog models for SQLite-backed song storage.

use serde::{Deserialize, Serialize};

/// The twelve raw audio attributes reported by the candidate supplier for a
/// track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub acousticness: f64,
    pub danceability: f64,
    pub duration_ms: i64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub key: i32,
    pub liveness: f64,
    pub loudness: f64,
    pub mode: i32,
    pub speechiness: f64,
    /// Beats per minute.
    pub tempo: f64,
    pub valence: f64,
}

/// Everything needed to create a catalog entry, minus its external id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongDefaults {
    pub name: String,
    pub artist: Option<String>,
    pub features: AudioFeatures,
    /// 0-100, as reported by the supplier.
    pub popularity: Option<f64>,
    pub image_url: Option<String>,
    pub preview_url: Option<String>,
    pub external_url: Option<String>,
}

/// A catalog track.
///
/// Songs are immutable once created, except for `flavor_text` which is
/// backfilled lazily by the description generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub external_id: String,
    pub name: String,
    /// Primary artist name.
    pub artist: Option<String>,
    pub features: AudioFeatures,
    pub popularity: Option<f64>,
    pub flavor_text: Option<String>,
    pub image_url: Option<String>,
    pub preview_url: Option<String>,
    pub external_url: Option<String>,
}

impl Song {
    pub fn from_defaults(external_id: impl Into<String>, defaults: SongDefaults) -> Self {
        Self {
            external_id: external_id.into(),
            name: defaults.name,
            artist: defaults.artist,
            features: defaults.features,
            popularity: defaults.popularity,
            flavor_text: None,
            image_url: defaults.image_url,
            preview_url: defaults.preview_url,
            external_url: defaults.external_url,
        }
    }

    pub fn artist_or_unknown(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown artist")
    }

    pub fn needs_flavor_text(&self) -> bool {
        self.flavor_text.is_none()
    }
}
