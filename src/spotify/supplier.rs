//! The candidate supplier boundary used by the recommendation filter.

use crate::catalog_store::{AudioFeatures, Song, SongDefaults};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SupplierError {
    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("Connection error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("None of the seed artists could be resolved")]
    NoSeeds,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SupplierError {
    /// Transient errors are retried by the recommendation loop, everything
    /// else aborts the request.
    pub fn is_transient(&self) -> bool {
        match self {
            SupplierError::RateLimited | SupplierError::Timeout | SupplierError::Network(_) => {
                true
            }
            SupplierError::Api { status, .. } => *status >= 500,
            SupplierError::Auth(_) | SupplierError::NoSeeds | SupplierError::InvalidResponse(_) => {
                false
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierError::RateLimited => "rate_limited",
            SupplierError::Timeout => "timeout",
            SupplierError::Network(_) => "network",
            SupplierError::Auth(_) => "auth",
            SupplierError::NoSeeds => "no_seeds",
            SupplierError::Api { .. } => "api",
            SupplierError::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// A track proposed by the supplier, with its raw audio features.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSong {
    pub external_id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub features: AudioFeatures,
    pub popularity: Option<f64>,
    pub image_url: Option<String>,
    pub preview_url: Option<String>,
    pub external_url: Option<String>,
}

impl CandidateSong {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    pub fn to_defaults(&self) -> SongDefaults {
        SongDefaults {
            name: self.name.clone(),
            artist: self.primary_artist().map(str::to_string),
            features: self.features.clone(),
            popularity: self.popularity,
            image_url: self.image_url.clone(),
            preview_url: self.preview_url.clone(),
            external_url: self.external_url.clone(),
        }
    }
}

impl From<&CandidateSong> for Song {
    fn from(candidate: &CandidateSong) -> Self {
        Song::from_defaults(candidate.external_id.clone(), candidate.to_defaults())
    }
}

/// Source of candidate songs for a set of seed artist names.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait CandidateSupplier: Send + Sync {
    /// An empty result is valid and means "nothing right now, try again".
    fn fetch(&self, seed_artists: &[String]) -> Result<Vec<CandidateSong>, SupplierError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::song_defaults;

    #[test]
    fn transient_classification() {
        assert!(SupplierError::RateLimited.is_transient());
        assert!(SupplierError::Timeout.is_transient());
        assert!(SupplierError::Network("reset".into()).is_transient());
        assert!(SupplierError::Api {
            status: 503,
            message: String::new()
        }
        .is_transient());

        assert!(!SupplierError::NoSeeds.is_transient());
        assert!(!SupplierError::Auth("bad secret".into()).is_transient());
        assert!(!SupplierError::Api {
            status: 404,
            message: String::new()
        }
        .is_transient());
    }

    #[test]
    fn candidate_converts_to_song() {
        let defaults = song_defaults("Tune", 128.0, Some(70.0));
        let candidate = CandidateSong {
            external_id: "abc".to_string(),
            name: "Tune".to_string(),
            artists: vec!["Test Artist".to_string(), "Featured".to_string()],
            features: defaults.features.clone(),
            popularity: Some(70.0),
            image_url: defaults.image_url.clone(),
            preview_url: defaults.preview_url.clone(),
            external_url: None,
        };

        let song = Song::from(&candidate);
        assert_eq!(song, Song::from_defaults("abc", defaults));
        assert!(song.needs_flavor_text());
    }
}
