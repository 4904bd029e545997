//! Flavor text for songs.

mod openai;

pub use openai::LlmDescriptionGenerator;

use crate::catalog_store::AudioFeatures;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("Description generation is disabled")]
    Disabled,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,
}

pub trait DescriptionGenerator: Send + Sync {
    fn describe(
        &self,
        name: &str,
        primary_artist: &str,
        features: &AudioFeatures,
    ) -> Result<String, DescribeError>;
}

/// Used when no text generator is configured.
pub struct NoOpDescriptionGenerator;

impl DescriptionGenerator for NoOpDescriptionGenerator {
    fn describe(&self, _: &str, _: &str, _: &AudioFeatures) -> Result<String, DescribeError> {
        Err(DescribeError::Disabled)
    }
}
