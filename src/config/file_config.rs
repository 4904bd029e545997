use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,

    // Feature configs
    pub spotify: Option<SpotifyConfig>,
    pub describer: Option<DescriberConfig>,
    pub recommendation: Option<RecommendationConfig>,
    pub clustering: Option<ClusteringConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_base_url: Option<String>,
    pub token_url: Option<String>,
    /// Tracks requested per recommendations call.
    pub recommendation_limit: Option<usize>,
    pub require_preview: Option<bool>,
    pub min_request_interval_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DescriberConfig {
    /// OpenAI-compatible API base, e.g. "https://api.openai.com/v1".
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RecommendationConfig {
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub cold_start_threshold: Option<u64>,
    pub match_acceptance_percent: Option<u32>,
    pub exploration_acceptance_percent: Option<u32>,
    pub max_seed_artists: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ClusteringConfig {
    pub max_clusters: Option<usize>,
    pub elbow_threshold: Option<f64>,
    pub seed: Option<u64>,
    pub n_init: Option<usize>,
    pub max_iter: Option<usize>,
    pub tolerance: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
