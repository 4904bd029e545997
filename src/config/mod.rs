mod file_config;

pub use file_config::{
    ClusteringConfig, DescriberConfig, FileConfig, RecommendationConfig, SpotifyConfig,
};

use crate::taste::{KMeansParams, DEFAULT_ELBOW_THRESHOLD, DEFAULT_MAX_CLUSTERS};
use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub describer_base_url: Option<String>,
    pub describer_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,

    pub spotify: SpotifySettings,
    pub describer: DescriberSettings,
    pub recommendation: RecommendationSettings,
    pub clustering: ClusteringSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let sp_file = file.spotify.unwrap_or_default();
        let sp_default = SpotifySettings::default();
        let spotify = SpotifySettings {
            client_id: sp_file.client_id.or_else(|| cli.spotify_client_id.clone()),
            client_secret: sp_file
                .client_secret
                .or_else(|| cli.spotify_client_secret.clone()),
            api_base_url: sp_file.api_base_url.unwrap_or(sp_default.api_base_url),
            token_url: sp_file.token_url.unwrap_or(sp_default.token_url),
            recommendation_limit: sp_file
                .recommendation_limit
                .unwrap_or(sp_default.recommendation_limit),
            require_preview: sp_file
                .require_preview
                .unwrap_or(sp_default.require_preview),
            min_request_interval_ms: sp_file
                .min_request_interval_ms
                .unwrap_or(sp_default.min_request_interval_ms),
            request_timeout_secs: sp_file
                .request_timeout_secs
                .unwrap_or(sp_default.request_timeout_secs),
        };

        let ds_file = file.describer.unwrap_or_default();
        let ds_default = DescriberSettings::default();
        let describer = DescriberSettings {
            base_url: ds_file
                .base_url
                .or_else(|| cli.describer_base_url.clone()),
            model: ds_file.model.unwrap_or(ds_default.model),
            api_key: ds_file.api_key.or_else(|| cli.describer_api_key.clone()),
            max_tokens: ds_file.max_tokens.unwrap_or(ds_default.max_tokens),
            temperature: ds_file.temperature.unwrap_or(ds_default.temperature),
            request_timeout_secs: ds_file
                .request_timeout_secs
                .unwrap_or(ds_default.request_timeout_secs),
        };

        let rec_file = file.recommendation.unwrap_or_default();
        let rec_default = RecommendationSettings::default();
        let recommendation = RecommendationSettings {
            max_attempts: rec_file.max_attempts.unwrap_or(rec_default.max_attempts),
            retry_delay_ms: rec_file.retry_delay_ms.unwrap_or(rec_default.retry_delay_ms),
            cold_start_threshold: rec_file
                .cold_start_threshold
                .unwrap_or(rec_default.cold_start_threshold),
            match_acceptance_percent: rec_file
                .match_acceptance_percent
                .unwrap_or(rec_default.match_acceptance_percent),
            exploration_acceptance_percent: rec_file
                .exploration_acceptance_percent
                .unwrap_or(rec_default.exploration_acceptance_percent),
            max_seed_artists: rec_file
                .max_seed_artists
                .unwrap_or(rec_default.max_seed_artists),
        };
        if recommendation.match_acceptance_percent > 100
            || recommendation.exploration_acceptance_percent > 100
        {
            bail!("Acceptance percentages must be between 0 and 100");
        }
        if recommendation.max_seed_artists == 0 {
            bail!("max_seed_artists must be at least 1");
        }

        let cl_file = file.clustering.unwrap_or_default();
        let km_default = KMeansParams::default();
        let clustering = ClusteringSettings {
            max_clusters: cl_file.max_clusters.unwrap_or(DEFAULT_MAX_CLUSTERS),
            elbow_threshold: cl_file.elbow_threshold.unwrap_or(DEFAULT_ELBOW_THRESHOLD),
            kmeans: KMeansParams {
                seed: cl_file.seed.unwrap_or(km_default.seed),
                n_init: cl_file.n_init.unwrap_or(km_default.n_init),
                max_iter: cl_file.max_iter.unwrap_or(km_default.max_iter),
                tolerance: cl_file.tolerance.unwrap_or(km_default.tolerance),
            },
        };
        if clustering.max_clusters == 0 {
            bail!("max_clusters must be at least 1");
        }

        Ok(Self {
            db_dir,
            spotify,
            describer,
            recommendation,
            clustering,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.db_dir.join("user.db")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotifySettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_base_url: String,
    pub token_url: String,
    pub recommendation_limit: usize,
    pub require_preview: bool,
    pub min_request_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl SpotifySettings {
    /// Both halves of the client credentials are needed to talk to the API.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}

impl Default for SpotifySettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_base_url: "https://api.spotify.com/v1".to_string(),
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            recommendation_limit: 1,
            require_preview: true,
            min_request_interval_ms: 100,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriberSettings {
    /// Text generation is disabled when unset.
    pub base_url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for DescriberSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_tokens: 200,
            temperature: 0.9,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationSettings {
    /// Supplier fetches per request before giving up.
    pub max_attempts: u32,
    /// Pause after an empty batch or a transient supplier error.
    pub retry_delay_ms: u64,
    /// Up to this many total ratings every candidate is accepted.
    pub cold_start_threshold: u64,
    pub match_acceptance_percent: u32,
    pub exploration_acceptance_percent: u32,
    pub max_seed_artists: usize,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            retry_delay_ms: 250,
            cold_start_threshold: 25,
            match_acceptance_percent: 60,
            exploration_acceptance_percent: 60,
            max_seed_artists: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringSettings {
    pub max_clusters: usize,
    pub elbow_threshold: f64,
    pub kmeans: KMeansParams,
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            max_clusters: DEFAULT_MAX_CLUSTERS,
            elbow_threshold: DEFAULT_ELBOW_THRESHOLD,
            kmeans: KMeansParams::default(),
        }
    }
}
