//! Spotify Web API client implementing the candidate supplier.
//!
//! Requests are spaced by a minimum interval per client.

use super::models::{
    ArtistSearchResponse, AudioFeaturesResponse, RecommendationsResponse, Track,
};
use super::supplier::{CandidateSong, CandidateSupplier, SupplierError};
use super::token_cache::TokenCache;
use crate::config::SpotifySettings;
use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const MAX_AUTH_ATTEMPTS: usize = 2;

pub struct SpotifyClient {
    client: Client,
    api_base_url: String,
    tokens: TokenCache,
    recommendation_limit: usize,
    require_preview: bool,
    min_request_interval: Duration,
    last_request: Mutex<Instant>,
    /// Lowercased artist name -> resolved id, `None` when the search found nothing.
    artist_ids: Mutex<HashMap<String, Option<String>>>,
}

fn map_send_error(e: reqwest::Error) -> SupplierError {
    if e.is_timeout() {
        SupplierError::Timeout
    } else {
        SupplierError::Network(e.to_string())
    }
}

impl SpotifyClient {
    pub fn new(client: Client, tokens: TokenCache, settings: &SpotifySettings) -> Self {
        let min_request_interval = Duration::from_millis(settings.min_request_interval_ms);
        Self {
            client,
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            tokens,
            recommendation_limit: settings.recommendation_limit.max(1),
            require_preview: settings.require_preview,
            min_request_interval,
            last_request: Mutex::new(
                Instant::now()
                    .checked_sub(min_request_interval)
                    .unwrap_or_else(Instant::now),
            ),
            artist_ids: Mutex::new(HashMap::new()),
        }
    }

    /// Builds the blocking HTTP client shared by the API and token calls.
    pub fn http_client(settings: &SpotifySettings) -> anyhow::Result<Client> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?)
    }

    fn rate_limit(&self) {
        let mut last = self.last_request.lock().unwrap();
        let elapsed = last.elapsed();
        if elapsed < self.min_request_interval {
            std::thread::sleep(self.min_request_interval - elapsed);
        }
        *last = Instant::now();
    }

    /// A rejected token is dropped and the request retried once with a fresh
    /// one. A second rejection is an `Auth` error.
    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SupplierError> {
        let url = format!("{}{}", self.api_base_url, path);
        let mut attempts = 0;
        let response = loop {
            attempts += 1;
            self.rate_limit();
            let token = self.tokens.token()?;
            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", token))
                .send()
                .map_err(map_send_error)?;
            if response.status().as_u16() != 401 {
                break response;
            }
            self.tokens.invalidate();
            if attempts >= MAX_AUTH_ATTEMPTS {
                return Err(SupplierError::Auth(format!("Token rejected for {}", path)));
            }
            debug!("Token rejected for {}, retrying with a fresh one", path);
        };

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SupplierError::RateLimited);
        }
        if !status.is_success() {
            return Err(SupplierError::Api {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        response
            .json()
            .map_err(|e| SupplierError::InvalidResponse(format!("{}: {}", path, e)))
    }

    /// Returns Ok(None) when the search finds no artist by that name.
    pub fn resolve_artist_id(&self, artist_name: &str) -> Result<Option<String>, SupplierError> {
        let key = artist_name.to_lowercase();
        if let Some(cached) = self.artist_ids.lock().unwrap().get(&key) {
            return Ok(cached.clone());
        }

        let path = format!(
            "/search?q={}&type=artist&limit=1",
            urlencoding::encode(artist_name)
        );
        let result: ArtistSearchResponse = self.get_json(&path)?;
        let id = result.artists.items.into_iter().next().map(|a| a.id);
        if id.is_none() {
            debug!("No artist exists with name {}", artist_name);
        }

        self.artist_ids.lock().unwrap().insert(key, id.clone());
        Ok(id)
    }

    fn candidate(&self, track_id: &str) -> Result<Option<CandidateSong>, SupplierError> {
        let track: Track = self.get_json(&format!("/tracks/{}", track_id))?;
        if self.require_preview && track.preview_url.is_none() {
            debug!("Skipping track {} without preview", track_id);
            return Ok(None);
        }
        let features: AudioFeaturesResponse =
            self.get_json(&format!("/audio-features/{}", track_id))?;

        Ok(Some(CandidateSong {
            external_id: track.id.clone(),
            name: track.name.clone(),
            artists: track.artist_names(),
            image_url: track.image_url(),
            popularity: track.popularity,
            preview_url: track.preview_url,
            external_url: track.external_urls.spotify,
            features: features.into(),
        }))
    }
}

impl CandidateSupplier for SpotifyClient {
    fn fetch(&self, seed_artists: &[String]) -> Result<Vec<CandidateSong>, SupplierError> {
        let mut seed_ids = Vec::with_capacity(seed_artists.len());
        for name in seed_artists {
            if let Some(id) = self.resolve_artist_id(name)? {
                seed_ids.push(id);
            }
        }
        if seed_ids.is_empty() {
            return Err(SupplierError::NoSeeds);
        }

        let path = format!(
            "/recommendations?seed_artists={}&limit={}",
            seed_ids.join(","),
            self.recommendation_limit
        );
        let recommendations: RecommendationsResponse = self.get_json(&path)?;

        let mut candidates = Vec::with_capacity(recommendations.tracks.len());
        for track in &recommendations.tracks {
            match self.candidate(&track.id) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) if e.is_transient() => return Err(e),
                Err(e) => warn!("Dropping track {}: {}", track.id, e),
            }
        }

        candidates.shuffle(&mut rand::rng());
        Ok(candidates)
    }
}
