use super::filter::{Decision, RecommendationFilter};
use super::retry_policy::RetryPolicy;
use crate::catalog_store::{Song, SongStore};
use crate::config::RecommendationSettings;
use crate::describe::{DescribeError, DescriptionGenerator};
use crate::metrics;
use crate::spotify::{CandidateSong, CandidateSupplier, SupplierError};
use crate::taste::{normalize, TasteProfile};
use crate::user::FullUserStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("unknown user {0}")]
    UnknownUser(usize),

    #[error("candidate supplier failed: {0}")]
    Supplier(SupplierError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct RecommendationService {
    supplier: Arc<dyn CandidateSupplier>,
    catalog_store: Arc<dyn SongStore>,
    user_store: Arc<dyn FullUserStore>,
    describer: Arc<dyn DescriptionGenerator>,
    filter: RecommendationFilter,
    retry_policy: RetryPolicy,
    max_seed_artists: usize,
    rng: Mutex<StdRng>,
}

impl RecommendationService {
    pub fn new(
        supplier: Arc<dyn CandidateSupplier>,
        catalog_store: Arc<dyn SongStore>,
        user_store: Arc<dyn FullUserStore>,
        describer: Arc<dyn DescriptionGenerator>,
        settings: &RecommendationSettings,
    ) -> Self {
        Self::with_rng(
            supplier,
            catalog_store,
            user_store,
            describer,
            settings,
            StdRng::from_os_rng(),
        )
    }

    pub fn with_rng(
        supplier: Arc<dyn CandidateSupplier>,
        catalog_store: Arc<dyn SongStore>,
        user_store: Arc<dyn FullUserStore>,
        describer: Arc<dyn DescriptionGenerator>,
        settings: &RecommendationSettings,
        rng: StdRng,
    ) -> Self {
        Self {
            supplier,
            catalog_store,
            user_store,
            describer,
            filter: RecommendationFilter::new(settings),
            retry_policy: RetryPolicy::new(settings),
            max_seed_artists: settings.max_seed_artists,
            rng: Mutex::new(rng),
        }
    }

    /// Trims blanks and enforces the seed count bounds.
    pub fn validate_seeds(
        &self,
        seed_artists: &[String],
    ) -> Result<Vec<String>, RecommendationError> {
        let seeds: Vec<String> = seed_artists
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if seeds.is_empty() {
            return Err(RecommendationError::InvalidInput(
                "At least one seed artist is required.".to_string(),
            ));
        }
        if seeds.len() > self.max_seed_artists {
            return Err(RecommendationError::InvalidInput(format!(
                "At most {} seed artists are allowed, got {}.",
                self.max_seed_artists,
                seeds.len()
            )));
        }
        Ok(seeds)
    }

    /// Blocks until a candidate is accepted or the attempts run out. Every
    /// fetched candidate ends up in the catalog, accepted or not. Returns an
    /// empty list when nothing was accepted.
    pub fn get_recommendations(
        &self,
        user_id: usize,
        seed_artists: &[String],
    ) -> Result<Vec<Song>, RecommendationError> {
        let seeds = self.validate_seeds(seed_artists)?;
        if self.user_store.get_user_handle(user_id)?.is_none() {
            return Err(RecommendationError::UnknownUser(user_id));
        }

        let start = Instant::now();
        let result = self.run_filter_loop(user_id, &seeds);
        metrics::record_recommendation_request(start.elapsed());
        result
    }

    fn load_profile(&self, user_id: usize) -> Result<Option<TasteProfile>, RecommendationError> {
        let counts = self.user_store.get_rating_counts(user_id)?;
        if !self.filter.is_active(counts.total()) {
            debug!(
                "User {} has {} ratings, accepting every candidate",
                user_id,
                counts.total()
            );
            return Ok(None);
        }
        let profile = self
            .user_store
            .get_taste_profile(user_id)?
            .unwrap_or_else(|| TasteProfile::empty(user_id));
        Ok(Some(profile))
    }

    fn run_filter_loop(
        &self,
        user_id: usize,
        seeds: &[String],
    ) -> Result<Vec<Song>, RecommendationError> {
        let profile = self.load_profile(user_id)?;

        let mut attempt = 0;
        while attempt < self.retry_policy.max_attempts {
            attempt += 1;
            let batch = match self.supplier.fetch(seeds) {
                Ok(batch) => batch,
                Err(e) => {
                    metrics::record_supplier_attempt(e.as_str());
                    if !e.is_transient() {
                        warn!("Supplier failed for user {}: {}", user_id, e);
                        return Err(RecommendationError::Supplier(e));
                    }
                    debug!("Transient supplier error on attempt {}: {}", attempt, e);
                    if self.retry_policy.should_retry(&e, attempt) {
                        self.retry_policy.wait();
                    }
                    continue;
                }
            };

            if batch.is_empty() {
                metrics::record_supplier_attempt("empty");
                if self.retry_policy.has_attempts_left(attempt) {
                    self.retry_policy.wait();
                }
                continue;
            }
            metrics::record_supplier_attempt("ok");

            if let Some(song) = self.pick_from_batch(profile.as_ref(), &batch)? {
                return Ok(vec![self.with_flavor_text(song)]);
            }
        }

        info!(
            "No recommendation accepted for user {} after {} attempts",
            user_id, attempt
        );
        Ok(Vec::new())
    }

    fn pick_from_batch(
        &self,
        profile: Option<&TasteProfile>,
        batch: &[CandidateSong],
    ) -> Result<Option<Song>, RecommendationError> {
        for candidate in batch {
            let (song, created) = self
                .catalog_store
                .get_or_create(&candidate.external_id, candidate.to_defaults())?;
            if created {
                debug!("Added {} ({}) to the catalog", song.name, song.external_id);
            }

            let vector = normalize(&song);
            let decision = {
                let mut rng = self.rng.lock().unwrap();
                self.filter.decide(profile, &vector, &mut *rng)
            };
            metrics::record_decision(decision.as_str());
            if decision != Decision::Reject {
                debug!("{} for {}", decision.as_str(), song.external_id);
                return Ok(Some(song));
            }
        }
        Ok(None)
    }

    fn with_flavor_text(&self, mut song: Song) -> Song {
        if !song.needs_flavor_text() {
            return song;
        }
        match self
            .describer
            .describe(&song.name, song.artist_or_unknown(), &song.features)
        {
            Ok(text) => {
                song.flavor_text = Some(text);
                if let Err(e) = self.catalog_store.update(&song) {
                    warn!("Failed to store flavor text for {}: {}", song.external_id, e);
                }
            }
            Err(DescribeError::Disabled) => {}
            Err(e) => warn!("Flavor text for {} failed: {}", song.external_id, e),
        }
        song
    }
}
