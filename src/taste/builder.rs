//! Rebuilds a user's taste profile from their rated songs.

use super::centroids::compute_clusters;
use super::features::{normalize, FeatureVector};
use super::kmeans::ClusteringError;
use super::profile::{TasteCluster, TasteProfile};
use crate::catalog_store::SongStore;
use crate::config::ClusteringSettings;
use crate::metrics;
use crate::user::FullUserStore;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Profiles are rebuilt every time the cumulative rating count hits a
/// multiple of this.
pub const REBUILD_EVERY: u64 = 5;

/// `count` is the cumulative rating count the incoming rating produces.
pub fn should_rebuild(count: u64) -> bool {
    count > 0 && count % REBUILD_EVERY == 0
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("clustering failed: {0}")]
    Clustering(#[from] ClusteringError),

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

pub struct TasteProfileBuilder {
    catalog_store: Arc<dyn SongStore>,
    user_store: Arc<dyn FullUserStore>,
    settings: ClusteringSettings,
}

impl TasteProfileBuilder {
    pub fn new(
        catalog_store: Arc<dyn SongStore>,
        user_store: Arc<dyn FullUserStore>,
        settings: ClusteringSettings,
    ) -> Self {
        Self {
            catalog_store,
            user_store,
            settings,
        }
    }

    /// Clusters the user's liked and disliked songs independently and
    /// replaces the stored profile with the result. On error the stored
    /// profile is left as it was.
    pub fn rebuild_profile(&self, user_id: usize) -> Result<TasteProfile, ProfileError> {
        let start = Instant::now();
        let result = self.do_rebuild(user_id);
        metrics::record_profile_rebuild(result.is_ok(), start.elapsed());
        match &result {
            Ok(profile) => info!(
                "Rebuilt taste profile for user {}: {} liked / {} disliked clusters in {:?}",
                user_id,
                profile.liked_clusters.len(),
                profile.disliked_clusters.len(),
                start.elapsed()
            ),
            Err(e) => warn!("Failed to rebuild taste profile for user {}: {}", user_id, e),
        }
        result
    }

    fn do_rebuild(&self, user_id: usize) -> Result<TasteProfile, ProfileError> {
        let rated = self.user_store.get_rated_songs(user_id)?;
        let liked = self.cluster_songs(&rated.liked)?;
        let disliked = self.cluster_songs(&rated.disliked)?;

        self.user_store
            .save_taste_profile(user_id, &liked, &disliked)?;
        Ok(TasteProfile {
            liked_clusters: liked,
            disliked_clusters: disliked,
            ..TasteProfile::empty(user_id)
        })
    }

    /// Fewer than two songs is not enough to describe a region.
    fn cluster_songs(&self, song_ids: &[String]) -> Result<Vec<TasteCluster>, ProfileError> {
        let vectors: Vec<FeatureVector> = self
            .catalog_store
            .get_songs(song_ids)?
            .iter()
            .map(normalize)
            .collect();
        if vectors.len() < song_ids.len() {
            debug!(
                "{} rated songs are missing from the catalog",
                song_ids.len() - vectors.len()
            );
        }
        if vectors.len() < 2 {
            return Ok(vec![]);
        }
        Ok(compute_clusters(&vectors, &self.settings)?)
    }
}
