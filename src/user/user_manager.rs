use super::user_models::{Rating, RatingCounts, RatingState};
use super::user_store::FullUserStore;
use crate::catalog_store::SongStore;
use crate::metrics;
use crate::taste::{should_rebuild, TasteProfileBuilder};
use anyhow::{bail, Result};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("unknown user {0}")]
    UnknownUser(usize),

    #[error("unknown song {0}")]
    UnknownSong(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// What happened to the taste profile as a consequence of a rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildStatus {
    /// The rating count is not on a rebuild boundary.
    NotDue,
    Rebuilt,
    /// The rebuild ran and failed. The rating itself is committed and the
    /// previous profile is still in place.
    Failed(String),
}

impl RebuildStatus {
    pub fn is_rebuilt(&self) -> bool {
        matches!(self, RebuildStatus::Rebuilt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateOutcome {
    pub counts: RatingCounts,
    pub rebuild: RebuildStatus,
}

pub struct UserManager {
    catalog_store: Arc<dyn SongStore>,
    user_store: Arc<dyn FullUserStore>,
    profile_builder: Arc<TasteProfileBuilder>,
}

impl UserManager {
    pub fn new(
        catalog_store: Arc<dyn SongStore>,
        user_store: Arc<dyn FullUserStore>,
        profile_builder: Arc<TasteProfileBuilder>,
    ) -> Self {
        Self {
            catalog_store,
            user_store,
            profile_builder,
        }
    }

    pub fn add_user<T: AsRef<str>>(&self, user_handle: T) -> Result<usize> {
        let handle = user_handle.as_ref().trim();
        if handle.is_empty() {
            bail!("The user handle cannot be empty.")
        }
        if self.user_store.get_user_id(handle)?.is_some() {
            bail!("User handle already exists.");
        }
        self.user_store.create_user(handle)
    }

    pub fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        self.user_store.get_user_id(user_handle)
    }

    fn ensure_user(&self, user_id: usize) -> Result<(), RatingError> {
        match self.user_store.get_user_handle(user_id)? {
            Some(_) => Ok(()),
            None => Err(RatingError::UnknownUser(user_id)),
        }
    }

    /// Records a like or dislike. Every call is a rating event, even when the
    /// song already sits in the target set. When the cumulative count lands on
    /// a rebuild boundary the taste profile is rebuilt, including this rating.
    /// A failed rebuild leaves the previous profile in place and is reported
    /// through `RateOutcome::rebuild`.
    pub fn rate_song(
        &self,
        user_id: usize,
        song_id: &str,
        rating: Rating,
    ) -> Result<RateOutcome, RatingError> {
        self.ensure_user(user_id)?;
        if self.catalog_store.get_song(song_id)?.is_none() {
            return Err(RatingError::UnknownSong(song_id.to_string()));
        }

        // Counts as of this write, applied atomically with the set change.
        let counts = self.user_store.apply_rating(user_id, song_id, rating)?;
        metrics::record_rating(rating.as_str());
        debug!(
            "User {} rated {} as {} (total {})",
            user_id,
            song_id,
            rating.as_str(),
            counts.total()
        );

        let mut rebuild = RebuildStatus::NotDue;
        if should_rebuild(counts.total()) {
            info!(
                "User {} reached {} ratings, rebuilding taste profile",
                user_id,
                counts.total()
            );
            rebuild = match self.profile_builder.rebuild_profile(user_id) {
                Ok(_) => RebuildStatus::Rebuilt,
                Err(e) => RebuildStatus::Failed(e.to_string()),
            };
        }

        Ok(RateOutcome { counts, rebuild })
    }

    /// Counters are not touched and no rebuild happens.
    pub fn remove_rating(
        &self,
        user_id: usize,
        song_id: &str,
    ) -> Result<Option<Rating>, RatingError> {
        self.ensure_user(user_id)?;
        let removed = self.user_store.remove_rating(user_id, song_id)?;
        if removed.is_some() {
            metrics::record_rating("remove");
        }
        Ok(removed)
    }

    pub fn rating_state(&self, user_id: usize) -> Result<RatingState, RatingError> {
        self.ensure_user(user_id)?;
        Ok(RatingState {
            songs: self.user_store.get_rated_songs(user_id)?,
            counts: self.user_store.get_rating_counts(user_id)?,
        })
    }
}
