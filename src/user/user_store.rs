use super::user_models::{RatedSongs, Rating, RatingCounts};
use crate::taste::{TasteCluster, TasteProfile};
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a new user and returns the user id.
    fn create_user(&self, user_handle: &str) -> Result<usize>;

    /// Returns a user's id given the user handle.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>>;

    /// Returns a user's handle given the user id.
    /// Returns Ok(None) if the user does not exist.
    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>>;
}

pub trait UserRatingStore: Send + Sync {
    /// Returns zero counts for a user that never rated anything.
    fn get_rating_counts(&self, user_id: usize) -> Result<RatingCounts>;

    fn get_rated_songs(&self, user_id: usize) -> Result<RatedSongs>;

    /// Puts `song_id` in the set matching `rating`, removing it from the other
    /// one, and increments the matching counter. Both changes are applied in
    /// a single transaction. Returns the counts after the change.
    fn apply_rating(&self, user_id: usize, song_id: &str, rating: Rating) -> Result<RatingCounts>;

    /// Removes `song_id` from whichever set holds it, leaving the counters
    /// untouched. Returns the rating that was removed, if any.
    fn remove_rating(&self, user_id: usize, song_id: &str) -> Result<Option<Rating>>;
}

pub trait TasteProfileStore: Send + Sync {
    /// Returns Ok(None) if no profile was ever built for the user.
    fn get_taste_profile(&self, user_id: usize) -> Result<Option<TasteProfile>>;

    /// Replaces both cluster lists of the user's profile in one transaction,
    /// creating the profile if needed.
    fn save_taste_profile(
        &self,
        user_id: usize,
        liked_clusters: &[TasteCluster],
        disliked_clusters: &[TasteCluster],
    ) -> Result<()>;
}

pub trait FullUserStore: UserStore + UserRatingStore + TasteProfileStore {}

impl<T: UserStore + UserRatingStore + TasteProfileStore> FullUserStore for T {}
