mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{RateOutcome, RatingError, RebuildStatus, UserManager};
pub use user_models::{RatedSongs, Rating, RatingCounts, RatingState};
pub use user_store::{FullUserStore, TasteProfileStore, UserRatingStore, UserStore};
