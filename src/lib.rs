//! Songmatch Server Library
//!
//! Taste clustering and recommendation filtering, exposed for the binary and
//! for integration tests.

pub mod catalog_store;
pub mod config;
pub mod describe;
pub mod metrics;
pub mod recommendation;
pub mod spotify;
pub mod sqlite_persistence;
pub mod taste;
pub mod user;

// Re-export commonly used types for convenience
pub use catalog_store::{SongStore, SqliteCatalogStore};
pub use recommendation::{RecommendationError, RecommendationService};
pub use taste::{TasteProfile, TasteProfileBuilder};
pub use user::{SqliteUserStore, UserManager};
