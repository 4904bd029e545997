//! Song catalog storage.

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{AudioFeatures, Song, SongDefaults};
pub use store::SqliteCatalogStore;
pub use trait_def::SongStore;

#[cfg(test)]
pub(crate) use store::tests::song_defaults;
