//! SongStore trait definition.

use super::models::{Song, SongDefaults};
use anyhow::Result;

/// Durable song catalog keyed by the supplier's external track id.
pub trait SongStore: Send + Sync {
    /// Returns the song with the given external id, creating it from
    /// `defaults` when it does not exist yet. The boolean is true when the
    /// song was created by this call.
    fn get_or_create(&self, external_id: &str, defaults: SongDefaults) -> Result<(Song, bool)>;

    /// Overwrites the mutable fields of an existing song.
    /// Fails if the song does not exist.
    fn update(&self, song: &Song) -> Result<()>;

    /// Returns Ok(None) if the song does not exist.
    fn get_song(&self, external_id: &str) -> Result<Option<Song>>;

    /// Returns the songs that exist among `external_ids`, in the same order.
    /// Missing ids are skipped.
    fn get_songs(&self, external_ids: &[String]) -> Result<Vec<Song>>;

    fn get_songs_count(&self) -> Result<usize>;
}
