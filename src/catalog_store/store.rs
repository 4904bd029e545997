//! SQLite-backed song catalog.

use super::models::{AudioFeatures, Song, SongDefaults};
use super::schema::{SONG_TABLE_V_0, VERSIONED_SCHEMAS};
use super::trait_def::SongStore;
use crate::sqlite_persistence::open_versioned;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SONG_COLUMNS: &str = "external_id, name, artist, acousticness, danceability, duration_ms, \
     energy, instrumentalness, musical_key, liveness, loudness, mode, speechiness, tempo, valence, \
     popularity, flavor_text, image_url, preview_url, external_url";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
        Ok(Song {
            external_id: row.get(0)?,
            name: row.get(1)?,
            artist: row.get(2)?,
            features: AudioFeatures {
                acousticness: row.get(3)?,
                danceability: row.get(4)?,
                duration_ms: row.get(5)?,
                energy: row.get(6)?,
                instrumentalness: row.get(7)?,
                key: row.get(8)?,
                liveness: row.get(9)?,
                loudness: row.get(10)?,
                mode: row.get(11)?,
                speechiness: row.get(12)?,
                tempo: row.get(13)?,
                valence: row.get(14)?,
            },
            popularity: row.get(15)?,
            flavor_text: row.get(16)?,
            image_url: row.get(17)?,
            preview_url: row.get(18)?,
            external_url: row.get(19)?,
        })
    }

    fn select_song(conn: &Connection, external_id: &str) -> Result<Option<Song>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE external_id = ?1",
                SONG_COLUMNS, SONG_TABLE_V_0.name
            ),
            params![external_id],
            Self::song_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to read song {}", external_id))
    }
}

impl SongStore for SqliteCatalogStore {
    fn get_or_create(&self, external_id: &str, defaults: SongDefaults) -> Result<(Song, bool)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let song = Song::from_defaults(external_id, defaults);
        let f = &song.features;
        let inserted = tx.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
                 ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
                SONG_TABLE_V_0.name, SONG_COLUMNS
            ),
            params![
                song.external_id,
                song.name,
                song.artist,
                f.acousticness,
                f.danceability,
                f.duration_ms,
                f.energy,
                f.instrumentalness,
                f.key,
                f.liveness,
                f.loudness,
                f.mode,
                f.speechiness,
                f.tempo,
                f.valence,
                song.popularity,
                song.flavor_text,
                song.image_url,
                song.preview_url,
                song.external_url,
            ],
        )?;

        let stored = Self::select_song(&tx, external_id)?
            .with_context(|| format!("Song {} vanished after insert", external_id))?;
        tx.commit()?;

        let created = inserted == 1;
        if created {
            debug!("Created catalog entry for song {}", external_id);
        }
        Ok((stored, created))
    }

    fn update(&self, song: &Song) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET name = ?2, artist = ?3, popularity = ?4, flavor_text = ?5, \
                 image_url = ?6, preview_url = ?7, external_url = ?8 WHERE external_id = ?1",
                SONG_TABLE_V_0.name
            ),
            params![
                song.external_id,
                song.name,
                song.artist,
                song.popularity,
                song.flavor_text,
                song.image_url,
                song.preview_url,
                song.external_url,
            ],
        )?;
        if updated == 0 {
            bail!("Song {} does not exist", song.external_id);
        }
        Ok(())
    }

    fn get_song(&self, external_id: &str) -> Result<Option<Song>> {
        let conn = self.conn.lock().unwrap();
        Self::select_song(&conn, external_id)
    }

    fn get_songs(&self, external_ids: &[String]) -> Result<Vec<Song>> {
        let conn = self.conn.lock().unwrap();
        let mut songs = Vec::with_capacity(external_ids.len());
        for external_id in external_ids {
            if let Some(song) = Self::select_song(&conn, external_id)? {
                songs.push(song);
            }
        }
        Ok(songs)
    }

    fn get_songs_count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", SONG_TABLE_V_0.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
