use super::user_models::{RatedSongs, Rating, RatingCounts};
use super::user_store::{TasteProfileStore, UserRatingStore, UserStore};
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, ForeignKey, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use crate::taste::{TasteCluster, TasteProfile};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

const USER_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "user",
    foreign_column: "id",
};

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_handle", "handle")],
};
const RATED_SONG_TABLE_V_0: Table = Table {
    name: "rated_song",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("song_id", &SqlType::Text, non_null = true),
        sqlite_column!("rating", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    // One row per (user, song) is what keeps the liked and disliked sets disjoint.
    unique_constraints: &[&["user_id", "song_id"]],
    indices: &[("idx_rated_song_user_id", "user_id")],
};
const RATING_COUNTER_TABLE_V_0: Table = Table {
    name: "rating_counter",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            is_primary_key = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!(
            "liked_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "disliked_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    unique_constraints: &[],
    indices: &[],
};

/// V 1
const TASTE_PROFILE_TABLE_V_1: Table = Table {
    name: "taste_profile",
    columns: &[
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            is_primary_key = true,
            foreign_key = Some(&USER_FOREIGN_KEY)
        ),
        sqlite_column!("liked_clusters", &SqlType::Text, non_null = true),
        sqlite_column!("disliked_clusters", &SqlType::Text, non_null = true),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            USER_TABLE_V_0,
            RATED_SONG_TABLE_V_0,
            RATING_COUNTER_TABLE_V_0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            USER_TABLE_V_0,
            RATED_SONG_TABLE_V_0,
            RATING_COUNTER_TABLE_V_0,
            TASTE_PROFILE_TABLE_V_1,
        ],
        migration: Some(|conn: &Connection| {
            TASTE_PROFILE_TABLE_V_1.create(conn)?;
            Ok(())
        }),
    },
];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn system_time_from_column_result(value: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(value.max(0) as u64)
}

fn read_counts(conn: &Connection, user_id: usize) -> Result<RatingCounts> {
    let counts = conn
        .query_row(
            &format!(
                "SELECT liked_count, disliked_count FROM {} WHERE user_id = ?1",
                RATING_COUNTER_TABLE_V_0.name
            ),
            params![user_id],
            |row| {
                Ok(RatingCounts {
                    liked_count: row.get::<_, i64>(0)? as u64,
                    disliked_count: row.get::<_, i64>(1)? as u64,
                })
            },
        )
        .optional()?;
    Ok(counts.unwrap_or_default())
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, user_handle: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!("INSERT INTO {} (handle) VALUES (?1)", USER_TABLE_V_0.name),
            params![user_handle],
        )
        .with_context(|| format!("Failed to create user {}", user_handle))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user_id(&self, user_handle: &str) -> Result<Option<usize>> {
        let conn = self.conn.lock().unwrap();
        let id = conn
            .query_row(
                &format!("SELECT id FROM {} WHERE handle = ?1", USER_TABLE_V_0.name),
                params![user_handle],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(|id| id as usize))
    }

    fn get_user_handle(&self, user_id: usize) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        Ok(conn
            .query_row(
                &format!("SELECT handle FROM {} WHERE id = ?1", USER_TABLE_V_0.name),
                params![user_id],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl UserRatingStore for SqliteUserStore {
    fn get_rating_counts(&self, user_id: usize) -> Result<RatingCounts> {
        let conn = self.conn.lock().unwrap();
        read_counts(&conn, user_id)
    }

    fn get_rated_songs(&self, user_id: usize) -> Result<RatedSongs> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT song_id, rating FROM {} WHERE user_id = ?1 ORDER BY id",
            RATED_SONG_TABLE_V_0.name
        ))?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut rated = RatedSongs::default();
        for (song_id, rating) in rows {
            match Rating::from_int(rating) {
                Some(Rating::Like) => rated.liked.push(song_id),
                Some(Rating::Dislike) => rated.disliked.push(song_id),
                None => debug!("Skipping unknown rating {} for song {}", rating, song_id),
            }
        }
        Ok(rated)
    }

    fn apply_rating(&self, user_id: usize, song_id: &str, rating: Rating) -> Result<RatingCounts> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            &format!(
                "INSERT INTO {} (user_id, song_id, rating) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(user_id, song_id) DO UPDATE SET rating = excluded.rating",
                RATED_SONG_TABLE_V_0.name
            ),
            params![user_id, song_id, rating.to_int()],
        )
        .with_context(|| format!("Failed to rate song {} for user {}", song_id, user_id))?;

        tx.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (user_id) VALUES (?1)",
                RATING_COUNTER_TABLE_V_0.name
            ),
            params![user_id],
        )?;
        let counter_column = match rating {
            Rating::Like => "liked_count",
            Rating::Dislike => "disliked_count",
        };
        tx.execute(
            &format!(
                "UPDATE {} SET {col} = {col} + 1 WHERE user_id = ?1",
                RATING_COUNTER_TABLE_V_0.name,
                col = counter_column
            ),
            params![user_id],
        )?;

        let counts = read_counts(&tx, user_id)?;
        tx.commit()?;
        Ok(counts)
    }

    fn remove_rating(&self, user_id: usize, song_id: &str) -> Result<Option<Rating>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let existing: Option<i32> = tx
            .query_row(
                &format!(
                    "SELECT rating FROM {} WHERE user_id = ?1 AND song_id = ?2",
                    RATED_SONG_TABLE_V_0.name
                ),
                params![user_id, song_id],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            tx.execute(
                &format!(
                    "DELETE FROM {} WHERE user_id = ?1 AND song_id = ?2",
                    RATED_SONG_TABLE_V_0.name
                ),
                params![user_id, song_id],
            )?;
        }
        tx.commit()?;
        Ok(existing.and_then(Rating::from_int))
    }
}

impl TasteProfileStore for SqliteUserStore {
    fn get_taste_profile(&self, user_id: usize) -> Result<Option<TasteProfile>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT liked_clusters, disliked_clusters, updated FROM {} WHERE user_id = ?1",
                    TASTE_PROFILE_TABLE_V_1.name
                ),
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((liked, disliked, updated)) = row else {
            return Ok(None);
        };
        Ok(Some(TasteProfile {
            user_id,
            liked_clusters: serde_json::from_str(&liked)
                .with_context(|| format!("Corrupt liked clusters for user {}", user_id))?,
            disliked_clusters: serde_json::from_str(&disliked)
                .with_context(|| format!("Corrupt disliked clusters for user {}", user_id))?,
            updated: system_time_from_column_result(updated),
        }))
    }

    fn save_taste_profile(
        &self,
        user_id: usize,
        liked_clusters: &[TasteCluster],
        disliked_clusters: &[TasteCluster],
    ) -> Result<()> {
        let liked = serde_json::to_string(liked_clusters)?;
        let disliked = serde_json::to_string(disliked_clusters)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO {} (user_id, liked_clusters, disliked_clusters, updated) \
                 VALUES (?1, ?2, ?3, {ts}) \
                 ON CONFLICT(user_id) DO UPDATE SET liked_clusters = excluded.liked_clusters, \
                 disliked_clusters = excluded.disliked_clusters, updated = {ts}",
                TASTE_PROFILE_TABLE_V_1.name,
                ts = DEFAULT_TIMESTAMP
            ),
            params![user_id, liked, disliked],
        )
        .with_context(|| format!("Failed to save taste profile for user {}", user_id))?;
        tx.commit()?;
        Ok(())
    }
}
