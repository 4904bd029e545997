//! User rating models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Like,
    Dislike,
}

impl Rating {
    pub fn to_int(&self) -> i32 {
        match self {
            Rating::Like => 1,
            Rating::Dislike => 2,
        }
    }

    pub fn from_int(value: i32) -> Option<Self> {
        match value {
            1 => Some(Rating::Like),
            2 => Some(Rating::Dislike),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Like => "like",
            Rating::Dislike => "dislike",
        }
    }
}

/// Cumulative rating events. These only ever grow, removing a rating does
/// not decrement them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingCounts {
    pub liked_count: u64,
    pub disliked_count: u64,
}

impl RatingCounts {
    pub fn total(&self) -> u64 {
        self.liked_count + self.disliked_count
    }
}

/// Current membership of a user's liked and disliked sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatedSongs {
    pub liked: Vec<String>,
    pub disliked: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingState {
    pub songs: RatedSongs,
    pub counts: RatingCounts,
}
