//! Normalized audio-feature space.

use crate::catalog_store::Song;
use serde::{Deserialize, Serialize};

pub const FEATURE_DIM: usize = 6;

const TEMPO_OFFSET_BPM: f64 = 50.0;
const TEMPO_RANGE_BPM: f64 = 200.0;

/// `[acousticness, danceability, liveness, normalized_tempo, valence,
/// normalized_popularity]`. Components are meant to sit in `[0, 1]` but tempo
/// and popularity are not clipped.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_DIM]);

impl FeatureVector {
    pub const ZERO: FeatureVector = FeatureVector([0.0; FEATURE_DIM]);

    pub fn new(components: [f64; FEATURE_DIM]) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[f64; FEATURE_DIM] {
        &self.0
    }

    pub fn squared_distance(&self, other: &FeatureVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    pub fn distance(&self, other: &FeatureVector) -> f64 {
        self.squared_distance(other).sqrt()
    }

    pub(crate) fn add_assign(&mut self, other: &FeatureVector) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a += b;
        }
    }

    pub(crate) fn scaled(&self, factor: f64) -> FeatureVector {
        let mut out = self.0;
        for value in out.iter_mut() {
            *value *= factor;
        }
        FeatureVector(out)
    }
}

pub fn normalize_tempo(tempo_bpm: f64) -> f64 {
    (tempo_bpm - TEMPO_OFFSET_BPM) / TEMPO_RANGE_BPM
}

/// Missing popularity counts as 0.
pub fn normalize_popularity(popularity: Option<f64>) -> f64 {
    popularity.unwrap_or(0.0) / 100.0
}

pub fn normalize(song: &Song) -> FeatureVector {
    let f = &song.features;
    FeatureVector([
        f.acousticness,
        f.danceability,
        f.liveness,
        normalize_tempo(f.tempo),
        f.valence,
        normalize_popularity(song.popularity),
    ])
}
