//! Taste clusters and per-user taste profiles.

use super::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// A spherical region of feature space summarizing a group of rated songs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TasteCluster {
    pub centroid: FeatureVector,
    pub radius: f64,
}

impl TasteCluster {
    /// Inclusive: a point exactly on the boundary is a member.
    pub fn contains(&self, vector: &FeatureVector) -> bool {
        self.centroid.distance(vector) <= self.radius
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TasteProfile {
    pub user_id: usize,
    pub liked_clusters: Vec<TasteCluster>,
    pub disliked_clusters: Vec<TasteCluster>,
    pub updated: SystemTime,
}

impl TasteProfile {
    pub fn empty(user_id: usize) -> Self {
        Self {
            user_id,
            liked_clusters: vec![],
            disliked_clusters: vec![],
            updated: SystemTime::now(),
        }
    }

    pub fn in_liked(&self, vector: &FeatureVector) -> bool {
        any_contains(&self.liked_clusters, vector)
    }

    pub fn in_disliked(&self, vector: &FeatureVector) -> bool {
        any_contains(&self.disliked_clusters, vector)
    }
}

fn any_contains(clusters: &[TasteCluster], vector: &FeatureVector) -> bool {
    clusters.iter().any(|c| c.contains(vector))
}
