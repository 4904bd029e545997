//! Turns a set of feature vectors into taste clusters.

use super::elbow::select_k;
use super::features::FeatureVector;
use super::kmeans::{fit, ClusteringError};
use super::profile::TasteCluster;
use crate::config::ClusteringSettings;

/// Clusters `vectors` into `select_k` groups. Each cluster's radius is the
/// largest distance from its centroid to one of its members, 0 when it has
/// none. Clusters are returned in fitted index order.
pub fn compute_clusters(
    vectors: &[FeatureVector],
    settings: &ClusteringSettings,
) -> Result<Vec<TasteCluster>, ClusteringError> {
    let k = select_k(
        vectors,
        settings.max_clusters,
        settings.elbow_threshold,
        &settings.kmeans,
    )?;
    let fitted = fit(vectors, k, &settings.kmeans)?;

    let clusters = fitted
        .centroids
        .iter()
        .enumerate()
        .map(|(index, centroid)| {
            let radius = fitted
                .members(vectors, index)
                .map(|member| centroid.distance(member))
                .fold(0.0, f64::max);
            TasteCluster {
                centroid: *centroid,
                radius,
            }
        })
        .collect();
    Ok(clusters)
}
