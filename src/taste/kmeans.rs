//! Seeded k-means over feature vectors, backed by linfa-clustering.

use super::features::{FeatureVector, FEATURE_DIM};
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ClusteringError {
    #[error("cannot cluster an empty set of vectors")]
    EmptyInput,

    #[error("invalid cluster count {k} for {n} vectors")]
    InvalidClusterCount { k: usize, n: usize },

    #[error("feature vector contains a non-finite component")]
    NonFinite,

    #[error("k-means fit failed: {0}")]
    Fit(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct KMeansParams {
    pub seed: u64,
    /// Number of independent restarts; the lowest-inertia fit wins.
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold on the centroid shift between two iterations.
    pub tolerance: f64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            seed: 42,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KMeansFit {
    pub centroids: Vec<FeatureVector>,
    /// Cluster index of each input vector, in input order.
    pub labels: Vec<usize>,
    /// Sum of squared distances from each vector to its centroid.
    pub inertia: f64,
}

impl KMeansFit {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn members<'a>(
        &'a self,
        vectors: &'a [FeatureVector],
        cluster: usize,
    ) -> impl Iterator<Item = &'a FeatureVector> + 'a {
        vectors
            .iter()
            .zip(self.labels.iter())
            .filter(move |(_, label)| **label == cluster)
            .map(|(v, _)| v)
    }
}

pub fn fit(
    vectors: &[FeatureVector],
    k: usize,
    params: &KMeansParams,
) -> Result<KMeansFit, ClusteringError> {
    let n = vectors.len();
    if n == 0 {
        return Err(ClusteringError::EmptyInput);
    }
    if k == 0 || k > n {
        return Err(ClusteringError::InvalidClusterCount { k, n });
    }
    if vectors
        .iter()
        .any(|v| v.components().iter().any(|c| !c.is_finite()))
    {
        return Err(ClusteringError::NonFinite);
    }

    let observations = Array2::from_shape_fn((n, FEATURE_DIM), |(i, j)| vectors[i].components()[j]);
    let dataset = DatasetBase::from(observations.clone());

    let model = KMeans::params_with_rng(k, Xoshiro256Plus::seed_from_u64(params.seed))
        .n_runs(params.n_init.max(1))
        .max_n_iterations(params.max_iter as u64)
        .tolerance(params.tolerance)
        .fit(&dataset)
        .map_err(|e| ClusteringError::Fit(e.to_string()))?;

    let centroids: Vec<FeatureVector> = model
        .centroids()
        .rows()
        .into_iter()
        .map(|row| {
            let mut components = [0.0; FEATURE_DIM];
            for (dst, src) in components.iter_mut().zip(row.iter()) {
                *dst = *src;
            }
            FeatureVector::new(components)
        })
        .collect();
    let labels: Array1<usize> = model.predict(&observations);
    let labels = labels.to_vec();

    // Measured against the final centroids so labels, centroids and inertia agree.
    let inertia = vectors
        .iter()
        .zip(labels.iter())
        .map(|(v, label)| v.squared_distance(&centroids[*label]))
        .sum();

    Ok(KMeansFit {
        centroids,
        labels,
        inertia,
    })
}
