//! Cluster-count selection by the elbow heuristic.

use super::features::FeatureVector;
use super::kmeans::{fit, ClusteringError, KMeansParams};

pub const DEFAULT_MAX_CLUSTERS: usize = 10;
pub const DEFAULT_ELBOW_THRESHOLD: f64 = 0.1;

/// Picks a cluster count for `vectors`, always in `[1, min(max_k, N)]`.
pub fn select_k(
    vectors: &[FeatureVector],
    max_k: usize,
    threshold: f64,
    params: &KMeansParams,
) -> Result<usize, ClusteringError> {
    if vectors.is_empty() {
        return Err(ClusteringError::EmptyInput);
    }
    let upper = max_k.max(1).min(vectors.len());
    if upper == 1 {
        return Ok(1);
    }

    let inertias = (1..=upper)
        .map(|k| fit(vectors, k, params).map(|f| f.inertia))
        .collect::<Result<Vec<f64>, _>>()?;
    Ok(select_k_from_inertias(&inertias, threshold))
}

/// `inertias[i]` is the inertia of the fit with `i + 1` clusters.
///
/// Returns `i + 2` for the first index `i` of the second difference whose
/// magnitude is below `threshold`, or 1 when there is none.
pub fn select_k_from_inertias(inertias: &[f64], threshold: f64) -> usize {
    let first: Vec<f64> = inertias.windows(2).map(|w| w[1] - w[0]).collect();
    let second = first.windows(2).map(|w| w[1] - w[0]);
    second
        .enumerate()
        .find(|(_, d2)| d2.abs() < threshold)
        .map(|(i, _)| i + 2)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_flat_second_difference() {
        // d1 = [-6, -1, -0.5, -0.45], d2 = [5, 0.5, 0.05]
        let inertias = [10.0, 4.0, 3.0, 2.5, 2.05];
        assert_eq!(select_k_from_inertias(&inertias, 0.1), 4);
    }

    #[test]
    fn no_flat_point_means_one_cluster() {
        let inertias = [10.0, 5.0, 2.0, 1.5];
        assert_eq!(select_k_from_inertias(&inertias, 0.1), 1);
    }

    #[test]
    fn too_few_inertias_means_one_cluster() {
        assert_eq!(select_k_from_inertias(&[], 0.1), 1);
        assert_eq!(select_k_from_inertias(&[1.0], 0.1), 1);
        assert_eq!(select_k_from_inertias(&[1.0, 0.0], 0.1), 1);
    }

    #[test]
    fn single_vector_is_one_cluster() {
        let vectors = vec![FeatureVector::new([0.5; 6])];
        assert_eq!(
            select_k(&vectors, 10, 0.1, &KMeansParams::default()).unwrap(),
            1
        );
    }

    #[test]
    fn empty_input_fails() {
        assert_eq!(
            select_k(&[], 10, 0.1, &KMeansParams::default()),
            Err(ClusteringError::EmptyInput)
        );
    }

    #[test]
    fn stays_within_bounds() {
        let params = KMeansParams::default();
        for n in 1..=14 {
            let vectors: Vec<FeatureVector> = (0..n)
                .map(|i| {
                    let x = (i as f64 * 0.37).fract();
                    let y = (i as f64 * 0.61).fract();
                    FeatureVector::new([x, y, x * y, 0.5, 1.0 - x, 0.2])
                })
                .collect();
            let k = select_k(
                &vectors,
                DEFAULT_MAX_CLUSTERS,
                DEFAULT_ELBOW_THRESHOLD,
                &params,
            )
            .unwrap();
            assert!(k >= 1 && k <= n.min(DEFAULT_MAX_CLUSTERS), "n={} k={}", n, k);
        }
    }

    #[test]
    fn identical_vectors_flatten_immediately() {
        let vectors = vec![FeatureVector::new([0.4; 6]); 5];
        // Every inertia is zero, so the first second difference is flat.
        assert_eq!(
            select_k(&vectors, 10, 0.1, &KMeansParams::default()).unwrap(),
            2
        );
    }
}
