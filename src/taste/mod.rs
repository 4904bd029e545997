//! Learning per-user taste regions from like/dislike ratings.

mod builder;
mod centroids;
mod elbow;
mod features;
mod kmeans;
mod profile;

pub use builder::{should_rebuild, ProfileError, TasteProfileBuilder, REBUILD_EVERY};
pub use centroids::compute_clusters;
pub use elbow::{select_k, select_k_from_inertias, DEFAULT_ELBOW_THRESHOLD, DEFAULT_MAX_CLUSTERS};
pub use features::{normalize, FeatureVector, FEATURE_DIM};
pub use kmeans::{fit, ClusteringError, KMeansFit, KMeansParams};
pub use profile::{TasteCluster, TasteProfile};
