//! Cluster-count selection
//!
//! - **Silhouette**: per-unit widths and their mean for one partition
//! - **Explained dissimilarity**: between-cluster share of total dissimilarity
//! - **Selection**: score every cut `k = 2..=k_max` and keep the best

mod selection;
mod silhouette;

pub use selection::{select_optimal_k, ClusterEvaluator, CurvePoint, Evaluation, EvaluationParams, DEFAULT_K_MAX};
pub use silhouette::{explained_dissimilarity, silhouette, SilhouetteReport};
