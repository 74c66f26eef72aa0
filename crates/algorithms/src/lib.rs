//! # phyloreg Algorithms
//!
//! Phyloregionalization of spatial units from a beta-diversity matrix.
//!
//! ## Available Algorithm Categories
//!
//! - **clustering**: UPGMA and other Lance–Williams linkages, dendrogram cuts
//! - **evaluation**: silhouette scoring and selection of the number of regions
//! - **regions**: dissolving member geometries into colored regions
//! - **pipeline**: staged regionalization and isolated per-subregion batches
//! - **community**: Simpson/Sørensen beta diversity and weighted endemism

pub mod clustering;
pub mod community;
pub mod evaluation;
pub mod pipeline;
pub mod regions;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::clustering::{
        cluster, select_linkage, ClusterParams, Clusterer, Dendrogram, Linkage, Merge,
    };
    pub use crate::community::{
        beta_diversity, simpson_beta, sorensen_beta, weighted_endemism, BetaDiversity, BetaIndex,
    };
    pub use crate::evaluation::{
        select_optimal_k, silhouette, ClusterEvaluator, Evaluation, EvaluationParams,
    };
    pub use crate::pipeline::{
        regionalize, run_batch, run_prepared_batch, split_by_subregion,
        Assembled, BatchReport, Built, RegionalizationParams,
    };
    pub use crate::regions::{assemble, Assembly, AssemblyParams, AssemblyWarning, Region};
    pub use phyloreg_core::prelude::*;
}
