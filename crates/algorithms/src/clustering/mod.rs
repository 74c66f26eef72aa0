//! Hierarchical clustering of spatial units
//!
//! - **Agglomerative**: UPGMA (average linkage) and other Lance–Williams linkages
//! - **Dendrogram**: merge tree, cuts into k clusters, cophenetic distances
//! - **Linkage selection**: pick the linkage with the best cophenetic correlation

mod agglomerative;
mod dendrogram;
mod linkage;

pub use agglomerative::{cluster, select_linkage, ClusterParams, Clusterer, LinkageChoice};
pub use dendrogram::{Dendrogram, Merge};
pub use linkage::Linkage;
