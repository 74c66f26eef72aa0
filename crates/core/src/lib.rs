//! # phyloreg Core
//!
//! Core types, traits and I/O for the phyloreg regionalization library.
//!
//! This crate provides:
//! - `DistanceMatrix`: immutable symmetric dissimilarity over spatial units
//! - `Partition`: assignment of units to contiguous cluster labels
//! - `CommunityMatrix`: site-by-taxon occurrence table
//! - `GeometryLookup` and `Feature` types for the geometry collaborator
//! - Algorithm and dissimilarity-source traits for a consistent API
//! - I/O for the plain-text tables and JSON exports

pub mod community;
pub mod error;
pub mod io;
pub mod matrix;
pub mod partition;
pub mod vector;

pub use community::CommunityMatrix;
pub use error::{Error, ErrorKind, Result};
pub use matrix::DistanceMatrix;
pub use partition::Partition;
pub use vector::{AttributeValue, Feature, FeatureCollection, GeometryLookup};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::community::CommunityMatrix;
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::matrix::DistanceMatrix;
    pub use crate::partition::Partition;
    pub use crate::vector::GeometryLookup;
    pub use crate::{Algorithm, DissimilaritySource};
}

/// Core trait for all algorithms in phyloreg.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

/// Provider of dissimilarity matrices, one per replicate.
///
/// External beta-diversity routines (for instance phylogenetic beta diversity
/// computed over a posterior sample of trees) plug in here. Replicates must
/// share the same unit sequence so they can be averaged.
pub trait DissimilaritySource: Sync {
    /// Number of independent replicates.
    fn replicates(&self) -> usize;

    /// Dissimilarity matrix for replicate `index` (`0..replicates()`).
    fn replicate(&self, index: usize) -> Result<DistanceMatrix>;
}

impl DissimilaritySource for DistanceMatrix {
    fn replicates(&self) -> usize {
        1
    }

    fn replicate(&self, index: usize) -> Result<DistanceMatrix> {
        if index != 0 {
            return Err(Error::InvalidParameter {
                name: "replicate",
                value: index.to_string(),
                reason: "a single matrix has one replicate".into(),
            });
        }
        Ok(self.clone())
    }
}

impl DissimilaritySource for Vec<DistanceMatrix> {
    fn replicates(&self) -> usize {
        self.len()
    }

    fn replicate(&self, index: usize) -> Result<DistanceMatrix> {
        self.get(index).cloned().ok_or_else(|| Error::InvalidParameter {
            name: "replicate",
            value: index.to_string(),
            reason: format!("only {} replicates", self.len()),
        })
    }
}
