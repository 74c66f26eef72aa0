//! # phyloreg Parallel
//!
//! Parallel processing strategies for independent regionalization work.
//!
//! This crate provides:
//! - `ProcessingMode`: sequential, all-core or fixed-size rayon execution
//! - Replicate averaging for dissimilarity sources

pub mod replicates;
pub mod strategy;

pub use replicates::mean_over_replicates;
pub use strategy::{num_cpus, ParallelStrategy, ProcessingMode};
