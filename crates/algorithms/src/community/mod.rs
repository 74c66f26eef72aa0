//! Taxonomic dissimilarity and endemism from presence/absence tables
//!
//! - **Beta diversity**: Simpson (turnover) and Sørensen dissimilarity between sites
//! - **Weighted endemism**: range-size weighted richness per site

mod beta;
mod endemism;

pub use beta::{beta_diversity, simpson_beta, sorensen_beta, BetaDiversity, BetaIndex};
pub use endemism::{weighted_endemism, EndemismScore};
