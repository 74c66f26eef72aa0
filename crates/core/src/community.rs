//! Site-by-taxon occurrence table

use ndarray::Array2;

use crate::error::{Error, Result};

/// Presence/absence of taxa (columns) at sites (rows).
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityMatrix {
    sites: Vec<String>,
    taxa: Vec<String>,
    presence: Array2<bool>,
}

impl CommunityMatrix {
    pub fn new(sites: Vec<String>, taxa: Vec<String>, presence: Array2<bool>) -> Result<Self> {
        let (rows, cols) = presence.dim();
        if rows != sites.len() || cols != taxa.len() {
            return Err(Error::DimensionMismatch {
                expected: sites.len(),
                rows,
                cols,
            });
        }
        if sites.is_empty() {
            return Err(Error::InsufficientData("community table has no sites".into()));
        }
        Ok(Self { sites, taxa, presence })
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn taxa(&self) -> &[String] {
        &self.taxa
    }

    pub fn presence(&self) -> &Array2<bool> {
        &self.presence
    }

    #[inline]
    pub fn is_present(&self, site: usize, taxon: usize) -> bool {
        self.presence[[site, taxon]]
    }

    /// Number of taxa recorded at `site`.
    pub fn richness(&self, site: usize) -> usize {
        self.presence.row(site).iter().filter(|&&p| p).count()
    }

    /// Number of sites where `taxon` occurs.
    pub fn range_size(&self, taxon: usize) -> usize {
        self.presence.column(taxon).iter().filter(|&&p| p).count()
    }
}
