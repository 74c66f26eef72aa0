//! Weighted endemism

use serde::Serialize;

use phyloreg_core::CommunityMatrix;

/// Endemism of one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndemismScore {
    pub site: String,
    /// Number of taxa present
    pub richness: usize,
    /// Sum over present taxa of `1 / range size`
    pub weighted: f64,
    /// `weighted / richness`, 0 for an empty site
    pub corrected: f64,
}

/// Weighted and corrected weighted endemism for every site, in site order.
pub fn weighted_endemism(community: &CommunityMatrix) -> Vec<EndemismScore> {
    let ranges: Vec<usize> = (0..community.taxa().len()).map(|t| community.range_size(t)).collect();

    community
        .sites()
        .iter()
        .enumerate()
        .map(|(s, site)| {
            let mut richness = 0;
            let mut weighted = 0.0;
            for (t, &range) in ranges.iter().enumerate() {
                if community.is_present(s, t) {
                    richness += 1;
                    weighted += 1.0 / range as f64;
                }
            }
            let corrected = if richness > 0 { weighted / richness as f64 } else { 0.0 };
            EndemismScore {
                site: site.clone(),
                richness,
                weighted,
                corrected,
            }
        })
        .collect()
}
