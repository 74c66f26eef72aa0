//! Regionalization stages
//!
//! Each stage consumes the previous one, so a pipeline can only move
//! forward: `Built -> Clustered -> Evaluated -> Assembled`.

use serde::{Deserialize, Serialize};

use crate::clustering::{cluster, ClusterParams, Dendrogram};
use crate::evaluation::{ClusterEvaluator, Evaluation, EvaluationParams};
use crate::regions::{assemble, Assembly, AssemblyParams, AssemblyWarning, Region};
use phyloreg_core::{DistanceMatrix, GeometryLookup, Partition, Result};

/// Parameters for a full regionalization run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionalizationParams {
    pub cluster: ClusterParams,
    pub evaluation: EvaluationParams,
    pub assembly: AssemblyParams,
}

/// A validated dissimilarity matrix, ready to cluster.
#[derive(Debug, Clone)]
pub struct Built {
    matrix: DistanceMatrix,
}

impl Built {
    pub fn new(matrix: DistanceMatrix) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    pub fn cluster(self, params: &ClusterParams) -> Result<Clustered> {
        let dendrogram = cluster(&self.matrix, params)?;
        Ok(Clustered {
            matrix: self.matrix,
            dendrogram,
        })
    }
}

/// Matrix plus its dendrogram.
#[derive(Debug, Clone)]
pub struct Clustered {
    matrix: DistanceMatrix,
    dendrogram: Dendrogram,
}

impl Clustered {
    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    pub fn dendrogram(&self) -> &Dendrogram {
        &self.dendrogram
    }

    pub fn evaluate(self, params: &EvaluationParams) -> Result<Evaluated> {
        let evaluation = ClusterEvaluator::new(&self.matrix).evaluate(&self.dendrogram, params.k_max)?;
        Ok(Evaluated {
            dendrogram: self.dendrogram,
            evaluation,
        })
    }
}

/// Dendrogram cut at the selected k.
#[derive(Debug, Clone)]
pub struct Evaluated {
    dendrogram: Dendrogram,
    evaluation: Evaluation,
}

impl Evaluated {
    pub fn k(&self) -> usize {
        self.evaluation.k
    }

    pub fn score(&self) -> f64 {
        self.evaluation.score
    }

    pub fn partition(&self) -> &Partition {
        &self.evaluation.partition
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Build regions for the selected partition. Missing geometry only
    /// produces warnings, so this stage cannot fail.
    pub fn assemble<G>(self, lookup: &G, params: &AssemblyParams) -> Assembled
    where
        G: GeometryLookup + ?Sized,
    {
        let assembly = assemble(&self.evaluation.partition, lookup, params);
        Assembled {
            dendrogram: self.dendrogram,
            evaluation: self.evaluation,
            assembly,
        }
    }
}

/// Terminal stage: the regions and everything that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct Assembled {
    pub dendrogram: Dendrogram,
    pub evaluation: Evaluation,
    pub assembly: Assembly,
}

impl Assembled {
    pub fn k(&self) -> usize {
        self.evaluation.k
    }

    pub fn score(&self) -> f64 {
        self.evaluation.score
    }

    pub fn partition(&self) -> &Partition {
        &self.evaluation.partition
    }

    pub fn regions(&self) -> &[Region] {
        &self.assembly.regions
    }

    pub fn warnings(&self) -> &[AssemblyWarning] {
        &self.assembly.warnings
    }
}

/// Run every stage on one matrix.
pub fn regionalize<G>(matrix: DistanceMatrix, lookup: &G, params: &RegionalizationParams) -> Result<Assembled>
where
    G: GeometryLookup + ?Sized,
{
    let evaluated = Built::new(matrix)
        .cluster(&params.cluster)?
        .evaluate(&params.evaluation)?;
    Ok(evaluated.assemble(lookup, &params.assembly))
}
