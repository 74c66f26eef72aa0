//! End-to-end regionalization
//!
//! - **Stages**: `Built -> Clustered -> Evaluated -> Assembled`, one forward step each
//! - **Batch**: one isolated pipeline per subregion, results keyed by name

mod batch;
mod stages;

pub use batch::{run_batch, run_prepared_batch, split_by_subregion, BatchReport, SubregionOutcome, SubregionSummary};
pub use stages::{regionalize, Assembled, Built, Clustered, Evaluated, RegionalizationParams};
