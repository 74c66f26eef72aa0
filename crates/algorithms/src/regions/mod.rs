//! Region assembly
//!
//! Maps a partition back onto spatial units: member geometries are dissolved
//! per label and each region gets a palette color.

mod assembler;
mod merge;

pub use assembler::{assemble, Assembly, AssemblyParams, AssemblyWarning, Region};
