//! I/O for the plain-text tables and JSON exports used by phyloreg

mod delimited;
mod json;

pub use delimited::{
    parse_community, parse_distance_matrix, parse_geometries, parse_subregions, read_community,
    read_distance_matrix, read_geometries, read_subregions, write_distance_matrix,
};
pub use json::{read_json, write_json};
