//! # phyloreg Colormap
//!
//! Deterministic color assignment for phyloregions.
//!
//! Regions are categorical, so colors come either from a fixed qualitative
//! palette cycled by label index or from hues evenly spaced around the
//! color wheel. The main entry point is [`region_color`].
//!
//! ## Usage
//!
//! ```ignore
//! use phyloreg_colormap::{region_color, RegionPalette};
//!
//! let color = region_color(RegionPalette::Hue, 2, 7);
//! println!("{}", color.to_hex());
//! ```

mod palette;

pub use palette::{region_color, RegionPalette, Rgb};
