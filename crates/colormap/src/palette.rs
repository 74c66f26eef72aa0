//! Deterministic colors for categorical regions.

use serde::{Deserialize, Serialize};

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` notation.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert from HSV with `h` in degrees and `s`, `v` in [0, 1].
    pub fn from_hsv(h: f64, s: f64, v: f64) -> Self {
        let h = h.rem_euclid(360.0) / 60.0;
        let s = s.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let to_u8 = |f: f64| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(to_u8(r), to_u8(g), to_u8(b))
    }
}

/// How region labels are mapped to colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionPalette {
    /// Fixed 12-color qualitative palette, cycled by label index
    #[default]
    Categorical,
    /// Hues evenly spaced around the color wheel for the region count
    Hue,
}

impl RegionPalette {
    /// All available palettes.
    pub const ALL: &[RegionPalette] = &[Self::Categorical, Self::Hue];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::Hue => "hue",
        }
    }

    /// Parse a palette name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "categorical" | "cat" | "paired" => Some(Self::Categorical),
            "hue" | "rainbow" => Some(Self::Hue),
            _ => None,
        }
    }
}

/// Qualitative palette (ColorBrewer "Paired", reordered so that
/// consecutive labels differ in hue).
const CATEGORICAL: &[Rgb] = &[
    Rgb::new(31, 120, 180),
    Rgb::new(51, 160, 44),
    Rgb::new(227, 26, 28),
    Rgb::new(255, 127, 0),
    Rgb::new(106, 61, 154),
    Rgb::new(177, 89, 40),
    Rgb::new(166, 206, 227),
    Rgb::new(178, 223, 138),
    Rgb::new(251, 154, 153),
    Rgb::new(253, 191, 111),
    Rgb::new(202, 178, 214),
    Rgb::new(255, 255, 153),
];

/// Color for the region at zero-based `index` among `count` regions.
///
/// The result depends only on `(palette, index, count)`.
pub fn region_color(palette: RegionPalette, index: usize, count: usize) -> Rgb {
    match palette {
        RegionPalette::Categorical => CATEGORICAL[index % CATEGORICAL.len()],
        RegionPalette::Hue => {
            let count = count.max(1);
            let hue = 360.0 * (index % count) as f64 / count as f64;
            Rgb::from_hsv(hue, 0.65, 0.9)
        }
    }
}
