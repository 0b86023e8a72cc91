// src/processing/indices/mod.rs
pub mod ndi;
pub mod rgb;

use serde::{Deserialize, Serialize};

use crate::band::{Band, BandId};
use crate::error::Result;

// Re-export indices
pub use ndi::{normalized_difference, NormalizedDifference};
pub use rgb::TrueColor;

/// A product computed from a fixed set of input bands.
pub trait IndexCalculator {
    /// Identifier the result is stored under.
    fn output(&self) -> BandId;

    /// Accepted input combinations, in order of preference.
    fn alternatives(&self) -> &[Vec<BandId>];

    /// Compute from bands ordered as in the chosen alternative.
    fn calculate(&self, inputs: &[&Band]) -> Result<Band>;

    fn name(&self) -> &str {
        self.output().as_str()
    }

    /// First alternative whose bands are all available.
    fn required_bands(&self, available: &dyn Fn(BandId) -> bool) -> Option<&[BandId]> {
        self.alternatives()
            .iter()
            .find(|bands| bands.iter().all(|id| available(*id)))
            .map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Ndvi,
    Ndre,
    Ndwi,
    Rgb,
}

impl IndexKind {
    pub fn output(&self) -> BandId {
        match self {
            IndexKind::Ndvi => BandId::Ndvi,
            IndexKind::Ndre => BandId::Ndre,
            IndexKind::Ndwi => BandId::Ndwi,
            IndexKind::Rgb => BandId::Rgb,
        }
    }
}

/// Band choices for the configurable indices.
///
/// NDVI defaults to B07 as its near-infrared input; B08 is the
/// conventional Sentinel-2 choice and can be selected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBands {
    #[serde(default = "default_ndvi_nir")]
    pub ndvi_nir: BandId,
}

fn default_ndvi_nir() -> BandId {
    BandId::B07
}

impl Default for IndexBands {
    fn default() -> Self {
        Self {
            ndvi_nir: default_ndvi_nir(),
        }
    }
}

impl IndexBands {
    pub fn calculator(&self, kind: IndexKind) -> Box<dyn IndexCalculator> {
        match kind {
            IndexKind::Ndvi => Box::new(NormalizedDifference::ndvi(self.ndvi_nir)),
            IndexKind::Ndre => Box::new(NormalizedDifference::ndre()),
            IndexKind::Ndwi => Box::new(NormalizedDifference::ndwi()),
            IndexKind::Rgb => Box::new(TrueColor::default()),
        }
    }
}

/// Which products the loaded bands allow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub ndvi: bool,
    pub ndre: bool,
    pub ndwi: bool,
    pub rgb: bool,
}

impl Capabilities {
    pub fn supports(&self, kind: IndexKind) -> bool {
        match kind {
            IndexKind::Ndvi => self.ndvi,
            IndexKind::Ndre => self.ndre,
            IndexKind::Ndwi => self.ndwi,
            IndexKind::Rgb => self.rgb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_bands_prefers_codes_then_aliases() {
        let ndvi = NormalizedDifference::ndvi(BandId::B07);
        let codes = |id: BandId| matches!(id, BandId::B04 | BandId::B07);
        assert_eq!(ndvi.required_bands(&codes), Some(&[BandId::B07, BandId::B04][..]));

        let aliases = |id: BandId| matches!(id, BandId::Red | BandId::Nir);
        assert_eq!(ndvi.required_bands(&aliases), Some(&[BandId::Nir, BandId::Red][..]));

        let partial = |id: BandId| id == BandId::B04;
        assert_eq!(ndvi.required_bands(&partial), None);
    }

    #[test]
    fn configurable_ndvi_nir() {
        let bands = IndexBands { ndvi_nir: BandId::B08 };
        let ndvi = bands.calculator(IndexKind::Ndvi);
        assert_eq!(ndvi.alternatives()[0], vec![BandId::B08, BandId::B04]);
        assert_eq!(ndvi.name(), "ndvi");
    }
}
