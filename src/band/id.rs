// src/band/id.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Identifier of a band held in a [`BandSet`](crate::processing::BandSet).
///
/// Sentinel-2 spectral bands, the true-colour image, the generic aliases
/// accepted in place of band codes, and the products derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BandId {
    B01,
    B02,
    B03,
    B04,
    B05,
    B06,
    B07,
    B08,
    B8A,
    B09,
    B10,
    B11,
    B12,
    Tci,
    Red,
    Green,
    Blue,
    Nir,
    RedEdge,
    Ndvi,
    Ndre,
    Ndwi,
    Rgb,
}

impl BandId {
    /// Codes searched for in scene file names, in matching order.
    pub const SCENE_TOKENS: &'static [BandId] = &[
        BandId::B01,
        BandId::B02,
        BandId::B03,
        BandId::B04,
        BandId::B05,
        BandId::B06,
        BandId::B07,
        BandId::B08,
        BandId::B8A,
        BandId::B09,
        BandId::B10,
        BandId::B11,
        BandId::B12,
        BandId::Tci,
    ];

    const ALL: &'static [BandId] = &[
        BandId::B01,
        BandId::B02,
        BandId::B03,
        BandId::B04,
        BandId::B05,
        BandId::B06,
        BandId::B07,
        BandId::B08,
        BandId::B8A,
        BandId::B09,
        BandId::B10,
        BandId::B11,
        BandId::B12,
        BandId::Tci,
        BandId::Red,
        BandId::Green,
        BandId::Blue,
        BandId::Nir,
        BandId::RedEdge,
        BandId::Ndvi,
        BandId::Ndre,
        BandId::Ndwi,
        BandId::Rgb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BandId::B01 => "B01",
            BandId::B02 => "B02",
            BandId::B03 => "B03",
            BandId::B04 => "B04",
            BandId::B05 => "B05",
            BandId::B06 => "B06",
            BandId::B07 => "B07",
            BandId::B08 => "B08",
            BandId::B8A => "B8A",
            BandId::B09 => "B09",
            BandId::B10 => "B10",
            BandId::B11 => "B11",
            BandId::B12 => "B12",
            BandId::Tci => "TCI",
            BandId::Red => "red",
            BandId::Green => "green",
            BandId::Blue => "blue",
            BandId::Nir => "nir",
            BandId::RedEdge => "rededge",
            BandId::Ndvi => "ndvi",
            BandId::Ndre => "ndre",
            BandId::Ndwi => "ndwi",
            BandId::Rgb => "rgb",
        }
    }

    /// True for products computed from other bands rather than loaded.
    pub fn is_derived(&self) -> bool {
        matches!(self, BandId::Ndvi | BandId::Ndre | BandId::Ndwi | BandId::Rgb)
    }

    /// Find the first scene token contained in `file_name`.
    pub fn match_file_name(file_name: &str) -> Option<BandId> {
        Self::SCENE_TOKENS
            .iter()
            .copied()
            .find(|id| file_name.contains(id.as_str()))
    }
}

impl fmt::Display for BandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BandId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownBand(s.to_string()))
    }
}

impl TryFrom<String> for BandId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BandId> for String {
    fn from(id: BandId) -> Self {
        id.as_str().to_string()
    }
}
