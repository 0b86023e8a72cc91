// src/processing/indices/rgb.rs
use ndarray::{stack, Array2, Axis};

use crate::band::{Band, BandId};
use crate::error::{Error, Result};
use crate::processing::indices::IndexCalculator;

/// True-colour composite, stacked as (blue, green, red) layers.
#[derive(Debug, Clone)]
pub struct TrueColor {
    alternatives: Vec<Vec<BandId>>,
}

impl Default for TrueColor {
    fn default() -> Self {
        Self {
            alternatives: vec![
                vec![BandId::B02, BandId::B03, BandId::B04],
                vec![BandId::Blue, BandId::Green, BandId::Red],
            ],
        }
    }
}

impl IndexCalculator for TrueColor {
    fn output(&self) -> BandId {
        BandId::Rgb
    }

    fn alternatives(&self) -> &[Vec<BandId>] {
        &self.alternatives
    }

    fn calculate(&self, inputs: &[&Band]) -> Result<Band> {
        let [blue, green, red] = inputs else {
            return Err(Error::InvalidOption {
                name: "index inputs",
                value: format!("rgb expects 3 bands, got {}", inputs.len()),
            });
        };

        for band in [green, red] {
            if band.shape() != blue.shape() {
                return Err(Error::ShapeMismatch {
                    left: blue.shape(),
                    right: band.shape(),
                });
            }
        }

        let data = stack(Axis(0), &[blue.layer(0), green.layer(0), red.layer(0)])?;

        let mut mask = Array2::from_elem(blue.shape(), false);
        let mut masked = false;
        for band in [blue, green, red] {
            if let Some(band_mask) = band.no_data_mask() {
                mask.zip_mut_with(band_mask, |m, &b| *m |= b);
                masked = true;
            }
        }

        let composite = Band::from_array(BandId::Rgb.as_str(), data, blue.geo().clone(), None)?;
        if masked {
            composite.with_no_data_mask(mask)
        } else {
            Ok(composite)
        }
    }
}
