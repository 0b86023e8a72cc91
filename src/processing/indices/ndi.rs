// src/processing/indices/ndi.rs
use ndarray::{Array2, ArrayView2, Axis, Zip};

use crate::band::{Band, BandId};
use crate::error::{Error, Result};
use crate::processing::indices::IndexCalculator;

/// Normalized Difference Index: (A - B) / (A + B)
///
/// Holds one or more `[A, B]` band pairs; the first pair fully present in
/// a band set is used.
#[derive(Debug, Clone)]
pub struct NormalizedDifference {
    output: BandId,
    alternatives: Vec<Vec<BandId>>,
}

impl NormalizedDifference {
    pub fn new(output: BandId, band_a: BandId, band_b: BandId) -> Self {
        Self {
            output,
            alternatives: vec![vec![band_a, band_b]],
        }
    }

    pub fn with_alternative(mut self, band_a: BandId, band_b: BandId) -> Self {
        self.alternatives.push(vec![band_a, band_b]);
        self
    }

    /// NDVI from `nir` and B04, or the nir/red aliases.
    pub fn ndvi(nir: BandId) -> Self {
        Self::new(BandId::Ndvi, nir, BandId::B04).with_alternative(BandId::Nir, BandId::Red)
    }

    /// NDRE from B07 and B05, or the nir/rededge aliases.
    pub fn ndre() -> Self {
        Self::new(BandId::Ndre, BandId::B07, BandId::B05).with_alternative(BandId::Nir, BandId::RedEdge)
    }

    /// NDWI (Gao 1996) from B08 and B11.
    pub fn ndwi() -> Self {
        Self::new(BandId::Ndwi, BandId::B08, BandId::B11)
    }
}

impl IndexCalculator for NormalizedDifference {
    fn output(&self) -> BandId {
        self.output
    }

    fn alternatives(&self) -> &[Vec<BandId>] {
        &self.alternatives
    }

    fn calculate(&self, inputs: &[&Band]) -> Result<Band> {
        let [band_a, band_b] = inputs else {
            return Err(Error::InvalidOption {
                name: "index inputs",
                value: format!("{} expects 2 bands, got {}", self.output, inputs.len()),
            });
        };

        let (ratio, undefined) = normalized_difference(band_a.layer(0), band_b.layer(0))?;

        Band::from_array(
            self.output.as_str(),
            ratio.insert_axis(Axis(0)),
            band_a.geo().clone(),
            None,
        )?
        .with_no_data_mask(undefined)
    }
}

/// Elementwise `(a - b) / (a + b)` with IEEE semantics (0/0 is NaN, x/0 is
/// ±inf), plus the mask of pixels where `a + b == 0`.
pub fn normalized_difference(
    a: ArrayView2<'_, f64>,
    b: ArrayView2<'_, f64>,
) -> Result<(Array2<f64>, Array2<bool>)> {
    if a.dim() != b.dim() {
        return Err(Error::ShapeMismatch {
            left: a.dim(),
            right: b.dim(),
        });
    }

    let mut ratio = Array2::<f64>::zeros(a.dim());
    let mut undefined = Array2::from_elem(a.dim(), false);

    Zip::from(&mut ratio)
        .and(&mut undefined)
        .and(&a)
        .and(&b)
        .for_each(|r, u, &a_val, &b_val| {
            let denominator = a_val + b_val;
            *r = (a_val - b_val) / denominator;
            *u = denominator == 0.0;
        });

    Ok((ratio, undefined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn known_ratios() {
        let a = array![[5000.0, 3000.0], [1000.0, 0.0]];
        let b = array![[2500.0, 3000.0], [500.0, 0.0]];
        let (ratio, undefined) = normalized_difference(a.view(), b.view()).unwrap();

        assert!((ratio[[0, 0]] - 0.33333).abs() < 1e-4);
        assert_eq!(ratio[[0, 1]], 0.0);
        assert!((ratio[[1, 0]] - 0.33333).abs() < 1e-4);
        assert!(ratio[[1, 1]].is_nan());
        assert_eq!(undefined, array![[false, false], [false, true]]);
    }

    #[test]
    fn opposite_values_divide_to_infinity() {
        let a = array![[5.0]];
        let b = array![[-5.0]];
        let (ratio, undefined) = normalized_difference(a.view(), b.view()).unwrap();
        assert!(ratio[[0, 0]].is_infinite());
        assert!(undefined[[0, 0]]);
    }

    #[test]
    fn values_outside_unit_range_pass_through() {
        let a = array![[5000.0]];
        let b = array![[-999.0]];
        let (ratio, _) = normalized_difference(a.view(), b.view()).unwrap();
        assert!((ratio[[0, 0]] - 1.4993).abs() < 1e-4);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let a = Array2::<f64>::zeros((2, 2));
        let b = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            normalized_difference(a.view(), b.view()),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
