// src/processing/colorize.rs
//! Diverging colour ramps for normalised-difference bands.

use ndarray::{s, Array3, Zip};
use std::path::Path;

use crate::band::{Band, GeoInfo};
use crate::error::Result;
use crate::io::writer::{self, WriteOptions};
use crate::utils::stats::percentile_bounds;

/// Lower and upper percentiles used for the contrast stretch.
pub const STRETCH_PERCENTILES: (f64, f64) = (0.4, 99.6);

/// Colour painted over no-data pixels.
pub const NO_DATA_COLOUR: Rgb = Rgb::new(255, 255, 255);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy)]
struct ColorStop {
    t: f64,
    color: Rgb,
}

impl ColorStop {
    const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// ColorBrewer red-yellow-green.
const RD_YL_GN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 165, 0, 38),
    ColorStop::new(0.1, 215, 48, 39),
    ColorStop::new(0.2, 244, 109, 67),
    ColorStop::new(0.3, 253, 174, 97),
    ColorStop::new(0.4, 254, 224, 139),
    ColorStop::new(0.5, 255, 255, 191),
    ColorStop::new(0.6, 217, 239, 139),
    ColorStop::new(0.7, 166, 217, 106),
    ColorStop::new(0.8, 102, 189, 99),
    ColorStop::new(0.9, 26, 152, 80),
    ColorStop::new(1.0, 0, 104, 55),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorRamp {
    #[default]
    RdYlGn,
}

impl ColorRamp {
    fn stops(&self) -> &'static [ColorStop] {
        match self {
            ColorRamp::RdYlGn => RD_YL_GN_STOPS,
        }
    }

    /// Colour at position `t`, clamped to [0, 1].
    pub fn evaluate(&self, t: f64) -> Rgb {
        let stops = self.stops();
        if t.is_nan() || t <= 0.0 {
            return stops[0].color;
        }
        if t >= 1.0 {
            return stops[stops.len() - 1].color;
        }
        for pair in stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.t {
                let ratio = (t - lo.t) / (hi.t - lo.t);
                return lerp_color(lo.color, hi.color, ratio);
            }
        }
        stops[stops.len() - 1].color
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(lerp(c1.r, c2.r, t), lerp(c1.g, c2.g, t), lerp(c1.b, c2.b, t))
}

/// Three 8-bit layers in (blue, green, red) order, georeferenced like their source.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    data: Array3<u8>,
    geo: GeoInfo,
}

impl ColorImage {
    /// Layers indexed `(channel, row, col)`, channels blue, green, red.
    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    pub fn geo(&self) -> &GeoInfo {
        &self.geo
    }

    pub fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }

    pub fn pixel(&self, row: usize, col: usize) -> Rgb {
        Rgb::new(
            self.data[[2, row, col]],
            self.data[[1, row, col]],
            self.data[[0, row, col]],
        )
    }

    pub fn save(&self, path: &Path, options: &WriteOptions) -> Result<()> {
        writer::write_raster(&self.data, &self.geo, None, path, options)?;
        log::info!("saved colour image {}", path.display());
        Ok(())
    }
}

/// Stretch position of each value: percentile bounds when they span a
/// range, otherwise the plain [-1, 1] to [0, 1] shift.
fn stretch(bounds: Option<(f64, f64)>) -> impl Fn(f64) -> f64 {
    let range = bounds.filter(|(lo, hi)| hi - lo > f64::EPSILON);
    move |v| match range {
        // (v + 1) stretched by (lo + 1, hi + 1)
        Some((lo, hi)) => ((v + 1.0) - (lo + 1.0)) / ((hi + 1.0) - (lo + 1.0)),
        None => (v + 1.0) / 2.0,
    }
}

/// Colour the first layer of a normalised-difference band.
///
/// Values are stretched between the 0.4th and 99.6th percentiles of the
/// finite pixels and mapped through `ramp`. Masked and non-finite pixels
/// are painted white. The input band is left untouched.
///
/// When those percentiles coincide (a constant raster) or no valid pixel
/// exists, each value `v` is placed at `(v + 1) / 2` on the ramp instead.
pub fn colorize(band: &Band, ramp: ColorRamp) -> Result<ColorImage> {
    let values = band.layer(0);
    let masked = |row: usize, col: usize| band.no_data_mask().map_or(false, |m| m[[row, col]]);

    let bounds = percentile_bounds(
        values
            .indexed_iter()
            .filter(|((row, col), _)| !masked(*row, *col))
            .map(|(_, v)| *v),
        STRETCH_PERCENTILES.0,
        STRETCH_PERCENTILES.1,
    );
    log::debug!("{} stretch bounds {:?}", band.name(), bounds);
    let position = stretch(bounds);

    let (rows, cols) = band.shape();
    let mut data = Array3::<u8>::zeros((3, rows, cols));
    {
        let (mut blue, mut green, mut red) =
            data.multi_slice_mut((s![0, .., ..], s![1, .., ..], s![2, .., ..]));

        Zip::indexed(&values).for_each(|(row, col), &v| {
            let colour = if masked(row, col) || !v.is_finite() {
                NO_DATA_COLOUR
            } else {
                ramp.evaluate(position(v))
            };
            blue[[row, col]] = colour.b;
            green[[row, col]] = colour.g;
            red[[row, col]] = colour.r;
        });
    }

    Ok(ColorImage {
        data,
        geo: band.geo().clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_endpoints_and_midpoint() {
        let ramp = ColorRamp::RdYlGn;
        assert_eq!(ramp.evaluate(0.0), Rgb::new(165, 0, 38));
        assert_eq!(ramp.evaluate(0.5), Rgb::new(255, 255, 191));
        assert_eq!(ramp.evaluate(1.0), Rgb::new(0, 104, 55));
    }

    #[test]
    fn ramp_clamps_out_of_range() {
        let ramp = ColorRamp::RdYlGn;
        assert_eq!(ramp.evaluate(-0.5), ramp.evaluate(0.0));
        assert_eq!(ramp.evaluate(1.5), ramp.evaluate(1.0));
    }

    #[test]
    fn ramp_interpolates_between_stops() {
        let colour = ColorRamp::RdYlGn.evaluate(0.05);
        assert_eq!((colour.r, colour.g), (190, 24));
    }

    #[test]
    fn degenerate_bounds_fall_back_to_shift() {
        let position = stretch(Some((0.25, 0.25)));
        assert!((position(0.5) - 0.75).abs() < 1e-12);
        let position = stretch(None);
        assert!((position(-1.0)).abs() < 1e-12);
    }

    #[test]
    fn constant_band_uses_shifted_position() {
        let geo = GeoInfo::new("WGS 84 / UTM zone 33N", [500000.0, 10.0, 0.0, 4000000.0, 0.0, -10.0]);
        let band = Band::from_layer("ndvi", ndarray::Array2::from_elem((2, 3), 0.5), geo).unwrap();
        let image = colorize(&band, ColorRamp::RdYlGn).unwrap();
        let expected = ColorRamp::RdYlGn.evaluate(0.75);
        assert!((0..2).all(|r| (0..3).all(|c| image.pixel(r, c) == expected)));
    }

    #[test]
    fn bounds_stretch_linearly() {
        let position = stretch(Some((-0.5, 0.5)));
        assert!((position(-0.5)).abs() < 1e-12);
        assert!((position(0.0) - 0.5).abs() < 1e-12);
        assert!((position(0.5) - 1.0).abs() < 1e-12);
    }
}
