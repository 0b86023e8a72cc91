// src/band/mod.rs
//! In-memory georeferenced bands.
//!
//! A [`Band`] owns its pixels as a `(layers, rows, cols)` array of `f64`
//! together with the projection, geotransform and metadata needed to write
//! it back out or to hand it to GDAL for warping.

pub mod geodesy;
pub mod id;

use std::path::{Path, PathBuf};
use std::time::Instant;

use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::io::warp::{self, Resampling, WarpArgs};
use crate::io::{reader, writer};

pub use geodesy::UtmZone;
pub use id::BandId;

/// Projection, affine geotransform and default-domain metadata of a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
    pub metadata: Vec<(String, String)>,
}

impl GeoInfo {
    pub fn new(projection: impl Into<String>, geo_transform: [f64; 6]) -> Self {
        Self {
            projection: projection.into(),
            geo_transform,
            metadata: Vec::new(),
        }
    }

    /// Map a `(row, col)` pixel corner to `(y, x)` in projection units.
    pub fn pixel_to_geo(&self, row: f64, col: f64) -> (f64, f64) {
        let gt = &self.geo_transform;
        let x = gt[0] + col * gt[1] + row * gt[2];
        let y = gt[3] + col * gt[4] + row * gt[5];
        (y, x)
    }

    /// Projection descriptors naming a UTM zone are treated as projected;
    /// everything else as geographic degrees.
    pub fn is_utm(&self) -> bool {
        self.projection.to_lowercase().contains("utm")
    }
}

/// Pixel size and zone information derived from a band's [`GeoInfo`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialInfo {
    /// Pixel width in projection units.
    pub pixel_width: f64,
    /// Pixel height in projection units, always positive.
    pub pixel_height: f64,
    pub pixel_width_m: f64,
    pub pixel_height_m: f64,
    pub utm: bool,
    /// Upper-left corner as `(x, y)` in projection units.
    pub origin: (f64, f64),
    pub zone: Option<UtmZone>,
    pub epsg: Option<String>,
}

impl SpatialInfo {
    pub fn from_geo(geo: &GeoInfo) -> Self {
        let gt = &geo.geo_transform;
        let pixel_width = gt[1];
        let pixel_height = gt[5].abs();
        let origin = (gt[0], gt[3]);

        if geo.is_utm() {
            let zone = geodesy::parse_utm_zone(&geo.projection);
            if zone.is_none() {
                log::debug!("no UTM zone declaration found in projection");
            }
            let epsg = zone
                .as_ref()
                .map(|z| z.epsg_code(z.letter == Some('S')));
            return Self {
                pixel_width,
                pixel_height,
                pixel_width_m: pixel_width,
                pixel_height_m: pixel_height,
                utm: true,
                origin,
                zone,
                epsg,
            };
        }

        // Geographic: measure the first pixel's edges on the sphere.
        let (lon, lat) = origin;
        let right = geo.pixel_to_geo(0.0, 1.0);
        let bottom = geo.pixel_to_geo(1.0, 0.0);
        let pixel_width_m = geodesy::haversine_km(right, (lat, lon)) * 1000.0;
        let pixel_height_m = geodesy::haversine_km(bottom, (lat, lon)) * 1000.0;

        let zone = geodesy::utm_zone_from_latlon(lat, lon);
        let epsg = zone.as_ref().map(|z| z.epsg_code(lat < 0.0));

        Self {
            pixel_width,
            pixel_height,
            pixel_width_m,
            pixel_height_m,
            utm: false,
            origin,
            zone,
            epsg,
        }
    }
}

/// A named, georeferenced stack of pixel layers.
#[derive(Debug, Clone)]
pub struct Band {
    name: String,
    source: Option<PathBuf>,
    data: Array3<f64>,
    geo: GeoInfo,
    spatial: SpatialInfo,
    no_data_value: Option<f64>,
    no_data_mask: Option<Array2<bool>>,
}

impl Band {
    /// Load a band from a raster file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        reader::load_band(path.as_ref())
    }

    /// Wrap a `(layers, rows, cols)` array. Fails when `geo` carries no
    /// projection or `data` has no layers.
    pub fn from_array(
        name: impl Into<String>,
        data: Array3<f64>,
        geo: GeoInfo,
        no_data_value: Option<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if geo.projection.trim().is_empty() {
            return Err(Error::NotGeoreferenced(name));
        }
        if data.len_of(Axis(0)) == 0 {
            return Err(Error::NoLayers(name));
        }

        let no_data_mask = no_data_value.map(|value| no_data_mask(&data, value));
        let spatial = SpatialInfo::from_geo(&geo);

        Ok(Self {
            name,
            source: None,
            data,
            geo,
            spatial,
            no_data_value,
            no_data_mask,
        })
    }

    /// Wrap a single 2D layer.
    pub fn from_layer(name: impl Into<String>, layer: Array2<f64>, geo: GeoInfo) -> Result<Self> {
        Self::from_array(name, layer.insert_axis(Axis(0)), geo, None)
    }

    pub(crate) fn with_source(mut self, source: Option<PathBuf>) -> Self {
        self.source = source;
        self
    }

    /// Replace the no-data mask, e.g. with the undefined-ratio mask of an index.
    pub fn with_no_data_mask(mut self, mask: Array2<bool>) -> Result<Self> {
        if mask.dim() != self.shape() {
            return Err(Error::ShapeMismatch {
                left: self.shape(),
                right: mask.dim(),
            });
        }
        self.no_data_mask = Some(mask);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// All layers, indexed `(layer, row, col)`.
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn layer(&self, index: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), index)
    }

    pub fn layer_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }

    pub fn geo(&self) -> &GeoInfo {
        &self.geo
    }

    pub fn spatial(&self) -> &SpatialInfo {
        &self.spatial
    }

    pub fn no_data_value(&self) -> Option<f64> {
        self.no_data_value
    }

    pub fn no_data_mask(&self) -> Option<&Array2<bool>> {
        self.no_data_mask.as_ref()
    }

    /// Warp through GDAL and return the result as a new band with the same name.
    pub fn warp(&self, args: &WarpArgs) -> Result<Band> {
        let start = Instant::now();
        let src = writer::to_memory(&self.data, &self.geo, self.no_data_value)?;
        let warped = warp::warp(&src, None, args)?;
        let band = reader::read_dataset(&warped, &self.name)?.with_source(self.source.clone());
        log::debug!(
            "warped {} {:?} -> {:?} in {:?}",
            self.name,
            self.shape(),
            band.shape(),
            start.elapsed()
        );
        Ok(band)
    }

    /// Resize to `(rows, cols)`, optionally reprojecting to `srs` on the way.
    pub fn resize(&self, shape: (usize, usize), srs: Option<&str>, resampling: Resampling) -> Result<Band> {
        let mut args = WarpArgs::new()
            .target_size(shape.1, shape.0)
            .resampling(resampling);
        if let Some(srs) = srs {
            args = args.target_srs(srs);
        }
        self.warp(&args)
    }

    /// Resample to a ground sample distance given in metres.
    pub fn resample(&self, x_m: f64, y_m: f64, resampling: Resampling) -> Result<Band> {
        let (mut x_res, mut y_res) = (x_m, y_m);
        if !self.spatial.utm {
            x_res = x_m / self.spatial.pixel_width_m * self.spatial.pixel_width;
            y_res = y_m / self.spatial.pixel_height_m * self.spatial.pixel_height;
        }
        self.warp(&WarpArgs::new().resolution(x_res, y_res).resampling(resampling))
    }

    pub fn reproject(&self, srs: &str) -> Result<Band> {
        self.warp(&WarpArgs::new().target_srs(srs))
    }

    /// Reproject into the UTM zone covering the band's origin.
    pub fn to_utm(&self) -> Result<Band> {
        match &self.spatial.epsg {
            Some(epsg) => self.reproject(epsg),
            None => Err(Error::InvalidOption {
                name: "utm zone",
                value: format!("no zone known for band {}", self.name),
            }),
        }
    }
}

impl PartialEq for Band {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

/// A pixel is no-data when any of its layers equals `value`. A NaN sentinel matches NaN.
pub fn no_data_mask(data: &Array3<f64>, value: f64) -> Array2<bool> {
    let (_, rows, cols) = data.dim();
    let matches = |v: f64| if value.is_nan() { v.is_nan() } else { v == value };

    let mut mask = Array2::from_elem((rows, cols), false);
    for layer in data.axis_iter(Axis(0)) {
        mask.zip_mut_with(&layer, |m, &v| *m |= matches(v));
    }
    mask
}
