// src/processing/band_set.rs
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::band::{Band, BandId};
use crate::error::{Error, Result};
use crate::io::warp::Resampling;
use crate::io::writer::{self, WriteOptions};
use crate::processing::crop::crop_to_geometry;
use crate::processing::indices::{Capabilities, IndexBands, IndexKind};

/// Reference system bands are warped into while aligning, unless overridden.
pub const DEFAULT_GRID_SRS: &str = "EPSG:4326";

/// Where a band comes from: a raster file or an already built band.
#[derive(Debug, Clone)]
pub enum BandSource {
    Path(PathBuf),
    Band(Band),
}

impl From<PathBuf> for BandSource {
    fn from(path: PathBuf) -> Self {
        BandSource::Path(path)
    }
}

impl From<&Path> for BandSource {
    fn from(path: &Path) -> Self {
        BandSource::Path(path.to_path_buf())
    }
}

impl From<&str> for BandSource {
    fn from(path: &str) -> Self {
        BandSource::Path(PathBuf::from(path))
    }
}

impl From<Band> for BandSource {
    fn from(band: Band) -> Self {
        BandSource::Band(band)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSetOptions {
    /// Resize every band onto a common grid after loading.
    #[serde(default = "default_true")]
    pub align: bool,
    /// `(height, width)` of the common grid; the largest band extent when unset.
    #[serde(default)]
    pub target_shape: Option<(usize, usize)>,
    /// Reference system of the common grid; `None` keeps each band's own.
    #[serde(default = "default_grid_srs")]
    pub grid_srs: Option<String>,
    #[serde(default)]
    pub resampling: Resampling,
    #[serde(default)]
    pub indices: IndexBands,
}

fn default_true() -> bool {
    true
}

fn default_grid_srs() -> Option<String> {
    Some(DEFAULT_GRID_SRS.to_string())
}

impl Default for BandSetOptions {
    fn default() -> Self {
        Self {
            align: true,
            target_shape: None,
            grid_srs: default_grid_srs(),
            resampling: Resampling::default(),
            indices: IndexBands::default(),
        }
    }
}

/// Bands of one scene keyed by identifier, plus the products computed from them.
#[derive(Debug, Clone)]
pub struct BandSet {
    bands: BTreeMap<BandId, Band>,
    options: BandSetOptions,
    capabilities: Capabilities,
}

impl BandSet {
    /// Load every source, skipping (and logging) those that fail, then
    /// align them onto one grid unless `options.align` is off.
    pub fn new<I, S>(sources: I, options: BandSetOptions) -> Result<Self>
    where
        I: IntoIterator<Item = (BandId, S)>,
        S: Into<BandSource>,
    {
        let mut bands = BTreeMap::new();
        for (id, source) in sources {
            let band = match source.into() {
                BandSource::Band(band) => band,
                BandSource::Path(path) => match Band::open(&path) {
                    Ok(band) => band,
                    Err(e) => {
                        log::warn!("Band {} ({}) has failed: {}", id, path.display(), e);
                        continue;
                    }
                },
            };
            log::info!("Adding band {} ({})", id, band.name());
            bands.insert(id, band);
        }

        let mut set = Self {
            bands,
            options,
            capabilities: Capabilities::default(),
        };
        set.refresh_capabilities();

        if set.options.align {
            set.align(set.options.target_shape)?;
        } else {
            log::warn!("bands are not aligned; bands of different shapes cannot be combined");
        }

        Ok(set)
    }

    pub fn options(&self) -> &BandSetOptions {
        &self.options
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn get(&self, id: BandId) -> Option<&Band> {
        self.bands.get(&id)
    }

    pub fn contains(&self, id: BandId) -> bool {
        self.bands.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = BandId> + '_ {
        self.bands.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BandId, &Band)> {
        self.bands.iter().map(|(id, band)| (*id, band))
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Insert or replace a band. The caller is responsible for its grid.
    pub fn insert(&mut self, id: BandId, band: Band) -> Option<Band> {
        let previous = self.bands.insert(id, band);
        self.refresh_capabilities();
        previous
    }

    fn refresh_capabilities(&mut self) {
        let available = |id: BandId| self.bands.contains_key(&id);
        let supports = |kind: IndexKind| {
            self.options
                .indices
                .calculator(kind)
                .required_bands(&available)
                .is_some()
        };

        self.capabilities = Capabilities {
            ndvi: supports(IndexKind::Ndvi),
            ndre: supports(IndexKind::Ndre),
            ndwi: supports(IndexKind::Ndwi),
            rgb: supports(IndexKind::Rgb),
        };
        log::debug!("capabilities {:?}", self.capabilities);
    }

    /// `requested`, or the largest height and largest width over all bands.
    pub fn target_shape(&self, requested: Option<(usize, usize)>) -> Option<(usize, usize)> {
        requested.or_else(|| {
            let rows = self.bands.values().map(|b| b.shape().0).max()?;
            let cols = self.bands.values().map(|b| b.shape().1).max()?;
            Some((rows, cols))
        })
    }

    /// Resize every band to a common `(height, width)` grid.
    pub fn align(&mut self, shape: Option<(usize, usize)>) -> Result<()> {
        let Some(shape) = self.target_shape(shape) else {
            return Ok(());
        };
        let srs = self.options.grid_srs.clone();
        let resampling = self.options.resampling;
        log::info!(
            "aligning {} bands to {}x{} ({})",
            self.bands.len(),
            shape.0,
            shape.1,
            srs.as_deref().unwrap_or("native reference")
        );

        for band in self.bands.values_mut() {
            if srs.is_none() && band.shape() == shape {
                continue;
            }
            *band = band.resize(shape, srs.as_deref(), resampling)?;
        }
        Ok(())
    }

    /// Clip every band to a boundary file. A missing file is logged and ignored.
    pub fn crop_to_geometry(&mut self, geometry: &Path) -> Result<()> {
        if !geometry.is_file() {
            log::warn!("{}", Error::GeometryNotFound(geometry.to_path_buf()));
            return Ok(());
        }
        for band in self.bands.values_mut() {
            *band = crop_to_geometry(band, geometry, None)?;
        }
        Ok(())
    }

    /// Resample every band to a ground sample distance in metres.
    pub fn resample_to_pixel_size(&mut self, x_m: f64, y_m: f64) -> Result<()> {
        if !(x_m > 0.0 && y_m > 0.0) {
            return Err(Error::InvalidOption {
                name: "pixel size",
                value: format!("{x_m}x{y_m}"),
            });
        }
        for band in self.bands.values_mut() {
            *band = band.resample(x_m, y_m, Resampling::Nearest)?;
        }
        Ok(())
    }

    /// Reproject every band to `srs`.
    pub fn reproject(&mut self, srs: &str) -> Result<()> {
        for band in self.bands.values_mut() {
            *band = band.reproject(srs)?;
        }
        Ok(())
    }

    /// Write every band next to `save_path` with its identifier inserted
    /// before the extension (`band_raster_.tif` in the working directory by default).
    pub fn save_all(&self, save_path: Option<&Path>, options: &WriteOptions) -> Result<Vec<PathBuf>> {
        let save_path = match save_path {
            Some(path) => path.to_path_buf(),
            None => std::env::current_dir()?.join("band_raster_.tif"),
        };

        self.bands
            .iter()
            .map(|(id, band)| {
                let path = band_file_name(&save_path, *id);
                writer::write_band(band, &path, options)?;
                Ok(path)
            })
            .collect()
    }

    /// Compute an index and store it under its output identifier.
    ///
    /// Returns `Ok(None)` (after logging) when the required bands are missing.
    pub fn compute(&mut self, kind: IndexKind) -> Result<Option<&Band>> {
        let calculator = self.options.indices.calculator(kind);
        let available = |id: BandId| self.bands.contains_key(&id);

        let Some(required) = calculator.required_bands(&available) else {
            let wanted = calculator
                .alternatives()
                .iter()
                .map(|bands| bands.iter().join("+"))
                .join(" or ");
            log::warn!(
                "cannot compute {}: requires {}, have {}",
                calculator.name(),
                wanted,
                self.bands.keys().join(", ")
            );
            return Ok(None);
        };

        let inputs = required
            .iter()
            .map(|id| self.bands.get(id).ok_or(Error::MissingBand(*id)))
            .collect::<Result<Vec<_>>>()?;
        let result = calculator.calculate(&inputs)?;
        log::info!("computed {} from {}", calculator.name(), required.iter().join(", "));

        let output = calculator.output();
        self.bands.insert(output, result);
        Ok(self.bands.get(&output))
    }

    pub fn compute_ndvi(&mut self) -> Result<Option<&Band>> {
        self.compute(IndexKind::Ndvi)
    }

    pub fn compute_ndre(&mut self) -> Result<Option<&Band>> {
        self.compute(IndexKind::Ndre)
    }

    pub fn compute_ndwi(&mut self) -> Result<Option<&Band>> {
        self.compute(IndexKind::Ndwi)
    }

    pub fn compute_rgb(&mut self) -> Result<Option<&Band>> {
        self.compute(IndexKind::Rgb)
    }
}

fn band_file_name(template: &Path, id: BandId) -> PathBuf {
    let stem = template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match template.extension() {
        Some(ext) => format!("{}{}.{}", stem, id, ext.to_string_lossy()),
        None => format!("{}{}", stem, id),
    };
    template.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_file_names_insert_identifier() {
        let path = band_file_name(Path::new("/tmp/out/band_raster_.tif"), BandId::B04);
        assert_eq!(path, PathBuf::from("/tmp/out/band_raster_B04.tif"));
        let path = band_file_name(Path::new("scene"), BandId::Ndvi);
        assert_eq!(path, PathBuf::from("scenendvi"));
    }

    #[test]
    fn default_options() {
        let options = BandSetOptions::default();
        assert!(options.align);
        assert_eq!(options.grid_srs.as_deref(), Some("EPSG:4326"));
        assert_eq!(options.resampling, Resampling::Cubic);
        assert_eq!(options.indices.ndvi_nir, BandId::B07);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: BandSetOptions =
            serde_json::from_str(r#"{"target_shape": [10, 20], "grid_srs": null}"#).unwrap();
        assert!(options.align);
        assert_eq!(options.target_shape, Some((10, 20)));
        assert_eq!(options.grid_srs, None);
    }
}
