// src/io/reader.rs
use gdal::{Dataset, Metadata};
use ndarray::Array3;
use std::path::Path;

use crate::band::{Band, GeoInfo};
use crate::error::{Error, Result};

impl GeoInfo {
    /// Projection, geotransform and default-domain metadata of an open dataset.
    pub fn from_dataset(dataset: &Dataset, label: &str) -> Result<Self> {
        let projection = dataset.projection();
        if projection.trim().is_empty() {
            return Err(Error::NotGeoreferenced(label.to_string()));
        }
        let geo_transform = dataset
            .geo_transform()
            .map_err(|_| Error::NotGeoreferenced(label.to_string()))?;

        let metadata = dataset
            .metadata_domain("")
            .unwrap_or_default()
            .iter()
            .filter_map(|item| item.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Ok(Self {
            projection,
            geo_transform,
            metadata,
        })
    }
}

/// Open a raster file and read every layer into a [`Band`].
pub fn load_band(path: &Path) -> Result<Band> {
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let dataset = Dataset::open(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let band = read_dataset(&dataset, &name)?.with_source(Some(path.to_path_buf()));
    log::debug!(
        "loaded {} ({} layers, {:?}, geotransform {:?})",
        path.display(),
        band.layer_count(),
        band.shape(),
        band.geo().geo_transform
    );
    Ok(band)
}

/// Read an already open dataset, promoting pixels to `f64`.
pub fn read_dataset(dataset: &Dataset, name: &str) -> Result<Band> {
    let geo = GeoInfo::from_dataset(dataset, name)?;
    let (width, height) = dataset.raster_size();
    let layers = dataset.raster_count();

    let mut pixels = Vec::with_capacity(layers * width * height);
    let mut no_data_value = None;
    for index in 1..=layers {
        let band = dataset.rasterband(index)?;
        if index == 1 {
            no_data_value = band.no_data_value();
        }
        let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
        pixels.extend_from_slice(buffer.data());
    }

    let data = Array3::from_shape_vec((layers, height, width), pixels)?;
    Band::from_array(name, data, geo, no_data_value)
}
