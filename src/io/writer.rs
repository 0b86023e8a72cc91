// src/io/writer.rs
use gdal::raster::{Buffer, GdalType, RasterCreationOptions};
use gdal::{Dataset, DriverManager, DriverType, Metadata};
use ndarray::{s, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::band::{Band, GeoInfo};
use crate::error::Result;
use crate::utils::fixed_point::{to_fixed_point, FIXED_POINT_NODATA};

/// Pixel encoding of single-band index outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrayEncoding {
    Float32,
    /// `int16` scaled by `scale_factor`, no-data `-10000`.
    FixedPoint { scale_factor: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOptions {
    pub compress: String,
    pub compress_level: Option<u8>,
    pub tiled: bool,
    pub gray: GrayEncoding,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: "LZW".to_string(),
            compress_level: None,
            tiled: false,
            gray: GrayEncoding::Float32,
        }
    }
}

impl WriteOptions {
    fn creation_options(&self) -> RasterCreationOptions {
        let mut options = Vec::new();
        let compress = self.compress.to_uppercase();

        if compress != "NONE" {
            options.push(format!("COMPRESS={compress}"));

            if let Some(level) = self.compress_level {
                match compress.as_str() {
                    "DEFLATE" => options.push(format!("ZLEVEL={}", level.min(9))),
                    "ZSTD" => options.push(format!("ZSTD_LEVEL={}", level.min(22))),
                    _ => {}
                }
            }
        }

        if self.tiled {
            options.push("TILED=YES".to_string());
        }

        RasterCreationOptions::from_iter(options)
    }
}

/// Georeference an array into an in-memory dataset.
pub fn to_memory<T: GdalType + Copy>(
    data: &Array3<T>,
    reference: &GeoInfo,
    no_data_value: Option<f64>,
) -> Result<Dataset> {
    let driver = DriverManager::get_driver_by_name("MEM")?;
    let (layers, rows, cols) = data.dim();
    let mut dataset = driver.create_with_band_type::<T, _>("", cols, rows, layers)?;
    fill(&mut dataset, data, reference, no_data_value)?;
    Ok(dataset)
}

/// Georeference an array and write it to `path`, one raster band per layer.
pub fn write_raster<T: GdalType + Copy>(
    data: &Array3<T>,
    reference: &GeoInfo,
    no_data_value: Option<f64>,
    path: &Path,
    options: &WriteOptions,
) -> Result<()> {
    let mut dataset = create_file(data, reference, no_data_value, path, options)?;
    dataset.flush_cache()?;
    Ok(())
}

/// Write every layer of a band as `float32`.
pub fn write_band(band: &Band, path: &Path, options: &WriteOptions) -> Result<()> {
    let data = band.data().mapv(|v| v as f32);
    write_raster(&data, band.geo(), band.no_data_value(), path, options)
}

/// Write a single-layer index band with the configured [`GrayEncoding`].
pub fn write_gray(band: &Band, path: &Path, options: &WriteOptions) -> Result<()> {
    let scale_factor = match options.gray {
        GrayEncoding::Float32 => {
            let data = band.data().slice(s![0..1, .., ..]).mapv(|v| v as f32);
            return write_raster(&data, band.geo(), None, path, options);
        }
        GrayEncoding::FixedPoint { scale_factor } => scale_factor,
    };

    let (rows, cols) = band.shape();
    let values: Vec<f64> = band.layer(0).iter().copied().collect();
    let mask: Option<Vec<bool>> = band.no_data_mask().map(|m| m.iter().copied().collect());
    let fixed = to_fixed_point(&values, mask.as_deref(), scale_factor)?;
    let data = Array3::from_shape_vec((1, rows, cols), fixed)?;

    let mut dataset = create_file(&data, band.geo(), Some(FIXED_POINT_NODATA as f64), path, options)?;
    {
        let mut raster = dataset.rasterband(1)?;
        raster.set_metadata_item("SCALE", &format!("{}", 1.0 / scale_factor as f64), "")?;
        raster.set_metadata_item("OFFSET", "0", "")?;
        raster.set_description(&format!("{} (scaled by {})", band.name(), scale_factor))?;
    }
    dataset.flush_cache()?;
    Ok(())
}

fn create_file<T: GdalType + Copy>(
    data: &Array3<T>,
    reference: &GeoInfo,
    no_data_value: Option<f64>,
    path: &Path,
    options: &WriteOptions,
) -> Result<Dataset> {
    let driver = match DriverManager::get_output_driver_for_dataset_name(path, DriverType::Raster) {
        Some(driver) => driver,
        None => DriverManager::get_driver_by_name("GTiff")?,
    };
    let (layers, rows, cols) = data.dim();
    let mut dataset = driver.create_with_band_type_with_options::<T, _>(
        path,
        cols,
        rows,
        layers,
        &options.creation_options(),
    )?;
    fill(&mut dataset, data, reference, no_data_value)?;

    log::debug!("writing {} ({} layers, {}x{})", path.display(), layers, rows, cols);
    Ok(dataset)
}

fn fill<T: GdalType + Copy>(
    dataset: &mut Dataset,
    data: &Array3<T>,
    reference: &GeoInfo,
    no_data_value: Option<f64>,
) -> Result<()> {
    dataset.set_projection(&reference.projection)?;
    dataset.set_geo_transform(&reference.geo_transform)?;
    for (key, value) in &reference.metadata {
        dataset.set_metadata_item(key, value, "")?;
    }

    let (_, rows, cols) = data.dim();
    for (index, layer) in data.axis_iter(Axis(0)).enumerate() {
        let mut band = dataset.rasterband(index + 1)?;
        if let Some(value) = no_data_value {
            band.set_no_data_value(Some(value))?;
        }
        let mut buffer = Buffer::new((cols, rows), layer.iter().copied().collect());
        band.write((0, 0), (cols, rows), &mut buffer)?;
    }
    Ok(())
}
