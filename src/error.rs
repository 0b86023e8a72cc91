// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

use crate::band::BandId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file {0} does not exist")]
    NotFound(PathBuf),

    #[error("{0} is not a georeferenced datasource")]
    NotGeoreferenced(String),

    #[error("{0} has no raster layers")]
    NoLayers(String),

    #[error("geometry file {0} does not exist")]
    GeometryNotFound(PathBuf),

    #[error("unknown band identifier `{0}`")]
    UnknownBand(String),

    #[error("band {0} is not present in the band set")]
    MissingBand(BandId),

    #[error("shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("GDAL warp failed: {0}")]
    Warp(String),

    #[error("string contains an interior nul byte: {0}")]
    Nul(#[from] std::ffi::NulError),

    #[error("invalid batch configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid value for {name}: {value}")]
    InvalidOption { name: &'static str, value: String },
}
