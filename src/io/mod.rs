// src/io/mod.rs
pub mod reader;
pub mod warp;
pub mod writer;

pub use reader::load_band;
pub use warp::{Resampling, WarpArgs};
pub use writer::{write_band, write_gray, write_raster, GrayEncoding, WriteOptions};
