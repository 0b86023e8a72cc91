// src/processing/mod.rs
pub mod band_set;
pub mod colorize;
pub mod crop;
pub mod indices;

// Re-export main components
pub use band_set::{BandSet, BandSetOptions, BandSource};
pub use colorize::{colorize, ColorImage, ColorRamp};
pub use crop::crop_to_geometry;
pub use indices::{Capabilities, IndexBands, IndexCalculator, IndexKind};
