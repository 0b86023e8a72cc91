// src/lib.rs
pub mod band;
pub mod batch;
pub mod cli;
pub mod error;
pub mod io;
pub mod processing;
pub mod utils;

pub use band::{Band, BandId};
pub use error::{Error, Result};
pub use processing::{BandSet, BandSetOptions};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
