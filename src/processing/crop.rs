// src/processing/crop.rs
use std::path::Path;
use std::time::Instant;

use crate::band::Band;
use crate::error::{Error, Result};
use crate::io::warp::{self, WarpArgs};
use crate::io::{reader, writer};

/// Clip `band` to the polygons of a boundary file (typically KML) and shrink
/// it to their bounding pixel rectangle.
///
/// Pixels outside the boundary become no-data (the band's own sentinel, or
/// NaN when it has none). With `output` the clipped raster is also written
/// to that path. Parsing of the boundary file is left to GDAL/OGR; deeply
/// nested KML folder structures may not be read correctly.
pub fn crop_to_geometry(band: &Band, geometry: &Path, output: Option<&Path>) -> Result<Band> {
    if !geometry.is_file() {
        return Err(Error::GeometryNotFound(geometry.to_path_buf()));
    }

    let start = Instant::now();
    let fill = band.no_data_value().unwrap_or(f64::NAN);
    let args = WarpArgs::new().cutline(geometry).dst_nodata(fill);

    let src = writer::to_memory(band.data(), band.geo(), band.no_data_value())?;
    let clipped = warp::warp(&src, output, &args)?;
    let cropped = reader::read_dataset(&clipped, band.name())?
        .with_source(output.map(Path::to_path_buf).or_else(|| band.source().map(Path::to_path_buf)));

    log::debug!(
        "cropped {} {:?} -> {:?} in {:?}",
        band.name(),
        band.shape(),
        cropped.shape(),
        start.elapsed()
    );
    Ok(cropped)
}
