// src/io/warp.rs
//! Thin wrapper over `GDALWarp`, used for resizing, resampling,
//! reprojection and cutline clipping.

use std::ffi::{c_int, CStr, CString};
use std::path::Path;

use gdal::cpl::CslStringList;
use gdal::Dataset;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// GDAL resampling kernels exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Resampling {
    Nearest,
    Bilinear,
    #[default]
    Cubic,
    CubicSpline,
    Lanczos,
    Average,
    Mode,
}

impl Resampling {
    pub fn as_gdal_str(&self) -> &'static str {
        match self {
            Resampling::Nearest => "near",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
            Resampling::CubicSpline => "cubicspline",
            Resampling::Lanczos => "lanczos",
            Resampling::Average => "average",
            Resampling::Mode => "mode",
        }
    }
}

/// `gdalwarp` command line arguments, built up one switch at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarpArgs {
    args: Vec<String>,
}

impl WarpArgs {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, values: &[&str]) -> Self {
        self.args.extend(values.iter().map(|v| v.to_string()));
        self
    }

    pub fn target_size(self, width: usize, height: usize) -> Self {
        self.push(&["-ts", &width.to_string(), &height.to_string()])
    }

    pub fn target_srs(self, srs: &str) -> Self {
        self.push(&["-t_srs", srs])
    }

    pub fn resolution(self, x_res: f64, y_res: f64) -> Self {
        self.push(&["-tr", &x_res.to_string(), &y_res.to_string()])
    }

    pub fn resampling(self, resampling: Resampling) -> Self {
        self.push(&["-r", resampling.as_gdal_str()])
    }

    /// Clip to the polygons of a vector file and shrink the extent to them.
    pub fn cutline(self, geometry: &Path) -> Self {
        let geometry = geometry.to_string_lossy();
        self.push(&["-cutline", &geometry, "-crop_to_cutline"])
    }

    pub fn dst_nodata(self, value: f64) -> Self {
        let value = if value.is_nan() {
            "nan".to_string()
        } else {
            value.to_string()
        };
        self.push(&["-dstnodata", &value])
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }
}

/// Run `GDALWarp` on `src`. Without a destination path the result lives in
/// a `MEM` dataset; with one it is written to disk (and returned open).
pub fn warp(src: &Dataset, dest: Option<&Path>, args: &WarpArgs) -> Result<Dataset> {
    let mut options = CslStringList::new();
    match dest {
        None => {
            options.add_string("-of")?;
            options.add_string("MEM")?;
        }
        Some(_) => options.add_string("-overwrite")?,
    }
    for arg in args.as_slice() {
        options.add_string(arg)?;
    }
    log::debug!("gdalwarp {}", args.as_slice().join(" "));

    let dest_name = CString::new(dest.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default())?;

    unsafe {
        let warp_options = gdal_sys::GDALWarpAppOptionsNew(options.as_ptr(), std::ptr::null_mut());
        if warp_options.is_null() {
            return Err(Error::Warp(last_error_message()));
        }

        let mut user_error: c_int = 0;
        let mut src_handle = src.c_dataset();
        let handle = gdal_sys::GDALWarp(
            dest_name.as_ptr(),
            std::ptr::null_mut(),
            1,
            &mut src_handle,
            warp_options,
            &mut user_error,
        );
        gdal_sys::GDALWarpAppOptionsFree(warp_options);

        if user_error != 0 {
            return Err(Error::Warp("invalid arguments".to_string()));
        }
        if handle.is_null() {
            return Err(Error::Warp(last_error_message()));
        }

        Ok(Dataset::from_c_dataset(handle))
    }
}

fn last_error_message() -> String {
    unsafe {
        let msg = gdal_sys::CPLGetLastErrorMsg();
        if msg.is_null() {
            return "unknown error".to_string();
        }
        CStr::from_ptr(msg).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_gdalwarp_arguments() {
        let args = WarpArgs::new()
            .target_size(4, 3)
            .target_srs("EPSG:4326")
            .resampling(Resampling::Cubic);
        assert_eq!(
            args.as_slice(),
            ["-ts", "4", "3", "-t_srs", "EPSG:4326", "-r", "cubic"]
        );
    }

    #[test]
    fn nan_nodata_is_spelled_for_gdal() {
        let args = WarpArgs::new().dst_nodata(f64::NAN);
        assert_eq!(args.as_slice(), ["-dstnodata", "nan"]);
    }
}
