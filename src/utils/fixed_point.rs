// src/utils/fixed_point.rs
use crate::error::{Error, Result};

pub const FIXED_POINT_NODATA: i16 = -10000;

/// Largest scale factor whose scaled range (-0.9999..=0.9999) stays clear
/// of [`FIXED_POINT_NODATA`].
pub const MAX_SCALE_FACTOR: i32 = 10000;

/// Accept scale factors in `1..=MAX_SCALE_FACTOR`.
pub fn check_scale_factor(scale_factor: i32) -> Result<i32> {
    if (1..=MAX_SCALE_FACTOR).contains(&scale_factor) {
        Ok(scale_factor)
    } else {
        Err(Error::InvalidOption {
            name: "scale factor",
            value: format!("{scale_factor} (expected 1..={MAX_SCALE_FACTOR})"),
        })
    }
}

/// Scale index values into `int16`. Masked and non-finite values become
/// [`FIXED_POINT_NODATA`].
pub fn to_fixed_point(data: &[f64], mask: Option<&[bool]>, scale_factor: i32) -> Result<Vec<i16>> {
    let scale_factor = check_scale_factor(scale_factor)? as f64;
    Ok(data
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let masked = mask.map_or(false, |m| m[i]);
            if masked || !value.is_finite() {
                FIXED_POINT_NODATA
            } else {
                // Clamp to avoid overflow and scale
                let clamped = value.max(-0.9999).min(0.9999);
                (clamped * scale_factor).round() as i16
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_and_clamps() {
        let out = to_fixed_point(&[0.3333, -1.0, 2.0], None, 10000).unwrap();
        assert_eq!(out, vec![3333, -9999, 9999]);
    }

    #[test]
    fn masked_and_undefined_become_nodata() {
        let out = to_fixed_point(&[0.5, f64::NAN, 0.25], Some(&[true, false, false]), 10000).unwrap();
        assert_eq!(out, vec![FIXED_POINT_NODATA, FIXED_POINT_NODATA, 2500]);
    }

    #[test]
    fn out_of_range_scale_factors_are_rejected() {
        for scale_factor in [0, -100, 10001, 100000] {
            assert!(matches!(
                to_fixed_point(&[0.5, 0.9], None, scale_factor),
                Err(Error::InvalidOption { .. })
            ));
        }
        assert_eq!(to_fixed_point(&[0.5, -0.9], None, 1).unwrap(), vec![1, -1]);
    }

    #[test]
    fn full_scale_never_hits_nodata() {
        let out = to_fixed_point(&[-1.0, -0.99995, 1.0], None, MAX_SCALE_FACTOR).unwrap();
        assert!(out.iter().all(|&v| v != FIXED_POINT_NODATA));
    }
}
