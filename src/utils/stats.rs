// src/utils/stats.rs
use itertools::Itertools;

/// Percentile `q` (0..=100) of the finite values, linearly interpolated
/// between the closest ranks. `None` when no finite value exists.
pub fn percentile<I>(values: I, q: f64) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let sorted = values
        .into_iter()
        .filter(|v| v.is_finite())
        .sorted_by(|a, b| a.total_cmp(b))
        .collect_vec();
    percentile_of_sorted(&sorted, q)
}

/// Lower and upper percentiles in one sort.
pub fn percentile_bounds<I>(values: I, lower: f64, upper: f64) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let sorted = values
        .into_iter()
        .filter(|v| v.is_finite())
        .sorted_by(|a, b| a.total_cmp(b))
        .collect_vec();
    Some((
        percentile_of_sorted(&sorted, lower)?,
        percentile_of_sorted(&sorted, upper)?,
    ))
}

fn percentile_of_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn interpolates_between_ranks() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(values, 50.0).unwrap(), 3.0);
        assert_relative_eq!(percentile(values, 10.0).unwrap(), 1.4);
        assert_relative_eq!(percentile(values, 100.0).unwrap(), 5.0);
    }

    #[test]
    fn ignores_undefined_values() {
        let values = [f64::NAN, 0.0, f64::INFINITY, 1.0];
        assert_eq!(percentile_bounds(values, 0.0, 100.0), Some((0.0, 1.0)));
    }

    #[test]
    fn empty_input_has_no_percentile() {
        assert_eq!(percentile(Vec::<f64>::new(), 50.0), None);
        assert_eq!(percentile([f64::NAN], 50.0), None);
    }
}
