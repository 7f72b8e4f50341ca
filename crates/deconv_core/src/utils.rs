use ndarray::{Array2, ArrayView2, Axis, Zip};
use rayon::prelude::*;
use std::sync::OnceLock;

use crate::error::{invalid, mismatch, Result};
use crate::float_trait::DeconvFloat;

/// Minimum row count for parallel processing of elementwise passes.
/// Below this, rayon overhead dominates.
const PARALLEL_ROW_THRESHOLD: usize = 256;
const PARALLEL_ROW_THRESHOLD_ENV: &str = "DECONV_PARALLEL_ROW_THRESHOLD";

fn resolve_parallel_row_threshold() -> usize {
    std::env::var(PARALLEL_ROW_THRESHOLD_ENV)
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(PARALLEL_ROW_THRESHOLD)
}

/// Row count at which elementwise passes and transform row passes go parallel.
/// The environment override is read once per process.
pub fn parallel_row_threshold() -> usize {
    static THRESHOLD: OnceLock<usize> = OnceLock::new();
    *THRESHOLD.get_or_init(resolve_parallel_row_threshold)
}

/// Apply `op` to every `(out, input)` cell pair, split over rows with rayon
/// once the grid reaches the parallel threshold. Shapes must already match.
pub(crate) fn par_zip_rows<A, B, G>(out: &mut Array2<A>, input: ArrayView2<B>, op: G)
where
    A: Send,
    B: Sync,
    G: Fn(&mut A, &B) + Sync,
{
    debug_assert_eq!(out.dim(), input.dim());
    if out.nrows() >= parallel_row_threshold() {
        let out_rows: Vec<_> = out.axis_iter_mut(Axis(0)).collect();
        let in_rows: Vec<_> = input.axis_iter(Axis(0)).collect();
        out_rows
            .into_par_iter()
            .zip(in_rows.into_par_iter())
            .for_each(|(mut out_row, in_row)| {
                out_row
                    .iter_mut()
                    .zip(in_row.iter())
                    .for_each(|(a, b)| op(a, b));
            });
    } else {
        Zip::from(out).and(input).for_each(|a, b| op(a, b));
    }
}

/// Apply `op` to every cell of `grid`, split over rows like [`par_zip_rows`].
pub(crate) fn par_map_inplace<A, G>(grid: &mut Array2<A>, op: G)
where
    A: Send,
    G: Fn(&mut A) + Sync,
{
    if grid.nrows() >= parallel_row_threshold() {
        let rows: Vec<_> = grid.axis_iter_mut(Axis(0)).collect();
        rows.into_par_iter()
            .for_each(|mut row| row.iter_mut().for_each(&op));
    } else {
        grid.iter_mut().for_each(&op);
    }
}

/// Valid sample range at output boundaries. Default: [0, 255].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityRange<F: DeconvFloat> {
    pub min: F,
    pub max: F,
}

impl<F: DeconvFloat> Default for IntensityRange<F> {
    fn default() -> Self {
        Self {
            min: F::zero(),
            max: F::INTENSITY_MAX,
        }
    }
}

impl<F: DeconvFloat> IntensityRange<F> {
    pub fn new(min: F, max: F) -> Self {
        Self { min, max }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(invalid(
                "intensity_range",
                format!("expected finite min < max, got [{}, {}]", self.min, self.max),
            ));
        }
        Ok(())
    }
}

/// Which bounds of an [`IntensityRange`] are enforced on an output grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClampPolicy {
    /// Leave samples untouched.
    #[default]
    Disabled,
    /// Truncate values above `max`; sub-minimum values pass through.
    UpperOnly,
    /// Truncate to `[min, max]`.
    Full,
}

/// Clamp `grid` in place according to `policy`.
pub fn clamp_intensity<F: DeconvFloat>(
    grid: &mut Array2<F>,
    range: IntensityRange<F>,
    policy: ClampPolicy,
) {
    let clamp_low = match policy {
        ClampPolicy::Disabled => return,
        ClampPolicy::UpperOnly => false,
        ClampPolicy::Full => true,
    };
    let apply = |v: &mut F| {
        if *v > range.max {
            *v = range.max;
        } else if clamp_low && *v < range.min {
            *v = range.min;
        }
    };

    par_map_inplace(grid, apply);
}

/// Mean and population standard deviation of all samples.
/// Accumulates in f64 so f32 grids do not lose precision on large images.
pub fn mean_std_dev<F: DeconvFloat>(grid: ArrayView2<F>) -> (f64, f64) {
    let n = grid.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = grid.iter().map(|v| v.as_f64()).sum::<f64>() / n as f64;
    let variance = grid
        .iter()
        .map(|v| {
            let d = v.as_f64() - mean;
            d * d
        })
        .sum::<f64>()
        / n as f64;
    (mean, variance.sqrt())
}

/// Mean absolute per-sample difference between two equally sized grids.
pub fn mean_absolute_error<F: DeconvFloat>(a: ArrayView2<F>, b: ArrayView2<F>) -> Result<f64> {
    if a.dim() != b.dim() {
        return Err(mismatch("mean_absolute_error", a.dim(), b.dim()));
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    let total: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x.as_f64() - y.as_f64()).abs())
        .sum();
    Ok(total / a.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_std_dev_known_values() {
        let grid = array![[2.0f64, 4.0], [4.0, 4.0], [5.0, 5.0], [7.0, 9.0]];
        let (mean, std) = mean_std_dev(grid.view());
        assert!((mean - 5.0).abs() < 1e-12);
        // Population standard deviation of the classic example is exactly 2.
        assert!((std - 2.0).abs() < 1e-12, "got {}", std);
    }

    #[test]
    fn test_mean_std_dev_empty() {
        let grid = Array2::<f32>::zeros((0, 4));
        assert_eq!(mean_std_dev(grid.view()), (0.0, 0.0));
    }

    #[test]
    fn test_mean_absolute_error() {
        let a = array![[1.0f32, 2.0], [3.0, 4.0]];
        let b = array![[1.0f32, 0.0], [5.0, 4.0]];
        let mae = mean_absolute_error(a.view(), b.view()).unwrap();
        assert!((mae - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_absolute_error_shape_mismatch() {
        let a = Array2::<f32>::zeros((2, 2));
        let b = Array2::<f32>::zeros((2, 3));
        assert!(mean_absolute_error(a.view(), b.view()).is_err());
    }

    #[test]
    fn test_clamp_policies() {
        let src = array![[-10.0f32, 100.0], [300.0, 255.0]];
        let range = IntensityRange::default();

        let mut none = src.clone();
        clamp_intensity(&mut none, range, ClampPolicy::Disabled);
        assert_eq!(none, src);

        let mut upper = src.clone();
        clamp_intensity(&mut upper, range, ClampPolicy::UpperOnly);
        assert_eq!(upper, array![[-10.0f32, 100.0], [255.0, 255.0]]);

        let mut full = src.clone();
        clamp_intensity(&mut full, range, ClampPolicy::Full);
        assert_eq!(full, array![[0.0f32, 100.0], [255.0, 255.0]]);
    }

    #[test]
    fn test_parallel_row_threshold_is_stable() {
        let first = parallel_row_threshold();
        assert!(first > 0);
        assert_eq!(parallel_row_threshold(), first);
        assert!(resolve_parallel_row_threshold() > 0);
    }

    #[test]
    fn test_clamp_large_grid_parallel_path() {
        let rows = parallel_row_threshold() + 3;
        let mut grid = Array2::<f64>::from_elem((rows, 7), 400.0);
        grid[[0, 0]] = -1.0;
        clamp_intensity(&mut grid, IntensityRange::default(), ClampPolicy::Full);
        assert_eq!(grid[[0, 0]], 0.0);
        assert!(grid.iter().all(|&v| (0.0..=255.0).contains(&v)));
    }

    #[test]
    fn test_intensity_range_validation() {
        assert!(IntensityRange::<f32>::default().validate().is_ok());
        assert!(IntensityRange::new(10.0f32, 10.0).validate().is_err());
        assert!(IntensityRange::new(0.0f64, f64::NAN).validate().is_err());
    }
}
