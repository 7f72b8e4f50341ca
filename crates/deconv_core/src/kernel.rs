//! Point-spread function construction and canvas embedding.

use ndarray::{s, Array2, ArrayView2};

use crate::error::{ensure_positive, invalid, mismatch, Result};
use crate::float_trait::DeconvFloat;
use crate::shift::circular_shift_inplace;

/// Blur kernels reach out to roughly three standard deviations per side.
const GAUSSIAN_SUPPORT_SIGMAS: f64 = 3.0;

/// Side length divided by this gives sigma for size-driven Gaussian kernels.
const SIZE_TO_SIGMA_DIVISOR: f64 = 5.0;

fn ensure_odd_size(size: usize) -> Result<()> {
    if size == 0 || size % 2 == 0 {
        return Err(invalid(
            "kernel_size",
            format!("must be odd and > 0, got {size}"),
        ));
    }
    Ok(())
}

/// Sampled 1D Gaussian of length `size` centred on `(size - 1) / 2`,
/// normalized to sum 1.
fn gaussian_1d<F: DeconvFloat>(size: usize, sigma: F) -> Vec<F> {
    let center = F::from_f64_c((size as f64 - 1.0) / 2.0);
    let two_sigma2 = F::from_f64_c(2.0) * sigma * sigma;

    let mut kernel: Vec<F> = (0..size)
        .map(|i| {
            let x = F::usize_as(i) - center;
            (-(x * x) / two_sigma2).exp()
        })
        .collect();

    let inv_sum = F::one() / kernel.iter().copied().sum::<F>();
    for val in kernel.iter_mut() {
        *val *= inv_sum;
    }
    kernel
}

/// Separable 2D kernel as the outer product of a 1D kernel with itself.
fn outer_product<F: DeconvFloat>(kernel_1d: &[F]) -> Array2<F> {
    let n = kernel_1d.len();
    Array2::from_shape_fn((n, n), |(r, c)| kernel_1d[r] * kernel_1d[c])
}

/// `round(3 * sigma) * 2 - 1`, never below 1, computed without overflow.
fn gaussian_side(std_dev: f64) -> f64 {
    ((GAUSSIAN_SUPPORT_SIGMAS * std_dev).round() * 2.0 - 1.0).max(1.0)
}

/// Side length used for a Gaussian blur of the given standard deviation:
/// `round(3 * sigma) * 2 - 1`, never below 1.
///
/// Rejects sigmas whose kernel cell count does not fit in `usize`.
pub fn gaussian_kernel_size(std_dev: f64) -> Result<usize> {
    ensure_positive("blur_std_dev", std_dev)?;
    let side = gaussian_side(std_dev);
    Some(side)
        .filter(|&side| side < usize::MAX as f64)
        .map(|side| side as usize)
        .filter(|&size| size.checked_mul(size).is_some())
        .ok_or_else(|| {
            invalid(
                "blur_std_dev",
                format!("kernel for sigma {std_dev} is too large to represent"),
            )
        })
}

/// 2D Gaussian blur kernel for `std_dev`, normalized to sum 1.
///
/// This is the point-spread function the degradation model applies.
pub fn gaussian_kernel_for_std_dev<F: DeconvFloat>(std_dev: F) -> Result<Array2<F>> {
    let size = gaussian_kernel_size(std_dev.as_f64())?;
    Ok(outer_product(&gaussian_1d(size, std_dev)))
}

/// Gaussian blur kernel for `std_dev`, rejected up front if it would not fit
/// inside a `rows x cols` image. Nothing is allocated for an oversized kernel.
pub fn gaussian_kernel_fitting<F: DeconvFloat>(
    context: &'static str,
    std_dev: F,
    rows: usize,
    cols: usize,
) -> Result<Array2<F>> {
    let sigma = std_dev.as_f64();
    ensure_positive("blur_std_dev", sigma)?;
    if rows == 0 || cols == 0 {
        return Err(invalid("image", "image must not be empty"));
    }
    let side = gaussian_side(sigma);
    if side > rows as f64 || side > cols as f64 {
        // Float-to-int casts saturate, so absurd sides report as usize::MAX.
        let side = side as usize;
        return Err(mismatch(context, (rows, cols), (side, side)));
    }
    let size = gaussian_kernel_size(sigma)?;
    Ok(outer_product(&gaussian_1d(size, std_dev)))
}

/// 2D Gaussian smoothing kernel of odd side length `size` with
/// `sigma = size / 5`, normalized to sum 1 and peaked at the center cell.
pub fn gaussian_kernel_for_size<F: DeconvFloat>(size: usize) -> Result<Array2<F>> {
    ensure_odd_size(size)?;
    let sigma = F::from_f64_c(size as f64 / SIZE_TO_SIGMA_DIVISOR);
    Ok(outer_product(&gaussian_1d(size, sigma)))
}

/// Uniform `size x size` averaging kernel.
pub fn box_kernel<F: DeconvFloat>(size: usize) -> Result<Array2<F>> {
    ensure_odd_size(size)?;
    let weight = F::one() / F::usize_as(size * size);
    Ok(Array2::from_elem((size, size), weight))
}

/// Check that `kernel` is non-empty and fits inside a `rows x cols` image.
pub(crate) fn ensure_kernel_fits<F: DeconvFloat>(
    context: &'static str,
    kernel: ArrayView2<F>,
    rows: usize,
    cols: usize,
) -> Result<()> {
    let (k_rows, k_cols) = kernel.dim();
    if k_rows == 0 || k_cols == 0 {
        return Err(invalid("kernel", "kernel must not be empty"));
    }
    if rows == 0 || cols == 0 {
        return Err(invalid("image", "image must not be empty"));
    }
    if k_rows > rows || k_cols > cols {
        return Err(mismatch(context, (rows, cols), (k_rows, k_cols)));
    }
    Ok(())
}

/// Embed `kernel` in a zero canvas of `rows x cols` with its center cell
/// moved to the origin.
///
/// The kernel is copied into the top-left corner and circularly shifted by
/// `(-(k_cols / 2), -(k_rows / 2))`. Transform-domain convolution treats cell
/// (0, 0) as the kernel's reference point, so this is the layout every
/// spectral operation expects.
pub fn centered_kernel_canvas<F: DeconvFloat>(
    kernel: ArrayView2<F>,
    rows: usize,
    cols: usize,
) -> Result<Array2<F>> {
    ensure_kernel_fits("centered_kernel_canvas", kernel, rows, cols)?;
    let (k_rows, k_cols) = kernel.dim();

    let mut canvas = Array2::<F>::zeros((rows, cols));
    canvas.slice_mut(s![..k_rows, ..k_cols]).assign(&kernel);
    circular_shift_inplace(
        &mut canvas,
        -((k_cols / 2) as isize),
        -((k_rows / 2) as isize),
    );
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_size_rule() {
        assert_eq!(gaussian_kernel_size(1.0).unwrap(), 5);
        assert_eq!(gaussian_kernel_size(2.0).unwrap(), 11);
        assert_eq!(gaussian_kernel_size(1.5).unwrap(), 9); // round(4.5) = 5
        assert_eq!(gaussian_kernel_size(0.1).unwrap(), 1);
    }

    #[test]
    fn test_kernel_size_rejects_unrepresentable_sigma() {
        for sigma in [1e30, f64::MAX, 1e18] {
            assert!(matches!(
                gaussian_kernel_size(sigma),
                Err(crate::error::DeconvError::InvalidParameter { name: "blur_std_dev", .. })
            ));
        }
        assert!(gaussian_kernel_size(f64::INFINITY).is_err());
        assert!(gaussian_kernel_for_std_dev(1e30f32).is_err());
    }

    #[test]
    fn test_fitting_kernel_checks_image_before_building() {
        let k = gaussian_kernel_fitting("test", 1.0f64, 5, 8).unwrap();
        assert_eq!(k, gaussian_kernel_for_std_dev(1.0f64).unwrap());

        // sigma 1000 would be a 5999x5999 kernel
        assert!(matches!(
            gaussian_kernel_fitting("test", 1000.0f64, 256, 256),
            Err(crate::error::DeconvError::DimensionMismatch {
                actual: (5999, 5999),
                ..
            })
        ));
        assert!(matches!(
            gaussian_kernel_fitting("test", 1e30f64, 16, 16),
            Err(crate::error::DeconvError::DimensionMismatch {
                actual: (usize::MAX, usize::MAX),
                ..
            })
        ));
        assert!(gaussian_kernel_fitting("test", 1.0f32, 0, 8).is_err());
    }

    #[test]
    fn test_gaussian_std_dev_sum_and_symmetry() {
        let k = gaussian_kernel_for_std_dev(2.0f64).unwrap();
        assert_eq!(k.dim(), (11, 11));
        assert!((k.sum() - 1.0).abs() < 1e-12);

        let max = k.iter().copied().fold(f64::MIN, f64::max);
        assert_eq!(k[[5, 5]], max);
        for r in 0..11 {
            for c in 0..11 {
                assert!((k[[r, c]] - k[[c, r]]).abs() < 1e-15);
                assert!((k[[r, c]] - k[[10 - r, 10 - c]]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_gaussian_for_size() {
        let k = gaussian_kernel_for_size::<f32>(11).unwrap();
        assert!((k.sum() - 1.0).abs() < 1e-4, "sum = {}", k.sum());

        // Exactly one cell attains the maximum, and it is the center.
        let center = k[[5, 5]];
        assert_eq!(k.iter().filter(|&&v| v >= center).count(), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(gaussian_kernel_for_std_dev(0.0f32).is_err());
        assert!(gaussian_kernel_for_std_dev(-1.0f32).is_err());
        assert!(gaussian_kernel_for_std_dev(f32::NAN).is_err());
        assert!(gaussian_kernel_for_size::<f32>(0).is_err());
        assert!(gaussian_kernel_for_size::<f32>(4).is_err());
        assert!(box_kernel::<f32>(2).is_err());
    }

    #[test]
    fn test_box_kernel() {
        let k = box_kernel::<f64>(3).unwrap();
        assert!(k.iter().all(|&v| (v - 1.0 / 9.0).abs() < 1e-15));
    }

    #[test]
    fn test_canvas_centers_kernel_at_origin() {
        let mut kernel = Array2::<f32>::zeros((3, 3));
        kernel[[1, 1]] = 5.0;
        kernel[[0, 0]] = 1.0;
        kernel[[2, 2]] = 9.0;

        let canvas = centered_kernel_canvas(kernel.view(), 6, 8).unwrap();
        assert_eq!(canvas[[0, 0]], 5.0);
        // Top-left neighbour wraps to the far corner, bottom-right to (1, 1).
        assert_eq!(canvas[[5, 7]], 1.0);
        assert_eq!(canvas[[1, 1]], 9.0);
        assert!((canvas.sum() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_canvas_rejects_oversized_kernel() {
        let kernel = Array2::<f32>::ones((5, 3));
        let err = centered_kernel_canvas(kernel.view(), 4, 10).unwrap_err();
        assert!(matches!(
            err,
            crate::error::DeconvError::DimensionMismatch { .. }
        ));

        let empty = Array2::<f32>::zeros((0, 0));
        assert!(centered_kernel_canvas(empty.view(), 4, 4).is_err());
    }
}
