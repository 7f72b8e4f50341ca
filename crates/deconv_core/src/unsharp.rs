//! Unsharp masking: a sharpening baseline with frequency-domain smoothing.
//!
//! `out = in + scale * edge`, where `edge = in - gaussian(in)` with detail at
//! or below `threshold` zeroed. Unlike the restoration filters it needs no
//! knowledge of the blur, and it amplifies noise as readily as detail.

use log::debug;
use ndarray::{Array2, ArrayView2, Zip};

use crate::convolution::frequency_convolve;
use crate::error::{invalid, Result};
use crate::float_trait::DeconvFloat;
use crate::kernel::{ensure_kernel_fits, gaussian_kernel_for_size};

/// Default smoothing kernel side length.
const DEFAULT_SIZE: usize = 5;

/// Default edge threshold; zero keeps every positive detail.
const DEFAULT_THRESHOLD: f64 = 0.0;

/// Default weight of the edge image.
const DEFAULT_SCALE: f64 = 1.5;

/// Parameters of [`unsharp_mask`].
#[derive(Debug, Clone)]
pub struct UnsharpConfig<F: DeconvFloat> {
    /// Odd side length of the Gaussian smoothing kernel. Default: 5
    pub size: usize,
    /// Edge values at or below this are discarded. Default: 0.0
    pub threshold: F,
    /// Weight of the retained edge image. Default: 1.5
    pub scale: F,
}

impl<F: DeconvFloat> Default for UnsharpConfig<F> {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            threshold: F::from_f64_c(DEFAULT_THRESHOLD),
            scale: F::from_f64_c(DEFAULT_SCALE),
        }
    }
}

impl<F: DeconvFloat> UnsharpConfig<F> {
    pub fn new(size: usize, threshold: F, scale: F) -> Self {
        Self {
            size,
            threshold,
            scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 || self.size % 2 == 0 {
            return Err(invalid(
                "size",
                format!("must be odd and > 0, got {}", self.size),
            ));
        }
        if !self.threshold.is_finite() || self.threshold < F::zero() {
            return Err(invalid(
                "threshold",
                format!("must be finite and >= 0, got {}", self.threshold),
            ));
        }
        if !self.scale.is_finite() || self.scale < F::zero() {
            return Err(invalid(
                "scale",
                format!("must be finite and >= 0, got {}", self.scale),
            ));
        }
        Ok(())
    }
}

/// Sharpen `image` by adding back its thresholded high-pass detail.
pub fn unsharp_mask<F: DeconvFloat>(
    image: ArrayView2<F>,
    config: &UnsharpConfig<F>,
) -> Result<Array2<F>> {
    config.validate()?;
    let kernel = gaussian_kernel_for_size::<F>(config.size)?;
    let (rows, cols) = image.dim();
    ensure_kernel_fits("unsharp_mask", kernel.view(), rows, cols)?;

    let smoothed = frequency_convolve(image, kernel.view())?;

    let mut out = Array2::<F>::zeros((rows, cols));
    Zip::from(&mut out)
        .and(&image)
        .and(&smoothed)
        .for_each(|o, &src, &blur| {
            let edge = src - blur;
            let kept = if edge > config.threshold {
                edge
            } else {
                F::zero()
            };
            *o = src + config.scale * kept;
        });

    debug!(
        "unsharp_mask: {}x{} size={} threshold={} scale={}",
        rows, cols, config.size, config.threshold, config.scale
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeconvError;

    fn step_edge(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(_, c)| if c < cols / 2 { 50.0 } else { 200.0 })
    }

    #[test]
    fn test_default_config() {
        let config = UnsharpConfig::<f32>::default();
        assert_eq!(config.size, 5);
        assert_eq!(config.threshold, 0.0);
        assert_eq!(config.scale, 1.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_constant_image_unchanged() {
        let image = Array2::<f32>::from_elem((12, 12), 80.0);
        let out = unsharp_mask(image.view(), &UnsharpConfig::default()).unwrap();
        assert!(out.iter().all(|&v| (v - 80.0).abs() < 1e-3));
    }

    #[test]
    fn test_zero_scale_is_identity() {
        let image = step_edge(16, 16);
        let config = UnsharpConfig::new(5, 0.0, 0.0);
        let out = unsharp_mask(image.view(), &config).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn test_sharpens_bright_side_of_edge() {
        let image = step_edge(16, 16);
        let out = unsharp_mask(image.view(), &UnsharpConfig::default()).unwrap();

        // Just right of the step the bright side overshoots.
        assert!(out[[8, 8]] > 200.0, "got {}", out[[8, 8]]);
        // To-zero thresholding discards the negative detail on the dark side.
        assert!((out[[8, 7]] - 50.0).abs() < 1e-9, "got {}", out[[8, 7]]);
        // Far from either edge (the image also wraps at column 0) nothing moves.
        assert!((out[[8, 4]] - 50.0).abs() < 1e-6);
        assert!((out[[8, 12]] - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_suppresses_small_detail() {
        let mut image = Array2::<f64>::from_elem((16, 16), 100.0);
        image[[8, 8]] = 101.0;

        let strict = UnsharpConfig::new(5, 5.0, 1.5);
        let out = unsharp_mask(image.view(), &strict).unwrap();
        assert_eq!(out, image);

        let loose = UnsharpConfig::new(5, 0.0, 1.5);
        let out = unsharp_mask(image.view(), &loose).unwrap();
        assert!(out[[8, 8]] > 101.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let image = Array2::<f32>::zeros((8, 8));
        for config in [
            UnsharpConfig::new(4, 0.0, 1.0),
            UnsharpConfig::new(0, 0.0, 1.0),
            UnsharpConfig::new(3, -1.0, 1.0),
            UnsharpConfig::new(3, 0.0, f32::NAN),
        ] {
            assert!(matches!(
                unsharp_mask(image.view(), &config),
                Err(DeconvError::InvalidParameter { .. })
            ));
        }
        assert!(matches!(
            unsharp_mask(image.view(), &UnsharpConfig::new(9, 0.0, 1.0)),
            Err(DeconvError::DimensionMismatch { .. })
        ));
    }
}
