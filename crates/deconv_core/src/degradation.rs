//! Forward model: Gaussian blur followed by additive Gaussian noise.
//!
//! Models a sensor that blurs with a known point-spread function and then
//! adds signal-independent white noise. The restoration filters invert this.

use log::{debug, warn};
use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::time::Instant;

use crate::convolution::frequency_convolve;
use crate::error::{ensure_positive, invalid, Result};
use crate::float_trait::DeconvFloat;
use crate::kernel::gaussian_kernel_fitting;
use crate::utils::{clamp_intensity, mean_std_dev, ClampPolicy, IntensityRange};

/// Default standard deviation of the Gaussian blur.
const DEFAULT_BLUR_STD_DEV: f64 = 1.0;

/// Default signal-to-noise ratio (image std / noise std).
const DEFAULT_SNR: f64 = 10.0;

/// Parameters of the degradation model.
#[derive(Debug, Clone)]
pub struct DegradationConfig<F: DeconvFloat> {
    /// Standard deviation of the Gaussian point-spread function. Default: 1.0
    pub blur_std_dev: F,
    /// Ratio of image standard deviation to noise standard deviation. Default: 10.0
    pub snr: F,
    /// Range the degraded image is clamped to. Default: [0, 255]
    pub intensity_range: IntensityRange<F>,
    /// Seed for the noise draw; `None` uses the thread-local RNG. Default: None
    pub seed: Option<u64>,
}

impl<F: DeconvFloat> Default for DegradationConfig<F> {
    fn default() -> Self {
        Self {
            blur_std_dev: F::from_f64_c(DEFAULT_BLUR_STD_DEV),
            snr: F::from_f64_c(DEFAULT_SNR),
            intensity_range: IntensityRange::default(),
            seed: None,
        }
    }
}

impl<F: DeconvFloat> DegradationConfig<F> {
    pub fn new(blur_std_dev: F, snr: F) -> Self {
        Self {
            blur_std_dev,
            snr,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("blur_std_dev", self.blur_std_dev.as_f64())?;
        ensure_positive("snr", self.snr.as_f64())?;
        self.intensity_range.validate()
    }
}

/// Output of [`degrade`]: the degraded image and the kernel that blurred it.
#[derive(Debug, Clone)]
pub struct Degradation<F: DeconvFloat> {
    pub degraded: Array2<F>,
    pub kernel: Array2<F>,
}

/// Degrade `image` with the thread-local RNG.
pub fn degrade<F: DeconvFloat>(
    image: ArrayView2<F>,
    blur_std_dev: F,
    snr: F,
) -> Result<Degradation<F>> {
    degrade_with_config(image, &DegradationConfig::new(blur_std_dev, snr))
}

/// Degrade `image` according to `config`, seeding the noise if requested.
pub fn degrade_with_config<F: DeconvFloat>(
    image: ArrayView2<F>,
    config: &DegradationConfig<F>,
) -> Result<Degradation<F>> {
    match config.seed {
        Some(seed) => degrade_with_rng(image, config, &mut StdRng::seed_from_u64(seed)),
        None => degrade_with_rng(image, config, &mut rand::thread_rng()),
    }
}

/// Degrade `image` drawing noise from `rng`. `config.seed` is ignored.
///
/// 1. Blur with the Gaussian kernel for `config.blur_std_dev`
/// 2. Add zero-mean Gaussian noise with std = image std / `config.snr`
/// 3. Clamp to `config.intensity_range`
pub fn degrade_with_rng<F: DeconvFloat, R: Rng + ?Sized>(
    image: ArrayView2<F>,
    config: &DegradationConfig<F>,
    rng: &mut R,
) -> Result<Degradation<F>> {
    config.validate()?;
    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 {
        return Err(invalid("image", "image must not be empty"));
    }

    let kernel = gaussian_kernel_fitting("degrade", config.blur_std_dev, rows, cols)?;

    let started = Instant::now();
    let mut degraded = frequency_convolve(image, kernel.view())?;

    let (mean, std_dev) = mean_std_dev(image);
    let noise_std = std_dev / config.snr.as_f64();
    if noise_std > 0.0 {
        let normal = Normal::new(0.0, noise_std)
            .map_err(|e| invalid("snr", format!("noise distribution rejected: {e}")))?;
        for v in degraded.iter_mut() {
            *v += F::from_f64_c(normal.sample(rng));
        }
    } else {
        warn!("degrade: image has zero variance, no noise injected");
    }

    clamp_intensity(&mut degraded, config.intensity_range, ClampPolicy::Full);

    debug!(
        "degrade: {}x{} kernel={}x{} mean={:.3} std={:.3} noise_std={:.4} elapsed_ms={:.3}",
        rows,
        cols,
        kernel.nrows(),
        kernel.ncols(),
        mean,
        std_dev,
        noise_std,
        started.elapsed().as_secs_f64() * 1000.0
    );

    Ok(Degradation { degraded, kernel })
}
