//! Deconvolution with a known point-spread function.
//!
//! Both estimators divide the degraded spectrum by the kernel spectrum `P`,
//! written as `conj(P) / |P|²` so the division is by a real quantity:
//!
//! - **Inverse filter**: `conj(P) / |P|²`, except where `|P|² < ε²`, where the
//!   filter is replaced by the real constant `1/ε`. Frequencies the blur
//!   nearly annihilates would otherwise amplify noise without bound.
//! - **Wiener filter**: `conj(P) / (|P|² + 1/SNR²)`, assuming a flat
//!   noise-to-signal power ratio. Gain saturates at `SNR² · conj(P)` as
//!   `|P| → 0` and approaches the inverse filter as `SNR → ∞`.
//!
//! ε = 0.05 and the `1/SNR²` term are tunable defaults, not values fitted to
//! the injected noise.

use log::debug;
use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex;
use std::str::FromStr;
use std::time::Instant;

use crate::convolution::kernel_spectrum;
use crate::error::{ensure_positive, invalid, DeconvError, Result};
use crate::float_trait::DeconvFloat;
use crate::kernel::ensure_kernel_fits;
use crate::spectrum::Spectrum;
use crate::transforms::SpectralPlans;
use crate::utils::{clamp_intensity, ClampPolicy, IntensityRange};

/// Default regularization threshold of the inverse filter.
pub const DEFAULT_INVERSE_EPSILON: f64 = 0.05;

/// Default SNR assumed by the Wiener filter.
const DEFAULT_WIENER_SNR: f64 = 10.0;

/// Restoration estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorationMode {
    /// Regularized pseudo-inverse of the kernel spectrum.
    Inverse,
    /// Wiener filter with a scalar SNR.
    #[default]
    Wiener,
}

impl RestorationMode {
    /// Output clamping applied by [`restore`].
    /// Wiener output is truncated at the top only; inverse output is left raw.
    pub fn default_clamp(self) -> ClampPolicy {
        match self {
            RestorationMode::Inverse => ClampPolicy::Disabled,
            RestorationMode::Wiener => ClampPolicy::UpperOnly,
        }
    }
}

impl FromStr for RestorationMode {
    type Err = DeconvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inverse" => Ok(RestorationMode::Inverse),
            "wiener" => Ok(RestorationMode::Wiener),
            other => Err(invalid(
                "mode",
                format!("expected `inverse` or `wiener`, got `{other}`"),
            )),
        }
    }
}

/// Configuration for [`restore_with_config`].
#[derive(Debug, Clone)]
pub struct RestorationConfig<F: DeconvFloat> {
    /// Estimator to run. Default: Wiener
    pub mode: RestorationMode,
    /// Assumed SNR, only read in Wiener mode. Default: 10.0
    pub snr: F,
    /// Inverse filter regularization threshold. Default: 0.05
    pub epsilon: F,
    /// Range used by `clamp`. Default: [0, 255]
    pub intensity_range: IntensityRange<F>,
    /// Bounds enforced on the restored image. Default: UpperOnly (Wiener default)
    pub clamp: ClampPolicy,
}

impl<F: DeconvFloat> Default for RestorationConfig<F> {
    fn default() -> Self {
        Self::for_mode(RestorationMode::default(), F::from_f64_c(DEFAULT_WIENER_SNR))
    }
}

impl<F: DeconvFloat> RestorationConfig<F> {
    /// Defaults for `mode`, including its default clamp policy.
    pub fn for_mode(mode: RestorationMode, snr: F) -> Self {
        Self {
            mode,
            snr,
            epsilon: F::from_f64_c(DEFAULT_INVERSE_EPSILON),
            intensity_range: IntensityRange::default(),
            clamp: mode.default_clamp(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.mode {
            RestorationMode::Inverse => ensure_positive("epsilon", self.epsilon.as_f64())?,
            RestorationMode::Wiener => ensure_positive("snr", self.snr.as_f64())?,
        }
        if self.clamp != ClampPolicy::Disabled {
            self.intensity_range.validate()?;
        }
        Ok(())
    }
}

/// Regularized inverse of a kernel spectrum.
pub fn inverse_filter_spectrum<F: DeconvFloat>(
    kernel_freq: &Spectrum<F>,
    epsilon: F,
) -> Spectrum<F> {
    let threshold = epsilon * epsilon;
    let ceiling = Complex::new(F::one() / epsilon, F::zero());
    let denom = kernel_freq.norm_sqr();
    kernel_freq.conjugate().zip_real(&denom, |conj, d| {
        if d < threshold {
            ceiling
        } else {
            conj / d
        }
    })
}

/// Wiener filter for a kernel spectrum under a flat noise-to-signal ratio.
pub fn wiener_filter_spectrum<F: DeconvFloat>(kernel_freq: &Spectrum<F>, snr: F) -> Spectrum<F> {
    let noise_to_signal = F::one() / (snr * snr);
    let denom = kernel_freq.norm_sqr();
    kernel_freq
        .conjugate()
        .zip_real(&denom, |conj, d| conj / (d + noise_to_signal))
}

fn apply_filter<F: DeconvFloat>(
    degraded: ArrayView2<F>,
    kernel: ArrayView2<F>,
    plans: &SpectralPlans<F>,
    build: impl FnOnce(&Spectrum<F>) -> Spectrum<F>,
) -> Result<Array2<F>> {
    let (rows, cols) = degraded.dim();
    ensure_kernel_fits("restore", kernel, rows, cols)?;
    plans.ensure_shape("restore", (rows, cols))?;

    let kernel_freq = kernel_spectrum(kernel, plans)?;
    let degraded_freq = plans.forward(degraded)?;
    let filter = build(&kernel_freq);
    plans.inverse(&degraded_freq.multiply(&filter)?)
}

/// Direct deconvolution with the regularized inverse filter. No clamping.
pub fn inverse_filter<F: DeconvFloat>(
    degraded: ArrayView2<F>,
    kernel: ArrayView2<F>,
    epsilon: F,
) -> Result<Array2<F>> {
    ensure_positive("epsilon", epsilon.as_f64())?;
    let (rows, cols) = degraded.dim();
    ensure_kernel_fits("inverse_filter", kernel, rows, cols)?;
    let plans = SpectralPlans::new(rows, cols)?;
    apply_filter(degraded, kernel, &plans, |p| inverse_filter_spectrum(p, epsilon))
}

/// Wiener deconvolution with scalar `snr`. No clamping.
pub fn wiener_filter<F: DeconvFloat>(
    degraded: ArrayView2<F>,
    kernel: ArrayView2<F>,
    snr: F,
) -> Result<Array2<F>> {
    ensure_positive("snr", snr.as_f64())?;
    let (rows, cols) = degraded.dim();
    ensure_kernel_fits("wiener_filter", kernel, rows, cols)?;
    let plans = SpectralPlans::new(rows, cols)?;
    apply_filter(degraded, kernel, &plans, |p| wiener_filter_spectrum(p, snr))
}

/// Restore with pre-computed plans; clamps per `config.clamp`.
pub fn restore_with_plans<F: DeconvFloat>(
    degraded: ArrayView2<F>,
    kernel: ArrayView2<F>,
    config: &RestorationConfig<F>,
    plans: &SpectralPlans<F>,
) -> Result<Array2<F>> {
    config.validate()?;
    let started = Instant::now();

    let mut restored = match config.mode {
        RestorationMode::Inverse => apply_filter(degraded, kernel, plans, |p| {
            inverse_filter_spectrum(p, config.epsilon)
        })?,
        RestorationMode::Wiener => apply_filter(degraded, kernel, plans, |p| {
            wiener_filter_spectrum(p, config.snr)
        })?,
    };
    clamp_intensity(&mut restored, config.intensity_range, config.clamp);

    debug!(
        "restore: mode={:?} size={}x{} kernel={}x{} clamp={:?} elapsed_ms={:.3}",
        config.mode,
        restored.nrows(),
        restored.ncols(),
        kernel.nrows(),
        kernel.ncols(),
        config.clamp,
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(restored)
}

/// Restore according to `config`.
pub fn restore_with_config<F: DeconvFloat>(
    degraded: ArrayView2<F>,
    kernel: ArrayView2<F>,
    config: &RestorationConfig<F>,
) -> Result<Array2<F>> {
    config.validate()?;
    let (rows, cols) = degraded.dim();
    ensure_kernel_fits("restore", kernel, rows, cols)?;
    let plans = SpectralPlans::new(rows, cols)?;
    restore_with_plans(degraded, kernel, config, &plans)
}

/// Restore `degraded` blurred by `kernel`.
///
/// `snr` is ignored in [`RestorationMode::Inverse`]. Uses the default ε and
/// each mode's default clamping (Wiener: values above 255 truncated, values
/// below zero kept; inverse: unclamped).
pub fn restore<F: DeconvFloat>(
    degraded: ArrayView2<F>,
    kernel: ArrayView2<F>,
    mode: RestorationMode,
    snr: F,
) -> Result<Array2<F>> {
    restore_with_config(degraded, kernel, &RestorationConfig::for_mode(mode, snr))
}
