//! Convolution via the convolution theorem.
//!
//! The result is a *circular* convolution: content near one border wraps in
//! from the opposite border. A sliding-window spatial convolution with
//! zero or replicate padding only agrees with it away from the border. The
//! degradation model and both restoration filters rely on the same periodic
//! model, so the wrap-around is kept as is.

use log::trace;
use ndarray::{Array2, ArrayView2};

use crate::error::Result;
use crate::float_trait::DeconvFloat;
use crate::kernel::{centered_kernel_canvas, ensure_kernel_fits};
use crate::spectrum::Spectrum;
use crate::transforms::SpectralPlans;

/// Spectrum of `kernel` embedded in a `plans`-sized canvas with its center at
/// the origin.
pub fn kernel_spectrum<F: DeconvFloat>(
    kernel: ArrayView2<F>,
    plans: &SpectralPlans<F>,
) -> Result<Spectrum<F>> {
    let (rows, cols) = plans.shape();
    let canvas = centered_kernel_canvas(kernel, rows, cols)?;
    plans.forward(canvas.view())
}

/// Circularly convolve `image` with `kernel` using pre-computed plans.
pub fn frequency_convolve_with_plans<F: DeconvFloat>(
    image: ArrayView2<F>,
    kernel: ArrayView2<F>,
    plans: &SpectralPlans<F>,
) -> Result<Array2<F>> {
    let (rows, cols) = image.dim();
    ensure_kernel_fits("frequency_convolve", kernel, rows, cols)?;
    plans.ensure_shape("frequency_convolve", (rows, cols))?;

    let kernel_freq = kernel_spectrum(kernel, plans)?;
    let image_freq = plans.forward(image)?;
    trace!(
        "frequency_convolve: image {}x{}, kernel {}x{}",
        rows,
        cols,
        kernel.nrows(),
        kernel.ncols()
    );

    // The inverse leg carries the single 1/(rows*cols) normalization.
    plans.inverse(&image_freq.multiply(&kernel_freq)?)
}

/// Circularly convolve `image` with a (smaller) `kernel`.
///
/// The output has the image's shape. A unit impulse kernel reproduces the
/// image, and a kernel summing to 1 preserves its mean.
pub fn frequency_convolve<F: DeconvFloat>(
    image: ArrayView2<F>,
    kernel: ArrayView2<F>,
) -> Result<Array2<F>> {
    let (rows, cols) = image.dim();
    ensure_kernel_fits("frequency_convolve", kernel, rows, cols)?;
    let plans = SpectralPlans::new(rows, cols)?;
    frequency_convolve_with_plans(image, kernel, &plans)
}
