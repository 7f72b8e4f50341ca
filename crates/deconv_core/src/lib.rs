//! Frequency-Domain Image Restoration Library
//!
//! Simulates a blurred, noisy acquisition (Gaussian point-spread function plus
//! additive white Gaussian noise) and recovers the image with a regularized
//! inverse filter or a Wiener filter. All convolution is circular and runs
//! through 2D FFTs.

pub mod convolution;
pub mod degradation;
pub mod error;
pub mod float_trait;
pub mod kernel;
pub mod restoration;
pub mod shift;
pub mod spectrum;
pub mod transforms;
pub mod unsharp;
pub mod utils;

// Re-export commonly used types at the crate root
pub use convolution::{frequency_convolve, frequency_convolve_with_plans, kernel_spectrum};
pub use degradation::{degrade, degrade_with_config, degrade_with_rng, Degradation, DegradationConfig};
pub use error::{DeconvError, Result};
pub use float_trait::DeconvFloat;
pub use kernel::{
    box_kernel, centered_kernel_canvas, gaussian_kernel_fitting, gaussian_kernel_for_size,
    gaussian_kernel_for_std_dev, gaussian_kernel_size,
};
pub use restoration::{
    inverse_filter, inverse_filter_spectrum, restore, restore_with_config, restore_with_plans,
    wiener_filter, wiener_filter_spectrum, RestorationConfig, RestorationMode,
    DEFAULT_INVERSE_EPSILON,
};
pub use shift::{circular_shift, circular_shift_inplace};
pub use spectrum::Spectrum;
pub use transforms::{fft2d, ifft2d, SpectralPlans};
pub use unsharp::{unsharp_mask, UnsharpConfig};
pub use utils::{clamp_intensity, mean_absolute_error, mean_std_dev, ClampPolicy, IntensityRange};
