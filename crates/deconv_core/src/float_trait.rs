//! Float trait abstraction for f32/f64 support.
//!
//! Every grid, kernel and spectrum in this crate is generic over one of the
//! two IEEE float widths.

use num_traits::{Float, FromPrimitive, NumAssign};
use rustfft::FftNum;
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Sample type of images, kernels and spectra.
pub trait DeconvFloat:
    Float + FftNum + FromPrimitive + NumAssign + Sum + Debug + Display + Send + Sync + 'static
{
    /// Upper bound of the nominal 8-bit intensity domain (255).
    const INTENSITY_MAX: Self;

    /// Narrow an f64 constant; rounds to nearest for f32.
    fn from_f64_c(val: f64) -> Self;

    /// Grid extents and pixel counts.
    fn usize_as(val: usize) -> Self;

    /// Widen to f64 (lossless for both implementors).
    fn as_f64(self) -> f64;
}

macro_rules! impl_deconv_float {
    ($($t:ty),*) => {$(
        impl DeconvFloat for $t {
            const INTENSITY_MAX: Self = 255.0;

            #[inline]
            fn from_f64_c(val: f64) -> Self {
                val as $t
            }

            #[inline]
            fn usize_as(val: usize) -> Self {
                val as $t
            }

            #[inline]
            fn as_f64(self) -> f64 {
                self as f64
            }
        }
    )*};
}

impl_deconv_float!(f32, f64);
