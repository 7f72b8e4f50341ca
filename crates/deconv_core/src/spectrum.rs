//! Complex frequency-domain grid.
//!
//! A `Spectrum` is only ever produced by a forward transform (or derived from
//! one, as the restoration filters are) and only consumed by elementwise
//! arithmetic or the inverse transform. Keeping real and imaginary parts in
//! one `Complex` cell means the two planes can never drift out of step.

use ndarray::Array2;
use rustfft::num_complex::Complex;

use crate::error::{mismatch, Result};
use crate::float_trait::DeconvFloat;
use crate::utils::par_zip_rows;

#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum<F: DeconvFloat> {
    data: Array2<Complex<F>>,
}

impl<F: DeconvFloat> Spectrum<F> {
    pub(crate) fn from_array(data: Array2<Complex<F>>) -> Self {
        Self { data }
    }

    /// (rows, cols) of the grid this spectrum was transformed from.
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn as_array(&self) -> &Array2<Complex<F>> {
        &self.data
    }

    pub fn into_array(self) -> Array2<Complex<F>> {
        self.data
    }

    /// Elementwise complex conjugate.
    pub fn conjugate(&self) -> Self {
        Self::from_array(self.data.mapv(|c| c.conj()))
    }

    /// Squared magnitude `re² + im²` of every cell.
    pub fn norm_sqr(&self) -> Array2<F> {
        self.data.mapv(|c| c.norm_sqr())
    }

    /// Combine each cell with the matching sample of a real grid derived
    /// from this spectrum (e.g. its `norm_sqr`), so shapes always agree.
    pub(crate) fn zip_real<G>(&self, real: &Array2<F>, op: G) -> Self
    where
        G: Fn(Complex<F>, F) -> Complex<F> + Sync,
    {
        debug_assert_eq!(self.dim(), real.dim());
        let mut out = self.data.clone();
        par_zip_rows(&mut out, real.view(), |c, &r| *c = op(*c, r));
        Self::from_array(out)
    }

    /// Elementwise complex product.
    pub fn multiply(&self, other: &Spectrum<F>) -> Result<Self> {
        if self.dim() != other.dim() {
            return Err(mismatch("Spectrum::multiply", self.dim(), other.dim()));
        }
        let mut out = self.data.clone();
        par_zip_rows(&mut out, other.data.view(), |a, &b| *a *= b);
        Ok(Self::from_array(out))
    }
}
