use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::error::{invalid, mismatch, Result};
use crate::float_trait::DeconvFloat;
use crate::spectrum::Spectrum;
use crate::utils::parallel_row_threshold;

/// Run `plan` over every row of `data` in place.
fn transform_rows<F: DeconvFloat>(data: &mut Array2<Complex<F>>, plan: &Arc<dyn Fft<F>>) {
    let cols = data.ncols();
    if data.nrows() >= parallel_row_threshold() {
        let rows: Vec<_> = data.axis_iter_mut(Axis(0)).collect();
        rows.into_par_iter().for_each(|mut row| match row.as_slice_mut() {
            Some(slice) => plan.process(slice),
            None => {
                let mut buf = row.to_vec();
                plan.process(&mut buf);
                row.iter_mut().zip(buf).for_each(|(dst, src)| *dst = src);
            }
        });
    } else {
        let mut row_vec = vec![Complex::new(F::zero(), F::zero()); cols];
        for mut row in data.axis_iter_mut(Axis(0)) {
            for (dst, &src) in row_vec.iter_mut().zip(row.iter()) {
                *dst = src;
            }
            plan.process(&mut row_vec);
            for (dst, &src) in row.iter_mut().zip(row_vec.iter()) {
                *dst = src;
            }
        }
    }
}

/// Run `plan` over every column of `data`.
/// Columns are strided, so the pass runs on a standard-layout transpose.
fn transform_columns<F: DeconvFloat>(
    data: Array2<Complex<F>>,
    plan: &Arc<dyn Fft<F>>,
) -> Array2<Complex<F>> {
    let mut transposed = data.t().as_standard_layout().into_owned();
    transform_rows(&mut transposed, plan);
    transposed.t().as_standard_layout().into_owned()
}

/// Compute the 2D FFT of a real grid using pre-computed plans.
/// The imaginary input channel is zero. Returns the unnormalized FFT.
pub fn fft2d<F: DeconvFloat>(
    input: ArrayView2<F>,
    fft_row_plan: &Arc<dyn Fft<F>>,
    fft_col_plan: &Arc<dyn Fft<F>>,
) -> Array2<Complex<F>> {
    // 1. Transform rows
    let mut intermediate = input.mapv(|v| Complex::new(v, F::zero()));
    transform_rows(&mut intermediate, fft_row_plan);

    // 2. Transform columns
    transform_columns(intermediate, fft_col_plan)
}

/// Compute the 2D inverse FFT using pre-computed plans.
/// Normalizes by 1/(rows*cols) and keeps the real component.
pub fn ifft2d<F: DeconvFloat>(
    input: &Array2<Complex<F>>,
    ifft_row_plan: &Arc<dyn Fft<F>>,
    ifft_col_plan: &Arc<dyn Fft<F>>,
) -> Array2<F> {
    let (rows, cols) = input.dim();

    // 1. Transform columns
    let mut intermediate = transform_columns(input.clone(), ifft_col_plan);

    // 2. Transform rows
    transform_rows(&mut intermediate, ifft_row_plan);

    let norm_factor = F::one() / F::usize_as(rows * cols);
    intermediate.mapv(|c| c.re * norm_factor)
}

/// Pre-computed forward/inverse plans for one grid shape.
///
/// Planning is the expensive part of an FFT; callers that restore or convolve
/// many same-sized grids build this once and pass it to the `*_with_plans`
/// entry points. Plans are `Send + Sync` and can be shared across threads.
pub struct SpectralPlans<F: DeconvFloat> {
    rows: usize,
    cols: usize,
    fft_row: Arc<dyn Fft<F>>,
    fft_col: Arc<dyn Fft<F>>,
    ifft_row: Arc<dyn Fft<F>>,
    ifft_col: Arc<dyn Fft<F>>,
}

impl<F: DeconvFloat> SpectralPlans<F> {
    /// Create plans for `rows x cols` grids.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(invalid(
                "shape",
                format!("spectral plans need a non-empty shape, got ({rows}, {cols})"),
            ));
        }
        let mut planner = FftPlanner::new();
        Ok(Self {
            rows,
            cols,
            fft_row: planner.plan_fft_forward(cols),
            fft_col: planner.plan_fft_forward(rows),
            ifft_row: planner.plan_fft_inverse(cols),
            ifft_col: planner.plan_fft_inverse(rows),
        })
    }

    /// Grid shape these plans were built for.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub(crate) fn ensure_shape(&self, context: &'static str, dim: (usize, usize)) -> Result<()> {
        if dim != self.shape() {
            return Err(mismatch(context, self.shape(), dim));
        }
        Ok(())
    }

    /// Forward transform of a real grid.
    pub fn forward(&self, grid: ArrayView2<F>) -> Result<Spectrum<F>> {
        self.ensure_shape("SpectralPlans::forward", grid.dim())?;
        Ok(Spectrum::from_array(fft2d(
            grid,
            &self.fft_row,
            &self.fft_col,
        )))
    }

    /// Inverse transform back to a real grid (normalized, real part).
    pub fn inverse(&self, spectrum: &Spectrum<F>) -> Result<Array2<F>> {
        self.ensure_shape("SpectralPlans::inverse", spectrum.dim())?;
        Ok(ifft2d(spectrum.as_array(), &self.ifft_row, &self.ifft_col))
    }
}
