//! Circular (toroidal) shift of a 2D grid.
//!
//! `out[(r, c)] = in[((r - dy) mod rows, (c - dx) mod cols)]`: content moves
//! by `(dx, dy)` and wraps at the borders. The wrap boundary splits the grid
//! into at most four rectangular blocks, each relocated with one slice copy:
//!
//! ```text
//!  input                      output
//!  +-----------+-----+        +-----+-----------+
//!  |     0     |  1  |        |  3  |     2     |
//!  |           |     |        +-----+-----------+
//!  +-----------+-----+   ->   |  1  |     0     |
//!  |     2     |  3  |        |     |           |
//!  +-----------+-----+        +-----+-----------+
//! ```

use ndarray::{s, Array2, ArrayView2};
use num_traits::Zero;

/// Normalize signed offsets into `[0, cols) x [0, rows)`.
#[inline]
fn wrap_offsets(dx: isize, dy: isize, rows: usize, cols: usize) -> (usize, usize) {
    let x = dx.rem_euclid(cols as isize) as usize;
    let y = dy.rem_euclid(rows as isize) as usize;
    (x, y)
}

/// Return a copy of `grid` circularly shifted by `dx` columns and `dy` rows.
///
/// Offsets may be negative or larger than the grid. Empty grids are returned
/// unchanged.
pub fn circular_shift<A: Clone + Zero>(grid: ArrayView2<A>, dx: isize, dy: isize) -> Array2<A> {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return grid.to_owned();
    }
    let (x, y) = wrap_offsets(dx, dy, rows, cols);
    if x == 0 && y == 0 {
        return grid.to_owned();
    }

    let (keep_r, keep_c) = (rows - y, cols - x);
    let mut out = Array2::<A>::zeros((rows, cols));
    out.slice_mut(s![y.., x..])
        .assign(&grid.slice(s![..keep_r, ..keep_c]));
    out.slice_mut(s![y.., ..x])
        .assign(&grid.slice(s![..keep_r, keep_c..]));
    out.slice_mut(s![..y, x..])
        .assign(&grid.slice(s![keep_r.., ..keep_c]));
    out.slice_mut(s![..y, ..x])
        .assign(&grid.slice(s![keep_r.., keep_c..]));
    out
}

/// In-place variant of [`circular_shift`] for callers that own the buffer.
///
/// Each block is copied out to a temporary before being written back, so no
/// block overwrites source data that another block still needs.
pub fn circular_shift_inplace<A: Clone>(grid: &mut Array2<A>, dx: isize, dy: isize) {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return;
    }
    let (x, y) = wrap_offsets(dx, dy, rows, cols);
    if x == 0 && y == 0 {
        return;
    }

    let (keep_r, keep_c) = (rows - y, cols - x);
    let block0 = grid.slice(s![..keep_r, ..keep_c]).to_owned();
    let block1 = grid.slice(s![..keep_r, keep_c..]).to_owned();
    let block2 = grid.slice(s![keep_r.., ..keep_c]).to_owned();
    let block3 = grid.slice(s![keep_r.., keep_c..]).to_owned();

    grid.slice_mut(s![y.., x..]).assign(&block0);
    grid.slice_mut(s![y.., ..x]).assign(&block1);
    grid.slice_mut(s![..y, x..]).assign(&block2);
    grid.slice_mut(s![..y, ..x]).assign(&block3);
}
