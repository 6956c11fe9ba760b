use ndarray::{Array, Dimension};

use super::{half_dim, BoundaryCondition};
use crate::element::Sample;

/// Fills both margins of dimension `dim`. The `input_len` samples of the
/// original array start at `padding[0]`.
#[inline]
pub fn extend<T, D>(
    input_len: usize,
    buffer: &mut Array<T, D>,
    dim: usize,
    padding: [usize; 2],
    boundary: BoundaryCondition,
) where
    T: Sample,
    D: Dimension,
{
    half_dim::extend_front(input_len, buffer, dim, padding, boundary);
    half_dim::extend_back(input_len, buffer, dim, padding, boundary);
}
