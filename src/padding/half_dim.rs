use ndarray::{Array, Axis, Dimension, Slice};

use super::{BoundaryCondition, Source};
use crate::element::Sample;

#[inline]
pub fn extend_front<T, D>(
    input_len: usize,
    buffer: &mut Array<T, D>,
    dim: usize,
    padding: [usize; 2],
    boundary: BoundaryCondition,
) where
    T: Sample,
    D: Dimension,
{
    let front = padding[0];
    for j in 0..front {
        let source = boundary.source(j as isize - front as isize, input_len);
        fill_hyperplane(buffer, dim, j, front, source);
    }
}

#[inline]
pub fn extend_back<T, D>(
    input_len: usize,
    buffer: &mut Array<T, D>,
    dim: usize,
    padding: [usize; 2],
    boundary: BoundaryCondition,
) where
    T: Sample,
    D: Dimension,
{
    let front = padding[0];
    for j in front + input_len..buffer.len_of(Axis(dim)) {
        let source = boundary.source(j as isize - front as isize, input_len);
        fill_hyperplane(buffer, dim, j, front, source);
    }
}

/// Writes hyperplane `target` of `dim` from the interior hyperplane named
/// by `source`. The two never overlap, so the buffer is split between them.
fn fill_hyperplane<T, D>(
    buffer: &mut Array<T, D>,
    dim: usize,
    target: usize,
    front: usize,
    source: Source,
) where
    T: Sample,
    D: Dimension,
{
    let axis = Axis(dim);
    let (index, negate) = match source {
        Source::Zero => {
            buffer
                .slice_axis_mut(axis, Slice::from(target..target + 1))
                .fill(T::zero());
            return;
        }
        Source::Sample(s) => (front + s, false),
        Source::Negated(s) => (front + s, true),
    };

    let view = buffer.view_mut();
    let (mut dst, mut src) = if target < index {
        let (lo, hi) = view.split_at(axis, target + 1);
        (lo, hi)
    } else {
        let (lo, hi) = view.split_at(axis, target);
        (hi, lo)
    };

    if target < index {
        dst.slice_axis_inplace(axis, Slice::from(target..target + 1));
        let index = index - target - 1;
        src.slice_axis_inplace(axis, Slice::from(index..index + 1));
    } else {
        dst.slice_axis_inplace(axis, Slice::from(0..1));
        src.slice_axis_inplace(axis, Slice::from(index..index + 1));
    }

    if negate {
        dst.zip_mut_with(&src, |d, &s| *d = -s);
    } else {
        dst.assign(&src);
    }
}
