use ndarray::ArrayView1;

use super::{BoundaryCondition, Source};
use crate::element::Sample;

/// Copies `line` into `buffer[border..border + n]` and synthesizes `border`
/// samples on each side. `buffer` must hold `n + 2 * border` samples.
#[inline]
pub(crate) fn extend_line<T: Sample>(
    line: ArrayView1<T>,
    border: usize,
    boundary: BoundaryCondition,
    buffer: &mut [T],
) {
    let n = line.len();
    debug_assert_eq!(buffer.len(), n + 2 * border);

    buffer[border..border + n]
        .iter_mut()
        .zip(line.iter())
        .for_each(|(b, &v)| *b = v);

    for j in (0..border).chain(border + n..buffer.len()) {
        buffer[j] = match boundary.source(j as isize - border as isize, n) {
            Source::Sample(s) => line[s],
            Source::Negated(s) => -line[s],
            Source::Zero => T::zero(),
        };
    }
}
