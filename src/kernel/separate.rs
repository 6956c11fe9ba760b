use ndarray::{ArrayBase, Axis, Data, Dimension, IntoDimension, Slice};
use num::Complex;

use crate::{
    element::{Coefficient, ConvNum},
    separable::OneDimensionalFilter,
};

const SEPARABLE_TOLERANCE: f64 = 1e-7;

/// Decomposes `kernel` into one 1D filter per dimension whose outer product
/// reproduces it, or `None` if the kernel is not separable.
///
/// The lines through the largest-magnitude sample are the candidate
/// factors; the kernel is separable when their outer product (scaled by
/// `pivot^(1 - ndim)`) matches every sample to within a relative tolerance.
pub fn separate_filter<K, S, D>(kernel: &ArrayBase<S, D>) -> Option<Vec<OneDimensionalFilter<K>>>
where
    K: Coefficient + ConvNum,
    S: Data<Elem = K>,
    D: Dimension,
{
    if kernel.is_empty() || kernel.ndim() == 0 {
        return None;
    }

    let (pivot_index, pivot, max) = kernel.indexed_iter().fold(
        (None, Complex::new(0.0, 0.0), 0.0f64),
        |(best, pivot, max), (index, &w)| {
            let w = w.to_complex64();
            if w.norm() > max {
                (Some(index.into_dimension()), w, w.norm())
            } else {
                (best, pivot, max)
            }
        },
    );
    let pivot_index: D = pivot_index?;

    let lines: Vec<Vec<Complex<f64>>> = (0..kernel.ndim())
        .map(|d| {
            kernel
                .slice_each_axis(|ax| {
                    let p = pivot_index[ax.axis.index()];
                    if ax.axis == Axis(d) {
                        Slice::from(..)
                    } else {
                        Slice::from(p..p + 1)
                    }
                })
                .iter()
                .map(|w| w.to_complex64())
                .collect()
        })
        .collect();

    let norm = (1..kernel.ndim()).fold(Complex::new(1.0, 0.0), |acc, _| acc * pivot);

    let separable = kernel.indexed_iter().all(|(index, &w)| {
        let index = index.into_dimension();
        let product = lines
            .iter()
            .zip(index.slice())
            .fold(Complex::new(1.0, 0.0), |acc, (line, &i)| acc * line[i]);
        (product / norm - w.to_complex64()).norm() <= SEPARABLE_TOLERANCE * max
    });
    if !separable {
        return None;
    }

    Some(
        lines
            .into_iter()
            .enumerate()
            .map(|(d, line)| {
                let scale = if d == 0 { norm.inv() } else { Complex::new(1.0, 0.0) };
                OneDimensionalFilter::new(
                    line.into_iter()
                        .map(|v| K::from_complex64(v * scale))
                        .collect(),
                )
            })
            .collect(),
    )
}
