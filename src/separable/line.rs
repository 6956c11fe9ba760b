//! Per-line summation for each symmetry class.
//!
//! `input` is a line extended by `border` samples on each side. The window
//! for output sample `i` starts at `border + i - origin` of the reversed
//! filter; for the symmetric classes `c` denotes the window's center (or the
//! sample left of the center for the doubled classes).

use ndarray::ArrayViewMut1;

use super::filter::{CanonicalFilter, Taps};
use crate::element::ConvNum;

pub(crate) fn filter_line<T: ConvNum>(
    filter: &CanonicalFilter<T>,
    input: &[T],
    border: usize,
    output: ArrayViewMut1<T>,
) {
    let first = border - filter.origin;

    match &filter.taps {
        Taps::General(taps) => general(taps, input, first, output),
        Taps::Even { center, taps } => {
            single_sided(*center, taps, input, first, output, |f, r, l| f * (r + l))
        }
        Taps::Odd { center, taps } => {
            single_sided(*center, taps, input, first, output, |f, r, l| f * (r - l))
        }
        Taps::Conj { center, taps } => single_sided(*center, taps, input, first, output, |f, r, l| {
            f * r + f.conj() * l
        }),
        Taps::DEven(taps) => doubled(taps, input, first, output, |f, r, l| f * (r + l)),
        Taps::DOdd(taps) => doubled(taps, input, first, output, |f, r, l| f * (r - l)),
        Taps::DConj(taps) => doubled(taps, input, first, output, |f, r, l| f * r + f.conj() * l),
    }
}

#[inline]
fn general<T: ConvNum>(taps: &[T], input: &[T], first: usize, mut output: ArrayViewMut1<T>) {
    let size = taps.len();
    output.iter_mut().enumerate().for_each(|(i, o)| {
        *o = taps
            .iter()
            .zip(&input[first + i..first + i + size])
            .fold(T::zero(), |acc, (&f, &x)| acc + f * x);
    });
}

/// `out[i] = center * in[c] + sum_k combine(tap_k, in[c + k], in[c - k])`
#[inline]
fn single_sided<T, F>(
    center: T,
    taps: &[T],
    input: &[T],
    first: usize,
    mut output: ArrayViewMut1<T>,
    combine: F,
) where
    T: ConvNum,
    F: Fn(T, T, T) -> T,
{
    let half = taps.len();
    output.iter_mut().enumerate().for_each(|(i, o)| {
        let c = first + i + half;
        *o = taps
            .iter()
            .enumerate()
            .fold(center * input[c], |acc, (k, &f)| {
                acc + combine(f, input[c + 1 + k], input[c - 1 - k])
            });
    });
}

/// `out[i] = sum_k combine(tap_k, in[c + 1 + k], in[c - k])`
#[inline]
fn doubled<T, F>(taps: &[T], input: &[T], first: usize, mut output: ArrayViewMut1<T>, combine: F)
where
    T: ConvNum,
    F: Fn(T, T, T) -> T,
{
    let half = taps.len();
    output.iter_mut().enumerate().for_each(|(i, o)| {
        let c = first + i + half - 1;
        *o = taps.iter().enumerate().fold(T::zero(), |acc, (k, &f)| {
            acc + combine(f, input[c + 1 + k], input[c - k])
        });
    });
}
