//! Centered discrete Fourier transform.
//!
//! The origin sits at index `n / 2` of every dimension in both domains, so
//! the zero frequency is in the middle of the spectrum. The forward transform
//! is unnormalized and the inverse divides by the sample count.

use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Slice};
use num::{Complex, Zero};

use super::{good_size::check_size, processor};
use crate::{
    element::{ConvFloat, ConvNum, Flex, RealOf},
    error::ResultExt,
    Error, Result,
};
use processor::Processor;

fn roll<T, D>(input: Array<T, D>, shift: impl Fn(usize) -> usize) -> Array<T, D>
where
    T: Copy + Zero,
    D: Dimension,
{
    (0..input.ndim()).fold(input, |current, dim| {
        let axis = Axis(dim);
        let n = current.len_of(axis);
        let s = if n == 0 { 0 } else { shift(n) % n };
        if s == 0 {
            return current;
        }

        let mut output = Array::zeros(current.raw_dim());
        output
            .slice_axis_mut(axis, Slice::from(s..))
            .assign(&current.slice_axis(axis, Slice::from(..n - s)));
        output
            .slice_axis_mut(axis, Slice::from(..s))
            .assign(&current.slice_axis(axis, Slice::from(n - s..)));
        output
    })
}

/// Moves the sample at index 0 to `n / 2`.
pub(crate) fn fftshift<T: Copy + Zero, D: Dimension>(input: Array<T, D>) -> Array<T, D> {
    roll(input, |n| n / 2)
}

/// Moves the sample at `n / 2` to index 0.
pub(crate) fn ifftshift<T: Copy + Zero, D: Dimension>(input: Array<T, D>) -> Array<T, D> {
    roll(input, |n| n - n / 2)
}

pub(crate) fn check_sizes(shape: &[usize]) -> Result<()> {
    if shape.is_empty() {
        return Err(Error::DimensionalityNotSupported(0));
    }
    if shape.contains(&0) {
        return Err(Error::NotForged);
    }
    shape.iter().try_for_each(|&n| check_size(n).map(|_| ()))
}

pub(crate) fn forward_centered<R, D>(input: Array<Complex<R>, D>) -> Result<Array<Complex<R>, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    check_sizes(input.shape())?;
    let mut proc = processor::get::<R, Complex<R>>();
    Ok(fftshift(proc.forward(&ifftshift(input))?))
}

pub(crate) fn inverse_centered<R, D>(input: Array<Complex<R>, D>) -> Result<Array<Complex<R>, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    check_sizes(input.shape())?;
    let mut proc = processor::get::<R, Complex<R>>();
    Ok(fftshift(proc.backward(ifftshift(input))?))
}

/// Forward centered DFT of `input`, in the precision of its flex type.
pub fn fourier_transform<A, S, D>(input: &ArrayBase<S, D>) -> Result<Array<Complex<RealOf<A>>, D>>
where
    A: Flex,
    S: Data<Elem = A>,
    D: Dimension,
{
    forward_centered(input.mapv(|v| v.to_flex_complex().to_complex())).context("FourierTransform")
}

/// Inverse centered DFT of `input`, normalized by the sample count.
pub fn inverse_fourier_transform<R, S, D>(input: &ArrayBase<S, D>) -> Result<Array<Complex<R>, D>>
where
    R: ConvFloat,
    S: Data<Elem = Complex<R>>,
    D: Dimension,
{
    inverse_centered(input.to_owned()).context("InverseFourierTransform")
}
