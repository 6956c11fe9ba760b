//! Per-axis FFT processors over N-D arrays.
//!
//! A processor transforms every dimension of an array in turn, one lane at
//! a time. The complex processor runs `rustfft` along every axis; the real
//! processor runs a `realfft` real-to-complex transform along the last axis
//! (halving it to `n / 2 + 1` bins) and complex transforms along the rest.
//! Neither shifts the origin: index 0 is the origin in both domains.

use ndarray::{parallel::prelude::*, Array, ArrayBase, Axis, Data, Dimension, Zip};
use num::{Complex, Zero};
use rustfft::{FftDirection, FftPlanner};

use crate::{element::ConvFloat, Error, Result};

pub mod complex;
pub mod real;

/// Returns a processor for the given input element type.
pub fn get<T: ConvFloat, InElem: GetProcessor<T, InElem>>() -> impl Processor<T, InElem> {
    InElem::get_processor()
}

/// Forward and backward transforms of N-D arrays.
pub trait Processor<T: ConvFloat, InElem> {
    /// Unnormalized forward transform over all axes.
    fn forward<S: Data<Elem = InElem>, D: Dimension>(
        &mut self,
        input: &ArrayBase<S, D>,
    ) -> Result<Array<Complex<T>, D>>;

    /// Inverse transform over all axes, normalized by the sample count.
    fn backward<D: Dimension>(&mut self, input: Array<Complex<T>, D>) -> Result<Array<InElem, D>>;
}

/// Types that know which processor transforms them.
pub trait GetProcessor<T: ConvFloat, InElem> {
    fn get_processor() -> impl Processor<T, InElem>;
}

impl<T: ConvFloat> GetProcessor<T, T> for T {
    fn get_processor() -> impl Processor<T, T> {
        real::Processor::<T>::default()
    }
}

impl<T: ConvFloat> GetProcessor<T, Complex<T>> for Complex<T> {
    fn get_processor() -> impl Processor<T, Complex<T>> {
        complex::Processor::<T>::default()
    }
}

/// Runs a complex FFT along every lane of `axis`, in parallel over lanes.
pub(crate) fn fft_axis<T, D>(
    planner: &mut FftPlanner<T>,
    data: &mut Array<Complex<T>, D>,
    axis: Axis,
    direction: FftDirection,
) where
    T: ConvFloat,
    D: Dimension,
{
    let len = data.len_of(axis);
    if len <= 1 {
        return;
    }

    let fft = planner.plan_fft(len, direction);
    let scratch_len = fft.get_inplace_scratch_len();

    Zip::from(data.lanes_mut(axis)).into_par_iter().for_each_init(
        || {
            (
                vec![Complex::zero(); len],
                vec![Complex::zero(); scratch_len],
            )
        },
        |(buffer, scratch), (mut lane,)| {
            buffer
                .iter_mut()
                .zip(lane.iter())
                .for_each(|(b, &v)| *b = v);
            fft.process_with_scratch(buffer, scratch);
            lane.iter_mut()
                .zip(buffer.iter())
                .for_each(|(v, &b)| *v = b);
        },
    );
}

/// `1 / n` in precision `T`.
pub(crate) fn normalization<T: ConvFloat>(n: usize) -> Result<T> {
    if n == 0 {
        return Err(Error::NotForged);
    }
    Ok(T::one() / T::cast_f64(n as f64))
}
