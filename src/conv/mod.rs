//! General (non-separable) convolution with an arbitrary kernel.
//!
//! The input is extended by the kernel's margins, the kernel is flattened to
//! a pixel table of offsets into the extended buffer, and every output
//! sample is a dot product over that table.

use ndarray::{parallel::prelude::*, prelude::*, Data};
use num::{traits::FromPrimitive, One, Zero};

use crate::{
    element::{ConvNum, Flex, KernelWeight, Promote},
    error::ResultExt,
    kernel::{IntoKernel, Kernel},
    padding::{BoundaryCondition, PaddingExt},
    Error, Result,
};

pub trait GeneralConvExt<A, D: Dimension> {
    /// Convolves with an arbitrary kernel; see [`general_convolution`].
    fn conv_general<'a, K>(
        &self,
        kernel: impl IntoKernel<'a, K, D>,
        boundary: &[BoundaryCondition],
    ) -> Result<Array<<A as Promote<K>>::Output, D>>
    where
        K: KernelWeight + 'a,
        A: Promote<K>;
}

impl<A, S, D> GeneralConvExt<A, D> for ArrayBase<S, D>
where
    A: Flex,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn conv_general<'a, K>(
        &self,
        kernel: impl IntoKernel<'a, K, D>,
        boundary: &[BoundaryCondition],
    ) -> Result<Array<<A as Promote<K>>::Output, D>>
    where
        K: KernelWeight + 'a,
        A: Promote<K>,
    {
        general_convolution(self, kernel, boundary)
    }
}

/// Convolves `input` with `kernel`, whose origin is at `size / 2`.
///
/// A binary kernel describes a neighborhood and yields its mean (a uniform
/// filter). Otherwise zero weights are skipped, and the output is complex
/// if the kernel is complex. The kernel must have the dimensionality of the
/// input.
pub fn general_convolution<'a, A, K, S, D>(
    input: &ArrayBase<S, D>,
    kernel: impl IntoKernel<'a, K, D>,
    boundary: &[BoundaryCondition],
) -> Result<Array<A::Output, D>>
where
    A: Promote<K>,
    K: KernelWeight + 'a,
    S: Data<Elem = A>,
    D: Dimension,
{
    general(input, kernel.into_kernel(), boundary).context("GeneralConvolution")
}

/// Mean over the set pixels of `shape` around every sample.
pub fn uniform_filter<A, S, S2, D>(
    input: &ArrayBase<S, D>,
    shape: &ArrayBase<S2, D>,
    boundary: &[BoundaryCondition],
) -> Result<Array<A::Flex, D>>
where
    A: Flex,
    S: Data<Elem = A>,
    S2: Data<Elem = bool>,
    D: Dimension,
{
    general_convolution(input, shape, boundary).context("Uniform")
}

fn general<A, K, S, D>(
    input: &ArrayBase<S, D>,
    kernel: Kernel<K, D>,
    boundary: &[BoundaryCondition],
) -> Result<Array<A::Output, D>>
where
    A: Promote<K>,
    K: KernelWeight,
    S: Data<Elem = A>,
    D: Dimension,
{
    if input.is_empty() || kernel.is_empty() {
        return Err(Error::NotForged);
    }
    if kernel.ndim() != input.ndim() {
        return Err(Error::DimensionalitiesDontMatch {
            expected: input.ndim(),
            found: kernel.ndim(),
        });
    }

    let kernel = kernel.mirror().ignore_zeros();

    let pds = input
        .mapv(<A as Promote<K>>::promote)
        .padding(boundary, &kernel.border())?;
    let strides = pds.strides().to_vec();
    let table = kernel.pixel_table(&strides);

    let dim = input.raw_dim();
    let (data, _) = pds.into_raw_vec_and_offset();

    if K::IS_BINARY {
        let offsets = table.iter().map(|&(offset, _)| offset).collect::<Vec<_>>();
        let weight = match offsets.len() {
            0 => <A::Output as ConvNum>::Real::zero(),
            n => {
                <A::Output as ConvNum>::Real::one()
                    / <A::Output as ConvNum>::Real::from_usize(n).unwrap_or_default()
            }
        };
        full_filter(&data, &strides, dim, |data, base| {
            offsets
                .iter()
                .fold(A::Output::zero(), |acc, &offset| {
                    acc + data[(base + offset) as usize]
                })
                .scale(weight)
        })
    } else if K::IS_COMPLEX {
        let table = table
            .into_iter()
            .map(|(offset, w)| (offset, A::Output::from_complex64(w.to_complex64())))
            .collect::<Vec<_>>();
        full_filter(&data, &strides, dim, |data, base| {
            table.iter().fold(A::Output::zero(), |acc, &(offset, w)| {
                acc + data[(base + offset) as usize] * w
            })
        })
    } else {
        let table = table
            .into_iter()
            .map(|(offset, w)| {
                let w = <A::Output as ConvNum>::Real::from_f64(w.to_complex64().re);
                (offset, w.unwrap_or_default())
            })
            .collect::<Vec<_>>();
        full_filter(&data, &strides, dim, |data, base| {
            table.iter().fold(A::Output::zero(), |acc, &(offset, w)| {
                acc + data[(base + offset) as usize].scale(w)
            })
        })
    }
}

/// Evaluates `filter` at every sample of an output of shape `dim`, in
/// standard order. `filter` receives the extended buffer and the position of
/// the window's first sample in it.
fn full_filter<T, D, F>(data: &[T], strides: &[isize], dim: D, filter: F) -> Result<Array<T, D>>
where
    T: ConvNum,
    D: Dimension,
    F: Fn(&[T], isize) -> T + Sync,
{
    let shape = dim.slice().to_vec();
    let values = (0..dim.size())
        .into_par_iter()
        .map(|linear| {
            let base = shape
                .iter()
                .zip(strides)
                .rev()
                .fold((linear, 0isize), |(rest, base), (&n, &stride)| {
                    (rest / n, base + (rest % n) as isize * stride)
                })
                .1;
            filter(data, base)
        })
        .collect::<Vec<_>>();

    Ok(Array::from_shape_vec(dim, values)?)
}
