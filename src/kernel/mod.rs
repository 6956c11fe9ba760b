//! Arbitrary-shaped neighborhoods for non-separable filtering.

use ndarray::{ArrayBase, ArrayView, Axis, Data, Dimension, IntoDimension};

use crate::{element::KernelWeight, Error, Result};

mod separate;

pub use separate::separate_filter;

/// A filter array seen as a neighborhood: an offset list with weights.
///
/// The origin of the kernel is at `size / 2` in every dimension.
#[derive(Debug, Clone)]
pub struct Kernel<'a, K, D: Dimension> {
    pub(crate) weights: ArrayView<'a, K, D>,
    pub(crate) mirror: bool,
    pub(crate) ignore_zeros: bool,
}

impl<'a, K, D> Kernel<'a, K, D>
where
    K: KernelWeight,
    D: Dimension,
{
    pub fn new(weights: ArrayView<'a, K, D>) -> Self {
        Self {
            weights,
            mirror: false,
            ignore_zeros: false,
        }
    }

    /// Toggles mirroring. Convolution mirrors the kernel it receives, so a
    /// mirrored kernel yields a correlation.
    pub fn mirror(mut self) -> Self {
        self.mirror = !self.mirror;
        self
    }

    /// Drops zero-weight taps from the pixel table.
    pub fn ignore_zeros(mut self) -> Self {
        self.ignore_zeros = true;
        self
    }

    pub fn shape(&self) -> &[usize] {
        self.weights.shape()
    }

    pub fn ndim(&self) -> usize {
        self.weights.ndim()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// `[front, back]` margin the input needs in every dimension.
    pub fn border(&self) -> Vec<[usize; 2]> {
        self.shape()
            .iter()
            .map(|&size| {
                let origin = size / 2;
                if self.mirror {
                    [size - 1 - origin, origin]
                } else {
                    [origin, size - 1 - origin]
                }
            })
            .collect()
    }

    /// Offsets (relative to the first sample of the window, in a buffer with
    /// `strides`) of the kernel taps, and their weights.
    ///
    /// Binary kernels never list unset pixels.
    pub fn pixel_table(&self, strides: &[isize]) -> Vec<(isize, K)> {
        let shape = self.shape();

        self.weights
            .indexed_iter()
            .filter(|(_, w)| !((self.ignore_zeros || K::IS_BINARY) && w.is_zero_weight()))
            .map(|(index, &w)| {
                let index = index.into_dimension();
                let offset = index
                    .slice()
                    .iter()
                    .zip(shape)
                    .zip(strides)
                    .map(|((&i, &size), &stride)| {
                        let position = if self.mirror { size - 1 - i } else { i };
                        position as isize * stride
                    })
                    .sum::<isize>();
                (offset, w)
            })
            .collect()
    }
}

/// Conversion into a [`Kernel`].
pub trait IntoKernel<'a, K, D: Dimension> {
    fn into_kernel(self) -> Kernel<'a, K, D>;
}

impl<'a, K, S, D> IntoKernel<'a, K, D> for &'a ArrayBase<S, D>
where
    K: KernelWeight,
    S: Data<Elem = K>,
    D: Dimension,
{
    #[inline]
    fn into_kernel(self) -> Kernel<'a, K, D> {
        Kernel::new(self.view())
    }
}

impl<'a, K, D: Dimension> IntoKernel<'a, K, D> for Kernel<'a, K, D> {
    #[inline]
    fn into_kernel(self) -> Kernel<'a, K, D> {
        self
    }
}

/// Appends singleton dimensions to `kernel` up to `ndim`.
pub(crate) fn expand_dimensionality<'a, K, S, E, D>(
    kernel: &'a ArrayBase<S, E>,
    ndim: usize,
) -> Result<ArrayView<'a, K, D>>
where
    S: Data<Elem = K>,
    E: Dimension,
    D: Dimension,
{
    if kernel.ndim() > ndim {
        return Err(Error::DimensionalitiesDontMatch {
            expected: ndim,
            found: kernel.ndim(),
        });
    }

    let mut view = kernel.view().into_dyn();
    while view.ndim() < ndim {
        view.insert_axis_inplace(Axis(view.ndim()));
    }
    Ok(view.into_dimensionality::<D>()?)
}
