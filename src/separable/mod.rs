//! Separable convolution: one 1D filter per dimension, applied one
//! dimension at a time.
//!
//! Filters are normalized into a [`CanonicalFilter`](filter::CanonicalFilter)
//! whose taps are laid out for their symmetry class, so the symmetric
//! classes need roughly half the multiplications of a general filter.
//! Within a dimension every line is independent and lines are processed in
//! parallel; dimensions are processed in sequence.

use log::trace;
use ndarray::{parallel::prelude::*, Array, ArrayBase, Axis, Data, Dimension, Zip};

use crate::{
    element::{Coefficient, ConvNum, Flex, Promote},
    error::ResultExt,
    padding::{boundary_array, extend_line, BoundaryCondition},
    Error, Result,
};

pub(crate) mod filter;
mod line;

pub use filter::{FilterSymmetry, OneDimensionalFilter};

use filter::CanonicalFilter;

pub trait SeparableConvExt<A, D: Dimension> {
    /// Convolves with `filters` (one shared filter or one per dimension).
    ///
    /// `boundary` holds 0, 1 or `ndim` boundary conditions, `process` is
    /// empty (process all) or holds one flag per dimension.
    fn conv_separable<C>(
        &self,
        filters: &[OneDimensionalFilter<C>],
        boundary: &[BoundaryCondition],
        process: &[bool],
    ) -> Result<Array<<A as Promote<C>>::Output, D>>
    where
        C: Coefficient,
        A: Promote<C>;
}

impl<A, S, D> SeparableConvExt<A, D> for ArrayBase<S, D>
where
    A: Flex,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn conv_separable<C>(
        &self,
        filters: &[OneDimensionalFilter<C>],
        boundary: &[BoundaryCondition],
        process: &[bool],
    ) -> Result<Array<<A as Promote<C>>::Output, D>>
    where
        C: Coefficient,
        A: Promote<C>,
    {
        separable_convolution(self, filters, boundary, process)
    }
}

/// Convolves `input` with a separable filter.
///
/// The output is complex if the filters are complex, otherwise the flex
/// floating type of the input. A dimension is left untouched when its
/// `process` flag is false, its extent is 1 or its filter is the identity.
pub fn separable_convolution<A, C, S, D>(
    input: &ArrayBase<S, D>,
    filters: &[OneDimensionalFilter<C>],
    boundary: &[BoundaryCondition],
    process: &[bool],
) -> Result<Array<A::Output, D>>
where
    A: Promote<C>,
    C: Coefficient,
    S: Data<Elem = A>,
    D: Dimension,
{
    separable(input, filters, boundary, process).context("SeparableConvolution")
}

fn separable<A, C, S, D>(
    input: &ArrayBase<S, D>,
    filters: &[OneDimensionalFilter<C>],
    boundary: &[BoundaryCondition],
    process: &[bool],
) -> Result<Array<A::Output, D>>
where
    A: Promote<C>,
    C: Coefficient,
    S: Data<Elem = A>,
    D: Dimension,
{
    if input.is_empty() {
        return Err(Error::NotForged);
    }
    let ndim = input.ndim();
    if ndim < 1 {
        return Err(Error::DimensionalityNotSupported(ndim));
    }
    if filters.len() != 1 && filters.len() != ndim {
        return Err(Error::ArrayParameterWrongLength {
            expected: ndim,
            found: filters.len(),
        });
    }

    let filters = filters
        .iter()
        .map(CanonicalFilter::<A::Output>::new)
        .collect::<Result<Vec<_>>>()?;
    let boundary = boundary_array(boundary, ndim)?;
    let process = match process.len() {
        0 => vec![true; ndim],
        n if n == ndim => process.to_vec(),
        n => {
            return Err(Error::ArrayParameterWrongLength {
                expected: ndim,
                found: n,
            })
        }
    };

    let mut current = input.mapv(<A as Promote<C>>::promote);

    for dim in 0..ndim {
        let filter = &filters[if filters.len() == 1 { 0 } else { dim }];
        let len = current.len_of(Axis(dim));

        if !process[dim] || len <= 1 || filter.is_meaningless() {
            trace!("separable convolution: skipping dimension {dim} (extent {len})");
            continue;
        }

        trace!(
            "separable convolution: dimension {dim}, filter size {}, border {}",
            filter.size,
            filter.border()
        );
        current = filter_dimension(&current, filter, dim, boundary[dim]);
    }

    Ok(current)
}

/// Applies `filter` to every line along `dim`.
fn filter_dimension<T, D>(
    input: &Array<T, D>,
    filter: &CanonicalFilter<T>,
    dim: usize,
    boundary: BoundaryCondition,
) -> Array<T, D>
where
    T: ConvNum,
    D: Dimension,
{
    let axis = Axis(dim);
    let border = filter.border();
    let buffer_len = input.len_of(axis) + 2 * border;

    let mut output = Array::zeros(input.raw_dim());

    Zip::from(input.lanes(axis))
        .and(output.lanes_mut(axis))
        .into_par_iter()
        .for_each_init(
            || vec![T::zero(); buffer_len],
            |buffer, (line, out)| {
                extend_line(line, border, boundary, buffer);
                line::filter_line(filter, buffer, border, out);
            },
        );

    output
}

#[cfg(test)]
mod tests;
