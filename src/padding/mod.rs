//! Boundary extension.
//!
//! Samples outside an array are synthesized according to a
//! [`BoundaryCondition`], one dimension at a time: the input is first placed
//! inside a zero-filled buffer, then the front and back margins of every
//! dimension are filled from already-valid hyperplanes. Later dimensions copy
//! whole hyperplanes, so corners get the combined extension of all
//! dimensions.

use std::str::FromStr;

use ndarray::{Array, ArrayBase, ArrayView, Data, Dimension, Slice};

use crate::{element::Sample, Error, Result};

mod dim;
mod half_dim;
mod line;

pub(crate) use line::extend_line;

/// Front and back margin for every dimension.
pub type ExplicitPadding = [[usize; 2]];

/// Policy for synthesizing samples outside the array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BoundaryCondition {
    /// `... c b a | a b c | c b a ...`
    #[default]
    SymmetricMirror,
    /// `... -c -b -a | a b c | -c -b -a ...`
    AsymmetricMirror,
    /// `... a b c | a b c | a b c ...`
    Periodic,
    /// `... -a -b -c | a b c | -a -b -c ...`
    AsymmetricPeriodic,
    /// `... 0 0 0 | a b c | 0 0 0 ...`
    AddZeros,
    /// `... a a a | a b c | c c c ...`
    ZeroOrderExtrapolate,
}

impl FromStr for BoundaryCondition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "default" | "mirror" | "symmetric mirror" => Ok(Self::SymmetricMirror),
            "asym mirror" => Ok(Self::AsymmetricMirror),
            "periodic" => Ok(Self::Periodic),
            "asym periodic" => Ok(Self::AsymmetricPeriodic),
            "add zeros" => Ok(Self::AddZeros),
            "zero order" => Ok(Self::ZeroOrderExtrapolate),
            other => Err(Error::InvalidFlag(other.to_string())),
        }
    }
}

/// Where a sample outside the array comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    Sample(usize),
    Negated(usize),
    Zero,
}

impl BoundaryCondition {
    /// Maps the (possibly out of range) index `k` of a line of `n` samples to
    /// the sample it reads.
    pub(crate) fn source(self, k: isize, n: usize) -> Source {
        let len = n as isize;
        if (0..len).contains(&k) {
            return Source::Sample(k as usize);
        }

        match self {
            BoundaryCondition::Periodic => Source::Sample(k.rem_euclid(len) as usize),
            BoundaryCondition::AsymmetricPeriodic => {
                let index = k.rem_euclid(len) as usize;
                if k.div_euclid(len).rem_euclid(2) == 1 {
                    Source::Negated(index)
                } else {
                    Source::Sample(index)
                }
            }
            BoundaryCondition::SymmetricMirror => Source::Sample(mirror(k, len)),
            BoundaryCondition::AsymmetricMirror => {
                let index = mirror(k, len);
                if k.div_euclid(len).rem_euclid(2) == 1 {
                    Source::Negated(index)
                } else {
                    Source::Sample(index)
                }
            }
            BoundaryCondition::AddZeros => Source::Zero,
            BoundaryCondition::ZeroOrderExtrapolate => Source::Sample(k.clamp(0, len - 1) as usize),
        }
    }
}

#[inline]
fn mirror(k: isize, len: isize) -> usize {
    let m = k.rem_euclid(2 * len);
    (if m < len { m } else { 2 * len - 1 - m }) as usize
}

/// Expands a boundary condition array of length 0 (default), 1 (shared) or
/// `ndim` to one entry per dimension.
pub fn boundary_array(
    boundary: &[BoundaryCondition],
    ndim: usize,
) -> Result<Vec<BoundaryCondition>> {
    match boundary.len() {
        0 => Ok(vec![BoundaryCondition::default(); ndim]),
        1 => Ok(vec![boundary[0]; ndim]),
        n if n == ndim => Ok(boundary.to_vec()),
        n => Err(Error::ArrayParameterWrongLength {
            expected: ndim,
            found: n,
        }),
    }
}

pub trait PaddingExt<T, D: Dimension> {
    /// Extends the array by `explicit_padding[d] = [front, back]` samples in
    /// every dimension `d`, synthesizing the new samples with `boundary`
    /// (an array of length 0, 1 or `ndim`).
    fn padding(
        &self,
        boundary: &[BoundaryCondition],
        explicit_padding: &ExplicitPadding,
    ) -> Result<Array<T, D>>;
}

impl<T, S, D> PaddingExt<T, D> for ArrayBase<S, D>
where
    T: Sample,
    S: Data<Elem = T>,
    D: Dimension,
{
    fn padding(
        &self,
        boundary: &[BoundaryCondition],
        explicit_padding: &ExplicitPadding,
    ) -> Result<Array<T, D>> {
        if self.is_empty() {
            return Err(Error::NotForged);
        }
        let boundary = boundary_array(boundary, self.ndim())?;
        if explicit_padding.len() != self.ndim() {
            return Err(Error::ArrayParameterWrongLength {
                expected: self.ndim(),
                found: explicit_padding.len(),
            });
        }

        let mut output = padding_zeros(self, explicit_padding);

        explicit_padding
            .iter()
            .zip(boundary.iter())
            .enumerate()
            .for_each(|(dim, (&padding, &bc))| {
                dim::extend(self.len_of(ndarray::Axis(dim)), &mut output, dim, padding, bc);
            });

        Ok(output)
    }
}

/// Places `input` inside a zero buffer grown by `explicit_padding`.
pub(crate) fn padding_zeros<T, S, D>(
    input: &ArrayBase<S, D>,
    explicit_padding: &ExplicitPadding,
) -> Array<T, D>
where
    T: Sample,
    S: Data<Elem = T>,
    D: Dimension,
{
    let mut output_dim = input.raw_dim();
    for (d, padding) in explicit_padding.iter().enumerate() {
        output_dim[d] += padding[0] + padding[1];
    }

    let mut output = Array::zeros(output_dim);
    output
        .slice_each_axis_mut(|ax| {
            let front = explicit_padding[ax.axis.index()][0];
            Slice::from(front..front + input.len_of(ax.axis))
        })
        .assign(input);

    output
}

/// Offset that keeps the sample at `n / 2` at position `size / 2`.
#[inline]
pub(crate) fn centered_offset(size: usize, n: usize) -> usize {
    size / 2 - n / 2
}

fn centered_padding(shape: &[usize], sizes: &[usize]) -> Result<Vec<[usize; 2]>> {
    if sizes.len() != shape.len() {
        return Err(Error::DimensionalitiesDontMatch {
            expected: shape.len(),
            found: sizes.len(),
        });
    }
    if shape.iter().zip(sizes).any(|(n, size)| n > size) {
        return Err(Error::SizesDontMatch {
            expected: sizes.to_vec(),
            found: shape.to_vec(),
        });
    }

    Ok(shape
        .iter()
        .zip(sizes)
        .map(|(&n, &size)| {
            let front = centered_offset(size, n);
            [front, size - n - front]
        })
        .collect())
}

/// Extends `input` to `sizes` keeping its center in the center, synthesizing
/// the new samples with `boundary`.
pub(crate) fn extend_to_size<T, S, D>(
    input: &ArrayBase<S, D>,
    sizes: &[usize],
    boundary: &[BoundaryCondition],
) -> Result<Array<T, D>>
where
    T: Sample,
    S: Data<Elem = T>,
    D: Dimension,
{
    let padding = centered_padding(input.shape(), sizes)?;
    input.padding(boundary, &padding)
}

/// Zero-pads `input` to `sizes` keeping its center in the center.
pub(crate) fn pad_centered<T, S, D>(input: &ArrayBase<S, D>, sizes: &[usize]) -> Result<Array<T, D>>
where
    T: Sample,
    S: Data<Elem = T>,
    D: Dimension,
{
    let padding = centered_padding(input.shape(), sizes)?;
    Ok(padding_zeros(input, &padding))
}

/// Central window of `sizes` samples.
pub(crate) fn crop_centered<'a, T, S, D>(
    input: &'a ArrayBase<S, D>,
    sizes: &[usize],
) -> ArrayView<'a, T, D>
where
    S: Data<Elem = T>,
    D: Dimension,
{
    input.slice_each_axis(|ax| {
        let n = sizes[ax.axis.index()];
        let start = centered_offset(ax.len, n);
        Slice::from(start..start + n)
    })
}
