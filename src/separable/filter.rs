//! One-dimensional filter descriptors and their canonical form.

use std::str::FromStr;

use num::Complex;

use crate::{
    element::{Coefficient, ConvNum},
    Error, Result,
};

/// Redundancy pattern of a 1D filter's coefficients.
///
/// The symmetric classes store only half of the filter: the single-sided
/// ones (`Even`, `Odd`, `Conj`) store the left half including the center tap,
/// the doubled ones (`DEven`, `DOdd`, `DConj`) store the left half of an
/// even-length filter without a center tap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FilterSymmetry {
    #[default]
    General,
    Even,
    Odd,
    /// Complex conjugate symmetric; the same as `Even` for real data.
    Conj,
    DEven,
    DOdd,
    DConj,
}

impl FromStr for FilterSymmetry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "general" => Ok(Self::General),
            "even" => Ok(Self::Even),
            "odd" => Ok(Self::Odd),
            "conj" => Ok(Self::Conj),
            "d-even" => Ok(Self::DEven),
            "d-odd" => Ok(Self::DOdd),
            "d-conj" => Ok(Self::DConj),
            other => Err(Error::InvalidFlag(other.to_string())),
        }
    }
}

impl FilterSymmetry {
    /// Logical filter length for `data_size` stored coefficients.
    pub fn filter_size(self, data_size: usize) -> usize {
        match self {
            _ if data_size == 0 => 0,
            FilterSymmetry::General => data_size,
            FilterSymmetry::Even | FilterSymmetry::Odd | FilterSymmetry::Conj => 2 * data_size - 1,
            FilterSymmetry::DEven | FilterSymmetry::DOdd | FilterSymmetry::DConj => 2 * data_size,
        }
    }
}

/// A 1D filter to apply along one dimension.
///
/// `filter` holds the stored coefficients (half of them for the symmetric
/// classes, see [`FilterSymmetry`]). `origin` indexes the logical filter;
/// `None` places it at `size / 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct OneDimensionalFilter<C = f64> {
    pub filter: Vec<C>,
    pub origin: Option<usize>,
    pub symmetry: FilterSymmetry,
}

impl<C> Default for OneDimensionalFilter<C> {
    /// An empty filter, which leaves its dimension untouched.
    fn default() -> Self {
        Self {
            filter: Vec::new(),
            origin: None,
            symmetry: FilterSymmetry::General,
        }
    }
}

impl<C> OneDimensionalFilter<C> {
    pub fn new(filter: Vec<C>) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn with_symmetry(mut self, symmetry: FilterSymmetry) -> Self {
        self.symmetry = symmetry;
        self
    }

    pub fn with_origin(mut self, origin: usize) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Logical filter length.
    pub fn size(&self) -> usize {
        self.symmetry.filter_size(self.filter.len())
    }
}

impl OneDimensionalFilter<Complex<f64>> {
    /// Builds a complex filter from interleaved `re, im` values.
    pub fn from_interleaved(values: &[f64]) -> Result<Self> {
        if values.len() % 2 != 0 {
            return Err(Error::InvalidArgument(
                "complex filter needs an even number of values",
            ));
        }

        Ok(Self::new(
            values
                .chunks_exact(2)
                .map(|pair| Complex::new(pair[0], pair[1]))
                .collect(),
        ))
    }
}

/// Taps of a canonical filter, laid out for the summation pattern of its
/// symmetry class. Coefficients are stored in reversed order so that
/// applying them is a forward sliding dot product.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Taps<T> {
    General(Vec<T>),
    /// Center tap and the remaining stored taps, nearest to the center first.
    Even { center: T, taps: Vec<T> },
    Odd { center: T, taps: Vec<T> },
    Conj { center: T, taps: Vec<T> },
    /// Stored taps, nearest to the center first.
    DEven(Vec<T>),
    DOdd(Vec<T>),
    DConj(Vec<T>),
}

/// A filter resolved to the arithmetic type `T`, ready for the line filter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CanonicalFilter<T> {
    pub(crate) taps: Taps<T>,
    /// Logical length.
    pub(crate) size: usize,
    /// Origin in the reversed filter.
    pub(crate) origin: usize,
}

impl<T: ConvNum> CanonicalFilter<T> {
    pub(crate) fn new<C: Coefficient>(filter: &OneDimensionalFilter<C>) -> Result<Self> {
        if C::IS_COMPLEX && !T::IS_COMPLEX {
            return Err(Error::InvalidArgument(
                "found a complex filter where none was expected",
            ));
        }

        let size = filter.size();
        if size == 0 {
            return Ok(Self {
                taps: Taps::General(Vec::new()),
                size: 0,
                origin: 0,
            });
        }

        let origin = filter.origin.unwrap_or(size / 2);
        if origin >= size {
            return Err(Error::InvalidArgument("origin outside of filter"));
        }

        // reversed, so the stored center (the last value) comes first
        let mut reversed = filter
            .filter
            .iter()
            .rev()
            .map(|c| T::from_complex64(c.to_complex64()));

        let taps = match filter.symmetry {
            FilterSymmetry::General => Taps::General(reversed.collect()),
            FilterSymmetry::Even | FilterSymmetry::Odd | FilterSymmetry::Conj => {
                let center = reversed.next().unwrap_or_else(T::zero);
                let taps = reversed.collect();
                match filter.symmetry {
                    FilterSymmetry::Even => Taps::Even { center, taps },
                    FilterSymmetry::Odd => Taps::Odd { center, taps },
                    _ if T::IS_COMPLEX => Taps::Conj { center, taps },
                    _ => Taps::Even { center, taps },
                }
            }
            FilterSymmetry::DEven => Taps::DEven(reversed.collect()),
            FilterSymmetry::DOdd => Taps::DOdd(reversed.collect()),
            FilterSymmetry::DConj if T::IS_COMPLEX => Taps::DConj(reversed.collect()),
            FilterSymmetry::DConj => Taps::DEven(reversed.collect()),
        };

        Ok(Self {
            taps,
            size,
            origin: size - origin - 1,
        })
    }

    /// The filter is the identity: empty, or a single tap equal to one.
    pub(crate) fn is_meaningless(&self) -> bool {
        match &self.taps {
            _ if self.size == 0 => true,
            Taps::General(taps) => taps.len() == 1 && taps[0] == T::one(),
            Taps::Even { center, .. } | Taps::Odd { center, .. } | Taps::Conj { center, .. } => {
                self.size == 1 && *center == T::one()
            }
            _ => false,
        }
    }

    /// Halo needed on both sides of a line.
    pub(crate) fn border(&self) -> usize {
        if self.size == 0 {
            return 0;
        }
        self.origin.max(self.size - self.origin - 1)
    }
}
