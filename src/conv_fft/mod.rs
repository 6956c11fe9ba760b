//! Convolution through the Fourier domain.
//!
//! Both operands and the result can each be given in the spatial or in the
//! (centered) frequency domain. When everything is spatial and a boundary
//! condition is given, the input is first extended to an efficient transform
//! size large enough that the circular convolution never wraps into the
//! original samples, and the result is cropped back.

use std::str::FromStr;

use log::trace;
use ndarray::{Array, ArrayBase, ArrayView, Data, Dimension, Zip};
use num::{Complex, Zero};

use crate::{
    element::{complex_cast, ConvFloat, ConvNum, Flex, KernelWeight, RealOf},
    error::ResultExt,
    kernel::expand_dimensionality,
    padding::{boundary_array, crop_centered, extend_to_size, pad_centered, BoundaryCondition},
    Error, Result,
};

mod fourier;
mod good_size;
pub(crate) mod processor;

pub use fourier::{fourier_transform, inverse_fourier_transform};
pub use good_size::{optimal_fourier_transform_size, MAX_FOURIER_TRANSFORM_SIZE};

pub(crate) use fourier::{forward_centered, ifftshift, inverse_centered};

use processor::Processor;

/// Domain an operand or result is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Representation {
    #[default]
    Spatial,
    /// Centered DFT, origin at `n / 2`.
    Frequency,
}

impl FromStr for Representation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spatial" => Ok(Self::Spatial),
            "frequency" => Ok(Self::Frequency),
            other => Err(Error::InvalidFlag(other.to_string())),
        }
    }
}

pub trait ConvFtExt<A: Flex, D: Dimension> {
    /// Convolves through the Fourier domain; see [`convolve_ft`].
    fn conv_ft<K, S2, E>(
        &self,
        filter: &ArrayBase<S2, E>,
        input_representation: Representation,
        filter_representation: Representation,
        output_representation: Representation,
        boundary: &[BoundaryCondition],
    ) -> Result<Array<Complex<RealOf<A>>, D>>
    where
        K: KernelWeight,
        S2: Data<Elem = K>,
        E: Dimension;

    /// Convolves real spatial data with a real spatial filter; see
    /// [`convolve_ft_real`].
    fn conv_ft_real<K, S2, E>(
        &self,
        filter: &ArrayBase<S2, E>,
        boundary: &[BoundaryCondition],
    ) -> Result<Array<A::Flex, D>>
    where
        K: KernelWeight,
        S2: Data<Elem = K>,
        E: Dimension,
        A::Flex: ConvFloat;
}

impl<A, S, D> ConvFtExt<A, D> for ArrayBase<S, D>
where
    A: Flex,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn conv_ft<K, S2, E>(
        &self,
        filter: &ArrayBase<S2, E>,
        input_representation: Representation,
        filter_representation: Representation,
        output_representation: Representation,
        boundary: &[BoundaryCondition],
    ) -> Result<Array<Complex<RealOf<A>>, D>>
    where
        K: KernelWeight,
        S2: Data<Elem = K>,
        E: Dimension,
    {
        convolve_ft(
            self,
            filter,
            input_representation,
            filter_representation,
            output_representation,
            boundary,
        )
    }

    fn conv_ft_real<K, S2, E>(
        &self,
        filter: &ArrayBase<S2, E>,
        boundary: &[BoundaryCondition],
    ) -> Result<Array<A::Flex, D>>
    where
        K: KernelWeight,
        S2: Data<Elem = K>,
        E: Dimension,
        A::Flex: ConvFloat,
    {
        convolve_ft_real(self, filter, boundary)
    }
}

/// Multiplies `input` and `filter` in the Fourier domain.
///
/// The filter may have fewer dimensions than the input (trailing singleton
/// dimensions are added) but must not be larger in any dimension; it is
/// zero-padded around its origin (`size / 2`) to the input's size. Without
/// a boundary condition, or when any operand is in the frequency domain,
/// the convolution is circular. The result is always complex; use
/// [`convolve_ft_real`] for real data.
pub fn convolve_ft<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    filter: &ArrayBase<S2, E>,
    input_representation: Representation,
    filter_representation: Representation,
    output_representation: Representation,
    boundary: &[BoundaryCondition],
) -> Result<Array<Complex<RealOf<A>>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    convolve(
        input,
        filter,
        [
            input_representation,
            filter_representation,
            output_representation,
        ],
        boundary,
    )
    .context("ConvolveFT")
}

/// Like [`convolve_ft`], writing into `output`. An `output` of the right
/// shape keeps its allocation; on error it is left untouched.
pub fn convolve_ft_into<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    filter: &ArrayBase<S2, E>,
    input_representation: Representation,
    filter_representation: Representation,
    output_representation: Representation,
    boundary: &[BoundaryCondition],
    output: &mut Array<Complex<RealOf<A>>, D>,
) -> Result<()>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    let result = convolve_ft(
        input,
        filter,
        input_representation,
        filter_representation,
        output_representation,
        boundary,
    )?;
    store(result, output);
    Ok(())
}

/// Convolves real spatial `input` with a real spatial `filter` and returns
/// real spatial data, using real-to-complex transforms.
pub fn convolve_ft_real<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    filter: &ArrayBase<S2, E>,
    boundary: &[BoundaryCondition],
) -> Result<Array<A::Flex, D>>
where
    A: Flex,
    A::Flex: ConvFloat,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    convolve_real(input, filter, boundary).context("ConvolveFT")
}

/// Like [`convolve_ft_real`], writing into `output`.
pub fn convolve_ft_real_into<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    filter: &ArrayBase<S2, E>,
    boundary: &[BoundaryCondition],
    output: &mut Array<A::Flex, D>,
) -> Result<()>
where
    A: Flex,
    A::Flex: ConvFloat,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    let result = convolve_ft_real(input, filter, boundary)?;
    store(result, output);
    Ok(())
}

fn store<T: Clone, D: Dimension>(result: Array<T, D>, output: &mut Array<T, D>) {
    if output.shape() == result.shape() {
        output.assign(&result);
    } else {
        *output = result;
    }
}

fn convolve<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    filter: &ArrayBase<S2, E>,
    representations: [Representation; 3],
    boundary: &[BoundaryCondition],
) -> Result<Array<Complex<RealOf<A>>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    if input.is_empty() || filter.is_empty() {
        return Err(Error::NotForged);
    }
    let filter = broadcast_filter::<K, S2, E, D>(filter, input.shape())?;
    let boundary = match boundary.is_empty() {
        true => Vec::new(),
        false => boundary_array(boundary, input.ndim())?,
    };

    let all_spatial = representations
        .iter()
        .all(|&r| r == Representation::Spatial);
    if all_spatial && !<A::Flex as ConvNum>::IS_COMPLEX && !K::IS_COMPLEX {
        let output = convolve_real_spatial(
            input.mapv(|v| v.to_flex().to_complex().re),
            filter.mapv(|k| <RealOf<A> as ConvFloat>::cast_f64(k.to_complex64().re)),
            &boundary,
        )?;
        return Ok(output.mapv(|v| Complex::new(v, <RealOf<A> as Zero>::zero())));
    }
    let padding = (all_spatial && !boundary.is_empty()).then_some(boundary.as_slice());

    convolve_complex(
        input.mapv(|v| v.to_flex_complex().to_complex()),
        filter.mapv(|k| complex_cast(k.to_complex64())),
        representations,
        padding,
    )
}

fn convolve_real<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    filter: &ArrayBase<S2, E>,
    boundary: &[BoundaryCondition],
) -> Result<Array<A::Flex, D>>
where
    A: Flex,
    A::Flex: ConvFloat,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    if K::IS_COMPLEX {
        return Err(Error::DataTypeNotSupported("complex filter for real output"));
    }
    if input.is_empty() || filter.is_empty() {
        return Err(Error::NotForged);
    }
    let filter = broadcast_filter::<K, S2, E, D>(filter, input.shape())?;
    let boundary = match boundary.is_empty() {
        true => Vec::new(),
        false => boundary_array(boundary, input.ndim())?,
    };

    convolve_real_spatial(
        input.mapv(A::to_flex),
        filter.mapv(|k| <A::Flex as ConvFloat>::cast_f64(k.to_complex64().re)),
        &boundary,
    )
}

/// Convolves spatial `input` with a spatial `kernel` of the same
/// dimensionality, always extending the input with `boundary`.
///
/// Real data with real weights takes the real-to-complex path.
pub(crate) fn convolve_spatial<T, K, S, S2, D>(
    input: &ArrayBase<S, D>,
    kernel: &ArrayBase<S2, D>,
    boundary: &[BoundaryCondition],
) -> Result<Array<T, D>>
where
    T: ConvNum,
    K: KernelWeight,
    S: Data<Elem = T>,
    S2: Data<Elem = K>,
    D: Dimension,
{
    let filter = broadcast_filter::<K, S2, D, D>(kernel, input.shape())?;
    let boundary = boundary_array(boundary, input.ndim())?;

    if !T::IS_COMPLEX && !K::IS_COMPLEX {
        let output = convolve_real_spatial(
            input.mapv(|v| v.to_complex().re),
            filter.mapv(|k| <T::Real as ConvFloat>::cast_f64(k.to_complex64().re)),
            &boundary,
        )?;
        Ok(output.mapv(T::from_real))
    } else {
        let output = convolve_complex(
            input.mapv(T::to_complex),
            filter.mapv(|k| complex_cast(k.to_complex64())),
            [Representation::Spatial; 3],
            Some(&boundary),
        )?;
        Ok(output.mapv(T::from_complex))
    }
}

/// Expands `filter` to the input's dimensionality and checks it fits inside
/// the input.
pub(crate) fn broadcast_filter<'a, K, S, E, D>(
    filter: &'a ArrayBase<S, E>,
    input_shape: &[usize],
) -> Result<ArrayView<'a, K, D>>
where
    S: Data<Elem = K>,
    E: Dimension,
    D: Dimension,
{
    let view = expand_dimensionality::<K, S, E, D>(filter, input_shape.len())?;
    if view.shape().iter().zip(input_shape).any(|(s, n)| s > n) {
        return Err(Error::SizesDontMatch {
            expected: input_shape.to_vec(),
            found: view.shape().to_vec(),
        });
    }
    Ok(view)
}

/// Transform sizes for an input extended so that a circular convolution with
/// a filter of `filter_shape` only reads extended samples beyond the edges.
fn padded_sizes(input_shape: &[usize], filter_shape: &[usize]) -> Result<Vec<usize>> {
    let mut sizes = good_size::compute(
        &input_shape
            .iter()
            .zip(filter_shape)
            .map(|(&n, &s)| n + s - 1)
            .collect::<Vec<_>>(),
    )?;

    for ((size, &n), &s) in sizes.iter_mut().zip(input_shape).zip(filter_shape) {
        let origin = s / 2;
        loop {
            let front = crate::padding::centered_offset(*size, n);
            let back = *size - n - front;
            if front + origin + 1 >= s && back >= origin {
                break;
            }
            *size = optimal_fourier_transform_size(*size + 1)?;
        }
    }

    trace!("Fourier convolution: extending {input_shape:?} to {sizes:?}");
    Ok(sizes)
}

pub(crate) fn convolve_complex<R, D>(
    input: Array<Complex<R>, D>,
    filter: Array<Complex<R>, D>,
    [input_representation, filter_representation, output_representation]: [Representation; 3],
    padding: Option<&[BoundaryCondition]>,
) -> Result<Array<Complex<R>, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    let shape = input.shape().to_vec();
    let (input, sizes) = match padding {
        Some(boundary) => {
            let sizes = padded_sizes(&shape, filter.shape())?;
            (extend_to_size(&input, &sizes, boundary)?, sizes)
        }
        None => (input, shape.clone()),
    };

    let mut spectrum = match input_representation {
        Representation::Spatial => forward_centered(input)?,
        Representation::Frequency => input,
    };
    let filter = pad_centered(&filter, &sizes)?;
    let transfer = match filter_representation {
        Representation::Spatial => forward_centered(filter)?,
        Representation::Frequency => filter,
    };

    Zip::from(&mut spectrum)
        .and(&transfer)
        .par_for_each(|x, &h| *x = *x * h);

    let output = match output_representation {
        Representation::Spatial => inverse_centered(spectrum)?,
        Representation::Frequency => spectrum,
    };

    Ok(match padding {
        Some(_) => crop_centered(&output, &shape).to_owned(),
        None => output,
    })
}

/// Real-to-complex path: the filter is placed with its origin at index 0 so
/// no shifts are needed, and the last dimension is half-length in the
/// frequency domain.
pub(crate) fn convolve_real_spatial<R, D>(
    input: Array<R, D>,
    filter: Array<R, D>,
    boundary: &[BoundaryCondition],
) -> Result<Array<R, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    let shape = input.shape().to_vec();
    let (input, sizes) = match boundary.is_empty() {
        true => (input, shape.clone()),
        false => {
            let sizes = padded_sizes(&shape, filter.shape())?;
            (extend_to_size(&input, &sizes, boundary)?, sizes)
        }
    };
    fourier::check_sizes(&sizes)?;
    let filter = ifftshift(pad_centered(&filter, &sizes)?);

    let mut proc = processor::get::<R, R>();
    let mut spectrum = proc.forward(&input)?;
    let transfer = proc.forward(&filter)?;

    Zip::from(&mut spectrum)
        .and(&transfer)
        .par_for_each(|x, &h| *x = *x * h);

    let output = proc.backward(spectrum)?;

    Ok(match boundary.is_empty() {
        true => output,
        false => crop_centered(&output, &shape).to_owned(),
    })
}

#[cfg(test)]
mod tests;
