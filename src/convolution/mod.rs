//! Convolution with automatic choice between the separable, direct and
//! Fourier methods.
//!
//! [`ConvolutionMethod::Best`] estimates the run time of every method with a
//! linear model, tries to separate the kernel when the separable method is
//! cheaper than the Fourier one, and otherwise (or when the kernel does not
//! separate) falls back to whichever of Fourier and direct is cheaper.

use std::str::FromStr;

use log::debug;
use ndarray::{Array, ArrayBase, ArrayView, Data, Dimension};
use num::Complex;

use crate::{
    conv::general_convolution,
    conv_fft::convolve_spatial,
    element::{ConvNum, Flex, KernelWeight, Promote},
    error::ResultExt,
    kernel::{expand_dimensionality, separate_filter},
    padding::BoundaryCondition,
    separable::separable_convolution,
    Error, Result,
};

/// Method used by [`convolution`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConvolutionMethod {
    /// Pixel-table convolution ([`general_convolution`]).
    Direct,
    /// Multiplication in the Fourier domain.
    Fourier,
    /// Per-dimension 1D filters; fails if the kernel does not separate.
    Separable,
    #[default]
    Best,
}

impl FromStr for ConvolutionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "direct" => Ok(Self::Direct),
            "fourier" => Ok(Self::Fourier),
            "separable" => Ok(Self::Separable),
            "best" => Ok(Self::Best),
            other => Err(Error::InvalidFlag(other.to_string())),
        }
    }
}

/// Estimated run times (seconds) of the three methods, from a model fitted
/// on one machine. Only their ordering matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub fourier: f64,
    pub separable: f64,
    pub direct: f64,
}

impl CostModel {
    pub fn new(input_shape: &[usize], kernel_shape: &[usize]) -> Self {
        let n = input_shape.iter().product::<usize>() as f64;
        let ks = kernel_shape.iter().sum::<usize>() as f64;
        let kp = kernel_shape.iter().product::<usize>() as f64;
        // samples of the boundary-extended image
        let nx = input_shape
            .iter()
            .zip(kernel_shape)
            .map(|(&n, &k)| (n + k) as f64)
            .product::<f64>();

        Self {
            fourier: 1.635e-08 * nx + 8.781e-04,
            separable: 1.434e-10 * n * ks + 4.987e-06 * ks,
            direct: 1.806e-10 * n * kp + 1.206e-05 * kp,
        }
    }
}

/// Which methods [`convolution`] attempts, in the order separable, then
/// Fourier or direct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub separable: bool,
    pub fourier: bool,
    pub direct: bool,
}

impl Plan {
    pub fn new(method: ConvolutionMethod, input_shape: &[usize], kernel_shape: &[usize]) -> Self {
        match method {
            ConvolutionMethod::Direct => Self {
                separable: false,
                fourier: false,
                direct: true,
            },
            ConvolutionMethod::Fourier => Self {
                separable: false,
                fourier: true,
                direct: false,
            },
            ConvolutionMethod::Separable => Self {
                separable: true,
                fourier: false,
                direct: false,
            },
            ConvolutionMethod::Best => {
                let cost = CostModel::new(input_shape, kernel_shape);
                // the Fourier method cannot take a kernel larger than the input
                let fits = kernel_shape.iter().zip(input_shape).all(|(k, n)| k <= n);
                let fourier = fits && cost.fourier < cost.direct;
                debug!(
                    "convolution cost estimates: Fourier {:.3e}, separable {:.3e}, direct {:.3e}",
                    cost.fourier, cost.separable, cost.direct
                );
                Self {
                    separable: cost.separable < cost.fourier,
                    fourier,
                    direct: !fourier,
                }
            }
        }
    }

    /// Method to use when the separable one was not tried or failed.
    ///
    /// The Fourier method wins when it was requested without the direct one,
    /// or when the kernel has more than `7^ndim` samples.
    pub fn fallback(&self, kernel_shape: &[usize]) -> Result<ConvolutionMethod> {
        if !self.fourier && !self.direct {
            return Err(Error::NotSeparable);
        }
        let samples = kernel_shape.iter().product::<usize>();
        let crossover = 7usize.saturating_pow(kernel_shape.len() as u32);
        if self.fourier && (!self.direct || samples > crossover) {
            Ok(ConvolutionMethod::Fourier)
        } else {
            Ok(ConvolutionMethod::Direct)
        }
    }
}

pub trait ConvolutionExt<A, D: Dimension> {
    /// Convolves with `kernel` using `method`; see [`convolution`].
    fn convolve<K, S2, E>(
        &self,
        kernel: &ArrayBase<S2, E>,
        method: ConvolutionMethod,
        boundary: &[BoundaryCondition],
    ) -> Result<Array<<A as Promote<K>>::Output, D>>
    where
        K: KernelWeight,
        A: Promote<K>,
        S2: Data<Elem = K>,
        E: Dimension;
}

impl<A, S, D> ConvolutionExt<A, D> for ArrayBase<S, D>
where
    A: Flex,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn convolve<K, S2, E>(
        &self,
        kernel: &ArrayBase<S2, E>,
        method: ConvolutionMethod,
        boundary: &[BoundaryCondition],
    ) -> Result<Array<<A as Promote<K>>::Output, D>>
    where
        K: KernelWeight,
        A: Promote<K>,
        S2: Data<Elem = K>,
        E: Dimension,
    {
        convolution(self, kernel, method, boundary)
    }
}

/// Convolves `input` with `kernel` (origin at `size / 2`).
///
/// The kernel may have fewer dimensions than the input. All methods give
/// the same result up to rounding; an empty `boundary` means the default
/// boundary condition for every method. Binary kernels are neighborhoods
/// and always yield their mean through the direct method.
pub fn convolution<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    kernel: &ArrayBase<S2, E>,
    method: ConvolutionMethod,
    boundary: &[BoundaryCondition],
) -> Result<Array<A::Output, D>>
where
    A: Promote<K>,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    convolve(input, kernel, method, boundary).context("Convolution")
}

fn convolve<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    kernel: &ArrayBase<S2, E>,
    method: ConvolutionMethod,
    boundary: &[BoundaryCondition],
) -> Result<Array<A::Output, D>>
where
    A: Promote<K>,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    if input.is_empty() || kernel.is_empty() {
        return Err(Error::NotForged);
    }
    let kernel = expand_dimensionality::<K, S2, E, D>(kernel, input.ndim())?;

    if K::IS_BINARY {
        return general_convolution(input, &kernel, boundary);
    }

    let plan = Plan::new(method, input.shape(), kernel.shape());
    if plan.separable {
        if let Some(output) = try_separable(input, &kernel, boundary)? {
            debug!("convolution: separable method");
            return Ok(output);
        }
        debug!("convolution: kernel {:?} is not separable", kernel.shape());
    }

    match plan.fallback(kernel.shape())? {
        ConvolutionMethod::Fourier => {
            debug!("convolution: Fourier method");
            convolve_spatial(&input.mapv(<A as Promote<K>>::promote), &kernel, boundary)
        }
        _ => {
            debug!("convolution: direct method");
            general_convolution(input, &kernel, boundary)
        }
    }
}

/// Separable convolution if the kernel separates, in the arithmetic type
/// the other methods would use.
fn try_separable<A, K, S, D>(
    input: &ArrayBase<S, D>,
    kernel: &ArrayView<K, D>,
    boundary: &[BoundaryCondition],
) -> Result<Option<Array<A::Output, D>>>
where
    A: Promote<K>,
    K: KernelWeight,
    S: Data<Elem = A>,
    D: Dimension,
{
    if K::IS_COMPLEX {
        let weights = kernel.mapv(|k| k.to_complex64());
        let Some(filters) = separate_filter(&weights) else {
            return Ok(None);
        };
        let output =
            separable_convolution::<A, Complex<f64>, S, D>(input, &filters, boundary, &[])?;
        Ok(Some(
            output.mapv(|v| <A::Output as ConvNum>::from_complex(v.to_complex())),
        ))
    } else {
        let weights = kernel.mapv(|k| k.to_complex64().re);
        let Some(filters) = separate_filter(&weights) else {
            return Ok(None);
        };
        let output = separable_convolution::<A, f64, S, D>(input, &filters, boundary, &[])?;
        Ok(Some(
            output.mapv(|v| <A::Output as ConvNum>::from_complex(v.to_complex())),
        ))
    }
}
