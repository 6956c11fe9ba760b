//! Richardson-Lucy deconvolution, optionally with total variation
//! regularization.

use log::debug;
use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Slice, Zip};
use num::{Complex, Float};

use super::{
    check_non_negative, filter_spatial, relative_change, to_frequency, Problem,
    CONVERGENCE_THRESHOLD,
};
use crate::{
    element::{ConvFloat, Flex, KernelWeight, RealOf},
    error::ResultExt,
    Error, Result,
};

/// Lower bound of the gradient magnitude in the total variation term.
const GRADIENT_FLOOR: f64 = 1e-12;
/// Lower bound of the total variation denominator `1 - λ·div(∇u/|∇u|)`.
const DENOMINATOR_FLOOR: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RichardsonLucyParams {
    pub max_iterations: usize,
    /// Weight `λ` of the total variation term.
    pub regularization: f64,
}

impl Default for RichardsonLucyParams {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            regularization: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RichardsonLucyOptions {
    /// The PSF argument is already the optical transfer function.
    pub otf: bool,
}

impl RichardsonLucyOptions {
    /// Parses option tokens; only `"OTF"` is recognized.
    pub fn from_flags(flags: &[&str]) -> Result<Self> {
        flags.iter().try_fold(Self::default(), |mut options, &flag| {
            match flag {
                "OTF" => options.otf = true,
                other => return Err(Error::InvalidFlag(other.to_string())),
            }
            Ok(options)
        })
    }
}

/// Richardson-Lucy deconvolution.
///
/// Starting from the input with negative samples clamped to zero, each
/// iteration multiplies the estimate by the back-projected ratio between the
/// input and the re-blurred estimate:
/// `u ← u · (g / (u ⊛ h)) ⋆ h`. Stops after `max_iterations` iterations or
/// when successive estimates differ by a mean relative error below
/// [`CONVERGENCE_THRESHOLD`](super::CONVERGENCE_THRESHOLD).
pub fn richardson_lucy<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    psf: &ArrayBase<S2, E>,
    max_iterations: usize,
    options: RichardsonLucyOptions,
) -> Result<Array<RealOf<A>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    deconvolve(input, psf, max_iterations, None, options).context("RichardsonLucy")
}

/// Richardson-Lucy deconvolution with total variation regularization.
///
/// The multiplicative update is divided by `1 - λ·div(∇u / |∇u|)`. With
/// `λ = 0` this is [`richardson_lucy`].
pub fn richardson_lucy_total_variation<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    psf: &ArrayBase<S2, E>,
    params: RichardsonLucyParams,
    options: RichardsonLucyOptions,
) -> Result<Array<RealOf<A>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    deconvolve(
        input,
        psf,
        params.max_iterations,
        Some(params.regularization),
        options,
    )
    .context("RichardsonLucyTotalVariation")
}

fn deconvolve<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    psf: &ArrayBase<S2, E>,
    max_iterations: usize,
    regularization: Option<f64>,
    options: RichardsonLucyOptions,
) -> Result<Array<RealOf<A>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    if max_iterations == 0 {
        return Err(Error::InvalidArgument("max_iterations must be at least 1"));
    }
    if let Some(lambda) = regularization {
        check_non_negative(lambda, "regularization must be non-negative")?;
    }

    let Problem { image, otf } = Problem::new(input, psf, options.otf)?;
    iterate(
        image,
        &otf,
        max_iterations,
        regularization.map(<RealOf<A> as ConvFloat>::cast_f64),
    )
}

fn iterate<R, D>(
    image: Array<R, D>,
    otf: &Array<Complex<R>, D>,
    max_iterations: usize,
    regularization: Option<R>,
) -> Result<Array<R, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    let threshold = R::cast_f64(CONVERGENCE_THRESHOLD);
    let floor = R::cast_f64(DENOMINATOR_FLOOR);
    let mut estimate = image.mapv(|v| Float::max(v, R::zero()));

    for iteration in 1..=max_iterations {
        let blurred = filter_spatial(to_frequency(&estimate)?, otf, false)?;
        let ratio = Zip::from(&image)
            .and(&blurred)
            .par_map_collect(|&g, &b| if b == R::zero() { R::zero() } else { g / b });
        let correction = filter_spatial(to_frequency(&ratio)?, otf, true)?;

        let mut next = &estimate * &correction;
        if let Some(lambda) = regularization {
            let curvature = curvature(&estimate);
            Zip::from(&mut next).and(&curvature).par_for_each(|v, &k| {
                *v = *v / Float::max(R::one() - lambda * k, floor);
            });
        }
        next.mapv_inplace(|v| Float::max(v, R::zero()));

        let change = relative_change(&next, &estimate);
        estimate = next;
        debug!("Richardson-Lucy iteration {iteration}: MRE = {change:?}");
        if change < threshold {
            debug!("Richardson-Lucy: converged after {iteration} iterations");
            break;
        }
    }
    Ok(estimate)
}

/// `div(∇u / |∇u|)`, with forward differences for the gradient and backward
/// differences for the divergence.
fn curvature<R, D>(u: &Array<R, D>) -> Array<R, D>
where
    R: ConvFloat,
    D: Dimension,
{
    let gradient = (0..u.ndim())
        .map(|axis| forward_difference(u, Axis(axis)))
        .collect::<Vec<_>>();

    let mut magnitude = Array::<R, D>::zeros(u.raw_dim());
    gradient.iter().for_each(|g| {
        Zip::from(&mut magnitude).and(g).for_each(|m, &v| *m += v * v);
    });
    let gradient_floor = R::cast_f64(GRADIENT_FLOOR);
    magnitude.mapv_inplace(|m| Float::max(m.sqrt(), gradient_floor));

    gradient
        .into_iter()
        .enumerate()
        .fold(Array::zeros(u.raw_dim()), |mut divergence, (axis, mut g)| {
            g /= &magnitude;
            divergence += &backward_difference(&g, Axis(axis));
            divergence
        })
}

/// `u[i + 1] - u[i]`, zero at the last sample.
fn forward_difference<R, D>(u: &Array<R, D>, axis: Axis) -> Array<R, D>
where
    R: ConvFloat,
    D: Dimension,
{
    let n = u.len_of(axis);
    let mut output = Array::zeros(u.raw_dim());
    if n > 1 {
        let mut front = output.slice_axis_mut(axis, Slice::from(..n - 1));
        front.assign(&u.slice_axis(axis, Slice::from(1..)));
        front -= &u.slice_axis(axis, Slice::from(..n - 1));
    }
    output
}

/// `v[i] - v[i - 1]`, with `v[-1] = 0`.
fn backward_difference<R, D>(v: &Array<R, D>, axis: Axis) -> Array<R, D>
where
    R: ConvFloat,
    D: Dimension,
{
    let n = v.len_of(axis);
    let mut output = v.clone();
    if n > 1 {
        let mut tail = output.slice_axis_mut(axis, Slice::from(1..));
        tail -= &v.slice_axis(axis, Slice::from(..n - 1));
    }
    output
}
