//! Iterative constrained Tikhonov-Miller deconvolution.
//!
//! Minimizes `|H f - g|² + λ|C f|²` over non-negative `f`, with `C` an ideal
//! Laplacian, by projected steepest descent. Each iteration steps along the
//! residual `r = A F - Hᵗ G` (`A = |H|² + λ|C|²`) and zeroes the negative
//! samples of the new estimate.

use log::debug;
use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Slice, Zip};
use num::Complex;

use super::{
    check_non_negative, inner_product, relative_change, to_frequency, to_spatial, Problem,
    CONVERGENCE_THRESHOLD,
};
use crate::{
    element::{ConvFloat, Flex, KernelWeight, RealOf},
    error::ResultExt,
    Error, Result,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IctmParams {
    pub max_iterations: usize,
    /// Weight `λ` of the Laplacian regularizer.
    pub regularization: f64,
    /// Step length in `"simple"` mode.
    pub step_size: f64,
}

impl Default for IctmParams {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            regularization: 0.1,
            step_size: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IctmOptions {
    /// The PSF argument is already the optical transfer function.
    pub otf: bool,
    /// Fixed step length instead of the exact line search.
    pub simple: bool,
}

impl IctmOptions {
    /// Parses option tokens: `"OTF"` and `"simple"`.
    pub fn from_flags(flags: &[&str]) -> Result<Self> {
        flags.iter().try_fold(Self::default(), |mut options, &flag| {
            match flag {
                "OTF" => options.otf = true,
                "simple" => options.simple = true,
                other => return Err(Error::InvalidFlag(other.to_string())),
            }
            Ok(options)
        })
    }
}

/// Deconvolves `input` with the iterative constrained Tikhonov-Miller
/// method, starting from the input itself.
///
/// Stops after `max_iterations` iterations or when successive estimates
/// differ by a mean relative error below [`CONVERGENCE_THRESHOLD`]. The
/// output is non-negative.
pub fn iterative_constrained_tikhonov_miller<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    psf: &ArrayBase<S2, E>,
    params: IctmParams,
    options: IctmOptions,
) -> Result<Array<RealOf<A>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    ictm(input, psf, params, options).context("IterativeConstrainedTikhonovMiller")
}

fn ictm<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    psf: &ArrayBase<S2, E>,
    params: IctmParams,
    options: IctmOptions,
) -> Result<Array<RealOf<A>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    if params.max_iterations == 0 {
        return Err(Error::InvalidArgument("max_iterations must be at least 1"));
    }
    check_non_negative(params.regularization, "regularization must be non-negative")?;
    if !params.step_size.is_finite() {
        return Err(Error::InvalidArgument("step_size must be finite"));
    }

    let problem = Problem::new(input, psf, options.otf)?;
    solve(problem, params, options.simple)
}

/// `|H|² + λ·(π²·Σ f²)²`, with `f` the normalized frequency along each axis.
fn system_matrix<R, D>(otf: &Array<Complex<R>, D>, regularization: R) -> Array<R, D>
where
    R: ConvFloat,
    D: Dimension,
{
    let mut matrix = Array::<R, D>::zeros(otf.raw_dim());
    (0..otf.ndim()).for_each(|axis| {
        let n = otf.len_of(Axis(axis));
        (0..n).for_each(|i| {
            let f = R::cast_f64((i as f64 - (n / 2) as f64) / n as f64);
            matrix
                .slice_axis_mut(Axis(axis), Slice::from(i..i + 1))
                .mapv_inplace(|v| v + f * f);
        });
    });

    let pi2 = R::PI() * R::PI();
    Zip::from(&mut matrix).and(otf).par_for_each(|m, &h| {
        let laplacian = pi2 * *m;
        *m = h.norm_sqr() + regularization * laplacian * laplacian;
    });
    matrix
}

fn solve<R, D>(problem: Problem<R, D>, params: IctmParams, simple: bool) -> Result<Array<R, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    let Problem { image, otf } = problem;
    let system = system_matrix(&otf, R::cast_f64(params.regularization));

    let mut estimate = to_frequency(&image)?;
    let mut htg = estimate.clone();
    Zip::from(&mut htg)
        .and(&otf)
        .par_for_each(|g, &h| *g = *g * h.conj());
    drop(otf);

    // samples kept by the last projection
    let mut mask = Array::<R, D>::ones(image.raw_dim());
    let mut previous = image;
    let step = R::cast_f64(params.step_size);
    let threshold = R::cast_f64(CONVERGENCE_THRESHOLD);

    let mut iteration = 0;
    loop {
        iteration += 1;

        // the search direction is the residual itself
        let mut residual = estimate.clone();
        Zip::from(&mut residual)
            .and(&system)
            .and(&htg)
            .par_for_each(|r, &a, &b| *r = *r * a - b);

        let beta = match simple {
            true => -step,
            false => line_search(&residual, &system, &mask)?,
        };
        Zip::from(&mut estimate)
            .and(&residual)
            .par_for_each(|f, &d| *f = *f + d * beta);

        let mut output = to_spatial(estimate)?;
        let mut negatives = 0usize;
        Zip::from(&mut output).and(&mut mask).for_each(|v, t| {
            if *v >= R::zero() {
                *t = R::one();
            } else {
                *v = R::zero();
                *t = R::zero();
                negatives += 1;
            }
        });
        debug!("ICTM iteration {iteration}: beta = {beta:?}, {negatives} negative samples set to zero");

        if iteration == params.max_iterations {
            debug!("ICTM: stopping at the iteration limit");
            return Ok(output);
        }
        let change = relative_change(&output, &previous);
        if change < threshold {
            debug!("ICTM: converged after {iteration} iterations, MRE = {change:?}");
            return Ok(output);
        }

        estimate = to_frequency(&output)?;
        previous = output;
    }
}

/// Exact step length along the residual for the projected problem,
/// `-<T r, r> / <T r, A T r>` with `T` the projection mask, evaluated in the
/// spatial domain. Zero when the denominator vanishes.
fn line_search<R, D>(
    residual: &Array<Complex<R>, D>,
    system: &Array<R, D>,
    mask: &Array<R, D>,
) -> Result<R>
where
    R: ConvFloat,
    D: Dimension,
{
    let spatial = to_spatial(residual.clone())?;
    let masked = &spatial * mask;

    let mut projected = to_frequency(&masked)?;
    Zip::from(&mut projected)
        .and(system)
        .par_for_each(|x, &a| *x = *x * a);
    let projected = to_spatial(projected)?;

    let denominator = inner_product(&masked, &projected);
    if denominator == R::zero() {
        return Ok(R::zero());
    }
    Ok(-inner_product(&masked, &spatial) / denominator)
}
