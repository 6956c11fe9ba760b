//! Wiener deconvolution.

use log::debug;
use ndarray::{Array, ArrayBase, ArrayView, Data, Dimension, Zip};
use num::{Complex, Float, Zero};

use super::{check_non_negative, to_frequency, to_spatial, Problem};
use crate::{
    element::{ConvFloat, Flex, KernelWeight, RealOf},
    error::ResultExt,
    Error, Result,
};

/// Regularization used when the caller has no better estimate.
pub const DEFAULT_WIENER_REGULARIZATION: f64 = 1e-4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WienerOptions {
    /// The PSF argument is already the optical transfer function.
    pub otf: bool,
}

impl WienerOptions {
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

/// Power spectrum of the noise, in the centered frequency layout.
#[derive(Debug, Clone)]
pub enum NoisePower<'a, R, D: Dimension> {
    Constant(R),
    Spectrum(ArrayView<'a, R, D>),
}

/// Wiener deconvolution with a scalar regularization.
///
/// Computes `F = G·conj(H) / (|H|² + K)` with `K = regularization·max|H|²`,
/// `G` the spectrum of `input` and `H` the OTF, and returns the real part of
/// the inverse transform of `F`.
pub fn wiener_deconvolution<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    psf: &ArrayBase<S2, E>,
    regularization: f64,
    options: WienerOptions,
) -> Result<Array<RealOf<A>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    regularized(input, psf, regularization, options).context("WienerDeconvolution")
}

/// Wiener deconvolution with explicit power spectra:
/// `F = G·conj(H)·S / (|H|²·S + N)`.
///
/// Without a signal power spectrum `S` the power spectrum of the input,
/// `|G|²`, is used. The noise power `N` should not vanish where `|H|²·S`
/// does; frequencies where the denominator is exactly zero are set to zero.
pub fn wiener_deconvolution_with_spectra<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    psf: &ArrayBase<S2, E>,
    signal_power: Option<ArrayView<'_, RealOf<A>, D>>,
    noise_power: NoisePower<'_, RealOf<A>, D>,
    options: WienerOptions,
) -> Result<Array<RealOf<A>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    with_spectra(input, psf, signal_power, noise_power, options).context("WienerDeconvolution")
}

fn regularized<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    psf: &ArrayBase<S2, E>,
    regularization: f64,
    options: WienerOptions,
) -> Result<Array<RealOf<A>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    check_non_negative(regularization, "regularization must be non-negative")?;
    let problem = Problem::new(input, psf, options.otf)?;
    apply_regularized(problem, regularization)
}

fn with_spectra<A, K, S, S2, D, E>(
    input: &ArrayBase<S, D>,
    psf: &ArrayBase<S2, E>,
    signal_power: Option<ArrayView<'_, RealOf<A>, D>>,
    noise_power: NoisePower<'_, RealOf<A>, D>,
    options: WienerOptions,
) -> Result<Array<RealOf<A>, D>>
where
    A: Flex,
    K: KernelWeight,
    S: Data<Elem = A>,
    S2: Data<Elem = K>,
    D: Dimension,
    E: Dimension,
{
    if let Some(signal) = &signal_power {
        check_spectrum(input.shape(), signal.shape())?;
    }
    if let NoisePower::Spectrum(noise) = &noise_power {
        check_spectrum(input.shape(), noise.shape())?;
    }
    let problem = Problem::new(input, psf, options.otf)?;
    apply_spectra(problem, signal_power, noise_power)
}

fn check_spectrum(image: &[usize], spectrum: &[usize]) -> Result<()> {
    if image == spectrum {
        Ok(())
    } else {
        Err(Error::SizesDontMatch {
            expected: image.to_vec(),
            found: spectrum.to_vec(),
        })
    }
}

fn apply_regularized<R, D>(problem: Problem<R, D>, regularization: f64) -> Result<Array<R, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    let Problem { image, otf } = problem;
    let mut spectrum = to_frequency(&image)?;

    let peak = otf
        .iter()
        .fold(R::zero(), |acc, h| Float::max(acc, h.norm_sqr()));
    let k = R::cast_f64(regularization) * peak;
    debug!("Wiener deconvolution: K = {k:?}");

    Zip::from(&mut spectrum).and(&otf).par_for_each(|g, &h| {
        *g = safe_divide(*g * h.conj(), h.norm_sqr() + k);
    });
    to_spatial(spectrum)
}

fn apply_spectra<R, D>(
    problem: Problem<R, D>,
    signal_power: Option<ArrayView<'_, R, D>>,
    noise_power: NoisePower<'_, R, D>,
) -> Result<Array<R, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    let Problem { image, otf } = problem;
    let mut spectrum = to_frequency(&image)?;

    let signal = match signal_power {
        Some(signal) => signal.to_owned(),
        None => spectrum.mapv(|g| g.norm_sqr()),
    };
    let noise = match noise_power {
        NoisePower::Constant(n) => Array::from_elem(spectrum.raw_dim(), n),
        NoisePower::Spectrum(n) => n.to_owned(),
    };

    Zip::from(&mut spectrum)
        .and(&otf)
        .and(&signal)
        .and(&noise)
        .par_for_each(|g, &h, &s, &n| {
            *g = safe_divide(*g * h.conj() * s, h.norm_sqr() * s + n);
        });
    to_spatial(spectrum)
}

#[inline]
fn safe_divide<R: ConvFloat>(numerator: Complex<R>, denominator: R) -> Complex<R> {
    if denominator == R::zero() {
        Complex::zero()
    } else {
        numerator / denominator
    }
}
