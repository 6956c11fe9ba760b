//! Deconvolution of real images blurred by a known point-spread function.
//!
//! All solvers work in the centered frequency domain of
//! [`fourier_transform`](crate::fourier_transform) and assume the blur is a
//! circular convolution. The PSF has its origin at `size / 2` and is
//! zero-padded to the image size; with the `"OTF"` option it is instead taken
//! to be the optical transfer function itself, already the image's size.

use ndarray::{Array, ArrayBase, Data, Dimension, Zip};
use num::{Complex, Float, Zero};

use crate::{
    conv_fft::{forward_centered, inverse_centered},
    element::{complex_cast, ConvFloat, ConvNum, Flex, KernelWeight},
    kernel::expand_dimensionality,
    padding::pad_centered,
    Error, Result,
};

mod ictm;
mod richardson_lucy;
mod wiener;

pub use ictm::{iterative_constrained_tikhonov_miller, IctmOptions, IctmParams};
pub use richardson_lucy::{
    richardson_lucy, richardson_lucy_total_variation, RichardsonLucyOptions, RichardsonLucyParams,
};
pub use wiener::{
    wiener_deconvolution, wiener_deconvolution_with_spectra, NoisePower, WienerOptions,
    DEFAULT_WIENER_REGULARIZATION,
};

/// Iterative solvers stop once successive estimates differ by less than this
/// mean relative error.
pub const CONVERGENCE_THRESHOLD: f64 = 1e-12;

/// Optical transfer function for an image of shape `dim`.
///
/// The PSF may have fewer dimensions than the image and must not be larger.
/// With `is_otf` the argument already is the transfer function and must have
/// exactly the image's sizes.
pub fn get_otf<R, K, S, E, D>(
    psf: &ArrayBase<S, E>,
    dim: D,
    is_otf: bool,
) -> Result<Array<Complex<R>, D>>
where
    R: ConvFloat,
    K: KernelWeight,
    S: Data<Elem = K>,
    E: Dimension,
    D: Dimension,
{
    if psf.is_empty() {
        return Err(Error::NotForged);
    }
    let psf = expand_dimensionality::<K, S, E, D>(psf, dim.ndim())?
        .mapv(|k| complex_cast::<R>(k.to_complex64()));

    if is_otf {
        if psf.shape() != dim.slice() {
            return Err(Error::SizesDontMatch {
                expected: dim.slice().to_vec(),
                found: psf.shape().to_vec(),
            });
        }
        return Ok(psf);
    }
    forward_centered(pad_centered(&psf, dim.slice())?)
}

/// Mean over all samples of `|a - b| / |a|`; samples where `a` is zero
/// contribute zero.
pub fn mean_relative_error<T, S, S2, D>(
    a: &ArrayBase<S, D>,
    b: &ArrayBase<S2, D>,
) -> Result<T::Real>
where
    T: ConvNum,
    S: Data<Elem = T>,
    S2: Data<Elem = T>,
    D: Dimension,
{
    if a.is_empty() {
        return Err(Error::NotForged);
    }
    if a.shape() != b.shape() {
        return Err(Error::SizesDontMatch {
            expected: a.shape().to_vec(),
            found: b.shape().to_vec(),
        });
    }
    let sum = Zip::from(a).and(b).fold(<T::Real as Zero>::zero(), |acc, &x, &y| {
        acc + relative((x - y).modulus(), x.modulus())
    });
    Ok(sum / <T::Real as ConvFloat>::cast_f64(a.len() as f64))
}

/// [`mean_relative_error`] between two estimates of the same shape.
pub(crate) fn relative_change<R, D>(a: &Array<R, D>, b: &Array<R, D>) -> R
where
    R: ConvFloat,
    D: Dimension,
{
    let sum = Zip::from(a).and(b).fold(R::zero(), |acc, &x, &y| {
        acc + relative(Float::abs(x - y), Float::abs(x))
    });
    sum / R::cast_f64(a.len() as f64)
}

#[inline]
fn relative<R: ConvFloat>(diff: R, scale: R) -> R {
    if scale == R::zero() {
        R::zero()
    } else {
        diff / scale
    }
}

/// Validated image in its real arithmetic type, with the OTF of its blur.
pub(crate) struct Problem<R: ConvFloat, D: Dimension> {
    pub(crate) image: Array<R, D>,
    pub(crate) otf: Array<Complex<R>, D>,
}

impl<R: ConvFloat, D: Dimension> Problem<R, D> {
    pub(crate) fn new<A, K, S, S2, E>(
        input: &ArrayBase<S, D>,
        psf: &ArrayBase<S2, E>,
        is_otf: bool,
    ) -> Result<Self>
    where
        A: Flex,
        A::FlexComplex: ConvNum<Real = R>,
        K: KernelWeight,
        S: Data<Elem = A>,
        S2: Data<Elem = K>,
        E: Dimension,
    {
        if input.is_empty() || psf.is_empty() {
            return Err(Error::NotForged);
        }
        if <A::Flex as ConvNum>::IS_COMPLEX {
            return Err(Error::DataTypeNotSupported("complex input"));
        }

        let image = input.mapv(|v| v.to_flex_complex().to_complex().re);
        let otf = get_otf(psf, input.raw_dim(), is_otf)?;
        Ok(Self { image, otf })
    }
}

pub(crate) fn to_frequency<R, D>(spatial: &Array<R, D>) -> Result<Array<Complex<R>, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    forward_centered(spatial.mapv(|v| Complex::new(v, R::zero())))
}

/// Inverse transform keeping the real part.
pub(crate) fn to_spatial<R, D>(spectrum: Array<Complex<R>, D>) -> Result<Array<R, D>>
where
    R: ConvFloat,
    D: Dimension,
{
    Ok(inverse_centered(spectrum)?.mapv(|c| c.re))
}

/// Spatial version of `spectrum` after multiplying it by `otf` (or by its
/// conjugate).
pub(crate) fn filter_spatial<R: ConvFloat, D: Dimension>(
    mut spectrum: Array<Complex<R>, D>,
    otf: &Array<Complex<R>, D>,
    conjugate: bool,
) -> Result<Array<R, D>> {
    Zip::from(&mut spectrum).and(otf).par_for_each(|x, &h| {
        *x = if conjugate { *x * h.conj() } else { *x * h };
    });
    to_spatial(spectrum)
}

pub(crate) fn inner_product<R: ConvFloat, D: Dimension>(a: &Array<R, D>, b: &Array<R, D>) -> R {
    Zip::from(a).and(b).fold(R::zero(), |acc, &x, &y| acc + x * y)
}

pub(crate) fn check_non_negative(value: f64, message: &'static str) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidArgument(message))
    }
}
