//! N-dimensional separable, general and Fourier-domain convolution, with
//! Wiener, Tikhonov-Miller and Richardson-Lucy deconvolution, for `ndarray`.

mod conv;
mod conv_fft;
mod convolution;
mod deconvolution;
pub mod element;
mod error;
mod kernel;
mod padding;
mod separable;

pub use error::{Error, Result, ResultExt};

pub use padding::{boundary_array, BoundaryCondition, ExplicitPadding, PaddingExt};

pub use separable::{separable_convolution, FilterSymmetry, OneDimensionalFilter, SeparableConvExt};

pub use kernel::{separate_filter, IntoKernel, Kernel};

pub use conv::{general_convolution, uniform_filter, GeneralConvExt};

pub use conv_fft::{
    convolve_ft, convolve_ft_into, convolve_ft_real, convolve_ft_real_into, fourier_transform,
    inverse_fourier_transform, optimal_fourier_transform_size, ConvFtExt, Representation,
    MAX_FOURIER_TRANSFORM_SIZE,
};

pub use convolution::{convolution, ConvolutionExt, ConvolutionMethod, CostModel, Plan};

pub use deconvolution::{
    get_otf, iterative_constrained_tikhonov_miller, mean_relative_error, richardson_lucy,
    richardson_lucy_total_variation, wiener_deconvolution, wiener_deconvolution_with_spectra,
    IctmOptions, IctmParams, NoisePower, RichardsonLucyOptions, RichardsonLucyParams,
    WienerOptions, CONVERGENCE_THRESHOLD, DEFAULT_WIENER_REGULARIZATION,
};
