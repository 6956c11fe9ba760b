//! Element traits resolving input and filter sample types to the arithmetic
//! type an operation computes in.
//!
//! Every operation resolves its arithmetic type once, through these traits,
//! and then runs a monomorphic implementation:
//!
//! * [`Flex`] maps an input element to the smallest floating type that holds
//!   it losslessly (8/16-bit integers and `bool` to `f32`, wider integers to
//!   `f64`), together with its complex counterpart.
//! * [`Promote`] combines an input element with a filter element: complex
//!   filters force complex arithmetic.
//! * [`ConvNum`] is the arithmetic type itself.

use std::fmt::Debug;
use std::ops::Neg;

use num::{
    traits::{FloatConst, FromPrimitive, NumAssign},
    Complex, Float, Zero,
};
use rustfft::FftNum;

/// Real floating point precision (`f32` or `f64`).
pub trait ConvFloat:
    Float + FloatConst + FftNum + NumAssign + FromPrimitive + Default + Debug + Send + Sync + 'static
{
    /// Rounds a double to this precision.
    fn cast_f64(v: f64) -> Self;
}

impl ConvFloat for f32 {
    #[inline]
    fn cast_f64(v: f64) -> Self {
        v as f32
    }
}

impl ConvFloat for f64 {
    #[inline]
    fn cast_f64(v: f64) -> Self {
        v
    }
}

/// Real precision an input element computes in.
pub type RealOf<A> = <<A as Flex>::Flex as ConvNum>::Real;

/// Anything a boundary extension can copy, negate or zero.
pub trait Sample: Copy + Zero + Neg<Output = Self> + Send + Sync + 'static {}

impl<T: Copy + Zero + Neg<Output = T> + Send + Sync + 'static> Sample for T {}

/// Converts a double precision complex value to precision `R`.
#[inline]
pub(crate) fn complex_cast<R: ConvFloat>(v: Complex<f64>) -> Complex<R> {
    Complex::new(R::cast_f64(v.re), R::cast_f64(v.im))
}

/// Arithmetic sample type: a real or complex floating point number.
pub trait ConvNum:
    Copy + NumAssign + Neg<Output = Self> + Default + Debug + Send + Sync + 'static
{
    type Real: ConvFloat;

    const IS_COMPLEX: bool;

    fn from_real(v: Self::Real) -> Self;

    /// Converts a complex value; real types keep the real part.
    fn from_complex(v: Complex<Self::Real>) -> Self;

    /// Converts a double precision complex value; real types keep the real part.
    fn from_complex64(v: Complex<f64>) -> Self;

    fn to_complex(self) -> Complex<Self::Real>;

    fn conj(self) -> Self;

    /// Absolute value (modulus for complex numbers).
    fn modulus(self) -> Self::Real;

    fn scale(self, factor: Self::Real) -> Self;
}

macro_rules! impl_conv_num_real {
    ($($t:ty),*) => {
        $(
            impl ConvNum for $t {
                type Real = $t;

                const IS_COMPLEX: bool = false;

                #[inline]
                fn from_real(v: $t) -> Self {
                    v
                }

                #[inline]
                fn from_complex(v: Complex<$t>) -> Self {
                    v.re
                }

                #[inline]
                fn from_complex64(v: Complex<f64>) -> Self {
                    v.re as $t
                }

                #[inline]
                fn to_complex(self) -> Complex<$t> {
                    Complex::new(self, 0.0)
                }

                #[inline]
                fn conj(self) -> Self {
                    self
                }

                #[inline]
                fn modulus(self) -> $t {
                    self.abs()
                }

                #[inline]
                fn scale(self, factor: $t) -> Self {
                    self * factor
                }
            }
        )*
    };
}

macro_rules! impl_conv_num_complex {
    ($($t:ty),*) => {
        $(
            impl ConvNum for Complex<$t> {
                type Real = $t;

                const IS_COMPLEX: bool = true;

                #[inline]
                fn from_real(v: $t) -> Self {
                    Complex::new(v, 0.0)
                }

                #[inline]
                fn from_complex(v: Complex<$t>) -> Self {
                    v
                }

                #[inline]
                fn from_complex64(v: Complex<f64>) -> Self {
                    Complex::new(v.re as $t, v.im as $t)
                }

                #[inline]
                fn to_complex(self) -> Complex<$t> {
                    self
                }

                #[inline]
                fn conj(self) -> Self {
                    Complex::conj(&self)
                }

                #[inline]
                fn modulus(self) -> $t {
                    self.norm()
                }

                #[inline]
                fn scale(self, factor: $t) -> Self {
                    self * factor
                }
            }
        )*
    };
}

impl_conv_num_real!(f32, f64);
impl_conv_num_complex!(f32, f64);

/// Input sample type, with the arithmetic types it is promoted to.
pub trait Flex: Copy + Send + Sync + 'static {
    type Flex: ConvNum;
    type FlexComplex: ConvNum<Real = <Self::Flex as ConvNum>::Real>;

    fn to_flex(self) -> Self::Flex;

    fn to_flex_complex(self) -> Self::FlexComplex;
}

macro_rules! impl_flex_real {
    ($flex:ty; $($t:ty),*) => {
        $(
            impl Flex for $t {
                type Flex = $flex;
                type FlexComplex = Complex<$flex>;

                #[inline]
                fn to_flex(self) -> $flex {
                    self as $flex
                }

                #[inline]
                fn to_flex_complex(self) -> Complex<$flex> {
                    Complex::new(self as $flex, 0.0)
                }
            }
        )*
    };
}

impl_flex_real!(f32; u8, i8, u16, i16, f32);
impl_flex_real!(f64; u32, i32, u64, i64, f64);

impl Flex for bool {
    type Flex = f32;
    type FlexComplex = Complex<f32>;

    #[inline]
    fn to_flex(self) -> f32 {
        if self {
            1.0
        } else {
            0.0
        }
    }

    #[inline]
    fn to_flex_complex(self) -> Complex<f32> {
        Complex::new(self.to_flex(), 0.0)
    }
}

impl<T: ConvFloat> Flex for Complex<T>
where
    Complex<T>: ConvNum<Real = T>,
{
    type Flex = Complex<T>;
    type FlexComplex = Complex<T>;

    #[inline]
    fn to_flex(self) -> Complex<T> {
        self
    }

    #[inline]
    fn to_flex_complex(self) -> Complex<T> {
        self
    }
}

/// Weight of a filter or kernel sample. Binary weights (`bool`) describe a
/// neighborhood shape rather than numeric taps.
pub trait KernelWeight: Copy + Send + Sync + Debug + 'static {
    const IS_COMPLEX: bool;
    const IS_BINARY: bool = false;

    fn to_complex64(self) -> Complex<f64>;

    fn is_zero_weight(&self) -> bool;
}

/// Numeric (non-binary) filter coefficient.
pub trait Coefficient: KernelWeight {}

impl KernelWeight for bool {
    const IS_COMPLEX: bool = false;
    const IS_BINARY: bool = true;

    #[inline]
    fn to_complex64(self) -> Complex<f64> {
        Complex::new(if self { 1.0 } else { 0.0 }, 0.0)
    }

    #[inline]
    fn is_zero_weight(&self) -> bool {
        !*self
    }
}

macro_rules! impl_coefficient {
    ($($t:ty),*) => {
        $(
            impl KernelWeight for $t {
                const IS_COMPLEX: bool = false;

                #[inline]
                fn to_complex64(self) -> Complex<f64> {
                    Complex::new(self as f64, 0.0)
                }

                #[inline]
                fn is_zero_weight(&self) -> bool {
                    *self == 0.0
                }
            }

            impl Coefficient for $t {}

            impl KernelWeight for Complex<$t> {
                const IS_COMPLEX: bool = true;

                #[inline]
                fn to_complex64(self) -> Complex<f64> {
                    Complex::new(self.re as f64, self.im as f64)
                }

                #[inline]
                fn is_zero_weight(&self) -> bool {
                    self.re == 0.0 && self.im == 0.0
                }
            }

            impl Coefficient for Complex<$t> {}
        )*
    };
}

impl_coefficient!(f32, f64);

/// Resolves the arithmetic type for an input element filtered with weights
/// of type `K`.
pub trait Promote<K: KernelWeight>: Flex {
    type Output: ConvNum<Real = <Self::Flex as ConvNum>::Real>;

    fn promote(self) -> Self::Output;
}

macro_rules! impl_promote {
    (real: $($k:ty),*) => {
        $(
            impl<A: Flex> Promote<$k> for A {
                type Output = A::Flex;

                #[inline]
                fn promote(self) -> A::Flex {
                    self.to_flex()
                }
            }
        )*
    };
    (complex: $($k:ty),*) => {
        $(
            impl<A: Flex> Promote<$k> for A {
                type Output = A::FlexComplex;

                #[inline]
                fn promote(self) -> A::FlexComplex {
                    self.to_flex_complex()
                }
            }
        )*
    };
}

impl_promote!(real: bool, f32, f64);
impl_promote!(complex: Complex<f32>, Complex<f64>);
