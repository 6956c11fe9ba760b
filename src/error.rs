//! Error type shared by every convolution and deconvolution operation.

/// Errors raised by the convolution and deconvolution operations.
///
/// All validation happens before any computation starts, so an error never
/// leaves a partially written output behind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("array is not forged (it has no samples)")]
    NotForged,
    #[error("dimensionality not supported: {0}")]
    DimensionalityNotSupported(usize),
    #[error("dimensionalities don't match: expected {expected}, found {found}")]
    DimensionalitiesDontMatch { expected: usize, found: usize },
    #[error("array parameter has the wrong length: expected 1 or {expected}, found {found}")]
    ArrayParameterWrongLength { expected: usize, found: usize },
    #[error("sizes don't match: {expected:?} vs {found:?}")]
    SizesDontMatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("data type not supported: {0}")]
    DataTypeNotSupported(&'static str),
    #[error("invalid flag: {0:?}")]
    InvalidFlag(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("filter kernel not separable")]
    NotSeparable,
    #[error("size {0} is too large for the Fourier transform")]
    SizeTooLarge(usize),
    #[error("FFT failed: {0}")]
    Fft(#[from] realfft::FftError),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Strips the call-site annotations and returns the underlying error.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Annotates an error with the name of the operation it passed through.
pub trait ResultExt<T> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[inline]
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|source| Error::Context {
            context,
            source: Box::new(source),
        })
    }
}
