use crate::dtype::DType;
use crate::shape::Shape;

/// All errors that can occur within quoll.
///
/// Kernels validate every argument before writing a single output element,
/// so any `Err` returned from a kernel means the output buffer is untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tensor's dtype is outside the set the kernel was built for.
    ///
    /// This is a capability boundary, not a transient failure: calling again
    /// with the same tensor always fails the same way.
    #[error("unsupported dtype {dtype} for operation '{op}'")]
    UnsupportedDType { dtype: DType, op: &'static str },

    /// A scale or zero-point could not be resolved into valid parameters.
    #[error("invalid quantization params: {field}: {reason}")]
    InvalidQuantizationParams { field: &'static str, reason: String },

    /// Weight/bias length, normalized shape, rank or row length is unusable.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Shape mismatch between two tensors that must agree.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Typed access or an output tensor used the wrong dtype.
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch { expected: DType, got: DType },

    /// Element count mismatch when creating a tensor from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// A boxed scalar's type encoding is not a known numeric kind.
    #[error("unsupported scalar type encoding '{0}'")]
    UnsupportedScalarType(char),

    /// A scalar could not be converted to the requested native type.
    #[error("cannot convert {from} scalar to {to}: {reason}")]
    ScalarConversion {
        from: &'static str,
        to: &'static str,
        reason: &'static str,
    },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    pub fn invalid_shape(s: impl Into<String>) -> Self {
        Error::InvalidShape(s.into())
    }

    pub fn invalid_qparams(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidQuantizationParams {
            field,
            reason: reason.into(),
        }
    }

    /// Whether this error reflects a missing kernel capability rather than
    /// bad arguments.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::UnsupportedDType { .. })
    }
}

/// Convenience Result type used throughout quoll.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
