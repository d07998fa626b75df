//! DType dispatch for quantized kernels.
//!
//! Kernels are written once as generic functions over `T: QuantElem` and
//! instantiated for every supported code type. [`dispatch_quantized!`] turns
//! the runtime [`DType`] tag of a tensor into one of those instantiations:
//!
//! ```ignore
//! dispatch_quantized!(input.dtype(), T => {
//!     layer_norm_rows::<T>(input.as_slice::<T>()?, ...)
//! }, "quantized_layer_norm")
//! ```
//!
//! | DType | Rust type |
//! |-------|-----------|
//! | `U8`  | `u8`      |
//! | `I8`  | `i8`      |
//! | `I16` | `i16`     |
//! | `U16` | `u16`     |
//!
//! Every other dtype evaluates to `Err(Error::UnsupportedDType)`. That is a
//! capability boundary of the build, not a runtime fault: the caller picked
//! a kernel that only exists for these storage types, and retrying cannot
//! help.

use quoll_core::{DType, Error};

/// The closed set of code types the quantized kernels are built for.
pub const SUPPORTED_DTYPES: [DType; 4] = [DType::U8, DType::I8, DType::I16, DType::U16];

pub fn is_supported(dtype: DType) -> bool {
    dtype.is_quantized()
}

/// Build (and log) the error for a dtype outside [`SUPPORTED_DTYPES`].
#[doc(hidden)]
pub fn unsupported(dtype: DType, op: &'static str) -> Error {
    log::error!("{}: unhandled dtype {}", op, dtype);
    Error::UnsupportedDType { dtype, op }
}

/// Run `$body` with `$T` bound to the Rust code type matching `$dtype`.
///
/// The body must evaluate to a `quoll::Result<_>`.
#[macro_export]
macro_rules! dispatch_quantized {
    ($dtype:expr, $T:ident => $body:block, $op:expr) => {
        match $dtype {
            $crate::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::DType::U16 => {
                type $T = u16;
                $body
            }
            other => Err($crate::dispatch::unsupported(other, $op)),
        }
    };
}
