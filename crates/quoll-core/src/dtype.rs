use std::fmt;

use crate::tensor::TensorElem;

// DType — Runtime element type descriptors
//
// Every tensor carries a DType tag. Kernels inspect it at runtime and
// dispatch to a typed implementation. Only the integer storage types are
// quantized codes; the rest describe auxiliary tensors:
//
//   U8, I8, I16, U16 — quantized code storage (kernel-supported)
//   I32, I64         — integer side tensors (zero points, indices)
//   F16, BF16        — half-precision floats
//   F32, F64         — float side tensors (scales, affine params)

/// Enum of all element data types a tensor can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    U8,
    I8,
    I16,
    U16,
    I32,
    I64,
    F16,
    BF16,
    F32,
    F64,
}

impl DType {
    /// Whether values of this dtype are interpreted as quantized codes.
    pub fn is_quantized(&self) -> bool {
        matches!(self, DType::U8 | DType::I8 | DType::I16 | DType::U16)
    }

    /// Inclusive `(min, max)` integer range, or `None` for float dtypes.
    pub fn code_range(&self) -> Option<(i64, i64)> {
        match self {
            DType::U8 => Some((u8::MIN as i64, u8::MAX as i64)),
            DType::I8 => Some((i8::MIN as i64, i8::MAX as i64)),
            DType::I16 => Some((i16::MIN as i64, i16::MAX as i64)),
            DType::U16 => Some((u16::MIN as i64, u16::MAX as i64)),
            DType::I32 => Some((i32::MIN as i64, i32::MAX as i64)),
            DType::I64 => Some((i64::MIN, i64::MAX)),
            DType::F16 | DType::BF16 | DType::F32 | DType::F64 => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::U8 => "u8",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::U16 => "u16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        write!(f, "{}", s)
    }
}

// QuantElem — bridge between Rust integer types and quantized DTypes
//
// Kernels are written once, generic over T: QuantElem, and instantiated for
// each storage type. The trait exposes the code range as i64 so that all
// zero-point arithmetic happens in a single wide type:
//
//   fn kernel<T: QuantElem>(codes: &[T]) { let c = codes[0].to_i64(); ... }

/// Integer storage type usable as a quantized code.
///
/// The DType tag comes from the [`TensorElem`] supertrait.
pub trait QuantElem: TensorElem + PartialOrd + fmt::Debug {
    /// Smallest representable code, widened.
    const MIN: i64;
    /// Largest representable code, widened.
    const MAX: i64;

    fn to_i64(self) -> i64;

    /// Narrow an i64 to this type, clamping to `[MIN, MAX]`.
    fn saturating_from_i64(v: i64) -> Self;

    /// Largest absolute code value, used to size accumulators.
    fn max_abs() -> u64 {
        Self::MIN.unsigned_abs().max(Self::MAX.unsigned_abs())
    }
}

macro_rules! impl_quant_elem {
    ($t:ty) => {
        impl QuantElem for $t {
            const MIN: i64 = <$t>::MIN as i64;
            const MAX: i64 = <$t>::MAX as i64;

            #[inline]
            fn to_i64(self) -> i64 {
                self as i64
            }

            #[inline]
            fn saturating_from_i64(v: i64) -> Self {
                v.clamp(<Self as QuantElem>::MIN, <Self as QuantElem>::MAX) as $t
            }
        }
    };
}

impl_quant_elem!(u8);
impl_quant_elem!(i8);
impl_quant_elem!(i16);
impl_quant_elem!(u16);
