use std::fmt;

use crate::error::{Error, Result};

// Scalar — boxed numeric values from host call sites
//
// Host bindings hand over numbers as boxed values tagged with a one-letter
// type encoding ('c' char, 's' short, 'i' int, 'q'/'l' long, 'f' float,
// 'd' double, 'B' bool). Kernels want plain native types, e.g. an f64 scale
// and an i64 zero point. Conversion rules:
//
//   1. The kind is deduced from the encoding. Upper-case (unsigned)
//      encodings fold onto their signed counterpart; 'B' stays bool.
//   2. Floating-point kinds never convert to integral targets (including
//      bool), even when the value happens to be integral.
//   3. Any other conversion is range-checked against the target type.

/// Numeric kind of a boxed scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Bool,
}

impl ScalarKind {
    /// Deduce the kind from a type-encoding character.
    pub fn from_encoding(encoding: char) -> Result<Self> {
        if encoding == 'B' {
            return Ok(ScalarKind::Bool);
        }
        match encoding.to_ascii_lowercase() {
            'c' => Ok(ScalarKind::Byte),
            's' => Ok(ScalarKind::Short),
            'i' => Ok(ScalarKind::Int),
            'q' | 'l' => Ok(ScalarKind::Long),
            'f' => Ok(ScalarKind::Float),
            'd' => Ok(ScalarKind::Double),
            _ => Err(Error::UnsupportedScalarType(encoding)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Byte => "byte",
            ScalarKind::Short => "short",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::Bool => "bool",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A boxed numeric value together with its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
}

/// Widened payload used during conversion.
enum Wide {
    Int(i64),
    Float(f64),
}

impl Scalar {
    /// Build a scalar from an encoding character and a raw value.
    ///
    /// The value is first stored in the deduced kind, so a 'c' scalar of 300
    /// is rejected here rather than silently wrapped.
    pub fn from_encoded(encoding: char, value: f64) -> Result<Self> {
        let kind = ScalarKind::from_encoding(encoding)?;
        let out_of_range = || Error::ScalarConversion {
            from: "f64",
            to: kind.name(),
            reason: "value out of range",
        };
        let int = || -> Result<i64> {
            if value.fract() != 0.0 || !value.is_finite() {
                return Err(Error::ScalarConversion {
                    from: "f64",
                    to: kind.name(),
                    reason: "value is not integral",
                });
            }
            num_traits::cast::<f64, i64>(value).ok_or_else(out_of_range)
        };
        Ok(match kind {
            ScalarKind::Byte => Scalar::Byte(int()?.try_into().map_err(|_| out_of_range())?),
            ScalarKind::Short => Scalar::Short(int()?.try_into().map_err(|_| out_of_range())?),
            ScalarKind::Int => Scalar::Int(int()?.try_into().map_err(|_| out_of_range())?),
            ScalarKind::Long => Scalar::Long(int()?),
            ScalarKind::Float => Scalar::Float(value as f32),
            ScalarKind::Double => Scalar::Double(value),
            ScalarKind::Bool => Scalar::Bool(value != 0.0),
        })
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Byte(_) => ScalarKind::Byte,
            Scalar::Short(_) => ScalarKind::Short,
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Long(_) => ScalarKind::Long,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Double(_) => ScalarKind::Double,
            Scalar::Bool(_) => ScalarKind::Bool,
        }
    }

    fn widen(&self) -> Wide {
        match *self {
            Scalar::Byte(v) => Wide::Int(v as i64),
            Scalar::Short(v) => Wide::Int(v as i64),
            Scalar::Int(v) => Wide::Int(v as i64),
            Scalar::Long(v) => Wide::Int(v),
            Scalar::Bool(v) => Wide::Int(v as i64),
            Scalar::Float(v) => Wide::Float(v as f64),
            Scalar::Double(v) => Wide::Float(v),
        }
    }

    /// Convert to a native type, refusing lossy narrowing.
    ///
    /// ```
    /// use quoll_core::Scalar;
    ///
    /// assert_eq!(Scalar::Long(-3).to::<i64>()?, -3);
    /// assert_eq!(Scalar::Int(2).to::<f64>()?, 2.0);
    /// assert!(Scalar::Double(2.0).to::<i64>().is_err());
    /// assert!(Scalar::Int(300).to::<u8>().is_err());
    /// # Ok::<(), quoll_core::Error>(())
    /// ```
    pub fn to<T: ScalarTarget>(&self) -> Result<T> {
        let from = self.kind().name();
        let converted = match self.widen() {
            Wide::Float(_) if T::IS_INTEGRAL => {
                return Err(Error::ScalarConversion {
                    from,
                    to: T::NAME,
                    reason: "cannot convert floating point to integral type",
                })
            }
            Wide::Float(v) => T::from_f64(v),
            Wide::Int(v) => T::from_i64(v),
        };
        converted.ok_or(Error::ScalarConversion {
            from,
            to: T::NAME,
            reason: "value out of range",
        })
    }
}

/// Native types a [`Scalar`] can be converted into.
pub trait ScalarTarget: Sized {
    const NAME: &'static str;
    /// Integral targets (including bool) reject floating-point sources.
    const IS_INTEGRAL: bool;

    fn from_i64(v: i64) -> Option<Self>;
    fn from_f64(v: f64) -> Option<Self>;
}

macro_rules! impl_int_target {
    ($($t:ty),*) => {$(
        impl ScalarTarget for $t {
            const NAME: &'static str = stringify!($t);
            const IS_INTEGRAL: bool = true;

            fn from_i64(v: i64) -> Option<Self> {
                num_traits::cast::<i64, $t>(v)
            }

            fn from_f64(_: f64) -> Option<Self> {
                None
            }
        }
    )*};
}

impl_int_target!(u8, i8, i16, u16, i32, u32, i64, u64);

impl ScalarTarget for bool {
    const NAME: &'static str = "bool";
    const IS_INTEGRAL: bool = true;

    fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    fn from_f64(_: f64) -> Option<Self> {
        None
    }
}

/// Finite sources must stay finite after narrowing.
fn narrow_f32(v: f64) -> Option<f32> {
    let r = v as f32;
    if v.is_finite() && !r.is_finite() {
        None
    } else {
        Some(r)
    }
}

impl ScalarTarget for f32 {
    const NAME: &'static str = "f32";
    const IS_INTEGRAL: bool = false;

    fn from_i64(v: i64) -> Option<Self> {
        num_traits::cast::<i64, f32>(v)
    }

    fn from_f64(v: f64) -> Option<Self> {
        narrow_f32(v)
    }
}

impl ScalarTarget for f64 {
    const NAME: &'static str = "f64";
    const IS_INTEGRAL: bool = false;

    fn from_i64(v: i64) -> Option<Self> {
        num_traits::cast::<i64, f64>(v)
    }

    fn from_f64(v: f64) -> Option<Self> {
        Some(v)
    }
}

macro_rules! impl_half_target {
    ($t:ty, $name:literal) => {
        impl ScalarTarget for $t {
            const NAME: &'static str = $name;
            const IS_INTEGRAL: bool = false;

            fn from_i64(v: i64) -> Option<Self> {
                <Self as ScalarTarget>::from_f64(v as f64)
            }

            fn from_f64(v: f64) -> Option<Self> {
                let r = <$t>::from_f64(v);
                if v.is_finite() && !r.is_finite() {
                    None
                } else {
                    Some(r)
                }
            }
        }
    };
}

impl_half_target!(half::f16, "f16");
impl_half_target!(half::bf16, "bf16");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduce_kind() {
        assert_eq!(ScalarKind::from_encoding('c').unwrap(), ScalarKind::Byte);
        assert_eq!(ScalarKind::from_encoding('C').unwrap(), ScalarKind::Byte);
        assert_eq!(ScalarKind::from_encoding('S').unwrap(), ScalarKind::Short);
        assert_eq!(ScalarKind::from_encoding('i').unwrap(), ScalarKind::Int);
        assert_eq!(ScalarKind::from_encoding('q').unwrap(), ScalarKind::Long);
        assert_eq!(ScalarKind::from_encoding('L').unwrap(), ScalarKind::Long);
        assert_eq!(ScalarKind::from_encoding('f').unwrap(), ScalarKind::Float);
        assert_eq!(ScalarKind::from_encoding('d').unwrap(), ScalarKind::Double);
        assert_eq!(ScalarKind::from_encoding('B').unwrap(), ScalarKind::Bool);
        assert!(matches!(
            ScalarKind::from_encoding('@'),
            Err(Error::UnsupportedScalarType('@'))
        ));
    }

    #[test]
    fn test_integral_conversions_are_range_checked() {
        assert_eq!(Scalar::Int(255).to::<u8>().unwrap(), 255);
        assert!(Scalar::Int(256).to::<u8>().is_err());
        assert!(Scalar::Byte(-1).to::<u16>().is_err());
        assert_eq!(Scalar::Long(-32768).to::<i16>().unwrap(), i16::MIN);
        assert!(Scalar::Long(i64::MAX).to::<i32>().is_err());
        assert_eq!(Scalar::Short(7).to::<u64>().unwrap(), 7);
    }

    #[test]
    fn test_float_to_integral_rejected() {
        let err = Scalar::Double(3.0).to::<i64>().unwrap_err();
        assert!(matches!(
            err,
            Error::ScalarConversion {
                from: "double",
                to: "i64",
                ..
            }
        ));
        assert!(Scalar::Float(1.0).to::<bool>().is_err());
    }

    #[test]
    fn test_float_targets() {
        assert_eq!(Scalar::Float(0.25).to::<f64>().unwrap(), 0.25);
        assert_eq!(Scalar::Long(3).to::<f32>().unwrap(), 3.0);
        assert!(Scalar::Double(1e300).to::<f32>().is_err());
        assert_eq!(
            Scalar::Double(1.5).to::<half::f16>().unwrap(),
            half::f16::from_f32(1.5)
        );
        assert!(Scalar::Double(1e6).to::<half::f16>().is_err());
        assert!(Scalar::Double(1e6).to::<half::bf16>().is_ok());
    }

    #[test]
    fn test_bool_round_trip() {
        assert!(Scalar::Bool(true).to::<bool>().unwrap());
        assert_eq!(Scalar::Bool(true).to::<i32>().unwrap(), 1);
        assert!(Scalar::Int(2).to::<bool>().is_err());
    }

    #[test]
    fn test_from_encoded() {
        assert_eq!(Scalar::from_encoded('q', 12.0).unwrap(), Scalar::Long(12));
        assert_eq!(Scalar::from_encoded('d', 0.5).unwrap(), Scalar::Double(0.5));
        assert!(Scalar::from_encoded('c', 300.0).is_err());
        assert!(Scalar::from_encoded('i', 1.5).is_err());
        assert!(Scalar::from_encoded('x', 1.0).is_err());
    }

    #[test]
    fn test_from_encoded_long_out_of_range() {
        for value in [1e19, -1e19, 2f64.powi(63)] {
            let err = Scalar::from_encoded('q', value).unwrap_err();
            assert!(matches!(
                err,
                Error::ScalarConversion {
                    to: "long",
                    reason: "value out of range",
                    ..
                }
            ));
        }
        assert_eq!(
            Scalar::from_encoded('l', -(2f64.powi(63))).unwrap(),
            Scalar::Long(i64::MIN)
        );
    }
}
