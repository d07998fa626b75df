// Quantization parameters — resolving per-tensor scale / zero-point
//
// Kernels accept input quantization parameters in two shapes:
//
//   1. Tensor-valued: single-element tensors, read at call time. The scale
//      tensor must be floating point (f32 or f64) and the zero-point tensor
//      a wide integer (i64 or i32).
//   2. Literal: plain `(f64, i64)` arguments, possibly sourced from boxed
//      host scalars via `quoll_core::Scalar`.
//
// Both resolve to the same `QuantParams`. Malformed inputs are reported as
// `Error::InvalidQuantizationParams`, never silently read.

use quoll_core::{DType, Error, QTensor, Result, Scalar};

/// Per-tensor affine quantization parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantParams {
    /// Real-valued step between adjacent codes. Always finite and > 0.
    pub scale: f64,
    /// Code that represents real zero.
    pub zero_point: i64,
}

impl QuantParams {
    /// Build parameters from literal values.
    pub fn new(scale: f64, zero_point: i64) -> Result<Self> {
        Self::named(scale, zero_point, "scale")
    }

    /// Like [`QuantParams::new`], reporting errors against `scale_field`.
    pub(crate) fn named(scale: f64, zero_point: i64, scale_field: &'static str) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::invalid_qparams(
                scale_field,
                format!("scale must be finite and > 0, got {}", scale),
            ));
        }
        Ok(QuantParams { scale, zero_point })
    }

    /// Read parameters from single-element scale and zero-point tensors.
    pub fn from_tensors(scale: &QTensor, zero_point: &QTensor) -> Result<Self> {
        Self::from_named_tensors(scale, zero_point, ("scale", "zero_point"))
    }

    pub(crate) fn from_named_tensors(
        scale: &QTensor,
        zero_point: &QTensor,
        (scale_field, zp_field): (&'static str, &'static str),
    ) -> Result<Self> {
        let scale_value = match single_element(scale, scale_field)? {
            DType::F32 => scale.as_slice::<f32>()?[0] as f64,
            DType::F64 => scale.as_slice::<f64>()?[0],
            other => {
                return Err(Error::invalid_qparams(
                    scale_field,
                    format!("expected an f32 or f64 tensor, got {}", other),
                ))
            }
        };
        let zp_value = match single_element(zero_point, zp_field)? {
            DType::I64 => zero_point.as_slice::<i64>()?[0],
            DType::I32 => zero_point.as_slice::<i32>()?[0] as i64,
            other => {
                return Err(Error::invalid_qparams(
                    zp_field,
                    format!("expected an i64 or i32 tensor, got {}", other),
                ))
            }
        };
        Self::named(scale_value, zp_value, scale_field)
    }

    /// Resolve parameters from boxed host scalars.
    ///
    /// The scale may be any numeric kind; the zero point must be integral.
    pub fn from_scalars(scale: Scalar, zero_point: Scalar) -> Result<Self> {
        let scale = scale
            .to::<f64>()
            .map_err(|e| Error::invalid_qparams("scale", e.to_string()))?;
        let zero_point = zero_point
            .to::<i64>()
            .map_err(|e| Error::invalid_qparams("zero_point", e.to_string()))?;
        Self::new(scale, zero_point)
    }

    /// The scale narrowed to the f32 compute precision.
    pub fn scale_f32(&self) -> f32 {
        self.scale as f32
    }

    /// Reciprocal of the scale in f32, as used by `quantize`.
    pub fn inv_scale(&self) -> f32 {
        self.scale_f32().recip()
    }

    /// Check that the zero point is a representable code of `dtype`.
    pub fn validate_for(&self, dtype: DType, field: &'static str) -> Result<()> {
        let (lo, hi) = dtype.code_range().ok_or(Error::UnsupportedDType {
            dtype,
            op: "quantization params",
        })?;
        if self.zero_point < lo || self.zero_point > hi {
            return Err(Error::invalid_qparams(
                field,
                format!(
                    "zero point {} outside the {} code range [{}, {}]",
                    self.zero_point, dtype, lo, hi
                ),
            ));
        }
        Ok(())
    }
}

/// Ensure `t` holds exactly one element and return its dtype.
fn single_element(t: &QTensor, field: &'static str) -> Result<DType> {
    if t.elem_count() != 1 {
        return Err(Error::invalid_qparams(
            field,
            format!(
                "expected a single-element tensor, got shape {} ({} elements)",
                t.shape(),
                t.elem_count()
            ),
        ));
    }
    Ok(t.dtype())
}
