// Quantization codec — affine quantize / dequantize primitives
//
// Per-tensor affine quantization maps a real value to an integer code:
//
//   code  = saturate(round(value / scale) + zero_point)
//   value = (code - zero_point) * scale
//
// Callers pass `inv_scale = 1 / scale` to `quantize` so the hot loop
// multiplies instead of dividing. Rounding is round-half-to-even, the
// default IEEE rounding mode, so results agree with `nearbyint`-based
// reference kernels. Saturation clamps to the storage type's code range;
// NaN inputs land on the zero point.
//
// Both functions are pure and branch-light. They never fail.

use quoll_core::{Error, QuantElem, Result};

/// Quantize one value to a code of type `T`, saturating at the type bounds.
///
/// ```
/// use quoll::quantize::quantize;
///
/// assert_eq!(quantize::<u8>(1.26, 10.0, 100), 113);
/// assert_eq!(quantize::<u8>(1e9, 1.0, 0), 255);
/// assert_eq!(quantize::<i8>(-1e9, 1.0, 0), -128);
/// ```
#[inline]
pub fn quantize<T: QuantElem>(value: f32, inv_scale: f32, zero_point: i64) -> T {
    // `as i64` saturates at the i64 bounds and maps NaN to 0.
    let rounded = (value * inv_scale).round_ties_even() as i64;
    T::saturating_from_i64(rounded.saturating_add(zero_point))
}

/// Recover the real value represented by `code`.
#[inline]
pub fn dequantize<T: QuantElem>(code: T, scale: f32, zero_point: i64) -> f32 {
    code.to_i64().saturating_sub(zero_point) as f32 * scale
}

/// Quantize `values` into `out` element by element.
///
/// `out` is left untouched when the lengths differ.
pub fn quantize_slice<T: QuantElem>(
    values: &[f32],
    out: &mut [T],
    scale: f32,
    zero_point: i64,
) -> Result<()> {
    if values.len() != out.len() {
        return Err(Error::invalid_shape(format!(
            "quantize_slice: {} values for {} output codes",
            values.len(),
            out.len()
        )));
    }
    let inv_scale = scale.recip();
    for (dst, &v) in out.iter_mut().zip(values) {
        *dst = quantize(v, inv_scale, zero_point);
    }
    Ok(())
}

/// Dequantize a slice of codes into a new float vector.
pub fn dequantize_slice<T: QuantElem>(codes: &[T], scale: f32, zero_point: i64) -> Vec<f32> {
    codes
        .iter()
        .map(|&c| dequantize(c, scale, zero_point))
        .collect()
}
