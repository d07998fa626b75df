// Integration tests for the quantization codec and parameter resolution

use quoll::prelude::*;
use quoll::quantize::{dequantize_slice, quantize_slice};
use quoll::{Error, ScalarKind};

fn round_trip_all_codes<T: QuantElem>(scale: f32, zero_point: i64) {
    let inv_scale = scale.recip();
    for raw in T::MIN..=T::MAX {
        let code = T::saturating_from_i64(raw);
        let value = dequantize(code, scale, zero_point);
        let back: T = quantize(value, inv_scale, zero_point);
        assert_eq!(
            back, code,
            "scale {} zp {}: code {} → {} → {:?}",
            scale, zero_point, raw, value, back
        );
    }
}

#[test]
fn test_every_code_survives_a_round_trip() {
    for scale in [0.5f32, 0.02] {
        round_trip_all_codes::<u8>(scale, 0);
        round_trip_all_codes::<u8>(scale, 131);
        round_trip_all_codes::<i8>(scale, 0);
        round_trip_all_codes::<i8>(scale, -40);
        round_trip_all_codes::<i16>(scale, 0);
        round_trip_all_codes::<i16>(scale, 9000);
        round_trip_all_codes::<u16>(scale, 0);
        round_trip_all_codes::<u16>(scale, 32768);
    }
}

#[test]
fn test_quantize_is_monotonic() {
    let mut prev = i8::MIN;
    let mut v = -10.0f32;
    while v <= 10.0 {
        let q: i8 = quantize(v, 20.0, 3);
        assert!(q >= prev, "{} quantized to {} after {}", v, q, prev);
        prev = q;
        v += 0.013;
    }
    assert_eq!(prev, i8::MAX);
}

#[test]
fn test_slice_helpers() -> quoll::Result<()> {
    let values = [-1.0f32, -0.25, 0.0, 0.26, 1.0];
    let mut codes = [0u8; 5];
    quantize_slice(&values, &mut codes, 0.25, 8)?;
    assert_eq!(codes, [4, 7, 8, 9, 12]);
    assert_eq!(
        dequantize_slice(&codes, 0.25, 8),
        vec![-1.0, -0.25, 0.0, 0.25, 1.0]
    );

    let err = quantize_slice(&values, &mut codes[..4], 0.25, 8).unwrap_err();
    assert!(matches!(err, Error::InvalidShape(_)));
    Ok(())
}

#[test]
fn test_params_from_tensors_and_scalars_agree() -> quoll::Result<()> {
    let from_tensors = QuantParams::from_tensors(&QTensor::scalar(0.125f64), &QTensor::scalar(5i32))?;
    let from_scalars = QuantParams::from_scalars(
        Scalar::from_encoded('F', 0.125)?,
        Scalar::from_encoded('i', 5.0)?,
    )?;
    assert_eq!(from_tensors, from_scalars);
    assert_eq!(from_scalars.inv_scale(), 8.0);
    Ok(())
}

#[test]
fn test_scalar_encodings() -> quoll::Result<()> {
    assert_eq!(ScalarKind::from_encoding('c')?, ScalarKind::Byte);
    assert_eq!(ScalarKind::from_encoding('S')?, ScalarKind::Short);
    assert_eq!(ScalarKind::from_encoding('B')?, ScalarKind::Bool);
    assert_eq!(ScalarKind::from_encoding('Q')?, ScalarKind::Long);
    assert!(matches!(
        ScalarKind::from_encoding('z'),
        Err(Error::UnsupportedScalarType('z'))
    ));

    // A floating scalar never narrows to an integral zero point.
    let err = QuantParams::from_scalars(Scalar::Float(1.0), Scalar::Float(2.0)).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidQuantizationParams {
            field: "zero_point",
            ..
        }
    ));
    Ok(())
}
