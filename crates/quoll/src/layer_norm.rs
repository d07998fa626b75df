// Quantized LayerNorm — layer normalization over integer-coded tensors
//
// Normalizes every row (the trailing dimension) of a per-tensor quantized
// tensor and requantizes the result:
//
//   y = quantize_out((dequantize_in(x) - mean) / sqrt(var + ε) * γ + β)
//
// The statistics never dequantize the row. With codes x_j, input scale s,
// zero point z and row length n, the kernel accumulates two integer sums
//
//   S     = Σ x_j
//   SQraw = Σ x_j²
//
// in i64 and applies the zero-point compensation algebraically:
//
//   Σ (x_j - z)  = S - n·z
//   Σ (x_j - z)² = SQraw - 2·z·S + n·z²
//
// so that, in f32,
//
//   mean = s · (S - n·z) / n
//   var  = (SQ · s²) / n - mean²
//
// This is exact up to the final float conversion. The operation order above
// matches the fixed-point reference kernels bit for bit, so do not "simplify"
// it. Only the per-element affine step dequantizes.
//
// ACCUMULATOR BOUND:
//
// The largest intermediate is bounded by 4·n·max|code|², so a row is
// accepted only when n ≤ i64::MAX / (4·max|code|²):
//
//   u8 / i8   → ~3.5e13 elements
//   i16 / u16 → ~5.4e8 elements
//
// NEGATIVE VARIANCE:
//
// E[x²] - mean² can come out slightly negative on near-constant rows because
// of f32 cancellation. The variance is clamped to 0 before ε is added, so a
// zero ε can still only produce an infinite inv_std on an exactly constant
// row.
//
// SHAPES:
//   input:  [*, D]   (quantized codes: u8, i8, i16, u16)
//   γ, β:   [D]      (f32)
//   output: [*, D]   same dtype as input, preallocated by the caller

use rayon::prelude::*;

use quoll_core::{bail, DType, Error, QTensor, QuantElem, Result};

use crate::config::LayerNormConfig;
use crate::dispatch_quantized;
use crate::qparams::QuantParams;
use crate::quantize::{dequantize, quantize};

const OP: &str = "quantized_layer_norm";

/// Mean, variance and inverse standard deviation of one row, in real units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowStats {
    pub mean: f32,
    /// Variance after clamping to be non-negative.
    pub variance: f32,
    pub inv_std: f32,
}

/// Largest row length whose sums cannot overflow the i64 accumulator.
///
/// Returns `None` for dtypes that are not quantized code types.
pub fn max_row_length(dtype: DType) -> Option<usize> {
    fn bound<T: QuantElem>() -> usize {
        let max_abs = T::max_abs() as u128;
        let n = (i64::MAX as u128) / (4 * max_abs * max_abs);
        n.min(usize::MAX as u128) as usize
    }

    if !crate::dispatch::is_supported(dtype) {
        return None;
    }
    let n: Result<usize> = dispatch_quantized!(dtype, T => { Ok(bound::<T>()) }, OP);
    n.ok()
}

/// Compute the statistics of a row of codes quantized with `params`.
///
/// The zero point must lie in `T`'s code range and the row must respect
/// [`max_row_length`]. An empty row has zero mean and variance.
pub fn row_stats<T: QuantElem>(row: &[T], params: &QuantParams, eps: f32) -> RowStats {
    let n = row.len() as i64;
    if n == 0 {
        return RowStats {
            mean: 0.0,
            variance: 0.0,
            inv_std: (eps).sqrt().recip(),
        };
    }
    let z = params.zero_point;

    let mut sum: i64 = 0;
    let mut sq_sum: i64 = n * z * z;
    for &x in row {
        let v = x.to_i64();
        sum += v;
        sq_sum += v * v;
    }
    sq_sum -= 2 * sum * z;
    sum -= n * z;

    let scale = params.scale_f32();
    let len = n as f32;
    let mean = (scale * sum as f32) / len;
    let raw_variance = (sq_sum as f32 * (scale * scale)) / len - mean * mean;
    let variance = if raw_variance < 0.0 {
        log::debug!(
            "{}: clamping negative variance {} to 0 (mean {})",
            OP,
            raw_variance,
            mean
        );
        0.0
    } else {
        raw_variance
    };
    let inv_std = (variance + eps).sqrt().recip();

    RowStats {
        mean,
        variance,
        inv_std,
    }
}

/// Everything one row needs, resolved once per call.
struct RowKernel<'a> {
    input: QuantParams,
    in_scale: f32,
    out_inv_scale: f32,
    out_zero_point: i64,
    weight: &'a [f32],
    bias: &'a [f32],
    eps: f32,
}

impl RowKernel<'_> {
    fn run<T: QuantElem>(&self, x: &[T], y: &mut [T]) {
        let stats = row_stats(x, &self.input, self.eps);
        log::trace!(
            "{}: row mean={} var={} inv_std={}",
            OP,
            stats.mean,
            stats.variance,
            stats.inv_std
        );

        let z = self.input.zero_point;
        for (((dst, &code), &w), &b) in y.iter_mut().zip(x).zip(self.weight).zip(self.bias) {
            let val = dequantize(code, self.in_scale, z);
            let val = (val - stats.mean) * stats.inv_std * w + b;
            *dst = quantize(val, self.out_inv_scale, self.out_zero_point);
        }
    }
}

fn layer_norm_rows<T: QuantElem>(
    input: &[T],
    output: &mut [T],
    row_length: usize,
    kernel: &RowKernel<'_>,
    config: &LayerNormConfig,
    parallel: bool,
) {
    if parallel {
        output
            .par_chunks_mut(row_length)
            .zip(input.par_chunks(row_length))
            .with_min_len(config.min_rows_per_task)
            .for_each(|(y, x)| kernel.run(x, y));
    } else {
        for (y, x) in output.chunks_mut(row_length).zip(input.chunks(row_length)) {
            kernel.run(x, y);
        }
    }
}

/// Unsupported code types abort before any other argument is looked at.
fn ensure_supported(dtype: DType) -> Result<()> {
    if crate::dispatch::is_supported(dtype) {
        Ok(())
    } else {
        Err(crate::dispatch::unsupported(dtype, OP))
    }
}

/// Validate every argument, then normalize `input` into `out`.
///
/// Nothing is written to `out` unless all checks pass.
#[allow(clippy::too_many_arguments)]
fn layer_norm_impl(
    input: &QTensor,
    in_params: QuantParams,
    normalized_shape: &[usize],
    weight: &[f32],
    bias: &[f32],
    eps: f64,
    out_params: QuantParams,
    out: &mut QTensor,
    config: &LayerNormConfig,
) -> Result<()> {
    let dtype = input.dtype();
    ensure_supported(dtype)?;

    let row_length = input.shape().last_dim().ok_or_else(|| {
        Error::invalid_shape(format!("{}: input must have at least 1 dimension", OP))
    })?;
    if normalized_shape != [row_length].as_slice() {
        return Err(Error::invalid_shape(format!(
            "{}: normalized_shape {:?} must equal the trailing dimension [{}] of input {}",
            OP,
            normalized_shape,
            row_length,
            input.shape()
        )));
    }
    if weight.len() != row_length {
        return Err(Error::invalid_shape(format!(
            "{}: weight has {} elements, expected {}",
            OP,
            weight.len(),
            row_length
        )));
    }
    if bias.len() != row_length {
        return Err(Error::invalid_shape(format!(
            "{}: bias has {} elements, expected {}",
            OP,
            bias.len(),
            row_length
        )));
    }
    if out.shape() != input.shape() {
        return Err(Error::ShapeMismatch {
            expected: input.shape().clone(),
            got: out.shape().clone(),
        });
    }
    if out.dtype() != dtype {
        return Err(Error::DTypeMismatch {
            expected: dtype,
            got: out.dtype(),
        });
    }
    in_params.validate_for(dtype, "in_zero_point")?;
    out_params.validate_for(dtype, "output_zero_point")?;
    if !eps.is_finite() || eps < 0.0 {
        bail!("{}: eps must be finite and >= 0, got {}", OP, eps);
    }
    if config.check_row_length {
        if let Some(max) = max_row_length(dtype) {
            if row_length > max {
                return Err(Error::invalid_shape(format!(
                    "{}: row length {} exceeds the {} accumulator limit of {}",
                    OP, row_length, dtype, max
                )));
            }
        }
    }

    let rows = input.shape().leading_count();
    if input.elem_count() == 0 {
        return Ok(());
    }
    let parallel = config.use_parallel(rows);
    log::debug!(
        "{}: dtype={} rows={} row_length={} parallel={}",
        OP,
        dtype,
        rows,
        row_length,
        parallel
    );

    let kernel = RowKernel {
        input: in_params,
        in_scale: in_params.scale_f32(),
        out_inv_scale: out_params.inv_scale(),
        out_zero_point: out_params.zero_point,
        weight,
        bias,
        eps: eps as f32,
    };

    dispatch_quantized!(dtype, T => {
        let x = input.as_slice::<T>()?;
        let y = out.as_mut_slice::<T>()?;
        layer_norm_rows::<T>(x, y, row_length, &kernel, config, parallel);
        Ok(())
    }, OP)
}

/// Quantized layer norm with input parameters stored in single-element
/// tensors.
///
/// `in_scale` must hold one f32/f64 and `in_zero_point` one i64/i32;
/// anything else is `Error::InvalidQuantizationParams`. `normalized_shape`
/// must be exactly `[input.dims()[-1]]`.
#[allow(clippy::too_many_arguments)]
pub fn quantized_layer_norm_out(
    input: &QTensor,
    in_scale: &QTensor,
    in_zero_point: &QTensor,
    normalized_shape: &[usize],
    weight: &[f32],
    bias: &[f32],
    eps: f64,
    output_scale: f64,
    output_zero_point: i64,
    out: &mut QTensor,
) -> Result<()> {
    quantized_layer_norm_out_with_config(
        input,
        in_scale,
        in_zero_point,
        normalized_shape,
        weight,
        bias,
        eps,
        output_scale,
        output_zero_point,
        out,
        &LayerNormConfig::default(),
    )
}

/// [`quantized_layer_norm_out`] with an explicit [`LayerNormConfig`].
#[allow(clippy::too_many_arguments)]
pub fn quantized_layer_norm_out_with_config(
    input: &QTensor,
    in_scale: &QTensor,
    in_zero_point: &QTensor,
    normalized_shape: &[usize],
    weight: &[f32],
    bias: &[f32],
    eps: f64,
    output_scale: f64,
    output_zero_point: i64,
    out: &mut QTensor,
    config: &LayerNormConfig,
) -> Result<()> {
    ensure_supported(input.dtype())?;
    let in_params = QuantParams::from_named_tensors(
        in_scale,
        in_zero_point,
        ("in_scale", "in_zero_point"),
    )?;
    let out_params = QuantParams::named(output_scale, output_zero_point, "output_scale")?;
    layer_norm_impl(
        input,
        in_params,
        normalized_shape,
        weight,
        bias,
        eps,
        out_params,
        out,
        config,
    )
}

/// Quantized layer norm with literal per-tensor input parameters.
#[allow(clippy::too_many_arguments)]
pub fn quantized_layer_norm_per_tensor_out(
    input: &QTensor,
    in_scale: f64,
    in_zero_point: i64,
    normalized_shape: &[usize],
    weight: &[f32],
    bias: &[f32],
    eps: f64,
    output_scale: f64,
    output_zero_point: i64,
    out: &mut QTensor,
) -> Result<()> {
    quantized_layer_norm_per_tensor_out_with_config(
        input,
        in_scale,
        in_zero_point,
        normalized_shape,
        weight,
        bias,
        eps,
        output_scale,
        output_zero_point,
        out,
        &LayerNormConfig::default(),
    )
}

/// [`quantized_layer_norm_per_tensor_out`] with an explicit
/// [`LayerNormConfig`].
#[allow(clippy::too_many_arguments)]
pub fn quantized_layer_norm_per_tensor_out_with_config(
    input: &QTensor,
    in_scale: f64,
    in_zero_point: i64,
    normalized_shape: &[usize],
    weight: &[f32],
    bias: &[f32],
    eps: f64,
    output_scale: f64,
    output_zero_point: i64,
    out: &mut QTensor,
    config: &LayerNormConfig,
) -> Result<()> {
    ensure_supported(input.dtype())?;
    let in_params = QuantParams::named(in_scale, in_zero_point, "in_scale")?;
    let out_params = QuantParams::named(output_scale, output_zero_point, "output_scale")?;
    layer_norm_impl(
        input,
        in_params,
        normalized_shape,
        weight,
        bias,
        eps,
        out_params,
        out,
        config,
    )
}

/// Quantized LayerNorm layer: owns γ, β, ε and the output quantization.
///
/// # Example
/// ```
/// use quoll::prelude::*;
///
/// let ln = QuantizedLayerNorm::new(vec![1.0; 4], vec![0.0; 4], 1e-5, QuantParams::new(0.05, 128)?)?;
/// let x = QTensor::from_vec(vec![10u8, 20, 30, 40, 7, 7, 7, 7], (2, 4))?;
/// let y = ln.forward(&x, &QuantParams::new(0.1, 0)?)?;
/// assert_eq!(y.dims(), &[2, 4]);
/// # Ok::<(), quoll::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct QuantizedLayerNorm {
    /// Scale parameter γ: [normalized_size]
    weight: Vec<f32>,
    /// Shift parameter β: [normalized_size]
    bias: Vec<f32>,
    eps: f64,
    output: QuantParams,
    config: LayerNormConfig,
}

impl QuantizedLayerNorm {
    pub fn new(weight: Vec<f32>, bias: Vec<f32>, eps: f64, output: QuantParams) -> Result<Self> {
        if weight.len() != bias.len() {
            return Err(Error::invalid_shape(format!(
                "QuantizedLayerNorm: weight has {} elements but bias has {}",
                weight.len(),
                bias.len()
            )));
        }
        if !eps.is_finite() || eps < 0.0 {
            bail!("QuantizedLayerNorm: eps must be finite and >= 0, got {}", eps);
        }
        Ok(Self {
            weight,
            bias,
            eps,
            output,
            config: LayerNormConfig::default(),
        })
    }

    /// γ = 1, β = 0: plain normalization.
    pub fn identity(normalized_size: usize, eps: f64, output: QuantParams) -> Result<Self> {
        Self::new(
            vec![1.0; normalized_size],
            vec![0.0; normalized_size],
            eps,
            output,
        )
    }

    pub fn with_config(mut self, config: LayerNormConfig) -> Self {
        self.config = config;
        self
    }

    pub fn normalized_size(&self) -> usize {
        self.weight.len()
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn weight(&self) -> &[f32] {
        &self.weight
    }

    pub fn bias(&self) -> &[f32] {
        &self.bias
    }

    pub fn output_params(&self) -> &QuantParams {
        &self.output
    }

    pub fn config(&self) -> &LayerNormConfig {
        &self.config
    }

    /// Normalize `input` into a freshly allocated tensor of the same shape
    /// and dtype.
    pub fn forward(&self, input: &QTensor, in_params: &QuantParams) -> Result<QTensor> {
        let mut out = QTensor::zeros(input.shape().clone(), input.dtype());
        self.forward_into(input, in_params, &mut out)?;
        Ok(out)
    }

    /// Normalize `input` into a caller-provided output tensor.
    pub fn forward_into(
        &self,
        input: &QTensor,
        in_params: &QuantParams,
        out: &mut QTensor,
    ) -> Result<()> {
        layer_norm_impl(
            input,
            *in_params,
            &[self.normalized_size()],
            &self.weight,
            &self.bias,
            self.eps,
            self.output,
            out,
            &self.config,
        )
    }
}
