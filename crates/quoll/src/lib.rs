//! # quoll
//!
//! Quantized layer normalization that keeps tensors in integer form.
//!
//! The kernels read per-tensor quantized codes, compute each row's mean and
//! variance from integer sums with zero-point compensation, and write
//! requantized codes into a caller-provided output tensor.
//!
//! ## Usage
//!
//! ```rust
//! use quoll::prelude::*;
//!
//! let input = QTensor::from_vec(vec![10u8, 10, 10, 10], (1, 4))?;
//! let mut out = QTensor::zeros((1, 4), DType::U8);
//! quantized_layer_norm_per_tensor_out(
//!     &input, 1.0, 10, &[4], &[1.0; 4], &[0.0; 4], 1e-5, 1.0, 0, &mut out,
//! )?;
//! assert_eq!(out.as_slice::<u8>()?, &[0, 0, 0, 0]);
//! # Ok::<(), quoll::Error>(())
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | `quoll-core` | QTensor, Shape, DType, QuantElem, Scalar, Error |
//! | `quoll` | Codec, quantization params, dtype dispatch, layer norm kernels |
//!
//! ## Modules
//!
//! - [`quantize`] — saturating quantize / dequantize primitives
//! - [`qparams`] — per-tensor scale / zero-point resolution
//! - [`dispatch`] — DType → code type dispatch for the kernels
//! - [`layer_norm`] — the quantized layer norm kernels
//! - [`config`] — kernel configuration (parallelism, safety checks)

/// Re-export core types.
pub use quoll_core::{
    bail, DType, Error, QTensor, QuantElem, Result, Scalar, ScalarKind, ScalarTarget, Shape,
    Storage, TensorElem,
};

pub mod config;
pub mod dispatch;
pub mod layer_norm;
pub mod qparams;
pub mod quantize;

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::config::LayerNormConfig;
    pub use crate::layer_norm::{
        quantized_layer_norm_out, quantized_layer_norm_out_with_config,
        quantized_layer_norm_per_tensor_out, quantized_layer_norm_per_tensor_out_with_config,
        QuantizedLayerNorm, RowStats,
    };
    pub use crate::qparams::QuantParams;
    pub use crate::quantize::{dequantize, quantize};
    pub use crate::{DType, QTensor, QuantElem, Scalar, Shape};
}
