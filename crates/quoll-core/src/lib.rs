//! # quoll-core
//!
//! Data model shared by the quoll kernels.
//!
//! This crate provides:
//! - [`QTensor`] — contiguous, dtype-tagged tensor over caller-owned storage
//! - [`Shape`] — dimension sizes plus the row view used by row-wise kernels
//! - [`DType`] / [`QuantElem`] — runtime dtype tags and the integer code trait
//! - [`Scalar`] — boxed host numbers with range-checked native conversion
//! - [`Error`] — the single error type for every quoll crate

pub mod dtype;
pub mod error;
pub mod scalar;
pub mod shape;
pub mod tensor;

pub use dtype::{DType, QuantElem};
pub use error::{Error, Result};
pub use scalar::{Scalar, ScalarKind, ScalarTarget};
pub use shape::Shape;
pub use tensor::{QTensor, Storage, TensorElem};
