use crate::dtype::{DType, QuantElem};
use crate::error::{Error, Result};
use crate::shape::Shape;

// QTensor — owned, contiguous, dtype-tagged tensor
//
// Kernels in quoll operate on caller-owned buffers: they read from a
// `&QTensor` and write into a preallocated `&mut QTensor`. Storage is a
// tagged enum with one variant per DType, so the runtime tag and the Rust
// element type can never disagree.
//
// Layout is always row-major with no offset or strides. The trailing
// dimension is contiguous, which is what row-wise kernels rely on.

/// Flat element buffer, tagged by element type.
#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    U8(Vec<u8>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F16(Vec<half::f16>),
    BF16(Vec<half::bf16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! storage_map {
    ($storage:expr, $v:ident => $body:expr) => {
        match $storage {
            Storage::U8($v) => $body,
            Storage::I8($v) => $body,
            Storage::I16($v) => $body,
            Storage::U16($v) => $body,
            Storage::I32($v) => $body,
            Storage::I64($v) => $body,
            Storage::F16($v) => $body,
            Storage::BF16($v) => $body,
            Storage::F32($v) => $body,
            Storage::F64($v) => $body,
        }
    };
}

impl Storage {
    pub fn dtype(&self) -> DType {
        match self {
            Storage::U8(_) => DType::U8,
            Storage::I8(_) => DType::I8,
            Storage::I16(_) => DType::I16,
            Storage::U16(_) => DType::U16,
            Storage::I32(_) => DType::I32,
            Storage::I64(_) => DType::I64,
            Storage::F16(_) => DType::F16,
            Storage::BF16(_) => DType::BF16,
            Storage::F32(_) => DType::F32,
            Storage::F64(_) => DType::F64,
        }
    }

    pub(crate) fn len(&self) -> usize {
        storage_map!(self, v => v.len())
    }

    /// Zero-filled storage of `len` elements.
    pub fn zeros(dtype: DType, len: usize) -> Self {
        match dtype {
            DType::U8 => Storage::U8(vec![0; len]),
            DType::I8 => Storage::I8(vec![0; len]),
            DType::I16 => Storage::I16(vec![0; len]),
            DType::U16 => Storage::U16(vec![0; len]),
            DType::I32 => Storage::I32(vec![0; len]),
            DType::I64 => Storage::I64(vec![0; len]),
            DType::F16 => Storage::F16(vec![half::f16::ZERO; len]),
            DType::BF16 => Storage::BF16(vec![half::bf16::ZERO; len]),
            DType::F32 => Storage::F32(vec![0.0; len]),
            DType::F64 => Storage::F64(vec![0.0; len]),
        }
    }
}

/// Element types that can be stored in a [`QTensor`].
///
/// Connects a Rust type to its [`Storage`] variant for typed access.
pub trait TensorElem: Copy + Send + Sync + 'static {
    const DTYPE: DType;

    fn wrap(data: Vec<Self>) -> Storage;
    fn view(storage: &Storage) -> Option<&[Self]>;
    fn view_mut(storage: &mut Storage) -> Option<&mut [Self]>;
}

macro_rules! impl_tensor_elem {
    ($t:ty, $variant:ident) => {
        impl TensorElem for $t {
            const DTYPE: DType = DType::$variant;

            fn wrap(data: Vec<Self>) -> Storage {
                Storage::$variant(data)
            }

            fn view(storage: &Storage) -> Option<&[Self]> {
                match storage {
                    Storage::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            fn view_mut(storage: &mut Storage) -> Option<&mut [Self]> {
                match storage {
                    Storage::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_tensor_elem!(u8, U8);
impl_tensor_elem!(i8, I8);
impl_tensor_elem!(i16, I16);
impl_tensor_elem!(u16, U16);
impl_tensor_elem!(i32, I32);
impl_tensor_elem!(i64, I64);
impl_tensor_elem!(half::f16, F16);
impl_tensor_elem!(half::bf16, BF16);
impl_tensor_elem!(f32, F32);
impl_tensor_elem!(f64, F64);

/// A contiguous n-dimensional tensor of a single element type.
///
/// # Example
/// ```
/// use quoll_core::{DType, QTensor};
///
/// let t = QTensor::from_vec(vec![1u8, 2, 3, 4, 5, 6], (2, 3))?;
/// assert_eq!(t.dtype(), DType::U8);
/// assert_eq!(t.dims(), &[2, 3]);
/// # Ok::<(), quoll_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QTensor {
    shape: Shape,
    storage: Storage,
}

impl QTensor {
    /// Wrap existing storage, checking its length against `shape`.
    pub fn new(storage: Storage, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.elem_count();
        if storage.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: storage.len(),
            });
        }
        Ok(QTensor { shape, storage })
    }

    pub fn from_vec<T: TensorElem>(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        Self::new(T::wrap(data), shape)
    }

    /// A single-element tensor with shape [1].
    pub fn scalar<T: TensorElem>(value: T) -> Self {
        QTensor {
            shape: Shape::from(1),
            storage: T::wrap(vec![value]),
        }
    }

    /// Zero-filled tensor; the usual way to preallocate a kernel output.
    pub fn zeros(shape: impl Into<Shape>, dtype: DType) -> Self {
        let shape = shape.into();
        let storage = Storage::zeros(dtype, shape.elem_count());
        QTensor { shape, storage }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Typed read access. Fails if `T` does not match the stored dtype.
    pub fn as_slice<T: TensorElem>(&self) -> Result<&[T]> {
        T::view(&self.storage).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got: self.storage.dtype(),
        })
    }

    /// Typed write access. Fails if `T` does not match the stored dtype.
    pub fn as_mut_slice<T: TensorElem>(&mut self) -> Result<&mut [T]> {
        let got = self.storage.dtype();
        T::view_mut(&mut self.storage).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got,
        })
    }

    /// Copy all elements out as f64 (for inspection and tests).
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match &self.storage {
            Storage::U8(v) => v.iter().map(|&x| x as f64).collect(),
            Storage::I8(v) => v.iter().map(|&x| x as f64).collect(),
            Storage::I16(v) => v.iter().map(|&x| x as f64).collect(),
            Storage::U16(v) => v.iter().map(|&x| x as f64).collect(),
            Storage::I32(v) => v.iter().map(|&x| x as f64).collect(),
            Storage::I64(v) => v.iter().map(|&x| x as f64).collect(),
            Storage::F16(v) => v.iter().map(|x| x.to_f64()).collect(),
            Storage::BF16(v) => v.iter().map(|x| x.to_f64()).collect(),
            Storage::F32(v) => v.iter().map(|&x| x as f64).collect(),
            Storage::F64(v) => v.clone(),
        }
    }

    /// Copy quantized codes out widened to i64.
    pub fn to_i64_vec(&self) -> Result<Vec<i64>> {
        fn widen<T: QuantElem>(v: &[T]) -> Vec<i64> {
            v.iter().map(|&x| x.to_i64()).collect()
        }
        match &self.storage {
            Storage::U8(v) => Ok(widen(v)),
            Storage::I8(v) => Ok(widen(v)),
            Storage::I16(v) => Ok(widen(v)),
            Storage::U16(v) => Ok(widen(v)),
            Storage::I32(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            Storage::I64(v) => Ok(v.clone()),
            other => Err(Error::msg(format!(
                "cannot read {} tensor as integer codes",
                other.dtype()
            ))),
        }
    }
}
