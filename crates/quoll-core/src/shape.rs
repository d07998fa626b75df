use std::fmt;

// Shape — N-dimensional shape representation
//
// Tensors in quoll are always row-major and contiguous, so the shape alone
// determines the memory layout. Row-wise kernels view a tensor as
//
//   [d0, d1, ..., dk]  →  leading_count = d0 * ... * d(k-1) rows
//                         of row_length = dk elements each
//
// A scalar shape [] has one element and no trailing dimension.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Total number of elements. A scalar shape [] has 1 element; any zero
    /// dimension makes the count 0.
    pub fn elem_count(&self) -> usize {
        self.0.iter().product::<usize>()
    }

    /// Size of the trailing dimension, or `None` for a scalar.
    pub fn last_dim(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Product of every dimension except the trailing one.
    ///
    /// For [2, 3, 4] this is 6: the number of length-4 rows.
    pub fn leading_count(&self) -> usize {
        match self.0.split_last() {
            Some((_, leading)) => leading.iter().product(),
            None => 1,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

// These let you write: QTensor::zeros((3, 4), dtype)

impl From<()> for Shape {
    fn from(_: ()) -> Self {
        Shape(vec![])
    }
}

impl From<usize> for Shape {
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((d0, d1, d2): (usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::from(());
        assert!(s.dims().is_empty());
        assert_eq!(s.elem_count(), 1);
        assert_eq!(s.last_dim(), None);
        assert_eq!(s.leading_count(), 1);
    }

    #[test]
    fn test_rows_of_3d_shape() {
        let s = Shape::from((2, 3, 4));
        assert_eq!(s.elem_count(), 24);
        assert_eq!(s.last_dim(), Some(4));
        assert_eq!(s.leading_count(), 6);
    }

    #[test]
    fn test_vector_is_single_row() {
        let s = Shape::from(5);
        assert_eq!(s.leading_count(), 1);
        assert_eq!(s.last_dim(), Some(5));
    }

    #[test]
    fn test_zero_sized_dim() {
        let s = Shape::from((0, 8));
        assert_eq!(s.elem_count(), 0);
        assert_eq!(s.leading_count(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Shape::from((3, 4))), "[3, 4]");
    }
}
