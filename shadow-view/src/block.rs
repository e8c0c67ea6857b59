//! Shaped result of a view read.

/// Values in row-major order together with their shape.
///
/// A scalar item read of one-element items has an empty shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<E> {
    pub shape: Vec<usize>,
    pub values: Vec<E>,
}

impl<E: Copy> Block<E> {
    pub fn new(shape: Vec<usize>, values: Vec<E>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), values.len());
        Self { shape, values }
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The single value of a zero-dimensional block.
    pub fn scalar(&self) -> Option<E> {
        if self.shape.is_empty() {
            self.values.first().copied()
        } else {
            None
        }
    }

    /// Values of the `i`-th entry along the first axis.
    pub fn row(&self, i: usize) -> Option<&[E]> {
        let first = *self.shape.first()?;
        if i >= first {
            return None;
        }
        let width: usize = self.shape[1..].iter().product();
        Some(&self.values[i * width..(i + 1) * width])
    }

    pub fn into_values(self) -> Vec<E> {
        self.values
    }
}
