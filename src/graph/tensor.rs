//! Dense `f32` tensors backed by `ndarray`

use ndarray::{Array2, ArrayD, ArrayView2, ArrayViewMutD, Ix2, IxDyn};
use rand::Rng;

use crate::{Error, Result};

/// Dense tensor of `f32` values.
///
/// Boolean and index results are stored as `f32` too (`1.0`/`0.0`, and
/// integral class indices); the node's [`super::DType`] records the meaning.
/// The backing array is always in standard (row-major) layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    array: ArrayD<f32>,
}

impl Tensor {
    /// Create a tensor, checking that `data` fills `shape` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the element count does not match.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::InvalidInput(format!(
                "shape {shape:?} needs {expected} values, got {}",
                data.len()
            )));
        }
        ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map(Self::from_array)
            .map_err(|e| Error::InvalidInput(e.to_string()))
    }

    /// Wrap an existing array.
    #[must_use]
    pub fn from_array(array: ArrayD<f32>) -> Self {
        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        Self { array }
    }

    /// Rank-0 tensor holding `value`.
    #[must_use]
    pub fn scalar(value: f32) -> Self {
        Self::full(&[], value)
    }

    /// Tensor of `shape` filled with `value`.
    #[must_use]
    pub fn full(shape: &[usize], value: f32) -> Self {
        Self {
            array: ArrayD::from_elem(IxDyn(shape), value),
        }
    }

    /// Tensor of `shape` filled with zeros.
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, 0.0)
    }

    /// Rank-1 tensor from a slice.
    #[must_use]
    pub fn vector(values: &[f32]) -> Self {
        Self {
            array: ndarray::Array1::from(values.to_vec()).into_dyn(),
        }
    }

    /// Rank-2 tensor from equally sized rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the rows are ragged.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(Error::InvalidInput(format!(
                    "row {i} has {} values, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::new(vec![rows.len(), cols], data)
    }

    /// One-hot rows for `labels` over `classes` classes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a label is not below `classes`.
    pub fn one_hot(labels: &[usize], classes: usize) -> Result<Self> {
        let mut array = Array2::zeros((labels.len(), classes));
        for (row, &label) in labels.iter().enumerate() {
            if label >= classes {
                return Err(Error::InvalidInput(format!(
                    "label {label} out of range for {classes} classes"
                )));
            }
            array[(row, label)] = 1.0;
        }
        Ok(Self {
            array: array.into_dyn(),
        })
    }

    /// Tensor of `shape` with values drawn uniformly from `[low, high)`.
    #[must_use]
    pub fn random_uniform(shape: &[usize], low: f32, high: f32, rng: &mut impl Rng) -> Self {
        Self {
            array: ArrayD::from_shape_fn(IxDyn(shape), |_| rng.gen_range(low..high)),
        }
    }

    /// The backing array.
    #[must_use]
    pub const fn array(&self) -> &ArrayD<f32> {
        &self.array
    }

    pub(crate) fn array_mut(&mut self) -> ArrayViewMutD<'_, f32> {
        self.array.view_mut()
    }

    /// Consume the tensor, returning the backing array.
    #[must_use]
    pub fn into_array(self) -> ArrayD<f32> {
        self.array
    }

    /// Concrete dimensions.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.array.shape()
    }

    /// Elements in row-major order.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        self.array.as_slice().unwrap_or_default()
    }

    /// Number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.array.ndim()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    /// Whether the tensor has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// The single value of a one-element tensor.
    #[must_use]
    pub fn as_scalar(&self) -> Option<f32> {
        match self.data() {
            [value] => Some(*value),
            _ => None,
        }
    }

    /// View of a rank-2 tensor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] for any other rank.
    pub fn as_matrix(&self, op: &str) -> Result<ArrayView2<'_, f32>> {
        self.array
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| Error::shape_mismatch(op, "rank 2", format!("{:?}", self.shape())))
    }

    /// `(rows, cols)` of a rank-2 tensor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] for any other rank.
    pub fn matrix_dims(&self, op: &str) -> Result<(usize, usize)> {
        self.as_matrix(op).map(|m| m.dim())
    }

    /// Row `i` of a rank-2 tensor.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        let (rows, cols) = self.matrix_dims("row").ok()?;
        if i >= rows {
            return None;
        }
        self.data().get(i * cols..(i + 1) * cols)
    }
}

impl From<ArrayD<f32>> for Tensor {
    fn from(array: ArrayD<f32>) -> Self {
        Self::from_array(array)
    }
}
