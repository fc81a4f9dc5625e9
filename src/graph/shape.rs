//! Static shapes with unbounded dimensions

use std::fmt;

/// Static shape of a graph node.
///
/// Each dimension is either fixed (`Some(n)`) or unbounded (`None`), so a
/// batch of 784-wide rows is `[None, Some(784)]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<Option<usize>>);

impl Shape {
    /// Shape from explicit dimensions.
    #[must_use]
    pub const fn new(dims: Vec<Option<usize>>) -> Self {
        Self(dims)
    }

    /// Rank-0 shape.
    #[must_use]
    pub const fn scalar() -> Self {
        Self(Vec::new())
    }

    /// Fully known shape.
    #[must_use]
    pub fn known(dims: &[usize]) -> Self {
        Self(dims.iter().copied().map(Some).collect())
    }

    /// `[None, Some(cols)]`: an unbounded batch of fixed-width rows.
    #[must_use]
    pub fn batch_of(cols: usize) -> Self {
        Self(vec![None, Some(cols)])
    }

    /// Number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// All dimensions.
    #[must_use]
    pub fn dims(&self) -> &[Option<usize>] {
        &self.0
    }

    /// Size of dimension `axis`, `None` if unbounded or out of range.
    #[must_use]
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.0.get(axis).copied().flatten()
    }

    /// Whether a concrete tensor shape fits this static shape.
    #[must_use]
    pub fn accepts(&self, concrete: &[usize]) -> bool {
        self.rank() == concrete.len()
            && self
                .0
                .iter()
                .zip(concrete)
                .all(|(dim, &n)| dim.map_or(true, |d| d == n))
    }

    /// Unify two static shapes, keeping the more specific dimension.
    ///
    /// Returns `None` when ranks differ or fixed dimensions disagree.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Option<Self> {
        if self.rank() != other.rank() {
            return None;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| match (a, b) {
                (Some(x), Some(y)) if x != y => Err(()),
                (Some(x), _) | (None, Some(x)) => Ok(Some(*x)),
                (None, None) => Ok(None),
            })
            .collect::<Result<Vec<_>, ()>>()
            .ok()
            .map(Self)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, dim) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match dim {
                Some(n) => write!(f, "{n}")?,
                None => write!(f, "?")?,
            }
        }
        write!(f, "]")
    }
}
