//! Shape and index utilities.
//!
//! Shapes are row-major (C-contiguous) tuples of dimension lengths.
//! A rank 0 (scalar) shape is the empty slice and has one element.

use thiserror::Error;

/// The shape of a dataspace, selection or buffer.
pub type ArrayShape = Vec<u64>;

/// The indices of an element.
pub type ArrayIndices = Vec<u64>;

/// Return the number of elements in an array with `shape`.
///
/// The product of an empty shape is 1.
#[must_use]
pub fn product(shape: &[u64]) -> u64 {
    shape.iter().product()
}

/// A broadcasting error.
///
/// Holds the source shape and the shape it could not be broadcast to.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("cannot broadcast shape {0:?} to {1:?}")]
pub struct IncompatibleBroadcastError(ArrayShape, ArrayShape);

impl IncompatibleBroadcastError {
    /// Create a new incompatible broadcast error.
    #[must_use]
    pub fn new(source_shape: ArrayShape, target_shape: ArrayShape) -> Self {
        Self(source_shape, target_shape)
    }

    /// The shape that was being broadcast.
    #[must_use]
    pub fn source_shape(&self) -> &[u64] {
        &self.0
    }

    /// The shape that was being broadcast to.
    #[must_use]
    pub fn target_shape(&self) -> &[u64] {
        &self.1
    }
}

/// Resolve the shape of broadcasting `a` against `b`.
///
/// Axes are aligned from the right. A pair of axis lengths is compatible if they are equal or if either is 1.
/// Missing leading axes are treated as length 1.
///
/// # Errors
/// Returns [`IncompatibleBroadcastError`] if any aligned axis pair is incompatible.
pub fn broadcast_shapes(a: &[u64], b: &[u64]) -> Result<ArrayShape, IncompatibleBroadcastError> {
    let rank = a.len().max(b.len());
    let mut shape = vec![0; rank];
    for (i, dim) in shape.iter_mut().rev().enumerate() {
        let da = a.len().checked_sub(i + 1).map_or(1, |j| a[j]);
        let db = b.len().checked_sub(i + 1).map_or(1, |j| b[j]);
        *dim = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(IncompatibleBroadcastError::new(a.to_vec(), b.to_vec()));
        };
    }
    Ok(shape)
}

/// Normalise a possibly negative `index` against an axis of `length`.
///
/// Negative indices count back from the end of the axis.
/// Returns [`None`] if `index` is outside of `[-length, length)`.
#[must_use]
pub fn normalize_index(index: i64, length: u64) -> Option<u64> {
    let length = i128::from(length);
    let index = i128::from(index);
    let index = if index < 0 { index + length } else { index };
    if (0..length).contains(&index) {
        u64::try_from(index).ok()
    } else {
        None
    }
}

/// Unravel a linearised index to ND indices.
///
/// Every element of `shape` must be non-zero.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        *indices_i = index % dim;
        index /= dim;
    }
    indices
}

/// Ravel ND indices to a linearised index.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape).rev() {
        index += i * count;
        count *= s;
    }
    index
}
