//! Rectangular blocks of a dataspace.
//!
//! An [`ArraySubset`] is a start and a shape.
//! [`MemoryDataspace`](crate::dataspace::MemoryDataspace) holds a hyperslab selection as a set of disjoint array subsets
//! and combines selections with [`overlap`](ArraySubset::overlap) and [`difference`](ArraySubset::difference).

pub mod iterators;

use std::ops::Range;

use itertools::izip;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use iterators::Indices;

use crate::shape::{ArrayIndices, ArrayShape};

/// A rectangular block of a dataspace.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
pub struct ArraySubset {
    start: ArrayIndices,
    shape: ArrayShape,
}

impl ArraySubset {
    /// Create a block from a [`Range`] per axis.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        let start = ranges.iter().map(|range| range.start).collect();
        let shape = ranges
            .iter()
            .map(|range| range.end.saturating_sub(range.start))
            .collect();
        Self { start, shape }
    }

    /// Create a block of `shape` at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// The first index of the block.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// The number of elements along each axis.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Returns true if any axis has zero length.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&size| size == 0)
    }

    /// The rank of the block.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// The number of elements in the block.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Returns true if the block lies within a dataspace of `array_shape`.
    #[must_use]
    pub fn inbounds_shape(&self, array_shape: &[u64]) -> bool {
        if self.dimensionality() != array_shape.len() {
            return false;
        }
        izip!(self.start(), self.shape(), array_shape)
            .all(|(subset_start, subset_shape, shape)| subset_start + subset_shape <= *shape)
    }

    /// The indices of the elements of the block in row-major order.
    #[must_use]
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }

    /// The intersection of this block and `subset_other`, which may be empty.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the blocks differ in rank.
    pub fn overlap(&self, subset_other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        if subset_other.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                subset_other.dimensionality(),
                self.dimensionality(),
            ));
        }
        let ranges: Vec<_> = izip!(
            &self.start,
            &self.shape,
            subset_other.start(),
            subset_other.shape(),
        )
        .map(|(start, size, other_start, other_size)| {
            let overlap_start = *std::cmp::max(start, other_start);
            let overlap_end = std::cmp::min(start + size, other_start + other_size);
            overlap_start..overlap_end.max(overlap_start)
        })
        .collect();
        Ok(Self::new_with_ranges(&ranges))
    }

    /// The parts of this block outside `subset_other`.
    ///
    /// The returned subsets are disjoint and non-empty.
    /// They are produced by peeling slabs off each axis in turn, so there are at most `2 * dimensionality` of them.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the blocks differ in rank.
    pub fn difference(&self, subset_other: &Self) -> Result<Vec<Self>, IncompatibleDimensionalityError> {
        let overlap = self.overlap(subset_other)?;
        if self.is_empty() {
            return Ok(vec![]);
        }
        if overlap.is_empty() {
            return Ok(vec![self.clone()]);
        }

        let mut pieces = Vec::new();
        let mut remaining = self.clone();
        for axis in 0..self.dimensionality() {
            let start = remaining.start[axis];
            let end = start + remaining.shape[axis];
            let overlap_start = overlap.start[axis];
            let overlap_end = overlap_start + overlap.shape[axis];
            if start < overlap_start {
                let mut piece = remaining.clone();
                piece.shape[axis] = overlap_start - start;
                pieces.push(piece);
            }
            if overlap_end < end {
                let mut piece = remaining.clone();
                piece.start[axis] = overlap_end;
                piece.shape[axis] = end - overlap_end;
                pieces.push(piece);
            }
            remaining.start[axis] = overlap_start;
            remaining.shape[axis] = overlap_end - overlap_start;
        }
        Ok(pieces)
    }

    /// The block moved by a signed `offset`.
    ///
    /// Returns [`None`] if `offset` differs in rank or the moved block would start at a negative index.
    #[must_use]
    pub fn translate(&self, offset: &[i64]) -> Option<Self> {
        if offset.len() != self.dimensionality() {
            return None;
        }
        let start = std::iter::zip(&self.start, offset)
            .map(|(&start, &offset)| {
                let moved = i128::from(start) + i128::from(offset);
                u64::try_from(moved).ok()
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            start,
            shape: self.shape.clone(),
        })
    }
}

/// A rank mismatch.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
#[error("rank {0} does not match rank {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a rank mismatch error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}
