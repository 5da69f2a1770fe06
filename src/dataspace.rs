//! Dataspaces.
//!
//! A dataspace is the geometric description against which data is transferred: an extent (the fixed shape of a dataset) and a selection of its elements.
//!
//! The storage engine owns the real dataspaces.
//! This crate only needs the narrow interface described by the [`Dataspace`] trait, so any storage engine can plug its own dataspace handles into the selection engine.
//! [`MemoryDataspace`] is a complete in-memory implementation.

mod hyperslab;
mod memory_dataspace;

pub use hyperslab::Hyperslab;
pub use memory_dataspace::MemoryDataspace;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    shape::{ArrayIndices, ArrayShape},
};

/// The class of a dataspace extent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtentType {
    /// An extent that could not be classified.
    NoClass,
    /// A rank 0 extent with exactly one element.
    Scalar,
    /// A rank >= 1 extent.
    Simple,
    /// An extent with no elements.
    Null,
}

/// The type of the current selection of a dataspace.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SelectionType {
    /// A selection that could not be classified.
    Error,
    /// Nothing is selected.
    None,
    /// A list of points is selected.
    Points,
    /// One or more hyperslabs are selected.
    Hyperslabs,
    /// The entire extent is selected.
    All,
}

/// An operator combining a new hyperslab with the current selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SelectOperator {
    /// Replace the current selection.
    Set,
    /// Union of the current and new selection.
    Or,
    /// Intersection of the current and new selection.
    And,
    /// Symmetric difference of the current and new selection.
    Xor,
    /// Elements in the current selection that are not in the new selection.
    NotB,
    /// Elements in the new selection that are not in the current selection.
    NotA,
}

/// An operator combining new points with the current point selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointOperator {
    /// Replace the current selection.
    Set,
    /// Add points after the current points.
    Append,
    /// Add points before the current points.
    Prepend,
}

/// A dataspace error.
#[derive(Clone, Debug, Error)]
pub enum DataspaceError {
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// The maximum shape is smaller than the shape.
    #[error("maximum shape {1:?} is incompatible with shape {0:?}")]
    InvalidMaxShape(ArrayShape, Vec<Option<u64>>),
    /// A point is outside of the extent.
    #[error("point {0:?} is out of bounds of extent {1:?}")]
    PointOutOfBounds(ArrayIndices, ArrayShape),
    /// A hyperslab has invalid parameters.
    #[error("invalid hyperslab {0}")]
    InvalidHyperslab(Hyperslab),
    /// A hyperslab extends beyond the extent.
    #[error("hyperslab {0} is out of bounds of extent {1:?}")]
    HyperslabOutOfBounds(Hyperslab, ArrayShape),
    /// The selection (with its offset applied) is not within the extent.
    #[error("selection is not within extent {0:?}")]
    InvalidSelection(ArrayShape),
    /// The operation is not supported for this dataspace or selection.
    #[error("unsupported dataspace operation: {0}")]
    UnsupportedOperation(String),
}

/// The selection of an [`EncodedDataspace`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodedSelection {
    /// Nothing is selected.
    None,
    /// Everything is selected.
    All,
    /// Points in transfer order.
    Points(Vec<ArrayIndices>),
    /// Disjoint hyperslab blocks.
    Hyperslabs(Vec<ArraySubset>),
}

/// A serialisable snapshot of a dataspace extent and selection.
///
/// The selection offset is applied before encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedDataspace {
    /// The extent class.
    pub extent_type: ExtentType,
    /// The extent shape. Empty unless the extent is simple.
    pub shape: ArrayShape,
    /// The maximum extent shape. [`None`] is unlimited.
    pub max_shape: Vec<Option<u64>>,
    /// The selection.
    pub selection: EncodedSelection,
}

/// The interface of a dataspace handle.
///
/// A dataspace has a fixed rank, a shape, and a current selection with a selection offset.
/// Selection operations only restrict or reposition elements within the fixed extent.
///
/// Copying a dataspace ([`Clone`]) copies its extent, selection, and offset.
pub trait Dataspace: Clone + Debug + Send + Sync {
    /// Create a dataspace with a simple extent of `shape` with everything selected.
    ///
    /// A `shape` with no dimensions creates a scalar dataspace.
    /// `max_shape` defaults to `shape`. A [`None`] maximum dimension is unlimited.
    ///
    /// # Errors
    /// Returns a [`DataspaceError`] if `max_shape` is incompatible with `shape`.
    fn create_simple(shape: &[u64], max_shape: Option<&[Option<u64>]>) -> Result<Self, DataspaceError>
    where
        Self: Sized;

    /// Create a dataspace from an [`EncodedDataspace`].
    ///
    /// # Errors
    /// Returns a [`DataspaceError`] if the encoded dataspace is invalid.
    fn decode(encoded: &EncodedDataspace) -> Result<Self, DataspaceError>
    where
        Self: Sized;

    /// Encode the extent and selection.
    ///
    /// # Errors
    /// Returns [`DataspaceError::InvalidSelection`] if the offset selection is not within the extent.
    fn encode(&self) -> Result<EncodedDataspace, DataspaceError>;

    /// Return the extent class.
    fn extent_type(&self) -> ExtentType;

    /// Return the shape of the extent. Empty for scalar and null dataspaces.
    fn shape(&self) -> &[u64];

    /// Return the maximum shape of the extent.
    fn max_shape(&self) -> &[Option<u64>];

    /// Return the rank of the extent.
    fn rank(&self) -> usize {
        self.shape().len()
    }

    /// Select every element.
    fn select_all(&mut self);

    /// Select no elements.
    fn select_none(&mut self);

    /// Select a list of points.
    ///
    /// If the current selection is not a point selection, [`PointOperator::Append`] and [`PointOperator::Prepend`] behave like [`PointOperator::Set`].
    /// An empty list of points selects nothing.
    ///
    /// # Errors
    /// Returns a [`DataspaceError`] if a point has the wrong dimensionality or lies outside of the extent, or the extent does not support point selections.
    fn select_elements(
        &mut self,
        points: &[ArrayIndices],
        op: PointOperator,
    ) -> Result<(), DataspaceError>;

    /// Combine a hyperslab with the current selection.
    ///
    /// # Errors
    /// Returns a [`DataspaceError`] if the hyperslab is invalid, exceeds the extent, or cannot be combined with the current selection.
    fn select_hyperslab(
        &mut self,
        hyperslab: &Hyperslab,
        op: SelectOperator,
    ) -> Result<(), DataspaceError>;

    /// Replace the selection with the union of `blocks`.
    ///
    /// The blocks must be pairwise disjoint. Empty blocks are ignored and no blocks selects nothing.
    ///
    /// # Errors
    /// Returns a [`DataspaceError`] if a block has the wrong dimensionality or exceeds the extent, or the extent does not support hyperslab selections.
    fn select_blocks(&mut self, blocks: &[ArraySubset]) -> Result<(), DataspaceError> {
        self.select_none();
        for block in blocks.iter().filter(|block| !block.is_empty()) {
            let hyperslab = Hyperslab::new(block.start().to_vec(), block.shape().to_vec());
            self.select_hyperslab(&hyperslab, SelectOperator::Or)?;
        }
        Ok(())
    }

    /// Set the offset of the selection.
    ///
    /// The offset repositions the selection without changing its geometry.
    ///
    /// # Errors
    /// Returns [`DataspaceError::IncompatibleDimensionality`] if `offset` does not match the rank.
    fn offset_simple(&mut self, offset: &[i64]) -> Result<(), DataspaceError>;

    /// Return the offset of the selection.
    fn selection_offset(&self) -> &[i64];

    /// Return the number of selected elements.
    fn selected_points_count(&self) -> u64;

    /// Return the type of the current selection.
    fn selection_type(&self) -> SelectionType;

    /// Return the inclusive bounding box of the selection with the offset applied.
    ///
    /// # Errors
    /// Returns a [`DataspaceError`] if nothing is selected or the offset selection starts at a negative index.
    fn selection_bounds(&self) -> Result<(ArrayIndices, ArrayIndices), DataspaceError>;

    /// Return the disjoint blocks of a hyperslab selection with the offset applied.
    ///
    /// # Errors
    /// Returns [`DataspaceError::UnsupportedOperation`] if the selection is not a hyperslab selection.
    fn hyperslab_blocks(&self) -> Result<Vec<ArraySubset>, DataspaceError>;

    /// Return the selected element indices in transfer order with the offset applied.
    ///
    /// Hyperslab and all selections are ordered row-major, point selections keep their point order.
    ///
    /// # Errors
    /// Returns [`DataspaceError::InvalidSelection`] if the offset selection is not within the extent.
    fn selected_indices(&self) -> Result<Vec<ArrayIndices>, DataspaceError>;

    /// Returns true if the selection with its offset applied is within the extent.
    fn is_selection_valid(&self) -> bool;
}
