use thiserror::Error;

use crate::{
    dataspace::DataspaceError,
    shape::{ArrayShape, IncompatibleBroadcastError},
};

use super::MultiBlockSliceError;

/// A selection error.
#[derive(Clone, Debug, Error)]
pub enum SelectionError {
    /// A selection or region reference does not match the shape of the dataspace it is applied to.
    #[error("selection shape {got:?} does not match dataspace shape {expected:?}")]
    ShapeMismatch {
        /// The expected shape.
        expected: ArrayShape,
        /// The shape of the selection.
        got: ArrayShape,
    },
    /// A source shape cannot be broadcast to the selection.
    #[error(transparent)]
    Broadcast(#[from] IncompatibleBroadcastError),
    /// An integer index is out of range for its axis.
    #[error("index {index} is out of range for axis {axis} with length {length}")]
    IndexOutOfRange {
        /// The axis.
        axis: usize,
        /// The index.
        index: i64,
        /// The length of the axis.
        length: u64,
    },
    /// A slice has a step less than 1.
    #[error("slice step must be at least 1, got {step}")]
    InvalidSlice {
        /// The step.
        step: i64,
    },
    /// A boolean mask does not match the dataspace shape.
    #[error("boolean mask shape {got:?} does not match dataspace shape {expected:?}")]
    MaskShapeMismatch {
        /// The dataspace shape.
        expected: ArrayShape,
        /// The mask shape.
        got: ArrayShape,
    },
    /// A per-axis boolean array does not match the length of its axis.
    #[error("boolean index of length {got} does not match axis {axis} with length {expected}")]
    MaskLengthMismatch {
        /// The axis.
        axis: usize,
        /// The axis length.
        expected: u64,
        /// The boolean array length.
        got: u64,
    },
    /// A region reference was used without a dataset context.
    #[error("a region reference requires a dataset context")]
    MissingDatasetContext,
    /// More indices than axes.
    #[error("{got} indices given for a dataspace of rank {rank}")]
    TooManyIndices {
        /// The number of non-ellipsis indices.
        got: usize,
        /// The rank of the dataspace.
        rank: usize,
    },
    /// More than one ellipsis.
    #[error("only one ellipsis may be used")]
    MultipleEllipsis,
    /// An index list is not strictly increasing.
    #[error("index list for axis {axis} must be strictly increasing")]
    UnorderedIndices {
        /// The axis.
        axis: usize,
    },
    /// Indexing arguments other than none or a single ellipsis for a scalar read.
    #[error("illegal indexing arguments for a scalar dataspace")]
    IllegalScalarIndex,
    /// A point operation on a selection that is not a point selection.
    #[error("points can only be set on a point selection")]
    NotAPointSelection,
    /// A fancy selection would combine too many hyperslab blocks.
    #[error("fancy selection of {blocks} blocks exceeds the limit of {limit} blocks")]
    TooManyBlocks {
        /// The number of blocks.
        blocks: u64,
        /// The configured limit.
        limit: usize,
    },
    /// An invalid multi-block slice.
    #[error(transparent)]
    MultiBlockSlice(#[from] MultiBlockSliceError),
    /// The extent or selection type of a dataspace is not recognised.
    #[error("unrecognised dataspace geometry: {0}")]
    UnrecognizedGeometry(String),
    /// A dataspace error.
    #[error(transparent)]
    Dataspace(#[from] DataspaceError),
}
