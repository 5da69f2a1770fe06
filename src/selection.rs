//! Selections.
//!
//! A [`Selection`] binds a [`Dataspace`] to the shape information needed to transfer its selected elements to and from memory.
//! Selections are compiled from indexing arguments by [`select`], and come in three kinds (see [`SelectionKind`]):
//!  - point selections: unshaped, always presented to memory as 1D,
//!  - simple selections: a single regular hyperslab built from integers, slices and [`MultiBlockSlice`]s, which supports broadcasting,
//!  - fancy selections: built from index lists and per-axis boolean arrays, which only accept an exact shape match.
//!
//! [`guess_shape`] reconstructs the shape of a selection from a bare dataspace.
//! Reads of a scalar dataspace use a [`ScalarReadSelection`].

mod broadcast;
mod guess_shape;
mod index;
mod multi_block_slice;
mod scalar_read;
mod select;
mod selection_errors;
mod selector;

pub use broadcast::Broadcast;
pub use guess_shape::guess_shape;
pub use index::{Index, SelectArgs, Slice};
pub use multi_block_slice::{MultiBlockSlice, MultiBlockSliceError};
pub use scalar_read::ScalarReadSelection;
pub use select::select;
pub use selection_errors::SelectionError;
pub use selector::Selector;

use ndarray::{ArrayD, Dimension};

use crate::{
    dataspace::{Dataspace, PointOperator, SelectionType},
    shape::{broadcast_shapes, product, ArrayIndices, ArrayShape, IncompatibleBroadcastError},
};

/// The geometry of a simple selection.
///
/// Along each axis, `count` blocks of `block` elements separated by `stride` are selected from `start`.
/// Scalar axes were indexed with an integer and are dropped from the array shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimpleHyperslab {
    start: ArrayIndices,
    stride: Vec<u64>,
    count: Vec<u64>,
    block: Vec<u64>,
    scalar: Vec<bool>,
}

impl SimpleHyperslab {
    /// Create the geometry of a selection of every element of `shape`.
    #[must_use]
    pub fn new_all(shape: &[u64]) -> Self {
        let rank = shape.len();
        Self {
            start: vec![0; rank],
            stride: vec![1; rank],
            count: shape.to_vec(),
            block: vec![1; rank],
            scalar: vec![false; rank],
        }
    }

    pub(crate) fn new(
        start: ArrayIndices,
        stride: Vec<u64>,
        count: Vec<u64>,
        block: Vec<u64>,
        scalar: Vec<bool>,
    ) -> Self {
        Self {
            start,
            stride,
            count,
            block,
            scalar,
        }
    }

    /// The start of each axis.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// The stride of each axis.
    #[must_use]
    pub fn stride(&self) -> &[u64] {
        &self.stride
    }

    /// The number of blocks on each axis.
    #[must_use]
    pub fn count(&self) -> &[u64] {
        &self.count
    }

    /// The block size of each axis.
    #[must_use]
    pub fn block(&self) -> &[u64] {
        &self.block
    }

    /// Which axes are scalar.
    #[must_use]
    pub fn scalar(&self) -> &[bool] {
        &self.scalar
    }

    /// The number of selected elements on each axis.
    #[must_use]
    pub fn mshape(&self) -> ArrayShape {
        std::iter::zip(&self.count, &self.block)
            .map(|(count, block)| count * block)
            .collect()
    }
}

/// The kind of a [`Selection`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionKind {
    /// An unshaped selection of points, or of an arbitrary dataspace selection.
    Points,
    /// A single regular hyperslab.
    Simple(SimpleHyperslab),
    /// A selection from index lists or per-axis boolean arrays.
    Fancy {
        /// The memory shape.
        mshape: ArrayShape,
        /// The memory shape without scalar axes.
        array_shape: ArrayShape,
    },
}

/// A dataspace selection.
///
/// A selection exclusively owns its dataspace.
/// The number of selected elements always equals the product of the [memory shape](Selection::mshape).
#[derive(Clone, Debug)]
pub struct Selection<D: Dataspace> {
    shape: ArrayShape,
    space: D,
    kind: SelectionKind,
}

impl<D: Dataspace> Selection<D> {
    /// Create a point selection of every element of `shape`.
    ///
    /// The dataspace has an unlimited maximum shape.
    ///
    /// # Errors
    /// Returns a [`SelectionError`] if the dataspace cannot be created.
    pub fn new_points(shape: &[u64]) -> Result<Self, SelectionError> {
        let max_shape = vec![None; shape.len()];
        let mut space = D::create_simple(shape, Some(&max_shape))?;
        space.select_all();
        Ok(Self {
            shape: shape.to_vec(),
            space,
            kind: SelectionKind::Points,
        })
    }

    /// Create a simple selection of every element of `shape`.
    ///
    /// # Errors
    /// Returns a [`SelectionError`] if the dataspace cannot be created.
    pub fn new_simple(shape: &[u64]) -> Result<Self, SelectionError> {
        let max_shape = vec![None; shape.len()];
        let mut space = D::create_simple(shape, Some(&max_shape))?;
        space.select_all();
        Ok(Self::simple(space, SimpleHyperslab::new_all(shape)))
    }

    /// Create an unshaped selection from the current selection of `space`.
    #[must_use]
    pub fn from_dataspace(space: D) -> Self {
        Self {
            shape: space.shape().to_vec(),
            space,
            kind: SelectionKind::Points,
        }
    }

    pub(crate) fn simple(space: D, hyperslab: SimpleHyperslab) -> Self {
        Self {
            shape: space.shape().to_vec(),
            space,
            kind: SelectionKind::Simple(hyperslab),
        }
    }

    pub(crate) fn fancy(space: D, mshape: ArrayShape, array_shape: ArrayShape) -> Self {
        Self {
            shape: space.shape().to_vec(),
            space,
            kind: SelectionKind::Fancy {
                mshape,
                array_shape,
            },
        }
    }

    /// The shape of the whole dataspace.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// The kind of selection.
    #[must_use]
    pub fn kind(&self) -> &SelectionKind {
        &self.kind
    }

    /// The selected dataspace.
    #[must_use]
    pub fn dataspace(&self) -> &D {
        &self.space
    }

    /// Convert into the selected dataspace.
    #[must_use]
    pub fn into_dataspace(self) -> D {
        self.space
    }

    /// The number of selected elements.
    #[must_use]
    pub fn nselect(&self) -> u64 {
        self.space.selected_points_count()
    }

    /// The memory shape of the selection.
    ///
    /// This is not necessarily a subshape of the [dataspace shape](Selection::shape).
    #[must_use]
    pub fn mshape(&self) -> ArrayShape {
        match &self.kind {
            SelectionKind::Points => vec![self.nselect()],
            SelectionKind::Simple(hyperslab) => hyperslab.mshape(),
            SelectionKind::Fancy { mshape, .. } => mshape.clone(),
        }
    }

    /// The shape of an array to read or write, the [memory shape](Selection::mshape) without scalar axes.
    #[must_use]
    pub fn array_shape(&self) -> ArrayShape {
        match &self.kind {
            SelectionKind::Points => self.mshape(),
            SelectionKind::Simple(hyperslab) => std::iter::zip(hyperslab.mshape(), &hyperslab.scalar)
                .filter_map(|(dim, &scalar)| (!scalar).then_some(dim))
                .collect(),
            SelectionKind::Fancy { array_shape, .. } => array_shape.clone(),
        }
    }

    /// Match the dimensions of a source array to the selection for broadcasting.
    ///
    /// The returned shape has the rank of the dataspace and the same number of elements as `source_shape`.
    /// For example, with a dataspace of shape `(10, 5, 4, 2)` selected with `[..., 0]`, a source shape of `(5, 4)` expands to `(1, 5, 4, 1)`.
    ///
    /// Point and fancy selections do not broadcast, they only accept a source with the same number of elements or the same array shape respectively.
    ///
    /// # Errors
    /// Returns [`SelectionError::Broadcast`] if `source_shape` cannot be broadcast to the selection.
    pub fn expand_shape(&self, source_shape: &[u64]) -> Result<ArrayShape, SelectionError> {
        let incompatible = || IncompatibleBroadcastError::new(source_shape.to_vec(), self.array_shape());
        match &self.kind {
            SelectionKind::Points => {
                if product(source_shape) == self.nselect() {
                    Ok(source_shape.to_vec())
                } else {
                    Err(incompatible().into())
                }
            }
            SelectionKind::Fancy { array_shape, .. } => {
                if source_shape == array_shape.as_slice() {
                    Ok(source_shape.to_vec())
                } else {
                    Err(incompatible().into())
                }
            }
            SelectionKind::Simple(hyperslab) => {
                // The source may only stretch to the array shape, never widen it
                let array_shape = self.array_shape();
                let broadcast = broadcast_shapes(source_shape, &array_shape)?;
                let (leading, trailing) = broadcast.split_at(broadcast.len() - array_shape.len());
                if trailing != array_shape.as_slice() || leading.iter().any(|&dim| dim != 1) {
                    return Err(incompatible().into());
                }

                let mut source = source_shape.iter().rev();
                let mut eshape = vec![1; hyperslab.scalar.len()];
                for (eshape_i, &scalar) in std::iter::zip(&mut eshape, &hyperslab.scalar).rev() {
                    if scalar {
                        continue;
                    }
                    match source.next() {
                        Some(&dim) => *eshape_i = dim,
                        None => break,
                    }
                }
                Ok(eshape)
            }
        }
    }

    /// Return an iterator over the dataspaces to transfer a source array of `source_shape` to or from.
    ///
    /// The source array is transferred once per yielded dataspace, in order.
    /// Simple selections follow array broadcasting rules against the [memory shape](Selection::mshape):
    /// the source is repeated along axes where it has length 1 or is missing, and one dataspace is yielded per repetition.
    ///
    /// # Errors
    /// Returns [`SelectionError::Broadcast`] if `source_shape` cannot be broadcast to the selection.
    pub fn broadcast(&self, source_shape: &[u64]) -> Result<Broadcast<D>, SelectionError> {
        Broadcast::new(self, source_shape)
    }

    /// Replace the selected points.
    ///
    /// # Errors
    /// Returns [`SelectionError::NotAPointSelection`] if this is not a point selection, or a [`SelectionError::Dataspace`] error if a point is invalid.
    pub fn set_points<P: AsRef<[u64]>>(&mut self, points: &[P]) -> Result<(), SelectionError> {
        self.perform_point_selection(points, PointOperator::Set)
    }

    /// Add points after the selected points.
    ///
    /// # Errors
    /// See [`set_points`](Selection::set_points).
    pub fn append_points<P: AsRef<[u64]>>(&mut self, points: &[P]) -> Result<(), SelectionError> {
        self.perform_point_selection(points, PointOperator::Append)
    }

    /// Add points before the selected points.
    ///
    /// # Errors
    /// See [`set_points`](Selection::set_points).
    pub fn prepend_points<P: AsRef<[u64]>>(&mut self, points: &[P]) -> Result<(), SelectionError> {
        self.perform_point_selection(points, PointOperator::Prepend)
    }

    fn perform_point_selection<P: AsRef<[u64]>>(
        &mut self,
        points: &[P],
        op: PointOperator,
    ) -> Result<(), SelectionError> {
        if self.kind != SelectionKind::Points {
            return Err(SelectionError::NotAPointSelection);
        }
        let op = if self.space.selection_type() == SelectionType::Points {
            op
        } else {
            PointOperator::Set
        };
        if points.is_empty() {
            self.space.select_none();
        } else {
            let points: Vec<ArrayIndices> = points.iter().map(|point| point.as_ref().to_vec()).collect();
            self.space.select_elements(&points, op)?;
        }
        Ok(())
    }

    /// Select the true elements of a boolean `mask` with the shape of the dataspace, in row-major order.
    ///
    /// # Errors
    /// Returns [`SelectionError::MaskShapeMismatch`] if the shape of `mask` does not match the dataspace,
    /// or [`SelectionError::NotAPointSelection`] if this is not a point selection.
    pub fn select_mask(&mut self, mask: &ArrayD<bool>) -> Result<(), SelectionError> {
        let mask_shape: ArrayShape = mask.shape().iter().map(|&dim| dim as u64).collect();
        if mask_shape != self.shape {
            return Err(SelectionError::MaskShapeMismatch {
                expected: self.shape.clone(),
                got: mask_shape,
            });
        }
        if self.shape.is_empty() {
            if self.kind != SelectionKind::Points {
                return Err(SelectionError::NotAPointSelection);
            }
            if mask.iter().any(|&selected| selected) {
                self.space.select_all();
            } else {
                self.space.select_none();
            }
            return Ok(());
        }
        let points: Vec<ArrayIndices> = mask
            .indexed_iter()
            .filter(|(_, &selected)| selected)
            .map(|(indices, _)| indices.slice().iter().map(|&index| index as u64).collect())
            .collect();
        self.set_points(&points)
    }
}
