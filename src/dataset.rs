//! An in-memory dataset.
//!
//! [`MemoryDataset`] drives transfers through selections: it compiles indexing arguments with [`select`],
//! reads the selected elements in transfer order, and writes a source array once per dataspace yielded by [`Selection::broadcast`].
//!
//! ```rust
//! # use h5sel::{dataset::MemoryDataset, selection::Index};
//! let mut dataset = MemoryDataset::new(&[10, 5, 4, 2], 0.0f32)?;
//! let ones = ndarray::ArrayD::<f32>::ones(ndarray::IxDyn(&[5, 4]));
//! dataset.write(vec![Index::Ellipsis, Index::Integer(0)], ones.view())?;
//! let column = dataset.read(vec![Index::Integer(3), Index::Integer(2), Index::Integer(1)])?;
//! assert_eq!(column, ndarray::arr1(&[1.0, 0.0]).into_dyn());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, ErrorKind, IxDyn, ShapeError};
use rayon::prelude::*;
use thiserror::Error;
use tracing::trace;

use crate::{
    dataspace::{Dataspace, DataspaceError, MemoryDataspace},
    region::{DatasetContext, RegionReference},
    selection::{select, Index, ScalarReadSelection, SelectArgs, Selection, SelectionError},
    shape::{product, ravel_indices, ArrayIndices, ArrayShape},
};

/// A dataset error.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A selection error.
    #[error(transparent)]
    Selection(#[from] SelectionError),
    /// A dataspace error.
    #[error(transparent)]
    Dataspace(#[from] DataspaceError),
    /// An array shape error.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// The number of elements does not match the selection.
    #[error("got {got} elements, expected {expected}")]
    ElementCountMismatch {
        /// The number of selected elements.
        expected: u64,
        /// The number of elements supplied.
        got: u64,
    },
    /// The dataset is too large to be held in memory.
    #[error("a dataset of shape {0:?} is too large to be held in memory")]
    TooLarge(ArrayShape),
}

/// The value of a read of a scalar dataset.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue<T> {
    /// The bare element.
    Element(T),
    /// A 0D array holding the element.
    Array(ArrayD<T>),
}

/// An in-memory dataset of elements of type `T` in row-major order.
#[derive(Clone, Debug)]
pub struct MemoryDataset<T> {
    space: MemoryDataspace,
    data: Vec<T>,
}

fn shape_to_usize(shape: &[u64]) -> Result<Vec<usize>, DatasetError> {
    shape
        .iter()
        .map(|&dim| usize::try_from(dim))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| DatasetError::TooLarge(shape.to_vec()))
}

fn shape_of(shape: &[usize]) -> ArrayShape {
    shape.iter().map(|&dim| dim as u64).collect()
}

fn check_count(expected: usize, got: usize) -> Result<(), DatasetError> {
    if expected == got {
        Ok(())
    } else {
        Err(DatasetError::ElementCountMismatch {
            expected: expected as u64,
            got: got as u64,
        })
    }
}

impl<T: Clone + Send + Sync> MemoryDataset<T> {
    /// Create a dataset of `shape` with every element set to `fill_value`.
    ///
    /// A `shape` with no dimensions creates a scalar dataset.
    ///
    /// # Errors
    /// Returns a [`DatasetError`] if the dataspace cannot be created or the dataset is too large.
    pub fn new(shape: &[u64], fill_value: T) -> Result<Self, DatasetError> {
        let space = MemoryDataspace::create_simple(shape, None)?;
        let length = usize::try_from(product(shape))
            .map_err(|_| DatasetError::TooLarge(shape.to_vec()))?;
        Ok(Self {
            space,
            data: vec![fill_value; length],
        })
    }

    /// Create a dataset from an array.
    ///
    /// # Errors
    /// Returns a [`DatasetError`] if the dataspace cannot be created.
    pub fn from_array(array: ArrayViewD<'_, T>) -> Result<Self, DatasetError> {
        let shape = shape_of(array.shape());
        Ok(Self {
            space: MemoryDataspace::create_simple(&shape, None)?,
            data: array.iter().cloned().collect(),
        })
    }

    /// The shape of the dataset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        self.space.shape()
    }

    /// The elements of the dataset in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    fn compile(&self, args: impl Into<SelectArgs<MemoryDataspace>>) -> Result<Selection<MemoryDataspace>, SelectionError> {
        let context: &dyn DatasetContext<MemoryDataspace> = self;
        select(self.space.shape(), args, Some(context))
    }

    fn linear_index(&self, indices: &ArrayIndices) -> Result<usize, DatasetError> {
        usize::try_from(ravel_indices(indices, self.space.shape()))
            .map_err(|_| DatasetError::TooLarge(self.space.shape().to_vec()))
    }

    /// The selected elements in transfer order.
    fn gather(&self, space: &MemoryDataspace) -> Result<Vec<T>, DatasetError> {
        let indices = space.selected_indices()?;
        trace!(elements = indices.len(), "gather");
        indices
            .par_iter()
            .map(|indices| -> Result<T, DatasetError> {
                Ok(self.data[self.linear_index(indices)?].clone())
            })
            .collect()
    }

    /// Write `elements` to the selected elements in transfer order.
    fn scatter(&mut self, space: &MemoryDataspace, elements: &[T]) -> Result<(), DatasetError> {
        let indices = space.selected_indices()?;
        check_count(indices.len(), elements.len())?;
        trace!(elements = indices.len(), "scatter");
        for (indices, element) in std::iter::zip(&indices, elements) {
            let index = self.linear_index(indices)?;
            self.data[index] = element.clone();
        }
        Ok(())
    }

    /// Read the elements selected by `args`.
    ///
    /// The returned array has the [array shape](Selection::array_shape) of the selection.
    /// A selection of no elements reads a 1D array of length 0.
    ///
    /// # Errors
    /// Returns a [`DatasetError`] if `args` are invalid.
    pub fn read(&self, args: impl Into<SelectArgs<MemoryDataspace>>) -> Result<ArrayD<T>, DatasetError> {
        let selection = self.compile(args)?;
        if selection.nselect() == 0 {
            return Ok(ArrayD::from_shape_vec(IxDyn(&[0]), vec![])?);
        }
        let array_shape = shape_to_usize(&selection.array_shape())?;
        let elements = self.gather(selection.dataspace())?;
        Ok(ArrayD::from_shape_vec(IxDyn(&array_shape), elements)?)
    }

    /// Read the element of a scalar dataset.
    ///
    /// Empty `args` read the bare element and a single [`Index::Ellipsis`] reads a 0D array.
    ///
    /// # Errors
    /// Returns a [`DatasetError`] if the dataset is not scalar or `args` are neither empty nor a single ellipsis.
    pub fn read_scalar(&self, args: &[Index]) -> Result<ScalarValue<T>, DatasetError> {
        let selection = ScalarReadSelection::new(self.space.clone(), args)?;
        let mut elements = self.gather(selection.dataspace())?;
        check_count(1, elements.len())?;
        let element = elements.swap_remove(0);
        Ok(match selection.mshape() {
            None => ScalarValue::Element(element),
            Some(mshape) => {
                let mshape = shape_to_usize(mshape)?;
                ScalarValue::Array(ArrayD::from_shape_vec(IxDyn(&mshape), vec![element])?)
            }
        })
    }

    /// Read the elements selected by `source_args` into the elements of `dest` selected by `dest_args`.
    ///
    /// The destination selection is broadcast against the [memory shape](Selection::mshape) of the source selection,
    /// so the source elements are read once per yielded destination dataspace.
    /// Empty indices select every element.
    ///
    /// # Errors
    /// Returns a [`DatasetError`] if either selection is invalid or the source cannot be broadcast to the destination selection.
    pub fn read_direct(
        &self,
        mut dest: ArrayViewMutD<'_, T>,
        source_args: impl Into<SelectArgs<MemoryDataspace>>,
        dest_args: impl Into<SelectArgs<MemoryDataspace>>,
    ) -> Result<(), DatasetError> {
        let source_selection = self.compile(source_args)?;
        let dest_shape = shape_of(dest.shape());
        let context: &dyn DatasetContext<MemoryDataspace> = self;
        let dest_selection = select(&dest_shape, dest_args, Some(context))?;

        let elements = self.gather(source_selection.dataspace())?;
        for space in dest_selection.broadcast(&source_selection.mshape())? {
            let indices = space?.selected_indices()?;
            check_count(indices.len(), elements.len())?;
            for (indices, element) in std::iter::zip(&indices, &elements) {
                let indices = shape_to_usize(indices)?;
                let target = dest
                    .get_mut(indices.as_slice())
                    .ok_or_else(|| DataspaceError::InvalidSelection(dest_shape.clone()))?;
                *target = element.clone();
            }
        }
        Ok(())
    }

    /// Write `value` to the elements selected by `args`.
    ///
    /// `value` is broadcast to the selection with [`Selection::broadcast`] and written once per yielded dataspace.
    /// A scalar `value` is first repeated along the last axis of the selection.
    ///
    /// # Errors
    /// Returns a [`DatasetError`] if `args` are invalid or `value` cannot be broadcast to the selection.
    pub fn write(
        &mut self,
        args: impl Into<SelectArgs<MemoryDataspace>>,
        value: ArrayViewD<'_, T>,
    ) -> Result<(), DatasetError> {
        let selection = self.compile(args)?;
        if selection.nselect() == 0 {
            return Ok(());
        }

        let array_shape = selection.array_shape();
        let value: ArrayD<T> = match array_shape.last() {
            Some(&last) if value.ndim() == 0 => {
                let last = shape_to_usize(&[last])?;
                value
                    .broadcast(IxDyn(&last))
                    .ok_or_else(|| ShapeError::from_kind(ErrorKind::IncompatibleShape))?
                    .to_owned()
            }
            _ => value.to_owned(),
        };
        let source_shape = shape_of(value.shape());
        let elements: Vec<T> = value.iter().cloned().collect();

        for space in selection.broadcast(&source_shape)? {
            self.scatter(&space?, &elements)?;
        }
        Ok(())
    }

    /// Write the elements of `source` selected by `source_args` to the elements selected by `dest_args`.
    ///
    /// The destination selection is broadcast against the [memory shape](Selection::mshape) of the source selection,
    /// so the source elements are written once per yielded dataspace.
    /// Empty indices select every element.
    ///
    /// # Errors
    /// Returns a [`DatasetError`] if either selection is invalid or the source cannot be broadcast to the destination selection.
    pub fn write_direct(
        &mut self,
        source: ArrayViewD<'_, T>,
        source_args: impl Into<SelectArgs<MemoryDataspace>>,
        dest_args: impl Into<SelectArgs<MemoryDataspace>>,
    ) -> Result<(), DatasetError> {
        let source_shape = shape_of(source.shape());
        let context: &dyn DatasetContext<MemoryDataspace> = &*self;
        let source_selection = select(&source_shape, source_args, Some(context))?;
        let dest_selection = self.compile(dest_args)?;

        let elements = source_selection
            .dataspace()
            .selected_indices()?
            .iter()
            .map(|indices| -> Result<T, DatasetError> {
                let indices = shape_to_usize(indices)?;
                source
                    .get(indices.as_slice())
                    .cloned()
                    .ok_or_else(|| DataspaceError::InvalidSelection(source_shape.clone()).into())
            })
            .collect::<Result<Vec<_>, _>>()?;
        for space in dest_selection.broadcast(&source_selection.mshape())? {
            self.scatter(&space?, &elements)?;
        }
        Ok(())
    }

    /// Create a region reference to the elements selected by `args`.
    ///
    /// # Errors
    /// Returns a [`DatasetError`] if `args` are invalid.
    pub fn region_reference(
        &self,
        args: impl Into<SelectArgs<MemoryDataspace>>,
    ) -> Result<RegionReference, DatasetError> {
        let selection = self.compile(args)?;
        Ok(RegionReference::new(selection.dataspace())?)
    }

    /// Read the elements referenced by a region reference.
    ///
    /// The returned array is 1D.
    ///
    /// # Errors
    /// Returns a [`DatasetError`] if the region reference does not match the dataset.
    pub fn read_region(&self, reference: &RegionReference) -> Result<ArrayD<T>, DatasetError> {
        self.read(reference.clone())
    }
}

impl<T> DatasetContext<MemoryDataspace> for MemoryDataset<T> {
    fn dataspace(&self) -> Result<MemoryDataspace, SelectionError> {
        Ok(self.space.clone())
    }
}
