//! A rust library for dataspace selection and broadcasting in HDF5-like hierarchical array containers.
//!
//! The crate translates indexing expressions (integers, slices, multi-block slices, index lists, boolean masks and region references)
//! into hyperslab and point selections of a dataset's [dataspace](dataspace::Dataspace),
//! and reconciles the shape of an in-memory buffer with the shape of a selection through array broadcasting rules when reading or writing.
//!
//! ## Getting Started
//! - [`selection::select`] compiles indexing arguments into a [`selection::Selection`].
//! - [`selection::Selection::broadcast`] yields the dataspaces of a transfer of a source buffer.
//! - [`selection::guess_shape`] reconstructs the shape of a selection from a bare dataspace.
//! - [`dataset::MemoryDataset`] is an in-memory dataset that drives transfers through selections.
//!
//! The storage engine is an external collaborator.
//! It plugs into the selection engine by implementing [`dataspace::Dataspace`] and [`region::DatasetContext`].
//! [`dataspace::MemoryDataspace`] is a complete in-memory dataspace.
//!
//! ## Example
//! ```rust
//! # use h5sel::{dataspace::MemoryDataspace, selection::{select, Index}};
//! let selection = select::<MemoryDataspace>(&[10, 5, 4, 2], vec![Index::Ellipsis, Index::Integer(0)], None)?;
//! assert_eq!(selection.mshape(), vec![10, 5, 4, 1]);
//! assert_eq!(selection.array_shape(), vec![10, 5, 4]);
//!
//! // A (5, 4) source is written once for each of the 10 rows of the first axis
//! assert_eq!(selection.expand_shape(&[5, 4])?, vec![1, 5, 4, 1]);
//! assert_eq!(selection.broadcast(&[5, 4])?.count(), 10);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//! Selection compilation and broadcasting emit [`tracing`] events. No subscriber is installed by this crate.
//!
//! ## Licence
//! `h5sel` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array_subset;
pub mod config;
pub mod dataset;
pub mod dataspace;
pub mod region;
pub mod selection;
pub mod shape;
