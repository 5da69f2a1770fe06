//! Array subset iterators.
//!
//! [`Indices`] iterates over the multidimensional indices of the elements in an [`ArraySubset`](super::ArraySubset).
//! It is created with [`ArraySubset::indices`](super::ArraySubset::indices) and supports [`into_iter()`](IntoIterator::into_iter) ([`IntoIterator`]).

mod indices_iterator;

pub use indices_iterator::{Indices, IndicesIterator};
