use std::iter::FusedIterator;

use crate::{
    array_subset::ArraySubset,
    shape::{unravel_index, ArrayIndices},
};

/// The multidimensional indices of the elements of an [`ArraySubset`] in row-major order.
///
/// The indices of the block of a `(4, 3)` dataspace starting at `(2, 1)` with shape `(2, 2)` are `[(2, 1), (2, 2), (3, 1), (3, 2)]`.
pub struct Indices {
    subset: ArraySubset,
    length: u64,
}

impl Indices {
    /// Create the indices of `subset`.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        let length = subset.num_elements();
        Self { subset, length }
    }

    /// Return the number of indices.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Returns true if the number of indices is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the indices.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = ArrayIndices;
    type IntoIter = IndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator {
            subset: &self.subset,
            index: 0,
            length: self.length,
        }
    }
}

/// An iterator over [`Indices`].
pub struct IndicesIterator<'a> {
    subset: &'a ArraySubset,
    index: u64,
    length: u64,
}

impl IndicesIterator<'_> {
    fn get_indices(&self, index: u64) -> ArrayIndices {
        let mut indices = unravel_index(index, self.subset.shape());
        std::iter::zip(indices.iter_mut(), self.subset.start())
            .for_each(|(index, start)| *index += start);
        indices
    }
}

impl Iterator for IndicesIterator<'_> {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index < self.length {
            let indices = self.get_indices(self.index);
            self.index += 1;
            Some(indices)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let length = usize::try_from(self.length - self.index).unwrap_or(usize::MAX);
        (length, Some(length))
    }
}

impl ExactSizeIterator for IndicesIterator<'_> {}

impl FusedIterator for IndicesIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_iterator() {
        let indices = ArraySubset::new_with_ranges(&[2..4, 1..3]).indices();
        assert_eq!(indices.len(), 4);
        assert_eq!(
            indices.iter().collect::<Vec<_>>(),
            vec![vec![2, 1], vec![2, 2], vec![3, 1], vec![3, 2]]
        );
        let mut iter = indices.iter();
        assert_eq!(iter.next(), Some(vec![2, 1]));
        assert_eq!(iter.len(), 3);
    }

    #[test]
    fn indices_iterator_empty() {
        let indices = ArraySubset::new_with_ranges(&[1..1, 5..7]).indices();
        assert!(indices.is_empty());
        assert_eq!(indices.iter().next(), None);
    }
}
