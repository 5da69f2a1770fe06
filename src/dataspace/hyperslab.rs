use derive_more::Display;
use itertools::{izip, Itertools};
use serde::{Deserialize, Serialize};

use crate::{array_subset::ArraySubset, shape::ArrayIndices};

/// A regular hyperslab.
///
/// Along each axis, a hyperslab selects `count` blocks of `block` elements, the first starting at `start` and successive blocks starting every `stride` elements.
///
/// A valid hyperslab has a non-zero `stride` and `block` on every axis, and `block <= stride` on every axis with more than one block, so blocks never overlap.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("start {start:?} stride {stride:?} count {count:?} block {block:?}")]
pub struct Hyperslab {
    start: ArrayIndices,
    stride: Vec<u64>,
    count: Vec<u64>,
    block: Vec<u64>,
}

impl Hyperslab {
    /// Create a hyperslab of `count` contiguous elements per axis from `start`.
    ///
    /// The stride and block default to 1.
    #[must_use]
    pub fn new(start: ArrayIndices, count: Vec<u64>) -> Self {
        let rank = start.len();
        Self {
            start,
            stride: vec![1; rank],
            count,
            block: vec![1; rank],
        }
    }

    /// Set the stride.
    #[must_use]
    pub fn with_stride(mut self, stride: Vec<u64>) -> Self {
        self.stride = stride;
        self
    }

    /// Set the block.
    #[must_use]
    pub fn with_block(mut self, block: Vec<u64>) -> Self {
        self.block = block;
        self
    }

    /// The start of the first block.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// The distance between the starts of successive blocks.
    #[must_use]
    pub fn stride(&self) -> &[u64] {
        &self.stride
    }

    /// The number of blocks.
    #[must_use]
    pub fn count(&self) -> &[u64] {
        &self.count
    }

    /// The size of each block.
    #[must_use]
    pub fn block(&self) -> &[u64] {
        &self.block
    }

    /// The dimensionality of the hyperslab.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Returns true if the parameters have a consistent dimensionality and describe non-overlapping blocks.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let rank = self.dimensionality();
        self.stride.len() == rank
            && self.count.len() == rank
            && self.block.len() == rank
            && izip!(&self.stride, &self.count, &self.block)
                .all(|(&stride, &count, &block)| {
                    stride > 0 && block > 0 && (count <= 1 || block <= stride)
                })
    }

    /// Returns true if the hyperslab selects no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count.iter().any(|&count| count == 0)
    }

    /// The number of elements selected by the hyperslab.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        std::iter::zip(&self.count, &self.block)
            .map(|(count, block)| count * block)
            .product()
    }

    /// The end (exclusive) of the last block on each axis.
    ///
    /// Returns [`None`] if the hyperslab is empty.
    #[must_use]
    pub fn end_exc(&self) -> Option<ArrayIndices> {
        if self.is_empty() {
            return None;
        }
        Some(
            izip!(&self.start, &self.stride, &self.count, &self.block)
                .map(|(start, stride, count, block)| start + (count - 1) * stride + block)
                .collect(),
        )
    }

    /// Decompose the hyperslab into disjoint array subsets.
    ///
    /// Adjacent blocks along an axis (`stride == block`) are merged into a single run.
    /// The subsets are in row-major order of their starts.
    #[must_use]
    pub fn blocks(&self) -> Vec<ArraySubset> {
        if self.is_empty() {
            return vec![];
        }
        if self.dimensionality() == 0 {
            return vec![ArraySubset::new_with_shape(vec![])];
        }
        izip!(&self.start, &self.stride, &self.count, &self.block)
            .map(|(&start, &stride, &count, &block)| {
                if count == 1 || stride == block {
                    vec![start..start + count * block]
                } else {
                    (0..count)
                        .map(|i| {
                            let block_start = start + i * stride;
                            block_start..block_start + block
                        })
                        .collect()
                }
            })
            .multi_cartesian_product()
            .map(|ranges| ArraySubset::new_with_ranges(&ranges))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyperslab_validity() {
        assert!(Hyperslab::new(vec![0, 0], vec![2, 3]).is_valid());
        assert!(Hyperslab::new(vec![0], vec![2])
            .with_stride(vec![3])
            .with_block(vec![2])
            .is_valid());
        assert!(!Hyperslab::new(vec![0], vec![2])
            .with_stride(vec![1])
            .with_block(vec![2])
            .is_valid());
        assert!(Hyperslab::new(vec![0], vec![1])
            .with_stride(vec![1])
            .with_block(vec![2])
            .is_valid());
        assert!(!Hyperslab::new(vec![0], vec![2]).with_stride(vec![0]).is_valid());
        assert!(!Hyperslab::new(vec![0, 0], vec![2]).is_valid());
    }

    #[test]
    fn hyperslab_blocks() {
        let hyperslab = Hyperslab::new(vec![1, 0], vec![2, 3])
            .with_stride(vec![4, 1])
            .with_block(vec![2, 1]);
        assert_eq!(hyperslab.num_elements(), 12);
        assert_eq!(hyperslab.end_exc(), Some(vec![7, 3]));
        assert_eq!(
            hyperslab.blocks(),
            vec![
                ArraySubset::new_with_ranges(&[1..3, 0..3]),
                ArraySubset::new_with_ranges(&[5..7, 0..3]),
            ]
        );

        let empty = Hyperslab::new(vec![0, 0], vec![0, 3]);
        assert!(empty.is_empty());
        assert!(empty.blocks().is_empty());
        assert_eq!(empty.end_exc(), None);
    }
}
