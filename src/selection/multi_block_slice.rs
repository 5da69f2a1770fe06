use derive_more::Display;
use thiserror::Error;

/// A strided, blocked selection along a single axis.
///
/// A conceptual extension of a slice to the hyperslab parameters `start`, `stride`, `count` and `block`.
/// The defaults select every element of an axis: `start = 0`, `stride = 1`, `block = 1`, and `count` derived from the axis length.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
#[display("MultiBlockSlice(start={start}, stride={stride}, count={count:?}, block={block})")]
pub struct MultiBlockSlice {
    start: u64,
    stride: u64,
    count: Option<u64>,
    block: u64,
}

impl Default for MultiBlockSlice {
    fn default() -> Self {
        Self {
            start: 0,
            stride: 1,
            count: None,
            block: 1,
        }
    }
}

/// A [`MultiBlockSlice`] error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MultiBlockSliceError {
    /// The stride, count or block is zero.
    #[error("stride, count and block of {0} must be at least 1")]
    ZeroParameter(MultiBlockSlice),
    /// The block is larger than the stride.
    #[error("blocks of {0} would overlap, block is larger than stride")]
    OverlappingBlocks(MultiBlockSlice),
    /// No full block fits within the axis.
    #[error("no full blocks can be selected using {slice} on an axis of length {length}")]
    NoFullBlock {
        /// The multi-block slice.
        slice: MultiBlockSlice,
        /// The axis length.
        length: u64,
    },
    /// The selected range extends beyond the end of the axis.
    #[error("{slice} with count {count} ends at index {end} beyond maximum index of an axis of length {length}")]
    ExceedsAxis {
        /// The multi-block slice.
        slice: MultiBlockSlice,
        /// The resolved count.
        count: u64,
        /// The last selected index.
        end: u64,
        /// The axis length.
        length: u64,
    },
}

impl MultiBlockSlice {
    /// Create a new multi-block slice.
    ///
    /// If `count` is [`None`], as many full blocks as fit within the axis are selected when resolved with [`indices`](MultiBlockSlice::indices).
    ///
    /// # Errors
    /// Returns a [`MultiBlockSliceError`] if `stride`, `count` or `block` is zero, or `block > stride`.
    pub fn new(
        start: u64,
        stride: u64,
        count: Option<u64>,
        block: u64,
    ) -> Result<Self, MultiBlockSliceError> {
        let slice = Self {
            start,
            stride,
            count,
            block,
        };
        if stride == 0 || count == Some(0) || block == 0 {
            Err(MultiBlockSliceError::ZeroParameter(slice))
        } else if block > stride {
            Err(MultiBlockSliceError::OverlappingBlocks(slice))
        } else {
            Ok(slice)
        }
    }

    /// The index of the first element of the first block.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// The distance between the starts of successive blocks.
    #[must_use]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// The number of blocks, if fixed.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        self.count
    }

    /// The number of elements in each block.
    #[must_use]
    pub fn block(&self) -> u64 {
        self.block
    }

    /// Resolve the multi-block slice against an axis of `length`.
    ///
    /// Returns `(start, count, stride, block)`.
    ///
    /// # Errors
    /// Returns [`MultiBlockSliceError::NoFullBlock`] if the count is derived and no full block fits,
    /// or [`MultiBlockSliceError::ExceedsAxis`] if the last selected element is beyond the end of the axis.
    pub fn indices(&self, length: u64) -> Result<(u64, u64, u64, u64), MultiBlockSliceError> {
        let count = if let Some(count) = self.count {
            count
        } else {
            let available = i128::from(length) - i128::from(self.start) - i128::from(self.block);
            let count = available.div_euclid(i128::from(self.stride)) + 1;
            if count < 1 {
                return Err(MultiBlockSliceError::NoFullBlock {
                    slice: *self,
                    length,
                });
            }
            u64::try_from(count).unwrap_or(u64::MAX)
        };

        let end = u128::from(self.start)
            + u128::from(self.block)
            + u128::from(count - 1) * u128::from(self.stride)
            - 1;
        if end >= u128::from(length) {
            return Err(MultiBlockSliceError::ExceedsAxis {
                slice: *self,
                count,
                end: u64::try_from(end).unwrap_or(u64::MAX),
                length,
            });
        }
        Ok((self.start, count, self.stride, self.block))
    }
}
