use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use ndarray::ArrayD;

use crate::{dataspace::Dataspace, region::RegionReference};

use super::{MultiBlockSlice, Selection, SelectionError};

/// A slice with `start`, `stop` and `step`, each optional.
///
/// Negative `start` and `stop` count back from the end of an axis, and out of range values are clamped to the axis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Slice {
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
}

impl Slice {
    /// Create a new slice.
    #[must_use]
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// A slice of every element of an axis.
    #[must_use]
    pub fn full() -> Self {
        Self::default()
    }

    /// Resolve the slice against an axis of `length`.
    ///
    /// Returns `(start, count, step)`. A slice that selects nothing has a `count` of zero.
    ///
    /// # Errors
    /// Returns [`SelectionError::InvalidSlice`] if the step is less than 1.
    pub fn indices(&self, length: u64) -> Result<(u64, u64, u64), SelectionError> {
        let step = self.step.unwrap_or(1);
        if step < 1 {
            return Err(SelectionError::InvalidSlice { step });
        }
        let length = i128::from(length);
        let clamp = |index: Option<i64>, default: i128| match index {
            None => default,
            Some(index) if index < 0 => (i128::from(index) + length).max(0),
            Some(index) => i128::from(index).min(length),
        };
        let start = clamp(self.start, 0);
        let stop = clamp(self.stop, length);
        let step = i128::from(step);
        let count = if stop > start {
            (stop - start + step - 1) / step
        } else {
            0
        };
        let to_u64 = |value: i128| u64::try_from(value).unwrap_or_default();
        Ok((to_u64(start), to_u64(count), to_u64(step)))
    }
}

impl From<Range<i64>> for Slice {
    fn from(range: Range<i64>) -> Self {
        Self::new(Some(range.start), Some(range.end), None)
    }
}

impl From<RangeFrom<i64>> for Slice {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::new(Some(range.start), None, None)
    }
}

impl From<RangeTo<i64>> for Slice {
    fn from(range: RangeTo<i64>) -> Self {
        Self::new(None, Some(range.end), None)
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// An index of a single axis, or an ellipsis spanning omitted axes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Index {
    /// Expands to a full slice of every omitted axis.
    Ellipsis,
    /// A single element. The axis is dropped from the array shape.
    Integer(i64),
    /// A slice.
    Slice(Slice),
    /// A strided, blocked selection.
    MultiBlock(MultiBlockSlice),
    /// A strictly increasing list of elements.
    List(Vec<i64>),
    /// A boolean array with the length of the axis.
    Mask(Vec<bool>),
}

impl From<i64> for Index {
    fn from(index: i64) -> Self {
        Self::Integer(index)
    }
}

impl From<Slice> for Index {
    fn from(slice: Slice) -> Self {
        Self::Slice(slice)
    }
}

impl From<Range<i64>> for Index {
    fn from(range: Range<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<RangeFrom<i64>> for Index {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<RangeTo<i64>> for Index {
    fn from(range: RangeTo<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<RangeFull> for Index {
    fn from(range: RangeFull) -> Self {
        Self::Slice(range.into())
    }
}

impl From<MultiBlockSlice> for Index {
    fn from(slice: MultiBlockSlice) -> Self {
        Self::MultiBlock(slice)
    }
}

impl From<Vec<i64>> for Index {
    fn from(list: Vec<i64>) -> Self {
        Self::List(list)
    }
}

impl From<Vec<bool>> for Index {
    fn from(mask: Vec<bool>) -> Self {
        Self::Mask(mask)
    }
}

/// The arguments of [`select`](super::select).
#[derive(Clone, Debug)]
pub enum SelectArgs<D: Dataspace> {
    /// A previously compiled selection.
    Selection(Selection<D>),
    /// A boolean mask with the shape of the dataspace.
    Mask(ArrayD<bool>),
    /// A region reference.
    Region(RegionReference),
    /// Per-axis indices.
    Indices(Vec<Index>),
}

impl<D: Dataspace> From<Selection<D>> for SelectArgs<D> {
    fn from(selection: Selection<D>) -> Self {
        Self::Selection(selection)
    }
}

impl<D: Dataspace> From<ArrayD<bool>> for SelectArgs<D> {
    fn from(mask: ArrayD<bool>) -> Self {
        Self::Mask(mask)
    }
}

impl<D: Dataspace> From<RegionReference> for SelectArgs<D> {
    fn from(reference: RegionReference) -> Self {
        Self::Region(reference)
    }
}

impl<D: Dataspace> From<Vec<Index>> for SelectArgs<D> {
    fn from(indices: Vec<Index>) -> Self {
        Self::Indices(indices)
    }
}

impl<D: Dataspace> From<&[Index]> for SelectArgs<D> {
    fn from(indices: &[Index]) -> Self {
        Self::Indices(indices.to_vec())
    }
}

impl<D: Dataspace> From<Index> for SelectArgs<D> {
    fn from(index: Index) -> Self {
        Self::Indices(vec![index])
    }
}
