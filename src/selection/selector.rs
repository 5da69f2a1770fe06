use itertools::{multiunzip, Itertools};
use tracing::debug;

use crate::{
    array_subset::ArraySubset,
    config::global_config,
    dataspace::{Dataspace, Hyperslab, SelectOperator},
    shape::{normalize_index, ArrayShape},
};

use super::{Index, Selection, SelectionError, SimpleHyperslab, Slice};

/// Resolves per-axis indices against a dataspace.
///
/// Each call to [`make_selection`](Selector::make_selection) selects from a copy of the bound dataspace.
#[derive(Clone, Debug)]
pub struct Selector<D: Dataspace> {
    space: D,
}

/// The resolved selection of one axis.
#[derive(Debug, PartialEq, Eq)]
enum AxisSelection {
    Regular {
        start: u64,
        stride: u64,
        count: u64,
        block: u64,
        scalar: bool,
    },
    Points(Vec<u64>),
}

impl AxisSelection {
    fn len(&self) -> u64 {
        match self {
            Self::Regular { count, block, .. } => count * block,
            Self::Points(points) => points.len() as u64,
        }
    }

    fn is_scalar(&self) -> bool {
        matches!(self, Self::Regular { scalar: true, .. })
    }

    /// The contiguous runs `(start, length)` of the axis, in increasing order.
    fn runs(&self) -> Vec<(u64, u64)> {
        match *self {
            Self::Regular { count: 0, .. } => vec![],
            Self::Regular {
                start,
                stride,
                count,
                block,
                ..
            } => {
                if count == 1 || stride == block {
                    vec![(start, count * block)]
                } else {
                    (0..count).map(|i| (start + i * stride, block)).collect()
                }
            }
            Self::Points(ref points) => {
                let mut runs: Vec<(u64, u64)> = Vec::new();
                for &point in points {
                    match runs.last_mut() {
                        Some((start, length)) if *start + *length == point => *length += 1,
                        _ => runs.push((point, 1)),
                    }
                }
                runs
            }
        }
    }
}

fn resolve_axis(axis: usize, index: &Index, length: u64) -> Result<AxisSelection, SelectionError> {
    let normalize = |index: i64| {
        normalize_index(index, length).ok_or(SelectionError::IndexOutOfRange {
            axis,
            index,
            length,
        })
    };
    match index {
        Index::Ellipsis => resolve_axis(axis, &Index::Slice(Slice::full()), length),
        Index::Integer(index) => Ok(AxisSelection::Regular {
            start: normalize(*index)?,
            stride: 1,
            count: 1,
            block: 1,
            scalar: true,
        }),
        Index::Slice(slice) => {
            let (start, count, step) = slice.indices(length)?;
            Ok(AxisSelection::Regular {
                start,
                stride: step,
                count,
                block: 1,
                scalar: false,
            })
        }
        Index::MultiBlock(slice) => {
            let (start, count, stride, block) = slice.indices(length)?;
            Ok(AxisSelection::Regular {
                start,
                stride,
                count,
                block,
                scalar: false,
            })
        }
        Index::List(list) => {
            let points = list.iter().map(|&index| normalize(index)).collect::<Result<Vec<_>, _>>()?;
            if points.iter().tuple_windows().any(|(a, b)| a >= b) {
                return Err(SelectionError::UnorderedIndices { axis });
            }
            Ok(AxisSelection::Points(points))
        }
        Index::Mask(mask) => {
            if mask.len() as u64 != length {
                return Err(SelectionError::MaskLengthMismatch {
                    axis,
                    expected: length,
                    got: mask.len() as u64,
                });
            }
            Ok(AxisSelection::Points(
                mask.iter()
                    .positions(|&selected| selected)
                    .map(|position| position as u64)
                    .collect(),
            ))
        }
    }
}

impl<D: Dataspace> Selector<D> {
    /// Create a new selector bound to `space`.
    #[must_use]
    pub fn new(space: D) -> Self {
        Self { space }
    }

    /// The bound dataspace.
    #[must_use]
    pub fn dataspace(&self) -> &D {
        &self.space
    }

    /// Compile per-axis indices into a selection.
    ///
    /// A single [`Index::Ellipsis`] expands to full slices of the axes not otherwise indexed, and trailing axes without an index are fully selected.
    /// The selection is [simple](super::SelectionKind::Simple) if only integers, slices and multi-block slices are used,
    /// otherwise it is [fancy](super::SelectionKind::Fancy).
    ///
    /// A scalar dataspace only accepts no indices or a single ellipsis.
    ///
    /// # Errors
    /// Returns a [`SelectionError`] if
    ///  - there is more than one ellipsis, or more indices than axes,
    ///  - an integer or list index is out of range, or a list is not strictly increasing,
    ///  - a slice has a step less than 1, or a multi-block slice does not fit its axis,
    ///  - a boolean array does not match the length of its axis, or
    ///  - a fancy selection exceeds the [fancy selection block limit](crate::config::Config#fancy-selection-block-limit).
    pub fn make_selection(&self, indices: &[Index]) -> Result<Selection<D>, SelectionError> {
        let shape = self.space.shape().to_vec();
        let rank = shape.len();
        let ellipses = indices
            .iter()
            .filter(|index| matches!(index, Index::Ellipsis))
            .count();
        if ellipses > 1 {
            return Err(SelectionError::MultipleEllipsis);
        }
        let given = indices.len() - ellipses;
        if given > rank {
            return Err(SelectionError::TooManyIndices { got: given, rank });
        }

        let mut space = self.space.clone();
        if rank == 0 {
            space.select_all();
            return Ok(Selection::simple(space, SimpleHyperslab::new_all(&[])));
        }

        let full = Index::Slice(Slice::full());
        let mut expanded: Vec<&Index> = Vec::with_capacity(rank);
        for index in indices {
            if matches!(index, Index::Ellipsis) {
                expanded.extend(std::iter::repeat(&full).take(rank - given));
            } else {
                expanded.push(index);
            }
        }
        expanded.resize(rank, &full);

        let axes = std::iter::zip(expanded, &shape)
            .enumerate()
            .map(|(axis, (index, &length))| resolve_axis(axis, index, length))
            .collect::<Result<Vec<_>, _>>()?;
        let mshape: ArrayShape = axes.iter().map(AxisSelection::len).collect();

        if axes.iter().all(|axis| matches!(axis, AxisSelection::Regular { .. })) {
            let (start, stride, count, block, scalar): (Vec<_>, Vec<_>, Vec<_>, Vec<_>, Vec<_>) =
                multiunzip(axes.iter().filter_map(|axis| match *axis {
                    AxisSelection::Regular {
                        start,
                        stride,
                        count,
                        block,
                        scalar,
                    } => Some((start, stride, count, block, scalar)),
                    AxisSelection::Points(_) => None,
                }));
            let hyperslab = Hyperslab::new(start.clone(), count.clone())
                .with_stride(stride.clone())
                .with_block(block.clone());
            space.select_hyperslab(&hyperslab, SelectOperator::Set)?;
            debug!(?mshape, "simple selection");
            return Ok(Selection::simple(
                space,
                SimpleHyperslab::new(start, stride, count, block, scalar),
            ));
        }

        let runs = axes.iter().map(AxisSelection::runs).collect_vec();
        let blocks = runs
            .iter()
            .map(|runs| runs.len() as u64)
            .fold(1u64, u64::saturating_mul);
        let limit = global_config().fancy_selection_block_limit();
        if blocks > limit as u64 {
            return Err(SelectionError::TooManyBlocks { blocks, limit });
        }

        // Runs are sorted and disjoint on every axis, so their products are disjoint boxes
        let subsets = runs
            .iter()
            .map(|runs| runs.iter())
            .multi_cartesian_product()
            .map(|block| {
                let ranges = block
                    .into_iter()
                    .map(|&(start, length)| start..start + length)
                    .collect_vec();
                ArraySubset::new_with_ranges(&ranges)
            })
            .collect_vec();
        space.select_blocks(&subsets)?;
        let array_shape = std::iter::zip(&mshape, &axes)
            .filter_map(|(&dim, axis)| (!axis.is_scalar()).then_some(dim))
            .collect();
        debug!(?mshape, ?array_shape, blocks, "fancy selection");
        Ok(Selection::fancy(space, mshape, array_shape))
    }
}

#[cfg(test)]
mod tests {
    use crate::dataspace::MemoryDataspace;

    use super::*;

    fn selector(shape: &[u64]) -> Selector<MemoryDataspace> {
        Selector::new(MemoryDataspace::create_simple(shape, None).unwrap())
    }

    #[test]
    fn selector_axis_runs() {
        assert_eq!(
            AxisSelection::Points(vec![0, 1, 2, 5, 7, 8]).runs(),
            vec![(0, 3), (5, 1), (7, 2)]
        );
        let regular = AxisSelection::Regular {
            start: 1,
            stride: 3,
            count: 3,
            block: 2,
            scalar: false,
        };
        assert_eq!(regular.runs(), vec![(1, 2), (4, 2), (7, 2)]);
        assert_eq!(regular.len(), 6);
    }

    #[test]
    fn selector_ellipsis() {
        let selector = selector(&[10, 5, 4, 2]);
        let selection = selector
            .make_selection(&[Index::Ellipsis, Index::Integer(0)])
            .unwrap();
        assert_eq!(selection.mshape(), vec![10, 5, 4, 1]);
        assert_eq!(selection.array_shape(), vec![10, 5, 4]);
        assert_eq!(selection.nselect(), 200);

        let selection = selector
            .make_selection(&[Index::Integer(-1), Index::Ellipsis, Index::Integer(1)])
            .unwrap();
        assert_eq!(selection.mshape(), vec![1, 5, 4, 1]);
        assert_eq!(selection.array_shape(), vec![5, 4]);
        assert_eq!(selection.dataspace().selection_bounds().unwrap(), (vec![9, 0, 0, 1], vec![9, 4, 3, 1]));

        let selection = selector.make_selection(&[Index::Integer(2)]).unwrap();
        assert_eq!(selection.mshape(), vec![1, 5, 4, 2]);

        assert!(matches!(
            selector.make_selection(&[Index::Ellipsis, Index::Ellipsis]),
            Err(SelectionError::MultipleEllipsis)
        ));
        assert!(matches!(
            selector.make_selection(&[
                Index::Integer(0),
                Index::Integer(0),
                Index::Integer(0),
                Index::Integer(0),
                Index::Integer(0)
            ]),
            Err(SelectionError::TooManyIndices { got: 5, rank: 4 })
        ));
        assert!(matches!(
            selector.make_selection(&[Index::Integer(10)]),
            Err(SelectionError::IndexOutOfRange {
                axis: 0,
                index: 10,
                length: 10
            })
        ));
    }

    #[test]
    fn selector_slices() {
        let selector = selector(&[10, 10]);
        let selection = selector
            .make_selection(&[
                Index::Slice(Slice::new(Some(1), Some(8), Some(3))),
                Index::Slice(Slice::new(Some(-2), None, None)),
            ])
            .unwrap();
        assert_eq!(selection.mshape(), vec![3, 2]);
        assert_eq!(
            selection.dataspace().selected_indices().unwrap(),
            vec![
                vec![1, 8],
                vec![1, 9],
                vec![4, 8],
                vec![4, 9],
                vec![7, 8],
                vec![7, 9]
            ]
        );

        let selection = selector
            .make_selection(&[Index::Slice(Slice::new(Some(5), Some(5), None))])
            .unwrap();
        assert_eq!(selection.mshape(), vec![0, 10]);
        assert_eq!(selection.nselect(), 0);
    }

    #[test]
    fn selector_fancy() {
        let selector = selector(&[6, 8]);
        let selection = selector
            .make_selection(&[
                Index::List(vec![0, 1, 4]),
                Index::Mask(vec![true, false, true, true, false, false, false, true]),
            ])
            .unwrap();
        assert!(matches!(selection.kind(), crate::selection::SelectionKind::Fancy { .. }));
        assert_eq!(selection.mshape(), vec![3, 4]);
        assert_eq!(selection.array_shape(), vec![3, 4]);
        assert_eq!(selection.nselect(), 12);

        let selection = selector
            .make_selection(&[Index::Integer(2), Index::List(vec![-1, 3])])
            .unwrap_err();
        assert!(matches!(selection, SelectionError::UnorderedIndices { axis: 1 }));

        let selection = selector
            .make_selection(&[Index::Integer(2), Index::List(vec![3, -1])])
            .unwrap();
        assert_eq!(selection.mshape(), vec![1, 2]);
        assert_eq!(selection.array_shape(), vec![2]);
        assert_eq!(
            selection.dataspace().selected_indices().unwrap(),
            vec![vec![2, 3], vec![2, 7]]
        );

        let selection = selector.make_selection(&[Index::List(vec![])]).unwrap();
        assert_eq!(selection.mshape(), vec![0, 8]);
        assert_eq!(selection.nselect(), 0);

        assert!(matches!(
            selector.make_selection(&[Index::List(vec![1, 1])]),
            Err(SelectionError::UnorderedIndices { axis: 0 })
        ));
        assert!(matches!(
            selector.make_selection(&[Index::Ellipsis, Index::Mask(vec![true; 7])]),
            Err(SelectionError::MaskLengthMismatch {
                axis: 1,
                expected: 8,
                got: 7
            })
        ));
    }

    #[test]
    fn selector_fancy_block_limit() {
        let selector = selector(&[2200, 2200]);
        let list: Vec<i64> = (0..1100).map(|i| i * 2).collect();
        assert!(matches!(
            selector.make_selection(&[Index::List(list.clone()), Index::List(list)]),
            Err(SelectionError::TooManyBlocks {
                blocks: 1_210_000,
                ..
            })
        ));
    }

    #[test]
    fn selector_fancy_many_blocks() {
        let selector = selector(&[192, 192]);
        let list: Vec<i64> = (0..96).map(|i| i * 2).collect();
        let start = std::time::Instant::now();
        let selection = selector
            .make_selection(&[Index::List(list.clone()), Index::List(list)])
            .unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(selection.nselect(), 96 * 96);
        assert_eq!(selection.array_shape(), vec![96, 96]);
        assert_eq!(selection.dataspace().hyperslab_blocks().unwrap().len(), 96 * 96);
        let indices = selection.dataspace().selected_indices().unwrap();
        assert_eq!(indices[0], vec![0, 0]);
        assert_eq!(indices[1], vec![0, 2]);
        assert_eq!(indices[96], vec![2, 0]);
        assert_eq!(indices[96 * 96 - 1], vec![190, 190]);
    }

    #[test]
    fn selector_scalar() {
        let selector = Selector::new(MemoryDataspace::new_scalar());
        let selection = selector.make_selection(&[]).unwrap();
        assert!(selection.mshape().is_empty());
        assert_eq!(selection.nselect(), 1);
        assert!(selector.make_selection(&[Index::Ellipsis]).is_ok());
        assert!(matches!(
            selector.make_selection(&[Index::Integer(0)]),
            Err(SelectionError::TooManyIndices { got: 1, rank: 0 })
        ));
    }
}
