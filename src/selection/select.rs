use tracing::debug;

use crate::{dataspace::Dataspace, region::DatasetContext};

use super::{SelectArgs, Selection, SelectionError, Selector};

/// Compile indexing arguments into a [`Selection`] of a dataspace of `shape`.
///
/// The arguments are resolved in order:
///  1. a [`Selection`] is returned as is, if it has the same shape,
///  2. a boolean mask with the same shape selects its true elements as points,
///  3. a [`RegionReference`](crate::region::RegionReference) is resolved by `context` and returned as an unshaped selection,
///  4. per-axis [`Index`](super::Index)es are compiled by a [`Selector`].
///
/// Per-axis indices select from the dataspace of `context` if it has the same shape, otherwise from a new dataspace of `shape`.
///
/// # Errors
/// Returns [`SelectionError::ShapeMismatch`] if a selection or region reference does not match `shape`,
/// [`SelectionError::MissingDatasetContext`] if a region reference is given without a `context`,
/// or any error from compiling the arguments.
pub fn select<D: Dataspace>(
    shape: &[u64],
    args: impl Into<SelectArgs<D>>,
    context: Option<&dyn DatasetContext<D>>,
) -> Result<Selection<D>, SelectionError> {
    match args.into() {
        SelectArgs::Selection(selection) => {
            if selection.shape() == shape {
                Ok(selection)
            } else {
                Err(SelectionError::ShapeMismatch {
                    expected: shape.to_vec(),
                    got: selection.shape().to_vec(),
                })
            }
        }
        SelectArgs::Mask(mask) => {
            let mut selection = Selection::new_points(shape)?;
            selection.select_mask(&mask)?;
            Ok(selection)
        }
        SelectArgs::Region(reference) => {
            let context = context.ok_or(SelectionError::MissingDatasetContext)?;
            let space = context.resolve_region(&reference)?;
            if space.shape() != shape {
                return Err(SelectionError::ShapeMismatch {
                    expected: shape.to_vec(),
                    got: space.shape().to_vec(),
                });
            }
            debug!(
                selected = space.selected_points_count(),
                "resolved region reference"
            );
            Ok(Selection::from_dataspace(space))
        }
        SelectArgs::Indices(indices) => {
            let space = match context {
                Some(context) => {
                    let space = context.dataspace()?;
                    if space.shape() == shape {
                        space
                    } else {
                        D::create_simple(shape, None)?
                    }
                }
                None => D::create_simple(shape, None)?,
            };
            Selector::new(space).make_selection(&indices)
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, IxDyn};

    use crate::{
        dataspace::{MemoryDataspace, SelectionType},
        region::RegionReference,
        selection::{Index, SelectionKind},
    };

    use super::*;

    #[test]
    fn select_dispatch() {
        let selection = select::<MemoryDataspace>(&[4, 5], vec![Index::Integer(1)], None).unwrap();
        assert!(matches!(selection.kind(), SelectionKind::Simple(_)));
        assert_eq!(selection.array_shape(), vec![5]);

        let reused = select(&[4, 5], selection.clone(), None).unwrap();
        assert_eq!(reused.mshape(), selection.mshape());
        assert!(matches!(
            select(&[5, 4], selection, None),
            Err(SelectionError::ShapeMismatch { .. })
        ));

        let mask = ArrayD::from_shape_fn(IxDyn(&[4, 5]), |index| index[0] == index[1]);
        let selection = select::<MemoryDataspace>(&[4, 5], mask, None).unwrap();
        assert!(matches!(selection.kind(), SelectionKind::Points));
        assert_eq!(selection.mshape(), vec![4]);
        assert_eq!(selection.dataspace().selection_type(), SelectionType::Points);

        let mask = ArrayD::from_elem(IxDyn(&[5, 4]), true);
        assert!(matches!(
            select::<MemoryDataspace>(&[4, 5], mask, None),
            Err(SelectionError::MaskShapeMismatch { .. })
        ));
    }

    #[test]
    fn select_region_requires_context() {
        let space = MemoryDataspace::create_simple(&[4], None).unwrap();
        let reference = RegionReference::new(&space).unwrap();
        assert!(matches!(
            select::<MemoryDataspace>(&[4], reference, None),
            Err(SelectionError::MissingDatasetContext)
        ));
    }

    #[test]
    fn select_scalar() {
        let selection = select::<MemoryDataspace>(&[], Vec::<Index>::new(), None).unwrap();
        assert_eq!(selection.dataspace().rank(), 0);
        assert_eq!(selection.nselect(), 1);
        assert!(selection.mshape().is_empty());
        let selection = select::<MemoryDataspace>(&[], Index::Ellipsis, None).unwrap();
        assert_eq!(selection.nselect(), 1);
    }
}
