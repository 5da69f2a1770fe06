use tracing::debug;

use crate::{
    dataspace::{Dataspace, ExtentType, Hyperslab, SelectOperator, SelectionType},
    shape::{product, ArrayShape},
};

use super::SelectionError;

/// Deduce the shape of the current selection of a dataspace.
///
/// Returns
///  - the shape of the selection with the rank of the dataspace, for all, none, and single regular hyperslab selections,
///  - a 1D shape for point selections and other hyperslab selections,
///  - [`None`] for null dataspaces and scalar dataspaces with nothing selected.
///
/// The number of elements along each axis of a hyperslab selection is found by masking off all but the first position of the axis within the bounding box of the selection.
/// This assumes a single regular hyperslab, so if the product of the axis counts does not match the number of selected elements the selection is treated as 1D.
///
/// # Errors
/// Returns [`SelectionError::UnrecognizedGeometry`] if the extent or selection type is not recognised,
/// or a [`SelectionError::Dataspace`] error if the bounds of the selection cannot be determined.
pub fn guess_shape<D: Dataspace>(space: &D) -> Result<Option<ArrayShape>, SelectionError> {
    let selection_type = space.selection_type();
    match space.extent_type() {
        ExtentType::Null => return Ok(None),
        ExtentType::Scalar => match selection_type {
            SelectionType::None => return Ok(None),
            SelectionType::All => return Ok(Some(vec![])),
            _ => {}
        },
        ExtentType::Simple => {}
        ExtentType::NoClass => {
            return Err(SelectionError::UnrecognizedGeometry(
                "dataspace extent has no class".to_string(),
            ))
        }
    }

    let npoints = space.selected_points_count();
    let rank = space.rank();
    match selection_type {
        SelectionType::None => return Ok(Some(vec![0; rank])),
        SelectionType::All => return Ok(Some(space.shape().to_vec())),
        SelectionType::Points => return Ok(Some(vec![npoints])),
        SelectionType::Hyperslabs => {}
        SelectionType::Error => {
            return Err(SelectionError::UnrecognizedGeometry(
                "dataspace selection type is unrecognised".to_string(),
            ))
        }
    }
    if npoints == 0 {
        return Ok(Some(vec![0; rank]));
    }

    // The hyperslab mask is in the coordinates of the selection before its offset
    let (lower, upper) = space.selection_bounds()?;
    let lower: Vec<u64> = std::iter::zip(&lower, space.selection_offset())
        .map(|(&lower, &offset)| u64::try_from(i128::from(lower) - i128::from(offset)).unwrap_or_default())
        .collect();
    let box_shape: ArrayShape = std::iter::zip(&lower, &upper)
        .zip(space.selection_offset())
        .map(|((&lower, &upper), &offset)| {
            let upper = u64::try_from(i128::from(upper) - i128::from(offset)).unwrap_or_default();
            upper - lower + 1
        })
        .collect();

    let mut shape = Vec::with_capacity(rank);
    for axis in 0..rank {
        if box_shape[axis] == 1 {
            shape.push(1);
            continue;
        }
        let mut start = lower.clone();
        start[axis] += 1;
        let mut count = box_shape.clone();
        count[axis] -= 1;
        let mut masked = space.clone();
        masked.select_hyperslab(&Hyperslab::new(start, count), SelectOperator::NotB)?;
        let leftover = masked.selected_points_count();
        match npoints.checked_div(leftover) {
            Some(axis_count) => shape.push(axis_count),
            None => return Ok(Some(vec![npoints])),
        }
    }

    if product(&shape) == npoints {
        Ok(Some(shape))
    } else {
        debug!(?shape, npoints, "irregular hyperslab selection is 1D");
        Ok(Some(vec![npoints]))
    }
}

#[cfg(test)]
mod tests {
    use crate::dataspace::{MemoryDataspace, PointOperator};

    use super::*;

    #[test]
    fn guess_shape_extents() {
        assert_eq!(guess_shape(&MemoryDataspace::new_null()).unwrap(), None);
        let mut scalar = MemoryDataspace::new_scalar();
        assert_eq!(guess_shape(&scalar).unwrap(), Some(vec![]));
        scalar.select_none();
        assert_eq!(guess_shape(&scalar).unwrap(), None);
    }

    #[test]
    fn guess_shape_selection_types() {
        let mut space = MemoryDataspace::create_simple(&[6, 7], None).unwrap();
        assert_eq!(guess_shape(&space).unwrap(), Some(vec![6, 7]));
        space.select_none();
        assert_eq!(guess_shape(&space).unwrap(), Some(vec![0, 0]));
        space
            .select_elements(&[vec![1, 1], vec![2, 5], vec![0, 0]], PointOperator::Set)
            .unwrap();
        assert_eq!(guess_shape(&space).unwrap(), Some(vec![3]));
    }

    #[test]
    fn guess_shape_hyperslabs() {
        let mut space = MemoryDataspace::create_simple(&[10, 10], None).unwrap();
        let hyperslab = Hyperslab::new(vec![1, 2], vec![3, 2])
            .with_stride(vec![3, 4])
            .with_block(vec![1, 2]);
        space
            .select_hyperslab(&hyperslab, SelectOperator::Set)
            .unwrap();
        assert_eq!(guess_shape(&space).unwrap(), Some(vec![3, 4]));

        space.offset_simple(&[1, -2]).unwrap();
        assert_eq!(guess_shape(&space).unwrap(), Some(vec![3, 4]));

        space.offset_simple(&[0, 0]).unwrap();
        space
            .select_hyperslab(&Hyperslab::new(vec![0, 0], vec![1, 1]), SelectOperator::Or)
            .unwrap();
        assert_eq!(guess_shape(&space).unwrap(), Some(vec![13]));

        let mut space = MemoryDataspace::create_simple(&[10, 10], None).unwrap();
        space
            .select_hyperslab(&Hyperslab::new(vec![4, 0], vec![1, 10]), SelectOperator::Set)
            .unwrap();
        assert_eq!(guess_shape(&space).unwrap(), Some(vec![1, 10]));
    }
}
