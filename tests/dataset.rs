use ndarray::{array, Array1, ArrayD, IxDyn};

use h5sel::{
    dataset::{DatasetError, MemoryDataset, ScalarValue},
    dataspace::{Dataspace, EncodedSelection, MemoryDataspace, SelectionType},
    region::{DatasetContext, RegionReference},
    selection::{select, Index, MultiBlockSlice, SelectionError, Slice},
};

fn dataset_6x8() -> Result<MemoryDataset<u32>, Box<dyn std::error::Error>> {
    let array = Array1::from_iter(0..48u32)
        .into_shape_with_order((6, 8))?
        .into_dyn();
    Ok(MemoryDataset::from_array(array.view())?)
}

#[rustfmt::skip]
#[test]
fn dataset_write_broadcast_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut dataset = MemoryDataset::new(&[4, 3], 0i64)?;
    let row = array![1, 2, 3].into_dyn();
    dataset.write(Vec::<Index>::new(), row.view())?;
    assert_eq!(
        dataset.as_slice(),
        &[1, 2, 3,
          1, 2, 3,
          1, 2, 3,
          1, 2, 3]
    );

    let column = array![[10], [20]].into_dyn();
    dataset.write(vec![Index::Slice((1_i64..3).into())], column.view())?;
    assert_eq!(
        dataset.as_slice(),
        &[ 1,  2,  3,
          10, 10, 10,
          20, 20, 20,
           1,  2,  3]
    );
    Ok(())
}

#[rustfmt::skip]
#[test]
fn dataset_multi_block_slice() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = dataset_6x8()?;
    // Blocks of two columns every three columns
    let slice = MultiBlockSlice::new(0, 3, None, 2)?;
    let read = dataset.read(vec![Index::Integer(1), Index::MultiBlock(slice)])?;
    assert_eq!(read, array![8, 9, 11, 12, 14, 15].into_dyn());

    let mut dataset = MemoryDataset::new(&[2, 8], 0u8)?;
    let value = array![1, 2, 3, 4, 5, 6].into_dyn();
    dataset.write(vec![Index::Integer(0), Index::MultiBlock(slice)], value.view())?;
    dataset.write(vec![Index::Integer(1), Index::MultiBlock(slice)], ndarray::arr0(9).into_dyn().view())?;
    assert_eq!(
        dataset.as_slice(),
        &[1, 2, 0, 3, 4, 0, 5, 6,
          9, 9, 0, 9, 9, 0, 9, 9]
    );
    Ok(())
}

#[test]
fn dataset_fancy_and_mask() -> Result<(), Box<dyn std::error::Error>> {
    let mut dataset = dataset_6x8()?;
    let read = dataset.read(vec![
        Index::Mask(vec![false, true, false, false, true, false]),
        Index::List(vec![0, -1]),
    ])?;
    assert_eq!(read, array![[8, 15], [32, 39]].into_dyn());

    let mask = ArrayD::from_shape_fn(IxDyn(&[6, 8]), |index| index[0] == 5 && index[1] > 5);
    assert_eq!(dataset.read(mask.clone())?, array![46, 47].into_dyn());

    let value = array![100, 101].into_dyn();
    dataset.write(mask.clone(), value.view())?;
    assert_eq!(&dataset.as_slice()[46..], &[100, 101]);

    let wrong = array![1, 2, 3].into_dyn();
    assert!(matches!(
        dataset.write(mask, wrong.view()),
        Err(DatasetError::Selection(SelectionError::Broadcast(_)))
    ));

    let value = array![[1, 2]].into_dyn();
    assert!(matches!(
        dataset.write(vec![Index::List(vec![0, 1]), Index::Integer(0)], value.view()),
        Err(DatasetError::Selection(SelectionError::Broadcast(_)))
    ));
    Ok(())
}

#[test]
fn dataset_index_errors() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = dataset_6x8()?;
    assert!(matches!(
        dataset.read(vec![Index::Integer(6)]),
        Err(DatasetError::Selection(SelectionError::IndexOutOfRange { axis: 0, .. }))
    ));
    assert!(matches!(
        dataset.read(vec![Index::Ellipsis, Index::Ellipsis]),
        Err(DatasetError::Selection(SelectionError::MultipleEllipsis))
    ));
    assert!(matches!(
        dataset.read(vec![Index::Integer(0), Index::Integer(0), Index::Integer(0)]),
        Err(DatasetError::Selection(SelectionError::TooManyIndices { got: 3, rank: 2 }))
    ));
    assert!(matches!(
        dataset.read(vec![Index::List(vec![3, 1])]),
        Err(DatasetError::Selection(SelectionError::UnorderedIndices { axis: 0 }))
    ));
    assert!(matches!(
        dataset.read(vec![Index::Slice(Slice::new(None, None, Some(0)))]),
        Err(DatasetError::Selection(SelectionError::InvalidSlice { .. }))
    ));
    Ok(())
}

#[test]
fn dataset_region_reference() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = dataset_6x8()?;
    let reference = dataset.region_reference(vec![
        Index::Slice((4_i64..).into()),
        Index::Slice((..2_i64).into()),
    ])?;
    assert!(matches!(reference.selection, EncodedSelection::Hyperslabs(_)));

    let bytes = reference.to_bytes()?;
    let reference = RegionReference::from_bytes(&bytes)?;
    assert_eq!(dataset.read_region(&reference)?, array![32, 33, 40, 41].into_dyn());

    // A region reference compiles to an unshaped selection
    let context: &dyn DatasetContext<MemoryDataspace> = &dataset;
    let selection = select(dataset.shape(), reference.clone(), Some(context))?;
    assert_eq!(selection.mshape(), vec![4]);
    assert_eq!(selection.dataspace().selection_type(), SelectionType::Hyperslabs);

    let other = MemoryDataset::new(&[8, 6], 0u32)?;
    assert!(matches!(
        other.read_region(&reference),
        Err(DatasetError::Selection(SelectionError::ShapeMismatch { .. }))
    ));
    Ok(())
}

#[test]
fn dataset_empty_selection() -> Result<(), Box<dyn std::error::Error>> {
    let mut dataset = dataset_6x8()?;
    let before = dataset.as_slice().to_vec();
    let value = array![1, 2, 3].into_dyn();
    dataset.write(vec![Index::Slice((3_i64..3).into())], value.view())?;
    assert_eq!(dataset.as_slice(), before.as_slice());

    let mask = ArrayD::from_elem(IxDyn(&[6, 8]), false);
    assert_eq!(dataset.read(mask)?.shape(), &[0]);
    assert_eq!(dataset.read(vec![Index::Slice((3_i64..3).into())])?.shape(), &[0]);
    assert_eq!(dataset.read(vec![Index::Integer(0), Index::List(vec![])])?.shape(), &[0]);
    Ok(())
}

#[test]
fn dataset_read_direct() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = dataset_6x8()?;

    // Row 1 is read once per destination row
    let mut dest = ArrayD::<u32>::zeros(IxDyn(&[2, 8]));
    dataset.read_direct(dest.view_mut(), vec![Index::Integer(1)], Vec::<Index>::new())?;
    assert_eq!(dest.iter().copied().collect::<Vec<_>>(), (8..16).chain(8..16).collect::<Vec<u32>>());

    let mut dest = ArrayD::<u32>::zeros(IxDyn(&[3, 4]));
    dataset.read_direct(
        dest.view_mut(),
        vec![Index::Slice((..2_i64).into()), Index::Slice((..4_i64).into())],
        vec![Index::Slice((1_i64..).into())],
    )?;
    assert_eq!(dest, array![[0, 0, 0, 0], [0, 1, 2, 3], [8, 9, 10, 11]].into_dyn());

    assert!(matches!(
        dataset.read_direct(dest.view_mut(), Vec::<Index>::new(), Vec::<Index>::new()),
        Err(DatasetError::Selection(SelectionError::Broadcast(_)))
    ));
    Ok(())
}

#[rustfmt::skip]
#[test]
fn dataset_write_direct() -> Result<(), Box<dyn std::error::Error>> {
    let mut dataset = MemoryDataset::new(&[4, 3], 0i32)?;
    let source = array![[1, 2, 3], [7, 8, 9]].into_dyn();
    dataset.write_direct(source.view(), vec![Index::Integer(1)], Vec::<Index>::new())?;
    assert_eq!(
        dataset.as_slice(),
        &[7, 8, 9,
          7, 8, 9,
          7, 8, 9,
          7, 8, 9]
    );

    dataset.write_direct(source.view(), Vec::<Index>::new(), vec![Index::List(vec![1, 3])])?;
    assert_eq!(
        dataset.as_slice(),
        &[7, 8, 9,
          1, 2, 3,
          7, 8, 9,
          7, 8, 9]
    );

    // Fancy destinations need the exact source shape
    assert!(matches!(
        dataset.write_direct(source.view(), vec![Index::Integer(0)], vec![Index::List(vec![1, 3])]),
        Err(DatasetError::Selection(SelectionError::Broadcast(_)))
    ));
    Ok(())
}

#[test]
fn dataset_read_scalar() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = MemoryDataset::new(&[], 7u8)?;
    assert_eq!(dataset.read_scalar(&[])?, ScalarValue::Element(7));
    assert_eq!(
        dataset.read_scalar(&[Index::Ellipsis])?,
        ScalarValue::Array(ndarray::arr0(7).into_dyn())
    );
    assert!(matches!(
        dataset.read_scalar(&[Index::Integer(0)]),
        Err(DatasetError::Selection(SelectionError::IllegalScalarIndex))
    ));
    assert!(matches!(
        dataset_6x8()?.read_scalar(&[]),
        Err(DatasetError::Selection(SelectionError::ShapeMismatch { .. }))
    ));
    Ok(())
}
