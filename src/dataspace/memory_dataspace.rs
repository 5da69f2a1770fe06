use itertools::{izip, Itertools};
use rayon::prelude::*;
use tracing::trace;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    config::global_config,
    shape::{product, ArrayIndices, ArrayShape},
};

use super::{
    Dataspace, DataspaceError, EncodedDataspace, EncodedSelection, ExtentType, Hyperslab,
    PointOperator, SelectOperator, SelectionType,
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum MemorySelection {
    None,
    All,
    Points(Vec<ArrayIndices>),
    Hyperslabs(Vec<ArraySubset>),
}

/// An in-memory dataspace.
///
/// Hyperslab selections are held as a set of disjoint [`ArraySubset`]s, so any sequence of [`SelectOperator`]s can be applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryDataspace {
    extent_type: ExtentType,
    shape: ArrayShape,
    max_shape: Vec<Option<u64>>,
    selection: MemorySelection,
    offset: Vec<i64>,
}

impl MemoryDataspace {
    /// Create a scalar dataspace with its single element selected.
    #[must_use]
    pub fn new_scalar() -> Self {
        Self {
            extent_type: ExtentType::Scalar,
            shape: vec![],
            max_shape: vec![],
            selection: MemorySelection::All,
            offset: vec![],
        }
    }

    /// Create a null dataspace. It has no elements.
    #[must_use]
    pub fn new_null() -> Self {
        Self {
            extent_type: ExtentType::Null,
            selection: MemorySelection::None,
            ..Self::new_scalar()
        }
    }

    fn whole(&self) -> ArraySubset {
        ArraySubset::new_with_shape(self.shape.clone())
    }

    fn require_simple(&self, operation: &str) -> Result<(), DataspaceError> {
        if self.extent_type == ExtentType::Simple {
            Ok(())
        } else {
            Err(DataspaceError::UnsupportedOperation(format!(
                "{operation} on a {:?} dataspace",
                self.extent_type
            )))
        }
    }

    fn check_rank(&self, dimensionality: usize) -> Result<(), DataspaceError> {
        if dimensionality == self.rank() {
            Ok(())
        } else {
            Err(IncompatibleDimensionalityError::new(dimensionality, self.rank()).into())
        }
    }

    fn current_blocks(&self) -> Vec<ArraySubset> {
        match &self.selection {
            MemorySelection::None | MemorySelection::Points(_) => vec![],
            MemorySelection::All => vec![self.whole()],
            MemorySelection::Hyperslabs(blocks) => blocks.clone(),
        }
    }

    fn offset_point(&self, point: &[u64]) -> Option<ArrayIndices> {
        std::iter::zip(point, &self.offset)
            .map(|(&index, &offset)| u64::try_from(i128::from(index) + i128::from(offset)).ok())
            .collect()
    }
}

fn intersects(a: &ArraySubset, b: &ArraySubset) -> bool {
    izip!(a.start(), a.shape(), b.start(), b.shape())
        .all(|(&a_start, &a_size, &b_start, &b_size)| a_start < b_start + b_size && b_start < a_start + a_size)
}

/// The smallest box containing every subset of `subsets`.
fn bounding_box(subsets: &[ArraySubset]) -> Option<ArraySubset> {
    let (first, rest) = subsets.split_first()?;
    Some(rest.iter().fold(first.clone(), |bounds, subset| union_bounds(&bounds, subset)))
}

fn union_bounds(a: &ArraySubset, b: &ArraySubset) -> ArraySubset {
    let ranges = izip!(a.start(), a.shape(), b.start(), b.shape())
        .map(|(&a_start, &a_size, &b_start, &b_size)| {
            a_start.min(b_start)..(a_start + a_size).max(b_start + b_size)
        })
        .collect_vec();
    ArraySubset::new_with_ranges(&ranges)
}

/// Subtract every subset of `others` from `subset`.
fn subtract_all(subset: &ArraySubset, others: &[ArraySubset]) -> Vec<ArraySubset> {
    let mut pieces = vec![subset.clone()];
    for other in others {
        if !pieces.iter().any(|piece| intersects(piece, other)) {
            continue;
        }
        pieces = pieces
            .iter()
            .flat_map(|piece| piece.difference(other).unwrap_or_default())
            .collect();
        if pieces.is_empty() {
            break;
        }
    }
    pieces
}

fn difference_of(a: &[ArraySubset], b: &[ArraySubset]) -> Vec<ArraySubset> {
    a.iter().flat_map(|subset| subtract_all(subset, b)).collect()
}

fn combine_blocks(
    current: Vec<ArraySubset>,
    new: Vec<ArraySubset>,
    op: SelectOperator,
) -> Vec<ArraySubset> {
    match op {
        SelectOperator::Set => new,
        SelectOperator::Or => {
            let mut bounds = bounding_box(&current);
            let mut combined = current;
            for subset in new {
                let disjoint = bounds
                    .as_ref()
                    .map_or(true, |bounds| !intersects(bounds, &subset));
                bounds = Some(match bounds {
                    Some(bounds) => union_bounds(&bounds, &subset),
                    None => subset.clone(),
                });
                if disjoint {
                    combined.push(subset);
                } else {
                    let pieces = subtract_all(&subset, &combined);
                    combined.extend(pieces);
                }
            }
            combined
        }
        SelectOperator::And => current
            .iter()
            .cartesian_product(&new)
            .filter_map(|(a, b)| a.overlap(b).ok())
            .filter(|overlap| !overlap.is_empty())
            .collect(),
        SelectOperator::NotB => difference_of(&current, &new),
        SelectOperator::NotA => difference_of(&new, &current),
        SelectOperator::Xor => {
            let mut combined = difference_of(&current, &new);
            combined.extend(difference_of(&new, &current));
            combined
        }
    }
}

impl Dataspace for MemoryDataspace {
    fn create_simple(
        shape: &[u64],
        max_shape: Option<&[Option<u64>]>,
    ) -> Result<Self, DataspaceError> {
        if shape.is_empty() {
            return Ok(Self::new_scalar());
        }
        let max_shape = match max_shape {
            Some(max_shape) => {
                if max_shape.len() != shape.len()
                    || std::iter::zip(shape, max_shape)
                        .any(|(&dim, max_dim)| max_dim.is_some_and(|max_dim| max_dim < dim))
                {
                    return Err(DataspaceError::InvalidMaxShape(
                        shape.to_vec(),
                        max_shape.to_vec(),
                    ));
                }
                max_shape.to_vec()
            }
            None => shape.iter().copied().map(Some).collect(),
        };
        Ok(Self {
            extent_type: ExtentType::Simple,
            shape: shape.to_vec(),
            max_shape,
            selection: MemorySelection::All,
            offset: vec![0; shape.len()],
        })
    }

    fn decode(encoded: &EncodedDataspace) -> Result<Self, DataspaceError> {
        let mut space = match encoded.extent_type {
            ExtentType::Simple if !encoded.shape.is_empty() => {
                Self::create_simple(&encoded.shape, Some(&encoded.max_shape))?
            }
            ExtentType::Scalar if encoded.shape.is_empty() => Self::new_scalar(),
            ExtentType::Null if encoded.shape.is_empty() => Self::new_null(),
            extent_type => {
                return Err(DataspaceError::UnsupportedOperation(format!(
                    "decoding a {extent_type:?} dataspace with shape {:?}",
                    encoded.shape
                )))
            }
        };
        match &encoded.selection {
            EncodedSelection::None => space.select_none(),
            EncodedSelection::All => space.select_all(),
            EncodedSelection::Points(points) => {
                space.select_elements(points, PointOperator::Set)?;
            }
            EncodedSelection::Hyperslabs(blocks) => space.select_blocks(blocks)?,
        }
        Ok(space)
    }

    fn encode(&self) -> Result<EncodedDataspace, DataspaceError> {
        if !self.is_selection_valid() {
            return Err(DataspaceError::InvalidSelection(self.shape.clone()));
        }
        let selection = match &self.selection {
            MemorySelection::None => EncodedSelection::None,
            MemorySelection::All => EncodedSelection::All,
            MemorySelection::Points(points) => EncodedSelection::Points(
                points
                    .iter()
                    .filter_map(|point| self.offset_point(point))
                    .collect(),
            ),
            MemorySelection::Hyperslabs(_) => EncodedSelection::Hyperslabs(self.hyperslab_blocks()?),
        };
        Ok(EncodedDataspace {
            extent_type: self.extent_type,
            shape: self.shape.clone(),
            max_shape: self.max_shape.clone(),
            selection,
        })
    }

    fn extent_type(&self) -> ExtentType {
        self.extent_type
    }

    fn shape(&self) -> &[u64] {
        &self.shape
    }

    fn max_shape(&self) -> &[Option<u64>] {
        &self.max_shape
    }

    fn select_all(&mut self) {
        self.selection = match self.extent_type {
            ExtentType::Null | ExtentType::NoClass => MemorySelection::None,
            ExtentType::Scalar | ExtentType::Simple => MemorySelection::All,
        };
    }

    fn select_none(&mut self) {
        self.selection = MemorySelection::None;
    }

    fn select_elements(
        &mut self,
        points: &[ArrayIndices],
        op: PointOperator,
    ) -> Result<(), DataspaceError> {
        self.require_simple("point selection")?;
        let validate = global_config().validate_point_selections();
        for point in points {
            self.check_rank(point.len())?;
            if validate && std::iter::zip(point, &self.shape).any(|(index, dim)| index >= dim) {
                return Err(DataspaceError::PointOutOfBounds(
                    point.clone(),
                    self.shape.clone(),
                ));
            }
        }

        let current = match std::mem::replace(&mut self.selection, MemorySelection::None) {
            MemorySelection::Points(current) => Some(current),
            _ => None,
        };
        let points = match (op, current) {
            (PointOperator::Append, Some(mut current)) => {
                current.extend_from_slice(points);
                current
            }
            (PointOperator::Prepend, Some(current)) => {
                let mut combined = points.to_vec();
                combined.extend(current);
                combined
            }
            (_, _) => points.to_vec(),
        };
        if !points.is_empty() {
            self.selection = MemorySelection::Points(points);
        }
        Ok(())
    }

    fn select_hyperslab(
        &mut self,
        hyperslab: &Hyperslab,
        op: SelectOperator,
    ) -> Result<(), DataspaceError> {
        self.require_simple("hyperslab selection")?;
        self.check_rank(hyperslab.dimensionality())?;
        if !hyperslab.is_valid() {
            return Err(DataspaceError::InvalidHyperslab(hyperslab.clone()));
        }
        if let Some(end) = hyperslab.end_exc() {
            if std::iter::zip(&end, &self.shape).any(|(end, dim)| end > dim) {
                return Err(DataspaceError::HyperslabOutOfBounds(
                    hyperslab.clone(),
                    self.shape.clone(),
                ));
            }
        }
        if matches!(self.selection, MemorySelection::Points(_)) && op != SelectOperator::Set {
            return Err(DataspaceError::UnsupportedOperation(format!(
                "combining a hyperslab with a point selection using {op:?}"
            )));
        }

        let blocks = combine_blocks(self.current_blocks(), hyperslab.blocks(), op);
        trace!(?op, blocks = blocks.len(), "select_hyperslab");
        self.selection = if blocks.is_empty() {
            MemorySelection::None
        } else {
            MemorySelection::Hyperslabs(blocks)
        };
        Ok(())
    }

    fn select_blocks(&mut self, blocks: &[ArraySubset]) -> Result<(), DataspaceError> {
        self.require_simple("hyperslab selection")?;
        for block in blocks {
            self.check_rank(block.dimensionality())?;
            if !block.inbounds_shape(&self.shape) {
                return Err(DataspaceError::InvalidSelection(self.shape.clone()));
            }
        }
        let blocks = blocks
            .iter()
            .filter(|block| !block.is_empty())
            .cloned()
            .collect_vec();
        trace!(blocks = blocks.len(), "select_blocks");
        self.selection = if blocks.is_empty() {
            MemorySelection::None
        } else {
            MemorySelection::Hyperslabs(blocks)
        };
        Ok(())
    }

    fn offset_simple(&mut self, offset: &[i64]) -> Result<(), DataspaceError> {
        self.check_rank(offset.len())?;
        self.offset = offset.to_vec();
        Ok(())
    }

    fn selection_offset(&self) -> &[i64] {
        &self.offset
    }

    fn selected_points_count(&self) -> u64 {
        match &self.selection {
            MemorySelection::None => 0,
            MemorySelection::All => product(&self.shape),
            MemorySelection::Points(points) => points.len() as u64,
            MemorySelection::Hyperslabs(blocks) => blocks.iter().map(ArraySubset::num_elements).sum(),
        }
    }

    fn selection_type(&self) -> SelectionType {
        match &self.selection {
            MemorySelection::None => SelectionType::None,
            MemorySelection::All => SelectionType::All,
            MemorySelection::Points(_) => SelectionType::Points,
            MemorySelection::Hyperslabs(_) => SelectionType::Hyperslabs,
        }
    }

    fn selection_bounds(&self) -> Result<(ArrayIndices, ArrayIndices), DataspaceError> {
        let (lower, upper): (ArrayIndices, ArrayIndices) = match &self.selection {
            MemorySelection::None => {
                return Err(DataspaceError::UnsupportedOperation(
                    "bounds of an empty selection".to_string(),
                ))
            }
            MemorySelection::All => {
                if self.shape.iter().any(|&dim| dim == 0) {
                    return Err(DataspaceError::UnsupportedOperation(
                        "bounds of an empty selection".to_string(),
                    ));
                }
                (
                    vec![0; self.rank()],
                    self.shape.iter().map(|dim| dim - 1).collect(),
                )
            }
            MemorySelection::Points(points) => (0..self.rank())
                .map(|axis| {
                    let (min, max) = points
                        .iter()
                        .map(|point| point[axis])
                        .minmax()
                        .into_option()
                        .unwrap_or_default();
                    (min, max)
                })
                .unzip(),
            MemorySelection::Hyperslabs(blocks) => (0..self.rank())
                .map(|axis| {
                    let min = blocks.iter().map(|block| block.start()[axis]).min();
                    let max = blocks
                        .iter()
                        .map(|block| block.start()[axis] + block.shape()[axis] - 1)
                        .max();
                    (min.unwrap_or_default(), max.unwrap_or_default())
                })
                .unzip(),
        };
        let lower = self
            .offset_point(&lower)
            .ok_or_else(|| DataspaceError::InvalidSelection(self.shape.clone()))?;
        let upper = self
            .offset_point(&upper)
            .ok_or_else(|| DataspaceError::InvalidSelection(self.shape.clone()))?;
        Ok((lower, upper))
    }

    fn hyperslab_blocks(&self) -> Result<Vec<ArraySubset>, DataspaceError> {
        let MemorySelection::Hyperslabs(blocks) = &self.selection else {
            return Err(DataspaceError::UnsupportedOperation(format!(
                "hyperslab blocks of a {:?} selection",
                self.selection_type()
            )));
        };
        blocks
            .iter()
            .map(|block| {
                block
                    .translate(&self.offset)
                    .ok_or_else(|| DataspaceError::InvalidSelection(self.shape.clone()))
            })
            .collect()
    }

    fn selected_indices(&self) -> Result<Vec<ArrayIndices>, DataspaceError> {
        if !self.is_selection_valid() {
            return Err(DataspaceError::InvalidSelection(self.shape.clone()));
        }
        Ok(match &self.selection {
            MemorySelection::None => vec![],
            MemorySelection::All => self
                .whole()
                .indices()
                .iter()
                .filter_map(|point| self.offset_point(&point))
                .collect(),
            MemorySelection::Points(points) => points
                .iter()
                .filter_map(|point| self.offset_point(point))
                .collect(),
            MemorySelection::Hyperslabs(_) => {
                let mut indices = self
                    .hyperslab_blocks()?
                    .iter()
                    .flat_map(|block| block.indices().iter().collect_vec())
                    .collect_vec();
                indices.par_sort_unstable();
                indices
            }
        })
    }

    fn is_selection_valid(&self) -> bool {
        if self.selected_points_count() == 0 {
            return true;
        }
        match self.selection_bounds() {
            Ok((_, upper)) => izip!(&upper, &self.shape).all(|(index, dim)| index < dim),
            Err(_) => false,
        }
    }
}
