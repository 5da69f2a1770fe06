use std::iter::FusedIterator;

use itertools::izip;
use tracing::debug;

use crate::{
    dataspace::{Dataspace, DataspaceError, Hyperslab, SelectOperator},
    shape::{product, unravel_index, ArrayShape, IncompatibleBroadcastError},
};

use super::{Selection, SelectionError, SelectionKind, SimpleHyperslab};

/// An iterator over the dataspaces of a broadcast transfer.
///
/// Created by [`Selection::broadcast`].
/// Dataspaces are yielded in row-major order of the repetitions of the source array.
/// Each yielded dataspace is an independent copy.
#[derive(Debug)]
pub struct Broadcast<D: Dataspace> {
    state: BroadcastState<D>,
}

#[derive(Debug)]
enum BroadcastState<D: Dataspace> {
    Once(Option<D>),
    Tiled(Tiles<D>),
}

/// A tile (the expanded source shape) repeated over the selection.
#[derive(Debug)]
struct Tiles<D: Dataspace> {
    template: D,
    axes: Vec<TileAxis>,
    grid: ArrayShape,
    index: u64,
    length: u64,
}

/// The placement of a tile along one axis.
#[derive(Debug)]
struct TileAxis {
    start: u64,
    stride: u64,
    block: u64,
    repeated: bool,
}

impl TileAxis {
    /// The offset of the `position`th tile.
    fn offset(&self, position: u64) -> u64 {
        if self.repeated {
            self.start + (position / self.block) * self.stride + position % self.block
        } else {
            self.start
        }
    }
}

impl<D: Dataspace> Broadcast<D> {
    pub(super) fn new(selection: &Selection<D>, source_shape: &[u64]) -> Result<Self, SelectionError> {
        let hyperslab = match &selection.kind {
            SelectionKind::Points | SelectionKind::Fancy { .. } => {
                selection.expand_shape(source_shape)?;
                return Ok(Self::once(selection.space.clone()));
            }
            SelectionKind::Simple(hyperslab) => hyperslab,
        };

        if selection.shape.is_empty() {
            if product(source_shape) != 1 {
                return Err(IncompatibleBroadcastError::new(source_shape.to_vec(), vec![]).into());
            }
            let mut space = selection.space.clone();
            space.select_all();
            return Ok(Self::once(space));
        }

        let tile_shape = selection.expand_shape(source_shape)?;
        let (axes, grid) = tile_axes(hyperslab, &tile_shape);
        let length = product(&grid);
        debug!(?source_shape, ?tile_shape, blocks = length, "broadcast");
        if length == 0 {
            return Ok(Self {
                state: BroadcastState::Once(None),
            });
        } else if length == 1 {
            return Ok(Self::once(selection.space.clone()));
        }

        let mut template = selection.space.clone();
        let (count, block): (Vec<u64>, Vec<u64>) = std::iter::zip(hyperslab.count(), &axes)
            .map(|(&count, axis)| {
                if axis.repeated {
                    (1, 1)
                } else {
                    (count, axis.block)
                }
            })
            .unzip();
        let stride = axes.iter().map(|axis| axis.stride).collect();
        let tile = Hyperslab::new(vec![0; axes.len()], count)
            .with_stride(stride)
            .with_block(block);
        template.select_hyperslab(&tile, SelectOperator::Set)?;

        Ok(Self {
            state: BroadcastState::Tiled(Tiles {
                template,
                axes,
                grid,
                index: 0,
                length,
            }),
        })
    }

    fn once(space: D) -> Self {
        Self {
            state: BroadcastState::Once(Some(space)),
        }
    }
}

/// Split each axis of a simple selection into tiles of the expanded source shape.
///
/// Returns the tile placement of each axis and the number of tiles along each axis.
/// An axis of the tile is either the full selected axis or a single element.
fn tile_axes(hyperslab: &SimpleHyperslab, tile_shape: &[u64]) -> (Vec<TileAxis>, ArrayShape) {
    izip!(
        hyperslab.start(),
        hyperslab.stride(),
        hyperslab.count(),
        hyperslab.block(),
        tile_shape
    )
    .map(|(&start, &stride, &count, &block, &tile)| {
        let elements = count * block;
        let repeated = tile == 1 && elements != 1;
        let axis = TileAxis {
            start,
            stride,
            block,
            repeated,
        };
        (axis, if repeated { elements } else { 1 })
    })
    .unzip()
}

impl<D: Dataspace> Iterator for Broadcast<D> {
    type Item = Result<D, SelectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            BroadcastState::Once(space) => space.take().map(Ok),
            BroadcastState::Tiled(tiles) => {
                if tiles.index >= tiles.length {
                    return None;
                }
                let position = unravel_index(tiles.index, &tiles.grid);
                tiles.index += 1;
                let offset = std::iter::zip(&tiles.axes, position)
                    .map(|(axis, position)| i64::try_from(axis.offset(position)))
                    .collect::<Result<Vec<_>, _>>();
                let mut space = tiles.template.clone();
                Some(match offset {
                    Ok(offset) => space.offset_simple(&offset).map(|()| space).map_err(Into::into),
                    Err(_) => Err(DataspaceError::InvalidSelection(space.shape().to_vec()).into()),
                })
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match &self.state {
            BroadcastState::Once(space) => usize::from(space.is_some()),
            BroadcastState::Tiled(tiles) => {
                usize::try_from(tiles.length - tiles.index).unwrap_or(usize::MAX)
            }
        };
        (remaining, Some(remaining))
    }
}

impl<D: Dataspace> ExactSizeIterator for Broadcast<D> {}

impl<D: Dataspace> FusedIterator for Broadcast<D> {}
