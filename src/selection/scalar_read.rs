use crate::{dataspace::Dataspace, shape::ArrayShape};

use super::{Index, SelectionError};

/// A read of a scalar dataspace.
///
/// A scalar dataspace has one element, so the indexing arguments only decide how that element is presented to memory:
/// no arguments read the bare element, a single ellipsis reads a 0D array.
#[derive(Clone, Debug)]
pub struct ScalarReadSelection<D: Dataspace> {
    space: D,
    mshape: Option<ArrayShape>,
}

impl<D: Dataspace> ScalarReadSelection<D> {
    /// Create a scalar read of `space` with indexing arguments `args`.
    ///
    /// # Errors
    /// Returns [`SelectionError::ShapeMismatch`] if `space` is not scalar,
    /// or [`SelectionError::IllegalScalarIndex`] if `args` are neither empty nor a single ellipsis.
    pub fn new(mut space: D, args: &[Index]) -> Result<Self, SelectionError> {
        if space.rank() != 0 {
            return Err(SelectionError::ShapeMismatch {
                expected: vec![],
                got: space.shape().to_vec(),
            });
        }
        let mshape = match args {
            [] => None,
            [Index::Ellipsis] => Some(vec![]),
            _ => return Err(SelectionError::IllegalScalarIndex),
        };
        space.select_all();
        Ok(Self { space, mshape })
    }

    /// The memory shape of the read, or [`None`] if the bare element is read.
    #[must_use]
    pub fn mshape(&self) -> Option<&[u64]> {
        self.mshape.as_deref()
    }

    /// The dataspace to read from.
    #[must_use]
    pub fn dataspace(&self) -> &D {
        &self.space
    }
}
