//! Region references.
//!
//! A [`RegionReference`] is a storable value describing a selection of a dataset: the extent of the dataset and the selected elements.
//! It is resolved back into a dataspace by a [`DatasetContext`].

use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};

use crate::{
    dataspace::{Dataspace, DataspaceError, EncodedDataspace},
    selection::SelectionError,
};

/// A reference to a selected region of a dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Deref, From)]
pub struct RegionReference(EncodedDataspace);

impl RegionReference {
    /// Create a region reference to the current selection of `space`.
    ///
    /// # Errors
    /// Returns a [`DataspaceError`] if the selection of `space` is not within its extent.
    pub fn new<D: Dataspace>(space: &D) -> Result<Self, DataspaceError> {
        Ok(Self(space.encode()?))
    }

    /// The encoded dataspace.
    #[must_use]
    pub fn encoded(&self) -> &EncodedDataspace {
        &self.0
    }

    /// Serialise the region reference.
    ///
    /// # Errors
    /// Returns a [`serde_json::Error`] if serialisation fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialise a region reference.
    ///
    /// # Errors
    /// Returns a [`serde_json::Error`] if `bytes` is not a valid region reference.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// The dataset a selection is made on.
///
/// Supplies the dataspace of the dataset and resolves region references.
pub trait DatasetContext<D: Dataspace> {
    /// Return a copy of the dataspace of the dataset.
    ///
    /// # Errors
    /// Returns a [`SelectionError`] if the dataspace cannot be retrieved.
    fn dataspace(&self) -> Result<D, SelectionError>;

    /// Resolve a region reference into a dataspace with the referenced selection.
    ///
    /// # Errors
    /// Returns a [`SelectionError`] if the region reference is invalid.
    fn resolve_region(&self, reference: &RegionReference) -> Result<D, SelectionError> {
        Ok(D::decode(reference.encoded())?)
    }
}

#[cfg(test)]
mod tests {
    use crate::dataspace::{
        EncodedSelection, ExtentType, Hyperslab, MemoryDataspace, SelectOperator,
    };

    use super::*;

    #[test]
    fn region_reference_bytes() {
        let mut space = MemoryDataspace::create_simple(&[4, 4], None).unwrap();
        space
            .select_hyperslab(&Hyperslab::new(vec![1, 1], vec![2, 2]), SelectOperator::Set)
            .unwrap();
        let reference = RegionReference::new(&space).unwrap();
        assert_eq!(reference.extent_type, ExtentType::Simple);
        assert!(matches!(reference.selection, EncodedSelection::Hyperslabs(_)));

        let bytes = reference.to_bytes().unwrap();
        let decoded = RegionReference::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, reference);
        assert!(RegionReference::from_bytes(b"{}").is_err());
    }

    #[test]
    fn region_reference_invalid_selection() {
        let mut space = MemoryDataspace::create_simple(&[4], None).unwrap();
        space
            .select_hyperslab(&Hyperslab::new(vec![2], vec![2]), SelectOperator::Set)
            .unwrap();
        space.offset_simple(&[1]).unwrap();
        assert!(matches!(
            RegionReference::new(&space),
            Err(DataspaceError::InvalidSelection(_))
        ));
    }
}
