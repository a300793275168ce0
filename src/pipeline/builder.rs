use std::collections::BTreeMap;

use crate::error::CollaboratorError;
use crate::manifest::SlotMeta;
use crate::topology::Mesh;

/// Source of the raw geometry for a run.
///
/// Implementations fill an empty mesh with faces tagged by material slot
/// and, optionally, with pre-assigned edge roles, and describe the slots
/// they used.
pub trait ShapeBuilder {
    /// Populates `mesh`.
    ///
    /// # Errors
    ///
    /// Any error aborts the run.
    fn build_shape(&self, mesh: &mut Mesh) -> Result<(), CollaboratorError>;

    /// Sparse per-slot metadata. Slots not listed take the defaults.
    ///
    /// # Errors
    ///
    /// Any error aborts the run.
    fn slot_meta(&self) -> Result<BTreeMap<u8, SlotMeta>, CollaboratorError> {
        Ok(BTreeMap::new())
    }
}

/// Builder that hands out a copy of an already built mesh.
#[derive(Debug, Clone, Default)]
pub struct PrebuiltShape {
    mesh: Mesh,
    slots: BTreeMap<u8, SlotMeta>,
}

impl PrebuiltShape {
    /// Creates a builder over `mesh`.
    #[must_use]
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            slots: BTreeMap::new(),
        }
    }

    /// Sets the metadata of one slot.
    #[must_use]
    pub fn with_slot(mut self, slot: u8, meta: SlotMeta) -> Self {
        self.slots.insert(slot, meta);
        self
    }
}

impl ShapeBuilder for PrebuiltShape {
    fn build_shape(&self, mesh: &mut Mesh) -> Result<(), CollaboratorError> {
        mesh.clone_from(&self.mesh);
        Ok(())
    }

    fn slot_meta(&self) -> Result<BTreeMap<u8, SlotMeta>, CollaboratorError> {
        Ok(self.slots.clone())
    }
}
