use crate::math::polygon_3d::signed_area_2d;
use crate::topology::{Mesh, SLOT_COUNT};

/// Surface and UV areas of a mesh, split by material slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotAreas {
    /// Total surface area.
    pub total: f64,
    /// Surface area per slot.
    pub surface: [f64; SLOT_COUNT],
    /// UV-space area per slot.
    pub uv: [f64; SLOT_COUNT],
}

/// Computes surface and UV areas per material slot.
pub struct Area;

impl Area {
    /// Creates a new `Area` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self, mesh: &Mesh) -> SlotAreas {
        let mut areas = SlotAreas {
            total: 0.0,
            surface: [0.0; SLOT_COUNT],
            uv: [0.0; SLOT_COUNT],
        };
        for (id, face) in mesh.faces() {
            let slot = usize::from(face.material_slot).min(SLOT_COUNT - 1);
            let area = mesh.face_area(id).unwrap_or(0.0);
            areas.total += area;
            areas.surface[slot] += area;

            let uvs: Vec<_> = face
                .corners
                .iter()
                .filter_map(|&c| mesh.corner(c).ok().map(|c| c.uv))
                .collect();
            areas.uv[slot] += signed_area_2d(&uvs).abs();
        }
        areas
    }
}

impl Default for Area {
    fn default() -> Self {
        Self::new()
    }
}
