use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Area, Volume};
use crate::manifest::SlotManifest;
use crate::topology::{Mesh, SLOT_COUNT};

/// Below this the mesh is treated as having no volume.
pub const VOLUME_EPSILON: f64 = 1e-9;

/// Physics-material densities in kg/m³.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityTable {
    pub densities: HashMap<String, f64>,
    /// Used for empty or unknown keys.
    pub fallback: f64,
}

impl Default for DensityTable {
    fn default() -> Self {
        let densities = [
            ("steel", 7850.0),
            ("iron", 7870.0),
            ("aluminum", 2700.0),
            ("copper", 8960.0),
            ("brass", 8500.0),
            ("concrete", 2400.0),
            ("stone", 2600.0),
            ("glass", 2500.0),
            ("wood", 700.0),
            ("plastic", 950.0),
            ("rubber", 1100.0),
            ("fabric", 300.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
        Self {
            densities,
            fallback: 1000.0,
        }
    }
}

impl DensityTable {
    /// Density for a physics-material key.
    #[must_use]
    pub fn density(&self, key: &str) -> f64 {
        if let Some(&d) = self.densities.get(key) {
            return d;
        }
        if !key.is_empty() {
            debug!(key, fallback = self.fallback, "unknown physics material");
        }
        self.fallback
    }
}

/// Volume, mass and area statistics of a finished mesh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhysicalStats {
    pub volume: f64,
    pub mass: f64,
    pub surface_area: f64,
    pub per_slot_area: BTreeMap<u8, f64>,
    /// UV area over surface area, for slots with faces.
    pub per_slot_uv_area_ratio: BTreeMap<u8, f64>,
}

/// Computes [`PhysicalStats`].
///
/// Mass applies the area-weighted mixture of slot densities to the whole
/// enclosed volume.
pub struct CalculatePhysicalStats<'a> {
    manifest: &'a SlotManifest,
    densities: &'a DensityTable,
}

impl<'a> CalculatePhysicalStats<'a> {
    /// Creates a new `CalculatePhysicalStats` query.
    #[must_use]
    pub fn new(manifest: &'a SlotManifest, densities: &'a DensityTable) -> Self {
        Self {
            manifest,
            densities,
        }
    }

    /// Executes the query.
    #[must_use]
    pub fn execute(&self, mesh: &Mesh) -> PhysicalStats {
        let volume = Volume::new().execute(mesh);
        let areas = Area::new().execute(mesh);

        let mut stats = PhysicalStats {
            volume,
            surface_area: areas.total,
            ..PhysicalStats::default()
        };

        let mut mixture = 0.0;
        for (slot, &area) in (0u8..).zip(areas.surface.iter()).take(SLOT_COUNT) {
            if area <= 0.0 {
                continue;
            }
            stats.per_slot_area.insert(slot, area);
            stats
                .per_slot_uv_area_ratio
                .insert(slot, areas.uv[usize::from(slot)] / area);
            if areas.total > 0.0 {
                let key = &self.manifest.entry(slot).physics_material_key;
                mixture += area / areas.total * self.densities.density(key);
            }
        }

        stats.mass = if volume.abs() < VOLUME_EPSILON {
            0.0
        } else {
            volume * mixture
        };
        stats
    }
}
