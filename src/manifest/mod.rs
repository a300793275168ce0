//! Per-slot configuration.
//!
//! A shape builder reports sparse metadata for the material slots it uses;
//! [`SlotManifest::resolve`] turns it into a dense table of [`SLOT_COUNT`]
//! entries so later stages can index it directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::topology::SLOT_COUNT;

/// How UVs are generated for the faces of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UvMode {
    /// Leave the existing UVs untouched.
    #[default]
    Skip,
    /// Per-face planar projection on the dominant axis.
    Box,
    /// Cylindrical projection around X.
    TubeX,
    /// Cylindrical projection around Y.
    TubeY,
    /// Cylindrical projection around Z.
    TubeZ,
    /// Planar projection of the whole slot, normalised to its bounds.
    Fit,
    /// Seam-bounded charts, each flattened on its own plane.
    Unwrap,
}

/// Metadata for one slot as reported by a shape builder.
///
/// Every field is optional in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotMeta {
    pub name: String,
    pub uv_mode: UvMode,
    pub uv_scale: f64,
    pub physics_material_key: String,
    pub protect: bool,
    pub inflate_offset: f64,
    /// Faces of this slot are socket markers.
    pub sock: bool,
}

impl Default for SlotMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            uv_mode: UvMode::Skip,
            uv_scale: 1.0,
            physics_material_key: String::new(),
            protect: false,
            inflate_offset: 0.0,
            sock: false,
        }
    }
}

/// Resolved, read-only configuration of one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotConfig {
    pub name: String,
    pub uv_mode: UvMode,
    pub uv_scale: f64,
    pub physics_material_key: String,
    pub protect: bool,
    pub inflate_offset: f64,
    pub sock: bool,
}

impl SlotConfig {
    fn unnamed(slot: usize) -> Self {
        Self::from_meta(slot, &SlotMeta::default())
    }

    fn from_meta(slot: usize, meta: &SlotMeta) -> Self {
        let name = if meta.name.is_empty() {
            format!("slot_{slot}")
        } else {
            meta.name.clone()
        };
        let uv_scale = if meta.uv_scale.is_finite() && meta.uv_scale > 0.0 {
            meta.uv_scale
        } else {
            1.0
        };
        Self {
            name,
            uv_mode: meta.uv_mode,
            uv_scale,
            physics_material_key: meta.physics_material_key.clone(),
            protect: meta.protect,
            inflate_offset: if meta.inflate_offset.is_finite() {
                meta.inflate_offset
            } else {
                0.0
            },
            sock: meta.sock,
        }
    }
}

/// Dense table of slot configurations, one entry per slot `0..SLOT_COUNT`.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotManifest {
    entries: [SlotConfig; SLOT_COUNT],
}

impl Default for SlotManifest {
    fn default() -> Self {
        Self {
            entries: std::array::from_fn(SlotConfig::unnamed),
        }
    }
}

impl SlotManifest {
    /// Builds the dense table from sparse metadata.
    ///
    /// Missing slots take the defaults; entries for slots outside the valid
    /// range are ignored.
    #[must_use]
    pub fn resolve(meta: &BTreeMap<u8, SlotMeta>) -> Self {
        let mut manifest = Self::default();
        for (&slot, entry) in meta {
            let index = usize::from(slot);
            if index >= SLOT_COUNT {
                debug!(slot, "ignoring metadata for out-of-range slot");
                continue;
            }
            manifest.entries[index] = SlotConfig::from_meta(index, entry);
        }
        manifest
    }

    /// Configuration of a slot. Out-of-range slots read the last entry.
    #[must_use]
    pub fn entry(&self, slot: u8) -> &SlotConfig {
        &self.entries[usize::from(slot).min(SLOT_COUNT - 1)]
    }

    /// Returns `true` if the slot is flagged protected.
    #[must_use]
    pub fn is_protected(&self, slot: u8) -> bool {
        self.entry(slot).protect
    }

    /// Slots flagged as socket markers.
    #[must_use]
    pub fn socket_slots(&self) -> Vec<u8> {
        (0..SLOT_COUNT)
            .filter(|&i| self.entries[i].sock)
            .filter_map(|i| u8::try_from(i).ok())
            .collect()
    }

    /// Iterates over `(slot, config)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &SlotConfig)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, c)| u8::try_from(i).ok().map(|s| (s, c)))
    }
}
