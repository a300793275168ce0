use serde::{Deserialize, Serialize};

use super::face::FaceId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the mesh arena.
    pub struct EdgeId;
}

/// Semantic role of an edge, as authored by the shape builder or inferred
/// by the classifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum EdgeRole {
    /// Untagged.
    #[default]
    None = 0,
    /// Open boundary of the shell.
    Perimeter = 1,
    /// Shading-sharp silhouette edge.
    Contour = 2,
    /// Construction guide line.
    Guide = 3,
    /// Surface detail line.
    Detail = 4,
    /// Fold line.
    Fold = 5,
}

impl EdgeRole {
    /// All non-`None` roles, in index order.
    pub const TAGGED: [Self; 5] = [
        Self::Perimeter,
        Self::Contour,
        Self::Guide,
        Self::Detail,
        Self::Fold,
    ];

    /// Converts an integer tag into a role. Values above 5 map to `None`.
    #[must_use]
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => Self::Perimeter,
            2 => Self::Contour,
            3 => Self::Guide,
            4 => Self::Detail,
            5 => Self::Fold,
            _ => Self::None,
        }
    }

    /// Integer tag of this role.
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Returns `true` for any role other than `None`.
    #[must_use]
    pub fn is_tagged(self) -> bool {
        self != Self::None
    }
}

/// Data associated with a mesh edge.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Endpoints, stored in ascending id order.
    pub vertices: [VertexId; 2],
    /// Faces using this edge.
    pub faces: Vec<FaceId>,
    /// Semantic role tag.
    pub role: EdgeRole,
    /// UV seam flag.
    pub seam: bool,
    /// Sharp shading flag.
    pub sharp: bool,
    /// Subdivision crease weight in `[0, 1]`.
    pub crease: f64,
    /// Bevel weight in `[0, 1]`.
    pub bevel_weight: f64,
}

impl EdgeData {
    /// Creates an untagged edge between two vertices.
    #[must_use]
    pub fn new(vertices: [VertexId; 2]) -> Self {
        Self {
            vertices,
            faces: Vec::new(),
            role: EdgeRole::None,
            seam: false,
            sharp: false,
            crease: 0.0,
            bevel_weight: 0.0,
        }
    }

    /// Returns `true` if the edge has exactly one adjacent face.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.faces.len() == 1
    }

    /// Returns `true` if the edge has exactly two adjacent faces.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.faces.len() == 2
    }

    /// The endpoint opposite to `v`.
    #[must_use]
    pub fn other(&self, v: VertexId) -> VertexId {
        if self.vertices[0] == v {
            self.vertices[1]
        } else {
            self.vertices[0]
        }
    }

    /// Copies the authored attributes (role and flags) from another edge,
    /// keeping the stronger of each.
    pub fn merge_attributes(&mut self, other: &Self) {
        if !self.role.is_tagged() {
            self.role = other.role;
        }
        self.seam |= other.seam;
        self.sharp |= other.sharp;
        self.crease = self.crease.max(other.crease);
        self.bevel_weight = self.bevel_weight.max(other.bevel_weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_index_round_trips() {
        for role in EdgeRole::TAGGED {
            assert_eq!(EdgeRole::from_index(role.index()), role);
        }
        assert_eq!(EdgeRole::from_index(0), EdgeRole::None);
        assert_eq!(EdgeRole::from_index(42), EdgeRole::None);
    }

    #[test]
    fn role_values_match_tags() {
        assert_eq!(EdgeRole::Perimeter.index(), 1);
        assert_eq!(EdgeRole::Contour.index(), 2);
        assert_eq!(EdgeRole::Fold.index(), 5);
    }
}
