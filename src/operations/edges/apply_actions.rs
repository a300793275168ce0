use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::topology::{EdgeRole, Mesh};

/// Concrete attribute change applied to edges of a given role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeAction {
    #[default]
    Ignore,
    Seam,
    Sharp,
    Crease,
    Bevel,
    SeamAndSharp,
}

/// Role to action mapping, one entry per tagged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeActionMap {
    pub perimeter: EdgeAction,
    pub contour: EdgeAction,
    pub guide: EdgeAction,
    pub detail: EdgeAction,
    pub fold: EdgeAction,
}

impl Default for EdgeActionMap {
    fn default() -> Self {
        Self {
            perimeter: EdgeAction::Seam,
            contour: EdgeAction::Sharp,
            guide: EdgeAction::Seam,
            detail: EdgeAction::Crease,
            fold: EdgeAction::SeamAndSharp,
        }
    }
}

impl EdgeActionMap {
    /// A mapping that ignores every role.
    #[must_use]
    pub fn ignore_all() -> Self {
        Self {
            perimeter: EdgeAction::Ignore,
            contour: EdgeAction::Ignore,
            guide: EdgeAction::Ignore,
            detail: EdgeAction::Ignore,
            fold: EdgeAction::Ignore,
        }
    }

    /// Action for a role. `None` always maps to `Ignore`.
    #[must_use]
    pub fn action(&self, role: EdgeRole) -> EdgeAction {
        match role {
            EdgeRole::None => EdgeAction::Ignore,
            EdgeRole::Perimeter => self.perimeter,
            EdgeRole::Contour => self.contour,
            EdgeRole::Guide => self.guide,
            EdgeRole::Detail => self.detail,
            EdgeRole::Fold => self.fold,
        }
    }
}

/// Writes seam / sharp / crease / bevel attributes from edge roles.
///
/// Only ever sets attributes, so applying the same map twice leaves the
/// mesh unchanged.
pub struct ApplyEdgeActions {
    map: EdgeActionMap,
}

impl ApplyEdgeActions {
    /// Creates a new `ApplyEdgeActions` operation.
    #[must_use]
    pub fn new(map: EdgeActionMap) -> Self {
        Self { map }
    }

    /// Executes the operation. Returns the number of edges acted upon.
    pub fn execute(&self, mesh: &mut Mesh) -> usize {
        let mut touched = 0;
        for (_, edge) in mesh.edges_mut() {
            match self.map.action(edge.role) {
                EdgeAction::Ignore => continue,
                EdgeAction::Seam => edge.seam = true,
                EdgeAction::Sharp => edge.sharp = true,
                EdgeAction::Crease => edge.crease = 1.0,
                EdgeAction::Bevel => edge.bevel_weight = 1.0,
                EdgeAction::SeamAndSharp => {
                    edge.seam = true;
                    edge.sharp = true;
                }
            }
            touched += 1;
        }
        debug!(edges = touched, "applied edge actions");
        touched
    }
}
