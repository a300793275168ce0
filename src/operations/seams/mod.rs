//! UV seam placement.
//!
//! Driver strategies (angle, material boundary, role mask, planar
//! clusters) add cuts on top of the seams already on the mesh and are
//! combined by union; a flatness cleanup then drops seams between coplanar
//! faces of the same slot. Unrolling styles (tube, organic, strip) own the
//! whole seam layout: when one is configured the drivers are ignored,
//! existing seams are cleared, and no cleanup runs.

mod charts;
mod drivers;
mod styles;

pub use charts::planar_charts;

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::error::{ConfigError, OpResult};
use crate::topology::{EdgeId, EdgeRole, Mesh};

/// Edge set produced by a strategy.
pub(crate) type CutSet = SecondaryMap<EdgeId, ()>;

/// Which sign of dihedral angle an angle cut accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleBias {
    #[default]
    Any,
    ConvexOnly,
    ConcaveOnly,
}

/// World axis used by the unrolling styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// One way of choosing seam edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SeamStrategy {
    /// Cut edges whose dihedral angle exceeds a threshold.
    Angle {
        threshold_deg: f64,
        #[serde(default)]
        bias: AngleBias,
    },
    /// Cut between faces of different slots.
    MaterialBoundary,
    /// Cut edges carrying one of the roles.
    RoleMask { roles: Vec<EdgeRole> },
    /// Cut the borders of near-planar charts.
    Cluster { max_angle_deg: f64 },
    /// Caps plus one lengthwise cut around an axis.
    Tube {
        #[serde(default)]
        axis: Axis,
    },
    /// Curvature charts plus every perimeter edge.
    Organic { max_angle_deg: f64 },
    /// Lengthwise cuts along an axis.
    Strip {
        #[serde(default)]
        axis: Axis,
    },
}

impl SeamStrategy {
    /// Returns `true` for styles that replace the whole seam layout.
    #[must_use]
    pub fn owns_seams(&self) -> bool {
        matches!(self, Self::Tube { .. } | Self::Organic { .. } | Self::Strip { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Angle { .. } => "angle",
            Self::MaterialBoundary => "material_boundary",
            Self::RoleMask { .. } => "role_mask",
            Self::Cluster { .. } => "cluster",
            Self::Tube { .. } => "tube",
            Self::Organic { .. } => "organic",
            Self::Strip { .. } => "strip",
        }
    }

    fn cuts(&self, mesh: &Mesh) -> OpResult<CutSet> {
        match self {
            Self::Angle { threshold_deg, bias } => Ok(drivers::angle_cuts(mesh, threshold_deg.to_radians(), *bias)),
            Self::MaterialBoundary => drivers::material_cuts(mesh),
            Self::RoleMask { roles } => Ok(drivers::role_cuts(mesh, roles)),
            Self::Cluster { max_angle_deg } => charts::chart_cuts(mesh, max_angle_deg.to_radians()),
            Self::Tube { axis } => styles::tube_cuts(mesh, *axis),
            Self::Organic { max_angle_deg } => styles::organic_cuts(mesh, max_angle_deg.to_radians()),
            Self::Strip { axis } => styles::strip_cuts(mesh, *axis),
        }
    }
}

/// Seam solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeamParams {
    pub strategies: Vec<SeamStrategy>,
    /// Seams between same-slot faces closer to coplanar than this are dropped.
    pub flat_tolerance_deg: f64,
}

impl Default for SeamParams {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
            flat_tolerance_deg: 1.0,
        }
    }
}

impl SeamParams {
    /// Checks angles against their accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("seams.flat_tolerance_deg", self.flat_tolerance_deg, 0.0, 180.0)?;
        for strategy in &self.strategies {
            match strategy {
                SeamStrategy::Angle { threshold_deg, .. } => {
                    ConfigError::check_range("seams.threshold_deg", *threshold_deg, 0.0, 180.0)?;
                }
                SeamStrategy::Cluster { max_angle_deg } | SeamStrategy::Organic { max_angle_deg } => {
                    ConfigError::check_range("seams.max_angle_deg", *max_angle_deg, 0.0, 180.0)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Counts from one seam solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeamReport {
    /// Edges marked as seams by the strategies.
    pub cut: usize,
    /// Seams removed by the flatness cleanup.
    pub cleaned: usize,
    /// Seam edges on the mesh afterwards.
    pub total: usize,
}

/// Places UV seams according to [`SeamParams`].
pub struct SolveSeams<'a> {
    params: &'a SeamParams,
}

impl<'a> SolveSeams<'a> {
    /// Creates a new `SolveSeams` operation.
    #[must_use]
    pub fn new(params: &'a SeamParams) -> Self {
        Self { params }
    }

    /// Executes the solver.
    ///
    /// # Errors
    ///
    /// Returns an error if a strategy meets a missing entity.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<SeamReport> {
        let mut report = SeamReport::default();
        let owner = self.params.strategies.iter().find(|s| s.owns_seams());

        if let Some(owner) = owner {
            let skipped = self.params.strategies.len() - 1;
            if skipped > 0 {
                warn!(style = owner.name(), skipped, "unrolling style owns seams; other strategies ignored");
            }
            let cuts = owner.cuts(mesh)?;
            for (id, edge) in mesh.edges_mut() {
                edge.seam = cuts.contains_key(id);
            }
            report.cut = cuts.len();
        } else {
            let mut union = CutSet::new();
            for strategy in &self.params.strategies {
                let cuts = strategy.cuts(mesh)?;
                debug!(strategy = strategy.name(), edges = cuts.len(), "seam strategy");
                for (id, ()) in cuts {
                    union.insert(id, ());
                }
            }
            for (id, ()) in &union {
                mesh.edge_mut(id)?.seam = true;
            }
            report.cut = union.len();
            report.cleaned = remove_flat_seams(mesh, self.params.flat_tolerance_deg.to_radians())?;
        }

        report.total = mesh.edges().filter(|(_, e)| e.seam).count();
        debug!(cut = report.cut, cleaned = report.cleaned, total = report.total, "seams solved");
        Ok(report)
    }
}

/// Clears seams between two same-slot faces meeting within `tolerance`.
fn remove_flat_seams(mesh: &mut Mesh, tolerance: f64) -> OpResult<usize> {
    let mut flat = Vec::new();
    for (id, edge) in mesh.edges() {
        let &[fa, fb] = edge.faces.as_slice() else {
            continue;
        };
        if !edge.seam || mesh.face(fa)?.material_slot != mesh.face(fb)?.material_slot {
            continue;
        }
        if mesh.dihedral_angle(id).is_some_and(|a| a.abs() <= tolerance) {
            flat.push(id);
        }
    }
    for &id in &flat {
        mesh.edge_mut(id)?.seam = false;
    }
    Ok(flat.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeGrid, MakeTube};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube() -> Mesh {
        let mut mesh = Mesh::new();
        MakeBox::new(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))
            .execute(&mut mesh)
            .unwrap();
        mesh
    }

    #[test]
    fn strategies_combine_by_union() {
        let mut mesh = Mesh::new();
        MakeGrid::new(p(0.0, 0.0, 0.0), 3.0, 1.0, 3, 1)
            .execute(&mut mesh)
            .unwrap();
        let faces = mesh.face_ids();
        mesh.face_mut(faces[2]).unwrap().material_slot = 1;
        let guide = mesh.face_edges(faces[0]).unwrap()[1];
        mesh.edge_mut(guide).unwrap().role = EdgeRole::Guide;

        let params = SeamParams {
            strategies: vec![
                SeamStrategy::MaterialBoundary,
                SeamStrategy::RoleMask {
                    roles: vec![EdgeRole::Guide],
                },
            ],
            ..SeamParams::default()
        };
        let report = SolveSeams::new(&params).execute(&mut mesh).unwrap();
        assert_eq!(report.cut, 2);
        // The guide edge joins coplanar same-slot faces and is cleaned up.
        assert_eq!(report.cleaned, 1);
        assert_eq!(report.total, 1);
    }

    #[test]
    fn angle_cuts_every_cube_edge() {
        let mut mesh = cube();
        let params = SeamParams {
            strategies: vec![SeamStrategy::Angle {
                threshold_deg: 30.0,
                bias: AngleBias::Any,
            }],
            ..SeamParams::default()
        };
        assert_eq!(SolveSeams::new(&params).execute(&mut mesh).unwrap().total, 12);
    }

    #[test]
    fn existing_seams_survive_drivers() {
        let mut mesh = cube();
        let first = mesh.edge_ids()[0];
        mesh.edge_mut(first).unwrap().seam = true;
        let params = SeamParams {
            strategies: vec![SeamStrategy::Angle {
                threshold_deg: 30.0,
                bias: AngleBias::ConcaveOnly,
            }],
            ..SeamParams::default()
        };
        let report = SolveSeams::new(&params).execute(&mut mesh).unwrap();
        assert_eq!(report.cut, 0);
        assert_eq!(report.total, 1);
    }

    #[test]
    fn ownership_style_replaces_drivers() {
        let mut mesh = Mesh::new();
        MakeTube::new(p(0.0, 0.0, 0.0), 1.0, 2.0)
            .with_resolution(8, 2)
            .with_caps(true)
            .execute(&mut mesh)
            .unwrap();
        for (_, e) in mesh.edges_mut() {
            e.seam = true;
        }
        let params = SeamParams {
            strategies: vec![
                SeamStrategy::MaterialBoundary,
                SeamStrategy::Tube { axis: Axis::Z },
            ],
            ..SeamParams::default()
        };
        let report = SolveSeams::new(&params).execute(&mut mesh).unwrap();
        // Two cap rings of 8 plus one lengthwise line of 2.
        assert_eq!(report.total, 18);
        assert_eq!(report.cleaned, 0);
    }

    #[test]
    fn strategies_parse_from_json() {
        let params: SeamParams = serde_json::from_str(
            r#"{ "strategies": [
                { "strategy": "angle", "threshold_deg": 45.0, "bias": "convex_only" },
                { "strategy": "role_mask", "roles": ["Perimeter", "Fold"] },
                { "strategy": "strip" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(params.strategies.len(), 3);
        assert!(params.strategies[2].owns_seams());
        assert_eq!(params.strategies[2], SeamStrategy::Strip { axis: Axis::Z });
    }
}
