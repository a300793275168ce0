//! The ordered finishing stack.
//!
//! Every step is optional and independently configured through
//! [`FinishingParams`]. Steps always run in the same fixed order; a step
//! that fails leaves the mesh exactly as it found it and the stack moves on.

mod bevel;
mod boundary;
mod bridge;
mod decay;
mod deform;
mod fill_holes;
mod noise;
mod params;
mod plating;
mod smooth;
mod solidify;
mod symmetrize;
mod triangulate;

pub use bevel::{Bevel, BevelSelect};
pub use boundary::{boundary_loops, BoundaryLoop};
pub use bridge::BridgeLoops;
pub use decay::Decay;
pub use deform::{Bend, BendAxis, HeightFalloff, Taper};
pub use fill_holes::FillHoles;
pub use noise::SurfaceNoise;
pub use params::{
    BendParams, BevelParams, DecayParams, FillHolesParams, FinishingParams, FuseParams,
    NoiseParams, PlatingParams, SmoothParams, SolidifyParams, SymmetrizeParams, TaperParams,
};
pub use plating::Plating;
pub use smooth::Smooth;
pub use solidify::Solidify;
pub use symmetrize::{MirrorPlane, Symmetrize};
pub use triangulate::Triangulate;

use tracing::{debug, warn};

use crate::error::OpResult;
use crate::manifest::SlotManifest;
use crate::topology::Mesh;

/// Read-only inputs shared by every finishing step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Resolved slot table.
    pub manifest: &'a SlotManifest,
    /// Global scale; lengths in step parameters are multiplied by it.
    pub scale: f64,
    /// Run seed.
    pub seed: u64,
}

/// One step of the finishing stack.
pub trait FinishingStep {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Applies the step to the mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the step cannot complete; the stack then restores
    /// the mesh and skips the step.
    fn apply(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> OpResult<()>;
}

/// Always-on step that refreshes face and vertex normals.
struct RecomputeNormals;

impl FinishingStep for RecomputeNormals {
    fn name(&self) -> &'static str {
        "recompute_normals"
    }

    fn apply(&self, mesh: &mut Mesh, _ctx: &StepContext<'_>) -> OpResult<()> {
        mesh.recompute_normals();
        Ok(())
    }
}

/// What happened to each step of a stack run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishingReport {
    /// Steps that completed, in order.
    pub applied: Vec<&'static str>,
    /// Steps that failed and were rolled back, with the reason.
    pub skipped: Vec<(&'static str, String)>,
}

/// The configured sequence of finishing steps.
pub struct FinishingStack {
    steps: Vec<Box<dyn FinishingStep>>,
}

impl FinishingStack {
    /// Builds the stack from parameters.
    ///
    /// Order: fuse, recompute normals, concave fillet, solidify, bridge,
    /// fill holes, symmetrize, taper, bend, plate, noise, smooth, decay,
    /// triangulate, chamfer.
    #[must_use]
    pub fn from_params(config: &FinishingParams) -> Self {
        let mut steps: Vec<Box<dyn FinishingStep>> = Vec::new();
        if let Some(fuse) = config.fuse {
            steps.push(Box::new(fuse));
        }
        steps.push(Box::new(RecomputeNormals));
        if let Some(fillet) = config.concave_fillet {
            steps.push(Box::new(params::ConcaveFillet(fillet)));
        }
        if let Some(p) = config.solidify {
            steps.push(Box::new(p));
        }
        if config.bridge {
            steps.push(Box::new(params::Bridge));
        }
        if let Some(p) = config.fill_holes {
            steps.push(Box::new(p));
        }
        if let Some(p) = config.symmetrize {
            steps.push(Box::new(p));
        }
        if let Some(p) = config.taper {
            steps.push(Box::new(p));
        }
        if let Some(p) = config.bend {
            steps.push(Box::new(p));
        }
        if let Some(p) = config.plating {
            steps.push(Box::new(p));
        }
        if let Some(p) = config.noise {
            steps.push(Box::new(p));
        }
        if let Some(p) = config.smooth {
            steps.push(Box::new(p));
        }
        if let Some(p) = config.decay {
            steps.push(Box::new(p));
        }
        if config.triangulate {
            steps.push(Box::new(params::TriangulateStep));
        }
        if let Some(chamfer) = config.chamfer {
            steps.push(Box::new(params::Chamfer(chamfer)));
        }
        Self { steps }
    }

    /// Names of the configured steps, in run order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs every step in order.
    ///
    /// The mesh is snapshotted before each step; a failing step is rolled
    /// back, logged and recorded in the report, and the run continues.
    pub fn execute(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> FinishingReport {
        let mut report = FinishingReport::default();
        for step in &self.steps {
            let snapshot = mesh.clone();
            match step.apply(mesh, ctx) {
                Ok(()) => {
                    debug!(
                        step = step.name(),
                        vertices = mesh.vertex_count(),
                        faces = mesh.face_count(),
                        "finishing step applied"
                    );
                    report.applied.push(step.name());
                }
                Err(e) => {
                    warn!(step = step.name(), error = %e, "finishing step skipped");
                    *mesh = snapshot;
                    report.skipped.push((step.name(), e.to_string()));
                }
            }
        }
        report
    }
}
