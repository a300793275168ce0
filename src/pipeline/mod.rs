//! End-to-end run: raw shape in, finished mesh, sockets and stats out.
//!
//! Stages run strictly in order on a mesh owned by the run. Finishing
//! steps recover from their own failures; any other error aborts the run
//! and the partially processed mesh is dropped.

mod builder;
mod config;
mod context;

pub use builder::{PrebuiltShape, ShapeBuilder};
pub use config::PipelineConfig;
pub use context::PipelineContext;

use tracing::{debug, info};

use crate::error::Result;
use crate::operations::cleanup::{OrientFaces, RemoveDegenerate, WeldByDistance};
use crate::operations::edges::{ApplyEdgeActions, ClassifyEdgeRoles, ClassifyReport};
use crate::operations::fields::SurfaceFields;
use crate::operations::finishing::{FinishingReport, FinishingStack};
use crate::operations::identity::{AssignPartIds, ProjectUvs, WriteProtectionMask};
use crate::operations::query::{CalculatePhysicalStats, PhysicalStats};
use crate::operations::seams::{SeamReport, SolveSeams};
use crate::operations::sockets::{ExtractSockets, SocketRecord};
use crate::operations::transform::{Align, Inflate};
use crate::topology::Mesh;

/// Diagnostics collected along a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub classify: ClassifyReport,
    pub finishing: FinishingReport,
    pub seams: SeamReport,
    /// Mean of each surface field channel.
    pub field_means: [f64; 4],
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub mesh: Mesh,
    pub sockets: Vec<SocketRecord>,
    pub stats: PhysicalStats,
    pub report: RunReport,
}

impl PipelineOutput {
    fn empty(mesh: Mesh, report: RunReport) -> Self {
        Self {
            mesh,
            sockets: Vec::new(),
            stats: PhysicalStats::default(),
            report,
        }
    }
}

/// A validated configuration ready to process shapes.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a parameter is out of range.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builds a shape and runs every stage on it.
    ///
    /// An empty shape, or one that loses all faces during finishing,
    /// returns an empty result with zeroed stats.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder fails or a stage outside the
    /// finishing stack fails.
    pub fn run(&self, builder: &dyn ShapeBuilder) -> Result<PipelineOutput> {
        let meta = builder.slot_meta()?;
        let ctx = PipelineContext::new(&self.config, &meta);
        let mut mesh = Mesh::new();
        builder.build_shape(&mut mesh)?;
        info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "shape built"
        );

        let mut report = RunReport::default();
        if mesh.is_empty() {
            info!("empty shape, skipping remaining stages");
            return Ok(PipelineOutput::empty(mesh, report));
        }

        mesh.recompute_normals();
        report.classify = Self::edge_stage(&ctx, &mut mesh)?;
        Self::placement_stage(&ctx, &mut mesh)?;

        let stack = FinishingStack::from_params(&self.config.finishing);
        report.finishing = stack.execute(&mut mesh, &ctx.step_context());
        info!(
            applied = report.finishing.applied.len(),
            skipped = report.finishing.skipped.len(),
            faces = mesh.face_count(),
            "finishing stack done"
        );

        Self::cleanup_stage(&mut mesh)?;
        if mesh.is_empty() {
            info!("nothing left after finishing, skipping remaining stages");
            return Ok(PipelineOutput::empty(mesh, report));
        }

        let uv_faces = ProjectUvs::new(&ctx.manifest).execute(&mut mesh)?;
        let parts = AssignPartIds::new().execute(&mut mesh)?;
        debug!(uv_faces, parts, "identity layers written");

        let stats =
            CalculatePhysicalStats::new(&ctx.manifest, &self.config.densities).execute(&mesh);
        let sockets = ExtractSockets::new(&ctx.socket_slots).execute(&mesh)?;
        report.seams = SolveSeams::new(&self.config.seams).execute(&mut mesh)?;
        report.field_means = SurfaceFields::new(&self.config.fields)
            .with_scale(self.config.global_scale)
            .with_seed(self.config.seed)
            .execute(&mut mesh)?;

        info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            sockets = sockets.len(),
            volume = stats.volume,
            mass = stats.mass,
            "run complete"
        );
        Ok(PipelineOutput {
            mesh,
            sockets,
            stats,
            report,
        })
    }

    /// Edge roles, role actions and the protection mask.
    fn edge_stage(ctx: &PipelineContext<'_>, mesh: &mut Mesh) -> Result<ClassifyReport> {
        let classify = if ctx.config.auto_classify {
            ClassifyEdgeRoles::new().execute(mesh)?
        } else {
            ClassifyReport::default()
        };
        let touched = ApplyEdgeActions::new(ctx.config.edge_actions).execute(mesh);
        let protected = WriteProtectionMask::new(&ctx.manifest).execute(mesh);
        info!(touched, protected, "edge stage done");
        Ok(classify)
    }

    /// Scale and pivot, per-slot inflation, then the topology merge.
    fn placement_stage(ctx: &PipelineContext<'_>, mesh: &mut Mesh) -> Result<()> {
        let scale = ctx.config.global_scale;
        let offset = Align::new(scale, ctx.config.pivot).execute(mesh);
        let inflated = Inflate::new(&ctx.manifest, scale).execute(mesh);
        let welded = WeldByDistance::new(ctx.config.weld_distance * scale).execute(mesh)?;
        info!(?offset, inflated, welded, "placement stage done");
        Ok(())
    }

    fn cleanup_stage(mesh: &mut Mesh) -> Result<()> {
        let removed = RemoveDegenerate::new().execute(mesh)?;
        let flipped = OrientFaces::new().execute(mesh)?;
        mesh.recompute_normals();
        debug!(
            faces = removed.faces,
            vertices = removed.vertices,
            flipped,
            "cleanup done"
        );
        Ok(())
    }
}
