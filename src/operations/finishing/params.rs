use serde::{Deserialize, Serialize};

use super::{
    Bend, BendAxis, Bevel, BevelSelect, BridgeLoops, Decay, FillHoles, FinishingStep,
    HeightFalloff, MirrorPlane, Plating, Smooth, Solidify, StepContext, SurfaceNoise, Symmetrize,
    Taper, Triangulate,
};
use crate::error::{ConfigError, OpResult, OperationError};
use crate::math::mix_seed;
use crate::operations::cleanup::WeldByDistance;
use crate::topology::Mesh;

/// Seed stream for [`NoiseParams`].
const NOISE_STREAM: u64 = 1;
/// Seed stream for [`DecayParams`].
const DECAY_STREAM: u64 = 2;

/// Merges coincident vertices before anything else runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuseParams {
    /// Merge distance in model units, before scaling.
    pub distance: f64,
}

impl Default for FuseParams {
    fn default() -> Self {
        Self { distance: 1e-4 }
    }
}

impl FinishingStep for FuseParams {
    fn name(&self) -> &'static str {
        "fuse"
    }

    fn apply(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> OpResult<()> {
        WeldByDistance::new(self.distance * ctx.scale)
            .execute(mesh)
            .map_err(|e| OperationError::Failed(e.to_string()))?;
        Ok(())
    }
}

/// Width and angle threshold shared by the concave fillet and the chamfer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BevelParams {
    /// Offset width, before scaling.
    pub width: f64,
    /// Minimum dihedral angle in degrees for an edge to be selected.
    pub angle_deg: f64,
}

impl Default for BevelParams {
    fn default() -> Self {
        Self {
            width: 0.02,
            angle_deg: 1.0,
        }
    }
}

impl BevelParams {
    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        ConfigError::check_range(name, self.width, 0.0, f64::MAX)?;
        ConfigError::check_range(name, self.angle_deg, 0.0, 180.0)
    }
}

/// Bevels concave edges so inner creases catch light.
pub(crate) struct ConcaveFillet(pub BevelParams);

impl FinishingStep for ConcaveFillet {
    fn name(&self) -> &'static str {
        "concave_fillet"
    }

    fn apply(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> OpResult<()> {
        let select = BevelSelect::Concave {
            threshold: self.0.angle_deg.to_radians(),
        };
        Bevel::new(self.0.width * ctx.scale, select).execute(mesh)?;
        Ok(())
    }
}

/// Final chamfer of convex edges.
pub(crate) struct Chamfer(pub BevelParams);

impl FinishingStep for Chamfer {
    fn name(&self) -> &'static str {
        "chamfer"
    }

    fn apply(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> OpResult<()> {
        let select = BevelSelect::Convex {
            threshold: self.0.angle_deg.to_radians(),
        };
        Bevel::new(self.0.width * ctx.scale, select).execute(mesh)?;
        Ok(())
    }
}

/// Gives open surfaces a thickness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolidifyParams {
    /// Shell thickness, before scaling.
    pub thickness: f64,
}

impl Default for SolidifyParams {
    fn default() -> Self {
        Self { thickness: 0.05 }
    }
}

impl FinishingStep for SolidifyParams {
    fn name(&self) -> &'static str {
        "solidify"
    }

    fn apply(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> OpResult<()> {
        Solidify::new(self.thickness * ctx.scale).execute(mesh)?;
        Ok(())
    }
}

/// Connects pairs of open boundary loops.
pub(crate) struct Bridge;

impl FinishingStep for Bridge {
    fn name(&self) -> &'static str {
        "bridge"
    }

    fn apply(&self, mesh: &mut Mesh, _ctx: &StepContext<'_>) -> OpResult<()> {
        BridgeLoops::new().execute(mesh)?;
        Ok(())
    }
}

/// Caps open boundary loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FillHolesParams {
    /// Largest loop to cap; `0` caps every loop.
    pub max_sides: usize,
}

impl FinishingStep for FillHolesParams {
    fn name(&self) -> &'static str {
        "fill_holes"
    }

    fn apply(&self, mesh: &mut Mesh, _ctx: &StepContext<'_>) -> OpResult<()> {
        FillHoles::new().with_max_sides(self.max_sides).execute(mesh)?;
        Ok(())
    }
}

/// Mirrors one half of the mesh onto the other.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SymmetrizeParams {
    pub plane: MirrorPlane,
    /// Plane position along its axis, before scaling.
    pub offset: f64,
}

impl FinishingStep for SymmetrizeParams {
    fn name(&self) -> &'static str {
        "symmetrize"
    }

    fn apply(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> OpResult<()> {
        Symmetrize::new(self.plane)
            .with_offset(self.offset * ctx.scale)
            .execute(mesh)?;
        Ok(())
    }
}

/// Narrows the mesh with height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaperParams {
    /// `1` collapses the top to a point, negative values flare.
    pub amount: f64,
    pub falloff: HeightFalloff,
}

impl Default for TaperParams {
    fn default() -> Self {
        Self {
            amount: 0.3,
            falloff: HeightFalloff::default(),
        }
    }
}

impl FinishingStep for TaperParams {
    fn name(&self) -> &'static str {
        "taper"
    }

    fn apply(&self, mesh: &mut Mesh, _ctx: &StepContext<'_>) -> OpResult<()> {
        Taper::new(self.amount).with_falloff(self.falloff).execute(mesh)
    }
}

/// Curls the mesh around a horizontal axis or twists it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BendParams {
    /// Total bend angle in degrees.
    pub angle_deg: f64,
    pub axis: BendAxis,
    pub falloff: HeightFalloff,
}

impl Default for BendParams {
    fn default() -> Self {
        Self {
            angle_deg: 45.0,
            axis: BendAxis::default(),
            falloff: HeightFalloff::default(),
        }
    }
}

impl FinishingStep for BendParams {
    fn name(&self) -> &'static str {
        "bend"
    }

    fn apply(&self, mesh: &mut Mesh, _ctx: &StepContext<'_>) -> OpResult<()> {
        Bend::new(self.angle_deg.to_radians(), self.axis)
            .with_falloff(self.falloff)
            .execute(mesh)
    }
}

/// Insets and recesses panels on unprotected slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatingParams {
    /// Border width, before scaling.
    pub inset: f64,
    /// Recess depth, before scaling.
    pub depth: f64,
}

impl Default for PlatingParams {
    fn default() -> Self {
        Self {
            inset: 0.02,
            depth: 0.01,
        }
    }
}

impl FinishingStep for PlatingParams {
    fn name(&self) -> &'static str {
        "plating"
    }

    fn apply(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> OpResult<()> {
        Plating::new(ctx.manifest, self.inset * ctx.scale, self.depth * ctx.scale).execute(mesh)?;
        Ok(())
    }
}

/// Fractal displacement along vertex normals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Peak displacement, before scaling.
    pub amplitude: f64,
    /// Base frequency in cycles per model unit, before scaling.
    pub frequency: f64,
    pub octaves: u32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            amplitude: 0.01,
            frequency: 4.0,
            octaves: 3,
        }
    }
}

impl FinishingStep for NoiseParams {
    fn name(&self) -> &'static str {
        "noise"
    }

    fn apply(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> OpResult<()> {
        if ctx.scale <= 0.0 {
            return Err(OperationError::InvalidInput("scale must be positive".into()));
        }
        SurfaceNoise::new(self.amplitude * ctx.scale, self.frequency / ctx.scale)
            .with_octaves(self.octaves)
            .with_seed(mix_seed(ctx.seed, NOISE_STREAM))
            .execute(mesh)?;
        Ok(())
    }
}

/// Laplacian relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothParams {
    pub iterations: usize,
    /// Blend toward the neighbour mean per iteration, in `[0, 1]`.
    pub factor: f64,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self {
            iterations: 2,
            factor: 0.5,
        }
    }
}

impl FinishingStep for SmoothParams {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn apply(&self, mesh: &mut Mesh, _ctx: &StepContext<'_>) -> OpResult<()> {
        Smooth::new(self.iterations, self.factor).execute(mesh)
    }
}

/// Random face removal on unprotected slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayParams {
    /// Per-face removal probability.
    pub probability: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self { probability: 0.05 }
    }
}

impl FinishingStep for DecayParams {
    fn name(&self) -> &'static str {
        "decay"
    }

    fn apply(&self, mesh: &mut Mesh, ctx: &StepContext<'_>) -> OpResult<()> {
        Decay::new(ctx.manifest, self.probability)
            .with_seed(mix_seed(ctx.seed, DECAY_STREAM))
            .execute(mesh)?;
        Ok(())
    }
}

/// Splits polygons into triangles.
pub(crate) struct TriangulateStep;

impl FinishingStep for TriangulateStep {
    fn name(&self) -> &'static str {
        "triangulate"
    }

    fn apply(&self, mesh: &mut Mesh, _ctx: &StepContext<'_>) -> OpResult<()> {
        Triangulate::new().execute(mesh)?;
        Ok(())
    }
}

/// Configuration of the finishing stack. Absent steps are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinishingParams {
    pub fuse: Option<FuseParams>,
    pub concave_fillet: Option<BevelParams>,
    pub solidify: Option<SolidifyParams>,
    pub bridge: bool,
    pub fill_holes: Option<FillHolesParams>,
    pub symmetrize: Option<SymmetrizeParams>,
    pub taper: Option<TaperParams>,
    pub bend: Option<BendParams>,
    pub plating: Option<PlatingParams>,
    pub noise: Option<NoiseParams>,
    pub smooth: Option<SmoothParams>,
    pub decay: Option<DecayParams>,
    pub triangulate: bool,
    pub chamfer: Option<BevelParams>,
}

impl FinishingParams {
    /// Checks every configured step parameter against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(p) = &self.fuse {
            ConfigError::check_range("fuse.distance", p.distance, 0.0, f64::MAX)?;
        }
        if let Some(p) = &self.concave_fillet {
            p.validate("concave_fillet")?;
        }
        if let Some(p) = &self.solidify {
            ConfigError::check_range("solidify.thickness", p.thickness, -f64::MAX, f64::MAX)?;
        }
        if let Some(p) = &self.taper {
            ConfigError::check_range("taper.amount", p.amount, -1.0, 1.0)?;
            ConfigError::check_range("taper.falloff.power", p.falloff.power, 0.0, f64::MAX)?;
        }
        if let Some(p) = &self.bend {
            ConfigError::check_range("bend.angle_deg", p.angle_deg, -360.0, 360.0)?;
            ConfigError::check_range("bend.falloff.power", p.falloff.power, 0.0, f64::MAX)?;
        }
        if let Some(p) = &self.plating {
            ConfigError::check_range("plating.inset", p.inset, 0.0, f64::MAX)?;
            ConfigError::check_range("plating.depth", p.depth, -f64::MAX, f64::MAX)?;
        }
        if let Some(p) = &self.noise {
            ConfigError::check_range("noise.amplitude", p.amplitude, 0.0, f64::MAX)?;
            ConfigError::check_range("noise.frequency", p.frequency, 0.0, f64::MAX)?;
        }
        if let Some(p) = &self.smooth {
            ConfigError::check_range("smooth.factor", p.factor, 0.0, 1.0)?;
        }
        if let Some(p) = &self.decay {
            ConfigError::check_range("decay.probability", p.probability, 0.0, 1.0)?;
        }
        if let Some(p) = &self.chamfer {
            p.validate("chamfer")?;
        }
        Ok(())
    }
}
