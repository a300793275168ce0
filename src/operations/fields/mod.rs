//! Per-corner surface attribute fields.
//!
//! The corner colour layer is overwritten with four channels: R wear,
//! G thickness or flow, B gravity, A cavity. Disabled channels are written
//! as zero. Wear, thickness, gravity and cavity sample vertices in parallel;
//! every vertex draws its random numbers from its own seed stream so the
//! result does not depend on scheduling.

mod cavity;
mod flow;
mod gravity;
mod thickness;
mod wear;

pub use cavity::CavityParams;
pub use flow::{simulate_flow, FlowParams};
pub use gravity::GravityParams;
pub use thickness::ThicknessParams;
pub use wear::WearParams;

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, info};

use crate::error::{ConfigError, OpResult};
use crate::math::{mix_seed, Point3, Vector3};
use crate::spatial::FaceBvh;
use crate::topology::{Adjacency, FaceId, Mesh, VertexId};

/// Distance ray origins are pushed off the surface.
const RAY_EPSILON: f64 = 1e-6;

const WEAR_STREAM: u64 = 10;
const GRAVITY_STREAM: u64 = 11;
const CAVITY_STREAM: u64 = 12;

/// Read-only view of one vertex used by the samplers.
#[derive(Debug, Clone)]
struct VertexSample {
    point: Point3,
    normal: Vector3,
    /// Incident faces, skipped by rays leaving this vertex.
    faces: Vec<FaceId>,
}

/// Mode of the green channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ThicknessOrFlow {
    Thickness(ThicknessParams),
    Flow(FlowParams),
}

/// Which channels to compute and how.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    pub wear: Option<WearParams>,
    pub thickness_or_flow: Option<ThicknessOrFlow>,
    pub gravity: Option<GravityParams>,
    pub cavity: Option<CavityParams>,
}

impl FieldParams {
    /// Checks every enabled channel against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(p) = &self.wear {
            p.validate()?;
        }
        match &self.thickness_or_flow {
            Some(ThicknessOrFlow::Thickness(p)) => p.validate()?,
            Some(ThicknessOrFlow::Flow(p)) => p.validate()?,
            None => {}
        }
        if let Some(p) = &self.gravity {
            p.validate()?;
        }
        if let Some(p) = &self.cavity {
            p.validate()?;
        }
        Ok(())
    }

    fn needs_rays(&self) -> bool {
        self.gravity.is_some()
            || self.cavity.is_some()
            || matches!(self.thickness_or_flow, Some(ThicknessOrFlow::Thickness(_)))
    }
}

/// Bakes the four surface channels into corner colours.
pub struct SurfaceFields<'a> {
    params: &'a FieldParams,
    scale: f64,
    seed: u64,
}

impl<'a> SurfaceFields<'a> {
    /// Creates a new `SurfaceFields` operation.
    #[must_use]
    pub fn new(params: &'a FieldParams) -> Self {
        Self {
            params,
            scale: 1.0,
            seed: 0,
        }
    }

    /// Sets the length scale applied to radii and ray distances.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Computes the channels and writes them to every corner.
    ///
    /// Vertex normals are refreshed first. Returns the mean of each channel
    /// over all vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh references missing entities.
    #[allow(clippy::cast_precision_loss)]
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<[f64; 4]> {
        mesh.recompute_normals();
        let adjacency = Adjacency::build(mesh);
        let ids = mesh.vertex_ids();
        let samples = ids
            .iter()
            .map(|&id| -> OpResult<VertexSample> {
                let vertex = mesh.vertex(id)?;
                Ok(VertexSample {
                    point: vertex.point,
                    normal: vertex.normal,
                    faces: adjacency.faces_of(id).to_vec(),
                })
            })
            .collect::<OpResult<Vec<_>>>()?;
        let bvh = self.params.needs_rays().then(|| FaceBvh::build(mesh));
        info!(
            vertices = samples.len(),
            triangles = bvh.as_ref().map_or(0, FaceBvh::triangle_count),
            "baking surface fields"
        );

        let zeros = || vec![0.0; samples.len()];
        let wear = match &self.params.wear {
            Some(p) => p
                .scaled(self.scale)
                .compute(mesh, &samples, mix_seed(self.seed, WEAR_STREAM))?,
            None => zeros(),
        };
        let green = match (&self.params.thickness_or_flow, &bvh) {
            (Some(ThicknessOrFlow::Thickness(p)), Some(bvh)) => p.scaled(self.scale).compute(&samples, bvh),
            (Some(ThicknessOrFlow::Flow(p)), _) => {
                let index = vertex_index(&ids);
                let neighbours: Vec<Vec<usize>> = ids
                    .iter()
                    .map(|&id| {
                        adjacency
                            .neighbors_of(id)
                            .iter()
                            .filter_map(|&n| index.get(n).copied())
                            .collect()
                    })
                    .collect();
                let heights: Vec<f64> = samples.iter().map(|s| s.point.z).collect();
                let uphill: Vec<f64> = samples.iter().map(|s| s.normal.z).collect();
                simulate_flow(p, &heights, &uphill, &neighbours)
                    .into_iter()
                    .map(|w| w.clamp(0.0, 1.0))
                    .collect()
            }
            _ => zeros(),
        };
        let gravity = match (&self.params.gravity, &bvh) {
            (Some(p), Some(bvh)) => p
                .scaled(self.scale)
                .compute(&samples, bvh, mix_seed(self.seed, GRAVITY_STREAM)),
            _ => zeros(),
        };
        let cavity = match (&self.params.cavity, &bvh) {
            (Some(p), Some(bvh)) => p
                .scaled(self.scale)
                .compute(&samples, bvh, mix_seed(self.seed, CAVITY_STREAM)),
            _ => zeros(),
        };

        let index = vertex_index(&ids);
        for (_, corner) in mesh.corners_mut() {
            if let Some(&i) = index.get(corner.vertex) {
                corner.color = [wear[i], green[i], gravity[i], cavity[i]];
            }
        }

        let count = samples.len().max(1) as f64;
        let mean = |values: &[f64]| values.iter().sum::<f64>() / count;
        let means = [mean(&wear), mean(&green), mean(&gravity), mean(&cavity)];
        debug!(?means, "surface fields written");
        Ok(means)
    }
}

fn vertex_index(ids: &[VertexId]) -> SecondaryMap<VertexId, usize> {
    let mut index = SecondaryMap::new();
    for (i, &id) in ids.iter().enumerate() {
        index.insert(id, i);
    }
    index
}
