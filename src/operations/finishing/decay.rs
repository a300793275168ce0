use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::debug;

use crate::error::{OpResult, OperationError};
use crate::manifest::SlotManifest;
use crate::topology::Mesh;

/// Randomly deletes faces on unprotected slots.
///
/// Faces are visited in arena order and each is removed with the given
/// probability, drawn from a seeded PCG stream. Edges and vertices left
/// without faces are removed afterwards.
pub struct Decay<'a> {
    manifest: &'a SlotManifest,
    probability: f64,
    seed: u64,
}

impl<'a> Decay<'a> {
    /// Creates a new `Decay` operation.
    #[must_use]
    pub fn new(manifest: &'a SlotManifest, probability: f64) -> Self {
        Self {
            manifest,
            probability,
            seed: 0,
        }
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Executes the decay. Returns the number of deleted faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the probability is outside `[0, 1]`.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<usize> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(OperationError::InvalidInput(format!(
                "decay probability {} outside [0, 1]",
                self.probability
            )));
        }
        let mut rng = Pcg64::seed_from_u64(self.seed);
        let doomed: Vec<_> = mesh
            .faces()
            .filter(|(_, f)| !self.manifest.is_protected(f.material_slot))
            .map(|(id, _)| id)
            .collect::<Vec<_>>()
            .into_iter()
            .filter(|_| rng.random::<f64>() < self.probability)
            .collect();
        for &face in &doomed {
            mesh.remove_face(face)?;
        }
        let edges = mesh.remove_loose_edges();
        let vertices = mesh.remove_loose_vertices();
        mesh.recompute_normals();
        debug!(faces = doomed.len(), edges, vertices, "decayed");
        Ok(doomed.len())
    }
}
