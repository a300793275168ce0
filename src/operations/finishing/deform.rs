use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OpResult, OperationError};
use crate::math::{Point3, AREA_EPSILON};
use crate::topology::Mesh;

/// Remaps normalised height `t` in `[0, 1]` into a deformation weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightFalloff {
    /// Exponent applied to the height.
    pub power: f64,
    /// Measure height from the middle toward both ends.
    pub mirror: bool,
    /// Use `1 - weight`.
    pub invert: bool,
}

impl Default for HeightFalloff {
    fn default() -> Self {
        Self {
            power: 1.0,
            mirror: false,
            invert: false,
        }
    }
}

impl HeightFalloff {
    /// Weight for a normalised height.
    #[must_use]
    pub fn weight(&self, t: f64) -> f64 {
        let mut t = t.clamp(0.0, 1.0);
        if self.mirror {
            t = (2.0 * t - 1.0).abs();
        }
        let w = t.powf(self.power.max(AREA_EPSILON));
        if self.invert {
            1.0 - w
        } else {
            w
        }
    }
}

/// Axis a [`Bend`] curls around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BendAxis {
    /// Curl in the YZ plane.
    #[default]
    X,
    /// Curl in the XZ plane.
    Y,
    /// Twist around the vertical axis.
    Z,
}

/// Bounds minimum, bounds centre and height of the mesh.
fn z_extent(mesh: &Mesh) -> OpResult<(Point3, Point3, f64)> {
    let bounds = mesh
        .bounding_box()
        .ok_or_else(|| OperationError::InvalidInput("mesh has no vertices".into()))?;
    let height = bounds.max.z - bounds.min.z;
    if height < AREA_EPSILON {
        return Err(OperationError::Degenerate("mesh has no vertical extent".into()));
    }
    Ok((bounds.min, bounds.center(), height))
}

/// Scales horizontal cross-sections as a function of height.
///
/// A vertex at weight `w` has its XY offset from the bounding-box centre
/// multiplied by `1 - amount * w`.
pub struct Taper {
    amount: f64,
    falloff: HeightFalloff,
}

impl Taper {
    /// Creates a new `Taper` operation with a linear falloff.
    #[must_use]
    pub fn new(amount: f64) -> Self {
        Self {
            amount,
            falloff: HeightFalloff::default(),
        }
    }

    /// Sets the height falloff.
    #[must_use]
    pub fn with_falloff(mut self, falloff: HeightFalloff) -> Self {
        self.falloff = falloff;
        self
    }

    /// Executes the taper.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is empty or flat along Z.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<()> {
        let (min, center, height) = z_extent(mesh)?;
        for (_, vertex) in mesh.vertices_mut() {
            let p = &mut vertex.point;
            let factor = 1.0 - self.amount * self.falloff.weight((p.z - min.z) / height);
            p.x = center.x + (p.x - center.x) * factor;
            p.y = center.y + (p.y - center.y) * factor;
        }
        mesh.recompute_normals();
        debug!(amount = self.amount, "tapered");
        Ok(())
    }
}

/// Curls the mesh around an axis as a function of height.
///
/// For `X` and `Y` the vertical neutral line through the bounding-box centre
/// is mapped onto a circular arc of the same length, so the total sweep is
/// `angle`. For `Z` the mesh is twisted by up to `angle` around the vertical
/// line through the centre.
pub struct Bend {
    angle: f64,
    axis: BendAxis,
    falloff: HeightFalloff,
}

impl Bend {
    /// Creates a new `Bend` operation; `angle` is in radians.
    #[must_use]
    pub fn new(angle: f64, axis: BendAxis) -> Self {
        Self {
            angle,
            axis,
            falloff: HeightFalloff::default(),
        }
    }

    /// Sets the height falloff.
    #[must_use]
    pub fn with_falloff(mut self, falloff: HeightFalloff) -> Self {
        self.falloff = falloff;
        self
    }

    /// Executes the bend.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is empty or flat along Z.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<()> {
        if self.angle.abs() < AREA_EPSILON {
            return Ok(());
        }
        let (min, center, height) = z_extent(mesh)?;
        let radius = height / self.angle;
        for (_, vertex) in mesh.vertices_mut() {
            let p = &mut vertex.point;
            let along = height * self.falloff.weight((p.z - min.z) / height);
            match self.axis {
                BendAxis::Z => {
                    let (s, c) = (self.angle * along / height).sin_cos();
                    let (dx, dy) = (p.x - center.x, p.y - center.y);
                    p.x = center.x + dx * c - dy * s;
                    p.y = center.y + dx * s + dy * c;
                }
                BendAxis::X | BendAxis::Y => {
                    let lateral = usize::from(self.axis == BendAxis::X);
                    let phi = along / radius;
                    let r = radius - (p[lateral] - center[lateral]);
                    p[lateral] = center[lateral] + radius - r * phi.cos();
                    p.z = min.z + r * phi.sin();
                }
            }
        }
        mesh.recompute_normals();
        debug!(angle = self.angle, axis = ?self.axis, "bent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::{MakeBox, MakeTube};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn falloff_shapes() {
        let f = HeightFalloff::default();
        assert!((f.weight(0.25) - 0.25).abs() < 1e-12);
        let mirrored = HeightFalloff { mirror: true, ..f };
        assert!(mirrored.weight(0.5).abs() < 1e-12);
        assert!((mirrored.weight(0.0) - 1.0).abs() < 1e-12);
        let inverted = HeightFalloff { invert: true, power: 2.0, ..f };
        assert!((inverted.weight(0.5) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn taper_shrinks_the_top() {
        let mut mesh = Mesh::new();
        MakeBox::new(p(-1.0, -1.0, 0.0), p(1.0, 1.0, 2.0))
            .execute(&mut mesh)
            .unwrap();
        Taper::new(0.5).execute(&mut mesh).unwrap();
        for (_, v) in mesh.vertices() {
            let expected = if v.point.z > 1.0 { 0.5 } else { 1.0 };
            assert!((v.point.x.abs() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn bend_keeps_neutral_line_length() {
        let mut mesh = Mesh::new();
        MakeTube::new(p(0.0, 0.0, 0.0), 0.1, PI)
            .with_resolution(8, 16)
            .execute(&mut mesh)
            .unwrap();
        Bend::new(FRAC_PI_2, BendAxis::X).execute(&mut mesh).unwrap();
        // Radius = PI / (PI / 2) = 2; the top ring now faces sideways.
        let top: Vec<Point3> = mesh
            .vertices()
            .map(|(_, v)| v.point)
            .filter(|q| q.y > 1.95)
            .collect();
        assert_eq!(top.len(), 8);
        for q in top {
            assert!((q.z - 2.0).abs() < 0.11);
        }
    }

    #[test]
    fn twist_preserves_radius() {
        let mut mesh = Mesh::new();
        MakeTube::new(p(0.0, 0.0, 0.0), 1.0, 1.0)
            .with_resolution(8, 4)
            .execute(&mut mesh)
            .unwrap();
        Bend::new(PI, BendAxis::Z).execute(&mut mesh).unwrap();
        for (_, v) in mesh.vertices() {
            assert!((v.point.x.hypot(v.point.y) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn flat_mesh_is_rejected() {
        let mut mesh = Mesh::new();
        crate::operations::creation::MakeGrid::new(p(0.0, 0.0, 0.0), 1.0, 1.0, 1, 1)
            .execute(&mut mesh)
            .unwrap();
        assert!(Taper::new(0.5).execute(&mut mesh).is_err());
    }
}
