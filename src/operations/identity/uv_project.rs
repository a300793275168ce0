use std::f64::consts::TAU;

use tracing::debug;

use crate::error::Result;
use crate::manifest::{SlotManifest, UvMode};
use crate::math::polygon_3d::{newell_vector, plane_basis, project_to_plane};
use crate::math::{Aabb, Point2, Point3, Vector3, AREA_EPSILON};
use crate::operations::query::face_islands;
use crate::topology::{FaceId, Mesh, SLOT_COUNT};

/// Gap between packed charts, in normalised UV units.
const CHART_MARGIN: f64 = 0.02;

/// Generates corner UVs per slot according to each slot's [`UvMode`].
pub struct ProjectUvs<'a> {
    manifest: &'a SlotManifest,
}

/// Index pair of the two axes kept by a planar projection along `normal`.
fn dominant_plane(normal: &Vector3) -> (usize, usize) {
    let a = normal.abs();
    if a.x >= a.y && a.x >= a.z {
        (1, 2)
    } else if a.y >= a.z {
        (0, 2)
    } else {
        (0, 1)
    }
}

impl<'a> ProjectUvs<'a> {
    /// Creates a new `ProjectUvs` operation.
    #[must_use]
    pub fn new(manifest: &'a SlotManifest) -> Self {
        Self { manifest }
    }

    /// Executes the projection. Returns the number of faces given UVs.
    ///
    /// # Errors
    ///
    /// Returns an error if a face references missing elements.
    pub fn execute(&self, mesh: &mut Mesh) -> Result<usize> {
        let mut by_slot: [Vec<FaceId>; SLOT_COUNT] = std::array::from_fn(|_| Vec::new());
        for (id, face) in mesh.faces() {
            by_slot[usize::from(face.material_slot).min(SLOT_COUNT - 1)].push(id);
        }

        let mut projected = 0;
        for (slot, faces) in (0u8..).zip(by_slot.iter()) {
            if faces.is_empty() {
                continue;
            }
            let config = self.manifest.entry(slot);
            let scale = config.uv_scale;
            let uvs = match config.uv_mode {
                UvMode::Skip => continue,
                UvMode::Box => Self::project_box(mesh, faces)?,
                UvMode::TubeX => Self::project_tube(mesh, faces, 0)?,
                UvMode::TubeY => Self::project_tube(mesh, faces, 1)?,
                UvMode::TubeZ => Self::project_tube(mesh, faces, 2)?,
                UvMode::Fit => Self::project_fit(mesh, faces)?,
                UvMode::Unwrap => Self::project_unwrap(mesh, faces)?,
            };
            for (face, face_uvs) in faces.iter().zip(uvs) {
                let corners = mesh.face(*face)?.corners.clone();
                for (corner, uv) in corners.into_iter().zip(face_uvs) {
                    mesh.corner_mut(corner)?.uv = Point2::from(uv.coords * scale);
                }
            }
            projected += faces.len();
            debug!(slot, mode = ?config.uv_mode, faces = faces.len(), "projected uvs");
        }
        Ok(projected)
    }

    fn project_box(mesh: &Mesh, faces: &[FaceId]) -> Result<Vec<Vec<Point2>>> {
        faces
            .iter()
            .map(|&f| -> Result<Vec<Point2>> {
                let (i, j) = dominant_plane(&mesh.face(f)?.normal);
                Ok(mesh
                    .face_points(f)?
                    .iter()
                    .map(|p| Point2::new(p[i], p[j]))
                    .collect())
            })
            .collect()
    }

    fn project_tube(mesh: &Mesh, faces: &[FaceId], axis: usize) -> Result<Vec<Vec<Point2>>> {
        let mut bounds = Aabb::empty();
        for &f in faces {
            for p in mesh.face_points(f)? {
                bounds.expand_point(&p);
            }
        }
        let center = bounds.center();
        let (i, j) = ((axis + 1) % 3, (axis + 2) % 3);

        faces
            .iter()
            .map(|&f| -> Result<Vec<Point2>> {
                let mut uvs: Vec<Point2> = mesh
                    .face_points(f)?
                    .iter()
                    .map(|p| {
                        let d = p - center;
                        let u = d[j].atan2(d[i]) / TAU + 0.5;
                        Point2::new(u, p[axis] - bounds.min[axis])
                    })
                    .collect();
                // Faces straddling the wrap line get their low side shifted by one turn.
                let (lo, hi) = uvs
                    .iter()
                    .fold((f64::MAX, f64::MIN), |(lo, hi), uv| (lo.min(uv.x), hi.max(uv.x)));
                if hi - lo > 0.5 {
                    for uv in &mut uvs {
                        if uv.x < 0.5 {
                            uv.x += 1.0;
                        }
                    }
                }
                Ok(uvs)
            })
            .collect()
    }

    fn project_fit(mesh: &Mesh, faces: &[FaceId]) -> Result<Vec<Vec<Point2>>> {
        let mut normal = Vector3::zeros();
        let mut bounds = Aabb::empty();
        for &f in faces {
            let points = mesh.face_points(f)?;
            normal += newell_vector(&points);
            for p in &points {
                bounds.expand_point(p);
            }
        }
        let (i, j) = dominant_plane(&normal);
        let extent = bounds.extent();
        let size = extent[i].max(extent[j]).max(AREA_EPSILON);

        faces
            .iter()
            .map(|&f| -> Result<Vec<Point2>> {
                Ok(mesh
                    .face_points(f)?
                    .iter()
                    .map(|p| Point2::new((p[i] - bounds.min[i]) / size, (p[j] - bounds.min[j]) / size))
                    .collect())
            })
            .collect()
    }

    fn project_unwrap(mesh: &Mesh, faces: &[FaceId]) -> Result<Vec<Vec<Point2>>> {
        let charts = face_islands(mesh, faces, |edge, _, _| !edge.seam);
        let mut chart_uvs: Vec<(FaceId, Vec<Point2>)> = Vec::with_capacity(faces.len());
        let mut cursor = 0.0;
        let mut height: f64 = 0.0;

        for chart in &charts {
            let mut normal = Vector3::zeros();
            let mut points = Vec::with_capacity(chart.len());
            for &f in chart {
                let p = mesh.face_points(f)?;
                normal += newell_vector(&p);
                points.push(p);
            }
            let normal = normal
                .try_normalize(AREA_EPSILON)
                .or_else(|| mesh.face(chart[0]).ok().map(|f| f.normal))
                .unwrap_or_else(Vector3::z);
            let (u, v) = plane_basis(&normal);
            let origin = Point3::origin();
            let flat: Vec<Vec<Point2>> = points
                .iter()
                .map(|p| project_to_plane(p, &origin, &u, &v))
                .collect();

            let (mut min, mut max) = (Point2::new(f64::MAX, f64::MAX), Point2::new(f64::MIN, f64::MIN));
            for uv in flat.iter().flatten() {
                min = min.inf(uv);
                max = max.sup(uv);
            }
            let offset = Point2::new(cursor, 0.0) - min;
            for (&f, face_uvs) in chart.iter().zip(flat) {
                chart_uvs.push((f, face_uvs.into_iter().map(|uv| uv + offset).collect()));
            }
            cursor += max.x - min.x + CHART_MARGIN;
            height = height.max(max.y - min.y);
        }

        let size = (cursor - CHART_MARGIN).max(height).max(AREA_EPSILON);
        let mut lookup: std::collections::HashMap<FaceId, Vec<Point2>> = chart_uvs
            .into_iter()
            .map(|(f, uvs)| (f, uvs.into_iter().map(|uv| Point2::from(uv.coords / size)).collect()))
            .collect();
        Ok(faces
            .iter()
            .map(|f| lookup.remove(f).unwrap_or_default())
            .collect())
    }
}
