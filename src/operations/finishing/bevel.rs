use std::collections::HashMap;

use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::error::{OpResult, OperationError};
use crate::math::{Point3, Vector3};
use crate::topology::{ring_walks, Adjacency, EdgeId, FaceId, Mesh, VertexData, VertexId};

/// Which edges a [`Bevel`] cuts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BevelSelect {
    /// Signed dihedral angle below `-threshold` (radians).
    Concave { threshold: f64 },
    /// Signed dihedral angle above `threshold` (radians).
    Convex { threshold: f64 },
    /// Edges with a non-zero bevel weight.
    Weighted,
}

/// Cuts selected manifold edges into flat strips of the given width.
///
/// Each vertex touching a selected edge is split: with two or more
/// selected edges the faces around it fall into sectors bounded by those
/// edges and every sector gets its own mitred copy of the vertex (three or
/// more sectors also get a cap polygon). A vertex at the end of a single
/// selected edge slides two copies along the neighbouring edges instead.
/// Edges around boundary or non-manifold vertices are skipped.
pub struct Bevel {
    width: f64,
    select: BevelSelect,
}

/// One face of the ordered fan around a vertex.
struct FanEntry {
    face: FaceId,
    /// Vertex before the centre in the face ring.
    prev: VertexId,
    /// Vertex after the centre; the edge to it is shared with the next entry.
    next: VertexId,
}

/// Changes planned around one vertex.
#[derive(Default)]
struct VertexPlan {
    replace: Vec<(FaceId, Vec<VertexId>)>,
    /// Selected edge -> end vertices, ordered from the face walking
    /// `vertices[0] -> vertices[1]` to the other face.
    ends: Vec<(EdgeId, Vec<VertexId>)>,
    cap: Option<(Vec<VertexId>, u8)>,
}

/// Minimum sine used when sliding along a neighbouring edge.
const MIN_SLIDE_SINE: f64 = 0.2;

/// Fraction of the shortest incident edge a cut may consume.
const MAX_WIDTH_RATIO: f64 = 0.45;

impl Bevel {
    /// Creates a new `Bevel` operation.
    #[must_use]
    pub fn new(width: f64, select: BevelSelect) -> Self {
        Self { width, select }
    }

    fn selected(&self, mesh: &Mesh) -> Vec<EdgeId> {
        mesh.edges()
            .filter(|(id, e)| {
                e.is_manifold()
                    && match self.select {
                        BevelSelect::Concave { threshold } => {
                            mesh.dihedral_angle(*id).is_some_and(|a| a < -threshold)
                        }
                        BevelSelect::Convex { threshold } => {
                            mesh.dihedral_angle(*id).is_some_and(|a| a > threshold)
                        }
                        BevelSelect::Weighted => e.bevel_weight > 0.0,
                    }
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Executes the bevel. Returns the number of edges cut.
    ///
    /// # Errors
    ///
    /// Returns an error if the width is not positive or a face cannot be
    /// rebuilt.
    pub fn execute(&self, mesh: &mut Mesh) -> OpResult<usize> {
        if self.width <= 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "bevel width must be positive, got {}",
                self.width
            )));
        }
        mesh.recompute_normals();
        let adjacency = Adjacency::build(mesh);

        let mut selected: SecondaryMap<EdgeId, ()> =
            self.selected(mesh).into_iter().map(|e| (e, ())).collect();
        let mut fans: SecondaryMap<VertexId, Vec<FanEntry>> = SecondaryMap::new();

        // Drop edges whose endpoints have no closed, consistently wound fan.
        loop {
            let mut rejected = Vec::new();
            for (e, _) in &selected {
                for v in mesh.edge(e)?.vertices {
                    if fans.contains_key(v) {
                        continue;
                    }
                    match vertex_fan(mesh, &adjacency, v) {
                        Some(fan) => {
                            fans.insert(v, fan);
                        }
                        None => rejected.push(e),
                    }
                }
            }
            if rejected.is_empty() {
                break;
            }
            warn!(edges = rejected.len(), "skipping bevel edges at open vertices");
            for e in rejected {
                selected.remove(e);
            }
        }
        if selected.is_empty() {
            return Ok(0);
        }

        let mut plans: Vec<VertexPlan> = Vec::new();
        let mut origin: SecondaryMap<VertexId, VertexId> = SecondaryMap::new();
        let centres: Vec<VertexId> = fans.keys().collect();
        for v in centres {
            let Some(fan) = fans.get(v) else {
                continue;
            };
            let plan = self.plan_vertex(mesh, &adjacency, v, fan, &selected, &mut origin)?;
            plans.push(plan);
        }

        Self::apply(mesh, plans, &selected, &origin)
    }

    #[allow(clippy::too_many_lines)]
    fn plan_vertex(
        &self,
        mesh: &mut Mesh,
        adjacency: &Adjacency,
        v: VertexId,
        fan: &[FanEntry],
        selected: &SecondaryMap<EdgeId, ()>,
        origin: &mut SecondaryMap<VertexId, VertexId>,
    ) -> OpResult<VertexPlan> {
        let m = fan.len();
        let base = mesh.vertex(v)?.clone();
        let centre = base.point;
        let shortest = adjacency
            .neighbors_of(v)
            .iter()
            .filter_map(|&n| mesh.point(n).ok())
            .map(|p| (p - centre).norm())
            .fold(f64::MAX, f64::min);
        let width = self.width.min(shortest * MAX_WIDTH_RATIO);

        // c_i joins fan[i] and fan[i + 1].
        let mut cuts = Vec::with_capacity(m);
        for entry in fan {
            let e = mesh
                .edge_between(v, entry.next)
                .ok_or_else(|| OperationError::Failed("fan edge vanished".into()))?;
            cuts.push((e, selected.contains_key(e)));
        }
        let k = cuts.iter().filter(|(_, s)| *s).count();

        let mut spawn = |mesh: &mut Mesh, point: Point3| {
            let id = mesh.add_vertex_data(VertexData::moved_to(&base, point));
            origin.insert(id, v);
            id
        };
        let end_order = |mesh: &Mesh, e: EdgeId, seq: Vec<VertexId>| -> OpResult<Vec<VertexId>> {
            // fan[i] walks v -> next, so it is the "a" face when v is vertices[0].
            if mesh.edge(e)?.vertices[0] == v {
                Ok(seq)
            } else {
                Ok(seq.into_iter().rev().collect())
            }
        };

        let mut plan = VertexPlan::default();
        if k >= 2 {
            // Rotate so the fan starts right after a selected cut.
            let Some(first_cut) = cuts.iter().position(|(_, s)| *s) else {
                return Ok(plan);
            };
            let start = (first_cut + 1) % m;
            let mut sectors: Vec<(Vec<usize>, VertexId)> = Vec::new();
            let mut run: Vec<usize> = Vec::new();
            for step in 0..m {
                let i = (start + step) % m;
                run.push(i);
                if cuts[i].1 {
                    let lead = fan[run[0]].prev;
                    let trail = fan[i].next;
                    let p1 = perpendicular(mesh, centre, lead, fan[run[0]].face)?;
                    let p2 = perpendicular(mesh, centre, trail, fan[i].face)?;
                    let offset = miter(&p1, &p2) * width;
                    let id = spawn(mesh, centre + offset);
                    sectors.push((std::mem::take(&mut run), id));
                }
            }

            let mut sector_of = vec![v; m];
            for (faces, id) in &sectors {
                for &i in faces {
                    sector_of[i] = *id;
                    plan.replace.push((fan[i].face, vec![*id]));
                }
            }
            for (i, &(e, sel)) in cuts.iter().enumerate() {
                if sel {
                    let seq = vec![sector_of[i], sector_of[(i + 1) % m]];
                    plan.ends.push((e, end_order(mesh, e, seq)?));
                }
            }
            if k >= 3 {
                let ring: Vec<VertexId> = sectors.iter().rev().map(|(_, id)| *id).collect();
                let slot = mesh.face(fan[0].face)?.material_slot;
                plan.cap = Some((ring, slot));
            }
        } else if k == 1 {
            let Some(i) = cuts.iter().position(|(_, s)| *s) else {
                return Ok(plan);
            };
            let (e, _) = cuts[i];
            let along = (mesh.point(fan[i].next)? - centre)
                .try_normalize(f64::EPSILON)
                .unwrap_or_else(Vector3::x);
            let slide = |mesh: &Mesh, towards: VertexId| -> OpResult<Point3> {
                let dir = (mesh.point(towards)? - centre)
                    .try_normalize(f64::EPSILON)
                    .unwrap_or_else(Vector3::zeros);
                let sine = dir.cross(&along).norm().max(MIN_SLIDE_SINE);
                Ok(centre + dir * (width / sine))
            };
            let prev_face = (i + m - 1) % m;
            let next_face = (i + 1) % m;
            let after_next = (i + 2) % m;
            let va_point = slide(mesh, fan[i].prev)?;
            let vb_point = slide(mesh, fan[next_face].next)?;
            let va = spawn(mesh, va_point);
            let vb = spawn(mesh, vb_point);

            plan.replace.push((fan[i].face, vec![va]));
            plan.replace.push((fan[next_face].face, vec![vb]));
            let seq = if m == 3 {
                plan.replace.push((fan[after_next].face, vec![vb, va]));
                vec![va, vb]
            } else {
                plan.replace.push((fan[after_next].face, vec![vb, v]));
                plan.replace.push((fan[prev_face].face, vec![v, va]));
                vec![va, v, vb]
            };
            plan.ends.push((e, end_order(mesh, e, seq)?));
        }
        Ok(plan)
    }

    fn apply(
        mesh: &mut Mesh,
        plans: Vec<VertexPlan>,
        selected: &SecondaryMap<EdgeId, ()>,
        origin: &SecondaryMap<VertexId, VertexId>,
    ) -> OpResult<usize> {
        // Per face: centre vertex -> replacement sequence.
        let mut replacements: HashMap<FaceId, Vec<(VertexId, Vec<VertexId>)>> = HashMap::new();
        let mut ends: HashMap<(EdgeId, bool), Vec<VertexId>> = HashMap::new();
        let mut caps = Vec::new();
        for plan in plans {
            for (face, seq) in plan.replace {
                let centre = seq
                    .iter()
                    .find_map(|n| origin.get(*n).copied())
                    .ok_or_else(|| OperationError::Failed("replacement without origin".into()))?;
                replacements.entry(face).or_default().push((centre, seq));
            }
            for (e, seq) in plan.ends {
                let at_first = seq
                    .iter()
                    .find_map(|n| origin.get(*n).copied())
                    .zip(mesh.edge(e).ok().map(|d| d.vertices[0]))
                    .is_some_and(|(o, a)| o == a);
                ends.insert((e, at_first), seq);
            }
            if let Some(cap) = plan.cap {
                caps.push(cap);
            }
        }

        // Strip slots come from the face walking vertices[0] -> vertices[1].
        let mut strips = Vec::new();
        for (e, _) in selected {
            let edge = mesh.edge(e)?;
            let [a, b] = edge.vertices;
            let mut slot = 0;
            for &f in &edge.faces {
                if ring_walks(&mesh.face_vertices(f)?, &a, &b) {
                    slot = mesh.face(f)?.material_slot;
                }
            }
            let (Some(a_seq), Some(b_seq)) = (ends.get(&(e, true)), ends.get(&(e, false))) else {
                continue;
            };
            let mut ring = a_seq.clone();
            ring.extend(b_seq.iter().rev());
            strips.push((ring, slot));
        }

        for (face, subs) in replacements {
            let ring = mesh.face_vertices(face)?;
            let rebuilt: Vec<VertexId> = ring
                .iter()
                .flat_map(|v| {
                    subs.iter()
                        .find(|(c, _)| c == v)
                        .map_or_else(|| vec![*v], |(_, seq)| seq.clone())
                })
                .collect();
            mesh.replace_face_ring(face, &rebuilt)?;
        }
        let mut added = 0;
        for (ring, slot) in strips.into_iter().chain(caps) {
            match mesh.add_face(&ring, slot) {
                Ok(_) => added += 1,
                Err(e) => warn!(error = %e, "bevel face skipped"),
            }
        }

        // New edges inherit attributes from the edge they replace.
        let derived: Vec<(EdgeId, EdgeId)> = mesh
            .edges()
            .filter_map(|(id, edge)| {
                let [a, b] = edge.vertices;
                if !origin.contains_key(a) && !origin.contains_key(b) {
                    return None;
                }
                let oa = origin.get(a).copied().unwrap_or(a);
                let ob = origin.get(b).copied().unwrap_or(b);
                let old = mesh.edge_between(oa, ob)?;
                (old != id && !selected.contains_key(old)).then_some((id, old))
            })
            .collect();
        for (new, old) in derived {
            let data = mesh.edge(old)?.clone();
            mesh.edge_mut(new)?.merge_attributes(&data);
        }

        mesh.remove_loose_edges();
        mesh.remove_loose_vertices();
        mesh.recompute_normals();
        debug!(edges = selected.len(), faces = added, "bevelled edges");
        Ok(selected.len())
    }
}

/// Ordered fan of faces around an interior vertex, or `None` if the vertex
/// sits on a boundary, is non-manifold, or the winding is inconsistent.
fn vertex_fan(mesh: &Mesh, adjacency: &Adjacency, v: VertexId) -> Option<Vec<FanEntry>> {
    let faces = adjacency.faces_of(v);
    let &start = faces.first()?;
    let mut fan = Vec::with_capacity(faces.len());
    let mut face = start;
    loop {
        let ring = mesh.face_vertices(face).ok()?;
        let n = ring.len();
        let idx = ring.iter().position(|&x| x == v)?;
        let prev = ring[(idx + n - 1) % n];
        let next = ring[(idx + 1) % n];
        fan.push(FanEntry { face, prev, next });

        let edge = mesh.edge(mesh.edge_between(v, next)?).ok()?;
        if !edge.is_manifold() {
            return None;
        }
        let other = *edge.faces.iter().find(|&&f| f != face)?;
        if !ring_walks(&mesh.face_vertices(other).ok()?, &next, &v) {
            return None;
        }
        if other == start {
            break;
        }
        if fan.len() >= faces.len() {
            return None;
        }
        face = other;
    }
    (fan.len() == faces.len() && fan.len() >= 3).then_some(fan)
}

/// Unit vector in the plane of `face`, perpendicular to the edge
/// `centre -> towards`, pointing into the face.
fn perpendicular(mesh: &Mesh, centre: Point3, towards: VertexId, face: FaceId) -> OpResult<Vector3> {
    let d = (mesh.point(towards)? - centre)
        .try_normalize(f64::EPSILON)
        .ok_or_else(|| OperationError::Degenerate("zero-length bevel edge".into()))?;
    let n = mesh.face(face)?.normal;
    let mut p = n.cross(&d);
    if p.dot(&(mesh.face_centroid(face)? - centre)) < 0.0 {
        p = -p;
    }
    p.try_normalize(f64::EPSILON)
        .ok_or_else(|| OperationError::Degenerate("bevel edge parallel to face normal".into()))
}

/// Offset reaching unit distance from both edge lines.
fn miter(p1: &Vector3, p2: &Vector3) -> Vector3 {
    let denom = 1.0 + p1.dot(p2);
    if denom > 0.2 {
        (p1 + p2) / denom
    } else {
        (p1 + p2).try_normalize(f64::EPSILON).unwrap_or(*p1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;
    use crate::operations::query::Volume;
    use std::f64::consts::FRAC_PI_4;

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
    fn chamfer_all_cube_edges() {
        let mut mesh = cube();
        let cut = Bevel::new(0.1, BevelSelect::Convex { threshold: FRAC_PI_4 })
            .execute(&mut mesh)
            .unwrap();
        assert_eq!(cut, 12);
        // 6 shrunk faces, 12 strips, 8 corner caps.
        assert_eq!(mesh.face_count(), 26);
        assert_eq!(mesh.vertex_count(), 24);
        assert!(mesh.edges().all(|(_, e)| e.is_manifold()));

        let volume = Volume::new().execute(&mesh);
        assert!(volume < 1.0 && volume > 0.9, "volume {volume}");
    }

    #[test]
    fn single_edge_bevel_keeps_mesh_closed() {
        let mut mesh = cube();
        let top_edge = mesh
            .edges()
            .find(|(_, e)| {
                let a = mesh.point(e.vertices[0]).unwrap();
                let b = mesh.point(e.vertices[1]).unwrap();
                a.z > 0.5 && b.z > 0.5 && a.y > 0.5 && b.y > 0.5
            })
            .map(|(id, _)| id)
            .unwrap();
        mesh.edge_mut(top_edge).unwrap().bevel_weight = 1.0;

        let cut = Bevel::new(0.2, BevelSelect::Weighted).execute(&mut mesh).unwrap();
        assert_eq!(cut, 1);
        assert_eq!(mesh.face_count(), 7);
        assert_eq!(mesh.vertex_count(), 10);
        assert!(mesh.edges().all(|(_, e)| e.is_manifold()));
        let volume = Volume::new().execute(&mesh);
        assert!((volume - (1.0 - 0.5 * 0.2 * 0.2)).abs() < 1e-9, "volume {volume}");
    }

    #[test]
    fn cube_has_no_concave_edges() {
        let mut mesh = cube();
        let cut = Bevel::new(0.1, BevelSelect::Concave { threshold: 0.01 })
            .execute(&mut mesh)
            .unwrap();
        assert_eq!(cut, 0);
        assert_eq!(mesh.face_count(), 6);
    }

    #[test]
    fn zero_width_is_rejected() {
        let mut mesh = cube();
        assert!(Bevel::new(0.0, BevelSelect::Weighted).execute(&mut mesh).is_err());
    }

    #[test]
    fn new_vertices_inherit_protection() {
        let mut mesh = cube();
        for (_, v) in mesh.vertices_mut() {
            v.protection = 0.5;
        }
        Bevel::new(0.1, BevelSelect::Convex { threshold: 0.5 })
            .execute(&mut mesh)
            .unwrap();
        assert!(mesh.vertices().all(|(_, v)| (v.protection - 0.5).abs() < 1e-12));
    }
}
