pub mod adjacency;
pub mod corner;
pub mod edge;
pub mod face;
pub mod vertex;

pub use adjacency::Adjacency;
pub use corner::{CornerData, CornerId};
pub use edge::{EdgeData, EdgeId, EdgeRole};
pub use face::{ring_walks, FaceData, FaceId, MAX_SLOT, SLOT_COUNT};
pub use vertex::{VertexData, VertexId};

use std::collections::HashMap;

use crate::error::TopologyError;
use crate::math::polygon_3d::{newell_vector, polygon_area, polygon_centroid, polygon_normal};
use crate::math::{Aabb, Point2, Point3, Vector3, AREA_EPSILON};
use slotmap::{SecondaryMap, SlotMap};

/// Attributes of a face captured before it is removed, so the face can be
/// rebuilt with a different vertex ring.
#[derive(Debug, Clone)]
pub struct FaceSnapshot {
    /// Vertex ring in winding order.
    pub vertices: Vec<VertexId>,
    /// Material slot.
    pub material_slot: u8,
    /// Smooth shading flag.
    pub smooth: bool,
    /// Part id.
    pub part_id: u32,
    /// Per-corner UVs, aligned with `vertices`.
    pub uvs: Vec<Point2>,
    /// Per-corner surface field, aligned with `vertices`.
    pub colors: Vec<[f64; 4]>,
}

/// Arena that owns every element of a polygon mesh.
///
/// Elements reference each other through generational ids, so removing a
/// face never invalidates the ids of unrelated elements. Edges are unique
/// per unordered vertex pair and keep the list of faces that use them.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    faces: SlotMap<FaceId, FaceData>,
    corners: SlotMap<CornerId, CornerData>,
    edge_lookup: HashMap<(VertexId, VertexId), EdgeId>,
}

fn edge_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Mesh {
    /// Creates a new, empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the mesh has no vertices or no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of face corners.
    #[must_use]
    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    // --- Vertex operations ---

    /// Inserts an unprotected vertex and returns its ID.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(VertexData::new(point))
    }

    /// Inserts a vertex with explicit data and returns its ID.
    pub fn add_vertex_data(&mut self, data: VertexData) -> VertexId {
        self.vertices.insert(data)
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn point(&self, id: VertexId) -> Result<Point3, TopologyError> {
        Ok(self.vertex(id)?.point)
    }

    /// Iterates over all vertices in arena order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.vertices.iter()
    }

    /// Iterates mutably over all vertices in arena order.
    pub fn vertices_mut(&mut self) -> impl Iterator<Item = (VertexId, &mut VertexData)> {
        self.vertices.iter_mut()
    }

    /// Collects all vertex ids in arena order.
    #[must_use]
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.keys().collect()
    }

    /// Removes a vertex together with every face and edge using it.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found in the mesh.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<(), TopologyError> {
        self.vertex(id)?;
        let faces: Vec<FaceId> = self
            .corners
            .values()
            .filter(|c| c.vertex == id)
            .map(|c| c.face)
            .collect();
        for face in faces {
            if self.faces.contains_key(face) {
                self.remove_face(face)?;
            }
        }
        let edges: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|(_, e)| e.vertices.contains(&id))
            .map(|(k, _)| k)
            .collect();
        for edge in edges {
            if let Some(data) = self.edges.remove(edge) {
                self.edge_lookup
                    .remove(&edge_key(data.vertices[0], data.vertices[1]));
            }
        }
        self.vertices.remove(id);
        Ok(())
    }

    // --- Edge operations ---

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns a mutable reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Iterates over all edges in arena order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Iterates mutably over all edges in arena order.
    pub fn edges_mut(&mut self) -> impl Iterator<Item = (EdgeId, &mut EdgeData)> {
        self.edges.iter_mut()
    }

    /// Collects all edge ids in arena order.
    #[must_use]
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.keys().collect()
    }

    /// Looks up the edge joining two vertices.
    #[must_use]
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_lookup.get(&edge_key(a, b)).copied()
    }

    /// Returns the edge joining two vertices, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if either vertex is missing or both ids are equal.
    pub fn ensure_edge(&mut self, a: VertexId, b: VertexId) -> Result<EdgeId, TopologyError> {
        if a == b {
            return Err(TopologyError::InvalidTopology(
                "edge endpoints must differ".into(),
            ));
        }
        self.vertex(a)?;
        self.vertex(b)?;
        let key = edge_key(a, b);
        if let Some(&id) = self.edge_lookup.get(&key) {
            return Ok(id);
        }
        let id = self.edges.insert(EdgeData::new([key.0, key.1]));
        self.edge_lookup.insert(key, id);
        Ok(id)
    }

    /// Endpoint positions of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or its vertices are missing.
    pub fn edge_points(&self, id: EdgeId) -> Result<(Point3, Point3), TopologyError> {
        let edge = self.edge(id)?;
        Ok((self.point(edge.vertices[0])?, self.point(edge.vertices[1])?))
    }

    /// Removes every edge that no face uses. Returns the number removed.
    pub fn remove_loose_edges(&mut self) -> usize {
        let loose: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|(_, e)| e.faces.is_empty())
            .map(|(k, _)| k)
            .collect();
        for &id in &loose {
            if let Some(data) = self.edges.remove(id) {
                self.edge_lookup
                    .remove(&edge_key(data.vertices[0], data.vertices[1]));
            }
        }
        loose.len()
    }

    /// Removes every vertex that no edge uses. Returns the number removed.
    pub fn remove_loose_vertices(&mut self) -> usize {
        let mut used: SecondaryMap<VertexId, ()> = SecondaryMap::new();
        for edge in self.edges.values() {
            used.insert(edge.vertices[0], ());
            used.insert(edge.vertices[1], ());
        }
        for corner in self.corners.values() {
            used.insert(corner.vertex, ());
        }
        let loose: Vec<VertexId> = self
            .vertices
            .keys()
            .filter(|v| !used.contains_key(*v))
            .collect();
        for &id in &loose {
            self.vertices.remove(id);
        }
        loose.len()
    }

    /// Signed dihedral angle across a manifold edge, in radians.
    ///
    /// Positive for convex edges, negative for concave ones, `None` unless
    /// the edge has exactly two faces with valid normals.
    #[must_use]
    pub fn dihedral_angle(&self, id: EdgeId) -> Option<f64> {
        let edge = self.edges.get(id)?;
        if !edge.is_manifold() {
            return None;
        }
        let (f0, f1) = (edge.faces[0], edge.faces[1]);
        let n0 = self.face_normal(f0).ok()?;
        let n1 = self.face_normal(f1).ok()?;
        let angle = n0.dot(&n1).clamp(-1.0, 1.0).acos();
        let c0 = self.face_centroid(f0).ok()?;
        let c1 = self.face_centroid(f1).ok()?;
        if (c1 - c0).dot(&n0) > 1e-9 {
            Some(-angle)
        } else {
            Some(angle)
        }
    }

    // --- Face operations ---

    /// Adds a polygon face over a ring of existing vertices.
    ///
    /// Edges are created on demand and shared with neighbouring faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring has fewer than three vertices, repeats a
    /// vertex, references a missing vertex, or the slot exceeds [`MAX_SLOT`].
    pub fn add_face(&mut self, ring: &[VertexId], material_slot: u8) -> Result<FaceId, TopologyError> {
        if ring.len() < 3 {
            return Err(TopologyError::InvalidTopology(
                "face needs at least 3 vertices".into(),
            ));
        }
        if material_slot > MAX_SLOT {
            return Err(TopologyError::InvalidTopology(format!(
                "material slot {material_slot} exceeds {MAX_SLOT}"
            )));
        }
        for (i, v) in ring.iter().enumerate() {
            self.vertex(*v)?;
            if ring[i + 1..].contains(v) {
                return Err(TopologyError::InvalidTopology(
                    "face ring repeats a vertex".into(),
                ));
            }
        }

        let face = self.faces.insert(FaceData {
            corners: Vec::with_capacity(ring.len()),
            material_slot,
            smooth: false,
            normal: Vector3::zeros(),
            part_id: 0,
        });

        let n = ring.len();
        let mut corners = Vec::with_capacity(n);
        for i in 0..n {
            let edge = self.ensure_edge(ring[i], ring[(i + 1) % n])?;
            self.edges[edge].faces.push(face);
            corners.push(self.corners.insert(CornerData {
                vertex: ring[i],
                edge,
                face,
                uv: Point2::origin(),
                color: [0.0; 4],
            }));
        }

        let normal = self.ring_normal(ring)?;
        let data = &mut self.faces[face];
        data.corners = corners;
        data.normal = normal;
        Ok(face)
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn face(&self, id: FaceId) -> Result<&FaceData, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Returns a mutable reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn face_mut(&mut self, id: FaceId) -> Result<&mut FaceData, TopologyError> {
        self.faces
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Iterates over all faces in arena order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceData)> {
        self.faces.iter()
    }

    /// Iterates mutably over all faces in arena order.
    pub fn faces_mut(&mut self) -> impl Iterator<Item = (FaceId, &mut FaceData)> {
        self.faces.iter_mut()
    }

    /// Collects all face ids in arena order.
    #[must_use]
    pub fn face_ids(&self) -> Vec<FaceId> {
        self.faces.keys().collect()
    }

    /// Vertex ring of a face in winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its corners is missing.
    pub fn face_vertices(&self, id: FaceId) -> Result<Vec<VertexId>, TopologyError> {
        self.face(id)?
            .corners
            .iter()
            .map(|&c| self.corner(c).map(|c| c.vertex))
            .collect()
    }

    /// Vertex positions of a face in winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its vertices is missing.
    pub fn face_points(&self, id: FaceId) -> Result<Vec<Point3>, TopologyError> {
        self.face_vertices(id)?
            .into_iter()
            .map(|v| self.point(v))
            .collect()
    }

    /// Edges of a face in winding order (edge `i` leaves corner `i`).
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its corners is missing.
    pub fn face_edges(&self, id: FaceId) -> Result<Vec<EdgeId>, TopologyError> {
        self.face(id)?
            .corners
            .iter()
            .map(|&c| self.corner(c).map(|c| c.edge))
            .collect()
    }

    /// Faces sharing an edge with the given face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn face_neighbors(&self, id: FaceId) -> Result<Vec<FaceId>, TopologyError> {
        let mut out = Vec::new();
        for edge in self.face_edges(id)? {
            for &f in &self.edge(edge)?.faces {
                if f != id && !out.contains(&f) {
                    out.push(f);
                }
            }
        }
        Ok(out)
    }

    /// Unit normal of a face computed from its current vertex positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing or has no area.
    pub fn face_normal(&self, id: FaceId) -> Result<Vector3, TopologyError> {
        let points = self.face_points(id)?;
        polygon_normal(&points).ok_or_else(|| TopologyError::InvalidTopology("face has no area".into()))
    }

    /// Area-weighted centroid of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn face_centroid(&self, id: FaceId) -> Result<Point3, TopologyError> {
        Ok(polygon_centroid(&self.face_points(id)?))
    }

    /// Area of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn face_area(&self, id: FaceId) -> Result<f64, TopologyError> {
        Ok(polygon_area(&self.face_points(id)?))
    }

    /// Removes a face and its corners, returning what is needed to rebuild it.
    ///
    /// Edges stay in place (with their attributes) even when no face uses
    /// them anymore; see [`Mesh::remove_loose_edges`].
    ///
    /// # Errors
    ///
    /// Returns an error if the face is not found in the mesh.
    pub fn remove_face(&mut self, id: FaceId) -> Result<FaceSnapshot, TopologyError> {
        let data = self
            .faces
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))?;

        let mut snapshot = FaceSnapshot {
            vertices: Vec::with_capacity(data.corners.len()),
            material_slot: data.material_slot,
            smooth: data.smooth,
            part_id: data.part_id,
            uvs: Vec::with_capacity(data.corners.len()),
            colors: Vec::with_capacity(data.corners.len()),
        };
        for c in data.corners {
            let Some(corner) = self.corners.remove(c) else {
                continue;
            };
            if let Some(edge) = self.edges.get_mut(corner.edge) {
                edge.faces.retain(|&f| f != id);
            }
            snapshot.vertices.push(corner.vertex);
            snapshot.uvs.push(corner.uv);
            snapshot.colors.push(corner.color);
        }
        Ok(snapshot)
    }

    /// Rebuilds a face from a snapshot, optionally over a different ring.
    ///
    /// Corner attributes are carried over when the ring length matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the ring is invalid (see [`Mesh::add_face`]).
    pub fn restore_face(
        &mut self,
        snapshot: &FaceSnapshot,
        ring: &[VertexId],
    ) -> Result<FaceId, TopologyError> {
        let face = self.add_face(ring, snapshot.material_slot)?;
        let same_len = ring.len() == snapshot.vertices.len();
        let corners = {
            let data = &mut self.faces[face];
            data.smooth = snapshot.smooth;
            data.part_id = snapshot.part_id;
            data.corners.clone()
        };
        if same_len {
            for (i, c) in corners.into_iter().enumerate() {
                let corner = &mut self.corners[c];
                corner.uv = snapshot.uvs[i];
                corner.color = snapshot.colors[i];
            }
        }
        Ok(face)
    }

    /// Replaces the vertex ring of a face, keeping its slot, shading and
    /// corner attributes. Returns the id of the rebuilt face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing or the new ring is invalid.
    /// On error the original face is restored.
    pub fn replace_face_ring(&mut self, id: FaceId, ring: &[VertexId]) -> Result<FaceId, TopologyError> {
        let snapshot = self.remove_face(id)?;
        match self.restore_face(&snapshot, ring) {
            Ok(face) => Ok(face),
            Err(e) => {
                self.restore_face(&snapshot, &snapshot.vertices)?;
                Err(e)
            }
        }
    }

    /// Reverses the winding of a face. Returns the id of the rebuilt face.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is missing.
    pub fn flip_face(&mut self, id: FaceId) -> Result<FaceId, TopologyError> {
        let mut snapshot = self.remove_face(id)?;
        snapshot.vertices.reverse();
        snapshot.uvs.reverse();
        snapshot.colors.reverse();
        let ring = snapshot.vertices.clone();
        self.restore_face(&snapshot, &ring)
    }

    // --- Corner operations ---

    /// Returns a reference to the corner data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn corner(&self, id: CornerId) -> Result<&CornerData, TopologyError> {
        self.corners
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("corner".into()))
    }

    /// Returns a mutable reference to the corner data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the mesh.
    pub fn corner_mut(&mut self, id: CornerId) -> Result<&mut CornerData, TopologyError> {
        self.corners
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("corner".into()))
    }

    /// Iterates over all corners in arena order.
    pub fn corners(&self) -> impl Iterator<Item = (CornerId, &CornerData)> {
        self.corners.iter()
    }

    /// Iterates mutably over all corners in arena order.
    pub fn corners_mut(&mut self) -> impl Iterator<Item = (CornerId, &mut CornerData)> {
        self.corners.iter_mut()
    }

    // --- Geometry ---

    /// Axis-aligned bounds of all vertices, `None` for an empty mesh.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        if self.vertices.is_empty() {
            return None;
        }
        Some(Aabb::from_points(self.vertices.values().map(|v| &v.point)))
    }

    /// Recomputes cached face normals and area-weighted vertex normals.
    pub fn recompute_normals(&mut self) {
        let mut accum: SecondaryMap<VertexId, Vector3> = SecondaryMap::new();
        let face_ids = self.face_ids();
        for face in face_ids {
            let Ok(ring) = self.face_vertices(face) else {
                continue;
            };
            let Ok(points) = ring
                .iter()
                .map(|&v| self.point(v))
                .collect::<Result<Vec<_>, _>>()
            else {
                continue;
            };
            let area_vec = newell_vector(&points);
            self.faces[face].normal = area_vec.try_normalize(AREA_EPSILON).unwrap_or_else(Vector3::zeros);
            for v in ring {
                match accum.get_mut(v) {
                    Some(n) => *n += area_vec,
                    None => {
                        accum.insert(v, area_vec);
                    }
                }
            }
        }
        for (id, vertex) in &mut self.vertices {
            vertex.normal = accum
                .get(id)
                .and_then(|n| n.try_normalize(AREA_EPSILON))
                .unwrap_or_else(Vector3::zeros);
        }
    }

    fn ring_normal(&self, ring: &[VertexId]) -> Result<Vector3, TopologyError> {
        let points = ring
            .iter()
            .map(|&v| self.point(v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(newell_vector(&points)
            .try_normalize(AREA_EPSILON)
            .unwrap_or_else(Vector3::zeros))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// Two unit quads sharing the edge x = 1.
    fn two_quads() -> (Mesh, [VertexId; 6], FaceId, FaceId) {
        let mut mesh = Mesh::new();
        let v = [
            mesh.add_vertex(p(0.0, 0.0, 0.0)),
            mesh.add_vertex(p(1.0, 0.0, 0.0)),
            mesh.add_vertex(p(2.0, 0.0, 0.0)),
            mesh.add_vertex(p(0.0, 1.0, 0.0)),
            mesh.add_vertex(p(1.0, 1.0, 0.0)),
            mesh.add_vertex(p(2.0, 1.0, 0.0)),
        ];
        let a = mesh.add_face(&[v[0], v[1], v[4], v[3]], 0).unwrap();
        let b = mesh.add_face(&[v[1], v[2], v[5], v[4]], 2).unwrap();
        (mesh, v, a, b)
    }

    #[test]
    fn shared_edge_is_created_once() {
        let (mesh, v, a, b) = two_quads();
        assert_eq!(mesh.edge_count(), 7);
        let shared = mesh.edge_between(v[1], v[4]).unwrap();
        let faces = &mesh.edge(shared).unwrap().faces;
        assert_eq!(faces.len(), 2);
        assert!(faces.contains(&a) && faces.contains(&b));
    }

    #[test]
    fn add_face_rejects_bad_rings() {
        let (mut mesh, v, _, _) = two_quads();
        assert!(mesh.add_face(&[v[0], v[1]], 0).is_err());
        assert!(mesh.add_face(&[v[0], v[1], v[0]], 0).is_err());
        assert!(mesh.add_face(&[v[0], v[1], v[2]], 10).is_err());
    }

    #[test]
    fn face_normal_follows_winding() {
        let (mesh, _, a, _) = two_quads();
        let n = mesh.face(a).unwrap().normal;
        assert!((n - Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn remove_face_keeps_edge_attributes() {
        let (mut mesh, v, a, _) = two_quads();
        let e = mesh.edge_between(v[0], v[1]).unwrap();
        mesh.edge_mut(e).unwrap().seam = true;
        let snap = mesh.remove_face(a).unwrap();
        assert!(mesh.edge(e).unwrap().faces.is_empty());
        let rebuilt = mesh.restore_face(&snap, &snap.vertices.clone()).unwrap();
        assert_eq!(mesh.edge_between(v[0], v[1]), Some(e));
        assert!(mesh.edge(e).unwrap().seam);
        assert_eq!(mesh.face(rebuilt).unwrap().material_slot, 0);
    }

    #[test]
    fn stale_face_id_is_rejected() {
        let (mut mesh, _, a, _) = two_quads();
        mesh.remove_face(a).unwrap();
        assert!(mesh.face(a).is_err());
        assert!(mesh.remove_face(a).is_err());
    }

    #[test]
    fn flip_face_reverses_normal() {
        let (mut mesh, _, a, _) = two_quads();
        let flipped = mesh.flip_face(a).unwrap();
        assert!((mesh.face_normal(flipped).unwrap() + Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn loose_cleanup_after_face_removal() {
        let (mut mesh, _, _, b) = two_quads();
        mesh.remove_face(b).unwrap();
        assert_eq!(mesh.remove_loose_edges(), 3);
        assert_eq!(mesh.remove_loose_vertices(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.edge_count(), 4);
    }

    #[test]
    fn remove_vertex_drops_incident_elements() {
        let (mut mesh, v, _, _) = two_quads();
        mesh.remove_vertex(v[1]).unwrap();
        assert_eq!(mesh.face_count(), 0);
        assert!(mesh.edge_between(v[0], v[1]).is_none());
    }

    #[test]
    fn coplanar_dihedral_is_zero() {
        let (mesh, v, _, _) = two_quads();
        let e = mesh.edge_between(v[1], v[4]).unwrap();
        assert!(mesh.dihedral_angle(e).unwrap().abs() < 1e-9);
        let boundary = mesh.edge_between(v[0], v[1]).unwrap();
        assert!(mesh.dihedral_angle(boundary).is_none());
    }

    #[test]
    fn vertex_normals_average_faces() {
        let (mut mesh, v, _, _) = two_quads();
        mesh.recompute_normals();
        let n = mesh.vertex(v[1]).unwrap().normal;
        assert!((n - Vector3::z()).norm() < 1e-12);
    }
}
