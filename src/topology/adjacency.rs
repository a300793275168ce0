use slotmap::SecondaryMap;

use super::{EdgeId, FaceId, Mesh, VertexId};

/// Vertex-centred adjacency tables built from a mesh snapshot.
///
/// The tables are not kept in sync with later edits; rebuild after any
/// topology change.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    vertex_faces: SecondaryMap<VertexId, Vec<FaceId>>,
    vertex_edges: SecondaryMap<VertexId, Vec<EdgeId>>,
    vertex_neighbors: SecondaryMap<VertexId, Vec<VertexId>>,
}

impl Adjacency {
    /// Builds the tables for the current state of `mesh`.
    #[must_use]
    pub fn build(mesh: &Mesh) -> Self {
        let mut adj = Self::default();
        for (id, _) in mesh.vertices() {
            adj.vertex_faces.insert(id, Vec::new());
            adj.vertex_edges.insert(id, Vec::new());
            adj.vertex_neighbors.insert(id, Vec::new());
        }
        for (_, corner) in mesh.corners() {
            if let Some(faces) = adj.vertex_faces.get_mut(corner.vertex) {
                faces.push(corner.face);
            }
        }
        for (id, edge) in mesh.edges() {
            let [a, b] = edge.vertices;
            if let Some(edges) = adj.vertex_edges.get_mut(a) {
                edges.push(id);
            }
            if let Some(edges) = adj.vertex_edges.get_mut(b) {
                edges.push(id);
            }
            if let Some(n) = adj.vertex_neighbors.get_mut(a) {
                n.push(b);
            }
            if let Some(n) = adj.vertex_neighbors.get_mut(b) {
                n.push(a);
            }
        }
        adj
    }

    /// Faces that have a corner on `v`.
    #[must_use]
    pub fn faces_of(&self, v: VertexId) -> &[FaceId] {
        self.vertex_faces.get(v).map_or(&[], Vec::as_slice)
    }

    /// Edges with `v` as an endpoint.
    #[must_use]
    pub fn edges_of(&self, v: VertexId) -> &[EdgeId] {
        self.vertex_edges.get(v).map_or(&[], Vec::as_slice)
    }

    /// Vertices joined to `v` by an edge.
    #[must_use]
    pub fn neighbors_of(&self, v: VertexId) -> &[VertexId] {
        self.vertex_neighbors.get(v).map_or(&[], Vec::as_slice)
    }
}
