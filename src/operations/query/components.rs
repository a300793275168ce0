use std::collections::VecDeque;

use slotmap::SecondaryMap;

use crate::topology::{EdgeData, FaceId, Mesh};

/// Groups faces into islands connected through shared edges.
///
/// Two faces join the same island when they share an edge and `connects`
/// accepts that edge for the pair. Faces are visited in the order given, so
/// the output is deterministic for a given input order.
pub fn face_islands<F>(mesh: &Mesh, faces: &[FaceId], connects: F) -> Vec<Vec<FaceId>>
where
    F: Fn(&EdgeData, FaceId, FaceId) -> bool,
{
    let mut member: SecondaryMap<FaceId, ()> = SecondaryMap::new();
    for &f in faces {
        member.insert(f, ());
    }
    let mut visited: SecondaryMap<FaceId, ()> = SecondaryMap::new();
    let mut islands = Vec::new();

    for &seed in faces {
        if visited.contains_key(seed) {
            continue;
        }
        visited.insert(seed, ());
        let mut island = vec![seed];
        let mut queue = VecDeque::from([seed]);
        while let Some(face) = queue.pop_front() {
            let Ok(edges) = mesh.face_edges(face) else {
                continue;
            };
            for e in edges {
                let Ok(edge) = mesh.edge(e) else {
                    continue;
                };
                for &other in &edge.faces {
                    if other == face
                        || visited.contains_key(other)
                        || !member.contains_key(other)
                        || !connects(edge, face, other)
                    {
                        continue;
                    }
                    visited.insert(other, ());
                    island.push(other);
                    queue.push_back(other);
                }
            }
        }
        islands.push(island);
    }
    islands
}

/// Connected components of the whole mesh across any shared edge.
#[must_use]
pub fn connected_components(mesh: &Mesh) -> Vec<Vec<FaceId>> {
    face_islands(mesh, &mesh.face_ids(), |_, _, _| true)
}
