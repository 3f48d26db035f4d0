//! Triangle geometry and mesh payloads

use crate::material::Material;
use crate::point::*;
use serde::{Deserialize, Serialize};

/// Indexed triangle geometry in node-local coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Set vertex normals; ignored unless there is one per vertex
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Iterate the corner positions of every face, skipping faces with
    /// out-of-range indices
    pub fn triangles(&self) -> impl Iterator<Item = [Point3f; 3]> + '_ {
        self.faces.iter().filter_map(|face| {
            Some([
                *self.vertices.get(face[0])?,
                *self.vertices.get(face[1])?,
                *self.vertices.get(face[2])?,
            ])
        })
    }

    /// Area-weighted vertex normals, used when the source file carries none
    pub fn compute_vertex_normals(&self) -> Vec<Vector3f> {
        let mut normals = vec![Vector3f::zeros(); self.vertices.len()];
        for face in &self.faces {
            let (Some(v0), Some(v1), Some(v2)) = (
                self.vertices.get(face[0]),
                self.vertices.get(face[1]),
                self.vertices.get(face[2]),
            ) else {
                continue;
            };
            let n = (v1 - v0).cross(&(v2 - v0));
            for &i in face {
                normals[i] += n;
            }
        }
        for n in &mut normals {
            *n = n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::y);
        }
        normals
    }
}

/// Renderable payload of a mesh node: geometry plus its material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub geometry: TriangleMesh,
    pub material: Material,
}

impl Mesh {
    pub fn new(geometry: TriangleMesh, material: Material) -> Self {
        Self { geometry, material }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_vertex_normals_face_out_of_plane() {
        let normals = quad().compute_vertex_normals();
        assert_eq!(normals.len(), 4);
        for n in normals {
            assert_relative_eq!(n.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_triangles_skip_bad_indices() {
        let mut mesh = quad();
        mesh.faces.push([0, 1, 42]);
        assert_eq!(mesh.triangles().count(), 2);
    }

    #[test]
    fn test_set_normals_requires_matching_length() {
        let mut mesh = quad();
        mesh.set_normals(vec![Vector3f::z()]);
        assert!(mesh.normals.is_none());
    }
}
