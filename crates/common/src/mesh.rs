use glam::Vec3;

use crate::MeshId;

/// Errors from mesh construction.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has no triangles")]
    Empty,
    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// An indexed triangle mesh in object space.
///
/// Triangles are wound counter-clockwise when seen from outside, so the
/// outward side is the front face. The CSG passes rely on this to tell
/// front faces from back faces.
#[derive(Debug, Clone)]
pub struct Mesh {
    id: MeshId,
    positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Result<Self, MeshError> {
        if triangles.is_empty() {
            return Err(MeshError::Empty);
        }
        for (triangle, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= positions.len()) {
                return Err(MeshError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count: positions.len(),
                });
            }
        }
        Ok(Self {
            id: MeshId::new(),
            positions,
            triangles,
        })
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Iterate triangles as object-space corner positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangles.iter().map(|t| {
            [
                self.positions[t[0] as usize],
                self.positions[t[1] as usize],
                self.positions[t[2] as usize],
            ]
        })
    }

    /// Unnormalized object-space face normal of a triangle (cross product of its edges).
    pub fn face_normal(corners: &[Vec3; 3]) -> Vec3 {
        (corners[1] - corners[0]).cross(corners[2] - corners[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_mesh() {
        assert!(matches!(Mesh::new(vec![Vec3::ZERO], vec![]), Err(MeshError::Empty)));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = Mesh::new(vec![Vec3::ZERO, Vec3::X], vec![[0, 1, 2]]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::IndexOutOfRange {
                triangle: 0,
                index: 2,
                vertex_count: 2
            }
        ));
    }

    #[test]
    fn counter_clockwise_triangle_faces_positive_z() {
        let mesh = triangle();
        let corners = mesh.triangles().next().unwrap();
        assert!(Mesh::face_normal(&corners).z > 0.0);
        assert_eq!(mesh.triangle_count(), 1);
    }
}
