//! Convex primitive meshes, centered on the origin and wound so that the
//! outward side is the front face.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use scs_common::Mesh;

/// Axis-aligned unit cube spanning [-0.5, 0.5] on every axis.
pub fn cuboid() -> Mesh {
    let positions = (0..8)
        .map(|i| {
            let c = |bit: u32| if i & bit != 0 { 0.5 } else { -0.5 };
            Vec3::new(c(1), c(2), c(4))
        })
        .collect();
    #[rustfmt::skip]
    let quads: [[u32; 4]; 6] = [
        [1, 3, 7, 5], // +X
        [0, 4, 6, 2], // -X
        [2, 6, 7, 3], // +Y
        [0, 1, 5, 4], // -Y
        [4, 5, 7, 6], // +Z
        [0, 2, 3, 1], // -Z
    ];
    let triangles = quads
        .iter()
        .flat_map(|q| [[q[0], q[1], q[2]], [q[0], q[2], q[3]]])
        .collect();
    // Indices are in range by construction.
    Mesh::new(positions, triangles).unwrap_or_else(|_| unreachable!())
}

/// UV sphere of radius 1 with `segments` around Y and `rings` latitude bands.
pub fn uv_sphere(segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut positions = vec![Vec3::Y];
    for ring in 1..rings {
        let theta = PI * ring as f32 / rings as f32;
        for seg in 0..segments {
            let phi = TAU * seg as f32 / segments as f32;
            positions.push(Vec3::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
            ));
        }
    }
    positions.push(Vec3::NEG_Y);
    let south = positions.len() as u32 - 1;
    let ring_start = |ring: u32| 1 + (ring - 1) * segments;

    let mut triangles = Vec::new();
    for seg in 0..segments {
        let next = (seg + 1) % segments;
        triangles.push([0, ring_start(1) + seg, ring_start(1) + next]);
        triangles.push([south, ring_start(rings - 1) + next, ring_start(rings - 1) + seg]);
    }
    for ring in 1..rings - 1 {
        let (a, b) = (ring_start(ring), ring_start(ring + 1));
        for seg in 0..segments {
            let next = (seg + 1) % segments;
            triangles.push([a + seg, b + seg, b + next]);
            triangles.push([a + seg, b + next, a + next]);
        }
    }
    outward(positions, triangles)
}

/// Cylinder of radius 1 along Y, spanning y in [-0.5, 0.5], with capped ends.
pub fn cylinder(segments: u32) -> Mesh {
    let segments = segments.max(3);
    let mut positions = vec![Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -0.5, 0.0)];
    for seg in 0..segments {
        let phi = TAU * seg as f32 / segments as f32;
        positions.push(Vec3::new(phi.cos(), 0.5, phi.sin()));
        positions.push(Vec3::new(phi.cos(), -0.5, phi.sin()));
    }
    let top = |seg: u32| 2 + 2 * (seg % segments);
    let bottom = |seg: u32| 3 + 2 * (seg % segments);

    let mut triangles = Vec::new();
    for seg in 0..segments {
        triangles.push([0, top(seg), top(seg + 1)]);
        triangles.push([1, bottom(seg + 1), bottom(seg)]);
        triangles.push([top(seg), bottom(seg), bottom(seg + 1)]);
        triangles.push([top(seg), bottom(seg + 1), top(seg + 1)]);
    }
    outward(positions, triangles)
}

/// Orient every triangle of an origin-centered convex mesh away from the origin.
fn outward(positions: Vec<Vec3>, mut triangles: Vec<[u32; 3]>) -> Mesh {
    for tri in &mut triangles {
        let corners = tri.map(|i| positions[i as usize]);
        let centroid = (corners[0] + corners[1] + corners[2]) / 3.0;
        if Mesh::face_normal(&corners).dot(centroid) < 0.0 {
            tri.swap(1, 2);
        }
    }
    Mesh::new(positions, triangles).unwrap_or_else(|_| unreachable!())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_outward(mesh: &Mesh) {
        for corners in mesh.triangles() {
            let centroid = (corners[0] + corners[1] + corners[2]) / 3.0;
            let n = Mesh::face_normal(&corners);
            assert!(n.length() > 0.0, "degenerate triangle {corners:?}");
            assert!(n.dot(centroid) > 0.0, "inward triangle {corners:?}");
        }
    }

    /// Every vertex lies on or behind every face plane.
    fn assert_convex(mesh: &Mesh) {
        for corners in mesh.triangles() {
            let n = Mesh::face_normal(&corners).normalize();
            for p in mesh.positions() {
                assert!(n.dot(*p - corners[0]) <= 1e-4);
            }
        }
    }

    #[test]
    fn cuboid_is_closed_and_outward() {
        let mesh = cuboid();
        assert_eq!(mesh.triangle_count(), 12);
        assert_outward(&mesh);
        assert_convex(&mesh);
    }

    #[test]
    fn sphere_is_outward_and_convex() {
        let mesh = uv_sphere(16, 8);
        assert_eq!(mesh.triangle_count(), 2 * 16 + 2 * 16 * 6);
        assert_outward(&mesh);
        assert_convex(&mesh);
    }

    #[test]
    fn cylinder_is_outward_and_convex() {
        let mesh = cylinder(12);
        assert_eq!(mesh.triangle_count(), 48);
        assert_outward(&mesh);
        assert_convex(&mesh);
    }

    #[test]
    fn degenerate_parameters_are_raised_to_minimums() {
        let mesh = uv_sphere(1, 1);
        assert_eq!(mesh.triangle_count(), 6);
        assert_outward(&mesh);
    }
}
