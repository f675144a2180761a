//! Triangle setup and scan conversion with GPU rasterization rules.
//!
//! Vertices are clipped in homogeneous space, snapped to a fixed-point grid
//! with [`SUBPIXEL_BITS`] fractional bits, and covered with integer edge
//! functions under the top-left fill rule. Two triangles sharing an edge
//! never both cover a pixel on it, and the same triangle always produces the
//! same depth at the same pixel, whatever pipeline state it is drawn with.

use glam::{Vec3, Vec4};

use crate::state::CullMode;

pub const SUBPIXEL_BITS: u32 = 8;
const SUBPIXEL_ONE: i64 = 1 << SUBPIXEL_BITS;
const HALF_PIXEL: i64 = SUBPIXEL_ONE / 2;

/// Smallest `w` kept by near clipping.
const NEAR_W_EPS: f32 = 1e-5;
/// Guard band, in multiples of `w`, beyond which x and y are clipped.
const GUARD_BAND: f32 = 4.0;

/// One covered pixel of a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub x: u32,
    pub y: u32,
    /// NDC z in [0,1].
    pub depth: f32,
}

/// Signed distance of a clip-space point to one of the seven clip planes;
/// inside is >= 0.
fn plane_distance(plane: usize, v: Vec4) -> f32 {
    match plane {
        0 => v.w - NEAR_W_EPS,
        1 => v.z,
        2 => v.w - v.z,
        3 => GUARD_BAND * v.w - v.x,
        4 => GUARD_BAND * v.w + v.x,
        5 => GUARD_BAND * v.w - v.y,
        _ => GUARD_BAND * v.w + v.y,
    }
}

/// Clip a convex clip-space polygon against every plane (Sutherland-Hodgman).
pub fn clip_polygon(input: &[Vec4]) -> Vec<Vec4> {
    let mut poly = input.to_vec();
    for plane in 0..7 {
        if poly.len() < 3 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(poly.len() + 2);
        let mut prev = poly[poly.len() - 1];
        let mut prev_d = plane_distance(plane, prev);
        for &curr in &poly {
            let curr_d = plane_distance(plane, curr);
            match (prev_d >= 0.0, curr_d >= 0.0) {
                (true, true) => out.push(curr),
                (true, false) => out.push(intersect(prev, curr, prev_d, curr_d)),
                (false, true) => {
                    out.push(intersect(prev, curr, prev_d, curr_d));
                    out.push(curr);
                }
                (false, false) => {}
            }
            prev = curr;
            prev_d = curr_d;
        }
        poly = out;
    }
    if poly.len() < 3 { Vec::new() } else { poly }
}

fn intersect(a: Vec4, b: Vec4, da: f32, db: f32) -> Vec4 {
    let t = da / (da - db);
    a + (b - a) * t
}

#[derive(Debug, Clone, Copy)]
struct Snapped {
    x: i64,
    y: i64,
    z: f64,
}

/// Maps NDC to the fixed-point pixel grid of one surface.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    fn snap(&self, ndc: Vec3) -> Snapped {
        let sx = (ndc.x as f64 * 0.5 + 0.5) * self.width as f64;
        let sy = (0.5 - ndc.y as f64 * 0.5) * self.height as f64;
        Snapped {
            x: (sx * SUBPIXEL_ONE as f64).round() as i64,
            y: (sy * SUBPIXEL_ONE as f64).round() as i64,
            z: ndc.z.clamp(0.0, 1.0) as f64,
        }
    }

    /// Clip, cull and scan-convert one triangle. `emit` receives every covered
    /// pixel and whether the covering piece is front facing.
    pub fn rasterize(&self, clip: [Vec4; 3], cull: CullMode, mut emit: impl FnMut(Fragment, bool)) {
        let poly = clip_polygon(&clip);
        if poly.is_empty() {
            return;
        }
        let snapped: Vec<Snapped> = poly
            .iter()
            .map(|v| self.snap(v.truncate() / v.w))
            .collect();
        for i in 1..snapped.len() - 1 {
            self.triangle([snapped[0], snapped[i], snapped[i + 1]], cull, &mut emit);
        }
    }

    fn triangle(&self, tri: [Snapped; 3], cull: CullMode, emit: &mut impl FnMut(Fragment, bool)) {
        let [v0, mut v1, mut v2] = tri;
        let area = edge(v0, v1, v2.x, v2.y);
        if area == 0 {
            return;
        }
        // Counter-clockwise in NDC is clockwise on the y-down pixel grid.
        let front = area < 0;
        match cull {
            CullMode::Back if !front => return,
            CullMode::Front if front => return,
            _ => {}
        }
        if area < 0 {
            std::mem::swap(&mut v1, &mut v2);
        }
        let area = area.abs();

        let bias = |a: Snapped, b: Snapped| {
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            if dy < 0 || (dy == 0 && dx > 0) { 0 } else { -1 }
        };
        let (b0, b1, b2) = (bias(v1, v2), bias(v2, v0), bias(v0, v1));

        let min_x = v0.x.min(v1.x).min(v2.x);
        let max_x = v0.x.max(v1.x).max(v2.x);
        let min_y = v0.y.min(v1.y).min(v2.y);
        let max_y = v0.y.max(v1.y).max(v2.y);
        let px0 = (min_x >> SUBPIXEL_BITS).max(0);
        let px1 = (max_x >> SUBPIXEL_BITS).min(self.width as i64 - 1);
        let py0 = (min_y >> SUBPIXEL_BITS).max(0);
        let py1 = (max_y >> SUBPIXEL_BITS).min(self.height as i64 - 1);

        let inv_area = 1.0 / area as f64;
        for py in py0..=py1 {
            let cy = py * SUBPIXEL_ONE + HALF_PIXEL;
            for px in px0..=px1 {
                let cx = px * SUBPIXEL_ONE + HALF_PIXEL;
                let w0 = edge(v1, v2, cx, cy);
                let w1 = edge(v2, v0, cx, cy);
                let w2 = edge(v0, v1, cx, cy);
                if w0 + b0 < 0 || w1 + b1 < 0 || w2 + b2 < 0 {
                    continue;
                }
                let z = (w0 as f64 * v0.z + w1 as f64 * v1.z + w2 as f64 * v2.z) * inv_area;
                emit(
                    Fragment {
                        x: px as u32,
                        y: py as u32,
                        depth: z.clamp(0.0, 1.0) as f32,
                    },
                    front,
                );
            }
        }
    }
}

/// Twice the signed area of (a, b, p) on the pixel grid.
fn edge(a: Snapped, b: Snapped, px: i64, py: i64) -> i64 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::collections::HashMap;

    const VP: Viewport = Viewport {
        width: 16,
        height: 16,
    };

    fn collect(clip: [Vec4; 3], cull: CullMode) -> Vec<(Fragment, bool)> {
        let mut out = Vec::new();
        VP.rasterize(clip, cull, |f, front| out.push((f, front)));
        out
    }

    fn ndc(x: f32, y: f32, z: f32) -> Vec4 {
        Vec4::new(x, y, z, 1.0)
    }

    #[test]
    fn counter_clockwise_is_front() {
        let tri = [ndc(-1.0, -1.0, 0.5), ndc(1.0, -1.0, 0.5), ndc(-1.0, 1.0, 0.5)];
        let frags = collect(tri, CullMode::None);
        assert!(!frags.is_empty());
        assert!(frags.iter().all(|(_, front)| *front));
        assert!(collect(tri, CullMode::Back).len() == frags.len());
        assert!(collect(tri, CullMode::Front).is_empty());
    }

    #[test]
    fn shared_edge_covers_each_pixel_once() {
        let a = ndc(-1.0, -1.0, 0.2);
        let b = ndc(1.0, -1.0, 0.4);
        let c = ndc(1.0, 1.0, 0.6);
        let d = ndc(-1.0, 1.0, 0.8);
        let mut hits: HashMap<(u32, u32), u32> = HashMap::new();
        for tri in [[a, b, c], [a, c, d]] {
            for (f, _) in collect(tri, CullMode::None) {
                *hits.entry((f.x, f.y)).or_default() += 1;
            }
        }
        assert_eq!(hits.len(), 16 * 16);
        assert!(hits.values().all(|&n| n == 1));
    }

    #[test]
    fn depth_is_interpolated_linearly_in_screen_space() {
        let tri = [ndc(-1.0, -1.0, 0.0), ndc(3.0, -1.0, 1.0), ndc(-1.0, 3.0, 0.0)];
        for (f, _) in collect(tri, CullMode::None) {
            let x_ndc = (f.x as f32 + 0.5) / 16.0 * 2.0 - 1.0;
            assert_abs_diff_eq!(f.depth, (x_ndc + 1.0) / 4.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn identical_triangles_produce_identical_depths() {
        let tri = [
            Vec4::new(-0.7, -0.3, 0.31, 1.3),
            Vec4::new(0.9, -0.8, 0.77, 1.9),
            Vec4::new(0.1, 0.95, 0.42, 1.1),
        ];
        let first = collect(tri, CullMode::None);
        let again = collect(tri, CullMode::None);
        assert_eq!(first, again);
    }

    #[test]
    fn geometry_behind_the_eye_is_clipped() {
        let behind = [
            Vec4::new(-1.0, -1.0, 0.5, -1.0),
            Vec4::new(1.0, -1.0, 0.5, -1.0),
            Vec4::new(0.0, 1.0, 0.5, -1.0),
        ];
        assert!(collect(behind, CullMode::None).is_empty());

        let crossing = [
            Vec4::new(-0.5, -0.5, 0.2, 1.0),
            Vec4::new(0.5, -0.5, 0.2, 1.0),
            Vec4::new(0.0, 0.5, 0.2, -0.5),
        ];
        assert!(!collect(crossing, CullMode::None).is_empty());
    }

    #[test]
    fn clipping_keeps_depth_in_range() {
        let poly = clip_polygon(&[
            Vec4::new(0.0, 0.0, -0.5, 1.0),
            Vec4::new(0.5, 0.0, 1.5, 1.0),
            Vec4::new(0.0, 0.5, 0.5, 1.0),
        ]);
        assert!(poly.len() >= 3);
        for v in poly {
            assert!(v.z >= -1e-6 && v.z <= v.w + 1e-6);
        }
    }
}
