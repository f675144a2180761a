//! CPU implementation of [`GraphicsDevice`].
//!
//! Follows GPU fixed-function order per fragment: fragment program (which may
//! discard), stencil test, depth test, stencil update, depth write, masked
//! color write. Depth and stencil results are bit-for-bit deterministic, so
//! EQUAL depth tests between passes behave exactly as on hardware.

mod buffers;
mod raster;

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use scs_common::{Light, Mesh};

use crate::device::{
    Capabilities, ClearValues, DeviceError, DrawItem, FrameParams, GraphicsDevice, MeshMaterial,
    QuadMaterial, Surface, SurfaceImage, TargetDesc, TargetId,
};
use crate::state::{CullMode, PipelineState};

use buffers::Buffers;
pub use raster::{Fragment, SUBPIXEL_BITS, Viewport, clip_polygon};

const STENCIL_BITS: u32 = 8;
const MAX_TARGET_SIZE: u32 = 8192;

/// Counters accumulated across device calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub draw_calls: u64,
    pub triangles: u64,
    /// Fragments that passed every test and were written.
    pub fragments: u64,
}

/// Per-triangle constants of the fragment program.
#[derive(Debug, Clone, Copy)]
struct Flat {
    lit_front: [f32; 4],
    lit_back: [f32; 4],
}

/// A software rasterizer with an 8-bit unorm framebuffer and float targets.
#[derive(Debug)]
pub struct SoftwareDevice {
    framebuffer: Buffers,
    targets: BTreeMap<TargetId, Buffers>,
    next_target: u32,
    stats: DeviceStats,
}

impl SoftwareDevice {
    pub fn new(width: u32, height: u32) -> Result<Self, DeviceError> {
        check_size(width, height)?;
        Ok(Self {
            framebuffer: Buffers::new(width, height, true, true),
            targets: BTreeMap::new(),
            next_target: 1,
            stats: DeviceStats::default(),
        })
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DeviceStats::default();
    }

    /// Number of live render targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    fn buffers(&self, surface: Surface) -> Result<&Buffers, DeviceError> {
        match surface {
            Surface::Framebuffer => Ok(&self.framebuffer),
            Surface::Target(id) => self.targets.get(&id).ok_or(DeviceError::UnknownTarget(id)),
        }
    }

    fn buffers_mut(&mut self, surface: Surface) -> Result<&mut Buffers, DeviceError> {
        match surface {
            Surface::Framebuffer => Ok(&mut self.framebuffer),
            Surface::Target(id) => self
                .targets
                .get_mut(&id)
                .ok_or(DeviceError::UnknownTarget(id)),
        }
    }

    /// Copy the color of a sampled target, rejecting hazards and size mismatches.
    fn sample(&self, surface: Surface, id: TargetId) -> Result<Vec<[f32; 4]>, DeviceError> {
        if surface == Surface::Target(id) {
            return Err(DeviceError::ReadWriteHazard(surface));
        }
        let dst = self.buffers(surface)?.size();
        let src = self
            .targets
            .get(&id)
            .ok_or(DeviceError::UnknownTarget(id))?;
        if src.size() != dst {
            return Err(DeviceError::SizeMismatch {
                surface: Surface::Target(id),
                expected: dst,
                actual: src.size(),
            });
        }
        Ok(src.color.clone())
    }

    fn check_attachments(&self, surface: Surface, state: &PipelineState) -> Result<(), DeviceError> {
        let buf = self.buffers(surface)?;
        if state.stencil.is_some() && buf.stencil.is_none() {
            return Err(DeviceError::MissingAttachment {
                surface,
                attachment: "stencil",
            });
        }
        if state.uses_depth() && buf.depth.is_none() {
            return Err(DeviceError::MissingAttachment {
                surface,
                attachment: "depth",
            });
        }
        Ok(())
    }

    /// Run the per-fragment tests and writes for one shaded fragment.
    /// Returns true when the fragment was written.
    fn output(
        buf: &mut Buffers,
        state: &PipelineState,
        x: u32,
        y: u32,
        depth: f32,
        color: [f32; 4],
    ) -> bool {
        let i = buf.index(x, y);
        let max = (1u32 << STENCIL_BITS) - 1;

        if let (Some(s), Some(stencil)) = (state.stencil, buf.stencil.as_ref()) {
            if !s.compare.passes(s.reference & max, stencil[i] as u32) {
                return false;
            }
        }
        if let Some(depths) = buf.depth.as_mut() {
            if !state.depth.compare.passes(depth, depths[i]) {
                return false;
            }
            if state.depth.write {
                depths[i] = depth;
            }
        }
        if let (Some(s), Some(stencil)) = (state.stencil, buf.stencil.as_mut()) {
            stencil[i] = s.pass_op.apply(stencil[i] as u32, s.reference, max) as u8;
        }
        if state.color_mask.any() {
            buf.write_color(i, color, state.color_mask, state.blend);
        }
        true
    }
}

fn check_size(width: u32, height: u32) -> Result<(), DeviceError> {
    if width == 0 || height == 0 {
        return Err(DeviceError::ZeroSize { width, height });
    }
    if width > MAX_TARGET_SIZE || height > MAX_TARGET_SIZE {
        return Err(DeviceError::Backend(format!(
            "{width}x{height} exceeds the maximum surface size {MAX_TARGET_SIZE}"
        )));
    }
    Ok(())
}

/// Lit colors of both faces of one world-space triangle.
fn flat_shading(lights: &[Light], color: [f32; 4], world: &[Vec3; 3]) -> Flat {
    let normal = Mesh::face_normal(world).normalize_or_zero();
    let centroid = (world[0] + world[1] + world[2]) / 3.0;
    let base = Vec3::new(color[0], color[1], color[2]);
    let shade = |n: Vec3| {
        let c = Light::shade(lights, base, centroid, n);
        [c.x, c.y, c.z, color[3]]
    };
    Flat {
        lit_front: shade(normal),
        lit_back: shade(-normal),
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            stencil_bits: STENCIL_BITS,
            float_color_targets: true,
            max_target_size: MAX_TARGET_SIZE,
        }
    }

    fn size(&self) -> (u32, u32) {
        self.framebuffer.size()
    }

    fn resize_framebuffer(&mut self, width: u32, height: u32) -> Result<(), DeviceError> {
        check_size(width, height)?;
        self.framebuffer = Buffers::new(width, height, true, true);
        Ok(())
    }

    fn create_target(&mut self, desc: TargetDesc) -> Result<TargetId, DeviceError> {
        check_size(desc.width, desc.height)?;
        let id = TargetId(self.next_target);
        self.next_target += 1;
        self.targets.insert(
            id,
            Buffers::new(desc.width, desc.height, desc.depth_stencil, false),
        );
        tracing::trace!(?id, width = desc.width, height = desc.height, "target created");
        Ok(id)
    }

    fn release_target(&mut self, id: TargetId) {
        self.targets.remove(&id);
    }

    fn clear(&mut self, surface: Surface, values: ClearValues) -> Result<(), DeviceError> {
        self.buffers_mut(surface)?.clear(surface, values)
    }

    fn draw_meshes(
        &mut self,
        surface: Surface,
        frame: &FrameParams<'_>,
        state: &PipelineState,
        material: MeshMaterial,
        items: &[DrawItem<'_>],
    ) -> Result<(), DeviceError> {
        self.check_attachments(surface, state)?;
        let sampled = match material.sampled() {
            Some(id) => Some(self.sample(surface, id)?),
            None => None,
        };
        let sampled = sampled.as_deref();

        let mut stats = self.stats;
        stats.draw_calls += 1;
        let buf = self.buffers_mut(surface)?;
        let viewport = Viewport {
            width: buf.width,
            height: buf.height,
        };

        for item in items {
            let mvp: Mat4 = frame.view_projection * item.model;
            for corners in item.mesh.triangles() {
                stats.triangles += 1;
                let clip = corners.map(|p| mvp * p.extend(1.0));
                let flat = matches!(material, MeshMaterial::Lit).then(|| {
                    let world = corners.map(|p| item.model.transform_point3(p));
                    flat_shading(frame.lights, item.color, &world)
                });
                viewport.rasterize(clip, state.cull, |frag, front| {
                    let i = buf.index(frag.x, frag.y);
                    let color = match material {
                        MeshMaterial::DepthToAlpha => Some([0.0, 0.0, 0.0, frag.depth]),
                        MeshMaterial::Lit => flat.map(|f| if front { f.lit_front } else { f.lit_back }),
                        MeshMaterial::IdColor => {
                            let [r, g, b] = item.id.to_rgb();
                            Some([r, g, b, frag.depth])
                        }
                        MeshMaterial::IdMerge { .. } => sampled.and_then(|texels| {
                            let [r, g, b, _] = texels[i];
                            item.id.matches([r, g, b]).then(|| item.id.to_rgba())
                        }),
                        MeshMaterial::DepthMerge { .. } => sampled.and_then(|texels| {
                            let [r, g, b, a] = texels[i];
                            (frag.depth == a).then_some([r, g, b, 1.0])
                        }),
                    };
                    if let Some(color) = color {
                        if Self::output(buf, state, frag.x, frag.y, frag.depth, color) {
                            stats.fragments += 1;
                        }
                    }
                });
            }
        }
        self.stats = stats;
        Ok(())
    }

    fn draw_quad(
        &mut self,
        surface: Surface,
        state: &PipelineState,
        material: QuadMaterial,
    ) -> Result<(), DeviceError> {
        self.check_attachments(surface, state)?;
        let sampled = material
            .sampled()
            .into_iter()
            .map(|id| self.sample(surface, id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut stats = self.stats;
        stats.draw_calls += 1;
        let buf = self.buffers_mut(surface)?;
        // The quad is front facing.
        if state.cull != CullMode::Front {
            for y in 0..buf.height {
                for x in 0..buf.width {
                    let i = buf.index(x, y);
                    let color = match material {
                        QuadMaterial::ResetToFar => [0.0, 0.0, 0.0, 1.0],
                        QuadMaterial::NearestWins { .. } => {
                            scs_common::merge_nearest(sampled[0][i], sampled[1][i])
                        }
                        QuadMaterial::VisualizeDepth { .. } => {
                            scs_common::SyntheticDepth::from_texel(sampled[0][i]).visualize()
                        }
                    };
                    if Self::output(buf, state, x, y, 1.0, color) {
                        stats.fragments += 1;
                    }
                }
            }
        }
        self.stats = stats;
        Ok(())
    }

    fn read_surface(&mut self, surface: Surface) -> Result<SurfaceImage, DeviceError> {
        Ok(self.buffers(surface)?.image())
    }
}
