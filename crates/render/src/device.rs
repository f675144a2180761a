use glam::Mat4;
use scs_common::{IdColor, Light, Mesh, SyntheticDepth};

use crate::state::PipelineState;

/// Errors raised by a graphics device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("unknown render target {0:?}")]
    UnknownTarget(TargetId),
    #[error("size mismatch: {surface:?} is {actual:?}, expected {expected:?}")]
    SizeMismatch {
        surface: Surface,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("zero-sized surface {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    #[error("{0:?} is sampled while being written")]
    ReadWriteHazard(Surface),
    #[error("{surface:?} has no {attachment} attachment")]
    MissingAttachment {
        surface: Surface,
        attachment: &'static str,
    },
    #[error("backend error: {0}")]
    Backend(String),
}

/// Opaque handle of an off-screen render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

/// Where a device call renders to or reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// The presented framebuffer: 8-bit color plus native depth/stencil.
    Framebuffer,
    /// A float RGBA render target.
    Target(TargetId),
}

/// What a device can do. Checked once when the CSG renderer is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub stencil_bits: u32,
    pub float_color_targets: bool,
    pub max_target_size: u32,
}

impl Capabilities {
    /// Largest value the stencil buffer can hold.
    pub fn stencil_max(&self) -> u32 {
        if self.stencil_bits >= 32 {
            u32::MAX
        } else {
            (1u32 << self.stencil_bits) - 1
        }
    }
}

/// Float RGBA off-screen target, optionally with a depth/stencil attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDesc {
    pub width: u32,
    pub height: u32,
    pub depth_stencil: bool,
}

/// Values written by [`GraphicsDevice::clear`]. `None` leaves that aspect untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearValues {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
    pub stencil: Option<u32>,
}

impl ClearValues {
    /// Color `(0,0,0,1)`, depth far, stencil zero: every pixel is "no surface".
    pub fn empty_surface() -> Self {
        Self {
            color: Some([0.0, 0.0, 0.0, SyntheticDepth::FAR.value()]),
            depth: Some(1.0),
            stencil: Some(0),
        }
    }

    pub fn color(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    pub fn stencil(value: u32) -> Self {
        Self {
            stencil: Some(value),
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_stencil(mut self, value: u32) -> Self {
        self.stencil = Some(value);
        self
    }
}

/// Per-frame inputs shared by every draw of a pass.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams<'a> {
    pub view_projection: Mat4,
    pub lights: &'a [Light],
}

/// One mesh instance of a draw call.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub mesh: &'a Mesh,
    pub model: Mat4,
    /// Surface color for [`MeshMaterial::Lit`]; alpha is opacity.
    pub color: [f32; 4],
    pub id: IdColor,
}

/// Fragment program used for a mesh draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshMaterial {
    /// `(0, 0, 0, z)`: the fragment's depth in the alpha channel.
    DepthToAlpha,
    /// Flat Lambert shading by the frame lights; alpha is the item's opacity.
    Lit,
    /// The item's ID color with the fragment's depth in alpha.
    IdColor,
    /// Keep fragments whose ID matches the ID stored at the same pixel of `ids`.
    IdMerge { ids: TargetId },
    /// Keep fragments whose depth equals the synthetic depth stored at the
    /// same pixel of `merged`; writes the stored color with alpha 1.
    DepthMerge { merged: TargetId },
}

impl MeshMaterial {
    pub fn sampled(&self) -> Option<TargetId> {
        match *self {
            MeshMaterial::IdMerge { ids } => Some(ids),
            MeshMaterial::DepthMerge { merged } => Some(merged),
            _ => None,
        }
    }
}

/// Fragment program of a full-screen quad. The quad lies at depth 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuadMaterial {
    /// `(0, 0, 0, 1)`: the "no surface" marker.
    ResetToFar,
    /// Per pixel, `src` if it is nearer than `prev` (new sample wins near-ties).
    NearestWins { src: TargetId, prev: TargetId },
    /// Gray visualization of the synthetic depth stored in `src`.
    VisualizeDepth { src: TargetId },
}

impl QuadMaterial {
    pub fn sampled(&self) -> Vec<TargetId> {
        match *self {
            QuadMaterial::ResetToFar => Vec::new(),
            QuadMaterial::NearestWins { src, prev } => vec![src, prev],
            QuadMaterial::VisualizeDepth { src } => vec![src],
        }
    }
}

/// Host copy of a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, top row first.
    pub color: Vec<[f32; 4]>,
    /// Native depth, when the surface has it and the backend can read it.
    pub depth: Option<Vec<f32>>,
    pub stencil: Option<Vec<u8>>,
}

impl SurfaceImage {
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        self.color[self.index(x, y)]
    }

    pub fn synthetic_depth(&self, x: u32, y: u32) -> SyntheticDepth {
        SyntheticDepth::from_texel(self.texel(x, y))
    }

    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        let i = self.index(x, y);
        self.depth.as_ref().map(|d| d[i])
    }

    pub fn stencil_at(&self, x: u32, y: u32) -> Option<u8> {
        let i = self.index(x, y);
        self.stencil.as_ref().map(|s| s[i])
    }

    /// Quantize to 8-bit RGBA for image output.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.color
            .iter()
            .flat_map(|c| c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }

    /// Replace every texel by the gray visualization of its synthetic depth.
    pub fn visualize_depth(&self) -> SurfaceImage {
        SurfaceImage {
            color: self
                .color
                .iter()
                .map(|t| SyntheticDepth::from_texel(*t).visualize())
                .collect(),
            depth: None,
            stencil: None,
            ..*self
        }
    }

    /// Same image with alpha forced to 1, for viewing RGB buffers.
    pub fn opaque_rgb(&self) -> SurfaceImage {
        SurfaceImage {
            color: self.color.iter().map(|&[r, g, b, _]| [r, g, b, 1.0]).collect(),
            depth: None,
            stencil: None,
            ..*self
        }
    }
}

/// Renderer-agnostic device. The CSG passes only ever talk to this trait.
///
/// Every call carries its full pipeline state; a device keeps no state between
/// calls other than the contents of its surfaces.
pub trait GraphicsDevice {
    fn capabilities(&self) -> Capabilities;

    /// Framebuffer size in pixels.
    fn size(&self) -> (u32, u32);

    fn resize_framebuffer(&mut self, width: u32, height: u32) -> Result<(), DeviceError>;

    fn create_target(&mut self, desc: TargetDesc) -> Result<TargetId, DeviceError>;

    /// Release a target. Unknown ids are ignored.
    fn release_target(&mut self, id: TargetId);

    fn clear(&mut self, surface: Surface, values: ClearValues) -> Result<(), DeviceError>;

    fn draw_meshes(
        &mut self,
        surface: Surface,
        frame: &FrameParams<'_>,
        state: &PipelineState,
        material: MeshMaterial,
        items: &[DrawItem<'_>],
    ) -> Result<(), DeviceError>;

    /// Draw a full-screen quad at depth 1.0, front facing.
    fn draw_quad(
        &mut self,
        surface: Surface,
        state: &PipelineState,
        material: QuadMaterial,
    ) -> Result<(), DeviceError>;

    fn read_surface(&mut self, surface: Surface) -> Result<SurfaceImage, DeviceError>;
}
