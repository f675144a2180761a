use scs_render::{
    ClearValues, CullMode, DeviceError, GraphicsDevice, PipelineState, QuadMaterial, Surface,
    SurfaceImage, TargetDesc, TargetId,
};

use crate::error::CsgError;
use crate::options::Strategy;
use crate::targets::FrameTargets;

/// Auxiliary buffers read back after compositing while debugging is on.
#[derive(Debug, Clone)]
pub struct DebugCapture {
    pub strategy: Strategy,
    /// Scratch target as left by the last product's passes.
    pub scratch: SurfaceImage,
    /// Final accumulator; only the classic strategy uses one.
    pub accumulator: Option<SurfaceImage>,
    /// Synthetic depth of the composited buffer (or the scratch target) as gray levels.
    pub depth_view: SurfaceImage,
}

impl DebugCapture {
    pub fn capture<D: GraphicsDevice>(
        device: &mut D,
        targets: &FrameTargets,
        strategy: Strategy,
        product_count: usize,
    ) -> Result<Self, CsgError> {
        let scratch = device.read_surface(Surface::Target(targets.scratch))?;
        let (accumulator, depth_source) = if strategy == Strategy::Classic {
            let merged = targets.accum_final(product_count);
            (
                Some(device.read_surface(Surface::Target(merged))?),
                merged,
            )
        } else {
            (None, targets.scratch)
        };
        let depth_view = visualize_depth(device, targets, depth_source)?;
        Ok(Self {
            strategy,
            scratch,
            accumulator,
            depth_view,
        })
    }
}

/// Render the synthetic depth of `src` as gray into a temporary target and read it back.
fn visualize_depth<D: GraphicsDevice>(
    device: &mut D,
    targets: &FrameTargets,
    src: TargetId,
) -> Result<SurfaceImage, CsgError> {
    let view = device.create_target(TargetDesc {
        width: targets.width,
        height: targets.height,
        depth_stencil: false,
    })?;
    let result = draw_depth_view(device, view, src);
    device.release_target(view);
    Ok(result?)
}

fn draw_depth_view<D: GraphicsDevice>(
    device: &mut D,
    view: TargetId,
    src: TargetId,
) -> Result<SurfaceImage, DeviceError> {
    device.clear(Surface::Target(view), ClearValues::color([0.0; 4]))?;
    let state = PipelineState::default()
        .without_depth()
        .with_cull(CullMode::None);
    device.draw_quad(
        Surface::Target(view),
        &state,
        QuadMaterial::VisualizeDepth { src },
    )?;
    device.read_surface(Surface::Target(view))
}
