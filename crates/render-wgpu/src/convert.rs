//! Mapping of device-independent pipeline state onto wgpu state.

use scs_render::{
    BlendMode, ColorMask, CompareFunction, CullMode, PipelineState, StencilOperation,
};

pub fn compare(f: CompareFunction) -> wgpu::CompareFunction {
    match f {
        CompareFunction::Never => wgpu::CompareFunction::Never,
        CompareFunction::Less => wgpu::CompareFunction::Less,
        CompareFunction::Equal => wgpu::CompareFunction::Equal,
        CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        CompareFunction::Greater => wgpu::CompareFunction::Greater,
        CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        CompareFunction::Always => wgpu::CompareFunction::Always,
    }
}

pub fn stencil_op(op: StencilOperation) -> wgpu::StencilOperation {
    match op {
        StencilOperation::Keep => wgpu::StencilOperation::Keep,
        StencilOperation::Zero => wgpu::StencilOperation::Zero,
        StencilOperation::Replace => wgpu::StencilOperation::Replace,
        StencilOperation::IncrementClamp => wgpu::StencilOperation::IncrementClamp,
        StencilOperation::DecrementClamp => wgpu::StencilOperation::DecrementClamp,
    }
}

pub fn cull(mode: CullMode) -> Option<wgpu::Face> {
    match mode {
        CullMode::None => None,
        CullMode::Back => Some(wgpu::Face::Back),
        CullMode::Front => Some(wgpu::Face::Front),
    }
}

pub fn color_writes(mask: ColorMask) -> wgpu::ColorWrites {
    let mut writes = wgpu::ColorWrites::empty();
    if mask.rgb {
        writes |= wgpu::ColorWrites::COLOR;
    }
    if mask.alpha {
        writes |= wgpu::ColorWrites::ALPHA;
    }
    writes
}

/// `None` for plain replacement, which float targets require.
pub fn blend(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        BlendMode::Replace => None,
        BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
    }
}

/// Depth/stencil state for a surface with the given attachment format.
///
/// Stencil faces are identical; the reference value is set per draw.
pub fn depth_stencil(
    state: &PipelineState,
    format: Option<wgpu::TextureFormat>,
) -> Option<wgpu::DepthStencilState> {
    let format = format?;
    let stencil = match state.stencil {
        Some(s) => {
            let face = wgpu::StencilFaceState {
                compare: compare(s.compare),
                fail_op: wgpu::StencilOperation::Keep,
                depth_fail_op: wgpu::StencilOperation::Keep,
                pass_op: stencil_op(s.pass_op),
            };
            wgpu::StencilState {
                front: face,
                back: face,
                read_mask: 0xff,
                write_mask: 0xff,
            }
        }
        None => wgpu::StencilState::default(),
    };
    Some(wgpu::DepthStencilState {
        format,
        depth_write_enabled: state.depth.write,
        depth_compare: compare(state.depth.compare),
        stencil,
        bias: wgpu::DepthBiasState::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_masks_map_to_channel_groups() {
        assert_eq!(color_writes(ColorMask::ALL), wgpu::ColorWrites::ALL);
        assert_eq!(color_writes(ColorMask::NONE), wgpu::ColorWrites::empty());
        assert_eq!(color_writes(ColorMask::ALPHA), wgpu::ColorWrites::ALPHA);
        assert_eq!(color_writes(ColorMask::RGB), wgpu::ColorWrites::COLOR);
    }

    #[test]
    fn counting_state_increments_on_both_faces() {
        let state = PipelineState::default()
            .with_depth(CompareFunction::Greater, false)
            .with_cull(CullMode::Front)
            .with_stencil(
                CompareFunction::Always,
                0,
                StencilOperation::IncrementClamp,
            );
        let ds = depth_stencil(&state, Some(wgpu::TextureFormat::Depth24PlusStencil8)).unwrap();
        assert!(!ds.depth_write_enabled);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Greater);
        assert_eq!(ds.stencil.front, ds.stencil.back);
        assert_eq!(ds.stencil.front.pass_op, wgpu::StencilOperation::IncrementClamp);
        assert_eq!(ds.stencil.front.depth_fail_op, wgpu::StencilOperation::Keep);
        assert_eq!(cull(state.cull), Some(wgpu::Face::Front));
    }

    #[test]
    fn stencil_is_inert_without_a_stencil_test() {
        let ds = depth_stencil(
            &PipelineState::default(),
            Some(wgpu::TextureFormat::Depth32FloatStencil8),
        )
        .unwrap();
        assert!(!ds.stencil.is_enabled());
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(ds.depth_write_enabled);
    }

    #[test]
    fn surfaces_without_attachment_get_no_depth_state() {
        let state = PipelineState::default().without_depth();
        assert!(depth_stencil(&state, None).is_none());
    }

    #[test]
    fn only_alpha_blending_sets_a_blend_state() {
        assert!(blend(BlendMode::Replace).is_none());
        assert_eq!(blend(BlendMode::Alpha), Some(wgpu::BlendState::ALPHA_BLENDING));
    }
}
