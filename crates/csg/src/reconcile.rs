//! Writing derived CSG surfaces into the framebuffer's native depth.
//!
//! Each function re-renders product geometry into the framebuffer with a
//! material that keeps only fragments lying on an already-computed surface.
//! Because a kept fragment's own depth is written, native depth afterwards
//! matches the synthetic depth exactly and ordinary geometry drawn later is
//! occluded correctly.

use scs_render::{
    ColorMask, CompareFunction, FrameParams, GraphicsDevice, MeshMaterial, PipelineState, Surface,
    TargetId,
};

use crate::error::CsgError;
use crate::frame::ProductFrame;
use crate::passes::draw_by_role;

/// Reconcile the fully composited buffer `merged` with native depth.
/// Depth testing is off: the texture already decided visibility.
pub fn reconcile_depth<D: GraphicsDevice>(
    device: &mut D,
    frame: &FrameParams<'_>,
    products: &[ProductFrame<'_>],
    merged: TargetId,
) -> Result<(), CsgError> {
    tracing::trace!(products = products.len(), "reconcile depth");
    let state = PipelineState::default().with_depth(CompareFunction::Always, true);
    for product in products {
        draw_by_role(
            device,
            Surface::Framebuffer,
            frame,
            state,
            MeshMaterial::DepthMerge { merged },
            product,
        )?;
    }
    Ok(())
}

/// Merge one product's surface from `texture` onto the framebuffer, letting
/// the native depth test pick the nearer of it and what is already there.
pub fn merge_product_with_texture<D: GraphicsDevice>(
    device: &mut D,
    frame: &FrameParams<'_>,
    product: &ProductFrame<'_>,
    texture: TargetId,
) -> Result<(), CsgError> {
    tracing::trace!(product = product.index, "merge product onto framebuffer");
    draw_by_role(
        device,
        Surface::Framebuffer,
        frame,
        PipelineState::default(),
        MeshMaterial::DepthMerge { merged: texture },
        product,
    )
}

/// Write the depth and ID color of the members whose ID survived in `ids`.
pub fn merge_ids<D: GraphicsDevice>(
    device: &mut D,
    frame: &FrameParams<'_>,
    product: &ProductFrame<'_>,
    ids: TargetId,
) -> Result<(), CsgError> {
    tracing::trace!(product = product.index, "merge ids");
    draw_by_role(
        device,
        Surface::Framebuffer,
        frame,
        PipelineState::default(),
        MeshMaterial::IdMerge { ids },
        product,
    )
}

/// Shade every member exactly where native depth says it is visible.
pub fn render_final_lit<D: GraphicsDevice>(
    device: &mut D,
    frame: &FrameParams<'_>,
    products: &[ProductFrame<'_>],
) -> Result<(), CsgError> {
    tracing::trace!(products = products.len(), "final lit pass");
    let state = PipelineState::default()
        .with_depth(CompareFunction::Equal, false)
        .with_color_mask(ColorMask::RGB);
    for product in products {
        draw_by_role(
            device,
            Surface::Framebuffer,
            frame,
            state,
            MeshMaterial::Lit,
            product,
        )?;
    }
    Ok(())
}
