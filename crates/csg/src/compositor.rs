//! Cross-product compositing strategies.

use scs_render::{
    CullMode, GraphicsDevice, MeshMaterial, PipelineState, QuadMaterial, Surface,
};

use crate::error::CsgError;
use crate::frame::FrameContext;
use crate::options::Strategy;
use crate::passes::{PassEngine, PassOutput, draw_by_role};
use crate::reconcile::{merge_ids, merge_product_with_texture, reconcile_depth, render_final_lit};
use crate::stage::ProductStage;

/// Combines every product of a frame into the framebuffer, leaving the
/// nearest valid CSG surface in both color and native depth.
pub trait Compositor {
    fn strategy(&self) -> Strategy;

    fn compose<D: GraphicsDevice>(&self, ctx: &mut FrameContext<'_, '_, D>)
    -> Result<(), CsgError>;
}

/// Run the compositor selected by `strategy`.
pub fn compose<D: GraphicsDevice>(
    strategy: Strategy,
    ctx: &mut FrameContext<'_, '_, D>,
) -> Result<(), CsgError> {
    match strategy {
        Strategy::Classic => ClassicCompositor.compose(ctx),
        Strategy::OptimizeMerges => OptimizeMergesCompositor.compose(ctx),
        Strategy::IdColors => IdColorCompositor.compose(ctx),
    }
}

/// Accumulate-and-swap: each product is merged into the other accumulator,
/// then the final accumulator is reconciled once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicCompositor;

impl Compositor for ClassicCompositor {
    fn strategy(&self) -> Strategy {
        Strategy::Classic
    }

    fn compose<D: GraphicsDevice>(
        &self,
        ctx: &mut FrameContext<'_, '_, D>,
    ) -> Result<(), CsgError> {
        let targets = ctx.targets;
        let scratch = Surface::Target(targets.scratch);
        let merge = PipelineState::default()
            .without_depth()
            .with_cull(CullMode::None);

        for (i, product) in ctx.products.iter_mut().enumerate() {
            PassEngine::new(ctx.device, &ctx.frame, scratch, PassOutput::Depth)
                .render_product(product)?;
            ctx.device.draw_quad(
                Surface::Target(targets.accum_write(i)),
                &merge,
                QuadMaterial::NearestWins {
                    src: targets.scratch,
                    prev: targets.accum_read(i),
                },
            )?;
            product.stage.advance(ProductStage::Merged)?;
        }

        let merged = targets.accum_final(ctx.products.len());
        reconcile_depth(ctx.device, &ctx.frame, ctx.products, merged)?;
        for product in ctx.products.iter_mut() {
            product.stage.advance(ProductStage::Reconciled)?;
        }
        Ok(())
    }
}

/// Plain solids go straight to the framebuffer; every other product is merged
/// onto the framebuffer right after its passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeMergesCompositor;

impl Compositor for OptimizeMergesCompositor {
    fn strategy(&self) -> Strategy {
        Strategy::OptimizeMerges
    }

    fn compose<D: GraphicsDevice>(
        &self,
        ctx: &mut FrameContext<'_, '_, D>,
    ) -> Result<(), CsgError> {
        let scratch = ctx.targets.scratch;
        for product in ctx.products.iter_mut() {
            if product.is_plain_solid() {
                tracing::trace!(product = product.index, "direct draw");
                draw_by_role(
                    ctx.device,
                    Surface::Framebuffer,
                    &ctx.frame,
                    PipelineState::default(),
                    MeshMaterial::Lit,
                    product,
                )?;
                product.stage.advance_through(ProductStage::Reconciled)?;
                continue;
            }
            PassEngine::new(
                ctx.device,
                &ctx.frame,
                Surface::Target(scratch),
                PassOutput::Depth,
            )
            .render_product(product)?;
            merge_product_with_texture(ctx.device, &ctx.frame, product, scratch)?;
            product.stage.advance(ProductStage::Merged)?;
            product.stage.advance(ProductStage::Reconciled)?;
        }
        Ok(())
    }
}

/// Products resolve to member IDs; the framebuffer keeps the nearest matching
/// member per pixel, then one EQUAL-depth pass shades it.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdColorCompositor;

impl Compositor for IdColorCompositor {
    fn strategy(&self) -> Strategy {
        Strategy::IdColors
    }

    fn compose<D: GraphicsDevice>(
        &self,
        ctx: &mut FrameContext<'_, '_, D>,
    ) -> Result<(), CsgError> {
        let scratch = ctx.targets.scratch;
        for product in ctx.products.iter_mut() {
            PassEngine::new(
                ctx.device,
                &ctx.frame,
                Surface::Target(scratch),
                PassOutput::Id,
            )
            .render_product(product)?;
            merge_ids(ctx.device, &ctx.frame, product, scratch)?;
            product.stage.advance(ProductStage::Merged)?;
        }
        render_final_lit(ctx.device, &ctx.frame, ctx.products)?;
        for product in ctx.products.iter_mut() {
            product.stage.advance(ProductStage::Reconciled)?;
        }
        Ok(())
    }
}
