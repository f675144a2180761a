//! Depth/stencil pass engine: derives one product's visible surface.
//!
//! Every pass renders into one target with a depth/stencil attachment. After
//! a product's passes, native depth and the alpha channel hold the same
//! synthetic depth, and alpha is exactly 1.0 where there is no surface.

use scs_render::{
    ClearValues, ColorMask, CompareFunction, CullMode, DrawItem, FrameParams, GraphicsDevice,
    MeshMaterial, PipelineState, QuadMaterial, StencilOperation, Surface,
};

use crate::error::CsgError;
use crate::frame::ProductFrame;
use crate::stage::ProductStage;

/// What the surface-building passes write besides depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutput {
    /// Synthetic depth in alpha; color is filled in by the lighting resolve.
    Depth,
    /// Member ID in RGB and synthetic depth in alpha.
    Id,
}

impl PassOutput {
    fn material(self) -> MeshMaterial {
        match self {
            PassOutput::Depth => MeshMaterial::DepthToAlpha,
            PassOutput::Id => MeshMaterial::IdColor,
        }
    }

    fn mask(self) -> ColorMask {
        match self {
            PassOutput::Depth => ColorMask::ALPHA,
            PassOutput::Id => ColorMask::ALL,
        }
    }
}

/// Draw a product's members by role: intersections show their front faces,
/// differences their back faces.
pub fn draw_by_role<D: GraphicsDevice>(
    device: &mut D,
    surface: Surface,
    frame: &FrameParams<'_>,
    state: PipelineState,
    material: MeshMaterial,
    product: &ProductFrame<'_>,
) -> Result<(), CsgError> {
    device.draw_meshes(
        surface,
        frame,
        &state.with_cull(CullMode::Back),
        material,
        &product.intersections,
    )?;
    if !product.differences.is_empty() {
        device.draw_meshes(
            surface,
            frame,
            &state.with_cull(CullMode::Front),
            material,
            &product.differences,
        )?;
    }
    Ok(())
}

/// Runs the passes of one product against one target.
pub struct PassEngine<'d, 'f, D> {
    device: &'d mut D,
    frame: &'d FrameParams<'f>,
    target: Surface,
    output: PassOutput,
}

impl<'d, 'f, D: GraphicsDevice> PassEngine<'d, 'f, D> {
    pub fn new(
        device: &'d mut D,
        frame: &'d FrameParams<'f>,
        target: Surface,
        output: PassOutput,
    ) -> Self {
        Self {
            device,
            frame,
            target,
            output,
        }
    }

    fn stencil_max(&self) -> u32 {
        self.device.capabilities().stencil_max()
    }

    fn draw(
        &mut self,
        state: PipelineState,
        material: MeshMaterial,
        items: &[DrawItem<'_>],
    ) -> Result<(), CsgError> {
        self.device
            .draw_meshes(self.target, self.frame, &state, material, items)?;
        Ok(())
    }

    /// Full-screen reset of every pixel passing `stencil` to "no surface".
    fn reset_where(&mut self, compare: CompareFunction, reference: u32) -> Result<(), CsgError> {
        let state = PipelineState::default()
            .with_depth(CompareFunction::Always, true)
            .with_stencil(compare, reference, StencilOperation::Keep)
            .with_cull(CullMode::None);
        self.device
            .draw_quad(self.target, &state, QuadMaterial::ResetToFar)?;
        Ok(())
    }

    /// Build the full surface of `product`: intersection, subtraction and
    /// clip passes, then the lighting resolve in depth mode.
    pub fn render_product(&mut self, product: &mut ProductFrame<'_>) -> Result<(), CsgError> {
        tracing::debug!(
            product = product.index,
            intersections = product.intersections.len(),
            differences = product.differences.len(),
            output = ?self.output,
            "product passes"
        );
        self.convex_intersections(product.index, &product.intersections)?;
        product.stage.advance(ProductStage::IntersectionComputed)?;

        if !product.differences.is_empty() {
            product.stencil_codes = self.convex_subtractions(product.index, &product.differences)?;
            product.stage.advance(ProductStage::SubtractionApplied)?;
            self.clip_z(&product.intersections)?;
            product.stage.advance(ProductStage::ClipResolved)?;
        }

        if self.output == PassOutput::Depth {
            self.lighting(product)?;
        }
        product.stage.advance(ProductStage::Lit)?;
        Ok(())
    }

    /// Surface of the convex intersection of `members`. A single member takes
    /// the direct path.
    pub fn convex_intersections(
        &mut self,
        product: usize,
        members: &[DrawItem<'_>],
    ) -> Result<(), CsgError> {
        match members {
            [] => Ok(()),
            [single] => self.single_depth(single),
            _ => self.intersection_by_counting(product, members),
        }
    }

    /// Furthest front face, kept only where every member's back face lies behind it.
    pub fn intersection_by_counting(
        &mut self,
        product: usize,
        members: &[DrawItem<'_>],
    ) -> Result<(), CsgError> {
        let n = members.len() as u32;
        let available = self.stencil_max();
        if n > available {
            return Err(CsgError::StencilBudget {
                product,
                required: n as u64,
                available,
            });
        }
        tracing::trace!(product, members = n, "intersection pass");

        self.device.clear(
            self.target,
            ClearValues::color([0.0, 0.0, 0.0, 1.0])
                .with_depth(0.0)
                .with_stencil(0),
        )?;
        let furthest_front = PipelineState::default()
            .with_depth(CompareFunction::Greater, true)
            .with_cull(CullMode::Back)
            .with_color_mask(self.output.mask());
        self.draw(furthest_front, self.output.material(), members)?;

        let count_backs = PipelineState::default()
            .with_depth(CompareFunction::Greater, false)
            .with_cull(CullMode::Front)
            .with_color_mask(ColorMask::NONE)
            .with_stencil(CompareFunction::Always, 0, StencilOperation::IncrementClamp);
        self.draw(count_backs, MeshMaterial::DepthToAlpha, members)?;

        self.reset_where(CompareFunction::NotEqual, n)
    }

    /// Depth of a single convex mesh.
    pub fn single_depth(&mut self, member: &DrawItem<'_>) -> Result<(), CsgError> {
        tracing::trace!("single depth pass");
        self.device
            .clear(self.target, ClearValues::empty_surface())?;
        let state = PipelineState::default()
            .with_depth(CompareFunction::LessEqual, true)
            .with_cull(CullMode::Back)
            .with_color_mask(self.output.mask());
        self.draw(state, self.output.material(), std::slice::from_ref(member))
    }

    /// Carve every difference out of the current surface. Each difference is
    /// tried once per round, `n` rounds in all, each try with a fresh stencil
    /// code. Returns the number of codes used.
    pub fn convex_subtractions(
        &mut self,
        product: usize,
        differences: &[DrawItem<'_>],
    ) -> Result<u32, CsgError> {
        let n = differences.len() as u64;
        let available = self.stencil_max();
        if n * n > available as u64 {
            return Err(CsgError::StencilBudget {
                product,
                required: n * n,
                available,
            });
        }
        tracing::trace!(product, differences = n, "subtraction pass");

        self.device.clear(self.target, ClearValues::stencil(0))?;
        let mut code = 0u32;
        for _round in 0..differences.len() {
            for member in differences {
                code += 1;
                let only = std::slice::from_ref(member);

                let mark_front = PipelineState::default()
                    .with_depth(CompareFunction::LessEqual, false)
                    .with_cull(CullMode::Back)
                    .with_color_mask(ColorMask::NONE)
                    .with_stencil(CompareFunction::Always, code, StencilOperation::Replace);
                self.draw(mark_front, MeshMaterial::DepthToAlpha, only)?;

                let carve_back = PipelineState::default()
                    .with_depth(CompareFunction::GreaterEqual, true)
                    .with_cull(CullMode::Front)
                    .with_color_mask(self.output.mask())
                    .with_stencil(CompareFunction::Equal, code, StencilOperation::Keep);
                self.draw(carve_back, self.output.material(), only)?;
            }
        }
        Ok(code)
    }

    /// Reset pixels whose surface lies outside some intersection member: a
    /// member's back face in front of the surface means the viewer sees
    /// through the remaining solid.
    pub fn clip_z(&mut self, intersections: &[DrawItem<'_>]) -> Result<(), CsgError> {
        tracing::trace!(members = intersections.len(), "clip-z pass");
        self.device.clear(self.target, ClearValues::stencil(0))?;
        let mark = PipelineState::default()
            .with_depth(CompareFunction::Less, false)
            .with_cull(CullMode::Front)
            .with_color_mask(ColorMask::NONE)
            .with_stencil(CompareFunction::Always, 1, StencilOperation::Replace);
        self.draw(mark, MeshMaterial::DepthToAlpha, intersections)?;
        self.reset_where(CompareFunction::Equal, 1)
    }

    /// Shade exactly the fragments on the computed surface, leaving alpha alone.
    pub fn lighting(&mut self, product: &ProductFrame<'_>) -> Result<(), CsgError> {
        tracing::trace!(product = product.index, "lighting resolve");
        let state = PipelineState::default()
            .with_depth(CompareFunction::Equal, false)
            .with_color_mask(ColorMask::RGB);
        draw_by_role(
            self.device,
            self.target,
            self.frame,
            state,
            MeshMaterial::Lit,
            product,
        )
    }
}
