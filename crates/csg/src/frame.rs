//! Per-frame views of the scene: draw items, ID assignment and stage tracking.

use scs_common::IdColor;
use scs_render::{DrawItem, FrameParams};
use scs_scene::{CsgProduct, CsgScene, MeshInstance};

use crate::stage::StageTracker;
use crate::targets::FrameTargets;

/// Draw item of one scene member.
pub fn draw_item(instance: &MeshInstance, id: IdColor) -> DrawItem<'_> {
    DrawItem {
        mesh: &instance.mesh,
        model: instance.transform.matrix(),
        color: instance.material.base_color,
        id,
    }
}

/// One product as the passes see it during a frame.
#[derive(Debug, Clone)]
pub struct ProductFrame<'a> {
    pub index: usize,
    pub intersections: Vec<DrawItem<'a>>,
    pub differences: Vec<DrawItem<'a>>,
    pub stage: StageTracker,
    /// Stencil codes used by the subtraction pass this frame.
    pub stencil_codes: u32,
}

impl<'a> ProductFrame<'a> {
    /// Build the frame view of `product`, numbering its members from `first_id`.
    pub fn new(index: usize, product: &'a CsgProduct, first_id: u32) -> Self {
        let mut next = first_id;
        let mut items = |members: &'a [MeshInstance]| -> Vec<DrawItem<'a>> {
            members
                .iter()
                .map(|m| {
                    let id = IdColor::new(next).unwrap_or(IdColor::NONE);
                    next += 1;
                    draw_item(m, id)
                })
                .collect()
        };
        let intersections = items(product.intersections());
        let differences = items(product.differences());
        Self {
            index,
            stage: StageTracker::new(index, !differences.is_empty()),
            intersections,
            differences,
            stencil_codes: 0,
        }
    }

    /// Plain solids have one member and nothing subtracted.
    pub fn is_plain_solid(&self) -> bool {
        self.intersections.len() == 1 && self.differences.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.intersections.len() + self.differences.len()
    }
}

/// Frame views of every product. IDs run from 1 in scene order.
pub fn product_frames(scene: &CsgScene) -> Vec<ProductFrame<'_>> {
    let mut first_id = 1u32;
    scene
        .products()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let frame = ProductFrame::new(i, p, first_id);
            first_id += p.member_count() as u32;
            frame
        })
        .collect()
}

/// Everything a compositor needs for one frame.
pub struct FrameContext<'f, 'a, D> {
    pub device: &'f mut D,
    pub frame: FrameParams<'a>,
    pub targets: &'f FrameTargets,
    pub products: &'f mut [ProductFrame<'a>],
}
