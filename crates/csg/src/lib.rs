//! Image-space CSG rendering with depth and stencil passes.
//!
//! A scene is a list of products, each the intersection of convex meshes
//! minus a union of convex meshes. Every product's visible surface is derived
//! in an off-screen target by depth and stencil passes alone; the surfaces are
//! then composited nearest-wins and written into the framebuffer's native
//! depth so ordinary geometry can be drawn against them.
//!
//! # Invariants
//! - Synthetic depth (alpha) and native depth hold the same number; alpha 1.0
//!   means "no surface".
//! - Stencil codes never exceed the device's stencil range; scenes that would
//!   need more are rejected when installed.
//! - Each frame starts from cleared accumulators and sees one scene snapshot.
//! - All three compositing strategies leave the same surfaces in the
//!   framebuffer.

mod compositor;
mod debug;
mod error;
mod frame;
mod options;
pub mod passes;
mod reconcile;
mod renderer;
mod stage;
mod targets;

#[cfg(test)]
mod scenarios;

pub use compositor::{
    ClassicCompositor, Compositor, IdColorCompositor, OptimizeMergesCompositor, compose,
};
pub use debug::DebugCapture;
pub use error::CsgError;
pub use frame::{FrameContext, ProductFrame, draw_item, product_frames};
pub use options::{ParseStrategyError, RenderOptions, Strategy};
pub use passes::{PassEngine, PassOutput};
pub use reconcile::{merge_ids, merge_product_with_texture, reconcile_depth, render_final_lit};
pub use renderer::{FrameReport, ProductReport, SceneInstaller, SceneLimits, ScsRenderer};
pub use stage::{ProductStage, StageTracker};
pub use targets::FrameTargets;

pub fn crate_info() -> &'static str {
    "scs-csg v0.1.0"
}
