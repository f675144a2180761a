//! wgpu backend for the CSG renderer.
//!
//! [`WgpuDevice`] implements the renderer-agnostic `GraphicsDevice` on a
//! headless wgpu device: an 8-bit framebuffer and float render targets, each
//! with a depth/stencil attachment, and one cached render pipeline per
//! (program, fixed-function state, surface format) combination.
//!
//! # Invariants
//! - Every device call is encoded and submitted on its own, in call order.
//! - Mesh positions are transformed by one invariant vertex program, so a
//!   triangle lands on the same depth in every pass.
//! - The stencil reference is dynamic state; it never splits the pipeline cache.

mod convert;
mod gpu;
mod shaders;

pub use gpu::WgpuDevice;
pub use shaders::{CSG_SHADER, MAX_LIGHTS};
