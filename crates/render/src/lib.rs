//! Graphics device interface for the CSG passes.
//!
//! # Invariants
//! - Every draw carries its complete pipeline state; devices keep none.
//! - A target is never sampled by the draw that writes it.
//! - Native depth is NDC z in [0,1], the same number the CSG passes store as
//!   synthetic depth.
//!
//! [`SoftwareDevice`] rasterizes on the CPU with GPU fill and depth rules and
//! backs the tests and the CLI's software path. The wgpu implementation lives
//! in `scs-render-wgpu`; both sit behind the same [`GraphicsDevice`] trait.

mod device;
pub mod software;
mod state;

pub use device::{
    Capabilities, ClearValues, DeviceError, DrawItem, FrameParams, GraphicsDevice, MeshMaterial,
    QuadMaterial, Surface, SurfaceImage, TargetDesc, TargetId,
};
pub use software::{DeviceStats, SoftwareDevice};
pub use state::{
    BlendMode, ColorMask, CompareFunction, CullMode, DepthState, PipelineState, StencilOperation,
    StencilState,
};

pub fn crate_info() -> &'static str {
    "scs-render v0.1.0"
}
