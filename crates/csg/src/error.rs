use scs_render::DeviceError;
use scs_scene::SceneError;

use crate::stage::ProductStage;

/// Errors from the CSG renderer.
#[derive(Debug, thiserror::Error)]
pub enum CsgError {
    #[error("device lacks a required capability: {0}")]
    Capability(String),
    #[error(
        "product {product} needs stencil values up to {required}, the stencil buffer holds {available}"
    )]
    StencilBudget {
        product: usize,
        required: u64,
        available: u32,
    },
    #[error("scene has {members} CSG members, ID colors allow {capacity}")]
    IdCapacity { members: usize, capacity: u32 },
    #[error("render called before set_size")]
    Unsized,
    #[error("product {product}: illegal stage transition {from} -> {to}")]
    StageOrder {
        product: usize,
        from: ProductStage,
        to: ProductStage,
    },
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}
