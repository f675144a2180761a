//! CSG product model: the normalized scene the renderer consumes.
//!
//! A scene is a list of products, each the intersection of convex primitive
//! instances minus a union of convex "difference" instances, plus a list of
//! ordinary passthrough objects drawn without CSG processing.
//!
//! # Invariants
//! - Every product has at least one intersection member.
//! - Members are convex; this is a caller contract and is not checked.
//! - Products are immutable once built; passes never mutate them.

mod camera;
mod desc;
pub mod primitives;
mod product;

pub use camera::Camera;
pub use desc::{LoadedScene, PrimitiveDesc, ProductDesc, SceneDesc, Shape};
pub use product::{CsgProduct, CsgScene, MeshInstance, SceneError, SurfaceMaterial};

pub fn crate_info() -> &'static str {
    "scs-scene v0.1.0"
}
