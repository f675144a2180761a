//! Shared value types: transforms, meshes, lights and the two per-pixel
//! encodings the CSG passes carry through color channels.
//!
//! # Invariants
//! - Native depth and synthetic depth use the same [0,1] range (NDC z).
//! - An ID color of zero means "no surface".

mod depth;
mod id;
mod light;
mod mesh;
mod types;

pub use depth::{MERGE_EPSILON, SyntheticDepth, merge_nearest};
pub use id::{ID_TOLERANCE, IdColor};
pub use light::Light;
pub use mesh::{Mesh, MeshError};
pub use types::{MeshId, Transform};

pub fn crate_info() -> &'static str {
    "scs-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
