use std::sync::Arc;

use glam::Vec3;
use scs_common::{Mesh, MeshError, Transform};
use serde::{Deserialize, Serialize};

/// Errors from scene construction and loading.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("product {product} has no intersection members")]
    EmptyIntersections { product: usize },
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid primitive {name}: {reason}")]
    InvalidPrimitive { name: String, reason: String },
}

/// Surface appearance of a primitive when lit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub name: String,
    /// RGB color; alpha is opacity and only matters for passthrough objects.
    pub base_color: [f32; 4],
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

impl SurfaceMaterial {
    pub fn from_color(name: impl Into<String>, base_color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            base_color,
        }
    }

    pub fn rgb(&self) -> Vec3 {
        Vec3::new(self.base_color[0], self.base_color[1], self.base_color[2])
    }

    pub fn opacity(&self) -> f32 {
        self.base_color[3]
    }
}

/// One drawable convex primitive: shared geometry, a placement and a material.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub name: String,
    pub mesh: Arc<Mesh>,
    pub transform: Transform,
    pub material: SurfaceMaterial,
}

impl MeshInstance {
    pub fn new(name: impl Into<String>, mesh: Arc<Mesh>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform,
            material: SurfaceMaterial::default(),
        }
    }

    pub fn with_color(mut self, base_color: [f32; 4]) -> Self {
        self.material.base_color = base_color;
        self
    }

    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = material;
        self
    }
}

/// One term of a CSG expression in disjunctive normal form:
/// the intersection of `intersections` minus the union of `differences`.
#[derive(Debug, Clone)]
pub struct CsgProduct {
    intersections: Vec<MeshInstance>,
    differences: Vec<MeshInstance>,
}

impl CsgProduct {
    /// Build a product. Fails when there is nothing to intersect.
    pub fn new(
        intersections: Vec<MeshInstance>,
        differences: Vec<MeshInstance>,
    ) -> Result<Self, SceneError> {
        if intersections.is_empty() {
            return Err(SceneError::EmptyIntersections { product: 0 });
        }
        Ok(Self {
            intersections,
            differences,
        })
    }

    /// A product with a single member and nothing subtracted.
    pub fn solid(instance: MeshInstance) -> Self {
        Self {
            intersections: vec![instance],
            differences: Vec::new(),
        }
    }

    pub fn intersections(&self) -> &[MeshInstance] {
        &self.intersections
    }

    pub fn differences(&self) -> &[MeshInstance] {
        &self.differences
    }

    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }

    /// True for products that need no clipping at all.
    pub fn is_plain_solid(&self) -> bool {
        self.intersections.len() == 1 && self.differences.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.intersections.len() + self.differences.len()
    }
}

/// An ordered list of products plus passthrough objects. Owns no GPU resources.
#[derive(Debug, Clone, Default)]
pub struct CsgScene {
    products: Vec<CsgProduct>,
    passthrough: Vec<MeshInstance>,
}

impl CsgScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from products, reporting the index of any empty product.
    pub fn from_parts(
        products: Vec<(Vec<MeshInstance>, Vec<MeshInstance>)>,
        passthrough: Vec<MeshInstance>,
    ) -> Result<Self, SceneError> {
        let products = products
            .into_iter()
            .enumerate()
            .map(|(i, (ints, diffs))| {
                CsgProduct::new(ints, diffs).map_err(|e| match e {
                    SceneError::EmptyIntersections { .. } => {
                        SceneError::EmptyIntersections { product: i }
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            products,
            passthrough,
        })
    }

    pub fn add(&mut self, product: CsgProduct) {
        self.products.push(product);
    }

    pub fn add_passthrough(&mut self, instance: MeshInstance) {
        self.passthrough.push(instance);
    }

    pub fn products(&self) -> &[CsgProduct] {
        &self.products
    }

    pub fn passthrough(&self) -> &[MeshInstance] {
        &self.passthrough
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.passthrough.is_empty()
    }

    /// Total number of CSG members across all products.
    pub fn member_count(&self) -> usize {
        self.products.iter().map(CsgProduct::member_count).sum()
    }

    pub fn max_intersections(&self) -> usize {
        self.products
            .iter()
            .map(|p| p.intersections().len())
            .max()
            .unwrap_or(0)
    }

    pub fn max_differences(&self) -> usize {
        self.products
            .iter()
            .map(|p| p.differences().len())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    fn cube(name: &str) -> MeshInstance {
        MeshInstance::new(name, Arc::new(primitives::cuboid()), Transform::default())
    }

    #[test]
    fn product_requires_intersections() {
        let err = CsgProduct::new(vec![], vec![cube("hole")]).unwrap_err();
        assert!(matches!(err, SceneError::EmptyIntersections { .. }));
    }

    #[test]
    fn from_parts_reports_offending_product() {
        let err = CsgScene::from_parts(
            vec![(vec![cube("a")], vec![]), (vec![], vec![cube("b")])],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::EmptyIntersections { product: 1 }));
    }

    #[test]
    fn scene_statistics() {
        let mut scene = CsgScene::new();
        scene.add(CsgProduct::solid(cube("a")));
        scene.add(CsgProduct::new(vec![cube("b"), cube("c")], vec![cube("d")]).unwrap());
        scene.add_passthrough(cube("glass").with_color([0.2, 0.4, 1.0, 0.5]));

        assert_eq!(scene.products().len(), 2);
        assert_eq!(scene.member_count(), 4);
        assert_eq!(scene.max_intersections(), 2);
        assert_eq!(scene.max_differences(), 1);
        assert!(scene.products()[0].is_plain_solid());
        assert!(scene.products()[1].has_differences());
        assert_eq!(scene.passthrough()[0].material.opacity(), 0.5);
    }
}
