//! JSON scene description.
//!
//! ```json
//! {
//!   "lights": [{ "kind": "ambient", "color": [1, 1, 1], "intensity": 0.2 }],
//!   "products": [
//!     {
//!       "intersections": [{ "name": "ball", "shape": { "type": "sphere" } }],
//!       "differences": [{ "shape": { "type": "cylinder" }, "scale": [0.4, 3, 0.4] }]
//!     }
//!   ],
//!   "passthrough": []
//! }
//! ```
//!
//! Primitives with the same shape parameters share one mesh.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::{EulerRot, Quat, Vec3};
use scs_common::{Light, Mesh, Transform};
use serde::{Deserialize, Serialize};

use crate::primitives;
use crate::product::{CsgScene, MeshInstance, SceneError, SurfaceMaterial};

/// Primitive shape and its tessellation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Box,
    Sphere {
        #[serde(default = "default_segments")]
        segments: u32,
        #[serde(default = "default_rings")]
        rings: u32,
    },
    Cylinder {
        #[serde(default = "default_segments")]
        segments: u32,
    },
}

fn default_segments() -> u32 {
    32
}

fn default_rings() -> u32 {
    16
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_color() -> [f32; 4] {
    SurfaceMaterial::default().base_color
}

impl Shape {
    fn build(self) -> Mesh {
        match self {
            Shape::Box => primitives::cuboid(),
            Shape::Sphere { segments, rings } => primitives::uv_sphere(segments, rings),
            Shape::Cylinder { segments } => primitives::cylinder(segments),
        }
    }
}

/// One placed primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveDesc {
    #[serde(default)]
    pub name: Option<String>,
    pub shape: Shape,
    #[serde(default)]
    pub position: Vec3,
    /// XYZ Euler angles in degrees.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default = "default_color")]
    pub color: [f32; 4],
}

impl PrimitiveDesc {
    pub fn new(shape: Shape) -> Self {
        Self {
            name: None,
            shape,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            color: default_color(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn colored(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    fn transform(&self) -> Transform {
        let r = self.rotation * (std::f32::consts::PI / 180.0);
        Transform {
            position: self.position,
            rotation: Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            scale: self.scale,
        }
    }
}

/// One product: intersection members minus difference members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDesc {
    pub intersections: Vec<PrimitiveDesc>,
    #[serde(default)]
    pub differences: Vec<PrimitiveDesc>,
}

/// A whole scene as written in JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDesc {
    #[serde(default)]
    pub lights: Vec<Light>,
    pub products: Vec<ProductDesc>,
    #[serde(default)]
    pub passthrough: Vec<PrimitiveDesc>,
}

/// A built scene plus the lights its description carried.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub scene: CsgScene,
    pub lights: Vec<Light>,
}

impl SceneDesc {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build meshes and products. Identical shapes share one mesh.
    pub fn build(&self) -> Result<LoadedScene, SceneError> {
        let _span = tracing::info_span!("scene_build", products = self.products.len()).entered();
        let mut meshes: BTreeMap<Shape, Arc<Mesh>> = BTreeMap::new();
        let mut counter = 0usize;
        let mut instance = |desc: &PrimitiveDesc| -> Result<MeshInstance, SceneError> {
            counter += 1;
            let name = desc
                .name
                .clone()
                .unwrap_or_else(|| format!("primitive-{counter}"));
            if desc.scale.min_element() <= 0.0 || !desc.scale.is_finite() {
                return Err(SceneError::InvalidPrimitive {
                    name,
                    reason: format!("scale must be positive, got {}", desc.scale),
                });
            }
            let mesh = meshes
                .entry(desc.shape)
                .or_insert_with(|| Arc::new(desc.shape.build()))
                .clone();
            Ok(MeshInstance::new(name.clone(), mesh, desc.transform())
                .with_material(SurfaceMaterial::from_color(name, desc.color)))
        };

        let mut parts = Vec::with_capacity(self.products.len());
        for product in &self.products {
            let ints = product
                .intersections
                .iter()
                .map(&mut instance)
                .collect::<Result<Vec<_>, _>>()?;
            let diffs = product
                .differences
                .iter()
                .map(&mut instance)
                .collect::<Result<Vec<_>, _>>()?;
            parts.push((ints, diffs));
        }
        let passthrough = self
            .passthrough
            .iter()
            .map(&mut instance)
            .collect::<Result<Vec<_>, _>>()?;

        let scene = CsgScene::from_parts(parts, passthrough)?;
        tracing::debug!(
            members = scene.member_count(),
            meshes = meshes.len(),
            "scene built"
        );
        Ok(LoadedScene {
            scene,
            lights: self.lights.clone(),
        })
    }

    /// Built-in demo: a lens, a drilled block and a glass slab.
    pub fn demo() -> Self {
        let sphere = Shape::Sphere {
            segments: 48,
            rings: 24,
        };
        let drill = Shape::Cylinder { segments: 32 };
        Self {
            lights: vec![
                Light::Ambient {
                    color: Vec3::ONE,
                    intensity: 0.25,
                },
                Light::Point {
                    position: Vec3::new(10.0, 50.0, 130.0),
                    color: Vec3::ONE,
                    intensity: 0.8,
                },
                Light::Directional {
                    direction: Vec3::new(-100.0, 50.0, 130.0),
                    color: Vec3::ONE,
                    intensity: 0.4,
                },
            ],
            products: vec![
                ProductDesc {
                    intersections: vec![
                        PrimitiveDesc::new(sphere)
                            .named("lens-a")
                            .at(Vec3::new(-1.5, 0.0, 0.0))
                            .colored([0.9, 0.3, 0.2, 1.0]),
                        PrimitiveDesc::new(sphere)
                            .named("lens-b")
                            .at(Vec3::new(-1.5, 0.0, 0.5))
                            .colored([0.9, 0.7, 0.2, 1.0]),
                    ],
                    differences: vec![],
                },
                ProductDesc {
                    intersections: vec![
                        PrimitiveDesc::new(Shape::Box)
                            .named("block")
                            .at(Vec3::new(1.5, 0.0, 0.0))
                            .scaled(Vec3::splat(1.6))
                            .colored([0.3, 0.6, 0.9, 1.0]),
                        PrimitiveDesc::new(sphere)
                            .named("rounding")
                            .at(Vec3::new(1.5, 0.0, 0.0))
                            .colored([0.3, 0.9, 0.6, 1.0]),
                    ],
                    differences: vec![
                        PrimitiveDesc::new(drill)
                            .named("drill-y")
                            .at(Vec3::new(1.5, 0.0, 0.0))
                            .scaled(Vec3::new(0.45, 3.0, 0.45))
                            .colored([0.9, 0.9, 0.3, 1.0]),
                        PrimitiveDesc {
                            rotation: Vec3::new(90.0, 0.0, 0.0),
                            ..PrimitiveDesc::new(drill)
                                .named("drill-z")
                                .at(Vec3::new(1.5, 0.0, 0.0))
                                .scaled(Vec3::new(0.45, 3.0, 0.45))
                                .colored([0.9, 0.4, 0.9, 1.0])
                        },
                    ],
                },
            ],
            passthrough: vec![
                PrimitiveDesc::new(Shape::Box)
                    .named("floor")
                    .at(Vec3::new(0.0, -1.5, 0.0))
                    .scaled(Vec3::new(8.0, 0.2, 4.0))
                    .colored([0.5, 0.5, 0.5, 1.0]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_json_with_defaults() {
        let json = r#"{
            "products": [
                { "intersections": [{ "shape": { "type": "sphere" } }] }
            ]
        }"#;
        let desc = SceneDesc::from_json(json).unwrap();
        let p = &desc.products[0].intersections[0];
        assert_eq!(
            p.shape,
            Shape::Sphere {
                segments: 32,
                rings: 16
            }
        );
        assert_eq!(p.scale, Vec3::ONE);
        assert!(desc.products[0].differences.is_empty());
        assert!(desc.lights.is_empty());
    }

    #[test]
    fn identical_shapes_share_meshes() {
        let loaded = SceneDesc::demo().build().unwrap();
        let products = loaded.scene.products();
        assert_eq!(products.len(), 2);
        let lens = products[0].intersections();
        assert!(Arc::ptr_eq(&lens[0].mesh, &lens[1].mesh));
        let drills = products[1].differences();
        assert!(Arc::ptr_eq(&drills[0].mesh, &drills[1].mesh));
        assert_eq!(loaded.scene.passthrough().len(), 1);
        assert_eq!(loaded.lights.len(), 3);
    }

    #[test]
    fn json_round_trip_preserves_scene() {
        let demo = SceneDesc::demo();
        let back = SceneDesc::from_json(&demo.to_json().unwrap()).unwrap();
        assert_eq!(back, demo);
    }

    #[test]
    fn empty_product_is_rejected() {
        let json = r#"{ "products": [ { "intersections": [] } ] }"#;
        let err = SceneDesc::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(err, SceneError::EmptyIntersections { product: 0 }));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        let desc = SceneDesc {
            products: vec![ProductDesc {
                intersections: vec![PrimitiveDesc::new(Shape::Box).scaled(Vec3::new(1.0, 0.0, 1.0))],
                differences: vec![],
            }],
            ..SceneDesc::default()
        };
        assert!(matches!(
            desc.build(),
            Err(SceneError::InvalidPrimitive { .. })
        ));
    }
}
