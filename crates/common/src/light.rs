use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A light used by the lit passes. Every product is lit by the same set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Light {
    Ambient {
        color: Vec3,
        intensity: f32,
    },
    /// Light travelling along `direction` (towards the scene).
    Directional {
        direction: Vec3,
        color: Vec3,
        intensity: f32,
    },
    Point {
        position: Vec3,
        color: Vec3,
        intensity: f32,
    },
}

impl Light {
    /// Radiance arriving at a surface point with the given unit normal.
    pub fn irradiance(&self, point: Vec3, normal: Vec3) -> Vec3 {
        match *self {
            Light::Ambient { color, intensity } => color * intensity,
            Light::Directional {
                direction,
                color,
                intensity,
            } => {
                let to_light = -direction.normalize_or_zero();
                color * intensity * normal.dot(to_light).max(0.0)
            }
            Light::Point {
                position,
                color,
                intensity,
            } => {
                let to_light = (position - point).normalize_or_zero();
                color * intensity * normal.dot(to_light).max(0.0)
            }
        }
    }

    /// Flat Lambert shading of `base` at a surface point.
    pub fn shade(lights: &[Light], base: Vec3, point: Vec3, normal: Vec3) -> Vec3 {
        let total = lights
            .iter()
            .fold(Vec3::ZERO, |acc, l| acc + l.irradiance(point, normal));
        (base * total).clamp(Vec3::ZERO, Vec3::ONE)
    }
}
