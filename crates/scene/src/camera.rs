use glam::{Mat4, Vec3};

/// View and projection used identically by every pass of one frame.
///
/// Projections use a [0,1] depth range, so NDC z is also the native depth
/// value and the synthetic depth value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            60.0_f32.to_radians(),
            1.0,
            0.5,
            100.0,
        )
    }
}

impl Camera {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    /// Perspective camera at `eye` looking at `target`.
    pub fn perspective(eye: Vec3, target: Vec3, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            view: look_at(eye, target),
            projection: Mat4::perspective_rh(fov_y, aspect, near, far),
        }
    }

    /// Orthographic camera showing `half_height` world units above and below the view axis.
    pub fn orthographic(
        eye: Vec3,
        target: Vec3,
        half_height: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let half_width = half_height * aspect;
        Self {
            view: look_at(eye, target),
            projection: Mat4::orthographic_rh(
                -half_width,
                half_width,
                -half_height,
                half_height,
                near,
                far,
            ),
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// World-space eye position.
    pub fn eye(&self) -> Vec3 {
        self.view.inverse().transform_point3(Vec3::ZERO)
    }

    /// Same camera with a new aspect ratio, keeping the vertical extent.
    pub fn with_aspect(self, aspect: f32) -> Self {
        let mut projection = self.projection;
        projection.x_axis.x = projection.y_axis.y / aspect;
        Self { projection, ..self }
    }
}

/// Right-handed look-at that picks another up vector when looking along Y.
fn look_at(eye: Vec3, target: Vec3) -> Mat4 {
    let dir = (target - eye).normalize_or_zero();
    let up = if dir.dot(Vec3::Y).abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    Mat4::look_at_rh(eye, target, up)
}
