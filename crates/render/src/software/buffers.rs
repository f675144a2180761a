use crate::device::{ClearValues, DeviceError, Surface, SurfaceImage};
use crate::state::{BlendMode, ColorMask};

/// Host-memory storage of one surface.
#[derive(Debug, Clone)]
pub(crate) struct Buffers {
    pub width: u32,
    pub height: u32,
    pub color: Vec<[f32; 4]>,
    pub depth: Option<Vec<f32>>,
    pub stencil: Option<Vec<u8>>,
    /// Unorm surfaces clamp written color to [0,1]; float targets do not.
    pub clamp_color: bool,
}

impl Buffers {
    pub fn new(width: u32, height: u32, depth_stencil: bool, clamp_color: bool) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![[0.0; 4]; len],
            depth: depth_stencil.then(|| vec![1.0; len]),
            stencil: depth_stencil.then(|| vec![0; len]),
            clamp_color,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn clear(&mut self, surface: Surface, values: ClearValues) -> Result<(), DeviceError> {
        if let Some(c) = values.color {
            let c = self.clamped(c);
            self.color.fill(c);
        }
        if let Some(d) = values.depth {
            self.depth
                .as_mut()
                .ok_or(DeviceError::MissingAttachment {
                    surface,
                    attachment: "depth",
                })?
                .fill(d.clamp(0.0, 1.0));
        }
        if let Some(s) = values.stencil {
            self.stencil
                .as_mut()
                .ok_or(DeviceError::MissingAttachment {
                    surface,
                    attachment: "stencil",
                })?
                .fill(s.min(u8::MAX as u32) as u8);
        }
        Ok(())
    }

    fn clamped(&self, c: [f32; 4]) -> [f32; 4] {
        if self.clamp_color {
            c.map(|v| v.clamp(0.0, 1.0))
        } else {
            c
        }
    }

    pub fn write_color(&mut self, i: usize, src: [f32; 4], mask: ColorMask, blend: BlendMode) {
        let dst = self.color[i];
        let out = match blend {
            BlendMode::Replace => src,
            BlendMode::Alpha => {
                let a = src[3];
                [
                    src[0] * a + dst[0] * (1.0 - a),
                    src[1] * a + dst[1] * (1.0 - a),
                    src[2] * a + dst[2] * (1.0 - a),
                    a + dst[3] * (1.0 - a),
                ]
            }
        };
        let out = self.clamped(out);
        let px = &mut self.color[i];
        if mask.rgb {
            px[..3].copy_from_slice(&out[..3]);
        }
        if mask.alpha {
            px[3] = out[3];
        }
    }

    pub fn image(&self) -> SurfaceImage {
        SurfaceImage {
            width: self.width,
            height: self.height,
            color: self.color.clone(),
            depth: self.depth.clone(),
            stencil: self.stencil.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearing_missing_attachment_fails() {
        let mut b = Buffers::new(2, 2, false, false);
        let err = b
            .clear(Surface::Framebuffer, ClearValues::empty_surface())
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::MissingAttachment {
                attachment: "depth",
                ..
            }
        ));
        b.clear(Surface::Framebuffer, ClearValues::color([0.0, 0.0, 0.0, 1.0]))
            .unwrap();
        assert_eq!(b.color[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn masks_select_channels() {
        let mut b = Buffers::new(1, 1, false, false);
        b.write_color(0, [0.2, 0.3, 0.4, 0.9], ColorMask::ALPHA, BlendMode::Replace);
        assert_eq!(b.color[0], [0.0, 0.0, 0.0, 0.9]);
        b.write_color(0, [0.2, 0.3, 0.4, 0.1], ColorMask::RGB, BlendMode::Replace);
        assert_eq!(b.color[0], [0.2, 0.3, 0.4, 0.9]);
    }

    #[test]
    fn alpha_blend_is_source_over() {
        let mut b = Buffers::new(1, 1, false, true);
        b.color[0] = [0.0, 0.0, 1.0, 1.0];
        b.write_color(0, [1.0, 0.0, 0.0, 0.5], ColorMask::ALL, BlendMode::Alpha);
        assert_eq!(b.color[0], [0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn unorm_surfaces_clamp() {
        let mut b = Buffers::new(1, 1, true, true);
        b.write_color(0, [2.0, -1.0, 0.5, 1.0], ColorMask::ALL, BlendMode::Replace);
        assert_eq!(b.color[0], [1.0, 0.0, 0.5, 1.0]);
    }
}
