use scs_render::{ClearValues, DeviceError, GraphicsDevice, Surface, TargetDesc, TargetId};

/// Render targets owned by the renderer for one output size.
///
/// `scratch` carries depth/stencil and holds one product at a time. The two
/// accumulators have color only and are written alternately, so a merge never
/// reads the target it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTargets {
    pub width: u32,
    pub height: u32,
    pub scratch: TargetId,
    pub accum: [TargetId; 2],
}

impl FrameTargets {
    pub fn create<D: GraphicsDevice>(
        device: &mut D,
        width: u32,
        height: u32,
    ) -> Result<Self, DeviceError> {
        let scratch = device.create_target(TargetDesc {
            width,
            height,
            depth_stencil: true,
        })?;
        let color_only = TargetDesc {
            width,
            height,
            depth_stencil: false,
        };
        let mut created = vec![scratch];
        let mut accum = [scratch; 2];
        for slot in &mut accum {
            match device.create_target(color_only) {
                Ok(id) => {
                    created.push(id);
                    *slot = id;
                }
                Err(e) => {
                    for id in created {
                        device.release_target(id);
                    }
                    return Err(e);
                }
            }
        }
        Ok(Self {
            width,
            height,
            scratch,
            accum,
        })
    }

    pub fn release<D: GraphicsDevice>(self, device: &mut D) {
        device.release_target(self.scratch);
        for id in self.accum {
            device.release_target(id);
        }
    }

    /// Accumulator read while merging product `index`.
    pub fn accum_read(&self, index: usize) -> TargetId {
        self.accum[index % 2]
    }

    /// Accumulator written while merging product `index`.
    pub fn accum_write(&self, index: usize) -> TargetId {
        self.accum[(index + 1) % 2]
    }

    /// Accumulator holding the result after `products` merges.
    pub fn accum_final(&self, products: usize) -> TargetId {
        self.accum[products % 2]
    }

    /// Mark both accumulators as empty. Runs at the start of every frame.
    pub fn reset_accumulators<D: GraphicsDevice>(&self, device: &mut D) -> Result<(), DeviceError> {
        for id in self.accum {
            device.clear(Surface::Target(id), ClearValues::color([0.0, 0.0, 0.0, 1.0]))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scs_render::SoftwareDevice;

    #[test]
    fn ping_pong_never_aliases() {
        let mut dev = SoftwareDevice::new(4, 4).unwrap();
        let t = FrameTargets::create(&mut dev, 4, 4).unwrap();
        for i in 0..5 {
            assert_ne!(t.accum_read(i), t.accum_write(i));
            assert_eq!(t.accum_write(i), t.accum_read(i + 1));
        }
        assert_eq!(t.accum_final(3), t.accum_write(2));
        assert_eq!(t.accum_final(0), t.accum_read(0));
    }

    #[test]
    fn release_frees_all_targets() {
        let mut dev = SoftwareDevice::new(4, 4).unwrap();
        let t = FrameTargets::create(&mut dev, 4, 4).unwrap();
        assert_eq!(dev.target_count(), 3);
        t.release(&mut dev);
        assert_eq!(dev.target_count(), 0);
    }
}
