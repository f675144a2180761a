use serde::{Deserialize, Serialize};

/// Half an 8-bit step: IDs survive storage in an 8-bit or float target.
pub const ID_TOLERANCE: f32 = 0.5 / 255.0;

/// A flat color that tags the primitive a pixel's surface came from.
///
/// IDs are 24-bit, packed one byte per RGB channel. Zero is reserved for
/// "no surface", so the first usable ID is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdColor(u32);

impl IdColor {
    pub const NONE: Self = Self(0);
    pub const MAX: u32 = 0x00ff_ffff;

    /// Returns `None` for values that do not fit in 24 bits.
    pub fn new(id: u32) -> Option<Self> {
        (id <= Self::MAX).then_some(Self(id))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn to_rgb(self) -> [f32; 3] {
        [
            ((self.0 >> 16) & 0xff) as f32 / 255.0,
            ((self.0 >> 8) & 0xff) as f32 / 255.0,
            (self.0 & 0xff) as f32 / 255.0,
        ]
    }

    pub fn to_rgba(self) -> [f32; 4] {
        let [r, g, b] = self.to_rgb();
        [r, g, b, 1.0]
    }

    /// Decode the ID stored in a texel, rounding each channel to the nearest byte.
    pub fn from_rgb(rgb: [f32; 3]) -> Self {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        Self((byte(rgb[0]) << 16) | (byte(rgb[1]) << 8) | byte(rgb[2]))
    }

    /// True when `rgb` encodes this ID within [`ID_TOLERANCE`] on every channel.
    pub fn matches(self, rgb: [f32; 3]) -> bool {
        self.to_rgb()
            .iter()
            .zip(rgb.iter())
            .all(|(a, b)| (a - b).abs() < ID_TOLERANCE)
    }
}
