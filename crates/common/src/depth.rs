/// Bias towards the newer sample when two products meet at (nearly) equal depth.
pub const MERGE_EPSILON: f32 = 1e-6;

/// Depth of a CSG surface carried in a color channel (alpha) instead of the
/// native depth buffer.
///
/// The passes write it next to the lit color so later passes can read a
/// product's depth as an ordinary texture. The value is NDC z in [0,1], the
/// same number the native depth buffer holds for that fragment; 1.0 means
/// "no surface".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SyntheticDepth(f32);

impl SyntheticDepth {
    /// The "no surface" marker.
    pub const FAR: Self = Self(1.0);
    pub const NEAR: Self = Self(0.0);

    /// Wrap a raw channel value, clamping into [0,1]. NaN maps to [`Self::FAR`].
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            Self::FAR
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Read the synthetic depth stored in an RGBA texel.
    pub fn from_texel(texel: [f32; 4]) -> Self {
        Self::new(texel[3])
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// True when no CSG surface was found at this pixel.
    pub fn is_empty(self) -> bool {
        self.0 >= 1.0
    }

    /// Nearest-wins test with the newer-sample bias: `self` (new) replaces `other` (accumulated).
    pub fn wins_over(self, other: Self) -> bool {
        self.0 - MERGE_EPSILON < other.0
    }

    /// Gray level used when visualizing the buffer: near is bright, empty is black.
    pub fn visualize(self) -> [f32; 4] {
        let c = self.0;
        let alpha = if self.is_empty() { 0.0 } else { 1.0 };
        [1.0 - c, 1.0 - c, 1.0 - c, alpha]
    }
}

impl Default for SyntheticDepth {
    fn default() -> Self {
        Self::FAR
    }
}

/// Merge one product's texel into the running accumulator: keep whichever is nearer.
pub fn merge_nearest(src: [f32; 4], prev: [f32; 4]) -> [f32; 4] {
    if SyntheticDepth::from_texel(src).wins_over(SyntheticDepth::from_texel(prev)) {
        src
    } else {
        prev
    }
}
