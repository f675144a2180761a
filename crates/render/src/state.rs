//! Fixed-function pipeline state passed explicitly with every draw.

/// Comparison used by depth and stencil tests.
///
/// Depth tests evaluate `fragment OP stored`; stencil tests evaluate
/// `reference OP stored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl CompareFunction {
    pub fn passes<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CompareFunction::Never => false,
            CompareFunction::Less => lhs < rhs,
            CompareFunction::Equal => lhs == rhs,
            CompareFunction::LessEqual => lhs <= rhs,
            CompareFunction::Greater => lhs > rhs,
            CompareFunction::NotEqual => lhs != rhs,
            CompareFunction::GreaterEqual => lhs >= rhs,
            CompareFunction::Always => true,
        }
    }
}

/// Stencil update applied when both stencil and depth tests pass.
/// Failing fragments always keep the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    Keep,
    Zero,
    Replace,
    /// Saturates at the largest stencil value.
    IncrementClamp,
    /// Saturates at zero.
    DecrementClamp,
}

impl StencilOperation {
    pub fn apply(self, stored: u32, reference: u32, max: u32) -> u32 {
        match self {
            StencilOperation::Keep => stored,
            StencilOperation::Zero => 0,
            StencilOperation::Replace => reference & max,
            StencilOperation::IncrementClamp => (stored + 1).min(max),
            StencilOperation::DecrementClamp => stored.saturating_sub(1),
        }
    }
}

/// Which faces are discarded before rasterization. Front faces wind
/// counter-clockwise in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    #[default]
    Back,
    Front,
}

/// Per-channel-group write mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorMask {
    pub rgb: bool,
    pub alpha: bool,
}

impl ColorMask {
    pub const ALL: Self = Self {
        rgb: true,
        alpha: true,
    };
    pub const NONE: Self = Self {
        rgb: false,
        alpha: false,
    };
    pub const RGB: Self = Self {
        rgb: true,
        alpha: false,
    };
    /// Only the synthetic depth channel.
    pub const ALPHA: Self = Self {
        rgb: false,
        alpha: true,
    };

    pub fn any(self) -> bool {
        self.rgb || self.alpha
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Replace,
    /// Source-over with the fragment's alpha.
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub compare: CompareFunction,
    pub write: bool,
}

impl DepthState {
    /// Depth test disabled: everything passes and nothing is written.
    pub const DISABLED: Self = Self {
        compare: CompareFunction::Always,
        write: false,
    };

    pub fn new(compare: CompareFunction, write: bool) -> Self {
        Self { compare, write }
    }

    pub fn is_disabled(&self) -> bool {
        *self == Self::DISABLED
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            compare: CompareFunction::LessEqual,
            write: true,
        }
    }
}

/// Stencil test and update. The full stencil mask is always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    pub compare: CompareFunction,
    pub reference: u32,
    pub pass_op: StencilOperation,
}

impl StencilState {
    pub fn new(compare: CompareFunction, reference: u32, pass_op: StencilOperation) -> Self {
        Self {
            compare,
            reference,
            pass_op,
        }
    }
}

/// Complete fixed-function state of one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineState {
    pub depth: DepthState,
    pub stencil: Option<StencilState>,
    pub cull: CullMode,
    pub color_mask: ColorMask,
    pub blend: BlendMode,
}

impl Default for ColorMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl PipelineState {
    pub fn with_depth(mut self, compare: CompareFunction, write: bool) -> Self {
        self.depth = DepthState::new(compare, write);
        self
    }

    pub fn without_depth(mut self) -> Self {
        self.depth = DepthState::DISABLED;
        self
    }

    pub fn with_stencil(
        mut self,
        compare: CompareFunction,
        reference: u32,
        pass_op: StencilOperation,
    ) -> Self {
        self.stencil = Some(StencilState::new(compare, reference, pass_op));
        self
    }

    pub fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }

    pub fn with_color_mask(mut self, mask: ColorMask) -> Self {
        self.color_mask = mask;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Whether the draw needs a depth attachment to mean anything.
    pub fn uses_depth(&self) -> bool {
        !self.depth.is_disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_functions() {
        assert!(CompareFunction::Greater.passes(0.7, 0.3));
        assert!(!CompareFunction::Greater.passes(0.3, 0.3));
        assert!(CompareFunction::GreaterEqual.passes(0.3, 0.3));
        assert!(CompareFunction::NotEqual.passes(2u32, 3u32));
        assert!(!CompareFunction::Never.passes(1, 1));
    }

    #[test]
    fn increment_saturates() {
        assert_eq!(StencilOperation::IncrementClamp.apply(254, 0, 255), 255);
        assert_eq!(StencilOperation::IncrementClamp.apply(255, 0, 255), 255);
        assert_eq!(StencilOperation::DecrementClamp.apply(0, 0, 255), 0);
        assert_eq!(StencilOperation::Replace.apply(9, 300, 255), 300 & 255);
    }

    #[test]
    fn default_state_is_ordinary_opaque_rendering() {
        let s = PipelineState::default();
        assert_eq!(s.depth.compare, CompareFunction::LessEqual);
        assert!(s.depth.write);
        assert_eq!(s.cull, CullMode::Back);
        assert_eq!(s.color_mask, ColorMask::ALL);
        assert!(s.stencil.is_none());
    }

    #[test]
    fn builder_chains() {
        let s = PipelineState::default()
            .with_depth(CompareFunction::Greater, false)
            .with_color_mask(ColorMask::ALPHA)
            .with_cull(CullMode::Front)
            .with_stencil(CompareFunction::Always, 0, StencilOperation::IncrementClamp);
        assert!(!s.depth.write);
        assert_eq!(s.stencil.unwrap().pass_op, StencilOperation::IncrementClamp);
        assert!(PipelineState::default().without_depth().depth.is_disabled());
    }
}
