use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How per-product results are combined into the framebuffer.
///
/// All three produce the same visible surfaces; they trade passes and
/// precision against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Merge every product into ping-ponged accumulators, then reconcile depth once.
    #[default]
    Classic,
    /// Draw plain solids directly; merge each other product straight onto the framebuffer.
    OptimizeMerges,
    /// Resolve surfaces by ID color and shade them in a final EQUAL-depth pass.
    IdColors,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Classic,
        Strategy::OptimizeMerges,
        Strategy::IdColors,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Classic => "classic",
            Strategy::OptimizeMerges => "optimize-merges",
            Strategy::IdColors => "id-colors",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy {0:?} (expected classic, optimize-merges or id-colors)")]
pub struct ParseStrategyError(String);

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| ParseStrategyError(s.to_string()))
    }
}

/// Per-frame render options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub strategy: Strategy,
    /// Framebuffer clear color.
    pub clear_color: [f32; 4],
    /// Clear the framebuffer before drawing CSG surfaces.
    pub clear_framebuffer: bool,
    /// Draw the scene's passthrough objects after reconciliation.
    pub draw_passthrough: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Classic,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            clear_framebuffer: true,
            draw_passthrough: true,
        }
    }
}

impl RenderOptions {
    /// Boolean flag form; ID colors take precedence over optimized merges.
    pub fn from_flags(use_id_colors: bool, optimize_merges: bool) -> Self {
        let strategy = if use_id_colors {
            Strategy::IdColors
        } else if optimize_merges {
            Strategy::OptimizeMerges
        } else {
            Strategy::Classic
        };
        Self::with_strategy(strategy)
    }

    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}
