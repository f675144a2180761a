use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CsgError;

/// How far one product has progressed through a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStage {
    Idle,
    IntersectionComputed,
    SubtractionApplied,
    ClipResolved,
    Lit,
    Merged,
    Reconciled,
}

impl fmt::Display for ProductStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProductStage::Idle => "idle",
            ProductStage::IntersectionComputed => "intersection-computed",
            ProductStage::SubtractionApplied => "subtraction-applied",
            ProductStage::ClipResolved => "clip-resolved",
            ProductStage::Lit => "lit",
            ProductStage::Merged => "merged",
            ProductStage::Reconciled => "reconciled",
        };
        f.write_str(name)
    }
}

/// Enforces the per-frame stage order of one product.
///
/// Products without differences go straight from `IntersectionComputed` to
/// `Lit`; products with differences must pass through `SubtractionApplied`
/// and `ClipResolved`. There are no backward transitions.
#[derive(Debug, Clone)]
pub struct StageTracker {
    product: usize,
    has_differences: bool,
    stage: ProductStage,
}

impl StageTracker {
    pub fn new(product: usize, has_differences: bool) -> Self {
        Self {
            product,
            has_differences,
            stage: ProductStage::Idle,
        }
    }

    pub fn stage(&self) -> ProductStage {
        self.stage
    }

    /// The only stage that may follow the current one.
    pub fn next(&self) -> Option<ProductStage> {
        use ProductStage::*;
        match self.stage {
            Idle => Some(IntersectionComputed),
            IntersectionComputed if self.has_differences => Some(SubtractionApplied),
            IntersectionComputed => Some(Lit),
            SubtractionApplied => Some(ClipResolved),
            ClipResolved => Some(Lit),
            Lit => Some(Merged),
            Merged => Some(Reconciled),
            Reconciled => None,
        }
    }

    pub fn advance(&mut self, to: ProductStage) -> Result<(), CsgError> {
        if self.next() != Some(to) {
            return Err(CsgError::StageOrder {
                product: self.product,
                from: self.stage,
                to,
            });
        }
        tracing::trace!(product = self.product, stage = %to, "stage");
        self.stage = to;
        Ok(())
    }

    /// Step through every legal stage up to and including `to`.
    pub fn advance_through(&mut self, to: ProductStage) -> Result<(), CsgError> {
        if to <= self.stage {
            return Err(CsgError::StageOrder {
                product: self.product,
                from: self.stage,
                to,
            });
        }
        while self.stage < to {
            match self.next() {
                Some(next) => self.advance(next)?,
                None => break,
            }
        }
        Ok(())
    }
}
