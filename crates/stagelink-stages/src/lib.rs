//! Stagelink Stages: reference stages and the two-stage demo chain.
//!
//! The math is deliberately trivial; the point is the wiring.
//!
//! # Chain Flow
//!
//! ```text
//! Stage 1 (a, b) ──▶ outputs c = a*b, d = a^b
//!                          │
//!                          ▼ c
//! Stage 2 (c, exp) ──▶ view c^exp
//! ```

mod exponent;
mod multiply;

pub use exponent::ExponentStage;
pub use multiply::MultiplyStage;

use stagelink_core::{Chain, ChainConfig, ChainError, StageSource};

pub const STAGE_ONE: &str = "Stage 1";
pub const STAGE_TWO: &str = "Stage 2";

/// The demo chain: a ready-made `MultiplyStage` followed by an
/// `ExponentStage` built on first navigation.
pub fn demo_chain(config: ChainConfig) -> Result<Chain, ChainError> {
    let mut chain = Chain::with_config(config);
    chain.register(STAGE_ONE, StageSource::instance(MultiplyStage::default()))?;
    chain.register(STAGE_TWO, StageSource::of::<ExponentStage>())?;
    tracing::debug!(stages = chain.len(), "built demo chain");
    Ok(chain)
}
