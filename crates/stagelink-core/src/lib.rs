//! Stagelink Core: Stage trait, Chain linker and render description
//!
//! A chain is an ordered list of named stages. Moving forward copies the
//! current stage's declared outputs into identically-named parameters of
//! the next stage; moving back only changes the position.
//!
//! ```text
//! Stage 1 ──advance──▶ Stage 2 ──advance──▶ ...
//!  outputs {c, d}        params {c, exp}
//!        └──── c ─────────▶ c
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod param;
pub mod stage;
pub mod view;

pub use chain::{Chain, Transition};
pub use config::{ChainConfig, StageOptions};
pub use error::{ChainError, ParamError};
pub use param::{Bounds, Param, ParamKind, ParamSet};
pub use stage::{OutputDecl, OutputValues, Renderable, Stage, StageError, StageFactory, StageSource};
pub use view::{ChainView, NavControls, RenderNode, StageIndicator, StageStatus};

/// Engine version reported by hosts
pub const STAGELINK_VERSION: &str = "0.1.0";
