//! Unified Error Model
use thiserror::Error;

use crate::stage::StageError;

/// Rejections raised by a parameter's own validity check.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("PARAM/UNKNOWN: no parameter named '{0}'")]
    UnknownParameter(String),

    #[error("PARAM/TYPE: '{name}' expects {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    #[error("PARAM/BOUNDS: '{name}' value {value} outside {bounds}")]
    OutOfBounds {
        name: String,
        value: String,
        bounds: String,
    },

    #[error("PARAM/OPTION: '{name}' value {value} is not one of the allowed options")]
    NotAnOption { name: String, value: String },
}

/// Errors surfaced by chain operations. None of them poison the chain:
/// after any of these the chain is exactly as it was before the call.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("CHAIN/DUPLICATE: a stage named '{0}' is already registered")]
    DuplicateName(String),

    #[error("CHAIN/UNKNOWN: no stage named '{0}'")]
    UnknownStage(String),

    #[error("CHAIN/EMPTY: no stages registered")]
    EmptyChain,

    #[error("NAV/NEXT: stage {index} is the last stage")]
    NoNextStage { index: usize },

    #[error("NAV/PREVIOUS: already at the first stage")]
    NoPreviousStage,

    #[error("NAV/READY: stage '{stage}' is waiting for '{parameter}' to become true")]
    StageNotReady { stage: String, parameter: String },

    #[error("LINK/INVALID: '{from}' → '{to}' rejected: {source}")]
    InvalidTransition {
        from: String,
        to: String,
        #[source]
        source: ParamError,
    },

    #[error("OUTPUT/ARITY: stage '{stage}' declares {declared} outputs but produced {produced}")]
    OutputArityMismatch {
        stage: String,
        declared: usize,
        produced: usize,
    },

    #[error("OUTPUT/DUPLICATE: stage '{stage}' declares output '{name}' more than once")]
    DuplicateOutput { stage: String, name: String },

    #[error("STAGE/{stage}: {source}")]
    Stage {
        stage: String,
        #[source]
        source: StageError,
    },

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("CONFIG/{0}")]
    Config(String),
}
