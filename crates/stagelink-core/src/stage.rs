//! Stage Trait: the contract every chained stage fulfils
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::param::{ParamKind, ParamSet};
use crate::view::RenderNode;

/// Anything that can describe itself as a render tree
pub trait Renderable {
    fn render(&self) -> RenderNode;
}

/// A self-contained step of a chain: parameters in, outputs out, plus a view.
///
/// Stages own their parameter state. The chain only touches it through
/// [`ParamSet::update_all`] when propagating outputs on `advance`.
pub trait Stage: Renderable + Send {
    /// Human-facing label, defaults to the registered name
    fn title(&self) -> Option<&str> {
        None
    }

    fn params(&self) -> &ParamSet;

    fn params_mut(&mut self) -> &mut ParamSet;

    /// Parameters that `advance` may write to. Defaults to every parameter.
    fn describe_inputs(&self) -> Vec<(String, ParamKind)> {
        self.params()
            .iter()
            .map(|p| (p.name.clone(), p.kind.clone()))
            .collect()
    }

    /// Declared outputs, in the order `compute_outputs` returns them
    fn describe_outputs(&self) -> Vec<OutputDecl> {
        Vec::new()
    }

    /// Produce the values for `describe_outputs`
    fn compute_outputs(&self) -> Result<OutputValues, StageError> {
        Ok(OutputValues::None)
    }
}

/// Declared output name with an advisory type tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<ParamKind>,
}

impl OutputDecl {
    pub fn new(name: impl Into<String>, type_tag: ParamKind) -> Self {
        Self {
            name: name.into(),
            type_tag: Some(type_tag),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_tag: None,
        }
    }
}

/// What an output-producing call returned
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValues {
    None,
    Single(Value),
    Many(Vec<Value>),
}

impl OutputValues {
    pub fn len(&self) -> usize {
        match self {
            OutputValues::None => 0,
            OutputValues::Single(_) => 1,
            OutputValues::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<Value> {
        match self {
            OutputValues::None => Vec::new(),
            OutputValues::Single(value) => vec![value],
            OutputValues::Many(values) => values,
        }
    }
}

/// Constructor invoked the first time the chain navigates to a stage
pub type StageFactory = Box<dyn Fn() -> Box<dyn Stage> + Send + Sync>;

/// A stage as handed to `register`: ready-made, or built on first use
pub enum StageSource {
    Instance(Box<dyn Stage>),
    Factory(StageFactory),
}

impl StageSource {
    pub fn instance<S: Stage + 'static>(stage: S) -> Self {
        StageSource::Instance(Box::new(stage))
    }

    /// Lazily construct with `S::default()`
    pub fn of<S: Stage + Default + 'static>() -> Self {
        StageSource::factory(|| Box::new(S::default()))
    }

    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn Stage> + Send + Sync + 'static,
    {
        StageSource::Factory(Box::new(factory))
    }
}

impl fmt::Debug for StageSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StageSource::Instance(_) => write!(f, "StageSource::Instance"),
            StageSource::Factory(_) => write!(f, "StageSource::Factory"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StageError {
    ValidationFailed(String),
    ExecutionFailed(String),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "VALIDATION: {}", msg),
            Self::ExecutionFailed(msg) => write!(f, "EXEC: {}", msg),
        }
    }
}

impl std::error::Error for StageError {}
