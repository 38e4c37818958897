//! Chain: ordered stages with output propagation on forward navigation
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::{ChainConfig, StageOptions};
use crate::error::ChainError;
use crate::stage::{Stage, StageFactory, StageSource};
use crate::view::{ChainView, NavControls, StageIndicator, StageStatus};

/// Report of a successful `advance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub from_index: usize,
    pub to_index: usize,
    /// Parameters of the next stage that received a value
    pub assigned: Vec<String>,
    /// Outputs with no matching parameter on the next stage
    pub dropped: Vec<String>,
}

enum StageState {
    Pending(StageFactory),
    Ready(Box<dyn Stage>),
}

struct StageEntry {
    name: String,
    options: StageOptions,
    state: StageState,
}

impl StageEntry {
    fn instance(&self) -> Option<&dyn Stage> {
        match &self.state {
            StageState::Ready(stage) => Some(stage.as_ref()),
            StageState::Pending(_) => None,
        }
    }

    /// Instantiate from the factory on first access, then hand out the cached instance.
    fn resolve(&mut self) -> Result<&mut dyn Stage, ChainError> {
        if let StageState::Pending(factory) = &self.state {
            let stage = factory();
            check_stage(&self.name, &self.options, stage.as_ref())?;
            debug!(stage = %self.name, "instantiated stage from factory");
            self.state = StageState::Ready(stage);
        }

        match &mut self.state {
            StageState::Ready(stage) => Ok(stage.as_mut()),
            StageState::Pending(_) => Err(ChainError::Config(format!(
                "stage '{}' was not instantiated",
                self.name
            ))),
        }
    }

    /// Human-facing label of an instantiated stage, else its registered name
    fn title(&self) -> &str {
        self.instance()
            .and_then(|stage| stage.title())
            .unwrap_or(self.name.as_str())
    }

    /// A stage without a ready parameter is always ready. A stage that has one
    /// but has not been instantiated yet is not.
    fn is_ready(&self) -> bool {
        match &self.options.ready_parameter {
            None => true,
            Some(parameter) => self
                .instance()
                .and_then(|stage| stage.params().value(parameter))
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Checks run once per stage instance: output names are unique and the
/// configured ready parameter exists.
fn check_stage(name: &str, options: &StageOptions, stage: &dyn Stage) -> Result<(), ChainError> {
    if let Some(parameter) = &options.ready_parameter {
        if !stage.params().contains(parameter) {
            return Err(ChainError::Config(format!(
                "stage '{}' has no ready parameter '{}'",
                name, parameter
            )));
        }
    }

    let declared = stage.describe_outputs();
    for (i, output) in declared.iter().enumerate() {
        if declared[..i].iter().any(|earlier| earlier.name == output.name) {
            return Err(ChainError::DuplicateOutput {
                stage: name.to_string(),
                name: output.name.clone(),
            });
        }
    }
    Ok(())
}

/// Invoke the stage's output method and pair each value with its declared name.
fn resolve_outputs(name: &str, stage: &dyn Stage) -> Result<Vec<(String, Value)>, ChainError> {
    let declared = stage.describe_outputs();
    let produced = stage.compute_outputs().map_err(|source| ChainError::Stage {
        stage: name.to_string(),
        source,
    })?;

    if declared.len() != produced.len() {
        return Err(ChainError::OutputArityMismatch {
            stage: name.to_string(),
            declared: declared.len(),
            produced: produced.len(),
        });
    }

    Ok(declared
        .into_iter()
        .map(|decl| decl.name)
        .zip(produced.into_vec())
        .collect())
}

/// Ordered, navigable sequence of named stages.
///
/// Single-caller by construction: every operation takes `&mut self` and runs
/// to completion. Hosts serving several users keep one chain per session,
/// behind a lock if the session is shared between tasks.
pub struct Chain {
    config: ChainConfig,
    stages: Vec<StageEntry>,
    current: usize,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Chain")
            .field("title", &self.config.title)
            .field("stages", &self.names())
            .field("current", &self.current)
            .finish()
    }
}

impl Chain {
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            config,
            stages: Vec::new(),
            current: 0,
        }
    }

    /// Build a chain from a construction-time list of stages
    pub fn from_stages<I, N>(config: ChainConfig, stages: I) -> Result<Self, ChainError>
    where
        I: IntoIterator<Item = (N, StageSource)>,
        N: Into<String>,
    {
        let mut chain = Self::with_config(config);
        for (name, source) in stages {
            chain.register(name, source)?;
        }
        Ok(chain)
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn title(&self) -> Option<&str> {
        self.config.title.as_deref()
    }

    /// Append a stage, picking up any options configured for its name.
    pub fn register(&mut self, name: impl Into<String>, source: StageSource) -> Result<(), ChainError> {
        let name = name.into();
        let options = self.config.options_for(&name);
        self.register_with(name, source, options)
    }

    /// Append a stage with explicit options. Output compatibility with the
    /// neighbouring stages is not checked here, only on `advance`.
    pub fn register_with(
        &mut self,
        name: impl Into<String>,
        source: StageSource,
        options: StageOptions,
    ) -> Result<(), ChainError> {
        let name = name.into();
        if self.position(&name).is_some() {
            return Err(ChainError::DuplicateName(name));
        }

        let state = match source {
            StageSource::Instance(stage) => {
                check_stage(&name, &options, stage.as_ref())?;
                StageState::Ready(stage)
            }
            StageSource::Factory(factory) => StageState::Pending(factory),
        };

        debug!(stage = %name, index = self.stages.len(), "registered stage");
        self.stages.push(StageEntry {
            name,
            options,
            state,
        });
        Ok(())
    }

    /// Remove a stage by name, keeping the position on the same stage where possible.
    pub fn remove(&mut self, name: &str) -> Result<(), ChainError> {
        let index = self
            .position(name)
            .ok_or_else(|| ChainError::UnknownStage(name.to_string()))?;
        self.stages.remove(index);

        if index < self.current {
            self.current -= 1;
        } else if self.current >= self.stages.len() {
            self.current = self.stages.len().saturating_sub(1);
        }

        debug!(stage = %name, current = self.current, "removed stage");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_name(&self) -> Option<&str> {
        self.stages.get(self.current).map(|e| e.name.as_str())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|e| e.name == name)
    }

    /// A stage that has already been instantiated
    pub fn stage(&self, name: &str) -> Option<&dyn Stage> {
        self.stages.iter().find(|e| e.name == name)?.instance()
    }

    /// Any stage, instantiating it if needed
    pub fn stage_mut(&mut self, name: &str) -> Result<&mut dyn Stage, ChainError> {
        self.stages
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| ChainError::UnknownStage(name.to_string()))?
            .resolve()
    }

    /// The active stage. Repeated calls return the same instance.
    pub fn current(&mut self) -> Result<&mut dyn Stage, ChainError> {
        let index = self.current;
        self.stages
            .get_mut(index)
            .ok_or(ChainError::EmptyChain)?
            .resolve()
    }

    /// Declared outputs of the active stage paired with their current values
    pub fn outputs(&mut self) -> Result<Vec<(String, Value)>, ChainError> {
        let index = self.current;
        let entry = self.stages.get_mut(index).ok_or(ChainError::EmptyChain)?;
        let name = entry.name.clone();
        let stage = entry.resolve()?;
        resolve_outputs(&name, &*stage)
    }

    pub fn can_retreat(&self) -> bool {
        self.current > 0
    }

    pub fn can_advance(&self) -> bool {
        self.current + 1 < self.stages.len()
            && self.stages.get(self.current).map_or(false, StageEntry::is_ready)
    }

    /// Move to the next stage, copying name-matched outputs into its parameters.
    ///
    /// Every assignment is validated by the receiving parameter before any is
    /// applied; a rejection leaves both stages and the position untouched.
    pub fn advance(&mut self) -> Result<Transition, ChainError> {
        if self.stages.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        let from_index = self.current;
        let to_index = from_index + 1;
        if to_index >= self.stages.len() {
            return Err(ChainError::NoNextStage { index: from_index });
        }

        let inherit = self.config.inherit_params;
        let (head, tail) = self.stages.split_at_mut(to_index);
        let from = &mut head[from_index];
        let to = &mut tail[0];
        let from_name = from.name.clone();
        let to_name = to.name.clone();
        let ready_parameter = from.options.ready_parameter.clone();

        let source = from.resolve()?;
        if let Some(parameter) = ready_parameter {
            if source.params().value(&parameter).and_then(Value::as_bool) != Some(true) {
                return Err(ChainError::StageNotReady {
                    stage: from_name,
                    parameter,
                });
            }
        }

        let outputs = resolve_outputs(&from_name, &*source)?;
        let target = to.resolve()?;
        let inputs: Vec<String> = target
            .describe_inputs()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        let accepts = |name: &str| inputs.iter().any(|input| input == name);

        let mut assignments: Vec<(String, Value)> = Vec::new();
        let mut dropped = Vec::new();
        for (name, value) in outputs {
            if assignments.iter().any(|(n, _)| n == &name) {
                continue;
            }
            if accepts(&name) {
                assignments.push((name, value));
            } else {
                dropped.push(name);
            }
        }

        if inherit {
            for param in source.params().iter() {
                let taken = assignments.iter().any(|(n, _)| n == &param.name);
                if !taken && accepts(&param.name) {
                    assignments.push((param.name.clone(), param.value.clone()));
                }
            }
        }

        if let Err(err) = target.params_mut().update_all(&assignments) {
            warn!(from = %from_name, to = %to_name, error = %err, "transition rejected");
            return Err(ChainError::InvalidTransition {
                from: from_name,
                to: to_name,
                source: err,
            });
        }

        let assigned: Vec<String> = assignments.into_iter().map(|(name, _)| name).collect();
        self.current = to_index;
        info!(from = %from_name, to = %to_name, ?assigned, ?dropped, "advanced");

        Ok(Transition {
            from: from_name,
            to: to_name,
            from_index,
            to_index,
            assigned,
            dropped,
        })
    }

    /// Step back one stage. Nothing propagated earlier is undone.
    pub fn retreat(&mut self) -> Result<usize, ChainError> {
        if self.current == 0 {
            return Err(ChainError::NoPreviousStage);
        }
        self.current -= 1;
        info!(to = ?self.current_name(), index = self.current, "retreated");
        Ok(self.current)
    }

    /// Set a parameter on the active stage. If this makes an auto-advancing
    /// stage ready, the chain advances and the transition is returned. A failed
    /// auto-advance is reported but the parameter keeps its new value.
    pub fn set_param(&mut self, name: &str, value: Value) -> Result<Option<Transition>, ChainError> {
        let index = self.current;
        let entry = self.stages.get_mut(index).ok_or(ChainError::EmptyChain)?;
        let options = entry.options.clone();
        entry.resolve()?.params_mut().set(name, value)?;
        debug!(stage = %entry.name, param = name, "parameter updated");

        let triggers = options.auto_advance && options.ready_parameter.as_deref() == Some(name);
        if triggers && self.can_advance() {
            return self.advance().map(Some);
        }
        Ok(None)
    }

    /// Structural description: stage indicator, navigation state and the
    /// active stage's own view.
    pub fn render(&mut self) -> Result<ChainView, ChainError> {
        let active = self.current()?.render();
        let current = self.current;

        let stages = self
            .stages
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let status = match i.cmp(&current) {
                    std::cmp::Ordering::Less => StageStatus::Complete,
                    std::cmp::Ordering::Equal => StageStatus::Active,
                    std::cmp::Ordering::Greater => StageStatus::Pending,
                };
                StageIndicator::new(entry.name.as_str(), status).with_title(entry.title())
            })
            .collect();

        Ok(ChainView {
            title: self.config.title.clone(),
            stages,
            current_index: current,
            controls: NavControls {
                previous: self.can_retreat(),
                next: self.can_advance(),
            },
            active,
        })
    }
}
