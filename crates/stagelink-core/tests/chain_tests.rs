//! Integration tests for chain navigation and output propagation.

use serde_json::{json, Value};
use stagelink_core::{
    Chain, ChainConfig, ChainError, OutputDecl, OutputValues, Param, ParamError, ParamKind,
    ParamSet, RenderNode, Renderable, Stage, StageError, StageOptions, StageSource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// =============================================================================
// Test stages
// =============================================================================

/// Produces `outputs` (declared names) from fixed values
struct Producer {
    params: ParamSet,
    declared: Vec<&'static str>,
    produced: Vec<Value>,
}

impl Producer {
    fn new(declared: Vec<&'static str>, produced: Vec<Value>) -> Self {
        Self {
            params: ParamSet::new(),
            declared,
            produced,
        }
    }

    fn with_param(mut self, param: Param) -> Self {
        self.params.declare(param);
        self
    }
}

impl Renderable for Producer {
    fn render(&self) -> RenderNode {
        RenderNode::widgets(&self.params)
    }
}

impl Stage for Producer {
    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn describe_outputs(&self) -> Vec<OutputDecl> {
        self.declared
            .iter()
            .map(|name| OutputDecl::new(*name, ParamKind::Number))
            .collect()
    }

    fn compute_outputs(&self) -> Result<OutputValues, StageError> {
        Ok(match self.produced.len() {
            0 => OutputValues::None,
            1 => OutputValues::Single(self.produced[0].clone()),
            _ => OutputValues::Many(self.produced.clone()),
        })
    }
}

/// Only declares parameters
struct Consumer {
    params: ParamSet,
}

impl Consumer {
    fn new(params: ParamSet) -> Self {
        Self { params }
    }

    fn c_and_exp() -> Self {
        Self::new(
            ParamSet::new()
                .with(Param::number("c", 5.0).with_bounds(Some(0.0), None))
                .with(Param::number("exp", 0.1).with_bounds(Some(0.0), Some(3.0))),
        )
    }
}

impl Renderable for Consumer {
    fn render(&self) -> RenderNode {
        RenderNode::widgets(&self.params)
    }
}

impl Stage for Consumer {
    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }
}

#[derive(Default)]
struct Failing {
    params: ParamSet,
}

impl Renderable for Failing {
    fn render(&self) -> RenderNode {
        RenderNode::text("failing")
    }
}

impl Stage for Failing {
    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn describe_outputs(&self) -> Vec<OutputDecl> {
        vec![OutputDecl::untyped("c")]
    }

    fn compute_outputs(&self) -> Result<OutputValues, StageError> {
        Err(StageError::ExecutionFailed("division by zero".to_string()))
    }
}

/// Keeps `internal` out of its declared inputs
struct Guarded {
    params: ParamSet,
}

impl Guarded {
    fn new() -> Self {
        Self {
            params: ParamSet::new()
                .with(Param::number("c", 5.0))
                .with(Param::number("internal", 1.0)),
        }
    }
}

impl Renderable for Guarded {
    fn render(&self) -> RenderNode {
        RenderNode::widgets(&self.params)
    }
}

impl Stage for Guarded {
    fn title(&self) -> Option<&str> {
        Some("Guarded sink")
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn describe_inputs(&self) -> Vec<(String, ParamKind)> {
        vec![("c".to_string(), ParamKind::Number)]
    }
}

fn two_stage_chain() -> Chain {
    let mut chain = Chain::new();
    chain
        .register(
            "Stage 1",
            StageSource::instance(Producer::new(vec!["c", "d"], vec![json!(25), json!(3125)])),
        )
        .unwrap();
    chain
        .register("Stage 2", StageSource::factory(|| Box::new(Consumer::c_and_exp())))
        .unwrap();
    chain
}

fn param(chain: &Chain, stage: &str, name: &str) -> Value {
    chain
        .stage(stage)
        .and_then(|s| s.params().value(name).cloned())
        .unwrap_or(Value::Null)
}

// =============================================================================
// Propagation
// =============================================================================

#[test]
fn test_matching_output_propagates() {
    let mut chain = two_stage_chain();
    let transition = chain.advance().unwrap();

    assert_eq!(chain.current_index(), 1);
    assert_eq!(param(&chain, "Stage 2", "c"), json!(25));
    assert_eq!(param(&chain, "Stage 2", "exp"), json!(0.1));
    assert_eq!(transition.assigned, vec!["c".to_string()]);
    assert_eq!(transition.dropped, vec!["d".to_string()]);
}

#[test]
fn test_no_matching_inputs_leaves_params_unchanged() {
    let mut chain = Chain::new();
    chain
        .register("source", StageSource::instance(Producer::new(vec!["z"], vec![json!(1)])))
        .unwrap();
    chain
        .register("sink", StageSource::instance(Consumer::c_and_exp()))
        .unwrap();

    let before = chain.stage("sink").unwrap().params().clone();
    let transition = chain.advance().unwrap();

    assert_eq!(chain.current_index(), 1);
    assert_eq!(chain.stage("sink").unwrap().params(), &before);
    assert!(transition.assigned.is_empty());
    assert_eq!(transition.dropped, vec!["z".to_string()]);
}

#[test]
fn test_invalid_transition_is_all_or_nothing() {
    let mut chain = Chain::new();
    chain
        .register(
            "source",
            StageSource::instance(Producer::new(vec!["c", "exp"], vec![json!(9), json!(99.0)])),
        )
        .unwrap();
    chain
        .register("sink", StageSource::instance(Consumer::c_and_exp()))
        .unwrap();

    let err = chain.advance().unwrap_err();
    match err {
        ChainError::InvalidTransition { from, to, source } => {
            assert_eq!(from, "source");
            assert_eq!(to, "sink");
            assert!(matches!(source, ParamError::OutOfBounds { .. }));
        }
        other => panic!("expected InvalidTransition, got {:?}", other),
    }

    assert_eq!(chain.current_index(), 0);
    assert_eq!(param(&chain, "sink", "c"), json!(5.0));
    assert_eq!(param(&chain, "sink", "exp"), json!(0.1));
}

#[test]
fn test_type_mismatch_rejects_transition() {
    let mut chain = Chain::new();
    chain
        .register("source", StageSource::instance(Producer::new(vec!["c"], vec![json!("25")])))
        .unwrap();
    chain
        .register("sink", StageSource::instance(Consumer::c_and_exp()))
        .unwrap();

    assert!(matches!(
        chain.advance(),
        Err(ChainError::InvalidTransition {
            source: ParamError::TypeMismatch { .. },
            ..
        })
    ));
    assert_eq!(chain.current_index(), 0);
}

#[test]
fn test_stage_without_outputs_carries_nothing() {
    let mut chain = Chain::new();
    chain
        .register(
            "source",
            StageSource::instance(
                Producer::new(vec![], vec![]).with_param(Param::number("c", -1.0)),
            ),
        )
        .unwrap();
    chain
        .register("sink", StageSource::instance(Consumer::c_and_exp()))
        .unwrap();

    chain.advance().unwrap();
    assert_eq!(param(&chain, "sink", "c"), json!(5.0));
}

#[test]
fn test_inherit_params_carries_matching_parameters() {
    let config = ChainConfig {
        inherit_params: true,
        ..ChainConfig::default()
    };
    let mut chain = Chain::with_config(config);
    chain
        .register(
            "source",
            StageSource::instance(
                Producer::new(vec!["c"], vec![json!(25)])
                    .with_param(Param::number("c", 1.0))
                    .with_param(Param::number("exp", 2.0)),
            ),
        )
        .unwrap();
    chain
        .register("sink", StageSource::instance(Consumer::c_and_exp()))
        .unwrap();

    chain.advance().unwrap();

    // declared output wins over the same-named parameter
    assert_eq!(param(&chain, "sink", "c"), json!(25));
    assert_eq!(param(&chain, "sink", "exp"), json!(2.0));
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn test_advance_at_last_stage() {
    let mut chain = two_stage_chain();
    chain.advance().unwrap();

    assert!(matches!(
        chain.advance(),
        Err(ChainError::NoNextStage { index: 1 })
    ));
    assert_eq!(chain.current_index(), 1);
}

#[test]
fn test_retreat_at_first_stage() {
    let mut chain = two_stage_chain();
    assert!(matches!(chain.retreat(), Err(ChainError::NoPreviousStage)));
    assert_eq!(chain.current_index(), 0);
}

#[test]
fn test_advance_then_retreat_is_invertible_without_rollback() {
    let mut chain = two_stage_chain();
    chain.advance().unwrap();
    assert_eq!(chain.retreat().unwrap(), 0);
    assert_eq!(chain.current_index(), 0);
    assert_eq!(param(&chain, "Stage 2", "c"), json!(25));
}

#[test]
fn test_index_stays_in_range() {
    let mut chain = Chain::new();
    for i in 0..4 {
        chain
            .register(
                format!("stage-{}", i),
                StageSource::instance(Producer::new(vec!["c"], vec![json!(i)])),
            )
            .unwrap();
    }

    let moves = [true, true, false, true, true, true, true, false, false, false, false, false];
    for forward in moves {
        let _ = if forward {
            chain.advance().map(|_| ())
        } else {
            chain.retreat().map(|_| ())
        };
        assert!(chain.current_index() < chain.len());
    }
}

#[test]
fn test_render_controls_follow_bounds() {
    let mut chain = two_stage_chain();

    let first = chain.render().unwrap();
    assert!(!first.controls.previous);
    assert!(first.controls.next);

    chain.advance().unwrap();
    let last = chain.render().unwrap();
    assert!(last.controls.previous);
    assert!(!last.controls.next);
    assert_eq!(last.active_name(), Some("Stage 2"));
}

#[test]
fn test_only_declared_inputs_receive_outputs() {
    let mut chain = Chain::new();
    chain
        .register(
            "source",
            StageSource::instance(Producer::new(vec!["c", "internal"], vec![json!(2), json!(99)])),
        )
        .unwrap();
    chain
        .register("guarded", StageSource::instance(Guarded::new()))
        .unwrap();

    let transition = chain.advance().unwrap();
    assert_eq!(transition.assigned, vec!["c".to_string()]);
    assert_eq!(transition.dropped, vec!["internal".to_string()]);
    assert_eq!(param(&chain, "guarded", "c"), json!(2));
    assert_eq!(param(&chain, "guarded", "internal"), json!(1.0));
}

#[test]
fn test_inherit_params_respects_declared_inputs() {
    let mut chain = Chain::with_config(ChainConfig {
        inherit_params: true,
        ..ChainConfig::default()
    });
    chain
        .register(
            "source",
            StageSource::instance(
                Producer::new(vec![], vec![]).with_param(Param::number("internal", 42.0)),
            ),
        )
        .unwrap();
    chain
        .register("guarded", StageSource::instance(Guarded::new()))
        .unwrap();

    let transition = chain.advance().unwrap();
    assert!(transition.assigned.is_empty());
    assert_eq!(param(&chain, "guarded", "internal"), json!(1.0));
}

#[test]
fn test_indicator_uses_stage_title_once_built() {
    let mut chain = Chain::new();
    chain
        .register("source", StageSource::instance(Producer::new(vec!["c"], vec![json!(3)])))
        .unwrap();
    chain
        .register("guarded", StageSource::factory(|| Box::new(Guarded::new())))
        .unwrap();

    let before = chain.render().unwrap();
    assert_eq!(before.stages[1].title, "guarded");

    chain.advance().unwrap();
    let after = chain.render().unwrap();
    assert_eq!(after.stages[0].title, "source");
    assert_eq!(after.stages[1].title, "Guarded sink");
    assert_eq!(after.stages[1].name, "guarded");
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn test_duplicate_name_keeps_first_registration() {
    let mut chain = Chain::new();
    chain
        .register("Stage 1", StageSource::instance(Producer::new(vec!["c"], vec![json!(1)])))
        .unwrap();
    let err = chain
        .register("Stage 1", StageSource::instance(Consumer::c_and_exp()))
        .unwrap_err();

    assert!(matches!(err, ChainError::DuplicateName(ref name) if name == "Stage 1"));
    assert_eq!(chain.len(), 1);
    assert_eq!(chain.stage("Stage 1").unwrap().describe_outputs().len(), 1);
}

#[test]
fn test_duplicate_output_declaration_rejected() {
    let mut chain = Chain::new();
    let err = chain
        .register(
            "twice",
            StageSource::instance(Producer::new(vec!["c", "c"], vec![json!(1), json!(2)])),
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::DuplicateOutput { ref name, .. } if name == "c"));
    assert!(chain.is_empty());
}

#[test]
fn test_duplicate_output_in_factory_rejected_on_instantiation() {
    let mut chain = Chain::new();
    chain
        .register("first", StageSource::instance(Producer::new(vec!["c"], vec![json!(1)])))
        .unwrap();
    chain
        .register(
            "twice",
            StageSource::factory(|| {
                Box::new(Producer::new(vec!["c", "c"], vec![json!(1), json!(2)]))
            }),
        )
        .unwrap();
    assert_eq!(chain.len(), 2);

    let err = chain.advance().unwrap_err();
    assert!(matches!(
        err,
        ChainError::DuplicateOutput { ref stage, ref name } if stage == "twice" && name == "c"
    ));
    assert_eq!(chain.current_index(), 0);
    assert!(chain.stage("twice").is_none());
}

#[test]
fn test_missing_ready_parameter_rejected() {
    let mut chain = Chain::new();
    let err = chain
        .register_with(
            "gate",
            StageSource::instance(Producer::new(vec!["c"], vec![json!(1)])),
            StageOptions::ready_when("ready"),
        )
        .unwrap_err();
    assert!(matches!(err, ChainError::Config(ref msg) if msg.contains("ready")));
    assert!(chain.is_empty());

    chain
        .register_with(
            "lazy",
            StageSource::of::<Failing>(),
            StageOptions::ready_when("ready"),
        )
        .unwrap();
    assert!(matches!(chain.current(), Err(ChainError::Config(_))));
}

#[test]
fn test_current_instantiates_factory_once() {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);

    let mut chain = Chain::new();
    chain
        .register(
            "lazy",
            StageSource::factory(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::new(Consumer::c_and_exp())
            }),
        )
        .unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 0);

    chain.current().unwrap().params_mut().set("c", json!(7)).unwrap();
    let c = chain.current().unwrap().params().value("c").cloned();

    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert_eq!(c, Some(json!(7)));
}

#[test]
fn test_from_stages_builds_in_order() {
    let chain = Chain::from_stages(
        ChainConfig::titled("demo"),
        vec![
            ("one", StageSource::instance(Consumer::c_and_exp())),
            ("two", StageSource::instance(Consumer::c_and_exp())),
        ],
    )
    .unwrap();

    assert_eq!(chain.names(), vec!["one", "two"]);
    assert_eq!(chain.title(), Some("demo"));
}

// =============================================================================
// Output errors
// =============================================================================

#[test]
fn test_output_arity_mismatch() {
    let mut chain = Chain::new();
    chain
        .register(
            "short",
            StageSource::instance(Producer::new(vec!["c", "d"], vec![json!(1)])),
        )
        .unwrap();
    chain
        .register("sink", StageSource::instance(Consumer::c_and_exp()))
        .unwrap();

    let err = chain.advance().unwrap_err();
    assert!(matches!(
        err,
        ChainError::OutputArityMismatch {
            declared: 2,
            produced: 1,
            ..
        }
    ));
    assert_eq!(chain.current_index(), 0);
}

#[test]
fn test_stage_error_surfaces() {
    let mut chain = Chain::new();
    chain.register("broken", StageSource::of::<Failing>()).unwrap();
    chain
        .register("sink", StageSource::instance(Consumer::c_and_exp()))
        .unwrap();

    assert!(matches!(chain.advance(), Err(ChainError::Stage { .. })));
    assert_eq!(chain.current_index(), 0);
}

// =============================================================================
// Ready parameter
// =============================================================================

fn gated_chain(options: StageOptions) -> Chain {
    let mut chain = Chain::new();
    chain
        .register_with(
            "gate",
            StageSource::instance(
                Producer::new(vec!["c"], vec![json!(4)])
                    .with_param(Param::boolean("ready", false).with_precedence(-1)),
            ),
            options,
        )
        .unwrap();
    chain
        .register("sink", StageSource::instance(Consumer::c_and_exp()))
        .unwrap();
    chain
}

#[test]
fn test_not_ready_blocks_advance() {
    let mut chain = gated_chain(StageOptions::ready_when("ready"));

    assert!(!chain.can_advance());
    assert!(matches!(
        chain.advance(),
        Err(ChainError::StageNotReady { ref parameter, .. }) if parameter == "ready"
    ));
    assert!(!chain.render().unwrap().controls.next);

    assert!(chain.set_param("ready", json!(true)).unwrap().is_none());
    assert!(chain.can_advance());
    chain.advance().unwrap();
    assert_eq!(param(&chain, "sink", "c"), json!(4));
}

#[test]
fn test_auto_advance_on_ready() {
    let mut chain = gated_chain(StageOptions::ready_when("ready").auto_advance());

    let transition = chain.set_param("ready", json!(true)).unwrap();
    assert_eq!(transition.map(|t| t.to), Some("sink".to_string()));
    assert_eq!(chain.current_index(), 1);
}

#[test]
fn test_options_from_config() {
    let config = ChainConfig::from_yaml(
        r#"
stages:
  gate:
    ready_parameter: ready
    auto_advance: true
"#,
    )
    .unwrap();
    let mut chain = Chain::with_config(config);
    chain
        .register(
            "gate",
            StageSource::instance(
                Producer::new(vec!["c"], vec![json!(4)]).with_param(Param::boolean("ready", false)),
            ),
        )
        .unwrap();
    chain
        .register("sink", StageSource::instance(Consumer::c_and_exp()))
        .unwrap();

    assert!(!chain.can_advance());
    chain.set_param("ready", json!(true)).unwrap();
    assert_eq!(chain.current_name(), Some("sink"));
}

#[test]
fn test_set_param_validates() {
    let mut chain = two_stage_chain();
    chain.advance().unwrap();
    assert!(matches!(
        chain.set_param("exp", json!(5.0)),
        Err(ChainError::Param(ParamError::OutOfBounds { .. }))
    ));
    assert_eq!(param(&chain, "Stage 2", "exp"), json!(0.1));
}
