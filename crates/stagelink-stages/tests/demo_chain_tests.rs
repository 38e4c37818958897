//! End-to-end runs of the demo chain.

use serde_json::json;
use stagelink_core::{ChainConfig, ChainError, RenderNode, StageOptions, StageStatus};
use stagelink_stages::{demo_chain, MultiplyStage, STAGE_ONE, STAGE_TWO};

#[test]
fn test_advance_carries_c_and_keeps_exp_default() {
    let mut chain = demo_chain(ChainConfig::default()).unwrap();
    let transition = chain.advance().unwrap();

    let stage_two = chain.stage(STAGE_TWO).unwrap();
    assert_eq!(stage_two.params().value("c"), Some(&json!(25)));
    assert_eq!(stage_two.params().value("exp"), Some(&json!(0.1)));
    assert_eq!(transition.assigned, vec!["c".to_string()]);
    assert_eq!(transition.dropped, vec!["d".to_string()]);
}

#[test]
fn test_edits_before_advance_are_propagated() {
    let mut chain = demo_chain(ChainConfig::default()).unwrap();
    chain.set_param("a", json!(3)).unwrap();
    chain.set_param("b", json!(4)).unwrap();
    chain.advance().unwrap();

    let c = chain.stage(STAGE_TWO).unwrap().params().value("c").cloned();
    assert_eq!(c, Some(json!(12)));
}

#[test]
fn test_going_back_and_forward_again_repropagates() {
    let mut chain = demo_chain(ChainConfig::default()).unwrap();
    chain.advance().unwrap();
    chain.set_param("exp", json!(2.0)).unwrap();
    chain.retreat().unwrap();

    chain.set_param("a", json!(2)).unwrap();
    chain.advance().unwrap();

    let params = chain.stage(STAGE_TWO).unwrap().params().clone();
    assert_eq!(params.value("c"), Some(&json!(10)));
    // exp is not an output of Stage 1, so the edit made on Stage 2 survives
    assert_eq!(params.value("exp"), Some(&json!(2.0)));
}

#[test]
fn test_duplicate_stage_name() {
    let mut chain = demo_chain(ChainConfig::default()).unwrap();
    let err = chain
        .register(STAGE_ONE, stagelink_core::StageSource::instance(MultiplyStage::new(1, 1)))
        .unwrap_err();

    assert!(matches!(err, ChainError::DuplicateName(_)));
    assert_eq!(chain.len(), 2);
    let a = chain.stage(STAGE_ONE).unwrap().params().value("a").cloned();
    assert_eq!(a, Some(json!(5)));
}

#[test]
fn test_render_after_advance() {
    let mut chain = demo_chain(ChainConfig::titled("Pipeline demo")).unwrap();
    chain.advance().unwrap();
    let view = chain.render().unwrap();

    assert_eq!(view.title.as_deref(), Some("Pipeline demo"));
    assert_eq!(view.stages[0].status, StageStatus::Complete);
    assert_eq!(view.stages[1].status, StageStatus::Active);
    assert!(view.controls.previous);
    assert!(!view.controls.next);

    match view.active {
        RenderNode::Row { children } => {
            assert_eq!(children[1], RenderNode::latex("{25}^{0.1}={1.380}"));
        }
        other => panic!("expected row, got {:?}", other),
    }
}

#[test]
fn test_ready_gate_on_stage_one() {
    let mut config = ChainConfig::default();
    config.stages.insert(
        STAGE_ONE.to_string(),
        StageOptions::ready_when("ready").auto_advance(),
    );
    let mut chain = demo_chain(config).unwrap();

    assert!(matches!(chain.advance(), Err(ChainError::StageNotReady { .. })));
    let transition = chain.set_param("ready", json!(true)).unwrap();
    assert!(transition.is_some());
    assert_eq!(chain.current_name(), Some(STAGE_TWO));
}
