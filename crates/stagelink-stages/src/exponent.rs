use serde_json::Value;
use stagelink_core::{
    OutputDecl, OutputValues, Param, ParamKind, ParamSet, RenderNode, Renderable, Stage, StageError,
};

/// Second stage of the demo chain: raises `c` (received from the first
/// stage) to `exp`.
pub struct ExponentStage {
    params: ParamSet,
}

impl Default for ExponentStage {
    fn default() -> Self {
        Self::new(5.0, 0.1)
    }
}

impl ExponentStage {
    pub fn new(c: f64, exp: f64) -> Self {
        let params = ParamSet::new()
            .with(Param::number("c", c).with_bounds(Some(0.0), None))
            .with(Param::number("exp", exp).with_bounds(Some(0.0), Some(3.0)));
        Self { params }
    }

    fn number(&self, name: &str) -> Result<f64, StageError> {
        self.params
            .value(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| StageError::ValidationFailed(format!("'{}' is not a number", name)))
    }

    pub fn result(&self) -> Result<f64, StageError> {
        let (c, exp) = (self.number("c")?, self.number("exp")?);
        let result = c.powf(exp);
        if !result.is_finite() {
            return Err(StageError::ExecutionFailed(format!(
                "{}^{} is not a finite number",
                c, exp
            )));
        }
        Ok(result)
    }
}

impl Renderable for ExponentStage {
    fn render(&self) -> RenderNode {
        let c = self.params.value("c").cloned().unwrap_or(Value::Null);
        let exp = self.params.value("exp").cloned().unwrap_or(Value::Null);
        let view = match self.result() {
            Ok(result) => RenderNode::latex(format!("{{{}}}^{{{}}}={{{:.3}}}", c, exp, result)),
            Err(e) => RenderNode::text(e.to_string()),
        };
        RenderNode::row(vec![RenderNode::widgets(&self.params), view])
    }
}

impl Stage for ExponentStage {
    fn title(&self) -> Option<&str> {
        Some("Exponentiate")
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn describe_outputs(&self) -> Vec<OutputDecl> {
        vec![OutputDecl::new("result", ParamKind::Number)]
    }

    fn compute_outputs(&self) -> Result<OutputValues, StageError> {
        Ok(OutputValues::Single(Value::from(self.result()?)))
    }
}
