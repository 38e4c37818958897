use serde_json::Value;
use stagelink_core::{
    OutputDecl, OutputValues, Param, ParamKind, ParamSet, RenderNode, Renderable, Stage, StageError,
};

/// First stage of the demo chain: `c = a * b`, `d = a ^ b`.
pub struct MultiplyStage {
    params: ParamSet,
}

impl Default for MultiplyStage {
    fn default() -> Self {
        Self::new(5, 5)
    }
}

impl MultiplyStage {
    pub fn new(a: i64, b: i64) -> Self {
        let params = ParamSet::new()
            .with(Param::integer("a", a).with_bounds(Some(0.0), Some(10.0)))
            .with(Param::integer("b", b).with_bounds(Some(0.0), Some(10.0)))
            .with(
                Param::boolean("ready", false)
                    .with_precedence(-1)
                    .with_doc("Set once the inputs are final"),
            );
        Self { params }
    }

    fn operand(&self, name: &str) -> Result<i64, StageError> {
        self.params
            .value(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| StageError::ValidationFailed(format!("'{}' is not an integer", name)))
    }

    /// `(a * b, a ^ b)`
    pub fn compute(&self) -> Result<(i64, i64), StageError> {
        let a = self.operand("a")?;
        let b = self.operand("b")?;

        let product = a
            .checked_mul(b)
            .ok_or_else(|| StageError::ExecutionFailed(format!("{} * {} overflows", a, b)))?;
        let power = u32::try_from(b)
            .ok()
            .and_then(|exp| a.checked_pow(exp))
            .ok_or_else(|| StageError::ExecutionFailed(format!("{}^{} is out of range", a, b)))?;

        Ok((product, power))
    }
}

impl Renderable for MultiplyStage {
    fn render(&self) -> RenderNode {
        let view = match (self.compute(), self.operand("a"), self.operand("b")) {
            (Ok((c, d)), Ok(a), Ok(b)) => {
                RenderNode::latex(format!("{a} * {b} = {c} \\\\ {a}^{{{b}}} = {d}"))
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => RenderNode::text(e.to_string()),
        };
        RenderNode::row(vec![RenderNode::widgets(&self.params), view])
    }
}

impl Stage for MultiplyStage {
    fn title(&self) -> Option<&str> {
        Some("Multiply")
    }

    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn params_mut(&mut self) -> &mut ParamSet {
        &mut self.params
    }

    fn describe_outputs(&self) -> Vec<OutputDecl> {
        vec![
            OutputDecl::new("c", ParamKind::Number),
            OutputDecl::new("d", ParamKind::Number),
        ]
    }

    fn compute_outputs(&self) -> Result<OutputValues, StageError> {
        let (c, d) = self.compute()?;
        Ok(OutputValues::Many(vec![Value::from(c), Value::from(d)]))
    }
}
