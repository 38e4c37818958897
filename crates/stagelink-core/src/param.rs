//! Declared inputs: typed, bounded parameters owned by each stage.
//!
//! Values are plain `serde_json::Value`s. Validation checks kind and
//! bounds but never coerces: whatever passes validation is stored as is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::ParamError;

/// Kind of value a parameter accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum ParamKind {
    /// Any JSON number
    Number,
    /// JSON integer only
    Integer,
    Boolean,
    String,
    /// One of a fixed list of values
    Selector(Vec<Value>),
    /// No type check
    Any,
}

impl ParamKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::Number => value.is_number(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::String => value.is_string(),
            ParamKind::Selector(_) | ParamKind::Any => true,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamKind::Number => write!(f, "number"),
            ParamKind::Integer => write!(f, "integer"),
            ParamKind::Boolean => write!(f, "boolean"),
            ParamKind::String => write!(f, "string"),
            ParamKind::Selector(options) => write!(f, "one of {} options", options.len()),
            ParamKind::Any => write!(f, "any"),
        }
    }
}

/// Inclusive numeric bounds; `None` leaves that side open
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

impl Bounds {
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lower.map_or(true, |lo| x >= lo) && self.upper.map_or(true, |hi| x <= hi)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lower = self.lower.map(|v| v.to_string()).unwrap_or_else(|| "-∞".to_string());
        let upper = self.upper.map(|v| v.to_string()).unwrap_or_else(|| "∞".to_string());
        write!(f, "[{}, {}]", lower, upper)
    }
}

/// A single declared input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: Value,
    pub kind: ParamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Negative precedence hides the parameter from rendered widgets
    #[serde(default)]
    pub precedence: i32,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            kind,
            bounds: None,
            doc: None,
            precedence: 0,
        }
    }

    pub fn number(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, ParamKind::Number, Value::from(default))
    }

    pub fn integer(name: impl Into<String>, default: i64) -> Self {
        Self::new(name, ParamKind::Integer, Value::from(default))
    }

    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, ParamKind::Boolean, Value::Bool(default))
    }

    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String, Value::String(default.into()))
    }

    pub fn selector(name: impl Into<String>, options: Vec<Value>, default: Value) -> Self {
        Self::new(name, ParamKind::Selector(options), default)
    }

    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.bounds = Some(Bounds::new(lower, upper));
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_precedence(mut self, precedence: i32) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.precedence < 0
    }

    /// Check `value` against this parameter's kind and bounds.
    pub fn validate(&self, value: &Value) -> Result<(), ParamError> {
        if !self.kind.accepts(value) {
            return Err(ParamError::TypeMismatch {
                name: self.name.clone(),
                expected: self.kind.to_string(),
                got: json_type_name(value).to_string(),
            });
        }

        if let ParamKind::Selector(options) = &self.kind {
            if !options.contains(value) {
                return Err(ParamError::NotAnOption {
                    name: self.name.clone(),
                    value: value.to_string(),
                });
            }
        }

        if let (Some(bounds), Some(x)) = (self.bounds, value.as_f64()) {
            if !bounds.contains(x) {
                return Err(ParamError::OutOfBounds {
                    name: self.name.clone(),
                    value: value.to_string(),
                    bounds: bounds.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered, name-unique parameter collection owned by one stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    params: Vec<Param>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter. Re-declaring a name replaces the earlier one.
    pub fn with(mut self, param: Param) -> Self {
        self.declare(param);
        self
    }

    pub fn declare(&mut self, param: Param) {
        match self.params.iter_mut().find(|p| p.name == param.name) {
            Some(existing) => *existing = param,
            None => self.params.push(param),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|p| &p.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Validated single assignment
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), ParamError> {
        let param = self
            .params
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?;
        param.validate(&value)?;
        param.value = value;
        Ok(())
    }

    /// Validate every assignment first, then apply all of them.
    /// On error nothing has been written.
    pub fn update_all(&mut self, assignments: &[(String, Value)]) -> Result<(), ParamError> {
        for (name, value) in assignments {
            self.get(name)
                .ok_or_else(|| ParamError::UnknownParameter(name.clone()))?
                .validate(value)?;
        }

        for (name, value) in assignments {
            if let Some(param) = self.params.iter_mut().find(|p| &p.name == name) {
                param.value = value.clone();
            }
        }
        Ok(())
    }

    /// Snapshot of current values as a JSON object
    pub fn values(&self) -> Value {
        let map: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();
        Value::Object(map)
    }
}
