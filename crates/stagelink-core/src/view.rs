//! Render description: framework-agnostic trees handed to a render layer
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::param::{Bounds, ParamKind, ParamSet};
use crate::stage::Renderable;

/// Opaque visual content produced by a stage or by the chain scaffold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum RenderNode {
    Text { text: String },
    Markdown { source: String },
    /// TeX source without surrounding `$`
    Latex { source: String },
    /// An editable parameter
    Widget {
        name: String,
        value: Value,
        kind: ParamKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bounds: Option<Bounds>,
    },
    Button {
        label: String,
        action: String,
        enabled: bool,
    },
    Row { children: Vec<RenderNode> },
    Column { children: Vec<RenderNode> },
    Titled { title: String, body: Box<RenderNode> },
}

impl RenderNode {
    pub fn text(text: impl Into<String>) -> Self {
        RenderNode::Text { text: text.into() }
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        RenderNode::Markdown {
            source: source.into(),
        }
    }

    pub fn latex(source: impl Into<String>) -> Self {
        RenderNode::Latex {
            source: source.into(),
        }
    }

    pub fn row(children: Vec<RenderNode>) -> Self {
        RenderNode::Row { children }
    }

    pub fn column(children: Vec<RenderNode>) -> Self {
        RenderNode::Column { children }
    }

    pub fn titled(title: impl Into<String>, body: RenderNode) -> Self {
        RenderNode::Titled {
            title: title.into(),
            body: Box::new(body),
        }
    }

    /// One widget per visible parameter, stacked
    pub fn widgets(params: &ParamSet) -> Self {
        let children = params
            .iter()
            .filter(|p| !p.is_hidden())
            .map(|p| RenderNode::Widget {
                name: p.name.clone(),
                value: p.value.clone(),
                kind: p.kind.clone(),
                bounds: p.bounds,
            })
            .collect();
        RenderNode::Column { children }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Complete,
    Active,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageIndicator {
    pub name: String,
    /// The stage's own title once instantiated, else the registered name
    pub title: String,
    pub status: StageStatus,
}

impl StageIndicator {
    pub fn new(name: impl Into<String>, status: StageStatus) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            status,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavControls {
    pub previous: bool,
    pub next: bool,
}

/// Structural description of a chain at its current position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub stages: Vec<StageIndicator>,
    pub current_index: usize,
    pub controls: NavControls,
    pub active: RenderNode,
}

impl ChainView {
    pub fn active_name(&self) -> Option<&str> {
        self.stages.get(self.current_index).map(|s| s.name.as_str())
    }
}

impl Renderable for ChainView {
    fn render(&self) -> RenderNode {
        let indicator = self
            .stages
            .iter()
            .map(|s| {
                let marker = match s.status {
                    StageStatus::Complete => "✓",
                    StageStatus::Active => "●",
                    StageStatus::Pending => "○",
                };
                RenderNode::text(format!("{} {}", marker, s.title))
            })
            .collect();

        let controls = RenderNode::row(vec![
            RenderNode::Button {
                label: "Previous".to_string(),
                action: "retreat".to_string(),
                enabled: self.controls.previous,
            },
            RenderNode::Button {
                label: "Next".to_string(),
                action: "advance".to_string(),
                enabled: self.controls.next,
            },
        ]);

        let body = RenderNode::column(vec![
            RenderNode::row(indicator),
            controls,
            self.active.clone(),
        ]);

        match &self.title {
            Some(title) => RenderNode::titled(title.clone(), body),
            None => body,
        }
    }
}
