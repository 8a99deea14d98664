// src/protocol/mod.rs — Wire protocol between the loop and the oracle

pub mod validate;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::infra::errors::ApsisError;

/// Discrete operations the oracle may propose. ROTATE is part of the
/// protocol but the solver does not execute it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpKind {
    Move,
    Swap,
    AddSurface,
    Rotate,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Move => write!(f, "MOVE"),
            OpKind::Swap => write!(f, "SWAP"),
            OpKind::AddSurface => write!(f, "ADD_SURFACE"),
            OpKind::Rotate => write!(f, "ROTATE"),
        }
    }
}

/// Infeasibility categories reported by the state evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    ThermalOverheat,
    GeometryClash,
    MassLimit,
    PathBlock,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::ThermalOverheat => write!(f, "THERMAL_OVERHEAT"),
            ViolationKind::GeometryClash => write!(f, "GEOMETRY_CLASH"),
            ViolationKind::MassLimit => write!(f, "MASS_LIMIT"),
            ViolationKind::PathBlock => write!(f, "PATH_BLOCK"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One detected infeasibility in the current configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub description: String,
    pub involved_components: Vec<String>,
    #[serde(default = "default_severity")]
    pub severity: f64,
}

fn default_severity() -> f64 {
    1.0
}

/// A metric value: numeric for physics quantities, textual for labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

/// Known metric names are typed fields; anything else the evaluator reports
/// lands in `extra` so unfamiliar keys stay visible instead of silently
/// joining a free-form map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub max_temp: f64,
    pub min_dist: f64,
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, MetricValue>,
}

/// Summary-only description of the current design state, sent to the oracle.
/// Carries derived summaries and metrics, never raw mesh or coordinate data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDigest {
    pub iteration: u32,
    pub metrics: Metrics,
    #[serde(default)]
    pub violations: Vec<ViolationItem>,
    pub geometry_summary: String,
    pub thermal_summary: String,
    #[serde(default)]
    pub history_trace: Vec<String>,
}

impl StateDigest {
    /// Empty violation list means the design is feasible.
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    /// Render the digest as the markdown prompt the oracle reads.
    pub fn to_markdown(&self) -> String {
        let mut md = format!("# Design State (Iter {})\n\n", self.iteration);

        md.push_str("## 1. Key Metrics\n");
        md.push_str(&format!("- **max_temp**: {:.2}\n", self.metrics.max_temp));
        md.push_str(&format!("- **min_dist**: {:.2}\n", self.metrics.min_dist));
        for (k, v) in &self.metrics.extra {
            match v {
                MetricValue::Number(n) => md.push_str(&format!("- **{}**: {}\n", k, n)),
                MetricValue::Text(t) => md.push_str(&format!("- **{}**: {}\n", k, t)),
            }
        }

        md.push_str("\n## 2. Active Violations\n");
        if self.violations.is_empty() {
            md.push_str("None. Design is feasible.\n");
        }
        for v in &self.violations {
            md.push_str(&format!("- [**{}**] (ID: {})\n", v.kind, v.id));
            md.push_str(&format!("  - Detail: {}\n", v.description));
            md.push_str(&format!(
                "  - Components: {}\n",
                v.involved_components.join(", ")
            ));
        }

        md.push_str("\n## 3. Physical Context\n");
        md.push_str(&format!("### Geometry\n{}\n", self.geometry_summary));
        md.push_str(&format!("### Thermal\n{}\n", self.thermal_summary));

        if !self.history_trace.is_empty() {
            md.push_str("\n## 4. History (Do not repeat failures)\n");
            for h in &self.history_trace {
                md.push_str(&format!("- {}\n", h));
            }
        }

        md
    }
}

/// One proposed operation with a bounded numeric search range.
/// `bounds` are relative offsets from the component's current position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAction {
    pub op_id: OpKind,
    pub target_component: String,
    #[serde(default)]
    pub search_axis: Option<Axis>,
    pub bounds: Vec<f64>,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
}

fn default_unit() -> String {
    "mm".into()
}

impl SearchAction {
    /// Structural constraints beyond what deserialization enforces.
    /// `path` names this action in error diagnostics, e.g. "actions[0]".
    pub fn validate(&self, path: &str) -> Result<(), ApsisError> {
        if self.target_component.trim().is_empty() {
            return Err(schema_err(
                format!("{path}.target_component"),
                "must be a non-empty component identifier",
            ));
        }
        if self.bounds.len() != 2 {
            return Err(schema_err(
                format!("{path}.bounds"),
                format!("expected exactly two elements, got {}", self.bounds.len()),
            ));
        }
        if self.bounds[0] > self.bounds[1] {
            return Err(schema_err(
                format!("{path}.bounds"),
                format!(
                    "must be [min, max], got [{}, {}]",
                    self.bounds[0], self.bounds[1]
                ),
            ));
        }
        if self.op_id == OpKind::Move && self.search_axis.is_none() {
            return Err(schema_err(
                format!("{path}.search_axis"),
                "required when op_id = MOVE",
            ));
        }
        Ok(())
    }
}

/// The oracle's full response: an opaque tracking id, free-text reasoning,
/// and a non-empty ordered action list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    pub plan_id: String,
    pub reasoning_summary: String,
    pub actions: Vec<SearchAction>,
}

impl SearchSpec {
    pub fn validate(&self) -> Result<(), ApsisError> {
        if self.actions.is_empty() {
            return Err(schema_err("actions", "must contain at least one action"));
        }
        for (i, action) in self.actions.iter().enumerate() {
            action.validate(&format!("actions[{i}]"))?;
        }
        Ok(())
    }
}

pub(crate) fn schema_err(
    field: impl Into<String>,
    message: impl std::fmt::Display,
) -> ApsisError {
    ApsisError::SchemaViolation {
        field: field.into(),
        message: message.to_string(),
    }
}
