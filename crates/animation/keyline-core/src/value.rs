//! Keyframe data points and their evaluation.
//!
//! A data point stores up to three axis components plus optional cue fields
//! (`file`, `locator`) used by sound and particle channels. Components are
//! either plain numbers or expression strings; an [`ExpressionEvaluator`]
//! supplied by the host decides what an expression means.

use serde::{Deserialize, Serialize};

/// Spatial axis of a transform channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    #[inline]
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }
}

/// How expression-valued components are resolved.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum EvalMode {
    /// Expressions go through the host evaluator.
    Get,
    /// Numeric literals only; anything else reads as zero.
    #[default]
    Calc,
}

impl EvalMode {
    #[inline]
    pub fn from_allow_expression(allow: bool) -> Self {
        if allow {
            EvalMode::Get
        } else {
            EvalMode::Calc
        }
    }
}

/// Host hook that evaluates expression strings at a playback time.
pub trait ExpressionEvaluator {
    fn evaluate(&self, expression: &str, time: f64) -> Option<f64>;
}

/// Evaluator that understands nothing beyond numeric literals.
#[derive(Copy, Clone, Debug, Default)]
pub struct NumericOnly;

impl ExpressionEvaluator for NumericOnly {
    fn evaluate(&self, _expression: &str, _time: f64) -> Option<f64> {
        None
    }
}

/// One axis value: a number or an expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Component {
    Number(f64),
    Expression(String),
}

impl Component {
    /// Numeric literal value, if the component is one (strings are parsed).
    pub fn literal(&self) -> Option<f64> {
        match self {
            Component::Number(n) => Some(*n),
            Component::Expression(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn evaluate(&self, mode: EvalMode, evaluator: &dyn ExpressionEvaluator, time: f64) -> f64 {
        if let Some(n) = self.literal() {
            return n;
        }
        match (self, mode) {
            (Component::Expression(expr), EvalMode::Get) => {
                evaluator.evaluate(expr, time).unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }
}

impl From<f64> for Component {
    fn from(n: f64) -> Self {
        Component::Number(n)
    }
}

impl From<&str> for Component {
    fn from(s: &str) -> Self {
        Component::Expression(s.to_string())
    }
}

/// One sub-value of a keyframe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(default)]
    pub x: Option<Component>,
    #[serde(default)]
    pub y: Option<Component>,
    #[serde(default)]
    pub z: Option<Component>,
    /// Asset path for sound and particle cues.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Locator node name a particle emitter attaches to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
}

impl DataPoint {
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(Component::Number(x)),
            y: Some(Component::Number(y)),
            z: Some(Component::Number(z)),
            ..Self::default()
        }
    }

    /// Same component on every axis.
    pub fn uniform(value: impl Into<Component>) -> Self {
        let c = value.into();
        Self {
            x: Some(c.clone()),
            y: Some(c.clone()),
            z: Some(c),
            ..Self::default()
        }
    }

    /// Cue data point pointing at an asset.
    pub fn cue(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Self::default()
        }
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    #[inline]
    pub fn get(&self, axis: Axis) -> Option<&Component> {
        match axis {
            Axis::X => self.x.as_ref(),
            Axis::Y => self.y.as_ref(),
            Axis::Z => self.z.as_ref(),
        }
    }

    #[inline]
    pub fn set(&mut self, axis: Axis, value: Option<Component>) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    /// Evaluate one axis; missing components read as zero.
    pub fn evaluate(
        &self,
        axis: Axis,
        mode: EvalMode,
        evaluator: &dyn ExpressionEvaluator,
        time: f64,
    ) -> f64 {
        self.get(axis)
            .map(|c| c.evaluate(mode, evaluator, time))
            .unwrap_or(0.0)
    }

    /// The file path, ignoring empty strings.
    #[inline]
    pub fn asset(&self) -> Option<&str> {
        self.file.as_deref().filter(|f| !f.is_empty())
    }
}
