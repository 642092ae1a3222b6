//! Channel value resolution.
//!
//! Model:
//! - A channel's keyframes are unsorted; one scan finds `before` (greatest
//!   time strictly below the query) and `after` (smallest time at or above it).
//! - A query within `epsilon` of `before` or `after` returns that keyframe's
//!   stored value. With only one side present its value is held.
//! - Between two keyframes the segment alpha is clamped to [0, 1]. Two linear
//!   keyframes (or disabled interpolation, which rounds alpha to 0/1) blend
//!   linearly; a step keyframe holds; anything else runs a Catmull-Rom spline
//!   whose outer neighbours come from the time-sorted channel, falling back to
//!   the bracketing keyframes at the ends.
//! - A keyframe contributes its last data point when the query lies after it,
//!   the first one otherwise.

pub mod functions;

use log::trace;

use crate::config::Config;
use crate::keyframe::{Interpolation, Keyframe};
use crate::value::{Axis, EvalMode, ExpressionEvaluator, NumericOnly};

use functions::{catmull_rom, inverse_lerp, lerp};

/// Per-query settings for the interpolation engine.
#[derive(Copy, Clone)]
pub struct InterpolationOptions<'a> {
    pub epsilon: f64,
    pub disable_interpolations: bool,
    pub mode: EvalMode,
    pub evaluator: &'a dyn ExpressionEvaluator,
}

impl Default for InterpolationOptions<'static> {
    fn default() -> Self {
        let cfg = Config::default();
        Self {
            epsilon: cfg.exact_match_epsilon,
            disable_interpolations: cfg.disable_interpolations,
            mode: EvalMode::Calc,
            evaluator: &NumericOnly,
        }
    }
}

impl<'a> InterpolationOptions<'a> {
    pub fn from_config(cfg: &Config, mode: EvalMode, evaluator: &'a dyn ExpressionEvaluator) -> Self {
        Self {
            epsilon: cfg.exact_match_epsilon,
            disable_interpolations: cfg.disable_interpolations,
            mode,
            evaluator,
        }
    }

    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }
}

impl std::fmt::Debug for InterpolationOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpolationOptions")
            .field("epsilon", &self.epsilon)
            .field("disable_interpolations", &self.disable_interpolations)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// How a query time resolves against a channel.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<'k> {
    /// No keyframes: nothing to apply.
    Empty,
    /// The value of a single keyframe (exact hit, one-sided hold or step).
    Keyframe(&'k Keyframe),
    /// Component-wise blend between two keyframes.
    Linear {
        before: &'k Keyframe,
        after: &'k Keyframe,
        alpha: f64,
    },
    /// Catmull-Rom segment; outer neighbours are `None` at sequence ends.
    Spline {
        before_plus: Option<&'k Keyframe>,
        before: &'k Keyframe,
        after: &'k Keyframe,
        after_plus: Option<&'k Keyframe>,
        alpha: f64,
    },
}

/// Single scan for the keyframes bracketing `time`.
pub fn bracket(keyframes: &[Keyframe], time: f64) -> (Option<&Keyframe>, Option<&Keyframe>) {
    let mut before: Option<&Keyframe> = None;
    let mut after: Option<&Keyframe> = None;
    for kf in keyframes {
        if kf.time < time {
            if before.map_or(true, |b| kf.time > b.time) {
                before = Some(kf);
            }
        } else if after.map_or(true, |a| kf.time < a.time) {
            after = Some(kf);
        }
    }
    (before, after)
}

/// Outer neighbours of the `before`/`after` pair in time order.
fn spline_neighbours<'k>(
    keyframes: &'k [Keyframe],
    before: &'k Keyframe,
) -> (Option<&'k Keyframe>, Option<&'k Keyframe>) {
    let mut sorted: Vec<&Keyframe> = keyframes.iter().collect();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
    let Some(idx) = sorted.iter().position(|k| k.id == before.id) else {
        return (None, None);
    };
    let before_plus = idx.checked_sub(1).map(|i| sorted[i]);
    let after_plus = sorted.get(idx + 2).copied();
    (before_plus, after_plus)
}

/// Decide how `time` resolves against `keyframes`.
pub fn resolve<'k>(
    keyframes: &'k [Keyframe],
    time: f64,
    epsilon: f64,
    disable_interpolations: bool,
) -> Resolution<'k> {
    let (before, after) = bracket(keyframes, time);
    match (before, after) {
        (None, None) => Resolution::Empty,
        (Some(b), _) if (b.time - time).abs() <= epsilon => Resolution::Keyframe(b),
        (_, Some(a)) if (a.time - time).abs() <= epsilon => Resolution::Keyframe(a),
        (Some(b), None) => Resolution::Keyframe(b),
        (None, Some(a)) => Resolution::Keyframe(a),
        (Some(before), Some(after)) => {
            let mut alpha = inverse_lerp(before.time, after.time, time);
            if disable_interpolations {
                alpha = alpha.round();
                return Resolution::Linear {
                    before,
                    after,
                    alpha,
                };
            }
            match (before.interpolation, after.interpolation) {
                (Interpolation::Linear, Interpolation::Linear) => Resolution::Linear {
                    before,
                    after,
                    alpha,
                },
                (Interpolation::Step, _) => Resolution::Keyframe(before),
                _ => {
                    let (before_plus, after_plus) = spline_neighbours(keyframes, before);
                    trace!(
                        "spline segment {:.4}..{:.4} alpha={alpha:.4} neighbours=({}, {})",
                        before.time,
                        after.time,
                        before_plus.is_some(),
                        after_plus.is_some()
                    );
                    Resolution::Spline {
                        before_plus,
                        before,
                        after,
                        after_plus,
                        alpha,
                    }
                }
            }
        }
    }
}

impl Resolution<'_> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Resolution::Empty)
    }

    /// Evaluate one axis of this resolution at query `time`.
    pub fn sample_axis(&self, axis: Axis, time: f64, opts: &InterpolationOptions<'_>) -> Option<f64> {
        let (mode, ev) = (opts.mode, opts.evaluator);
        match *self {
            Resolution::Empty => None,
            Resolution::Keyframe(kf) => {
                let dp = kf.data_point_index_at(time, opts.epsilon);
                Some(kf.value(axis, dp, mode, ev, time))
            }
            Resolution::Linear {
                before,
                after,
                alpha,
            } => {
                let start = before.outgoing(axis, mode, ev, time);
                let stop = after.incoming(axis, mode, ev, time);
                Some(lerp(start, stop, alpha))
            }
            Resolution::Spline {
                before_plus,
                before,
                after,
                after_plus,
                alpha,
            } => {
                // Spline control values are always numeric.
                let p1 = before.outgoing(axis, EvalMode::Calc, ev, time);
                let p2 = after.incoming(axis, EvalMode::Calc, ev, time);
                let p0 = before_plus
                    .map(|k| k.outgoing(axis, EvalMode::Calc, ev, time))
                    .unwrap_or(p1);
                let p3 = after_plus
                    .map(|k| k.incoming(axis, EvalMode::Calc, ev, time))
                    .unwrap_or(p2);
                Some(catmull_rom(p0, p1, p2, p3, alpha))
            }
        }
    }

    /// Evaluate all three axes.
    pub fn sample(&self, time: f64, opts: &InterpolationOptions<'_>) -> Option<[f64; 3]> {
        if self.is_empty() {
            return None;
        }
        let mut out = [0.0; 3];
        for axis in Axis::ALL {
            out[axis.index()] = self.sample_axis(axis, time, opts)?;
        }
        Some(out)
    }
}

/// Resolved per-axis value of a channel at `time`, or `None` when it has no keyframes.
pub fn interpolate(
    keyframes: &[Keyframe],
    time: f64,
    opts: &InterpolationOptions<'_>,
) -> Option<[f64; 3]> {
    resolve(keyframes, time, opts.epsilon, opts.disable_interpolations).sample(time, opts)
}

/// Single-axis variant of [`interpolate`].
pub fn interpolate_axis(
    keyframes: &[Keyframe],
    time: f64,
    axis: Axis,
    opts: &InterpolationOptions<'_>,
) -> Option<f64> {
    resolve(keyframes, time, opts.epsilon, opts.disable_interpolations)
        .sample_axis(axis, time, opts)
}
