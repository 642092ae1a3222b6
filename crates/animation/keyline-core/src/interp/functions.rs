//! Interpolation helpers:
//! - lerp (component-wise blend)
//! - catmull_rom (uniform Catmull-Rom segment between p1 and p2)
//! - inverse_lerp (segment alpha, clamped)
//! - round_to (decimal rounding for frozen values)

/// Linear interpolation of scalars.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Position of `value` between `start` and `end`, clamped to [0, 1].
/// A zero-length span yields 0.
#[inline]
pub fn inverse_lerp(start: f64, end: f64, value: f64) -> f64 {
    let span = end - start;
    if span == 0.0 || !span.is_finite() {
        return 0.0;
    }
    ((value - start) / span).clamp(0.0, 1.0)
}

/// Uniform Catmull-Rom spline through p1 (t = 0) and p2 (t = 1), shaped by the
/// outer neighbours p0 and p3.
#[inline]
pub fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let v0 = (p2 - p0) * 0.5;
    let v1 = (p3 - p1) * 0.5;
    let t2 = t * t;
    let t3 = t * t2;
    (2.0 * p1 - 2.0 * p2 + v0 + v1) * t3 + (-3.0 * p1 + 3.0 * p2 - 2.0 * v0 - v1) * t2 + v0 * t + p1
}

/// Round to a fixed number of decimal digits. Non-finite input passes through.
#[inline]
pub fn round_to(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let e = 10f64.powi(digits);
    (value * e).round() / e
}
