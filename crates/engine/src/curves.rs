//! Effect Curve Library
//!
//! Realized fraction of an event's magnitude as a function of elapsed days
//! since the (lag-adjusted) start of the effect. Every curve is 0 before the
//! start and reaches 1.0 at or before the end of the ramp.

use inclusion_core::EffectShape;
use serde::{Deserialize, Serialize};

/// S-curve value at the start of the ramp; mirrored at the end (1 - floor)
pub const S_CURVE_FLOOR: f64 = 0.05;

/// Step function
pub fn immediate(elapsed_days: f64) -> f64 {
    if elapsed_days < 0.0 { 0.0 } else { 1.0 }
}

/// Linear ramp reaching 1.0 at `ramp_days`
pub fn gradual(elapsed_days: f64, ramp_days: f64) -> f64 {
    if elapsed_days < 0.0 {
        0.0
    } else if ramp_days <= 0.0 {
        1.0
    } else {
        (elapsed_days / ramp_days).min(1.0)
    }
}

/// Logistic centered at half the ramp, `S_CURVE_FLOOR` at 0 and
/// `1 - S_CURVE_FLOOR` at `ramp_days`
pub fn s_curve(elapsed_days: f64, ramp_days: f64) -> f64 {
    if elapsed_days < 0.0 {
        return 0.0;
    }
    if ramp_days <= 0.0 {
        return 1.0;
    }
    let steepness = 2.0 * ((1.0 - S_CURVE_FLOOR) / S_CURVE_FLOOR).ln() / ramp_days;
    1.0 / (1.0 + (-steepness * (elapsed_days - ramp_days / 2.0)).exp())
}

pub fn realized_fraction(shape: EffectShape, elapsed_days: f64, ramp_days: f64) -> f64 {
    match shape {
        EffectShape::Immediate => immediate(elapsed_days),
        EffectShape::Gradual => gradual(elapsed_days, ramp_days),
        EffectShape::SCurve => s_curve(elapsed_days, ramp_days),
    }
}

/// A shape bound to a ramp length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectCurve {
    pub shape: EffectShape,
    pub ramp_days: f64,
}

impl EffectCurve {
    pub fn new(shape: EffectShape, ramp_days: f64) -> Self {
        Self { shape, ramp_days }
    }

    pub fn fraction_at(&self, elapsed_days: f64) -> f64 {
        realized_fraction(self.shape, elapsed_days, self.ramp_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RAMP: f64 = 365.25;

    #[test]
    fn test_all_curves_zero_before_start() {
        for shape in [EffectShape::Immediate, EffectShape::Gradual, EffectShape::SCurve] {
            assert_eq!(realized_fraction(shape, -1.0, RAMP), 0.0);
            assert_eq!(realized_fraction(shape, -400.0, RAMP), 0.0);
        }
    }

    #[test]
    fn test_immediate_is_full_at_start() {
        assert_eq!(immediate(0.0), 1.0);
        assert_eq!(immediate(10_000.0), 1.0);
    }

    #[test]
    fn test_gradual_ramp() {
        assert_eq!(gradual(0.0, RAMP), 0.0);
        assert_relative_eq!(gradual(RAMP / 2.0, RAMP), 0.5);
        assert_eq!(gradual(RAMP, RAMP), 1.0);
        assert_eq!(gradual(RAMP * 3.0, RAMP), 1.0);
    }

    #[test]
    fn test_s_curve_endpoints() {
        assert_relative_eq!(s_curve(0.0, RAMP), 0.05, epsilon = 1e-12);
        assert_relative_eq!(s_curve(RAMP / 2.0, RAMP), 0.5, epsilon = 1e-12);
        assert_relative_eq!(s_curve(RAMP, RAMP), 0.95, epsilon = 1e-12);
        assert!(s_curve(RAMP * 4.0, RAMP) > 0.999);
    }

    #[test]
    fn test_curves_are_monotone() {
        for shape in [EffectShape::Immediate, EffectShape::Gradual, EffectShape::SCurve] {
            let mut previous = 0.0;
            for day in -30..800 {
                let fraction = realized_fraction(shape, day as f64, RAMP);
                assert!(fraction >= previous, "{} decreased at day {}", shape, day);
                assert!((0.0..=1.0).contains(&fraction));
                previous = fraction;
            }
        }
    }

    #[test]
    fn test_zero_ramp_is_immediate() {
        let curve = EffectCurve::new(EffectShape::Gradual, 0.0);
        assert_eq!(curve.fraction_at(0.0), 1.0);
        assert_eq!(curve.fraction_at(-1.0), 0.0);
    }
}
