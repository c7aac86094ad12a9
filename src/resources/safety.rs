//! Numeric safety clamp
//!
//! A bad intermediate never halts the simulation: NaN becomes 0 (pulled into
//! the range), infinities become the nearer bound, and the fault is logged.

use crate::core::types::ResourceId;

/// Clamp `value` into `[lo, hi]`, replacing non-finite input first
pub fn clamp_finite(resource: ResourceId, stage: &'static str, value: f64, lo: f64, hi: f64) -> f64 {
    let repaired = if value.is_nan() {
        tracing::error!(%resource, stage, "NaN produced, resetting to 0");
        0.0
    } else if value == f64::INFINITY {
        tracing::error!(%resource, stage, "+Infinity produced, clamping to {}", hi);
        hi
    } else if value == f64::NEG_INFINITY {
        tracing::error!(%resource, stage, "-Infinity produced, clamping to {}", lo);
        lo
    } else {
        value
    };

    repaired.clamp(lo, hi)
}

/// Replace a non-finite unbounded intermediate (rates) with 0
pub fn finite_or_zero(resource: ResourceId, stage: &'static str, value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        tracing::error!(%resource, stage, "non-finite value {} replaced with 0", value);
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_values_are_clamped_normally() {
        assert_eq!(clamp_finite(ResourceId::DetectionRisk, "t", 150.0, 0.0, 100.0), 100.0);
        assert_eq!(clamp_finite(ResourceId::DetectionRisk, "t", -3.0, 0.0, 100.0), 0.0);
        assert_eq!(clamp_finite(ResourceId::DetectionRisk, "t", 42.0, 0.0, 100.0), 42.0);
    }

    #[test]
    fn test_nan_becomes_zero_inside_range() {
        assert_eq!(clamp_finite(ResourceId::Influence, "t", f64::NAN, 0.0, 10.0), 0.0);
        // Zero outside the range is pulled to the nearer bound
        assert_eq!(clamp_finite(ResourceId::Influence, "t", f64::NAN, 5.0, 10.0), 5.0);
    }

    #[test]
    fn test_infinities_take_nearer_bound() {
        assert_eq!(clamp_finite(ResourceId::Bandwidth, "t", f64::INFINITY, 0.0, 10.0), 10.0);
        assert_eq!(clamp_finite(ResourceId::Bandwidth, "t", f64::NEG_INFINITY, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(ResourceId::Energy, "t", -2.5), -2.5);
        assert_eq!(finite_or_zero(ResourceId::Energy, "t", f64::NAN), 0.0);
    }
}
