//! Reference-range classification of observation values.

use fhir::{ObservationData, ReferenceRange};

/// How a value compares with its declared reference range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeIndicator {
    InRange,
    OutOfRange,
    /// No value, or no bound to compare against.
    Neutral,
}

impl RangeIndicator {
    /// Classify `value` against `range`.
    ///
    /// With both bounds the value is in range iff `low <= value <= high`. With one
    /// bound only that bound is checked.
    pub fn classify(value: Option<f64>, range: Option<&ReferenceRange>) -> Self {
        let (Some(value), Some(range)) = (value, range) else {
            return RangeIndicator::Neutral;
        };
        let in_range = match (range.low_value(), range.high_value()) {
            (Some(low), Some(high)) => low <= value && value <= high,
            (Some(low), None) => low <= value,
            (None, Some(high)) => value <= high,
            (None, None) => return RangeIndicator::Neutral,
        };
        if in_range {
            RangeIndicator::InRange
        } else {
            RangeIndicator::OutOfRange
        }
    }

    /// Classify an observation's value against its first range that has a bound.
    pub fn for_observation(observation: &ObservationData) -> Self {
        let range = observation
            .reference_ranges
            .iter()
            .find(|r| r.low_value().is_some() || r.high_value().is_some());
        Self::classify(observation.value(), range)
    }
}
