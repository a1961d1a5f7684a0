//! User-tunable query parameters.
//!
//! [`QueryParameters`] is the plain value the dispatcher snapshots for each
//! request.  [`ParameterStore`] owns the current values for a session: every
//! setter clamps into the parameter's declared range, and the whole store can
//! be frozen while a submission is in flight so that the snapshot sent with a
//! request is the one later shown next to its debug payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Inclusive bounds for `result_count` (the endpoint's `top_k`).
pub const RESULT_COUNT_BOUNDS: (u32, u32) = (1, 20);

/// Inclusive bounds for `fan_out` (the endpoint's `multi_n`).
pub const FAN_OUT_BOUNDS: (u32, u32) = (1, 10);

/// Inclusive bounds for `hybrid_weight` (the endpoint's `alpha`).
pub const HYBRID_WEIGHT_BOUNDS: (f64, f64) = (0.0, 1.0);

const DEFAULT_RESULT_COUNT: u32 = 5;
const DEFAULT_FAN_OUT: u32 = 5;
const DEFAULT_HYBRID_WEIGHT: f64 = 0.6;

/// Tuning values sent with every query.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParameters {
    /// Number of reranked results the answer is grounded on.
    pub result_count: u32,

    /// Number of reformulated queries the endpoint fans out to.
    pub fan_out: u32,

    /// Weight between keyword (0.0) and vector (1.0) search.
    pub hybrid_weight: f64,
}

impl QueryParameters {
    /// Returns a copy with every value clamped into its bounds.
    pub fn clamped(self) -> Self {
        Self {
            result_count: self
                .result_count
                .clamp(RESULT_COUNT_BOUNDS.0, RESULT_COUNT_BOUNDS.1),
            fan_out: self.fan_out.clamp(FAN_OUT_BOUNDS.0, FAN_OUT_BOUNDS.1),
            hybrid_weight: clamp_weight(self.hybrid_weight).unwrap_or(DEFAULT_HYBRID_WEIGHT),
        }
    }

    /// Read a parameter as a float.
    pub fn get(&self, name: ParameterName) -> f64 {
        match name {
            ParameterName::ResultCount => self.result_count as f64,
            ParameterName::FanOut => self.fan_out as f64,
            ParameterName::HybridWeight => self.hybrid_weight,
        }
    }
}

impl Default for QueryParameters {
    fn default() -> Self {
        Self {
            result_count: DEFAULT_RESULT_COUNT,
            fan_out: DEFAULT_FAN_OUT,
            hybrid_weight: DEFAULT_HYBRID_WEIGHT,
        }
    }
}

impl fmt::Display for QueryParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "top_k={} multi_n={} alpha={:.2}",
            self.result_count, self.fan_out, self.hybrid_weight
        )
    }
}

/// Names a single tunable parameter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParameterName {
    /// `top_k`
    ResultCount,
    /// `multi_n`
    FanOut,
    /// `alpha`
    HybridWeight,
}

impl ParameterName {
    /// All parameters, in display order.
    pub const ALL: [ParameterName; 3] = [
        ParameterName::ResultCount,
        ParameterName::FanOut,
        ParameterName::HybridWeight,
    ];

    /// The name the endpoint uses for this parameter.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ParameterName::ResultCount => "top_k",
            ParameterName::FanOut => "multi_n",
            ParameterName::HybridWeight => "alpha",
        }
    }

    /// Inclusive bounds as floats.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            ParameterName::ResultCount => {
                (RESULT_COUNT_BOUNDS.0 as f64, RESULT_COUNT_BOUNDS.1 as f64)
            }
            ParameterName::FanOut => (FAN_OUT_BOUNDS.0 as f64, FAN_OUT_BOUNDS.1 as f64),
            ParameterName::HybridWeight => HYBRID_WEIGHT_BOUNDS,
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl FromStr for ParameterName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "top_k" | "result_count" | "results" => Ok(ParameterName::ResultCount),
            "multi_n" | "fan_out" | "fanout" => Ok(ParameterName::FanOut),
            "alpha" | "hybrid_weight" | "hybrid" => Ok(ParameterName::HybridWeight),
            _ => Err(format!(
                "Unknown parameter: {s}. Valid options: top_k, multi_n, alpha"
            )),
        }
    }
}

/// The session's current parameter values.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    values: QueryParameters,
    frozen: bool,
}

impl ParameterStore {
    /// Create a store seeded with `initial`, clamped into bounds.
    pub fn new(initial: QueryParameters) -> Self {
        Self {
            values: initial.clamped(),
            frozen: false,
        }
    }

    /// Snapshot of the current values.
    pub fn values(&self) -> QueryParameters {
        self.values
    }

    /// Returns true while setters are disabled.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Disable every setter until [`thaw`](Self::thaw).
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Re-enable setters.
    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    /// Set `result_count`, clamped.  Returns false if the store is frozen.
    pub fn set_result_count(&mut self, value: u32) -> bool {
        if self.frozen {
            return false;
        }
        self.values.result_count = value.clamp(RESULT_COUNT_BOUNDS.0, RESULT_COUNT_BOUNDS.1);
        true
    }

    /// Set `fan_out`, clamped.  Returns false if the store is frozen.
    pub fn set_fan_out(&mut self, value: u32) -> bool {
        if self.frozen {
            return false;
        }
        self.values.fan_out = value.clamp(FAN_OUT_BOUNDS.0, FAN_OUT_BOUNDS.1);
        true
    }

    /// Set `hybrid_weight`, clamped.  Returns false if the store is frozen or
    /// the value is not finite.
    pub fn set_hybrid_weight(&mut self, value: f64) -> bool {
        if self.frozen {
            return false;
        }
        match clamp_weight(value) {
            Some(weight) => {
                self.values.hybrid_weight = weight;
                true
            }
            None => false,
        }
    }

    /// Set any parameter from a float.
    ///
    /// Integer parameters round to the nearest integer before clamping.
    /// Non-finite values are ignored.
    pub fn set(&mut self, name: ParameterName, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match name {
            ParameterName::ResultCount => self.set_result_count(round_to_u32(value)),
            ParameterName::FanOut => self.set_fan_out(round_to_u32(value)),
            ParameterName::HybridWeight => self.set_hybrid_weight(value),
        }
    }
}

fn clamp_weight(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value.clamp(HYBRID_WEIGHT_BOUNDS.0, HYBRID_WEIGHT_BOUNDS.1))
    } else {
        None
    }
}

fn round_to_u32(value: f64) -> u32 {
    // `as` saturates: negatives land on 0 and huge values on u32::MAX.
    value.round() as u32
}
