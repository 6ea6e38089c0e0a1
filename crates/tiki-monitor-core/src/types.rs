use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values (VND). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates and shares expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Scores on a 0-100 (or -100..100 for NPS) scale.
pub type Score = Decimal;

/// How a metric was obtained given the columns available in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    /// Full formula, every input column present.
    Computed,
    /// Coarser estimate from a subset of the inputs.
    Simplified,
    /// Documented constant; the inputs are absent.
    Fallback,
}

impl std::fmt::Display for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Basis::Computed => write!(f, "computed"),
            Basis::Simplified => write!(f, "simplified"),
            Basis::Fallback => write!(f, "fallback"),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
    pub generated_at: DateTime<Utc>,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
            generated_at: Utc::now(),
        },
    }
}
