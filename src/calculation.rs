// calculation.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successful calculation. Field order is the column order of every
/// persisted history format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub operation: String,
    pub operand_a: f64,
    pub operand_b: f64,
    pub result: f64,
    pub timestamp: DateTime<Utc>,
}

impl CalculationRecord {
    pub const COLUMNS: [&'static str; 5] =
        ["operation", "operand_a", "operand_b", "result", "timestamp"];

    pub fn new(operation: &str, operand_a: f64, operand_b: f64, result: f64) -> Self {
        Self::at(operation, operand_a, operand_b, result, Utc::now())
    }

    pub fn at(
        operation: &str,
        operand_a: f64,
        operand_b: f64,
        result: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            operation: operation.to_string(),
            operand_a,
            operand_b,
            result,
            timestamp,
        }
    }
}

// Registry-free rendering; `OperationRegistry::describe` uses the symbol.
impl fmt::Display for CalculationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {}) = {}",
            self.operation,
            format_number(self.operand_a),
            format_number(self.operand_b),
            format_number(self.result)
        )
    }
}

/// Rounds to `precision` decimal places. Goes through the decimal
/// formatter so large precisions cannot overflow an intermediate scale.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let rounded = format!("{value:.prec$}", prec = precision as usize);
    rounded.parse().unwrap_or(value)
}

/// Integral values print without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
