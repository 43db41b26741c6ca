use crate::value::{Float64, Value};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Interval
///
/// Closed numeric range `[low, high]`. The caller guarantees `low <= high`;
/// the constructor does not re-validate. Ordering is by `low`, then `high`,
/// which is the BST key order of the interval search tree.
///

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[display("[{low}, {high}]")]
pub struct Interval {
    low: Float64,
    high: Float64,
}

impl Interval {
    #[must_use]
    pub const fn new(low: Float64, high: Float64) -> Self {
        Self { low, high }
    }

    /// Build an interval from two numeric cells.
    pub fn try_from_values(low: &Value, high: &Value) -> Result<Self, IntervalError> {
        let low = numeric_endpoint(low)?;
        let high = numeric_endpoint(high)?;

        Ok(Self { low, high })
    }

    #[must_use]
    pub const fn low(&self) -> Float64 {
        self.low
    }

    #[must_use]
    pub const fn high(&self) -> Float64 {
        self.high
    }

    /// Closed-bounds point containment.
    #[must_use]
    pub fn contains(&self, point: Float64) -> bool {
        self.low <= point && point <= self.high
    }

    /// Closed-bounds overlap test.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.low <= other.high && other.low <= self.high
    }
}

fn numeric_endpoint(value: &Value) -> Result<Float64, IntervalError> {
    let raw = value.as_f64().ok_or_else(|| IntervalError::NonNumeric {
        value: value.clone(),
    })?;

    Float64::try_new(raw).ok_or_else(|| IntervalError::NonNumeric {
        value: value.clone(),
    })
}

///
/// IntervalError
///

#[derive(Debug, ThisError)]
pub enum IntervalError {
    #[error("non-numeric interval endpoint: {value:?}")]
    NonNumeric { value: Value },
}
