use thiserror::Error;

/// Failures raised by histogram quantile lookups.
///
/// Every variant is recoverable at the tick level: the caller logs a
/// warning and skips the metric for this tick.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuantileError {
    #[error("histogram count went backwards: now={now} < past={past}")]
    InvalidCountDiff { now: u64, past: u64 },
    #[error("histogram bucket layouts don't match and neither snapshot is the default")]
    UnmatchedBuckets,
    #[error("cumulative bucket counts are not non-decreasing from past to now")]
    NonDecreasingBroken,
}

/// Construction-time failures for the distributor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("costExpansionRatePercent must be in [0, 100], got {0}")]
    InvalidCostExpansionRate(u8),
    #[error("backend {name} has invalid bounds: min={min} > max={max}")]
    InvalidBackendBounds { name: String, min: i32, max: i32 },
    #[error(transparent)]
    Quantile(#[from] QuantileError),
}

pub type Result<T> = std::result::Result<T, Error>;
