//! Autoscaling decision core: recommendation, correction, and replica
//! distribution for a fleet of cost-tiered backends.
//!
//! This crate is a pure library: no cluster client, no HTTP surface, no
//! reconciliation loop. Callers supply metric snapshots and a [`Clock`];
//! the crate returns replica-count decisions.

pub mod autoscaler;
pub mod clock;
pub mod distributor;
pub mod error;
pub mod histogram;
pub mod recommender;
pub mod window;

pub use autoscaler::{Autoscaler, Behavior, PanicPolicy, ScaleUpBehavior, ScalingPolicy, SelectPolicy};
pub use clock::{Clock, FakeClock, SystemClock};
pub use distributor::{BackendConfig, GlobalInfo};
pub use error::{Error, QuantileError, Result};
pub use histogram::{Bucket, HistogramSnapshot, quantile_in_diff};
pub use recommender::{RecommendArgs, recommend};
pub use window::{LineChartWindow, RecordWindow, SnapshotWindow};
