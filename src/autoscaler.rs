//! Corrector and per-unit autoscaler state.
//!
//! `Autoscaler` owns the sliding windows and panic timer for one scalable
//! unit (a backend, or a whole model when it has a model-level policy). It
//! is single-owner: no locks, no atomics — the same contract
//! `PodAutoscaler` gives its per-controller recommendation/event maps, just
//! scoped down to one unit instead of the whole fleet.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::histogram::HistogramSnapshot;
use crate::window::{LineChartWindow, RecordWindow, SnapshotWindow};

/// How multiple scaling policies within one direction are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectPolicy {
    /// Most permissive: `min` on the way down, `max` on the way up.
    Or,
    /// Most restrictive: `max` on the way down, `min` on the way up.
    And,
}

impl Default for SelectPolicy {
    fn default() -> Self {
        SelectPolicy::Or
    }
}

/// A stabilized rate-limiting policy for one scaling direction
/// (`scaleDown`, or `scaleUp`'s stable policy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    pub instances: i32,
    pub percent: i32,
    pub period_ms: i64,
    pub stabilization_window_ms: i64,
    #[serde(default)]
    pub select_policy: SelectPolicy,
}

/// The surge-mode policy applied while an autoscaler is in panic mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanicPolicy {
    pub percent: i32,
    pub period_ms: i64,
    pub panic_threshold_percent: i32,
    pub panic_mode_hold_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleUpBehavior {
    pub stable_policy: ScalingPolicy,
    pub panic_policy: PanicPolicy,
}

/// The full autoscaling behavior for a scalable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    pub tolerance_percent: i32,
    pub scale_down: ScalingPolicy,
    pub scale_up: ScaleUpBehavior,
    /// Staleness window used by [`Autoscaler::last_unfresh_histograms`]:
    /// `(fresh_ttl_ms, stale_ttl_ms)`.
    pub histogram_window_ms: (i64, i64),
}

/// Per-scalable-unit state: recommendation/correction windows and the
/// panic-mode timer.
pub struct Autoscaler {
    clock: Arc<dyn Clock>,
    behavior: Behavior,
    metric_targets: HashMap<String, f64>,

    panic_mode_hold_ms: i64,
    panic_mode_ends_at: i64,

    max_recommendation: RecordWindow<i32>,
    min_recommendation: RecordWindow<i32>,

    max_corrected: LineChartWindow<i32>,
    min_corrected_for_stable: LineChartWindow<i32>,
    min_corrected_for_panic: LineChartWindow<i32>,

    past_histograms: SnapshotWindow<HashMap<String, HistogramSnapshot>>,
}

impl Autoscaler {
    /// Build a fresh autoscaler for `behavior`; windows are sized directly
    /// from its TTLs. Reconstruct (drop and rebuild) whenever `behavior`
    /// changes — this type never diffs configs itself. `metric_targets` is
    /// carried alongside so callers can assemble this unit's
    /// [`RecommendArgs`](crate::recommender::RecommendArgs) without
    /// re-threading its target config through every tick.
    pub fn new(behavior: Behavior, metric_targets: HashMap<String, f64>, clock: Arc<dyn Clock>) -> Self {
        let max_recommendation = RecordWindow::new_max(behavior.scale_down.stabilization_window_ms);
        let min_recommendation =
            RecordWindow::new_min(behavior.scale_up.stable_policy.stabilization_window_ms);
        let max_corrected = LineChartWindow::new_max(behavior.scale_down.period_ms);
        let min_corrected_for_stable =
            LineChartWindow::new_min(behavior.scale_up.stable_policy.period_ms);
        let min_corrected_for_panic =
            LineChartWindow::new_min(behavior.scale_up.panic_policy.period_ms);
        let (fresh_ttl_ms, stale_ttl_ms) = behavior.histogram_window_ms;
        let past_histograms = SnapshotWindow::new(fresh_ttl_ms, stale_ttl_ms);
        let panic_mode_hold_ms = behavior.scale_up.panic_policy.panic_mode_hold_ms;

        Self {
            clock,
            behavior,
            metric_targets,
            panic_mode_hold_ms,
            panic_mode_ends_at: i64::MIN,
            max_recommendation,
            min_recommendation,
            max_corrected,
            min_corrected_for_stable,
            min_corrected_for_panic,
            past_histograms,
        }
    }

    /// This unit's metric-name -> target-value map, as supplied at
    /// construction.
    pub fn metric_targets(&self) -> &HashMap<String, f64> {
        &self.metric_targets
    }

    /// Whether this unit is currently in panic mode.
    /// `panic_mode_hold_ms == 0` disables panic mode entirely.
    pub fn is_panic_mode(&self) -> bool {
        self.panic_mode_hold_ms > 0 && self.clock.now_millis() <= self.panic_mode_ends_at
    }

    /// Enter (or extend) panic mode; the hold period never retracts early
    /// within an already-active hold.
    pub fn refresh_panic_mode(&mut self) {
        let now = self.clock.now_millis();
        self.panic_mode_ends_at = now + self.panic_mode_hold_ms;
        tracing::info!(ends_at = self.panic_mode_ends_at, "entered panic mode");
    }

    /// Record a fresh recommendation. Must be called before [`Self::correct`]
    /// in each tick.
    pub fn append_recommendation(&mut self, value: i32) {
        let now = self.clock.now_millis();
        self.max_recommendation.append(now, value);
        self.min_recommendation.append(now, value);
    }

    /// Record the corrected output of this tick. Must be called after
    /// [`Self::correct`].
    pub fn append_corrected(&mut self, value: i32) {
        let now = self.clock.now_millis();
        self.max_corrected.append(now, value);
        self.min_corrected_for_stable.append(now, value);
        self.min_corrected_for_panic.append(now, value);
    }

    /// Feed a per-tick histogram-by-pod snapshot into the SLO window.
    pub fn append_histograms(&mut self, snapshot: HashMap<String, HistogramSnapshot>) {
        let now = self.clock.now_millis();
        self.past_histograms.append(now, snapshot);
    }

    /// The most recent histogram snapshot old enough to diff a fresh one
    /// against.
    pub fn last_unfresh_histograms(&self) -> Option<&HashMap<String, HistogramSnapshot>> {
        let now = self.clock.now_millis();
        self.past_histograms.get_last_unfresh_snapshot(now)
    }

    /// Smooth `recommended` through the stabilization/rate-limit/panic
    /// constraints and clamp into `[min_replicas, max_replicas]`.
    pub fn correct(
        &mut self,
        recommended: i32,
        current: i32,
        min_replicas: i32,
        max_replicas: i32,
    ) -> i32 {
        let now = self.clock.now_millis();
        let corrected = if self.is_panic_mode() {
            self.correct_panic(now, recommended, current)
        } else {
            self.correct_stable(now, recommended, current)
        };
        corrected.clamp(min_replicas, max_replicas)
    }

    fn correct_panic(&mut self, now: i64, recommended: i32, current: i32) -> i32 {
        let mut corrected = recommended;
        if let Some(past) = self.min_corrected_for_panic.get_best(now, current) {
            let percent = self.behavior.scale_up.panic_policy.percent as i64;
            let relative_constraint = past + (past as i64 * percent / 100) as i32;
            corrected = corrected.min(relative_constraint);
        }
        // Panic never scales down.
        corrected.max(current)
    }

    fn correct_stable(&mut self, now: i64, recommended: i32, current: i32) -> i32 {
        match recommended.cmp(&current) {
            Ordering::Equal => current,
            Ordering::Less => {
                let mut corrected = recommended;
                if let Some(better_rec) = self.max_recommendation.get_best(now) {
                    corrected = corrected.max(better_rec);
                }
                if let Some(past) = self.max_corrected.get_best(now, current) {
                    let rule = &self.behavior.scale_down;
                    let absolute = past - rule.instances;
                    let relative = past - (past as i64 * rule.percent as i64 / 100) as i32;
                    let constraint = match rule.select_policy {
                        SelectPolicy::Or => absolute.min(relative),
                        SelectPolicy::And => absolute.max(relative),
                    };
                    corrected = corrected.max(constraint);
                }
                // Scale-down path must not scale up.
                corrected.min(current)
            },
            Ordering::Greater => {
                let mut corrected = recommended;
                if let Some(better_rec) = self.min_recommendation.get_best(now) {
                    corrected = corrected.min(better_rec);
                }
                if let Some(past) = self.min_corrected_for_stable.get_best(now, current) {
                    let rule = &self.behavior.scale_up.stable_policy;
                    let absolute = past + rule.instances;
                    let relative = past + (past as i64 * rule.percent as i64 / 100) as i32;
                    let constraint = match rule.select_policy {
                        SelectPolicy::Or => absolute.max(relative),
                        SelectPolicy::And => absolute.min(relative),
                    };
                    corrected = corrected.min(constraint);
                }
                // Scale-up path must not scale down.
                corrected.max(current)
            },
        }
    }
}
