//! Pure replica-count recommender.
//!
//! `recommend` takes a snapshot of instantaneous metrics and produces a
//! desired replica count, or signals that no metric produced a usable
//! signal this tick. It touches no window, no clock, no shared state — the
//! same inputs always produce the same output.

use std::collections::HashMap;

const SKIP_CONTRIBUTION_CEILING: f64 = 1_000_000_000.0;

/// Arguments to [`recommend`].
#[derive(Debug, Clone)]
pub struct RecommendArgs {
    pub min_instances: i32,
    pub max_instances: i32,
    pub current_instances: i32,
    /// Noise band as a fraction, e.g. `0.1` for 10%.
    pub tolerance: f64,
    /// Metric name -> target value.
    pub metric_targets: HashMap<String, f64>,
    pub unready_instances: i32,
    /// One map per ready instance; a metric absent from a map is "missing"
    /// for that instance.
    pub ready_instances_metrics: Vec<HashMap<String, f64>>,
    /// Metric name -> value. A metric present here is evaluated as an
    /// external metric for that name instead of a per-instance one.
    pub external_metrics: HashMap<String, f64>,
}

fn clip(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.min(SKIP_CONTRIBUTION_CEILING)
    }
}

fn sign_nonneg(x: f64) -> bool {
    x >= 0.0
}

/// Compute the desired replica count. Returns `(recommended, skip)`; `skip`
/// is `true` iff no metric produced a usable signal, in which case the
/// caller must leave the tick a no-op.
pub fn recommend(args: &RecommendArgs) -> (i32, bool) {
    if args.current_instances < args.min_instances {
        return (args.min_instances, false);
    }
    if args.current_instances > args.max_instances {
        return (args.max_instances, false);
    }

    let current = args.current_instances as f64;
    let mut contributions: Vec<f64> = Vec::new();

    for (name, &target) in &args.metric_targets {
        if let Some(&metric) = args.external_metrics.get(name) {
            let desired = metric / target;
            let ratio = desired / current;
            let contribution = if (ratio - 1.0).abs() <= args.tolerance {
                current
            } else {
                desired.ceil()
            };
            tracing::debug!(metric = %name, ratio, contribution, "external metric contribution");
            contributions.push(clip(contribution));
            continue;
        }

        let mut sum = 0.0f64;
        let mut metrics_count: i32 = 0;
        let mut missing_count: i32 = 0;
        for instance in &args.ready_instances_metrics {
            match instance.get(name) {
                Some(&v) => {
                    sum += v;
                    metrics_count += 1;
                },
                None => missing_count += 1,
            }
        }
        if metrics_count == 0 {
            tracing::debug!(metric = %name, "no ready instance reported this metric, skipping");
            continue;
        }

        let mean = sum / metrics_count as f64;
        let ratio = mean / target;
        let direction_up = sign_nonneg(ratio - 1.0);

        let contribution = if args.unready_instances == 0 && missing_count == 0 {
            if (ratio - 1.0).abs() <= args.tolerance {
                current
            } else {
                (ratio * metrics_count as f64).ceil()
            }
        } else {
            let (enlarged_sum, enlarged_count) = if !direction_up {
                // Scale-down: unready instances are ignored entirely; missing
                // instances are assumed to report exactly the target (neutral).
                (sum + missing_count as f64 * target, metrics_count + missing_count)
            } else {
                // Scale-up: unready and missing instances are assumed to
                // report zero (conservative).
                (sum, metrics_count + args.unready_instances + missing_count)
            };
            let new_mean = enlarged_sum / enlarged_count as f64;
            let new_ratio = new_mean / target;
            let new_direction_up = sign_nonneg(new_ratio - 1.0);

            if (new_ratio - 1.0).abs() <= args.tolerance || new_direction_up != direction_up {
                current
            } else {
                let candidate = (new_ratio * enlarged_count as f64).ceil();
                let candidate_direction_up = sign_nonneg(candidate - current);
                if candidate_direction_up != new_direction_up {
                    current
                } else {
                    candidate
                }
            }
        };
        tracing::debug!(metric = %name, ratio, contribution, "per-instance metric contribution");
        contributions.push(clip(contribution));
    }

    if contributions.is_empty() {
        tracing::warn!("no metric produced a usable signal, skipping tick");
        return (0, true);
    }

    let aggregated = contributions.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let recommended = (aggregated as i32).clamp(args.min_instances, args.max_instances);
    (recommended, false)
}
