//! Cumulative-bucket histogram snapshots and diff-quantile queries. Used to
//! derive a request-latency SLO reading for the recommender's external
//! metrics from two point-in-time Prometheus-style histogram scrapes.

use crate::error::QuantileError;

/// One cumulative bucket: `cumulative_count` observations have a value
/// `<= le`. The last bucket in a well-formed snapshot has `le ==
/// f64::INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub le: f64,
    pub cumulative_count: u64,
}

/// A point-in-time histogram scrape.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistogramSnapshot {
    pub sum: f64,
    pub count: u64,
    pub buckets: Vec<Bucket>,
}

impl HistogramSnapshot {
    /// The zero baseline snapshot: no samples, no buckets. Diffing against
    /// it is always well-defined regardless of the other side's layout.
    pub fn default_snapshot() -> Self {
        Self::default()
    }

    fn is_default(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Quantile (`q` in `0..=100`) of the samples recorded strictly between
/// `past` and `now`, via linear interpolation inside the diffed bucket.
pub fn quantile_in_diff(
    q_percent: f64,
    now: &HistogramSnapshot,
    past: &HistogramSnapshot,
) -> Result<f64, QuantileError> {
    if now.count < past.count {
        return Err(QuantileError::InvalidCountDiff {
            now: now.count,
            past: past.count,
        });
    }
    let diff_count = now.count - past.count;
    if diff_count == 0 {
        return Ok(0.0);
    }

    let now_is_default = now.is_default();
    let past_is_default = past.is_default();
    if !now_is_default && !past_is_default {
        let same_layout = now.buckets.len() == past.buckets.len()
            && now
                .buckets
                .iter()
                .zip(past.buckets.iter())
                .all(|(a, b)| a.le == b.le);
        if !same_layout {
            return Err(QuantileError::UnmatchedBuckets);
        }
    }

    if now_is_default {
        // No buckets to interpolate within; no positional signal available.
        return Ok(0.0);
    }

    let mut prev_diff_check = 0u64;
    for (i, bucket) in now.buckets.iter().enumerate() {
        let past_cum = if past_is_default {
            0
        } else {
            past.buckets[i].cumulative_count
        };
        if bucket.cumulative_count < past_cum {
            return Err(QuantileError::NonDecreasingBroken);
        }
        let cum_diff = bucket.cumulative_count - past_cum;
        if cum_diff < prev_diff_check {
            return Err(QuantileError::NonDecreasingBroken);
        }
        prev_diff_check = cum_diff;
    }

    let target = q_percent / 100.0 * diff_count as f64;
    let mut prev_cum_diff = 0u64;
    let mut prev_le = 0.0f64;
    for (i, bucket) in now.buckets.iter().enumerate() {
        let past_cum = if past_is_default {
            0
        } else {
            past.buckets[i].cumulative_count
        };
        let cum_diff = bucket.cumulative_count - past_cum;
        if cum_diff as f64 >= target {
            if bucket.le.is_infinite() {
                return Ok(2.0 * prev_le);
            }
            let bucket_count = cum_diff - prev_cum_diff;
            let value = if bucket_count == 0 {
                bucket.le
            } else {
                let fraction = (target - prev_cum_diff as f64) / bucket_count as f64;
                prev_le + (bucket.le - prev_le) * fraction.clamp(0.0, 1.0)
            };
            return Ok(value);
        }
        prev_cum_diff = cum_diff;
        prev_le = bucket.le;
    }
    // Malformed input missing the +Inf sentinel bucket: fall back to the
    // same representative value used for an overflow into the last bucket.
    Ok(2.0 * prev_le)
}
