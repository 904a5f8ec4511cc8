//! Global replica distributor: splits a model-level replica total across
//! cost-tiered backends.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Immutable per-epoch backend configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub name: String,
    pub min_replicas: i32,
    pub max_replicas: i32,
    pub scaling_cost: i32,
}

/// A unit of scalable capacity with an associated marginal cost; the
/// distributor consumes blocks in cost order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ReplicaBlock {
    backend_index: usize,
    replicas: i32,
    cost: i64,
}

/// Derived, read-only view of a model's backends: their combined bounds and
/// the cost-ordered packing sequence used to restore a replica total.
#[derive(Debug, Clone)]
pub struct GlobalInfo {
    backends: Vec<BackendConfig>,
    min_replicas: i32,
    max_replicas: i32,
    scaling_order: Vec<ReplicaBlock>,
}

impl GlobalInfo {
    /// Build the packing order from `backends` and a shrink factor
    /// `cost_expansion_rate_percent ∈ [0, 100]`. `100` yields one block per
    /// backend holding its entire slack; smaller values geometrically shrink
    /// the block size each step, front-loading cheap increments.
    pub fn new(backends: Vec<BackendConfig>, cost_expansion_rate_percent: u8) -> Result<Self> {
        if cost_expansion_rate_percent > 100 {
            return Err(Error::InvalidCostExpansionRate(cost_expansion_rate_percent));
        }
        for b in &backends {
            if b.min_replicas > b.max_replicas {
                return Err(Error::InvalidBackendBounds {
                    name: b.name.clone(),
                    min: b.min_replicas,
                    max: b.max_replicas,
                });
            }
        }

        let min_replicas = backends.iter().map(|b| b.min_replicas).sum();
        let max_replicas = backends.iter().map(|b| b.max_replicas).sum();

        let mut scaling_order = Vec::new();
        for (idx, b) in backends.iter().enumerate() {
            let slack = b.max_replicas - b.min_replicas;
            if slack == 0 {
                continue;
            }
            if cost_expansion_rate_percent == 100 {
                scaling_order.push(ReplicaBlock {
                    backend_index: idx,
                    replicas: slack,
                    cost: b.scaling_cost as i64,
                });
                continue;
            }
            let rate = cost_expansion_rate_percent as f64 / 100.0;
            let mut remaining = slack;
            let mut rate_pow = 1.0f64;
            while remaining > 0 {
                let mut size = rate_pow.floor() as i32;
                if size < 1 {
                    size = 1;
                }
                if size > remaining {
                    size = remaining;
                }
                scaling_order.push(ReplicaBlock {
                    backend_index: idx,
                    replicas: size,
                    cost: b.scaling_cost as i64 * size as i64,
                });
                remaining -= size;
                rate_pow *= rate;
            }
        }
        scaling_order.sort_by(|a, b| a.cost.cmp(&b.cost).then(a.backend_index.cmp(&b.backend_index)));

        Ok(Self {
            backends,
            min_replicas,
            max_replicas,
            scaling_order,
        })
    }

    pub fn min_replicas(&self) -> i32 {
        self.min_replicas
    }

    pub fn max_replicas(&self) -> i32 {
        self.max_replicas
    }

    /// Split `replicas` across backends: every backend is present in the
    /// output, each value in `[backend.min, backend.max]`, summing to
    /// `clamp(replicas, MinReplicas, MaxReplicas)`. A request outside
    /// `[MinReplicas, MaxReplicas]` is silently clamped.
    pub fn restore_replicas_of_each_backend(&self, replicas: i32) -> HashMap<String, i32> {
        let target = replicas.clamp(self.min_replicas, self.max_replicas);
        let mut assigned: Vec<i32> = self.backends.iter().map(|b| b.min_replicas).collect();
        let mut remaining = target - self.min_replicas;

        for block in &self.scaling_order {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(block.replicas);
            assigned[block.backend_index] += take;
            remaining -= take;
        }

        self.backends
            .iter()
            .zip(assigned)
            .map(|(b, a)| (b.name.clone(), a))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(name: &str, min: i32, max: i32, cost: i32) -> BackendConfig {
        BackendConfig {
            name: name.to_string(),
            min_replicas: min,
            max_replicas: max,
            scaling_cost: cost,
        }
    }

    #[test]
    fn invalid_cost_expansion_rate_is_rejected() {
        let backends = vec![backend("b1", 0, 10, 1)];
        let err = GlobalInfo::new(backends, 101).unwrap_err();
        assert_eq!(err, Error::InvalidCostExpansionRate(101));
    }

    #[test]
    fn invalid_backend_bounds_are_rejected() {
        let backends = vec![backend("b1", 10, 5, 1)];
        let err = GlobalInfo::new(backends, 50).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidBackendBounds {
                name: "b1".to_string(),
                min: 10,
                max: 5,
            }
        );
    }

    /// S6: two backends, [min=0,max=10,cost=1] and [min=0,max=10,cost=5],
    /// rate=100, request 15 -> {b1:10, b2:5}.
    #[test]
    fn seed_scenario_six_whole_backend_blocks() {
        let backends = vec![backend("b1", 0, 10, 1), backend("b2", 0, 10, 5)];
        let info = GlobalInfo::new(backends, 100).unwrap();
        let out = info.restore_replicas_of_each_backend(15);
        assert_eq!(out.get("b1"), Some(&10));
        assert_eq!(out.get("b2"), Some(&5));
    }

    #[test]
    fn request_below_min_clamps_up_to_min() {
        let backends = vec![backend("b1", 2, 10, 1), backend("b2", 3, 10, 1)];
        let info = GlobalInfo::new(backends, 100).unwrap();
        let out = info.restore_replicas_of_each_backend(0);
        assert_eq!(out.get("b1"), Some(&2));
        assert_eq!(out.get("b2"), Some(&3));
        assert_eq!(out.values().sum::<i32>(), 5);
    }

    #[test]
    fn request_above_max_clamps_down_to_max() {
        let backends = vec![backend("b1", 0, 10, 1), backend("b2", 0, 10, 5)];
        let info = GlobalInfo::new(backends, 100).unwrap();
        let out = info.restore_replicas_of_each_backend(1000);
        assert_eq!(out.values().sum::<i32>(), 20);
        assert_eq!(out.get("b1"), Some(&10));
        assert_eq!(out.get("b2"), Some(&10));
    }

    #[test]
    fn output_always_within_backend_bounds_and_sums_to_clamped_target() {
        let backends = vec![backend("b1", 1, 8, 2), backend("b2", 0, 12, 3)];
        let info = GlobalInfo::new(backends, 40).unwrap();
        for request in [-5, 0, 1, 5, 9, 15, 20, 100] {
            let out = info.restore_replicas_of_each_backend(request);
            let expected_total = request.clamp(info.min_replicas(), info.max_replicas());
            assert_eq!(out.values().sum::<i32>(), expected_total);
            assert!((1..=8).contains(out.get("b1").unwrap()));
            assert!((0..=12).contains(out.get("b2").unwrap()));
        }
    }

    #[test]
    fn geometric_packing_front_loads_cheaper_backend() {
        let backends = vec![backend("cheap", 0, 20, 1), backend("pricey", 0, 20, 10)];
        let info = GlobalInfo::new(backends, 50).unwrap();
        let out = info.restore_replicas_of_each_backend(10);
        // cheap backend should absorb the full request before pricey grows.
        assert_eq!(out.get("cheap"), Some(&10));
        assert_eq!(out.get("pricey"), Some(&0));
    }
}
