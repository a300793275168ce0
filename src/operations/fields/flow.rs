use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Share of a vertex's water sent downhill each visit.
const TRANSFER: f64 = 0.9;
/// Most water a sink may hold.
const SINK_CAP: f64 = 2.0;

/// Hydraulic flow over the vertex graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParams {
    pub iterations: usize,
    /// Initial water on an upward-facing vertex.
    pub rain: f64,
    /// Share of its water a draining vertex gives up; it keeps `1 - streak`.
    pub streak: f64,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            iterations: 10,
            rain: 1.0,
            streak: 0.95,
        }
    }
}

impl FlowParams {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("flow.rain", self.rain, 0.0, f64::MAX)?;
        // Kept plus sent water never exceeds what the vertex held.
        ConfigError::check_range("flow.streak", self.streak, 0.9, 1.0)
    }
}

/// Runs the flow simulation and returns the raw water per vertex.
///
/// Water starts at `rain * max(0, up[v])`. Each iteration visits vertices
/// from highest to lowest (ties by index). A vertex with strictly lower
/// neighbours sends 90% of its water to them in proportion to the height
/// drop and keeps `water * (1 - streak)`; a vertex without one is capped
/// at 2. Values are not clamped.
#[must_use]
pub fn simulate_flow(params: &FlowParams, heights: &[f64], up: &[f64], neighbours: &[Vec<usize>]) -> Vec<f64> {
    let mut water: Vec<f64> = up.iter().map(|&u| params.rain * u.max(0.0)).collect();
    let mut order: Vec<usize> = (0..heights.len()).collect();
    order.sort_by(|&a, &b| heights[b].total_cmp(&heights[a]).then(a.cmp(&b)));

    for _ in 0..params.iterations {
        for &v in &order {
            let current = water[v];
            let z = heights[v];
            let total_drop: f64 = neighbours[v]
                .iter()
                .map(|&n| z - heights[n])
                .filter(|&d| d > 0.0)
                .sum();
            if total_drop > 0.0 {
                let sent = current * TRANSFER;
                for &n in &neighbours[v] {
                    let drop = z - heights[n];
                    if drop > 0.0 {
                        water[n] += sent * drop / total_drop;
                    }
                }
                water[v] = current * (1.0 - params.streak);
            } else {
                water[v] = current.min(SINK_CAP);
            }
        }
    }
    debug!(
        iterations = params.iterations,
        total = water.iter().sum::<f64>(),
        "flow simulated"
    );
    water
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (Vec<f64>, Vec<f64>, Vec<Vec<usize>>) {
        (
            vec![2.0, 1.0, 0.0],
            vec![1.0, 1.0, 1.0],
            vec![vec![1], vec![0, 2], vec![1]],
        )
    }

    #[test]
    fn chain_drains_into_the_sink() {
        let (heights, up, neighbours) = chain();
        let params = FlowParams {
            iterations: 1,
            ..FlowParams::default()
        };
        let water = simulate_flow(&params, &heights, &up, &neighbours);
        assert!((water[0] - 0.05).abs() < 1e-12);
        assert!((water[1] - 0.095).abs() < 1e-12);
        assert!((water[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn total_water_never_grows() {
        // A bumpy 5x5 height field.
        let n = 5;
        let mut heights = Vec::new();
        let mut neighbours = Vec::new();
        for j in 0..n {
            for i in 0..n {
                #[allow(clippy::cast_precision_loss)]
                let (x, y) = (i as f64, j as f64);
                heights.push((x * 1.3).sin() + (y * 0.7).cos());
                let mut adj = Vec::new();
                if i > 0 {
                    adj.push(j * n + i - 1);
                }
                if i + 1 < n {
                    adj.push(j * n + i + 1);
                }
                if j > 0 {
                    adj.push((j - 1) * n + i);
                }
                if j + 1 < n {
                    adj.push((j + 1) * n + i);
                }
                neighbours.push(adj);
            }
        }
        let up = vec![0.8; n * n];
        let initial: f64 = up.iter().map(|u| u * FlowParams::default().rain).sum();
        let mut previous = initial;
        for iterations in 0..6 {
            let params = FlowParams {
                iterations,
                ..FlowParams::default()
            };
            let total: f64 = simulate_flow(&params, &heights, &up, &neighbours).iter().sum();
            assert!(total <= initial + 1e-9);
            assert!(total <= previous + 1e-9);
            previous = total;
        }
    }

    #[test]
    fn downward_faces_get_no_rain() {
        let params = FlowParams {
            iterations: 0,
            ..FlowParams::default()
        };
        let water = simulate_flow(&params, &[0.0, 0.0], &[-1.0, 0.5], &[vec![], vec![]]);
        assert_eq!(water, vec![0.0, 0.5]);
    }

    #[test]
    fn streak_below_range_is_rejected() {
        let params = FlowParams {
            streak: 0.5,
            ..FlowParams::default()
        };
        assert!(params.validate().is_err());
    }
}
