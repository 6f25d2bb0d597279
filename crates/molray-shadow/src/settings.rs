//! Engine tunables.

use serde::{Deserialize, Serialize};

/// Numeric knobs of the shadow engine. Plain data, so it can ride along in
/// serialized render settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    /// Distance a query point is nudged toward the light before testing,
    /// so a sample does not re-hit the surface it sits on.
    pub bias: f32,
    /// Lower bound on the light-space culling cell edge, in scene units.
    pub min_cell_size: f32,
    /// Per-axis cell cap handed to the culling grids.
    pub max_cells_per_axis: usize,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            bias: 0.05,
            min_cell_size: 1.0,
            max_cells_per_axis: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = ShadowSettings::default();
        assert!((s.bias - 0.05).abs() < 1e-6);
        assert!((s.min_cell_size - 1.0).abs() < 1e-6);
        assert_eq!(s.max_cells_per_axis, 64);
    }

    #[test]
    fn test_serde_round_trip() {
        let s = ShadowSettings {
            bias: 0.1,
            min_cell_size: 2.0,
            max_cells_per_axis: 32,
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: ShadowSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
