// SPDX-License-Identifier: MIT OR Apache-2.0
//! The per-sample evaluation context handed in by hosts.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Describes the sample point a procedure is evaluated for
///
/// Hosts fill one of these per shading sample and pass it to
/// [`Procedure::init_for_point`](crate::Procedure::init_for_point) before
/// pulling output values. The footprint `size` lets pattern modules
/// band-limit themselves for antialiasing; it is zero for exact point
/// queries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointInfo {
    /// Sample position in texture space
    pub position: DVec3,
    /// Extent of the sample footprint along each axis
    pub size: DVec3,
    /// Scene time in seconds
    pub time: f64,
    /// Per-point surface parameter values, addressed by index
    pub params: Vec<f64>,
}

impl PointInfo {
    /// Create a point context at `position` with a zero-size footprint
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Builder-style setter for the footprint size
    pub fn with_size(mut self, size: DVec3) -> Self {
        self.size = size;
        self
    }

    /// Builder-style setter for the scene time
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Builder-style setter for the surface parameters
    pub fn with_params(mut self, params: Vec<f64>) -> Self {
        self.params = params;
        self
    }

    /// Value of surface parameter `index`, or 0.0 if absent
    pub fn param(&self, index: usize) -> f64 {
        self.params.get(index).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_param_reads_zero() {
        let point = PointInfo::at(DVec3::ZERO).with_params(vec![0.5]);
        assert_eq!(point.param(0), 0.5);
        assert_eq!(point.param(1), 0.0);
    }

    #[test]
    fn test_builders_compose() {
        let point = PointInfo::at(DVec3::new(1.0, 2.0, 3.0))
            .with_size(DVec3::splat(0.01))
            .with_time(2.5);
        assert_eq!(point.position.y, 2.0);
        assert_eq!(point.size.x, 0.01);
        assert_eq!(point.time, 2.5);
    }
}
