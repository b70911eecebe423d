use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Limits for path searches and smoothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathfindingSettings {
    /// Maximum polygons in the search corridor
    pub max_corridor_polys: usize,
    /// Maximum points in a smoothed path
    pub max_smoothing: usize,
    /// Half extents used to find the polygons under the endpoints
    pub search_extents: Vec3,
}

impl Default for PathfindingSettings {
    fn default() -> Self {
        Self {
            max_corridor_polys: 256,
            max_smoothing: 128,
            search_extents: Vec3::new(2.0, 4.0, 2.0),
        }
    }
}

impl PathfindingSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_corridor_polys(mut self, max_corridor_polys: usize) -> Self {
        self.max_corridor_polys = max_corridor_polys;
        self
    }

    pub fn with_max_smoothing(mut self, max_smoothing: usize) -> Self {
        self.max_smoothing = max_smoothing;
        self
    }

    pub fn with_search_extents(mut self, search_extents: Vec3) -> Self {
        self.search_extents = search_extents;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_corridor_polys == 0 {
            return Err("Max corridor polys must be positive".to_string());
        }
        if self.max_smoothing == 0 {
            return Err("Max smoothing must be positive".to_string());
        }
        if !self.search_extents.is_finite() || self.search_extents.cmple(Vec3::ZERO).any() {
            return Err("Search extents must be positive".to_string());
        }
        Ok(())
    }
}
