//! Path following on built navigation meshes
//!
//! The mesh itself is reached through the [`NavMeshQuery`] trait so any
//! detour-style query object can drive the corridor smoother.

// Allow unused code in tests - test code often has intentionally unused variables
#![cfg_attr(test, allow(unused))]

mod follow_path;
mod settings;

#[cfg(test)]
mod test_helpers;

pub use follow_path::*;
pub use settings::PathfindingSettings;

use bitflags::bitflags;
use glam::Vec3;
use navmesh_common::Result;
use serde::{Deserialize, Serialize};

/// Reference to a polygon of a navigation mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PolyRef(u64);

impl PolyRef {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }

    /// Zero is the null reference
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

bitflags! {
    /// Flags attached to the vertices of a straight path
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StraightPathFlags: u8 {
        /// The vertex is the start position
        const START = 0b0000_0001;
        /// The vertex is the end position
        const END = 0b0000_0010;
        /// The vertex is the start of an off-mesh connection
        const OFFMESH_CONNECTION = 0b0000_0100;
    }
}

/// One vertex of a straight path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightPathPoint {
    pub pos: Vec3,
    pub flags: StraightPathFlags,
    /// Polygon entered at this vertex
    pub poly: PolyRef,
}

/// Navigation mesh queries used by the path smoother
pub trait NavMeshQuery {
    /// Nearest polygon within `half_extents` of `center` and the closest point on it
    fn find_nearest_poly(&self, center: Vec3, half_extents: Vec3) -> Result<Option<(PolyRef, Vec3)>>;

    /// Polygon corridor from `start_ref` to `end_ref`, at most `max_path` long
    fn find_path(
        &self,
        start_ref: PolyRef,
        end_ref: PolyRef,
        start_pos: Vec3,
        end_pos: Vec3,
        max_path: usize,
    ) -> Result<Vec<PolyRef>>;

    fn closest_point_on_poly(&self, poly: PolyRef, pos: Vec3) -> Result<Vec3>;

    /// String-pulled path through `corridor`, at most `max_points` vertices
    fn find_straight_path(
        &self,
        start_pos: Vec3,
        end_pos: Vec3,
        corridor: &[PolyRef],
        max_points: usize,
    ) -> Result<Vec<StraightPathPoint>>;

    /// Moves from `start_pos` toward `end_pos` constrained to the surface
    ///
    /// Returns the reached position and the polygons visited, starting at
    /// `start_ref`.
    fn move_along_surface(
        &self,
        start_ref: PolyRef,
        start_pos: Vec3,
        end_pos: Vec3,
    ) -> Result<(Vec3, Vec<PolyRef>)>;

    /// Surface height of `poly` at `pos`, `None` when `pos` is outside it
    fn get_poly_height(&self, poly: PolyRef, pos: Vec3) -> Result<Option<f32>>;

    /// Polygons linked to `poly`
    fn poly_neighbours(&self, poly: PolyRef) -> Result<Vec<PolyRef>>;
}
