use navmesh_common::{BoundingBox, GeometryData, Result};

use crate::config::{AgentSettings, BuildSettings};
use crate::tiles::TileCoord;

/// Everything the mesh backend gets to build one tile
#[derive(Debug, Clone, Copy)]
pub struct TileBuildInput<'a> {
    pub coord: TileCoord,
    /// Tile footprint with its vertical range snapped to the cell height
    pub bounds: BoundingBox,
    pub settings: &'a BuildSettings,
    pub agent: &'a AgentSettings,
    /// Whole-scene geometry; the backend clips it to `bounds` itself
    pub geometry: &'a GeometryData,
}

/// Turns triangles into an opaque navmesh tile payload
///
/// Implementations wrap a voxelization pipeline. They are called concurrently
/// for different tiles and must not block on one another.
pub trait MeshBackend: Send + Sync {
    /// Returns the tile payload, or `None` when nothing navigable was produced
    fn build_tile(&self, input: &TileBuildInput<'_>) -> Result<Option<Vec<u8>>>;
}
