//! Tile grid math on the XZ plane
//!
//! Tile `(x, z)` covers `[x * w, (x + 1) * w) × [z * w, (z + 1) * w)` where
//! `w = tile_size * cell_size`.

use std::fmt;

use glam::Vec3;
use navmesh_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::config::BuildSettings;

/// Integer coordinate of a tile on the XZ grid
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TileCoord {
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Tiles whose XZ footprint the box touches
///
/// The range is `floor(min / w) .. ceil(max / w)`, exclusive at the top, so a
/// box ending exactly on a tile edge does not reach into the next tile.
pub fn overlapping_tiles(settings: &BuildSettings, bounds: &BoundingBox) -> Vec<TileCoord> {
    if bounds.is_empty() {
        return Vec::new();
    }

    let tile_world_size = settings.tile_world_size();
    let start_x = (bounds.min.x / tile_world_size).floor() as i32;
    let start_z = (bounds.min.z / tile_world_size).floor() as i32;
    let end_x = (bounds.max.x / tile_world_size).ceil() as i32;
    let end_z = (bounds.max.z / tile_world_size).ceil() as i32;

    let mut tiles = Vec::with_capacity(
        (end_x - start_x).max(0) as usize * (end_z - start_z).max(0) as usize,
    );
    for z in start_z..end_z {
        for x in start_x..end_x {
            tiles.push(TileCoord::new(x, z));
        }
    }
    tiles
}

/// XZ footprint of a tile with an unbounded vertical range
pub fn tile_bounds(settings: &BuildSettings, coord: TileCoord) -> BoundingBox {
    let tile_world_size = settings.tile_world_size();
    let min_x = coord.x as f32 * tile_world_size;
    let min_z = coord.z as f32 * tile_world_size;

    BoundingBox::new(
        Vec3::new(min_x, f32::MIN, min_z),
        Vec3::new(min_x + tile_world_size, f32::MAX, min_z + tile_world_size),
    )
}

/// Snaps the vertical range outward to whole multiples of the cell height
pub fn snap_to_cell_height(settings: &BuildSettings, bounds: &mut BoundingBox) {
    let cell_height = settings.cell_height;
    bounds.min.y = (bounds.min.y / cell_height).floor() * cell_height;
    bounds.max.y = (bounds.max.y / cell_height).ceil() * cell_height;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BuildSettings {
        // 10 world units per tile
        BuildSettings::new(0.5, 0.2, 20)
    }

    #[test]
    fn test_box_on_tile_edges_covers_one_tile() {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(10.0));
        assert_eq!(overlapping_tiles(&settings(), &bounds), vec![TileCoord::new(0, 0)]);
    }

    #[test]
    fn test_negative_and_partial_coordinates() {
        let bounds = BoundingBox::new(Vec3::new(-0.5, 0.0, 2.0), Vec3::new(10.5, 1.0, 3.0));
        let tiles = overlapping_tiles(&settings(), &bounds);

        assert_eq!(
            tiles,
            vec![TileCoord::new(-1, 0), TileCoord::new(0, 0), TileCoord::new(1, 0)]
        );
    }

    #[test]
    fn test_empty_bounds_mark_nothing() {
        assert!(overlapping_tiles(&settings(), &BoundingBox::EMPTY).is_empty());
    }

    #[test]
    fn test_tile_bounds() {
        let bounds = tile_bounds(&settings(), TileCoord::new(-2, 3));
        assert_eq!(bounds.min.x, -20.0);
        assert_eq!(bounds.max.x, -10.0);
        assert_eq!(bounds.min.z, 30.0);
        assert_eq!(bounds.max.z, 40.0);
        assert_eq!(bounds.min.y, f32::MIN);
        assert_eq!(bounds.max.y, f32::MAX);
    }

    #[test]
    fn test_snap_to_cell_height() {
        let settings = BuildSettings::new(0.5, 0.25, 20);
        let mut bounds = BoundingBox::new(Vec3::new(0.0, -0.3, 0.0), Vec3::new(1.0, 1.1, 1.0));

        snap_to_cell_height(&settings, &mut bounds);

        assert_eq!(bounds.min.y, -0.5);
        assert_eq!(bounds.max.y, 1.25);
    }

    #[test]
    fn test_tile_ordering() {
        let mut coords = vec![TileCoord::new(1, 0), TileCoord::new(0, 1), TileCoord::new(0, 0)];
        coords.sort();
        assert_eq!(
            coords,
            vec![TileCoord::new(0, 0), TileCoord::new(0, 1), TileCoord::new(1, 0)]
        );
    }
}
