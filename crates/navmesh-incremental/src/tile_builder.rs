//! Per-tile mesh generation
//!
//! A tile is only built when its footprint overlaps a region of interest. Its
//! vertical range is taken from the overlapping regions and snapped to the
//! cell height so neighbouring tiles voxelize on the same grid.

use std::time::Instant;

use navmesh_common::{BoundingBox, GeometryData};

use crate::backend::{MeshBackend, TileBuildInput};
use crate::config::{AgentSettings, BuildSettings};
use crate::navmesh::NavMeshTile;
use crate::tiles::{snap_to_cell_height, tile_bounds, TileCoord};

/// Bounds a tile is built with, or `None` when no region overlaps it
pub fn tile_build_bounds(
    settings: &BuildSettings,
    coord: TileCoord,
    regions: &[BoundingBox],
) -> Option<BoundingBox> {
    let mut bounds = tile_bounds(settings, coord);
    let mut min_height = f32::MAX;
    let mut max_height = f32::MIN;
    let mut overlapped = false;

    for region in regions.iter().filter(|region| !region.is_empty()) {
        if region.overlaps_xz(&bounds) {
            min_height = min_height.min(region.min.y);
            max_height = max_height.max(region.max.y);
            overlapped = true;
        }
    }

    if !overlapped {
        return None;
    }

    bounds.min.y = min_height;
    bounds.max.y = max_height;
    snap_to_cell_height(settings, &mut bounds);
    Some(bounds)
}

/// Builds tiles of one layer against shared, read-only scene geometry
pub struct TileBuilder<'a> {
    settings: &'a BuildSettings,
    regions: &'a [BoundingBox],
    backend: &'a dyn MeshBackend,
    geometry: &'a GeometryData,
}

impl<'a> TileBuilder<'a> {
    pub fn new(
        settings: &'a BuildSettings,
        regions: &'a [BoundingBox],
        backend: &'a dyn MeshBackend,
        geometry: &'a GeometryData,
    ) -> Self {
        Self {
            settings,
            regions,
            backend,
            geometry,
        }
    }

    /// Builds one tile; `None` means the tile must be absent from the layer
    ///
    /// Backend failures are logged and produce an empty tile.
    pub fn build(&self, coord: TileCoord, agent: &AgentSettings) -> Option<NavMeshTile> {
        let start_time = Instant::now();
        let bounds = tile_build_bounds(self.settings, coord, self.regions)?;

        let input = TileBuildInput {
            coord,
            bounds,
            settings: self.settings,
            agent,
            geometry: self.geometry,
        };

        let tile = match self.backend.build_tile(&input) {
            Ok(Some(data)) => Some(NavMeshTile::new(coord, data)),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Tile {}: mesh backend failed: {}", coord, e);
                None
            }
        };

        log::debug!("Tile {}: built in {:?}", coord, start_time.elapsed());
        tile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{settings_10m, MockBackend};
    use glam::Vec3;
    use navmesh_common::Winding;

    fn floor_geometry() -> GeometryData {
        GeometryData::from_triangles(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 10.0),
            ],
            &[0, 1, 2],
            Winding::RightHanded,
        )
        .unwrap()
    }

    #[test]
    fn test_bounds_use_overlapping_regions_only() {
        let settings = settings_10m();
        let regions = [
            BoundingBox::new(Vec3::new(0.0, -1.05, 0.0), Vec3::new(10.0, 2.01, 10.0)),
            BoundingBox::new(Vec3::new(2.0, 5.0, 2.0), Vec3::new(4.0, 8.0, 4.0)),
            BoundingBox::new(Vec3::new(50.0, -100.0, 50.0), Vec3::new(60.0, 100.0, 60.0)),
        ];

        let bounds = tile_build_bounds(&settings, TileCoord::new(0, 0), &regions).unwrap();

        assert_eq!(bounds.min.x, 0.0);
        assert_eq!(bounds.max.x, 10.0);
        assert!((bounds.min.y - -1.2).abs() < 1e-5);
        assert!((bounds.max.y - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_tile_outside_regions_is_empty() {
        let settings = settings_10m();
        let regions = [BoundingBox::new(Vec3::ZERO, Vec3::splat(10.0))];
        let geometry = floor_geometry();
        let backend = MockBackend::new();

        let builder = TileBuilder::new(&settings, &regions, &backend, &geometry);

        assert!(builder.build(TileCoord::new(1, 0), &AgentSettings::default()).is_none());
        assert!(builder.build(TileCoord::new(-1, 0), &AgentSettings::default()).is_none());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_backend_payload_becomes_tile() {
        let settings = settings_10m();
        let regions = [BoundingBox::new(Vec3::ZERO, Vec3::splat(10.0))];
        let geometry = floor_geometry();
        let backend = MockBackend::new();

        let tile = TileBuilder::new(&settings, &regions, &backend, &geometry)
            .build(TileCoord::new(0, 0), &AgentSettings::default())
            .unwrap();

        assert_eq!(tile.coord, TileCoord::new(0, 0));
        assert!(!tile.data.is_empty());
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_backend_failure_is_empty_tile() {
        let settings = settings_10m();
        let regions = [BoundingBox::new(Vec3::ZERO, Vec3::splat(10.0))];
        let geometry = floor_geometry();
        let backend = MockBackend::new().failing_at(TileCoord::new(0, 0));

        let tile = TileBuilder::new(&settings, &regions, &backend, &geometry)
            .build(TileCoord::new(0, 0), &AgentSettings::default());

        assert!(tile.is_none());
        assert_eq!(geometry.triangle_count(), 1);
    }
}
