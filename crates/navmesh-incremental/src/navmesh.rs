//! Published navmesh snapshots
//!
//! A [`NavMesh`] never changes after a build returns it. Successive builds share
//! every untouched [`NavMeshTile`] through `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use navmesh_common::GroupId;
use serde::{Deserialize, Serialize};

use crate::cache::NavMeshCache;
use crate::config::BuildSettings;
use crate::tiles::TileCoord;

/// Built tile payload at one grid coordinate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavMeshTile {
    pub coord: TileCoord,
    /// Opaque data produced by the mesh backend
    pub data: Vec<u8>,
}

impl NavMeshTile {
    pub fn new(coord: TileCoord, data: Vec<u8>) -> Self {
        Self { coord, data }
    }
}

/// All tiles generated for one group
#[derive(Debug, Clone, Default)]
pub struct NavMeshLayer {
    tiles: BTreeMap<TileCoord, Arc<NavMeshTile>>,
}

impl NavMeshLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Arc<NavMeshTile>> {
        self.tiles.get(&coord)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Arc<NavMeshTile>> {
        self.tiles.values()
    }

    /// Coordinates in ascending order
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub(crate) fn insert(&mut self, tile: Arc<NavMeshTile>) {
        self.tiles.insert(tile.coord, tile);
    }

    pub(crate) fn remove(&mut self, coord: TileCoord) -> Option<Arc<NavMeshTile>> {
        self.tiles.remove(&coord)
    }
}

impl FromIterator<NavMeshTile> for NavMeshLayer {
    fn from_iter<I: IntoIterator<Item = NavMeshTile>>(iter: I) -> Self {
        let mut layer = Self::new();
        for tile in iter {
            layer.insert(Arc::new(tile));
        }
        layer
    }
}

/// One immutable navmesh snapshot with a layer per group
#[derive(Debug, Clone)]
pub struct NavMesh {
    cell_size: f32,
    tile_size: i32,
    layers: BTreeMap<GroupId, NavMeshLayer>,
    cache: Arc<NavMeshCache>,
}

impl NavMesh {
    pub(crate) fn new(
        settings: &BuildSettings,
        layers: BTreeMap<GroupId, NavMeshLayer>,
        cache: Arc<NavMeshCache>,
    ) -> Self {
        Self {
            cell_size: settings.cell_size,
            tile_size: settings.tile_size,
            layers,
            cache,
        }
    }

    /// Navmesh assembled from previously persisted layers
    ///
    /// It carries no cache, so the first build seeded with it rebuilds every
    /// tile inside the region boxes and reports the differences.
    pub fn from_layers(settings: &BuildSettings, layers: BTreeMap<GroupId, NavMeshLayer>) -> Self {
        Self::new(settings, layers, Arc::new(NavMeshCache::default()))
    }

    /// Navmesh without layers
    pub fn empty(settings: &BuildSettings) -> Self {
        Self::new(settings, BTreeMap::new(), Arc::new(NavMeshCache::default()))
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    pub fn layer(&self, group: GroupId) -> Option<&NavMeshLayer> {
        self.layers.get(&group)
    }

    pub fn layers(&self) -> impl Iterator<Item = (GroupId, &NavMeshLayer)> {
        self.layers.iter().map(|(id, layer)| (*id, layer))
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total tiles across every layer
    pub fn tile_count(&self) -> usize {
        self.layers.values().map(NavMeshLayer::len).sum()
    }

    /// Cache of the build that produced this navmesh
    pub fn cache(&self) -> &Arc<NavMeshCache> {
        &self.cache
    }
}
