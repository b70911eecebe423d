//! Dirty tile computation
//!
//! Decides which tiles of one layer must be rebuilt by comparing refreshed
//! registry entries and region boxes against the previous build's cache.

use std::collections::{BTreeSet, HashSet};

use glam::Vec3;
use navmesh_common::{BoundingBox, SourceId};

use crate::cache::NavMeshCache;
use crate::config::BuildSettings;
use crate::registry::ColliderEntry;
use crate::tiles::{overlapping_tiles, TileCoord};

pub struct DirtyTileTracker<'a> {
    settings: &'a BuildSettings,
    previous: Option<&'a NavMeshCache>,
    regions: &'a [BoundingBox],
}

impl<'a> DirtyTileTracker<'a> {
    pub fn new(
        settings: &'a BuildSettings,
        previous: Option<&'a NavMeshCache>,
        regions: &'a [BoundingBox],
    ) -> Self {
        Self {
            settings,
            previous,
            regions,
        }
    }

    /// Tiles to rebuild for a layer whose agent has `agent_radius`
    pub fn dirty_tiles(&self, entries: &[ColliderEntry], agent_radius: f32) -> BTreeSet<TileCoord> {
        let mut dirty = BTreeSet::new();
        let padding = Vec3::splat(agent_radius);

        for entry in entries.iter().filter(|entry| entry.changed()) {
            self.mark_geometry(&mut dirty, &entry.geometry().bounds(), padding);
            if let Some(previous) = entry.previous() {
                self.mark_geometry(&mut dirty, &previous.bounds(), padding);
            }
        }

        if let Some(cache) = self.previous {
            let current: HashSet<SourceId> = entries.iter().map(ColliderEntry::id).collect();
            for removed in cache.entries().filter(|e| !current.contains(&e.id)) {
                log::debug!("Source {} was removed", removed.id);
                self.mark_geometry(&mut dirty, &removed.bounds(), padding);
            }
        }

        for region in self.regions {
            let known = self.previous.is_some_and(|cache| cache.contains_region(region));
            if !known {
                self.mark_region(&mut dirty, region);
            }
        }

        if let Some(cache) = self.previous {
            for region in cache.regions() {
                if !self.regions.contains(region) {
                    self.mark_region(&mut dirty, region);
                }
            }
        }

        dirty
    }

    fn mark_geometry(&self, dirty: &mut BTreeSet<TileCoord>, bounds: &BoundingBox, padding: Vec3) {
        let expanded = bounds.expanded(padding);
        log::debug!("Marking tiles for bounding box: {:?}", expanded);
        for tile in overlapping_tiles(self.settings, &expanded) {
            dirty.insert(tile);
        }
    }

    fn mark_region(&self, dirty: &mut BTreeSet<TileCoord>, region: &BoundingBox) {
        dirty.extend(overlapping_tiles(self.settings, region));
    }
}
