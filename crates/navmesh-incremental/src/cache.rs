//! Per-build cache of source geometry
//!
//! Every published [`NavMesh`](crate::NavMesh) carries the cache it was built
//! from. The next build compares parameter hashes against it to reuse
//! geometry, and compares region boxes against it to find new or dropped
//! coverage.

use std::collections::HashMap;
use std::sync::Arc;

use navmesh_common::{BoundingBox, GeometryData, SourceId};

/// Geometry of one source as used by a finished build
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub id: SourceId,
    pub parameter_hash: u32,
    pub geometry: Arc<GeometryData>,
}

impl CacheEntry {
    pub fn new(id: SourceId, parameter_hash: u32, geometry: Arc<GeometryData>) -> Self {
        Self {
            id,
            parameter_hash,
            geometry,
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        self.geometry.bounds()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NavMeshCache {
    settings_hash: u32,
    entries: HashMap<SourceId, CacheEntry>,
    regions: Vec<BoundingBox>,
}

impl NavMeshCache {
    pub fn new(settings_hash: u32) -> Self {
        Self {
            settings_hash,
            ..Default::default()
        }
    }

    pub fn settings_hash(&self) -> u32 {
        self.settings_hash
    }

    pub fn insert(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.id, entry);
    }

    pub fn get(&self, id: SourceId) -> Option<&CacheEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Region-of-interest boxes the build was run with
    pub fn regions(&self) -> &[BoundingBox] {
        &self.regions
    }

    pub fn set_regions(&mut self, regions: Vec<BoundingBox>) {
        self.regions = regions;
    }

    /// Exact match against the stored region boxes
    pub fn contains_region(&self, region: &BoundingBox) -> bool {
        self.regions.contains(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_insert_replaces_entry_with_same_id() {
        let mut cache = NavMeshCache::new(42);
        let geometry = Arc::new(GeometryData::new());

        cache.insert(CacheEntry::new(SourceId(1), 10, Arc::clone(&geometry)));
        cache.insert(CacheEntry::new(SourceId(1), 11, geometry));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(SourceId(1)).map(|e| e.parameter_hash), Some(11));
        assert_eq!(cache.settings_hash(), 42);
    }

    #[test]
    fn test_region_lookup_is_exact() {
        let mut cache = NavMeshCache::default();
        let region = BoundingBox::new(Vec3::ZERO, Vec3::splat(10.0));
        cache.set_regions(vec![region]);

        assert!(cache.contains_region(&region));
        assert!(!cache.contains_region(&region.expanded(Vec3::splat(0.1))));
    }
}
