//! Incremental navmesh builder
//!
//! A build snapshots the registry, refreshes every entry against the previous
//! navmesh's cache, concatenates the scene geometry once, and then rebuilds
//! only the dirty tiles of each requested group. Untouched tiles are carried
//! over from the previous navmesh by `Arc`.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use navmesh_common::{BoundingBox, Error, GeometryData, GeometryPool, GroupId, Result, SourceId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::backend::MeshBackend;
use crate::cache::NavMeshCache;
use crate::cancel::CancellationToken;
use crate::config::{AgentSettings, BuildSettings, NavMeshGroup};
use crate::dirty_tiles::DirtyTileTracker;
use crate::hash;
use crate::navmesh::{NavMesh, NavMeshTile};
use crate::registry::{ColliderEntry, RefreshOutcome, SourceRegistry};
use crate::source::{GeometryProvider, NavigationSource};
use crate::tile_builder::TileBuilder;
use crate::tiles::TileCoord;

/// Tiles that changed in one layer during a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerUpdateInfo {
    pub group_id: GroupId,
    /// Coordinates added, removed or given a different payload
    pub updated_tiles: Vec<TileCoord>,
}

/// Statistics about one build
#[derive(Debug, Clone, Default)]
pub struct BuildStatistics {
    /// Sources in the registry snapshot
    pub sources: usize,
    /// Sources whose geometry was re-extracted
    pub extracted_sources: usize,
    /// Sources that reused cached geometry
    pub reused_sources: usize,
    /// Dirty tiles across every layer
    pub dirty_tiles: usize,
    /// Tiles handed to the tile builder
    pub tiles_built: usize,
    /// Tiles reported as updated across every layer
    pub tiles_updated: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub success: bool,
    /// Set when the build observed its cancellation token
    pub cancelled: bool,
    /// New navmesh on success, the previous one (if any) after cancellation
    pub navmesh: Option<Arc<NavMesh>>,
    pub updated_layers: Vec<LayerUpdateInfo>,
    /// Layers of the previous navmesh whose group was not requested again
    pub removed_layers: Vec<LayerUpdateInfo>,
    pub statistics: BuildStatistics,
}

impl BuildResult {
    fn finished(navmesh: Arc<NavMesh>, statistics: BuildStatistics) -> Self {
        Self {
            success: true,
            cancelled: false,
            navmesh: Some(navmesh),
            updated_layers: Vec::new(),
            removed_layers: Vec::new(),
            statistics,
        }
    }

    fn cancelled(previous: Option<Arc<NavMesh>>, statistics: BuildStatistics) -> Self {
        Self {
            success: false,
            cancelled: true,
            navmesh: previous,
            updated_layers: Vec::new(),
            removed_layers: Vec::new(),
            statistics,
        }
    }
}

/// Where tile builds run
enum TileExecutor {
    /// Rayon's global pool
    Global,
    /// Dedicated bounded pool
    Pool(rayon::ThreadPool),
    Sequential,
}

/// Builds navmeshes incrementally from registered navigation sources
///
/// Registration may happen from any thread while a build runs; the build
/// works on a snapshot. Builds on the same instance are serialized.
pub struct IncrementalNavMeshBuilder {
    providers: Vec<Arc<dyn GeometryProvider>>,
    backend: Arc<dyn MeshBackend>,
    registry: Mutex<SourceRegistry>,
    current: Mutex<Option<Arc<NavMesh>>>,
    build_lock: Mutex<()>,
    geometry_pool: Arc<GeometryPool>,
    executor: TileExecutor,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn tile_differs(old: Option<&Arc<NavMeshTile>>, new: Option<&Arc<NavMeshTile>>) -> bool {
    match (old, new) {
        (None, None) => false,
        (Some(old), Some(new)) => !Arc::ptr_eq(old, new) && old.data != new.data,
        _ => true,
    }
}

impl IncrementalNavMeshBuilder {
    pub fn new(providers: Vec<Arc<dyn GeometryProvider>>, backend: Arc<dyn MeshBackend>) -> Self {
        Self {
            providers,
            backend,
            registry: Mutex::new(SourceRegistry::new()),
            current: Mutex::new(None),
            build_lock: Mutex::new(()),
            geometry_pool: Arc::new(GeometryPool::default()),
            executor: TileExecutor::Global,
        }
    }

    /// Starts from an existing navmesh instead of an empty one
    pub fn with_previous(self, navmesh: Arc<NavMesh>) -> Self {
        *lock(&self.current) = Some(navmesh);
        self
    }

    /// Shares geometry storage with other builders
    pub fn with_geometry_pool(mut self, pool: Arc<GeometryPool>) -> Self {
        self.geometry_pool = pool;
        self
    }

    /// Caps the number of tiles built at once
    ///
    /// `0` uses rayon's global pool and `1` builds on the calling thread. If a
    /// dedicated pool cannot be created the builder falls back to sequential
    /// builds.
    pub fn with_max_parallelism(mut self, threads: usize) -> Self {
        self.executor = match threads {
            0 => TileExecutor::Global,
            1 => TileExecutor::Sequential,
            n => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => TileExecutor::Pool(pool),
                Err(e) => {
                    log::warn!("Failed to create thread pool: {}, using single-threaded", e);
                    TileExecutor::Sequential
                }
            },
        };
        self
    }

    /// Registers a source entry
    pub fn add(&self, entry: ColliderEntry) -> Result<()> {
        lock(&self.registry).register(entry)
    }

    /// Unregisters the source with `id`
    pub fn remove(&self, id: SourceId) -> Result<()> {
        lock(&self.registry).unregister(id).map(|_| ())
    }

    /// Creates an entry for `source`, taking its id from the first provider
    /// that recognises it
    pub fn resolve_entry(&self, source: Arc<dyn NavigationSource>) -> Result<ColliderEntry> {
        let id = self
            .providers
            .iter()
            .find_map(|provider| provider.try_get_source_id(source.as_ref()))
            .ok_or_else(|| {
                Error::UnsupportedSource("no geometry provider recognises the source".to_string())
            })?;
        Ok(ColliderEntry::new(id, source))
    }

    /// Resolves and registers `source` in one step
    pub fn add_source(&self, source: Arc<dyn NavigationSource>) -> Result<SourceId> {
        let entry = self.resolve_entry(source)?;
        let id = entry.id();
        self.add(entry)?;
        Ok(id)
    }

    pub fn source_count(&self) -> usize {
        lock(&self.registry).len()
    }

    pub fn contains_source(&self, id: SourceId) -> bool {
        lock(&self.registry).contains(id)
    }

    /// Last successfully built navmesh
    pub fn current(&self) -> Option<Arc<NavMesh>> {
        lock(&self.current).clone()
    }

    pub fn geometry_pool(&self) -> &Arc<GeometryPool> {
        &self.geometry_pool
    }

    /// Builds a navmesh with one layer per group inside the region boxes
    ///
    /// Invalid settings and repeated group ids fail before any tile is built.
    /// A cancelled build is not an error: it returns the previous navmesh
    /// with `success == false` and leaves the builder untouched.
    pub fn build(
        &self,
        settings: &BuildSettings,
        groups: &[NavMeshGroup],
        regions: &[BoundingBox],
        cancel: &CancellationToken,
    ) -> Result<BuildResult> {
        let start_time = Instant::now();
        let mut stats = BuildStatistics::default();

        settings.validate().map_err(Error::InvalidSettings)?;
        let mut group_ids = HashSet::with_capacity(groups.len());
        for group in groups {
            group
                .agent
                .validate()
                .map_err(|e| Error::InvalidSettings(format!("{}: {}", group.id, e)))?;
            if !group_ids.insert(group.id) {
                log::error!("The same group can't be selected twice: {}", group.id);
                return Err(Error::DuplicateGroupId(group.id));
            }
        }

        let _build_guard = lock(&self.build_lock);
        log::info!("Navigation mesh build started");

        if groups.is_empty() {
            log::warn!("No groups to build");
            stats.elapsed = start_time.elapsed();
            return Ok(BuildResult::finished(Arc::new(NavMesh::empty(settings)), stats));
        }
        if regions.is_empty() {
            log::warn!("No region boxes supplied, every tile will be empty");
        }

        let published = self.current();
        let settings_hash = hash::settings_hash(settings, groups);
        let base = match &published {
            Some(previous) if previous.cache().settings_hash() != settings_hash => {
                log::info!("Build settings changed, doing a full rebuild");
                None
            }
            other => other.clone(),
        };
        let full_rebuild = base.is_none();
        let base_cache: Option<&NavMeshCache> = base.as_ref().map(|navmesh| navmesh.cache().as_ref());

        let mut entries = lock(&self.registry).snapshot();
        stats.sources = entries.len();
        log::debug!("Copied {} sources in {:?}", entries.len(), start_time.elapsed());

        let refresh_start = Instant::now();
        for entry in &mut entries {
            match entry.refresh(base_cache, &self.providers, &self.geometry_pool) {
                RefreshOutcome::Reused => stats.reused_sources += 1,
                RefreshOutcome::Extracted => stats.extracted_sources += 1,
            }
        }
        lock(&self.registry).write_back(&entries);
        log::debug!(
            "Refreshed sources in {:?} ({} extracted, {} reused)",
            refresh_start.elapsed(),
            stats.extracted_sources,
            stats.reused_sources
        );

        let combine_start = Instant::now();
        let mut scene = GeometryData::with_pool(Arc::clone(&self.geometry_pool));
        let mut cache = NavMeshCache::new(settings_hash);
        for entry in &entries {
            scene.append_other(entry.geometry());
            cache.insert(entry.to_cache_entry());
        }
        log::debug!(
            "Combined {} triangles and populated cache in {:?}",
            scene.triangle_count(),
            combine_start.elapsed()
        );

        let tracker = DirtyTileTracker::new(settings, base_cache, regions);
        let tile_builder = TileBuilder::new(settings, regions, self.backend.as_ref(), &scene);
        let mut layers = BTreeMap::new();
        let mut updated_layers = Vec::new();

        for group in groups {
            let layer_start = Instant::now();
            if cancel.is_cancelled() {
                return Ok(self.abort(published, stats, start_time));
            }

            let dirty = tracker.dirty_tiles(&entries, group.agent.radius);
            stats.dirty_tiles += dirty.len();
            let coords: Vec<TileCoord> = dirty.iter().copied().collect();
            let built = self.build_tiles(&tile_builder, &coords, &group.agent, cancel);

            if cancel.is_cancelled() {
                return Ok(self.abort(published, stats, start_time));
            }
            stats.tiles_built += built.len();

            let previous_layer = published.as_ref().and_then(|navmesh| navmesh.layer(group.id));
            let mut layer = base
                .as_ref()
                .and_then(|navmesh| navmesh.layer(group.id))
                .cloned()
                .unwrap_or_default();

            for (coord, tile) in built {
                match tile {
                    Some(tile) => {
                        let unchanged = previous_layer
                            .and_then(|previous| previous.tile(coord))
                            .filter(|existing| existing.data == tile.data);
                        match unchanged {
                            Some(existing) => layer.insert(Arc::clone(existing)),
                            None => layer.insert(Arc::new(tile)),
                        }
                    }
                    None => {
                        layer.remove(coord);
                    }
                }
            }

            let mut candidates = dirty;
            if full_rebuild {
                if let Some(previous) = previous_layer {
                    candidates.extend(previous.coords());
                }
            }
            let updated_tiles: Vec<TileCoord> = candidates
                .into_iter()
                .filter(|&coord| {
                    tile_differs(previous_layer.and_then(|l| l.tile(coord)), layer.tile(coord))
                })
                .collect();

            log::debug!(
                "Layer {}: built {} tiles, {} updated in {:?}",
                group.id,
                coords.len(),
                updated_tiles.len(),
                layer_start.elapsed()
            );

            if !updated_tiles.is_empty() {
                stats.tiles_updated += updated_tiles.len();
                updated_layers.push(LayerUpdateInfo {
                    group_id: group.id,
                    updated_tiles,
                });
            }
            layers.insert(group.id, layer);
        }

        let mut removed_layers = Vec::new();
        if let Some(previous) = &published {
            for (group_id, layer) in previous.layers() {
                if !group_ids.contains(&group_id) {
                    removed_layers.push(LayerUpdateInfo {
                        group_id,
                        updated_tiles: layer.coords().collect(),
                    });
                }
            }
        }

        cache.set_regions(regions.to_vec());
        let navmesh = Arc::new(NavMesh::new(settings, layers, Arc::new(cache)));
        *lock(&self.current) = Some(Arc::clone(&navmesh));

        stats.elapsed = start_time.elapsed();
        log::info!(
            "Navigation mesh build completed successfully in {:?}: {} layers, {} tiles, {} updated",
            stats.elapsed,
            navmesh.layer_count(),
            navmesh.tile_count(),
            stats.tiles_updated
        );

        let mut result = BuildResult::finished(navmesh, stats);
        result.updated_layers = updated_layers;
        result.removed_layers = removed_layers;
        Ok(result)
    }

    fn abort(
        &self,
        previous: Option<Arc<NavMesh>>,
        mut stats: BuildStatistics,
        start_time: Instant,
    ) -> BuildResult {
        stats.elapsed = start_time.elapsed();
        log::info!("Navigation mesh build cancelled after {:?}", stats.elapsed);
        BuildResult::cancelled(previous, stats)
    }

    /// Builds `coords`, skipping every tile that starts after cancellation
    fn build_tiles(
        &self,
        builder: &TileBuilder<'_>,
        coords: &[TileCoord],
        agent: &AgentSettings,
        cancel: &CancellationToken,
    ) -> Vec<(TileCoord, Option<NavMeshTile>)> {
        let build_one = |coord: &TileCoord| {
            if cancel.is_cancelled() {
                return None;
            }
            Some((*coord, builder.build(*coord, agent)))
        };

        match &self.executor {
            TileExecutor::Sequential => coords.iter().map_while(build_one).collect(),
            TileExecutor::Global => coords.par_iter().filter_map(build_one).collect(),
            TileExecutor::Pool(pool) => {
                pool.install(|| coords.par_iter().filter_map(build_one).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{shape_providers, MockBackend};

    #[test]
    fn test_builder_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IncrementalNavMeshBuilder>();
    }

    #[test]
    fn test_tile_differs() {
        let a = Arc::new(NavMeshTile::new(TileCoord::new(0, 0), vec![1]));
        let same_bytes = Arc::new(NavMeshTile::new(TileCoord::new(0, 0), vec![1]));
        let other = Arc::new(NavMeshTile::new(TileCoord::new(0, 0), vec![2]));

        assert!(!tile_differs(None, None));
        assert!(!tile_differs(Some(&a), Some(&a)));
        assert!(!tile_differs(Some(&a), Some(&same_bytes)));
        assert!(tile_differs(Some(&a), Some(&other)));
        assert!(tile_differs(None, Some(&a)));
        assert!(tile_differs(Some(&a), None));
    }

    #[test]
    fn test_resolve_entry_requires_a_provider() {
        let builder = IncrementalNavMeshBuilder::new(Vec::new(), Arc::new(MockBackend::new()));
        let source = Arc::new(crate::shapes::ShapeSource::axis_aligned_box(
            SourceId(1),
            glam::Vec3::ZERO,
            glam::Vec3::ONE,
        ));

        assert!(matches!(
            builder.resolve_entry(source.clone()),
            Err(Error::UnsupportedSource(_))
        ));

        let builder = IncrementalNavMeshBuilder::new(shape_providers(), Arc::new(MockBackend::new()));
        assert_eq!(builder.add_source(source.clone()).unwrap(), SourceId(1));
        assert_eq!(
            builder.add_source(source).unwrap_err(),
            Error::DuplicateRegistration(SourceId(1))
        );
        assert_eq!(builder.source_count(), 1);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let builder = IncrementalNavMeshBuilder::new(shape_providers(), Arc::new(MockBackend::new()));
        let result = builder.build(
            &BuildSettings::new(-1.0, 0.2, 32),
            &[],
            &[],
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(Error::InvalidSettings(_))));
    }
}
