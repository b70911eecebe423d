//! Shared test helpers for the incremental builder
//!
//! `MockBackend` derives its payload from the triangles overlapping a tile,
//! so payloads change exactly when a tile's geometry changes.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use glam::Vec3;
use navmesh_common::{BoundingBox, Error, GeometryData, GeometryPool, Result, SourceId};

use crate::backend::{MeshBackend, TileBuildInput};
use crate::cache::NavMeshCache;
use crate::cancel::CancellationToken;
use crate::config::BuildSettings;
use crate::registry::ColliderEntry;
use crate::shapes::{ShapeGeometryProvider, ShapeSource};
use crate::source::{GeometryProvider, NavigationSource};
use crate::tiles::TileCoord;

/// Settings with 10 world units per tile
pub fn settings_10m() -> BuildSettings {
    BuildSettings::new(0.5, 0.2, 20)
}

pub fn shape_providers() -> Vec<Arc<dyn GeometryProvider>> {
    vec![Arc::new(ShapeGeometryProvider::new())]
}

pub fn box_source(id: u64, min: Vec3, max: Vec3) -> Arc<ShapeSource> {
    Arc::new(ShapeSource::box_from_bounds(SourceId(id), min, max))
}

/// Entries for `sources`, refreshed against `cache`
pub fn refreshed_entries(sources: Vec<ShapeSource>, cache: Option<&NavMeshCache>) -> Vec<ColliderEntry> {
    let pool = Arc::new(GeometryPool::default());
    let providers = shape_providers();
    sources
        .into_iter()
        .map(|source| {
            let mut entry = ColliderEntry::new(source.id(), Arc::new(source));
            entry.refresh(cache, &providers, &pool);
            entry
        })
        .collect()
}

/// Provider wrapper counting geometry extractions
pub struct CountingProvider<P> {
    inner: P,
    calls: AtomicUsize,
}

impl<P: GeometryProvider> CountingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<P: GeometryProvider> GeometryProvider for CountingProvider<P> {
    fn try_get_geometry(&self, source: &dyn NavigationSource) -> Result<Option<GeometryData>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.try_get_geometry(source)
    }

    fn try_get_source_id(&self, source: &dyn NavigationSource) -> Option<SourceId> {
        self.inner.try_get_source_id(source)
    }
}

/// Backend producing a payload from the triangles that overlap a tile
#[derive(Default)]
pub struct MockBackend {
    calls: AtomicUsize,
    built: Mutex<Vec<TileCoord>>,
    failing: HashSet<TileCoord>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a backend error for `coord`
    pub fn failing_at(mut self, coord: TileCoord) -> Self {
        self.failing.insert(coord);
        self
    }

    /// Cancels `token` once `calls` tiles have been built
    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Coordinates passed to the backend, sorted
    pub fn built_tiles(&self) -> Vec<TileCoord> {
        let mut built = self.built.lock().unwrap().clone();
        built.sort();
        built
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.built.lock().unwrap().clear();
    }
}

impl MeshBackend for MockBackend {
    fn build_tile(&self, input: &TileBuildInput<'_>) -> Result<Option<Vec<u8>>> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.built.lock().unwrap().push(input.coord);

        if let Some((limit, token)) = &self.cancel_after {
            if calls >= *limit {
                token.cancel();
            }
        }
        if self.failing.contains(&input.coord) {
            return Err(Error::Backend(format!("tile {} failed", input.coord)));
        }

        let mut payload = Vec::new();
        payload.extend_from_slice(&input.agent.radius.to_le_bytes());
        let mut triangles = 0;
        for (a, b, c) in input.geometry.triangles() {
            let triangle_bounds = BoundingBox::from_points(&[a, b, c]);
            if !triangle_bounds.overlaps_xz(&input.bounds) {
                continue;
            }
            triangles += 1;
            for vertex in [a, b, c] {
                for component in vertex.to_array() {
                    payload.extend_from_slice(&component.to_le_bytes());
                }
            }
        }

        Ok((triangles > 0).then_some(payload))
    }
}
