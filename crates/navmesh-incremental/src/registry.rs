//! Registered navigation sources
//!
//! The registry is mutated from the host's update loop while builds read a
//! snapshot of it, so entries are cheap to clone: the source and its geometry
//! are both shared by `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use navmesh_common::{Error, GeometryData, GeometryPool, Result, SourceId};

use crate::cache::{CacheEntry, NavMeshCache};
use crate::source::{parameter_hash, GeometryProvider, NavigationSource};

/// How an entry's geometry was obtained during a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Parameter hash matched the previous build, geometry shared
    Reused,
    /// Providers were asked for fresh geometry
    Extracted,
}

/// One registered source and the state of its last refresh
#[derive(Clone)]
pub struct ColliderEntry {
    id: SourceId,
    source: Arc<dyn NavigationSource>,
    parameter_hash: u32,
    geometry: Arc<GeometryData>,
    changed: bool,
    previous: Option<CacheEntry>,
}

impl std::fmt::Debug for ColliderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColliderEntry")
            .field("id", &self.id)
            .field("parameter_hash", &self.parameter_hash)
            .field("triangles", &self.geometry.triangle_count())
            .field("changed", &self.changed)
            .finish()
    }
}

impl ColliderEntry {
    /// New entry; it counts as changed until its first refresh
    pub fn new(id: SourceId, source: Arc<dyn NavigationSource>) -> Self {
        Self {
            id,
            source,
            parameter_hash: 0,
            geometry: Arc::new(GeometryData::new()),
            changed: true,
            previous: None,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn source(&self) -> &Arc<dyn NavigationSource> {
        &self.source
    }

    pub fn parameter_hash(&self) -> u32 {
        self.parameter_hash
    }

    pub fn geometry(&self) -> &Arc<GeometryData> {
        &self.geometry
    }

    /// True when the last refresh produced new geometry
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Cache entry of the same id from the build this refresh compared against
    pub fn previous(&self) -> Option<&CacheEntry> {
        self.previous.as_ref()
    }

    /// Recomputes the parameter hash and resolves geometry
    ///
    /// An entry is changed when the previous cache has no entry for its id or
    /// the hashes differ. Unchanged entries share the previous geometry and no
    /// provider is called. Provider errors are logged and contribute nothing.
    pub fn refresh(
        &mut self,
        previous: Option<&NavMeshCache>,
        providers: &[Arc<dyn GeometryProvider>],
        pool: &Arc<GeometryPool>,
    ) -> RefreshOutcome {
        self.parameter_hash = parameter_hash(self.source.as_ref());
        self.previous = previous.and_then(|cache| cache.get(self.id)).cloned();

        if let Some(prev) = &self.previous {
            if prev.parameter_hash == self.parameter_hash {
                self.geometry = Arc::clone(&prev.geometry);
                self.changed = false;
                return RefreshOutcome::Reused;
            }
        }

        let mut geometry = GeometryData::with_pool(Arc::clone(pool));
        for provider in providers {
            match provider.try_get_geometry(self.source.as_ref()) {
                Ok(Some(contribution)) => geometry.append_other(&contribution),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Source {}: geometry extraction failed: {}", self.id, e);
                }
            }
        }

        self.geometry = Arc::new(geometry);
        self.changed = true;
        RefreshOutcome::Extracted
    }

    /// The state a finished build stores in its cache
    pub fn to_cache_entry(&self) -> CacheEntry {
        CacheEntry::new(self.id, self.parameter_hash, Arc::clone(&self.geometry))
    }
}

/// Insertion-ordered set of registered sources, unique by id
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: Vec<ColliderEntry>,
    ids: HashSet<SourceId>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, failing without side effects if the id is taken
    pub fn register(&mut self, entry: ColliderEntry) -> Result<()> {
        if !self.ids.insert(entry.id) {
            return Err(Error::DuplicateRegistration(entry.id));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Removes and returns the entry with `id`
    pub fn unregister(&mut self, id: SourceId) -> Result<ColliderEntry> {
        if !self.ids.remove(&id) {
            return Err(Error::UnregisteredRemoval(id));
        }
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(Error::UnregisteredRemoval(id))?;
        Ok(self.entries.remove(index))
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: SourceId) -> Option<&ColliderEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Copy of every entry for an in-flight build
    pub fn snapshot(&self) -> Vec<ColliderEntry> {
        self.entries.clone()
    }

    /// Stores refreshed state back into entries that are still registered
    pub fn write_back(&mut self, refreshed: &[ColliderEntry]) {
        for update in refreshed {
            if let Some(entry) = self.entries.iter_mut().find(|entry| entry.id == update.id) {
                entry.parameter_hash = update.parameter_hash;
                entry.geometry = Arc::clone(&update.geometry);
                entry.changed = update.changed;
                entry.previous = update.previous.clone();
            }
        }
    }
}
