//! Growable triangle geometry buffers
//!
//! [`GeometryData`] accumulates world-space triangles from many sources. Each
//! append offsets the incoming indices by the current point count and grows the
//! bounding box point by point, so merging never rescans existing data.
//! Storage can be borrowed from a shared [`GeometryPool`] and is handed back
//! when the buffer is dropped.

use crate::{BoundingBox, Error, Result};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Smallest capacity handed out when a buffer first grows
const MIN_CAPACITY: usize = 64;

/// Triangle winding of incoming index data
///
/// The mesh backend expects right-handed triangles. Left-handed input gets the
/// second and third index of every triangle swapped while it is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Winding {
    #[default]
    RightHanded,
    LeftHanded,
}

/// Shared free lists of point and index storage
#[derive(Debug)]
pub struct GeometryPool {
    points: Mutex<Vec<Vec<Vec3>>>,
    indices: Mutex<Vec<Vec<u32>>>,
    max_retained: usize,
}

impl Default for GeometryPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETAINED)
    }
}

impl GeometryPool {
    /// Number of vectors of each kind kept around by default
    pub const DEFAULT_MAX_RETAINED: usize = 64;

    pub fn new(max_retained: usize) -> Self {
        Self {
            points: Mutex::new(Vec::new()),
            indices: Mutex::new(Vec::new()),
            max_retained,
        }
    }

    /// Takes point storage with at least `capacity` slots
    pub fn acquire_points(&self, capacity: usize) -> Vec<Vec3> {
        take_fitting(&mut lock(&self.points), capacity)
    }

    /// Takes index storage with at least `capacity` slots
    pub fn acquire_indices(&self, capacity: usize) -> Vec<u32> {
        take_fitting(&mut lock(&self.indices), capacity)
    }

    /// Returns point storage to the pool
    pub fn release_points(&self, storage: Vec<Vec3>) {
        give_back(&mut lock(&self.points), storage, self.max_retained);
    }

    /// Returns index storage to the pool
    pub fn release_indices(&self, storage: Vec<u32>) {
        give_back(&mut lock(&self.indices), storage, self.max_retained);
    }

    /// Number of point vectors currently held by the pool
    pub fn retained_points(&self) -> usize {
        lock(&self.points).len()
    }

    /// Number of index vectors currently held by the pool
    pub fn retained_indices(&self) -> usize {
        lock(&self.indices).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // The free lists stay consistent even if a holder panicked
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn take_fitting<T>(free: &mut Vec<Vec<T>>, capacity: usize) -> Vec<T> {
    match free.iter().position(|storage| storage.capacity() >= capacity) {
        Some(index) => free.swap_remove(index),
        None => Vec::with_capacity(capacity),
    }
}

fn give_back<T>(free: &mut Vec<Vec<T>>, mut storage: Vec<T>, max_retained: usize) {
    if storage.capacity() == 0 || free.len() >= max_retained {
        return;
    }
    storage.clear();
    free.push(storage);
}

/// Triangle geometry with an incrementally maintained bounding box
///
/// Invariant: every index is smaller than the point count and the index count
/// is a multiple of three.
#[derive(Debug)]
pub struct GeometryData {
    points: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: BoundingBox,
    pool: Option<Arc<GeometryPool>>,
}

impl Default for GeometryData {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryData {
    /// Creates an empty buffer backed by the global allocator
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            indices: Vec::new(),
            bounds: BoundingBox::EMPTY,
            pool: None,
        }
    }

    /// Creates an empty buffer whose storage comes from `pool`
    pub fn with_pool(pool: Arc<GeometryPool>) -> Self {
        Self {
            points: Vec::new(),
            indices: Vec::new(),
            bounds: BoundingBox::EMPTY,
            pool: Some(pool),
        }
    }

    /// Creates a buffer holding a copy of `points`/`indices` without transform
    pub fn from_triangles(points: &[Vec3], indices: &[u32], winding: Winding) -> Result<Self> {
        let mut geometry = Self::new();
        geometry.append_arrays(points, indices, None, winding)?;
        Ok(geometry)
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Get triangles as triplets of vertices
    pub fn triangles(&self) -> impl Iterator<Item = (Vec3, Vec3, Vec3)> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            (
                self.points[tri[0] as usize],
                self.points[tri[1] as usize],
                self.points[tri[2] as usize],
            )
        })
    }

    /// Appends another buffer, offsetting its indices by the current point count
    pub fn append_other(&mut self, other: &GeometryData) {
        let base = self.points.len() as u32;
        self.reserve(other.points.len(), other.indices.len());

        self.points.extend_from_slice(&other.points);
        self.indices.extend(other.indices.iter().map(|index| index + base));
        self.bounds.merge(&other.bounds);
    }

    /// Appends raw triangle arrays
    ///
    /// Points are transformed by `transform` (when given) into the common
    /// space of the buffer. The input is validated before anything is
    /// written, so a rejected call leaves the buffer unchanged.
    pub fn append_arrays(
        &mut self,
        points: &[Vec3],
        indices: &[u32],
        transform: Option<&Mat4>,
        winding: Winding,
    ) -> Result<()> {
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidGeometry(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&index| index as usize >= points.len()) {
            return Err(Error::InvalidGeometry(format!(
                "index {} out of range for {} points",
                bad,
                points.len()
            )));
        }
        if self.points.len() + points.len() > u32::MAX as usize {
            return Err(Error::InvalidGeometry(
                "point count exceeds the 32-bit index range".to_string(),
            ));
        }

        let base = self.points.len() as u32;
        self.reserve(points.len(), indices.len());

        for &point in points {
            let point = match transform {
                Some(matrix) => matrix.transform_point3(point),
                None => point,
            };
            self.points.push(point);
            self.bounds.merge_point(point);
        }

        match winding {
            Winding::RightHanded => {
                self.indices.extend(indices.iter().map(|index| index + base));
            }
            Winding::LeftHanded => {
                for tri in indices.chunks_exact(3) {
                    self.indices
                        .extend_from_slice(&[tri[0] + base, tri[2] + base, tri[1] + base]);
                }
            }
        }

        Ok(())
    }

    /// Removes all content but keeps the storage
    pub fn clear(&mut self) {
        self.points.clear();
        self.indices.clear();
        self.bounds = BoundingBox::EMPTY;
    }

    /// Releases the storage back to the pool
    pub fn dispose(self) {
        drop(self);
    }

    fn reserve(&mut self, extra_points: usize, extra_indices: usize) {
        let pool = self.pool.clone();

        let required = self.points.len() + extra_points;
        if required > self.points.capacity() {
            let capacity = grown_capacity(self.points.capacity(), required);
            let mut grown = match &pool {
                Some(pool) => pool.acquire_points(capacity),
                None => Vec::with_capacity(capacity),
            };
            grown.extend_from_slice(&self.points);
            let old = std::mem::replace(&mut self.points, grown);
            if let Some(pool) = &pool {
                pool.release_points(old);
            }
        }

        let required = self.indices.len() + extra_indices;
        if required > self.indices.capacity() {
            let capacity = grown_capacity(self.indices.capacity(), required);
            let mut grown = match &pool {
                Some(pool) => pool.acquire_indices(capacity),
                None => Vec::with_capacity(capacity),
            };
            grown.extend_from_slice(&self.indices);
            let old = std::mem::replace(&mut self.indices, grown);
            if let Some(pool) = &pool {
                pool.release_indices(old);
            }
        }
    }
}

fn grown_capacity(current: usize, required: usize) -> usize {
    required.max(current * 2).max(MIN_CAPACITY)
}

impl Clone for GeometryData {
    fn clone(&self) -> Self {
        let mut copy = match &self.pool {
            Some(pool) => Self::with_pool(Arc::clone(pool)),
            None => Self::new(),
        };
        copy.append_other(self);
        copy
    }
}

impl PartialEq for GeometryData {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points && self.indices == other.indices
    }
}

impl Drop for GeometryData {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.release_points(std::mem::take(&mut self.points));
            pool.release_indices(std::mem::take(&mut self.indices));
        }
    }
}
