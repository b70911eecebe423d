//! Reference navigation sources built from simple shapes
//!
//! [`ShapeSource`] describes an oriented box or a triangle mesh placed in the
//! world by a transform. [`ShapeGeometryProvider`] tessellates it into
//! world-space triangles. Hosts with their own physics representation
//! implement [`GeometryProvider`] themselves.

use std::sync::{Arc, RwLock};

use glam::{Mat4, Vec3};
use navmesh_common::{Error, GeometryData, GeometryPool, Result, SourceId, Winding};
use serde::{Deserialize, Serialize};

use crate::hash::ParameterHasher;
use crate::source::{GeometryProvider, NavigationSource};

/// Triangles of a box, outward facing, right handed
///
/// Corner `i` sits at `(±x, ±y, ±z)` with bit 0 selecting x, bit 1 y, bit 2 z.
const BOX_TRIANGLES: [u32; 36] = [
    0, 2, 1, 1, 2, 3, // -Z
    4, 5, 6, 5, 7, 6, // +Z
    0, 4, 2, 2, 4, 6, // -X
    1, 3, 5, 3, 7, 5, // +X
    0, 1, 4, 1, 5, 4, // -Y
    2, 6, 3, 3, 6, 7, // +Y
];

/// Shape description of a [`ShapeSource`] in its local space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Box centered on the local origin
    Box { half_extents: Vec3 },
    /// Arbitrary triangles (groups of 3 indices)
    ///
    /// Only `mesh_id` and the array lengths feed the parameter hash. Hosts
    /// assign a new `mesh_id` whenever the vertex or index content changes.
    TriangleMesh {
        mesh_id: u64,
        vertices: Vec<Vec3>,
        indices: Vec<u32>,
        winding: Winding,
    },
}

impl Shape {
    /// Get the 8 local-space corners of a box
    fn box_corners(half_extents: Vec3) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { -half_extents.x } else { half_extents.x },
                if i & 2 == 0 { -half_extents.y } else { half_extents.y },
                if i & 4 == 0 { -half_extents.z } else { half_extents.z },
            )
        })
    }

    fn hash_into(&self, hasher: &mut ParameterHasher) {
        match self {
            Shape::Box { half_extents } => {
                hasher.write_u8(0);
                hasher.write_vec3(*half_extents);
            }
            Shape::TriangleMesh {
                mesh_id,
                vertices,
                indices,
                winding,
            } => {
                hasher.write_u8(1);
                hasher.write_u64(*mesh_id);
                hasher.write_usize(vertices.len());
                hasher.write_usize(indices.len());
                hasher.write_bool(*winding == Winding::LeftHanded);
            }
        }
    }
}

/// A movable static source with a fixed shape
#[derive(Debug)]
pub struct ShapeSource {
    id: SourceId,
    shape: Shape,
    transform: RwLock<Mat4>,
}

impl ShapeSource {
    pub fn new(id: SourceId, shape: Shape, transform: Mat4) -> Self {
        Self {
            id,
            shape,
            transform: RwLock::new(transform),
        }
    }

    /// Axis-aligned box from its world-space center and half extents
    pub fn axis_aligned_box(id: SourceId, center: Vec3, half_extents: Vec3) -> Self {
        Self::new(
            id,
            Shape::Box { half_extents },
            Mat4::from_translation(center),
        )
    }

    /// Create a box from minimum and maximum coordinates (axis-aligned)
    pub fn box_from_bounds(id: SourceId, min: Vec3, max: Vec3) -> Self {
        Self::axis_aligned_box(id, (min + max) * 0.5, (max - min) * 0.5)
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Moves the source; the next build sees a new parameter hash
    pub fn set_transform(&self, transform: Mat4) {
        match self.transform.write() {
            Ok(mut guard) => *guard = transform,
            Err(poisoned) => *poisoned.into_inner() = transform,
        }
    }
}

impl NavigationSource for ShapeSource {
    fn world_transform(&self) -> Mat4 {
        match self.transform.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn hash_shape(&self, hasher: &mut ParameterHasher) {
        self.shape.hash_into(hasher);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Tessellates [`ShapeSource`]s, ignoring every other source type
#[derive(Debug, Default, Clone)]
pub struct ShapeGeometryProvider {
    pool: Option<Arc<GeometryPool>>,
}

impl ShapeGeometryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates produced geometry from `pool`
    pub fn with_pool(pool: Arc<GeometryPool>) -> Self {
        Self { pool: Some(pool) }
    }

    fn new_buffer(&self) -> GeometryData {
        match &self.pool {
            Some(pool) => GeometryData::with_pool(Arc::clone(pool)),
            None => GeometryData::new(),
        }
    }
}

impl GeometryProvider for ShapeGeometryProvider {
    fn try_get_geometry(&self, source: &dyn NavigationSource) -> Result<Option<GeometryData>> {
        let Some(shape_source) = source.as_any().downcast_ref::<ShapeSource>() else {
            return Ok(None);
        };

        let transform = shape_source.world_transform();
        let mut geometry = self.new_buffer();

        match &shape_source.shape {
            Shape::Box { half_extents } => {
                if half_extents.cmplt(Vec3::ZERO).any() || !half_extents.is_finite() {
                    return Err(Error::UnsupportedSource(format!(
                        "box {} has invalid half extents {}",
                        shape_source.id, half_extents
                    )));
                }
                let corners = Shape::box_corners(*half_extents);
                geometry.append_arrays(
                    &corners,
                    &BOX_TRIANGLES,
                    Some(&transform),
                    Winding::RightHanded,
                )?;
            }
            Shape::TriangleMesh {
                vertices,
                indices,
                winding,
                ..
            } => {
                geometry.append_arrays(vertices, indices, Some(&transform), *winding)?;
            }
        }

        Ok(Some(geometry))
    }

    fn try_get_source_id(&self, source: &dyn NavigationSource) -> Option<SourceId> {
        source
            .as_any()
            .downcast_ref::<ShapeSource>()
            .map(ShapeSource::id)
    }
}
