//! Navigation sources and geometry providers
//!
//! The builder never inspects scene objects directly. A [`NavigationSource`]
//! exposes only what change detection needs, and a [`GeometryProvider`] turns a
//! source it understands into world-space triangles.

use glam::Mat4;
use navmesh_common::{GeometryData, Result, SourceId};

use crate::hash::ParameterHasher;

/// A static scene object that contributes walkable geometry
pub trait NavigationSource: std::any::Any + Send + Sync {
    /// Current world transform of the source
    fn world_transform(&self) -> Mat4;

    /// Feeds the shape description (not the tessellated geometry) into `hasher`
    fn hash_shape(&self, hasher: &mut ParameterHasher);

    /// Returns self as &dyn Any for downcasting
    /// This is needed because trait upcasting coercion is not yet stable
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Computes the 32-bit parameter hash of a source
pub fn parameter_hash(source: &dyn NavigationSource) -> u32 {
    let mut hasher = ParameterHasher::new();
    hasher.write_mat4(&source.world_transform());
    source.hash_shape(&mut hasher);
    hasher.finish()
}

/// Extracts triangle geometry from the sources it recognises
pub trait GeometryProvider: Send + Sync {
    /// Returns the world-space geometry of `source`
    ///
    /// `Ok(None)` means this provider does not handle the source. An error
    /// means the source is recognised but cannot be converted; the builder
    /// logs it and the source contributes nothing.
    fn try_get_geometry(&self, source: &dyn NavigationSource) -> Result<Option<GeometryData>>;

    /// Resolves the stable id used for registry bookkeeping
    fn try_get_source_id(&self, source: &dyn NavigationSource) -> Option<SourceId>;
}
