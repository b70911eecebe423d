//! Incremental Tiled Navigation Mesh Building
//!
//! This crate keeps a registry of navigation sources and turns them into a
//! tiled navigation mesh, rebuilding only the tiles whose contributing
//! geometry changed since the previous build.

// Allow unused code in tests - helpers are shared across test modules
#![cfg_attr(test, allow(unused))]
//!
//! # Features
//!
//! - **Source Registry**: Register and remove sources from any thread
//! - **Geometry Cache**: Sources whose parameters did not change reuse their geometry
//! - **Dirty Tile Tracking**: Only tiles touched by changed sources are rebuilt
//! - **Layers**: One layer per navmesh group, each with its own agent
//! - **Parallel Tile Builds**: Tiles are built on a rayon pool
//! - **Cancellation**: Builds stop between tiles and keep the previous navmesh
//! - **Async Service**: Rebuilds on tokio's blocking pool with watch notifications
//!
//! # Example
//!
//! ```rust,no_run
//! use navmesh_incremental::{
//!     BoundingBox, BuildSettings, CancellationToken, GroupId, IncrementalNavMeshBuilder,
//!     MeshBackend, NavMeshGroup, ShapeGeometryProvider, ShapeSource, SourceId, TileBuildInput,
//! };
//! use glam::Vec3;
//! use std::sync::Arc;
//!
//! struct Backend;
//!
//! impl MeshBackend for Backend {
//!     fn build_tile(&self, input: &TileBuildInput<'_>) -> navmesh_incremental::Result<Option<Vec<u8>>> {
//!         Ok((!input.geometry.is_empty()).then(|| vec![0u8; 4]))
//!     }
//! }
//!
//! # fn example() -> navmesh_incremental::Result<()> {
//! let builder = IncrementalNavMeshBuilder::new(
//!     vec![Arc::new(ShapeGeometryProvider::new())],
//!     Arc::new(Backend),
//! );
//!
//! builder.add_source(Arc::new(ShapeSource::axis_aligned_box(
//!     SourceId(1),
//!     Vec3::new(0.0, 0.5, 0.0),
//!     Vec3::new(5.0, 0.5, 5.0),
//! )))?;
//!
//! let result = builder.build(
//!     &BuildSettings::default(),
//!     &[NavMeshGroup::new(GroupId(0), Default::default())],
//!     &[BoundingBox::new(Vec3::splat(-50.0), Vec3::splat(50.0))],
//!     &CancellationToken::new(),
//! )?;
//! assert!(result.success);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod builder;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod dirty_tiles;
pub mod hash;
pub mod navmesh;
pub mod registry;
pub mod service;
pub mod shapes;
pub mod source;
pub mod tile_builder;
pub mod tiles;

#[cfg(test)]
mod test_helpers;

pub use backend::{MeshBackend, TileBuildInput};
pub use builder::{BuildResult, BuildStatistics, IncrementalNavMeshBuilder, LayerUpdateInfo};
pub use cache::{CacheEntry, NavMeshCache};
pub use cancel::CancellationToken;
pub use config::{AgentSettings, BuildSettings, NavMeshGroup, PartitionType};
pub use dirty_tiles::DirtyTileTracker;
pub use hash::ParameterHasher;
pub use navmesh::{NavMesh, NavMeshLayer, NavMeshTile};
pub use registry::{ColliderEntry, RefreshOutcome, SourceRegistry};
pub use service::NavMeshBuildService;
pub use shapes::{Shape, ShapeGeometryProvider, ShapeSource};
pub use source::{parameter_hash, GeometryProvider, NavigationSource};
pub use tile_builder::{tile_build_bounds, TileBuilder};
pub use tiles::{overlapping_tiles, tile_bounds, TileCoord};

pub use navmesh_common::{BoundingBox, Error, GeometryData, GeometryPool, GroupId, Result, SourceId, Winding};
