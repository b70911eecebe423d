//! Common utilities and data structures shared by the incremental navmesh
//! builder and the path smoothing crate

mod bounds;
mod geometry;
mod ids;

pub use bounds::*;
pub use geometry::*;
pub use ids::*;

/// Represents a 3D position
pub type Vec3 = glam::Vec3;

/// Error types for the library
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("source {0} is already registered")]
    DuplicateRegistration(SourceId),

    #[error("source {0} is not registered")]
    UnregisteredRemoval(SourceId),

    #[error("unsupported navigation source: {0}")]
    UnsupportedSource(String),

    #[error("group {0} was supplied more than once")]
    DuplicateGroupId(GroupId),

    #[error("mesh backend failure: {0}")]
    Backend(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid build settings: {0}")]
    InvalidSettings(String),

    #[error("pathfinding failed: {0}")]
    Pathfinding(String),

    #[error("build task failed: {0}")]
    BuildTask(String),
}

/// Result type for navmesh operations
pub type Result<T> = std::result::Result<T, Error>;
