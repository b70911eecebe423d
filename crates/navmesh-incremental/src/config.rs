use navmesh_common::GroupId;
use serde::{Deserialize, Serialize};

use crate::hash::ParameterHasher;

/// Region partitioning algorithm used by the mesh backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PartitionType {
    #[default]
    Watershed,
    Monotone,
    Layers,
}

/// Agent profile a navmesh layer is generated for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    pub height: f32,
    pub radius: f32,
    pub max_climb: f32,
    /// Maximum walkable slope in degrees
    pub max_slope: f32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            height: 2.0,
            radius: 0.6,
            max_climb: 0.9,
            max_slope: 45.0,
        }
    }
}

impl AgentSettings {
    pub fn new(height: f32, radius: f32, max_climb: f32, max_slope: f32) -> Self {
        Self {
            height,
            radius,
            max_climb,
            max_slope,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.height.is_finite() && self.radius.is_finite() && self.max_climb.is_finite()) {
            return Err("Agent dimensions must be finite".to_string());
        }
        if self.height <= 0.0 {
            return Err("Agent height must be positive".to_string());
        }
        if self.radius < 0.0 {
            return Err("Agent radius cannot be negative".to_string());
        }
        if self.max_climb < 0.0 {
            return Err("Agent max climb cannot be negative".to_string());
        }
        if !(0.0..=90.0).contains(&self.max_slope) {
            return Err("Agent max slope must be between 0 and 90 degrees".to_string());
        }
        Ok(())
    }

    pub(crate) fn hash_into(&self, hasher: &mut ParameterHasher) {
        hasher.write_f32(self.height);
        hasher.write_f32(self.radius);
        hasher.write_f32(self.max_climb);
        hasher.write_f32(self.max_slope);
    }
}

/// One navmesh layer request: a group id and the agent it is built for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavMeshGroup {
    pub id: GroupId,
    pub agent: AgentSettings,
}

impl NavMeshGroup {
    pub fn new(id: GroupId, agent: AgentSettings) -> Self {
        Self { id, agent }
    }
}

/// Settings shared by every tile and layer of a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSettings {
    pub cell_size: f32,
    pub cell_height: f32,
    /// Agent used by backends that need a single default profile
    pub agent: AgentSettings,
    pub min_region_size: i32,
    pub merged_region_size: i32,
    pub edge_max_len: f32,
    pub edge_max_error: f32,
    pub verts_per_poly: i32,
    pub detail_sample_dist: f32,
    pub detail_sample_max_error: f32,
    /// Tile edge length in cells
    pub tile_size: i32,
    pub partition: PartitionType,
    pub filter_low_hanging_obstacles: bool,
    pub filter_ledge_spans: bool,
    pub filter_walkable_low_height_spans: bool,
}

impl BuildSettings {
    pub fn new(cell_size: f32, cell_height: f32, tile_size: i32) -> Self {
        BuildSettings {
            cell_size,
            cell_height,
            agent: AgentSettings::default(),
            min_region_size: 8,
            merged_region_size: 20,
            edge_max_len: 12.0,
            edge_max_error: 1.3,
            verts_per_poly: 6,
            detail_sample_dist: 6.0,
            detail_sample_max_error: 1.0,
            tile_size,
            partition: PartitionType::Watershed,
            filter_low_hanging_obstacles: true,
            filter_ledge_spans: true,
            filter_walkable_low_height_spans: true,
        }
    }

    /// World-space edge length of one tile
    #[inline]
    pub fn tile_world_size(&self) -> f32 {
        self.tile_size as f32 * self.cell_size
    }

    pub fn with_agent(mut self, agent: AgentSettings) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_region_sizes(mut self, min_region_size: i32, merged_region_size: i32) -> Self {
        self.min_region_size = min_region_size;
        self.merged_region_size = merged_region_size;
        self
    }

    pub fn with_edge_limits(mut self, edge_max_len: f32, edge_max_error: f32) -> Self {
        self.edge_max_len = edge_max_len;
        self.edge_max_error = edge_max_error;
        self
    }

    pub fn with_verts_per_poly(mut self, verts_per_poly: i32) -> Self {
        self.verts_per_poly = verts_per_poly;
        self
    }

    pub fn with_detail_sampling(mut self, distance: f32, max_error: f32) -> Self {
        self.detail_sample_dist = distance;
        self.detail_sample_max_error = max_error;
        self
    }

    pub fn with_partition(mut self, partition: PartitionType) -> Self {
        self.partition = partition;
        self
    }

    pub fn with_span_filters(
        mut self,
        low_hanging_obstacles: bool,
        ledge_spans: bool,
        walkable_low_height_spans: bool,
    ) -> Self {
        self.filter_low_hanging_obstacles = low_hanging_obstacles;
        self.filter_ledge_spans = ledge_spans;
        self.filter_walkable_low_height_spans = walkable_low_height_spans;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        let reals = [
            self.cell_size,
            self.cell_height,
            self.edge_max_len,
            self.edge_max_error,
            self.detail_sample_dist,
            self.detail_sample_max_error,
        ];
        if !reals.iter().all(|v| v.is_finite()) {
            return Err("Build settings must be finite".to_string());
        }
        if self.cell_size <= 0.0 {
            return Err("Cell size must be positive".to_string());
        }
        if self.cell_height <= 0.0 {
            return Err("Cell height must be positive".to_string());
        }
        if self.tile_size <= 0 {
            return Err("Tile size must be positive".to_string());
        }
        if !(3..=6).contains(&self.verts_per_poly) {
            return Err("Vertices per polygon must be between 3 and 6".to_string());
        }
        if self.min_region_size < 0 || self.merged_region_size < 0 {
            return Err("Region sizes cannot be negative".to_string());
        }
        if self.edge_max_len < 0.0 || self.edge_max_error < 0.0 {
            return Err("Edge limits cannot be negative".to_string());
        }
        if self.detail_sample_dist < 0.0 || self.detail_sample_max_error < 0.0 {
            return Err("Detail sampling parameters cannot be negative".to_string());
        }
        self.agent.validate()
    }

    pub(crate) fn hash_into(&self, hasher: &mut ParameterHasher) {
        hasher.write_f32(self.cell_size);
        hasher.write_f32(self.cell_height);
        self.agent.hash_into(hasher);
        hasher.write_i32(self.min_region_size);
        hasher.write_i32(self.merged_region_size);
        hasher.write_f32(self.edge_max_len);
        hasher.write_f32(self.edge_max_error);
        hasher.write_i32(self.verts_per_poly);
        hasher.write_f32(self.detail_sample_dist);
        hasher.write_f32(self.detail_sample_max_error);
        hasher.write_i32(self.tile_size);
        hasher.write_u8(self.partition as u8);
        hasher.write_bool(self.filter_low_hanging_obstacles);
        hasher.write_bool(self.filter_ledge_spans);
        hasher.write_bool(self.filter_walkable_low_height_spans);
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self::new(0.3, 0.2, 32)
    }
}
