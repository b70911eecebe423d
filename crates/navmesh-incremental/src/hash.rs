//! Parameter hashing
//!
//! Change detection never looks at tessellated geometry. Sources feed their
//! world transform and shape description into a [`ParameterHasher`] and the
//! 32-bit result is compared against the previous build.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

use glam::Mat4;

use crate::config::{BuildSettings, NavMeshGroup};

/// Multiplier used when folding several 32-bit hashes together
const COMBINE_PRIME: u32 = 397;

/// Hasher for the cheap fingerprint of a navigation source
///
/// Floats are hashed by bit pattern, so `0.0` and `-0.0` differ and any
/// movement of a source produces a new value.
pub struct ParameterHasher {
    inner: DefaultHasher,
}

impl Default for ParameterHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterHasher {
    pub fn new() -> Self {
        Self {
            inner: DefaultHasher::new(),
        }
    }

    pub fn write_f32(&mut self, value: f32) {
        self.inner.write_u32(value.to_bits());
    }

    pub fn write_vec3(&mut self, value: glam::Vec3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    pub fn write_mat4(&mut self, value: &Mat4) {
        for component in value.to_cols_array() {
            self.write_f32(component);
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.inner.write_u8(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.inner.write_u32(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.inner.write_i32(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.inner.write_u64(value);
    }

    pub fn write_usize(&mut self, value: usize) {
        self.inner.write_usize(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.inner.write_u8(value as u8);
    }

    /// Finishes the hash, folding it down to 32 bits
    pub fn finish(&self) -> u32 {
        let full = self.inner.finish();
        (full ^ (full >> 32)) as u32
    }
}

/// Folds `value` into an accumulated hash
#[inline]
pub fn combine(hash: u32, value: u32) -> u32 {
    hash.wrapping_mul(COMBINE_PRIME) ^ value
}

/// Hash of every group, order sensitive
pub fn groups_hash(groups: &[NavMeshGroup]) -> u32 {
    groups.iter().fold(0, |hash, group| {
        let mut hasher = ParameterHasher::new();
        hasher.write_u64(group.id.0);
        group.agent.hash_into(&mut hasher);
        combine(hash, hasher.finish())
    })
}

/// Hash of the build settings alone
pub fn build_settings_hash(settings: &BuildSettings) -> u32 {
    let mut hasher = ParameterHasher::new();
    settings.hash_into(&mut hasher);
    hasher.finish()
}

/// Hash identifying everything that makes two builds comparable
///
/// A change of this value invalidates all cached tiles.
pub fn settings_hash(settings: &BuildSettings, groups: &[NavMeshGroup]) -> u32 {
    combine(groups_hash(groups), build_settings_hash(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentSettings;
    use glam::Vec3;
    use navmesh_common::GroupId;

    fn hash_of(f: impl FnOnce(&mut ParameterHasher)) -> u32 {
        let mut hasher = ParameterHasher::new();
        f(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_hash_is_deterministic() {
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let a = hash_of(|h| h.write_mat4(&transform));
        let b = hash_of(|h| h.write_mat4(&transform));
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_changes_with_transform() {
        let a = hash_of(|h| h.write_mat4(&Mat4::from_translation(Vec3::X)));
        let b = hash_of(|h| h.write_mat4(&Mat4::from_translation(Vec3::X * 1.001)));
        assert_ne!(a, b);
    }

    #[test]
    fn test_settings_hash_tracks_groups_and_settings() {
        let settings = BuildSettings::default();
        let groups = [NavMeshGroup::new(GroupId(1), AgentSettings::default())];

        let base = settings_hash(&settings, &groups);
        assert_eq!(base, settings_hash(&settings.clone(), &groups));

        let wider_agent = [NavMeshGroup::new(
            GroupId(1),
            AgentSettings::new(2.0, 1.2, 0.9, 45.0),
        )];
        assert_ne!(base, settings_hash(&settings, &wider_agent));

        let finer = BuildSettings::new(0.1, 0.2, 32);
        assert_ne!(base, settings_hash(&finer, &groups));
    }
}
