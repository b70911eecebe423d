//! Corridor-following path smoothing
//!
//! A coarse polygon corridor is walked in fixed steps along the mesh surface,
//! steering toward the next straight-path corner each step, which yields
//! points an agent can follow directly.

use glam::Vec3;
use navmesh_common::{Error, Result};

use crate::{NavMeshQuery, PathfindingSettings, PolyRef, StraightPathFlags, StraightPathPoint};

/// Distance moved per smoothing step
pub const STEP_SIZE: f32 = 0.5;
/// Corners closer than this are treated as reached
pub const SLOP: f32 = 0.01;

const MAX_STEER_POINTS: usize = 3;
const MAX_LOOK_AHEAD: usize = 6;
const MAX_NEIGHBOURS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    Success,
    /// An endpoint is off the mesh or no corridor connects them
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothPath {
    pub status: PathStatus,
    pub points: Vec<Vec3>,
}

impl SmoothPath {
    fn failure() -> Self {
        Self {
            status: PathStatus::Failure,
            points: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PathStatus::Success
    }
}

fn in_range(a: Vec3, b: Vec3, radius: f32, height: f32) -> bool {
    let d = b - a;
    (d.x * d.x + d.z * d.z) < radius * radius && d.y.abs() < height
}

/// Finds a smoothed path from `start` to `end`
///
/// A path capped by `max_smoothing` is still a success; only unresolvable
/// endpoints or an empty corridor produce `PathStatus::Failure`.
pub fn find_follow_path<Q: NavMeshQuery + ?Sized>(
    query: &Q,
    start: Vec3,
    end: Vec3,
    settings: &PathfindingSettings,
) -> Result<SmoothPath> {
    settings.validate().map_err(Error::InvalidSettings)?;

    let start_ref = query.find_nearest_poly(start, settings.search_extents)?;
    let end_ref = query.find_nearest_poly(end, settings.search_extents)?;
    let (start_ref, end_ref) = match (start_ref, end_ref) {
        (Some((s, _)), Some((e, _))) if s.is_valid() && e.is_valid() => (s, e),
        _ => {
            log::debug!("Path endpoints {} -> {} are not on the mesh", start, end);
            return Ok(SmoothPath::failure());
        }
    };

    let mut corridor = query.find_path(start_ref, end_ref, start, end, settings.max_corridor_polys)?;
    corridor.truncate(settings.max_corridor_polys);
    let Some(&last_poly) = corridor.last() else {
        log::debug!("No corridor between {:?} and {:?}", start_ref, end_ref);
        return Ok(SmoothPath::failure());
    };

    let mut iter_pos = query.closest_point_on_poly(start_ref, start)?;
    let target_pos = query.closest_point_on_poly(last_poly, end)?;

    let mut points = Vec::with_capacity(settings.max_smoothing);
    points.push(iter_pos);

    while !corridor.is_empty() && points.len() < settings.max_smoothing {
        let Some(steer) = get_steer_target(query, iter_pos, target_pos, SLOP, &corridor)? else {
            break;
        };

        let end_of_path = steer.flags.contains(StraightPathFlags::END);
        let off_mesh = steer.flags.contains(StraightPathFlags::OFFMESH_CONNECTION);
        let delta = steer.pos - iter_pos;
        let len = delta.length();
        // Never step past the end or an off-mesh link
        let arrive = (end_of_path || off_mesh) && len < STEP_SIZE;
        let scale = if arrive { 1.0 } else { STEP_SIZE / len };
        let move_target = iter_pos + delta * scale;

        let (result, visited) = query.move_along_surface(corridor[0], iter_pos, move_target)?;
        corridor = merge_corridor_start_moved(&corridor, &visited, settings.max_corridor_polys);
        fixup_shortcuts(&mut corridor, query);

        iter_pos = result;
        if let Some(&current) = corridor.first() {
            if let Some(height) = query.get_poly_height(current, result)? {
                iter_pos.y = height;
            }
        }
        points.push(iter_pos);

        if arrive && end_of_path {
            break;
        }
    }

    Ok(SmoothPath {
        status: PathStatus::Success,
        points,
    })
}

/// First straight-path corner farther than `min_target_dist` from `start`
///
/// Off-mesh connection starts are returned even when close. The returned
/// position keeps the height of `start`.
pub fn get_steer_target<Q: NavMeshQuery + ?Sized>(
    query: &Q,
    start: Vec3,
    end: Vec3,
    min_target_dist: f32,
    corridor: &[PolyRef],
) -> Result<Option<StraightPathPoint>> {
    let straight = query.find_straight_path(start, end, corridor, MAX_STEER_POINTS)?;

    let steer = straight.into_iter().take(MAX_STEER_POINTS).find(|point| {
        point.flags.contains(StraightPathFlags::OFFMESH_CONNECTION)
            || !in_range(point.pos, start, min_target_dist, 1000.0)
    });

    Ok(steer.map(|point| StraightPathPoint {
        pos: Vec3::new(point.pos.x, start.y, point.pos.z),
        ..point
    }))
}

/// Replaces the start of `path` with the polygons visited while moving
///
/// The furthest polygon shared by both is the splice point. Without a shared
/// polygon the path is returned unchanged.
pub fn merge_corridor_start_moved(
    path: &[PolyRef],
    visited: &[PolyRef],
    max_path: usize,
) -> Vec<PolyRef> {
    let furthest = path.iter().enumerate().rev().find_map(|(i, poly)| {
        visited
            .iter()
            .position(|v| v == poly)
            .map(|j| (i, j))
    });

    let Some((furthest_path, furthest_visited)) = furthest else {
        return path.to_vec();
    };

    visited[furthest_visited..]
        .iter()
        .rev()
        .chain(&path[furthest_path + 1..])
        .copied()
        .take(max_path)
        .collect()
}

/// Cuts small U-turns out of the corridor start
///
/// If a polygon a few steps ahead is adjacent to the first polygon, the
/// polygons in between are removed.
pub fn fixup_shortcuts<Q: NavMeshQuery + ?Sized>(path: &mut Vec<PolyRef>, query: &Q) {
    if path.len() < 3 {
        return;
    }

    let neighbours = match query.poly_neighbours(path[0]) {
        Ok(neighbours) => neighbours,
        Err(e) => {
            log::debug!("Skipping shortcut fixup: {}", e);
            return;
        }
    };
    let neighbours = &neighbours[..neighbours.len().min(MAX_NEIGHBOURS)];

    let look_ahead = path.len().min(MAX_LOOK_AHEAD);
    let cut = (2..look_ahead).rev().find(|&i| neighbours.contains(&path[i]));

    if let Some(cut) = cut {
        path.drain(1..cut);
    }
}
