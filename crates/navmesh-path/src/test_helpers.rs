//! Query helpers for path smoothing tests

use glam::Vec3;
use navmesh_common::{Error, Result};

use crate::{NavMeshQuery, PolyRef, StraightPathFlags, StraightPathPoint};

/// Straight strip of unit square polygons along +X
///
/// Polygon `i + 1` covers `x in [i, i + 1]`, `z in [0, 1]`. The surface rises
/// by 0.1 per unit of X.
pub struct StripQuery {
    polys: u64,
    extra_links: Vec<(PolyRef, PolyRef)>,
    disconnected: bool,
}

impl StripQuery {
    pub fn new(polys: u64) -> Self {
        Self {
            polys,
            extra_links: Vec::new(),
            disconnected: false,
        }
    }

    /// Adds a link between two polygons that are not adjacent in the strip
    pub fn with_extra_link(mut self, a: PolyRef, b: PolyRef) -> Self {
        self.extra_links.push((a, b));
        self
    }

    /// Makes every path search fail
    pub fn disconnected(mut self) -> Self {
        self.disconnected = true;
        self
    }

    pub fn height_at(&self, x: f32) -> f32 {
        0.1 * x
    }

    fn length(&self) -> f32 {
        self.polys as f32
    }

    fn poly_at(&self, x: f32) -> PolyRef {
        let index = (x.floor().max(0.0) as u64).min(self.polys - 1);
        PolyRef::new(index + 1)
    }

    fn check(&self, poly: PolyRef) -> Result<u64> {
        if poly.is_valid() && poly.id() <= self.polys {
            Ok(poly.id())
        } else {
            Err(Error::Pathfinding(format!("invalid polygon {:?}", poly)))
        }
    }

    fn clamp_to_poly(&self, id: u64, pos: Vec3) -> Vec3 {
        let min_x = (id - 1) as f32;
        let x = pos.x.clamp(min_x, min_x + 1.0);
        Vec3::new(x, self.height_at(x), pos.z.clamp(0.0, 1.0))
    }

    fn span(from: u64, to: u64) -> Vec<PolyRef> {
        if from <= to {
            (from..=to).map(PolyRef::new).collect()
        } else {
            (to..=from).rev().map(PolyRef::new).collect()
        }
    }
}

impl NavMeshQuery for StripQuery {
    fn find_nearest_poly(&self, center: Vec3, half_extents: Vec3) -> Result<Option<(PolyRef, Vec3)>> {
        let x = center.x.clamp(0.0, self.length());
        let z = center.z.clamp(0.0, 1.0);
        let nearest = Vec3::new(x, self.height_at(x), z);
        let offset = (nearest - center).abs();
        if offset.cmpgt(half_extents).any() {
            return Ok(None);
        }
        Ok(Some((self.poly_at(x), nearest)))
    }

    fn find_path(
        &self,
        start_ref: PolyRef,
        end_ref: PolyRef,
        _start_pos: Vec3,
        _end_pos: Vec3,
        max_path: usize,
    ) -> Result<Vec<PolyRef>> {
        let (start, end) = (self.check(start_ref)?, self.check(end_ref)?);
        if self.disconnected {
            return Ok(Vec::new());
        }
        let mut path = Self::span(start, end);
        path.truncate(max_path);
        Ok(path)
    }

    fn closest_point_on_poly(&self, poly: PolyRef, pos: Vec3) -> Result<Vec3> {
        let id = self.check(poly)?;
        Ok(self.clamp_to_poly(id, pos))
    }

    fn find_straight_path(
        &self,
        start_pos: Vec3,
        end_pos: Vec3,
        corridor: &[PolyRef],
        max_points: usize,
    ) -> Result<Vec<StraightPathPoint>> {
        let (Some(&first), Some(&last)) = (corridor.first(), corridor.last()) else {
            return Ok(Vec::new());
        };
        let end = self.clamp_to_poly(self.check(last)?, end_pos);

        let mut points = vec![
            StraightPathPoint {
                pos: start_pos,
                flags: StraightPathFlags::START,
                poly: first,
            },
            StraightPathPoint {
                pos: end,
                flags: StraightPathFlags::END,
                poly: last,
            },
        ];
        points.truncate(max_points);
        Ok(points)
    }

    fn move_along_surface(
        &self,
        start_ref: PolyRef,
        start_pos: Vec3,
        end_pos: Vec3,
    ) -> Result<(Vec3, Vec<PolyRef>)> {
        let start = self.check(start_ref)?;
        let reached = Vec3::new(
            end_pos.x.clamp(0.0, self.length()),
            start_pos.y,
            end_pos.z.clamp(0.0, 1.0),
        );
        let visited = Self::span(start, self.poly_at(reached.x).id());
        Ok((reached, visited))
    }

    fn get_poly_height(&self, poly: PolyRef, pos: Vec3) -> Result<Option<f32>> {
        let id = self.check(poly)?;
        let min_x = (id - 1) as f32;
        let inside = pos.x >= min_x - 1e-4 && pos.x <= min_x + 1.0 + 1e-4;
        Ok(inside.then(|| self.height_at(pos.x)))
    }

    fn poly_neighbours(&self, poly: PolyRef) -> Result<Vec<PolyRef>> {
        let id = self.check(poly)?;
        let mut neighbours = Vec::new();
        if id > 1 {
            neighbours.push(PolyRef::new(id - 1));
        }
        if id < self.polys {
            neighbours.push(PolyRef::new(id + 1));
        }
        for &(a, b) in &self.extra_links {
            if a == poly {
                neighbours.push(b);
            } else if b == poly {
                neighbours.push(a);
            }
        }
        Ok(neighbours)
    }
}
