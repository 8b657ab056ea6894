// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};

pub trait GridPoint {
    fn position(&self) -> Vector3f;
}

/// Uniform hash grid with cells twice the query radius, so every query
/// touches at most eight cells.
pub struct HashGrid {
    bounds: AABB,
    cell_ends: Vec<usize>,
    indices: Vec<usize>,
    radius_sqr: Float,
    inv_cell_size: Float,
}

impl HashGrid {
    pub fn new() -> Self {
        Self {
            bounds: AABB::default(),
            cell_ends: Vec::new(),
            indices: Vec::new(),
            radius_sqr: 0.0,
            inv_cell_size: 0.0,
        }
    }

    pub fn radius(&self) -> Float {
        self.radius_sqr.sqrt()
    }

    pub fn build<P: GridPoint>(&mut self, points: &[P], radius: Float) {
        debug_assert!(radius > 0.0);
        self.radius_sqr = radius * radius;
        self.inv_cell_size = 1.0 / (2.0 * radius);

        self.bounds = AABB::default();
        for point in points {
            self.bounds.expand_by_point(&point.position());
        }

        let num_cells = points.len().max(1);
        self.cell_ends.clear();
        self.cell_ends.resize(num_cells, 0);
        for point in points {
            let cell = self.cell_index_of(&point.position());
            self.cell_ends[cell] += 1;
        }

        // exclusive prefix sum, shifted to cell ends after the scatter below
        let mut sum = 0;
        for end in self.cell_ends.iter_mut() {
            let count = *end;
            *end = sum;
            sum += count;
        }

        self.indices.clear();
        self.indices.resize(points.len(), 0);
        for (idx, point) in points.iter().enumerate() {
            let cell = self.cell_index_of(&point.position());
            let slot = self.cell_ends[cell];
            self.cell_ends[cell] += 1;
            self.indices[slot] = idx;
        }
    }

    /// Calls `visit` for every point within the radius of `query`.
    pub fn process<P: GridPoint, F: FnMut(&P)>(&self, points: &[P], query: &Vector3f, mut visit: F) {
        if self.indices.is_empty() {
            return;
        }
        let dist_min = query - self.bounds.p_min;
        let dist_max = self.bounds.p_max - query;
        for axis in 0..3 {
            if dist_min[axis] < -self.radius() || dist_max[axis] < -self.radius() {
                return;
            }
        }

        let cell_pt = dist_min * self.inv_cell_size;
        let coord = Vector3f::new(cell_pt.x.floor(), cell_pt.y.floor(), cell_pt.z.floor());
        let base = [coord.x as i64, coord.y as i64, coord.z as i64];
        let mut other = [0i64; 3];
        for axis in 0..3 {
            let fract = cell_pt[axis] - coord[axis];
            other[axis] = if fract < 0.5 { base[axis] - 1 } else { base[axis] + 1 };
        }

        let mut visited = [usize::MAX; 8];
        for corner in 0..8 {
            let x = if corner & 1 == 0 { base[0] } else { other[0] };
            let y = if corner & 2 == 0 { base[1] } else { other[1] };
            let z = if corner & 4 == 0 { base[2] } else { other[2] };
            let cell = self.cell_index(x, y, z);
            // distinct coordinates may hash to the same cell
            if visited[..corner].contains(&cell) {
                continue;
            }
            visited[corner] = cell;

            let (start, end) = self.cell_range(cell);
            for &idx in &self.indices[start..end] {
                let point = &points[idx];
                if (point.position() - query).norm_squared() <= self.radius_sqr {
                    visit(point);
                }
            }
        }
    }

    fn cell_range(&self, cell: usize) -> (usize, usize) {
        let start = if cell == 0 { 0 } else { self.cell_ends[cell - 1] };
        (start, self.cell_ends[cell])
    }

    fn cell_index(&self, x: i64, y: i64, z: i64) -> usize {
        let hash = (x as u64).wrapping_mul(73856093)
            ^ (y as u64).wrapping_mul(19349663)
            ^ (z as u64).wrapping_mul(83492791);
        (hash % self.cell_ends.len() as u64) as usize
    }

    fn cell_index_of(&self, p: &Vector3f) -> usize {
        let cell_pt = (p - self.bounds.p_min) * self.inv_cell_size;
        self.cell_index(cell_pt.x.floor() as i64, cell_pt.y.floor() as i64, cell_pt.z.floor() as i64)
    }
}

impl Default for HashGrid {
    fn default() -> Self {
        Self::new()
    }
}
