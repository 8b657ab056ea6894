// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;

const MAX_LEAF_SIZE: usize = 2;

#[derive(Clone)]
struct BVHNode {
    bounds: AABB,
    /// First primitive for leaves, left child for interior nodes.
    offset: usize,
    /// Zero for interior nodes.
    count: usize,
    right: usize,
    axis: usize,
}

impl BVHNode {
    fn is_leaf(&self) -> bool {
        self.count > 0
    }
}

/// Median split hierarchy over primitive bounds. Intersection itself is left to
/// the caller's closures.
pub struct BVH {
    nodes: Vec<BVHNode>,
    indices: Vec<usize>,
}

impl BVH {
    pub fn new(prim_bounds: &[AABB]) -> Self {
        let mut bvh = Self { nodes: Vec::new(), indices: (0..prim_bounds.len()).collect() };
        if !prim_bounds.is_empty() {
            bvh.build(prim_bounds, 0, prim_bounds.len());
        }
        bvh
    }

    pub fn bounds(&self) -> AABB {
        self.nodes.first().map_or_else(AABB::default, |node| node.bounds)
    }

    fn build(&mut self, prim_bounds: &[AABB], start: usize, end: usize) -> usize {
        let mut bounds = AABB::default();
        let mut centroid_bounds = AABB::default();
        for &idx in &self.indices[start..end] {
            bounds.expand_by_aabb(&prim_bounds[idx]);
            centroid_bounds.expand_by_point(&prim_bounds[idx].center());
        }

        let node_idx = self.nodes.len();
        let axis = centroid_bounds.max_extent();
        self.nodes.push(BVHNode { bounds, offset: start, count: end - start, right: 0, axis });

        let count = end - start;
        if count <= MAX_LEAF_SIZE || centroid_bounds.diagonal()[axis] <= 0.0 {
            return node_idx;
        }

        let mid = start + count / 2;
        self.indices[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            let ca = prim_bounds[a].center()[axis];
            let cb = prim_bounds[b].center()[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let left = self.build(prim_bounds, start, mid);
        let right = self.build(prim_bounds, mid, end);
        let node = &mut self.nodes[node_idx];
        node.offset = left;
        node.right = right;
        node.count = 0;
        node_idx
    }

    /// Nearest hit traversal. `hit_fn(prim, max_t)` returns the distance of a hit
    /// closer than `max_t`; subtrees beyond the closest hit are skipped.
    pub fn traverse<F>(&self, ray: &Ray3f, mut hit_fn: F) -> Option<Float>
    where
        F: FnMut(usize, Float) -> Option<Float>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let mut closest = ray.max_t;
        let mut found = false;
        let mut stack = Vec::with_capacity(64);
        stack.push(0usize);

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            match node.bounds.ray_intersect_range(ray) {
                Some((t_near, _)) if t_near <= closest => {}
                _ => continue,
            }

            if node.is_leaf() {
                for &prim in &self.indices[node.offset..node.offset + node.count] {
                    if let Some(t) = hit_fn(prim, closest) {
                        if t <= closest {
                            closest = t;
                            found = true;
                        }
                    }
                }
            } else if ray.dir()[node.axis] < 0.0 {
                // near child on top
                stack.push(node.offset);
                stack.push(node.right);
            } else {
                stack.push(node.right);
                stack.push(node.offset);
            }
        }

        if found { Some(closest) } else { None }
    }

    /// Any hit traversal for shadow rays.
    pub fn traverse_any<F>(&self, ray: &Ray3f, mut hit_fn: F) -> bool
    where
        F: FnMut(usize) -> bool,
    {
        if self.nodes.is_empty() {
            return false;
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(0usize);
        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if node.bounds.ray_intersect_range(ray).is_none() {
                continue;
            }
            if node.is_leaf() {
                if self.indices[node.offset..node.offset + node.count].iter().any(|&prim| hit_fn(prim)) {
                    return true;
                }
            } else {
                stack.push(node.offset);
                stack.push(node.right);
            }
        }
        false
    }
}
