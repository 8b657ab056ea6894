// Copyright @yucwang 2023

use crate::core::computation_node::ComputationNode;
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;

/// Distance and surface coordinates of a ray hit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShapeHit {
    pub distance: Float,
    pub uv: Vector2f,
}

/// Differential geometry at a hit. `frame.z` is the outward normal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SurfaceGeometry {
    pub position: Vector3f,
    pub frame: Frame,
    pub tex_coord: Vector2f,
}

/// Point sampled uniformly by area.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShapeSample {
    pub position: Vector3f,
    pub normal: Vector3f,
    pub pdf_a: Float,
}

pub trait Shape: ComputationNode + Send + Sync {
    fn bounding_box(&self) -> AABB;

    /// Nearest hit inside the ray segment.
    fn ray_intersection(&self, ray: &Ray3f) -> Option<ShapeHit>;

    fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        self.ray_intersection(ray).is_some()
    }

    fn evaluate_intersection(&self, ray: &Ray3f, hit: &ShapeHit) -> SurfaceGeometry;

    fn sample(&self, u: &Vector2f) -> ShapeSample;

    fn surface_area(&self) -> Float;

    /// Whether `p` lies inside the closed volume, if the shape bounds one.
    fn contains(&self, _p: &Vector3f) -> bool {
        false
    }
}
