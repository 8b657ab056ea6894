// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::shape::{Shape, ShapeHit, ShapeSample, SurfaceGeometry};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;

/// Parallelogram spanned by two orthogonal edges from `corner`.
/// The normal is `edge_u × edge_v`.
pub struct Rectangle {
    id: String,
    corner: Vector3f,
    edge_u: Vector3f,
    edge_v: Vector3f,
    normal: Vector3f,
    area: Float,
}

impl Rectangle {
    pub fn new(corner: Vector3f, edge_u: Vector3f, edge_v: Vector3f) -> Self {
        let cross = edge_u.cross(&edge_v);
        let area = cross.norm();
        let normal = if area > 0.0 { cross / area } else { Vector3f::new(0.0, 0.0, 1.0) };
        Self { id: generate_node_id("rectangle"), corner, edge_u, edge_v, normal, area }
    }

    pub fn normal(&self) -> Vector3f {
        self.normal
    }

    pub fn center(&self) -> Vector3f {
        self.corner + 0.5 * (self.edge_u + self.edge_v)
    }
}

impl ComputationNode for Rectangle {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Shape for Rectangle {
    fn bounding_box(&self) -> AABB {
        let mut bbox = AABB::default();
        for corner in [self.corner,
                       self.corner + self.edge_u,
                       self.corner + self.edge_v,
                       self.corner + self.edge_u + self.edge_v].iter() {
            bbox.expand_by_point(corner);
        }
        bbox
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<ShapeHit> {
        let denom = ray.dir().dot(&self.normal);
        if denom.abs() < 1.0e-8 {
            return None;
        }
        let distance = (self.corner - ray.origin()).dot(&self.normal) / denom;
        if !ray.test_segment(distance) {
            return None;
        }

        let local = ray.at(distance) - self.corner;
        let u = local.dot(&self.edge_u) / self.edge_u.norm_squared();
        let v = local.dot(&self.edge_v) / self.edge_v.norm_squared();
        if u < 0.0 || u > 1.0 || v < 0.0 || v > 1.0 {
            return None;
        }
        Some(ShapeHit { distance, uv: Vector2f::new(u, v) })
    }

    fn evaluate_intersection(&self, ray: &Ray3f, hit: &ShapeHit) -> SurfaceGeometry {
        SurfaceGeometry {
            position: ray.at(hit.distance),
            frame: Frame::from_normal_tangent(&self.normal, &self.edge_u),
            tex_coord: hit.uv,
        }
    }

    fn sample(&self, u: &Vector2f) -> ShapeSample {
        ShapeSample {
            position: self.corner + u.x * self.edge_u + u.y * self.edge_v,
            normal: self.normal,
            pdf_a: if self.area > 0.0 { 1.0 / self.area } else { 0.0 },
        }
    }

    fn surface_area(&self) -> Float {
        self.area
    }
}
