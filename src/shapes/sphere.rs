// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::shape::{Shape, ShapeHit, ShapeSample, SurfaceGeometry};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, INV_PI, INV_TWO_PI, PI};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;
use crate::math::warp::sample_uniform_sphere;

pub struct Sphere {
    id: String,
    center: Vector3f,
    radius: Float,
}

impl Sphere {
    pub fn new(center: Vector3f, radius: Float) -> Self {
        debug_assert!(radius > 0.0);
        Self { id: generate_node_id("sphere"), center, radius }
    }

    pub fn center(&self) -> Vector3f {
        self.center
    }

    pub fn radius(&self) -> Float {
        self.radius
    }

    fn solve(&self, ray: &Ray3f) -> Option<(Float, Float)> {
        let oc = ray.origin() - self.center;
        let b = oc.dot(&ray.dir());
        let c = oc.norm_squared() - self.radius * self.radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        Some((-b - root, -b + root))
    }

    fn uv_of(&self, n: &Vector3f) -> Vector2f {
        let phi = n.y.atan2(n.x);
        let phi = if phi < 0.0 { phi + 2.0 * PI } else { phi };
        let theta = n.z.max(-1.0).min(1.0).acos();
        Vector2f::new(phi * INV_TWO_PI, theta * INV_PI)
    }
}

impl ComputationNode for Sphere {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("Sphere [id={}, center={:?}, radius={}]", self.id, self.center.as_slice(), self.radius)
    }
}

impl Shape for Sphere {
    fn bounding_box(&self) -> AABB {
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        AABB::new(self.center - r, self.center + r)
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<ShapeHit> {
        let (t0, t1) = self.solve(ray)?;
        let distance = if ray.test_segment(t0) {
            t0
        } else if ray.test_segment(t1) {
            t1
        } else {
            return None;
        };
        let n = (ray.at(distance) - self.center) / self.radius;
        Some(ShapeHit { distance, uv: self.uv_of(&n) })
    }

    fn evaluate_intersection(&self, ray: &Ray3f, hit: &ShapeHit) -> SurfaceGeometry {
        let position = ray.at(hit.distance);
        let normal = (position - self.center).normalize();
        let tangent = Vector3f::new(-normal.y, normal.x, 0.0);
        SurfaceGeometry {
            position,
            frame: Frame::from_normal_tangent(&normal, &tangent),
            tex_coord: hit.uv,
        }
    }

    fn sample(&self, u: &Vector2f) -> ShapeSample {
        let normal = sample_uniform_sphere(u);
        ShapeSample {
            position: self.center + normal * self.radius,
            normal,
            pdf_a: 1.0 / self.surface_area(),
        }
    }

    fn surface_area(&self) -> Float {
        4.0 * PI * self.radius * self.radius
    }

    fn contains(&self, p: &Vector3f) -> bool {
        (p - self.center).norm_squared() < self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_from_outside_and_inside() {
        let sphere = Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = sphere.ray_intersection(&ray).unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-5);
        let geometry = sphere.evaluate_intersection(&ray, &hit);
        assert!((geometry.frame.z.z + 1.0).abs() < 1e-5);

        let inner = Ray3f::new(Vector3f::new(0.0, 0.0, 5.0), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let hit = sphere.ray_intersection(&inner).unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-5);
        assert!(sphere.contains(&Vector3f::new(0.0, 0.2, 5.0)));
    }

    #[test]
    fn test_miss_and_segment() {
        let sphere = Sphere::new(Vector3f::zeros(), 1.0);
        let ray = Ray3f::new(Vector3f::new(0.0, 2.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(sphere.ray_intersection(&ray).is_none());

        let short = Ray3f::new(Vector3f::new(0.0, 0.0, -5.0), Vector3f::new(0.0, 0.0, 1.0), None, Some(3.0));
        assert!(!sphere.ray_intersection_t(&short));
    }

    #[test]
    fn test_sample_on_surface() {
        let sphere = Sphere::new(Vector3f::new(1.0, 2.0, 3.0), 2.0);
        let s = sphere.sample(&Vector2f::new(0.3, 0.8));
        assert!(((s.position - sphere.center()).norm() - 2.0).abs() < 1e-4);
        assert!((s.pdf_a * sphere.surface_area() - 1.0).abs() < 1e-5);
    }
}
