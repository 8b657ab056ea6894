// Copyright @yucwang 2026

use crate::core::sensor::Sensor;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

/// Pinhole camera.
pub struct PerspectiveCamera {
    origin: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov_y: Float,
    aspect: Float,
}

impl PerspectiveCamera {
    pub fn new(origin: Vector3f,
               target: Vector3f,
               up: Vector3f,
               fov_y_radians: Float,
               aspect: Float) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward).normalize();

        Self {
            origin,
            forward,
            right,
            up,
            tan_half_fov_y: (0.5 * fov_y_radians).tan(),
            aspect,
        }
    }

    pub fn aspect(&self) -> Float {
        self.aspect
    }
}

impl Sensor for PerspectiveCamera {
    fn generate_ray(&self, film_coords: &Vector2f) -> Ray3f {
        let px = (2.0 * film_coords.x - 1.0) * self.aspect * self.tan_half_fov_y;
        let py = (1.0 - 2.0 * film_coords.y) * self.tan_half_fov_y;
        let dir = self.right * px + self.up * py + self.forward;
        Ray3f::new(self.origin, dir, None, None)
    }

    fn pdf_w(&self, direction: &Vector3f) -> Float {
        let cos_at_camera = self.forward.dot(direction);
        if cos_at_camera <= 0.0 {
            return 0.0;
        }
        let tan_sqr = self.tan_half_fov_y * self.tan_half_fov_y;
        0.25 / (tan_sqr * cos_at_camera * cos_at_camera * cos_at_camera * self.aspect)
    }

    fn world_to_film(&self, position: &Vector3f) -> Option<Vector2f> {
        let local = position - self.origin;
        let z = local.dot(&self.forward);
        if z <= 0.0 {
            return None;
        }
        let x = local.dot(&self.right) / (z * self.tan_half_fov_y * self.aspect);
        let y = local.dot(&self.up) / (z * self.tan_half_fov_y);
        let film = Vector2f::new(0.5 * (x + 1.0), 0.5 * (1.0 - y));
        if film.x < 0.0 || film.x >= 1.0 || film.y < 0.0 || film.y >= 1.0 {
            return None;
        }
        Some(film)
    }

    fn position(&self) -> Vector3f {
        self.origin
    }

    fn forward(&self) -> Vector3f {
        self.forward
    }

    fn describe(&self) -> String {
        format!("PerspectiveCamera [origin={:?}, forward={:?}, aspect={}]",
                self.origin.as_slice(), self.forward.as_slice(), self.aspect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(Vector3f::new(0.0, 0.0, 0.0),
                               Vector3f::new(0.0, 0.0, -1.0),
                               Vector3f::new(0.0, 1.0, 0.0),
                               std::f32::consts::FRAC_PI_2,
                               1.5)
    }

    #[test]
    fn test_perspective_camera_center_ray() {
        let ray = camera().generate_ray(&Vector2f::new(0.5, 0.5));
        let dir = ray.dir();
        assert!((dir.x - 0.0).abs() < 1e-6);
        assert!((dir.y - 0.0).abs() < 1e-6);
        assert!((dir.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_world_to_film_inverts_generate_ray() {
        let cam = camera();
        let coords = Vector2f::new(0.2, 0.85);
        let ray = cam.generate_ray(&coords);
        let film = cam.world_to_film(&ray.at(3.0)).unwrap();
        assert!((film - coords).norm() < 1e-4);
        assert!(cam.world_to_film(&Vector3f::new(0.0, 0.0, 1.0)).is_none());
    }

    #[test]
    fn test_pdf_w_integrates_to_one() {
        // Riemann sum of pdf_w over the film in solid angle
        let cam = camera();
        let n = 200;
        let mut total = 0.0;
        for j in 0..n {
            for i in 0..n {
                let coords = Vector2f::new((i as Float + 0.5) / n as Float, (j as Float + 0.5) / n as Float);
                let dir = cam.generate_ray(&coords).dir();
                let cos = -dir.z;
                // film area element is 4·aspect·tan² / n², solid angle = dA·cos³
                let d_omega = 4.0 * 1.5 / (n * n) as Float * cos * cos * cos;
                total += cam.pdf_w(&dir) * d_omega;
            }
        }
        assert!((total - 1.0).abs() < 1e-3);
        assert_eq!(cam.pdf_w(&Vector3f::new(0.0, 0.0, 1.0)), 0.0);
    }
}
