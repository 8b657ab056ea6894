// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

/// Film coordinates are in [0,1]², x to the right and y downwards.
pub trait Sensor: Send + Sync {
    fn generate_ray(&self, film_coords: &Vector2f) -> Ray3f;

    /// Solid angle density of generating `direction`, relative to a unit image area.
    fn pdf_w(&self, direction: &Vector3f) -> Float;

    fn world_to_film(&self, position: &Vector3f) -> Option<Vector2f>;

    fn position(&self) -> Vector3f;

    fn forward(&self) -> Vector3f;

    fn describe(&self) -> String {
        String::from("Sensor")
    }
}
