// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::emitter::{scene_disk_point, EmitResult, Emitter, EmitterFlags, IlluminateResult,
                           RadianceResult, INFINITE_LIGHT_DISTANCE};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, INV_PI};
use crate::math::spectrum::{RayColor, Wavelength};

/// Parallel light travelling along `direction`.
pub struct DirectionalLight {
    id: String,
    direction: Vector3f,
    irradiance: RayColor,
    scene_center: Vector3f,
    scene_radius: Float,
}

impl DirectionalLight {
    pub fn new(direction: Vector3f, irradiance: RayColor) -> Self {
        let len = direction.norm();
        let direction = if len > 0.0 { direction / len } else { Vector3f::new(0.0, 0.0, -1.0) };
        Self {
            id: generate_node_id("directionalLight"),
            direction,
            irradiance,
            scene_center: Vector3f::zeros(),
            scene_radius: 1.0,
        }
    }

    fn position_pdf_a(&self) -> Float {
        INV_PI / (self.scene_radius * self.scene_radius)
    }
}

impl ComputationNode for DirectionalLight {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("DirectionalLight [id={}, direction={:?}]", self.id, self.direction.as_slice())
    }
}

impl Emitter for DirectionalLight {
    fn flags(&self) -> EmitterFlags {
        EmitterFlags::IS_DELTA
    }

    fn set_scene_bounds(&mut self, bounds: &AABB) {
        if bounds.is_valid() {
            let (center, radius) = bounds.bounding_sphere();
            self.scene_center = center;
            self.scene_radius = (radius * 1.01).max(1.0e-3);
        }
    }

    fn illuminate(&self, _receiving_position: &Vector3f, _sample: &Vector2f,
                  _wavelength: &Wavelength) -> Option<IlluminateResult> {
        Some(IlluminateResult {
            radiance: self.irradiance,
            direction_to_light: -self.direction,
            distance: INFINITE_LIGHT_DISTANCE,
            direct_pdf_w: 1.0,
            emission_pdf_w: self.position_pdf_a(),
            cos_at_light: 1.0,
        })
    }

    fn emit(&self, position_sample: &Vector2f, _direction_sample: &Vector2f,
            _wavelength: &Wavelength) -> Option<EmitResult> {
        Some(EmitResult {
            radiance: self.irradiance,
            position: scene_disk_point(&self.scene_center, self.scene_radius, &self.direction, position_sample),
            direction: self.direction,
            emission_pdf_w: self.position_pdf_a(),
            direct_pdf_a: 1.0,
            cos_at_light: 1.0,
        })
    }

    fn get_radiance(&self, _ray_dir: &Vector3f, _cos_at_light: Float,
                    _wavelength: &Wavelength) -> RadianceResult {
        RadianceResult::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_normalized() {
        let light = DirectionalLight::new(Vector3f::new(0.0, 0.0, -3.0), RayColor::one());
        let result = light.illuminate(&Vector3f::zeros(), &Vector2f::zeros(), &Wavelength::default()).unwrap();
        assert!((result.direction_to_light - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        assert!(light.is_delta() && !light.is_finite());
    }

    #[test]
    fn test_emit_covers_the_scene() {
        let mut light = DirectionalLight::new(Vector3f::new(0.0, -1.0, 0.0), RayColor::one());
        light.set_scene_bounds(&AABB::new(Vector3f::new(-2.0, -2.0, -2.0), Vector3f::new(2.0, 2.0, 2.0)));
        let emitted = light.emit(&Vector2f::new(0.5, 0.5), &Vector2f::zeros(), &Wavelength::default()).unwrap();
        assert!(emitted.position.y > 3.0);
        assert!((emitted.direction.y + 1.0).abs() < 1e-6);
    }
}
