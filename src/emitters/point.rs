// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::emitter::{EmitResult, Emitter, EmitterFlags, IlluminateResult, RadianceResult};
use crate::math::constants::{Float, Vector2f, Vector3f, INV_FOUR_PI};
use crate::math::spectrum::{RayColor, Wavelength};
use crate::math::warp::sample_uniform_sphere;

pub struct PointLight {
    id: String,
    position: Vector3f,
    intensity: RayColor,
}

impl PointLight {
    pub fn new(position: Vector3f, intensity: RayColor) -> Self {
        Self { id: generate_node_id("pointLight"), position, intensity }
    }
}

impl ComputationNode for PointLight {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Emitter for PointLight {
    fn flags(&self) -> EmitterFlags {
        EmitterFlags::IS_DELTA | EmitterFlags::IS_FINITE
    }

    fn illuminate(&self, receiving_position: &Vector3f, _sample: &Vector2f,
                  _wavelength: &Wavelength) -> Option<IlluminateResult> {
        let to_light = self.position - receiving_position;
        let sqr_distance = to_light.norm_squared();
        if sqr_distance <= 0.0 {
            return None;
        }
        let distance = sqr_distance.sqrt();
        Some(IlluminateResult {
            radiance: self.intensity,
            direction_to_light: to_light / distance,
            distance,
            direct_pdf_w: sqr_distance,
            emission_pdf_w: INV_FOUR_PI,
            cos_at_light: 1.0,
        })
    }

    fn emit(&self, _position_sample: &Vector2f, direction_sample: &Vector2f,
            _wavelength: &Wavelength) -> Option<EmitResult> {
        Some(EmitResult {
            radiance: self.intensity,
            position: self.position,
            direction: sample_uniform_sphere(direction_sample),
            emission_pdf_w: INV_FOUR_PI,
            direct_pdf_a: 1.0,
            cos_at_light: 1.0,
        })
    }

    fn get_radiance(&self, _ray_dir: &Vector3f, _cos_at_light: Float,
                    _wavelength: &Wavelength) -> RadianceResult {
        RadianceResult::zero()
    }
}
