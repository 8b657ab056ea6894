// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::emitter::{scene_disk_point, EmitResult, Emitter, EmitterFlags, IlluminateResult,
                           RadianceResult, INFINITE_LIGHT_DISTANCE};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, INV_FOUR_PI, INV_PI};
use crate::math::spectrum::{RayColor, Wavelength};
use crate::math::warp::sample_uniform_sphere;

const DEFAULT_SCENE_RADIUS: Float = 20.0;

/// Constant radiance arriving from every direction.
pub struct BackgroundLight {
    id: String,
    radiance: RayColor,
    scene_center: Vector3f,
    scene_radius: Float,
}

impl BackgroundLight {
    pub fn new(radiance: RayColor) -> Self {
        Self {
            id: generate_node_id("backgroundLight"),
            radiance,
            scene_center: Vector3f::zeros(),
            scene_radius: DEFAULT_SCENE_RADIUS,
        }
    }

    pub fn scene_radius(&self) -> Float {
        self.scene_radius
    }

    /// Density of picking a photon origin on the scene disk.
    fn position_pdf_a(&self) -> Float {
        INV_PI / (self.scene_radius * self.scene_radius)
    }
}

impl ComputationNode for BackgroundLight {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Emitter for BackgroundLight {
    fn flags(&self) -> EmitterFlags {
        EmitterFlags::NONE
    }

    fn set_scene_bounds(&mut self, bounds: &AABB) {
        if !bounds.is_valid() {
            return;
        }
        let (center, radius) = bounds.bounding_sphere();
        self.scene_center = center;
        self.scene_radius = (radius * 1.01).max(1.0e-3);
    }

    fn illuminate(&self, _receiving_position: &Vector3f, sample: &Vector2f,
                  _wavelength: &Wavelength) -> Option<IlluminateResult> {
        Some(IlluminateResult {
            radiance: self.radiance,
            direction_to_light: sample_uniform_sphere(sample),
            distance: INFINITE_LIGHT_DISTANCE,
            direct_pdf_w: INV_FOUR_PI,
            emission_pdf_w: INV_FOUR_PI * self.position_pdf_a(),
            cos_at_light: 1.0,
        })
    }

    fn emit(&self, position_sample: &Vector2f, direction_sample: &Vector2f,
            _wavelength: &Wavelength) -> Option<EmitResult> {
        let direction = -sample_uniform_sphere(direction_sample);
        Some(EmitResult {
            radiance: self.radiance,
            position: scene_disk_point(&self.scene_center, self.scene_radius, &direction, position_sample),
            direction,
            emission_pdf_w: INV_FOUR_PI * self.position_pdf_a(),
            direct_pdf_a: INV_FOUR_PI,
            cos_at_light: 1.0,
        })
    }

    fn get_radiance(&self, _ray_dir: &Vector3f, _cos_at_light: Float,
                    _wavelength: &Wavelength) -> RadianceResult {
        RadianceResult {
            radiance: self.radiance,
            direct_pdf_a: INV_FOUR_PI,
            emission_pdf_w: INV_FOUR_PI * self.position_pdf_a(),
        }
    }
}
