// Copyright @yucwang 2026

use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::emitter::{EmitResult, Emitter, EmitterFlags, IlluminateResult, RadianceResult};
use crate::core::shape::Shape;
use crate::math::constants::{Float, Vector2f, Vector3f, COS_EPSILON, INV_PI};
use crate::math::frame::Frame;
use crate::math::spectrum::{RayColor, Wavelength};
use crate::math::warp::sample_cosine_hemisphere;
use std::sync::Arc;

/// Lambertian emitter on the front side of a shape.
pub struct AreaLight {
    id: String,
    shape: Arc<dyn Shape>,
    radiance: RayColor,
}

impl AreaLight {
    pub fn new(shape: Arc<dyn Shape>, radiance: RayColor) -> Self {
        Self { id: generate_node_id("areaLight"), shape, radiance }
    }

    fn inv_area(&self) -> Float {
        let area = self.shape.surface_area();
        if area > 0.0 { 1.0 / area } else { 0.0 }
    }
}

impl ComputationNode for AreaLight {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("AreaLight [id={}, shape={}, area={}]",
                self.id, self.shape.id(), self.shape.surface_area())
    }
}

impl Emitter for AreaLight {
    fn flags(&self) -> EmitterFlags {
        EmitterFlags::IS_FINITE
    }

    fn shape(&self) -> Option<&dyn Shape> {
        Some(self.shape.as_ref())
    }

    fn illuminate(&self, receiving_position: &Vector3f, sample: &Vector2f,
                  _wavelength: &Wavelength) -> Option<IlluminateResult> {
        let surface = self.shape.sample(sample);
        let to_light = surface.position - receiving_position;
        let sqr_distance = to_light.norm_squared();
        if sqr_distance <= 0.0 {
            return None;
        }
        let distance = sqr_distance.sqrt();
        let direction_to_light = to_light / distance;

        let cos_at_light = -surface.normal.dot(&direction_to_light);
        if cos_at_light < COS_EPSILON {
            return None;
        }

        Some(IlluminateResult {
            radiance: self.radiance,
            direction_to_light,
            distance,
            direct_pdf_w: surface.pdf_a * sqr_distance / cos_at_light,
            emission_pdf_w: surface.pdf_a * cos_at_light * INV_PI,
            cos_at_light,
        })
    }

    fn emit(&self, position_sample: &Vector2f, direction_sample: &Vector2f,
            _wavelength: &Wavelength) -> Option<EmitResult> {
        let surface = self.shape.sample(position_sample);
        let local_dir = sample_cosine_hemisphere(direction_sample);
        let cos_at_light = local_dir.z;
        if cos_at_light < COS_EPSILON || surface.pdf_a <= 0.0 {
            return None;
        }

        let frame = Frame::from_normal(&surface.normal);
        Some(EmitResult {
            radiance: self.radiance * cos_at_light,
            position: surface.position,
            direction: frame.from_local(&local_dir),
            emission_pdf_w: surface.pdf_a * cos_at_light * INV_PI,
            direct_pdf_a: surface.pdf_a,
            cos_at_light,
        })
    }

    fn get_radiance(&self, _ray_dir: &Vector3f, cos_at_light: Float,
                    _wavelength: &Wavelength) -> RadianceResult {
        if cos_at_light < COS_EPSILON {
            return RadianceResult::zero();
        }
        let inv_area = self.inv_area();
        RadianceResult {
            radiance: self.radiance,
            direct_pdf_a: inv_area,
            emission_pdf_w: cos_at_light * inv_area * INV_PI,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::rectangle::Rectangle;

    fn ceiling_light() -> AreaLight {
        // 2x2 quad at z = 1 facing down
        let shape = Rectangle::new(Vector3f::new(-1.0, -1.0, 1.0),
                                   Vector3f::new(0.0, 2.0, 0.0),
                                   Vector3f::new(2.0, 0.0, 0.0));
        AreaLight::new(Arc::new(shape), RayColor::splat(5.0))
    }

    #[test]
    fn test_illuminate_densities() {
        let light = ceiling_light();
        let result = light.illuminate(&Vector3f::zeros(), &Vector2f::new(0.5, 0.5),
                                      &Wavelength::default()).unwrap();
        assert!((result.distance - 1.0).abs() < 1e-5);
        assert!((result.cos_at_light - 1.0).abs() < 1e-5);
        assert!((result.direct_pdf_w - 0.25).abs() < 1e-5);
        assert!((result.emission_pdf_w - 0.25 * INV_PI).abs() < 1e-6);
    }

    #[test]
    fn test_illuminate_from_behind_is_rejected() {
        let light = ceiling_light();
        let above = Vector3f::new(0.0, 0.0, 3.0);
        assert!(light.illuminate(&above, &Vector2f::new(0.3, 0.6), &Wavelength::default()).is_none());
    }

    #[test]
    fn test_emit_matches_get_radiance() {
        let light = ceiling_light();
        let wavelength = Wavelength::default();
        let emitted = light.emit(&Vector2f::new(0.2, 0.7), &Vector2f::new(0.4, 0.4), &wavelength).unwrap();
        assert!(emitted.direction.z < 0.0);
        let radiance = light.get_radiance(&-emitted.direction, emitted.cos_at_light, &wavelength);
        assert!((radiance.emission_pdf_w - emitted.emission_pdf_w).abs() < 1e-6);
        assert!((radiance.direct_pdf_a - emitted.direct_pdf_a).abs() < 1e-6);
        assert!((emitted.radiance[0] - 5.0 * emitted.cos_at_light).abs() < 1e-5);
        assert!(light.get_radiance(&emitted.direction, -0.5, &wavelength).radiance.is_black());
    }
}
