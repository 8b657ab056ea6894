// Copyright @yucwang 2026

use crate::core::medium::{Medium, MediumScatteringEvent};
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, FLOAT_MAX};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, RayColor, Wavelength};
use crate::math::warp::sample_uniform_sphere;

/// Constant density medium. Without an albedo it only absorbs.
pub struct HomogeneousMedium {
    sigma_t: RGBSpectrum,
    albedo: Option<RGBSpectrum>,
    scale: Float,
}

impl HomogeneousMedium {
    pub fn absorptive(sigma_t: RGBSpectrum) -> Self {
        Self { sigma_t, albedo: None, scale: 1.0 }
    }

    pub fn scattering(sigma_t: RGBSpectrum, albedo: RGBSpectrum) -> Self {
        Self { sigma_t, albedo: Some(albedo.clamp01()), scale: 1.0 }
    }

    pub fn with_scale(mut self, scale: Float) -> Self {
        self.scale = scale.max(0.0);
        self
    }

    fn sigma_t(&self) -> RGBSpectrum {
        self.sigma_t * self.scale
    }
}

impl Medium for HomogeneousMedium {
    fn sample(&self, ray: &Ray3f, min_distance: Float, max_distance: Float,
              rng: &mut LcgRng) -> (RayColor, MediumScatteringEvent) {
        let total_distance = max_distance - min_distance;
        debug_assert!(total_distance >= 0.0);

        let albedo = match self.albedo {
            Some(albedo) => albedo,
            None => {
                let transmittance = self.transmittance(total_distance);
                return (transmittance, MediumScatteringEvent::passed_through(ray.dir(), transmittance));
            }
        };

        let sigma_t = self.sigma_t();
        let channel = rng.next_below(Wavelength::NUM_COMPONENTS as u32) as usize;
        let xi = rng.next_f32();
        let scatter_distance = if sigma_t[channel] > 0.0 {
            -(1.0 - xi).ln() / sigma_t[channel]
        } else {
            FLOAT_MAX
        };

        let sampled_medium = scatter_distance < total_distance;
        let t = if sampled_medium { scatter_distance } else { total_distance };
        let transmittance = self.transmittance(t);

        if sampled_medium {
            // channel averaged density of stopping here
            let pdf = (transmittance * sigma_t).average();
            if pdf <= 0.0 {
                return (RayColor::zero(), MediumScatteringEvent::passed_through(ray.dir(), transmittance));
            }
            let event = MediumScatteringEvent {
                direction: sample_uniform_sphere(&rng.next_vec2()),
                distance: min_distance + scatter_distance,
                transmittance,
            };
            (transmittance * sigma_t * albedo / pdf, event)
        } else {
            let pdf = transmittance.average();
            let weight = if pdf > 0.0 { transmittance / pdf } else { RayColor::zero() };
            (weight, MediumScatteringEvent::passed_through(ray.dir(), transmittance))
        }
    }

    fn transmittance(&self, distance: Float) -> RayColor {
        if distance >= FLOAT_MAX {
            return RayColor::zero();
        }
        (self.sigma_t() * -distance).exp()
    }
}
