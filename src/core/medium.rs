// Copyright @yucwang 2026

use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector3f, FLOAT_MAX};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RayColor;

/// Outcome of flying a ray segment through a medium.
#[derive(Debug, Copy, Clone)]
pub struct MediumScatteringEvent {
    pub direction: Vector3f,
    /// `FLOAT_MAX` when the ray crossed the segment without scattering.
    pub distance: Float,
    pub transmittance: RayColor,
}

impl MediumScatteringEvent {
    pub fn passed_through(direction: Vector3f, transmittance: RayColor) -> Self {
        Self { direction, distance: FLOAT_MAX, transmittance }
    }

    pub fn scattered(&self) -> bool {
        self.distance < FLOAT_MAX
    }
}

pub trait Medium: Send + Sync {
    /// Samples the free flight over `[min_distance, max_distance]` and returns
    /// the throughput weight together with the event.
    fn sample(&self, ray: &Ray3f, min_distance: Float, max_distance: Float,
              rng: &mut LcgRng) -> (RayColor, MediumScatteringEvent);

    fn transmittance(&self, distance: Float) -> RayColor;
}
