// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::frame::Frame;
use crate::math::spectrum::{RayColor, Wavelength};
use crate::math::warp::sample_uniform_disk_concentric;

/// Distance reported for lights that sit at infinity.
pub const INFINITE_LIGHT_DISTANCE: Float = 1.0e+36;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterFlags(u8);

impl EmitterFlags {
    pub const NONE: Self = Self(0);
    /// Cannot be hit by a ray or sampled by a BSDF.
    pub const IS_DELTA: Self = Self(1 << 0);
    /// Located at a finite distance from the scene.
    pub const IS_FINITE: Self = Self(1 << 1);

    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0 && other.0 != 0
    }
}

impl std::ops::BitOr for EmitterFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EmitterFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Light sample as seen from a shading point.
#[derive(Debug, Copy, Clone)]
pub struct IlluminateResult {
    pub radiance: RayColor,
    pub direction_to_light: Vector3f,
    pub distance: Float,
    pub direct_pdf_w: Float,
    pub emission_pdf_w: Float,
    pub cos_at_light: Float,
}

/// Photon leaving the light.
#[derive(Debug, Copy, Clone)]
pub struct EmitResult {
    /// Already includes the cosine at the light.
    pub radiance: RayColor,
    pub position: Vector3f,
    pub direction: Vector3f,
    pub emission_pdf_w: Float,
    /// Area density, or solid angle density for lights at infinity.
    pub direct_pdf_a: Float,
    pub cos_at_light: Float,
}

#[derive(Debug, Copy, Clone)]
pub struct RadianceResult {
    pub radiance: RayColor,
    pub direct_pdf_a: Float,
    pub emission_pdf_w: Float,
}

impl RadianceResult {
    pub fn zero() -> Self {
        Self { radiance: RayColor::zero(), direct_pdf_a: 0.0, emission_pdf_w: 0.0 }
    }
}

pub trait Emitter: ComputationNode + Send + Sync {
    fn flags(&self) -> EmitterFlags;

    fn is_delta(&self) -> bool {
        self.flags().contains(EmitterFlags::IS_DELTA)
    }

    fn is_finite(&self) -> bool {
        self.flags().contains(EmitterFlags::IS_FINITE)
    }

    /// Shape a ray can hit. Lights without one are global lights.
    fn shape(&self) -> Option<&dyn Shape> {
        None
    }

    fn set_scene_bounds(&mut self, _bounds: &AABB) {}

    fn illuminate(&self, receiving_position: &Vector3f, sample: &Vector2f,
                  wavelength: &Wavelength) -> Option<IlluminateResult>;

    fn emit(&self, position_sample: &Vector2f, direction_sample: &Vector2f,
            wavelength: &Wavelength) -> Option<EmitResult>;

    /// Radiance arriving along `ray_dir` after it hit the light (or escaped the
    /// scene). `cos_at_light` is only meaningful for lights with a shape.
    fn get_radiance(&self, ray_dir: &Vector3f, cos_at_light: Float,
                    wavelength: &Wavelength) -> RadianceResult;
}

/// Point on the disk of the scene sphere facing `direction`, pushed back by
/// one radius. Lights at infinity start their photons there.
pub(crate) fn scene_disk_point(center: &Vector3f, radius: Float, direction: &Vector3f,
                               u: &Vector2f) -> Vector3f {
    let frame = Frame::from_normal(direction);
    let disk = sample_uniform_disk_concentric(u);
    center + radius * (frame.x * disk.x + frame.y * disk.y - direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let flags = EmitterFlags::IS_DELTA | EmitterFlags::IS_FINITE;
        assert!(flags.contains(EmitterFlags::IS_DELTA));
        assert!(flags.contains(EmitterFlags::IS_FINITE));
        assert!(!EmitterFlags::IS_FINITE.contains(EmitterFlags::IS_DELTA));
        assert!(!flags.contains(EmitterFlags::NONE));
    }

    #[test]
    fn test_scene_disk_point_starts_behind_the_scene() {
        let dir = Vector3f::new(0.0, 0.0, 1.0);
        let p = scene_disk_point(&Vector3f::zeros(), 10.0, &dir, &Vector2f::new(0.5, 0.5));
        assert!((p.z + 10.0).abs() < 1e-4);
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
    }
}
