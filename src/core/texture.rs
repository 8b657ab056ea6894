// Copyright @yucwang 2026

use crate::math::constants::Vector2f;
use crate::math::spectrum::RGBSpectrum;

/// Spatially varying input of a material. Owned through `Arc` by the
/// materials using it; never refers back to them.
pub trait Texture: Send + Sync {
    fn eval(&self, uv: &Vector2f) -> RGBSpectrum;

    fn describe(&self) -> String {
        String::from("Texture")
    }
}
