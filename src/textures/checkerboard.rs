// Copyright @yucwang 2026

use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f};
use crate::math::spectrum::RGBSpectrum;

/// Two-color checker pattern repeating `scale` times per unit of uv.
pub struct CheckerboardTexture {
    even: RGBSpectrum,
    odd: RGBSpectrum,
    scale: Float,
}

impl CheckerboardTexture {
    pub fn new(even: RGBSpectrum, odd: RGBSpectrum, scale: Float) -> Self {
        Self { even, odd, scale }
    }
}

impl Texture for CheckerboardTexture {
    fn eval(&self, uv: &Vector2f) -> RGBSpectrum {
        let u = (uv.x * self.scale).floor() as i64;
        let v = (uv.y * self.scale).floor() as i64;
        if (u + v).rem_euclid(2) == 0 {
            self.even
        } else {
            self.odd
        }
    }

    fn describe(&self) -> String {
        format!("CheckerboardTexture [scale={}]", self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_alternates() {
        let tex = CheckerboardTexture::new(RGBSpectrum::one(), RGBSpectrum::zero(), 4.0);
        assert_eq!(tex.eval(&Vector2f::new(0.1, 0.1)), RGBSpectrum::one());
        assert_eq!(tex.eval(&Vector2f::new(0.3, 0.1)), RGBSpectrum::zero());
        assert_eq!(tex.eval(&Vector2f::new(0.3, 0.3)), RGBSpectrum::one());
        assert_eq!(tex.eval(&Vector2f::new(-0.1, 0.1)), RGBSpectrum::zero());
    }
}
