// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

use std::ops;

/// Light quantity carried along a path. Channels are linear RGB.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RGBSpectrum {
    rgb: Vector3f
}

/// Color carried by rays through the integrators.
pub type RayColor = RGBSpectrum;

impl Default for RGBSpectrum {
    fn default() -> Self {
        Self { rgb: Vector3f::new(0.0f32, 0.0f32, 0.0f32) }
    }
}

impl RGBSpectrum {
    pub fn new(r: Float, g: Float, b: Float) -> Self {
        Self { rgb: Vector3f::new(r, g, b) }
    }

    pub fn splat(v: Float) -> Self {
        Self::new(v, v, v)
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::splat(1.0)
    }

    pub fn from_vector(v: Vector3f) -> Self {
        Self { rgb: v }
    }

    pub fn to_vector(&self) -> Vector3f {
        self.rgb
    }

    pub fn is_black(&self) -> bool {
        self.rgb.iter().all(|c| *c == 0.0)
    }

    pub fn almost_zero(&self) -> bool {
        self.rgb.iter().all(|c| c.abs() < 1.0e-20)
    }

    pub fn is_valid(&self) -> bool {
        self.rgb.iter().all(|c| c.is_finite() && *c >= 0.0)
    }

    pub fn max(&self) -> Float {
        self.rgb.x.max(self.rgb.y).max(self.rgb.z)
    }

    pub fn average(&self) -> Float {
        (self.rgb.x + self.rgb.y + self.rgb.z) / 3.0
    }

    pub fn luminance(&self) -> Float {
        0.2126 * self.rgb.x + 0.7152 * self.rgb.y + 0.0722 * self.rgb.z
    }

    pub fn component_min(&self, other: &RGBSpectrum) -> Self {
        Self::new(self.rgb.x.min(other.rgb.x),
                  self.rgb.y.min(other.rgb.y),
                  self.rgb.z.min(other.rgb.z))
    }

    pub fn clamp01(&self) -> Self {
        Self::new(self.rgb.x.clamp(0.0, 1.0),
                  self.rgb.y.clamp(0.0, 1.0),
                  self.rgb.z.clamp(0.0, 1.0))
    }

    pub fn exp(&self) -> Self {
        Self::new(self.rgb.x.exp(), self.rgb.y.exp(), self.rgb.z.exp())
    }

    /// Accumulates `a * b` into `self`.
    pub fn mul_and_accumulate(&mut self, a: &RGBSpectrum, b: &RGBSpectrum) {
        self.rgb += a.rgb.component_mul(&b.rgb);
    }
}

impl ops::Index<usize> for RGBSpectrum {
    type Output = Float;

    fn index(&self, index: usize) -> &Float {
        &self.rgb[index]
    }
}

impl ops::IndexMut<usize> for RGBSpectrum {
    fn index_mut(&mut self, index: usize) -> &mut Float {
        &mut self.rgb[index]
    }
}

impl ops::Add for RGBSpectrum {
    type Output = RGBSpectrum;

    fn add(self, rhs: RGBSpectrum) -> RGBSpectrum {
        RGBSpectrum { rgb: self.rgb + rhs.rgb }
    }
}

impl ops::AddAssign for RGBSpectrum {
    fn add_assign(&mut self, rhs: RGBSpectrum) {
        self.rgb += rhs.rgb;
    }
}

impl ops::Sub for RGBSpectrum {
    type Output = RGBSpectrum;

    fn sub(self, rhs: RGBSpectrum) -> RGBSpectrum {
        RGBSpectrum { rgb: self.rgb - rhs.rgb }
    }
}

impl ops::Mul for RGBSpectrum {
    type Output = RGBSpectrum;

    fn mul(self, rhs: RGBSpectrum) -> RGBSpectrum {
        RGBSpectrum { rgb: self.rgb.component_mul(&rhs.rgb) }
    }
}

impl ops::MulAssign for RGBSpectrum {
    fn mul_assign(&mut self, rhs: RGBSpectrum) {
        self.rgb.component_mul_assign(&rhs.rgb);
    }
}

impl ops::Mul<Float> for RGBSpectrum {
    type Output = RGBSpectrum;

    fn mul(self, rhs: Float) -> RGBSpectrum {
        RGBSpectrum { rgb: self.rgb * rhs }
    }
}

impl ops::MulAssign<Float> for RGBSpectrum {
    fn mul_assign(&mut self, rhs: Float) {
        self.rgb *= rhs;
    }
}

impl ops::Div<Float> for RGBSpectrum {
    type Output = RGBSpectrum;

    fn div(self, rhs: Float) -> RGBSpectrum {
        RGBSpectrum { rgb: self.rgb / rhs }
    }
}

impl ops::Div for RGBSpectrum {
    type Output = RGBSpectrum;

    fn div(self, rhs: RGBSpectrum) -> RGBSpectrum {
        RGBSpectrum { rgb: self.rgb.component_div(&rhs.rgb) }
    }
}

/// Hero-channel wavelength carried by a path sample.
///
/// Until some event needs a single wavelength (dispersion), a sample carries all
/// three channels. Collapsing keeps only the hero channel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Wavelength {
    value: Float,
    pub is_single: bool,
}

impl Wavelength {
    pub const NUM_COMPONENTS: usize = 3;

    // Nominal channel wavelengths in micrometers.
    const CHANNEL_WAVELENGTHS: [Float; 3] = [0.610, 0.550, 0.465];

    pub fn new(value: Float) -> Self {
        debug_assert!(value >= 0.0 && value < 1.0);
        Self { value, is_single: false }
    }

    pub fn hero_channel(&self) -> usize {
        ((self.value * Self::NUM_COMPONENTS as Float) as usize).min(Self::NUM_COMPONENTS - 1)
    }

    /// Hero wavelength in micrometers.
    pub fn micrometers(&self) -> Float {
        Self::CHANNEL_WAVELENGTHS[self.hero_channel()]
    }

    /// Weight compensating for tracing only the hero channel.
    pub fn single_wavelength_fallback(&self) -> RayColor {
        let mut color = RayColor::zero();
        color[self.hero_channel()] = Self::NUM_COMPONENTS as Float;
        color
    }
}

impl Default for Wavelength {
    fn default() -> Self {
        Self { value: 0.0, is_single: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrum_arithmetic() {
        let a = RGBSpectrum::new(1.0, 2.0, 3.0);
        let b = RGBSpectrum::new(0.5, 0.5, 2.0);
        let c = a * b + RGBSpectrum::splat(1.0);
        assert_eq!(c, RGBSpectrum::new(1.5, 2.0, 7.0));
        assert_eq!(c.max(), 7.0);
        assert!(c.is_valid());
        assert!(!(c * -1.0).is_valid());
    }

    #[test]
    fn test_spectrum_almost_zero() {
        assert!(RGBSpectrum::zero().almost_zero());
        assert!(RGBSpectrum::splat(1.0e-25).almost_zero());
        assert!(!RGBSpectrum::new(0.0, 1.0e-3, 0.0).almost_zero());
    }

    #[test]
    fn test_wavelength_fallback_is_unbiased() {
        let mut sum = RayColor::zero();
        for i in 0..3 {
            let wavelength = Wavelength::new((i as Float + 0.5) / 3.0);
            sum += wavelength.single_wavelength_fallback();
        }
        assert_eq!(sum / 3.0, RayColor::one());
    }
}
