// Copyright @yucwang 2026

//! Compact encodings used to keep photons small.

use super::constants::{Float, Vector3f};

/// Unit vector stored with octahedral mapping in two signed 16-bit values.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PackedUnitVector3 {
    u: i16,
    v: i16,
}

const OCT_SCALE: Float = 32767.0;

fn sign_not_zero(x: Float) -> Float {
    if x >= 0.0 { 1.0 } else { -1.0 }
}

impl PackedUnitVector3 {
    pub fn from_vector(v: &Vector3f) -> Self {
        let l1 = v.x.abs() + v.y.abs() + v.z.abs();
        if l1 <= 0.0 {
            return Self { u: 0, v: 0 };
        }

        let mut px = v.x / l1;
        let mut py = v.y / l1;
        if v.z < 0.0 {
            let fx = (1.0 - py.abs()) * sign_not_zero(px);
            let fy = (1.0 - px.abs()) * sign_not_zero(py);
            px = fx;
            py = fy;
        }

        Self {
            u: (px.clamp(-1.0, 1.0) * OCT_SCALE).round() as i16,
            v: (py.clamp(-1.0, 1.0) * OCT_SCALE).round() as i16,
        }
    }

    pub fn to_vector(&self) -> Vector3f {
        let mut px = self.u as Float / OCT_SCALE;
        let mut py = self.v as Float / OCT_SCALE;
        let z = 1.0 - px.abs() - py.abs();
        if z < 0.0 {
            let fx = (1.0 - py.abs()) * sign_not_zero(px);
            let fy = (1.0 - px.abs()) * sign_not_zero(py);
            px = fx;
            py = fy;
        }
        Vector3f::new(px, py, z).normalize()
    }
}

/// HDR color in shared-exponent RGB9E5 layout.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PackedColorRgbHdr {
    data: u32,
}

const MANTISSA_BITS: i32 = 9;
const EXPONENT_BIAS: i32 = 15;
const MANTISSA_MASK: u32 = (1 << MANTISSA_BITS) - 1;
const MAX_PACKED_VALUE: Float = (511.0 / 512.0) * 65536.0;

impl PackedColorRgbHdr {
    pub fn from_vector(color: &Vector3f) -> Self {
        let r = color.x.max(0.0).min(MAX_PACKED_VALUE);
        let g = color.y.max(0.0).min(MAX_PACKED_VALUE);
        let b = color.z.max(0.0).min(MAX_PACKED_VALUE);
        let max_c = r.max(g).max(b);
        if max_c <= 0.0 {
            return Self { data: 0 };
        }

        let mut exponent = (max_c.log2().floor() as i32).max(-EXPONENT_BIAS - 1) + 1 + EXPONENT_BIAS;
        let mut denom = ((exponent - EXPONENT_BIAS - MANTISSA_BITS) as Float).exp2();
        let max_mantissa = (max_c / denom + 0.5).floor() as i32;
        if max_mantissa == 1 << MANTISSA_BITS {
            denom *= 2.0;
            exponent += 1;
        }
        debug_assert!(exponent >= 0 && exponent < 32);

        let quantize = |c: Float| ((c / denom + 0.5).floor() as u32).min(MANTISSA_MASK);
        Self {
            data: quantize(r)
                | (quantize(g) << 9)
                | (quantize(b) << 18)
                | ((exponent as u32) << 27),
        }
    }

    pub fn to_vector(&self) -> Vector3f {
        let exponent = (self.data >> 27) as i32;
        let scale = ((exponent - EXPONENT_BIAS - MANTISSA_BITS) as Float).exp2();
        Vector3f::new(
            (self.data & MANTISSA_MASK) as Float * scale,
            ((self.data >> 9) & MANTISSA_MASK) as Float * scale,
            ((self.data >> 18) & MANTISSA_MASK) as Float * scale,
        )
    }
}
