// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f, FLOAT_MAX, INV_PI, INV_SQRT_2PI,
                             INV_SQUARE_2, SQUARE_2, TWO_PI};
use crate::math::numeric::{erf, erf_inv, sqr};

const MIN_ALPHA: Float = 1.0e-4;

/// Anisotropic GGX microsurface with a gaussian height distribution.
/// Every direction is expressed in the local frame where z is the macro normal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Microfacet {
    alpha_x: Float,
    alpha_y: Float,
}

impl Microfacet {
    /// `anisotropy` in [-1, 1] shrinks the roughness along one tangent axis.
    pub fn new(alpha: Float, anisotropy: Float) -> Self {
        let alpha = alpha.max(MIN_ALPHA);
        let anisotropy = anisotropy.max(-1.0).min(1.0);
        let (alpha_x, alpha_y) = if anisotropy >= 0.0 {
            (alpha, alpha * (1.0 - anisotropy))
        } else {
            (alpha * (1.0 + anisotropy), alpha)
        };
        Self { alpha_x: alpha_x.max(MIN_ALPHA), alpha_y: alpha_y.max(MIN_ALPHA) }
    }

    pub fn isotropic(alpha: Float) -> Self {
        Self::new(alpha, 0.0)
    }

    pub fn alpha_x(&self) -> Float {
        self.alpha_x
    }

    pub fn alpha_y(&self) -> Float {
        self.alpha_y
    }

    /// Normal distribution D(m).
    pub fn d(&self, m: &Vector3f) -> Float {
        if m.z <= 0.0 {
            return 0.0;
        }
        let x = m.x / self.alpha_x;
        let y = m.y / self.alpha_y;
        let denom = x * x + y * y + m.z * m.z;
        if denom <= 0.0 {
            return 0.0;
        }
        INV_PI / (self.alpha_x * self.alpha_y * denom * denom)
    }

    /// Density of `sample`, with respect to solid angle of the micro normal.
    pub fn pdf(&self, m: &Vector3f) -> Float {
        self.d(m) * m.z.max(0.0)
    }

    /// Samples a micro normal proportionally to D(m)·cos(θm).
    pub fn sample(&self, u: &Vector2f) -> Vector3f {
        let u1 = u.x.min(1.0 - 1.0e-6);
        let (sin_phi, cos_phi) = {
            let phi = TWO_PI * u.y;
            let v = Vector2f::new(self.alpha_x * phi.cos(), self.alpha_y * phi.sin());
            let len = v.norm();
            if len <= 0.0 {
                (0.0, 1.0)
            } else {
                (v.y / len, v.x / len)
            }
        };
        let inv_alpha2 = sqr(cos_phi / self.alpha_x) + sqr(sin_phi / self.alpha_y);
        let tan2_theta = u1 / ((1.0 - u1) * inv_alpha2);
        let cos_theta = 1.0 / (1.0 + tan2_theta).sqrt();
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        Vector3f::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
    }

    /// Smith masking for a direction with the given cosine, using the mean roughness.
    pub fn g1_smith(&self, cos_theta: Float) -> Float {
        let cos_theta = cos_theta.abs();
        if cos_theta >= 1.0 {
            return 1.0;
        }
        if cos_theta <= 0.0 {
            return 0.0;
        }
        let alpha2 = self.alpha_x * self.alpha_y;
        let tan2 = (1.0 - cos_theta * cos_theta) / (cos_theta * cos_theta);
        2.0 / (1.0 + (1.0 + alpha2 * tan2).sqrt())
    }

    /// Separable masking-shadowing.
    pub fn g(&self, n_dot_v: Float, n_dot_l: Float) -> Float {
        self.g1_smith(n_dot_v) * self.g1_smith(n_dot_l)
    }

    pub fn height_distribution_p1(h: Float) -> Float {
        INV_SQRT_2PI * (-0.5 * h * h).exp()
    }

    pub fn height_distribution_c1(h: Float) -> Float {
        (0.5 + 0.5 * erf(INV_SQUARE_2 * h)).max(0.0).min(1.0)
    }

    pub fn height_distribution_inv_c1(u: Float) -> Float {
        SQUARE_2 * erf_inv(2.0 * u - 1.0)
    }

    /// Roughness seen from the azimuth of `wi`.
    pub fn alpha_i(&self, wi: &Vector3f) -> Float {
        let sin2 = 1.0 - wi.z * wi.z;
        if sin2 <= 0.0 {
            return (0.5 * (sqr(self.alpha_x) + sqr(self.alpha_y))).sqrt();
        }
        let cos_phi2 = wi.x * wi.x / sin2;
        let sin_phi2 = wi.y * wi.y / sin2;
        (cos_phi2 * sqr(self.alpha_x) + sin_phi2 * sqr(self.alpha_y)).sqrt()
    }

    pub fn slope_distribution_lambda(&self, wi: &Vector3f) -> Float {
        if wi.z > 0.9999 {
            return 0.0;
        }
        if wi.z < -0.9999 {
            return -1.0;
        }
        let theta_i = wi.z.acos();
        let a = 1.0 / (theta_i.tan() * self.alpha_i(wi));
        0.5 * (-1.0 + a.signum() * (1.0 + 1.0 / (a * a)).sqrt())
    }

    pub fn slope_distribution_projected_area(&self, wi: &Vector3f) -> Float {
        if wi.z > 0.9999 {
            return 1.0;
        }
        if wi.z < -0.9999 {
            return 0.0;
        }
        let sin2 = 1.0 - wi.z * wi.z;
        let alpha_i = self.alpha_i(wi);
        0.5 * (wi.z + (wi.z * wi.z + sin2 * alpha_i * alpha_i).sqrt())
    }

    /// Distribution of normals visible from `wi`.
    pub fn d_wi(&self, wi: &Vector3f, m: &Vector3f) -> Float {
        if m.z <= 0.0 {
            return 0.0;
        }
        let projected_area = self.slope_distribution_projected_area(wi);
        if projected_area == 0.0 {
            return 0.0;
        }
        wi.dot(m).max(0.0) * self.d(m) / projected_area
    }

    /// Height-correlated masking of `wi` from height `h0`.
    pub fn g1(&self, wi: &Vector3f, h0: Float) -> Float {
        if wi.z > 0.9999 {
            return 1.0;
        }
        if wi.z <= 0.0 {
            return 0.0;
        }
        Self::height_distribution_c1(h0).powf(self.slope_distribution_lambda(wi))
    }

    /// Next height along `wr` starting from `hr`. `FLOAT_MAX` means the walk left the surface.
    pub fn sample_height(&self, wr: &Vector3f, hr: Float, u: Float) -> Float {
        if wr.z > 0.9999 {
            return FLOAT_MAX;
        }
        if wr.z < -0.9999 {
            let c = (u * Self::height_distribution_c1(hr)).max(0.0001).min(0.9999);
            return Self::height_distribution_inv_c1(c);
        }
        if wr.z.abs() < 0.0001 {
            return hr;
        }

        let g1 = self.g1(wr, hr);
        if u > 1.0 - g1 {
            return FLOAT_MAX;
        }

        let lambda = self.slope_distribution_lambda(wr);
        let c = Self::height_distribution_c1(hr) / (1.0 - u).powf(1.0 / lambda);
        Self::height_distribution_inv_c1(c.max(0.0001).min(0.9999))
    }

    pub fn eval_phase_function(&self, wi: &Vector3f, wo: &Vector3f) -> Float {
        let wh = wi + wo;
        if wh.norm_squared() <= 0.0 {
            return 0.0;
        }
        let wh = wh.normalize();
        if wh.z < 0.0 {
            return 0.0;
        }
        let denom = 4.0 * wi.dot(&wh);
        if denom <= 0.0 {
            return 0.0;
        }
        self.d_wi(wi, &wh) / denom
    }

    /// Visible slope sampling for the unit roughness configuration.
    pub fn sample_p22_11(theta_i: Float, u: Float, u_2: Float) -> Vector2f {
        if theta_i < 0.0001 {
            let r = (u / (1.0 - u)).sqrt();
            let phi = TWO_PI * u_2;
            return Vector2f::new(r * phi.cos(), r * phi.sin());
        }

        let (sin_theta_i, cos_theta_i) = theta_i.sin_cos();
        let tan_theta_i = sin_theta_i / cos_theta_i;

        let projected_area = 0.5 * (cos_theta_i + 1.0);
        if projected_area < 0.0001 || projected_area.is_nan() {
            return Vector2f::zeros();
        }
        let c = 1.0 / projected_area;

        let a = 2.0 * u / cos_theta_i / c - 1.0;
        let b = tan_theta_i;
        let tmp = 1.0 / (a * a - 1.0);

        let d = (b * b * tmp * tmp - (a * a - b * b) * tmp).max(0.0).sqrt();
        let slope_x_1 = b * tmp - d;
        let slope_x_2 = b * tmp + d;
        let slope_x = if a < 0.0 || slope_x_2 > 1.0 / tan_theta_i { slope_x_1 } else { slope_x_2 };

        let (s, u2) = if u_2 > 0.5 {
            (1.0, 2.0 * (u_2 - 0.5))
        } else {
            (-1.0, 2.0 * (0.5 - u_2))
        };
        let z = (u2 * (u2 * (u2 * 0.27385 - 0.73369) + 0.46341))
            / (u2 * (u2 * (u2 * 0.093073 + 0.309420) - 1.000000) + 0.597999);

        Vector2f::new(slope_x, s * z * (1.0 + slope_x * slope_x).sqrt())
    }

    /// Samples a micro normal from the distribution of normals visible from `wi`.
    pub fn sample_d(&self, wi: &Vector3f, u1: Float, u2: Float) -> Vector3f {
        let wi_11 = Vector3f::new(self.alpha_x * wi.x, self.alpha_y * wi.y, wi.z).normalize();
        let slope_11 = Self::sample_p22_11(wi_11.z.max(-1.0).min(1.0).acos(), u1, u2);

        let phi = wi_11.y.atan2(wi_11.x);
        let (sin_phi, cos_phi) = phi.sin_cos();
        let slope_x = self.alpha_x * (cos_phi * slope_11.x - sin_phi * slope_11.y);
        let slope_y = self.alpha_y * (sin_phi * slope_11.x + cos_phi * slope_11.y);

        if !slope_x.is_finite() || !slope_y.is_finite() {
            if wi.z > 0.0 {
                return Vector3f::new(0.0, 0.0, 1.0);
            }
            return Vector3f::new(wi.x, wi.y, 0.0).normalize();
        }

        Vector3f::new(-slope_x, -slope_y, 1.0).normalize()
    }
}

/// Mirrors `v` about `m`. Both point away from the surface.
pub fn reflect(v: &Vector3f, m: &Vector3f) -> Vector3f {
    2.0 * v.dot(m) * m - v
}

/// Refracts `v` (pointing away from the surface) through a boundary with normal `m`
/// and relative index `ior` (inside over outside). `None` on total internal reflection.
pub fn refract(v: &Vector3f, m: &Vector3f, ior: Float) -> Option<Vector3f> {
    let mut cos_i = v.dot(m);
    let (eta, n) = if cos_i >= 0.0 {
        (1.0 / ior, *m)
    } else {
        cos_i = -cos_i;
        (ior, -m)
    };
    let sin2_t = eta * eta * (1.0 - cos_i * cos_i).max(0.0);
    if sin2_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    Some((-eta * v + (eta * cos_i - cos_t) * n).normalize())
}

/// Unpolarized Fresnel reflectance. A negative cosine means the ray travels from the inside.
pub fn fresnel_dielectric(cos_i: Float, ior: Float) -> Float {
    let cos_i = cos_i.max(-1.0).min(1.0);
    let eta = if cos_i >= 0.0 { ior } else { 1.0 / ior };
    let cos_i = cos_i.abs();

    let sin2_t = (1.0 - cos_i * cos_i).max(0.0) / (eta * eta);
    if sin2_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let r_parl = (eta * cos_i - cos_t) / (eta * cos_i + cos_t);
    let r_perp = (cos_i - eta * cos_t) / (cos_i + eta * cos_t);
    0.5 * (r_parl * r_parl + r_perp * r_perp)
}

/// Conductor reflectance approximation with extinction coefficient `k`.
pub fn fresnel_metal(cos_i: Float, eta: Float, k: Float) -> Float {
    let cos_i = cos_i.abs().min(1.0);
    let one_minus = (1.0 - cos_i).powi(5);
    let num = sqr(eta - 1.0) + 4.0 * eta * one_minus + k * k;
    let den = sqr(eta + 1.0) + k * k;
    if den <= 0.0 {
        return 1.0;
    }
    (num / den).max(0.0).min(1.0)
}
