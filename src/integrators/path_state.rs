// Copyright @yucwang 2026

use crate::core::bsdf::EventType;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RayColor, Wavelength};

/// Balance heuristic applied to a single density.
#[inline]
pub fn mis(pdf: Float) -> Float {
    pdf
}

/// Weight of the technique with density `sample_pdf` against one competitor.
#[inline]
pub fn combine_mis(sample_pdf: Float, other_pdf: Float) -> Float {
    let denom = mis(sample_pdf) + mis(other_pdf);
    if denom <= 0.0 {
        return 0.0;
    }
    mis(sample_pdf) / denom
}

#[inline]
pub fn pdf_w_to_a(pdf_w: Float, distance: Float, cos_there: Float) -> Float {
    pdf_w * cos_there.abs() / (distance * distance)
}

#[inline]
pub fn pdf_a_to_w(pdf_a: Float, distance: Float, cos_there: Float) -> Float {
    pdf_a * distance * distance / cos_there.abs()
}

/// Survival probability of the Russian roulette at a vertex.
pub fn russian_roulette_threshold(base_color: &RayColor, wavelength: &Wavelength) -> Float {
    const MIN_COLOR_VALUE: Float = 0.125;
    let threshold = MIN_COLOR_VALUE + (1.0 - MIN_COLOR_VALUE) * base_color.max();
    if wavelength.is_single {
        threshold / Wavelength::NUM_COMPONENTS as Float
    } else {
        threshold
    }
}

/// State of a camera or light sub-path between two bounces.
///
/// `d_vc`, `d_vm` and `d_vcm` carry the partial MIS quantities of the vertex
/// connection and merging estimators, so the weight of a full path can be
/// computed locally without walking its history.
#[derive(Debug, Copy, Clone)]
pub struct PathState {
    pub ray: Ray3f,
    pub throughput: RayColor,
    pub d_vc: Float,
    pub d_vm: Float,
    pub d_vcm: Float,
    /// Number of segments traced so far, starting at 1.
    pub length: u32,
    pub last_specular: bool,
    pub is_finite_light: bool,
    pub last_pdf_w: Float,
    pub last_event: EventType,
}

impl PathState {
    pub fn new(ray: Ray3f) -> Self {
        Self {
            ray,
            throughput: RayColor::one(),
            d_vc: 0.0,
            d_vm: 0.0,
            d_vcm: 0.0,
            length: 1,
            last_specular: true,
            is_finite_light: false,
            last_pdf_w: 1.0,
            last_event: EventType::empty(),
        }
    }

    /// Turns the solid angle quantities of the previous vertex into area
    /// quantities at the vertex just hit.
    pub fn update_after_hit(&mut self, distance: Float, cos_theta: Float, scale_by_distance: bool) {
        if scale_by_distance {
            self.d_vcm *= mis(distance * distance);
        }
        let inv_cos = 1.0 / mis(cos_theta.abs().max(1.0e-8));
        self.d_vcm *= inv_cos;
        self.d_vc *= inv_cos;
        self.d_vm *= inv_cos;
    }

    /// Updates the MIS quantities after sampling a new direction.
    /// `cos_theta_out` is taken at the vertex the path leaves.
    pub fn update_after_scatter(&mut self, cos_theta_out: Float, pdf_w: Float, reverse_pdf_w: Float,
                                event: EventType, vm_weight_factor: Float, vc_weight_factor: Float) {
        let cos_theta_out = cos_theta_out.abs();
        if event.is_specular() {
            self.d_vc *= mis(cos_theta_out);
            self.d_vm *= mis(cos_theta_out);
            self.d_vcm = 0.0;
            self.last_specular = true;
        } else {
            let factor = mis(cos_theta_out / pdf_w);
            self.d_vc = factor * (self.d_vc * mis(reverse_pdf_w) + self.d_vcm + vm_weight_factor);
            self.d_vm = factor * (self.d_vm * mis(reverse_pdf_w) + self.d_vcm * vc_weight_factor + 1.0);
            self.d_vcm = mis(1.0 / pdf_w);
            self.last_specular = false;
        }
        self.last_pdf_w = pdf_w;
        self.last_event = event;
        self.length += 1;
        self.debug_check();
    }

    pub fn is_valid(&self) -> bool {
        [self.d_vc, self.d_vm, self.d_vcm].iter().all(|v| v.is_finite() && *v >= 0.0)
    }

    #[inline]
    pub fn debug_check(&self) {
        debug_assert!(self.is_valid(), "invalid MIS state {:?}", self);
    }

    pub fn position_at(&self, distance: Float) -> Vector3f {
        self.ray.at(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ray() -> Ray3f {
        Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None)
    }

    proptest! {
        #[test]
        fn test_combine_mis_is_bounded(a in 0.0f32..1.0e6, b in 0.0f32..1.0e6) {
            let w = combine_mis(a, b);
            prop_assert!(w >= 0.0 && w <= 1.0);
            prop_assert!((combine_mis(a, b) + combine_mis(b, a) - 1.0).abs() < 1e-4 || a + b == 0.0);
        }

        #[test]
        fn test_combine_mis_without_competitor(a in 1.0e-6f32..1.0e6) {
            prop_assert_eq!(combine_mis(a, 0.0), 1.0);
        }
    }

    #[test]
    fn test_specular_scatter_drops_vcm() {
        let mut state = PathState::new(ray());
        state.d_vc = 2.0;
        state.d_vcm = 5.0;
        state.update_after_scatter(0.5, 1.0, 1.0, EventType::SPECULAR_REFLECTION, 1.0, 1.0);
        assert_eq!(state.d_vcm, 0.0);
        assert_eq!(state.d_vc, 1.0);
        assert!(state.last_specular);
        assert_eq!(state.length, 2);
    }

    #[test]
    fn test_diffuse_scatter_stays_valid() {
        let mut state = PathState::new(ray());
        state.d_vcm = 1.0;
        state.update_after_hit(2.0, 0.5, true);
        assert!((state.d_vcm - 8.0).abs() < 1e-5);
        state.update_after_scatter(0.7, 0.3, 0.2, EventType::DIFFUSE_REFLECTION, 0.5, 2.0);
        assert!(state.is_valid());
        assert!((state.d_vcm - 1.0 / 0.3).abs() < 1e-4);
        assert!(!state.last_specular);
    }

    #[test]
    fn test_russian_roulette_threshold() {
        let mut wavelength = Wavelength::default();
        let white = RayColor::one();
        assert_eq!(russian_roulette_threshold(&white, &wavelength), 1.0);
        assert_eq!(russian_roulette_threshold(&RayColor::zero(), &wavelength), 0.125);
        wavelength.is_single = true;
        assert!((russian_roulette_threshold(&white, &wavelength) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_area_and_solid_angle_densities_are_inverse() {
        let pdf_a = pdf_w_to_a(0.7, 3.0, 0.4);
        assert!((pdf_a_to_w(pdf_a, 3.0, 0.4) - 0.7).abs() < 1e-6);
    }
}
