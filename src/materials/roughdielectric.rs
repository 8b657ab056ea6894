// Copyright @yucwang 2026

use crate::core::bsdf::{dispersed_ior, BSDFEvalResult, BSDFSampleRecord, EvaluationContext,
                        EventType, PdfDirection, SamplingContext, BSDF,
                        SPECULAR_EVENT_ROUGHNESS_THRESHOLD};
use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::materials::dielectric::DielectricBSDF;
use crate::materials::microfacet::{fresnel_dielectric, reflect, refract, Microfacet};
use crate::math::constants::{Float, Vector2f, Vector3f, COS_EPSILON};
use crate::math::numeric::sqr;
use crate::math::spectrum::RayColor;

/// Microfacet glass (GGX, Walter et al.).
pub struct RoughDielectricBSDF {
    id: String,
    smooth: DielectricBSDF,
}

impl RoughDielectricBSDF {
    pub fn new(id: Option<String>) -> Self {
        let id = id.unwrap_or_else(|| generate_node_id("roughDielectric"));
        Self { smooth: DielectricBSDF::new(Some(format!("{}_smooth", id))), id }
    }
}

impl ComputationNode for RoughDielectricBSDF {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("RoughDielectricBSDF [id={}]", self.id)
    }
}

struct HalfVector {
    m: Vector3f,
    v_dot_h: Float,
    l_dot_h: Float,
    eta: Float,
    reflection: bool,
}

/// Micro normal connecting `wo` and `wi`, oriented towards +z.
fn half_vector(wo: &Vector3f, wi: &Vector3f, ior: Float) -> Option<HalfVector> {
    let n_dot_v = wo.z;
    let n_dot_l = wi.z;
    let eta = if n_dot_v < 0.0 { ior } else { 1.0 / ior };
    let reflection = n_dot_v * n_dot_l >= 0.0;

    let m = if reflection { wo + wi } else { eta * wo + wi };
    if m.norm_squared() <= 0.0 {
        return None;
    }
    let m = (m * m.z.signum()).normalize();
    if m.z.abs() < COS_EPSILON {
        return None;
    }

    let v_dot_h = m.dot(wo);
    let l_dot_h = m.dot(wi);
    // Both directions must see the facet from their own side.
    if v_dot_h * n_dot_v <= 0.0 || l_dot_h * n_dot_l <= 0.0 {
        return None;
    }

    Some(HalfVector { m, v_dot_h, l_dot_h, eta, reflection })
}

fn event_pdf(microfacet: &Microfacet, h: &HalfVector, fresnel: Float) -> Float {
    if h.reflection {
        fresnel * microfacet.pdf(&h.m) / (4.0 * h.v_dot_h.abs())
    } else {
        let denom = sqr(h.eta * h.v_dot_h + h.l_dot_h);
        (1.0 - fresnel) * microfacet.pdf(&h.m) * h.l_dot_h.abs() / denom
    }
}

impl BSDF for RoughDielectricBSDF {
    fn short_name(&self) -> &'static str {
        "roughDielectric"
    }

    fn sample(&self, ctx: &mut SamplingContext) -> Option<BSDFSampleRecord> {
        let wo = ctx.outgoing_dir;
        let n_dot_v = wo.z;
        if n_dot_v.abs() < COS_EPSILON {
            return None;
        }

        let roughness = ctx.params.roughness;
        if roughness < SPECULAR_EVENT_ROUGHNESS_THRESHOLD {
            return self.smooth.sample(ctx);
        }

        let (ior, collapse) = dispersed_ior(ctx.params, ctx.wavelength);
        let fallback = if collapse {
            ctx.wavelength.is_single = true;
            ctx.wavelength.single_wavelength_fallback()
        } else {
            RayColor::one()
        };

        let microfacet = Microfacet::isotropic(roughness * roughness);
        let m = microfacet.sample(&Vector2f::new(ctx.sample.x, ctx.sample.y));
        let microfacet_pdf = microfacet.pdf(&m);
        let v_dot_h = m.dot(&wo);
        if v_dot_h * n_dot_v <= 0.0 || microfacet_pdf <= 0.0 {
            return None;
        }

        let fresnel = fresnel_dielectric(v_dot_h, ior);
        let reflection = ctx.sample.z < fresnel;

        let (incoming_dir, event) = if reflection {
            (reflect(&wo, &m), EventType::GLOSSY_REFLECTION)
        } else {
            (refract(&wo, &m, ior)?, EventType::GLOSSY_REFRACTION)
        };

        let n_dot_l = incoming_dir.z;
        if (n_dot_v * n_dot_l > 0.0) != reflection || n_dot_l.abs() < COS_EPSILON {
            // landed on the wrong side of the macro surface
            return None;
        }
        let l_dot_h = m.dot(&incoming_dir);

        let d = microfacet.d(&m);
        let g = microfacet.g(n_dot_v, n_dot_l);
        let mut weight = RayColor::splat(v_dot_h.abs() * g * d / (microfacet_pdf * n_dot_v.abs()));

        let pdf = if reflection {
            fresnel * microfacet_pdf / (4.0 * v_dot_h.abs())
        } else {
            let eta = if n_dot_v < 0.0 { ior } else { 1.0 / ior };
            let denom = sqr(eta * v_dot_h + l_dot_h);
            weight *= ctx.params.base_color;
            (1.0 - fresnel) * microfacet_pdf * l_dot_h.abs() / denom
        };

        if !(pdf > 0.0) {
            return None;
        }

        Some(BSDFSampleRecord { incoming_dir, weight: weight * fallback, pdf, event })
    }

    fn evaluate(&self, ctx: &mut EvaluationContext) -> BSDFEvalResult {
        let wo = ctx.outgoing_dir;
        let wi = ctx.incoming_dir;
        let n_dot_v = wo.z;
        let n_dot_l = wi.z;
        if n_dot_v.abs() < COS_EPSILON || n_dot_l.abs() < COS_EPSILON {
            return BSDFEvalResult::default();
        }

        let roughness = ctx.params.roughness;
        if roughness < SPECULAR_EVENT_ROUGHNESS_THRESHOLD {
            return BSDFEvalResult::default();
        }

        let (ior, collapse) = dispersed_ior(ctx.params, ctx.wavelength);
        let h = match half_vector(&wo, &wi, ior) {
            Some(h) => h,
            None => return BSDFEvalResult::default(),
        };

        let microfacet = Microfacet::isotropic(roughness * roughness);
        let fresnel = fresnel_dielectric(h.v_dot_h, ior);
        let d = microfacet.d(&h.m);
        let g = microfacet.g(n_dot_v, n_dot_l);

        let mut value = if h.reflection {
            RayColor::splat(fresnel * g * d / (4.0 * n_dot_v.abs()))
        } else {
            let denom = sqr(h.eta * h.v_dot_h + h.l_dot_h);
            ctx.params.base_color
                * ((h.v_dot_h * h.l_dot_h).abs() * (1.0 - fresnel) * g * d / (denom * n_dot_v.abs()))
        };
        if collapse {
            value *= ctx.wavelength.single_wavelength_fallback();
        }

        let pdf = event_pdf(&microfacet, &h, fresnel);
        debug_assert!(pdf >= 0.0);

        // TODO: derive the reverse density from the swapped half vector instead of reusing the forward one.
        BSDFEvalResult::new(value, pdf, pdf)
    }

    fn pdf(&self, ctx: &mut EvaluationContext, _dir: PdfDirection) -> Float {
        let wo = ctx.outgoing_dir;
        let wi = ctx.incoming_dir;
        if wo.z.abs() < COS_EPSILON || wi.z.abs() < COS_EPSILON {
            return 0.0;
        }

        let roughness = ctx.params.roughness;
        if roughness < SPECULAR_EVENT_ROUGHNESS_THRESHOLD {
            return 0.0;
        }

        let (ior, _) = dispersed_ior(ctx.params, ctx.wavelength);
        match half_vector(&wo, &wi, ior) {
            Some(h) => {
                let microfacet = Microfacet::isotropic(roughness * roughness);
                event_pdf(&microfacet, &h, fresnel_dielectric(h.v_dot_h, ior))
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interaction::MaterialParams;
    use crate::materials::test_utils::{assert_pdf_consistency, sample_once};

    #[test]
    fn test_pdf_consistency_from_both_sides() {
        let bsdf = RoughDielectricBSDF::new(None);
        let mut params = MaterialParams::default();
        params.roughness = 0.5;
        assert_pdf_consistency(&bsdf, &params, 3);
    }

    #[test]
    fn test_low_roughness_falls_back_to_smooth() {
        let bsdf = RoughDielectricBSDF::new(None);
        let mut params = MaterialParams::default();
        params.roughness = 0.001;
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let record = sample_once(&bsdf, &params, wo, Vector3f::new(0.5, 0.5, 0.1)).unwrap();
        assert!(record.event.is_specular());
    }

    #[test]
    fn test_transmission_crosses_the_surface() {
        let bsdf = RoughDielectricBSDF::new(None);
        let mut params = MaterialParams::default();
        params.roughness = 0.3;
        let wo = Vector3f::new(0.1, 0.2, 0.95).normalize();
        let record = sample_once(&bsdf, &params, wo, Vector3f::new(0.3, 0.7, 0.99)).unwrap();
        assert_eq!(record.event, EventType::GLOSSY_REFRACTION);
        assert!(record.incoming_dir.z < 0.0);
        assert!(record.weight.is_valid());
    }
}
