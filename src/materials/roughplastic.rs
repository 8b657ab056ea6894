// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFEvalResult, BSDFSampleRecord, EvaluationContext, EventType,
                        PdfDirection, SamplingContext, BSDF, SPECULAR_EVENT_ROUGHNESS_THRESHOLD};
use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::materials::microfacet::{fresnel_dielectric, reflect, Microfacet};
use crate::materials::plastic::{specular_probability, PlasticBSDF};
use crate::math::constants::{Float, Vector2f, Vector3f, COS_EPSILON, INV_PI};
use crate::math::spectrum::RayColor;
use crate::math::warp::sample_cosine_hemisphere;

/// Rough dielectric coat over a diffuse base.
pub struct RoughPlasticBSDF {
    id: String,
    smooth: PlasticBSDF,
}

impl RoughPlasticBSDF {
    pub fn new(id: Option<String>) -> Self {
        let id = id.unwrap_or_else(|| generate_node_id("roughPlastic"));
        Self { smooth: PlasticBSDF::new(Some(format!("{}_smooth", id))), id }
    }
}

impl ComputationNode for RoughPlasticBSDF {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Density of the coat lobe only.
fn specular_pdf(microfacet: &Microfacet, wo: &Vector3f, wi: &Vector3f) -> Float {
    let m = (wo + wi).normalize();
    let v_dot_h = m.dot(wo);
    if v_dot_h < COS_EPSILON {
        return 0.0;
    }
    microfacet.pdf(&m) / (4.0 * v_dot_h)
}

impl BSDF for RoughPlasticBSDF {
    fn short_name(&self) -> &'static str {
        "roughPlastic"
    }

    fn sample(&self, ctx: &mut SamplingContext) -> Option<BSDFSampleRecord> {
        let wo = ctx.outgoing_dir;
        let n_dot_v = wo.z;
        if n_dot_v < COS_EPSILON {
            return None;
        }

        let roughness = ctx.params.roughness;
        if roughness < SPECULAR_EVENT_ROUGHNESS_THRESHOLD {
            return self.smooth.sample(ctx);
        }

        let ior = ctx.params.ior;
        let fresnel_in = fresnel_dielectric(n_dot_v, ior);
        let specular_p = specular_probability(ctx.params, fresnel_in);
        let diffuse_p = 1.0 - specular_p;
        let u = Vector2f::new(ctx.sample.x, ctx.sample.y);

        if ctx.sample.z < specular_p {
            let microfacet = Microfacet::isotropic(roughness * roughness);
            let m = microfacet.sample(&u);
            let incoming_dir = reflect(&wo, &m);

            let n_dot_l = incoming_dir.z;
            let v_dot_h = m.dot(&wo);
            if n_dot_l < COS_EPSILON || v_dot_h < COS_EPSILON {
                return None;
            }

            let pdf = microfacet.pdf(&m);
            let d = microfacet.d(&m);
            let g = microfacet.g(n_dot_v, n_dot_l);
            let fresnel = fresnel_dielectric(v_dot_h, ior);

            let record = BSDFSampleRecord {
                incoming_dir,
                weight: RayColor::splat(v_dot_h * fresnel * g * d / (pdf * n_dot_v * specular_p)),
                pdf: pdf / (4.0 * v_dot_h) * specular_p,
                event: EventType::GLOSSY_REFLECTION,
            };
            debug_assert!(record.pdf > 0.0);
            debug_assert!(record.weight.is_valid());
            return Some(record);
        }

        let incoming_dir = sample_cosine_hemisphere(&u);
        let n_dot_l = incoming_dir.z;
        if n_dot_l < COS_EPSILON {
            return None;
        }
        let fresnel_out = fresnel_dielectric(n_dot_l, ior);

        Some(BSDFSampleRecord {
            incoming_dir,
            weight: ctx.params.base_color * ((1.0 - fresnel_in) * (1.0 - fresnel_out) / diffuse_p),
            pdf: n_dot_l * INV_PI * diffuse_p,
            event: EventType::DIFFUSE_REFLECTION,
        })
    }

    fn evaluate(&self, ctx: &mut EvaluationContext) -> BSDFEvalResult {
        let roughness = ctx.params.roughness;
        if roughness < SPECULAR_EVENT_ROUGHNESS_THRESHOLD {
            return self.smooth.evaluate(ctx);
        }

        let wo = ctx.outgoing_dir;
        let wi = ctx.incoming_dir;
        let n_dot_v = wo.z;
        let n_dot_l = wi.z;
        if n_dot_v < COS_EPSILON || n_dot_l < COS_EPSILON {
            return BSDFEvalResult::default();
        }

        let ior = ctx.params.ior;
        let fresnel_in = fresnel_dielectric(n_dot_v, ior);
        let fresnel_out = fresnel_dielectric(n_dot_l, ior);
        let specular_p = specular_probability(ctx.params, fresnel_in);
        let diffuse_p = 1.0 - specular_p;

        let diffuse_term = ctx.params.base_color * (n_dot_l * INV_PI * (1.0 - fresnel_in) * (1.0 - fresnel_out));

        let microfacet = Microfacet::isotropic(roughness * roughness);
        let m = (wo + wi).normalize();
        let v_dot_h = m.dot(&wo);
        let (specular_term, spec_pdf) = if v_dot_h >= COS_EPSILON {
            let d = microfacet.d(&m);
            let g = microfacet.g(n_dot_v, n_dot_l);
            let fresnel = fresnel_dielectric(v_dot_h, ior);
            (RayColor::splat(fresnel * g * d / (4.0 * n_dot_v)), specular_pdf(&microfacet, &wo, &wi))
        } else {
            (RayColor::zero(), 0.0)
        };

        BSDFEvalResult::new(diffuse_term + specular_term,
                            n_dot_l * INV_PI * diffuse_p + spec_pdf * specular_p,
                            n_dot_v * INV_PI * diffuse_p + spec_pdf * specular_p)
    }

    fn pdf(&self, ctx: &mut EvaluationContext, dir: PdfDirection) -> Float {
        let roughness = ctx.params.roughness;
        if roughness < SPECULAR_EVENT_ROUGHNESS_THRESHOLD {
            return self.smooth.pdf(ctx, dir);
        }

        let wo = ctx.outgoing_dir;
        let wi = ctx.incoming_dir;
        if wo.z < COS_EPSILON || wi.z < COS_EPSILON {
            return 0.0;
        }

        let fresnel_in = fresnel_dielectric(wo.z, ctx.params.ior);
        let specular_p = specular_probability(ctx.params, fresnel_in);
        let diffuse_pdf = match dir {
            PdfDirection::Forward => wi.z * INV_PI,
            PdfDirection::Reverse => wo.z * INV_PI,
        };

        let microfacet = Microfacet::isotropic(roughness * roughness);
        diffuse_pdf * (1.0 - specular_p) + specular_pdf(&microfacet, &wo, &wi) * specular_p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interaction::MaterialParams;
    use crate::materials::test_utils::{assert_pdf_consistency_mixture, evaluate_once};

    #[test]
    fn test_pdf_consistency() {
        let bsdf = RoughPlasticBSDF::new(None);
        let mut params = MaterialParams::default();
        params.roughness = 0.35;
        params.base_color = RayColor::new(0.8, 0.3, 0.1);
        assert_pdf_consistency_mixture(&bsdf, &params, 31);
    }

    #[test]
    fn test_reverse_pdf_swaps_diffuse_cosine() {
        let bsdf = RoughPlasticBSDF::new(None);
        let mut params = MaterialParams::default();
        params.roughness = 0.35;
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let wi = Vector3f::new(0.8, 0.0, 0.6);
        let eval = evaluate_once(&bsdf, &params, wo, wi);
        assert!(eval.reverse_pdf_w > eval.direct_pdf_w);
    }
}
