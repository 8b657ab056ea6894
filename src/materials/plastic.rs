// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFEvalResult, BSDFSampleRecord, EvaluationContext, EventType,
                        PdfDirection, SamplingContext, BSDF};
use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::interaction::MaterialParams;
use crate::materials::microfacet::fresnel_dielectric;
use crate::math::constants::{Float, Vector2f, Vector3f, COS_EPSILON, INV_PI};
use crate::math::spectrum::RayColor;
use crate::math::warp::sample_cosine_hemisphere;

/// Smooth dielectric coat over a diffuse base.
pub struct PlasticBSDF {
    id: String,
}

impl PlasticBSDF {
    pub fn new(id: Option<String>) -> Self {
        Self { id: id.unwrap_or_else(|| generate_node_id("plastic")) }
    }
}

impl ComputationNode for PlasticBSDF {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("PlasticBSDF [id={}]", self.id)
    }
}

/// Probability of picking the coat reflection. Shared with the rough variant.
pub(crate) fn specular_probability(params: &MaterialParams, fresnel_in: Float) -> Float {
    let specular_weight = fresnel_in;
    let diffuse_weight = (1.0 - fresnel_in) * params.base_color.max();
    debug_assert!(diffuse_weight >= 0.0);
    let total = specular_weight + diffuse_weight;
    if total <= 0.0 {
        return 1.0;
    }
    specular_weight / total
}

impl BSDF for PlasticBSDF {
    fn short_name(&self) -> &'static str {
        "plastic"
    }

    fn sample(&self, ctx: &mut SamplingContext) -> Option<BSDFSampleRecord> {
        let wo = ctx.outgoing_dir;
        let n_dot_v = wo.z;
        if n_dot_v < COS_EPSILON {
            return None;
        }

        let ior = ctx.params.ior;
        let fresnel_in = fresnel_dielectric(n_dot_v, ior);
        let specular_p = specular_probability(ctx.params, fresnel_in);

        if ctx.sample.z < specular_p {
            return Some(BSDFSampleRecord {
                incoming_dir: Vector3f::new(-wo.x, -wo.y, wo.z),
                weight: RayColor::splat(fresnel_in / specular_p),
                pdf: specular_p,
                event: EventType::SPECULAR_REFLECTION,
            });
        }

        let diffuse_p = 1.0 - specular_p;
        let incoming_dir = sample_cosine_hemisphere(&Vector2f::new(ctx.sample.x, ctx.sample.y));
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
        let n_dot_v = ctx.outgoing_dir.z;
        let n_dot_l = ctx.incoming_dir.z;
        if n_dot_v < COS_EPSILON || n_dot_l < COS_EPSILON {
            return BSDFEvalResult::default();
        }

        let ior = ctx.params.ior;
        let fresnel_in = fresnel_dielectric(n_dot_v, ior);
        let fresnel_out = fresnel_dielectric(n_dot_l, ior);
        let diffuse_p = 1.0 - specular_probability(ctx.params, fresnel_in);

        let value = ctx.params.base_color * (n_dot_l * INV_PI * (1.0 - fresnel_in) * (1.0 - fresnel_out));
        BSDFEvalResult::new(value, n_dot_l * INV_PI * diffuse_p, n_dot_v * INV_PI * diffuse_p)
    }

    fn pdf(&self, ctx: &mut EvaluationContext, dir: PdfDirection) -> Float {
        let n_dot_v = ctx.outgoing_dir.z;
        let n_dot_l = ctx.incoming_dir.z;
        if n_dot_v < COS_EPSILON || n_dot_l < COS_EPSILON {
            return 0.0;
        }

        let fresnel_in = fresnel_dielectric(n_dot_v, ctx.params.ior);
        let diffuse_p = 1.0 - specular_probability(ctx.params, fresnel_in);
        match dir {
            PdfDirection::Forward => n_dot_l * INV_PI * diffuse_p,
            PdfDirection::Reverse => n_dot_v * INV_PI * diffuse_p,
        }
    }
}
