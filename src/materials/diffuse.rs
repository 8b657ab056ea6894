// Copyright @yucwang 2023

use crate::core::bsdf::{BSDFEvalResult, BSDFSampleRecord, EvaluationContext, EventType,
                        PdfDirection, SamplingContext, BSDF};
use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::math::constants::{Float, Vector2f, COS_EPSILON, INV_PI};
use crate::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};

/// Lambertian reflector.
pub struct DiffuseBSDF {
    id: String,
}

impl DiffuseBSDF {
    pub fn new(id: Option<String>) -> Self {
        Self { id: id.unwrap_or_else(|| generate_node_id("diffuse")) }
    }
}

impl ComputationNode for DiffuseBSDF {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("DiffuseBSDF [id={}]", self.id)
    }
}

impl BSDF for DiffuseBSDF {
    fn short_name(&self) -> &'static str {
        "diffuse"
    }

    fn sample(&self, ctx: &mut SamplingContext) -> Option<BSDFSampleRecord> {
        if ctx.outgoing_dir.z < COS_EPSILON {
            return None;
        }

        let incoming_dir = sample_cosine_hemisphere(&Vector2f::new(ctx.sample.x, ctx.sample.y));
        let pdf = sample_cosine_hemisphere_pdf(incoming_dir.z);
        if pdf <= 0.0 {
            return None;
        }

        Some(BSDFSampleRecord {
            incoming_dir,
            weight: ctx.params.base_color,
            pdf,
            event: EventType::DIFFUSE_REFLECTION,
        })
    }

    fn evaluate(&self, ctx: &mut EvaluationContext) -> BSDFEvalResult {
        let n_dot_v = ctx.outgoing_dir.z;
        let n_dot_l = ctx.incoming_dir.z;
        if n_dot_v < COS_EPSILON || n_dot_l < COS_EPSILON {
            return BSDFEvalResult::default();
        }

        BSDFEvalResult::new(ctx.params.base_color * (n_dot_l * INV_PI),
                            n_dot_l * INV_PI,
                            n_dot_v * INV_PI)
    }

    fn pdf(&self, ctx: &mut EvaluationContext, dir: PdfDirection) -> Float {
        let n_dot_v = ctx.outgoing_dir.z;
        let n_dot_l = ctx.incoming_dir.z;
        if n_dot_v < COS_EPSILON || n_dot_l < COS_EPSILON {
            return 0.0;
        }

        match dir {
            PdfDirection::Forward => n_dot_l * INV_PI,
            PdfDirection::Reverse => n_dot_v * INV_PI,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DiffuseBSDF;
    use crate::materials::test_utils::{assert_pdf_consistency, sample_once};
    use crate::core::interaction::MaterialParams;
    use crate::math::constants::Vector3f;
    use crate::math::spectrum::RayColor;

    #[test]
    fn test_sample_weight_is_albedo() {
        let bsdf = DiffuseBSDF::new(None);
        let mut params = MaterialParams::default();
        params.base_color = RayColor::new(0.2, 0.4, 0.6);
        let wo = Vector3f::new(0.3, 0.1, 0.9).normalize();
        let record = sample_once(&bsdf, &params, wo, Vector3f::new(0.3, 0.6, 0.5)).unwrap();
        assert_eq!(record.weight, params.base_color);
        assert!(record.incoming_dir.z > 0.0);
    }

    #[test]
    fn test_below_surface_is_no_event() {
        let bsdf = DiffuseBSDF::new(None);
        let params = MaterialParams::default();
        let wo = Vector3f::new(0.0, 0.3, -0.9).normalize();
        assert!(sample_once(&bsdf, &params, wo, Vector3f::new(0.3, 0.6, 0.5)).is_none());
    }

    #[test]
    fn test_pdf_consistency() {
        let bsdf = DiffuseBSDF::new(None);
        assert_pdf_consistency(&bsdf, &MaterialParams::default(), 1);
    }
}
