// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFEvalResult, BSDFSampleRecord, EvaluationContext, PdfDirection,
                        SamplingContext, BSDF};
use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::math::constants::Float;

/// Absorbs everything. Marks medium boundaries and light-only geometry.
pub struct NullBSDF {
    id: String,
}

impl NullBSDF {
    pub fn new(id: Option<String>) -> Self {
        Self {
            id: id.unwrap_or_else(|| generate_node_id("null")),
        }
    }
}

impl ComputationNode for NullBSDF {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("NullBSDF [id={}]", self.id)
    }
}

impl BSDF for NullBSDF {
    fn short_name(&self) -> &'static str {
        "null"
    }

    fn sample(&self, _ctx: &mut SamplingContext) -> Option<BSDFSampleRecord> {
        None
    }

    fn evaluate(&self, _ctx: &mut EvaluationContext) -> BSDFEvalResult {
        BSDFEvalResult::default()
    }

    fn pdf(&self, _ctx: &mut EvaluationContext, _dir: PdfDirection) -> Float {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::NullBSDF;
    use crate::core::bsdf::{PdfDirection, BSDF};
    use crate::core::interaction::MaterialParams;
    use crate::core::rng::LcgRng;
    use crate::materials::test_utils::{evaluate_once, sample_once};
    use crate::math::constants::Vector3f;
    use crate::math::warp::sample_uniform_sphere;

    #[test]
    fn test_never_scatters() {
        let bsdf = NullBSDF::new(None);
        let params = MaterialParams::default();
        let mut rng = LcgRng::new(4);
        for _ in 0..128 {
            let wo = sample_uniform_sphere(&rng.next_vec2());
            let wi = sample_uniform_sphere(&rng.next_vec2());
            assert!(sample_once(&bsdf, &params, wo, rng.next_vec3()).is_none());

            let eval = evaluate_once(&bsdf, &params, wo, wi);
            assert!(eval.value.is_black());
            assert_eq!(eval.direct_pdf_w, 0.0);
            assert_eq!(eval.reverse_pdf_w, 0.0);
        }
    }

    #[test]
    fn test_pdf_is_zero() {
        let bsdf = NullBSDF::new(None);
        let params = MaterialParams::default();
        let wavelength = Default::default();
        let mut rng = LcgRng::new(0);
        let mut ctx = crate::core::bsdf::EvaluationContext {
            params: &params,
            outgoing_dir: Vector3f::new(0.0, 0.0, 1.0),
            incoming_dir: Vector3f::new(0.0, 0.0, -1.0),
            wavelength: &wavelength,
            rng: &mut rng,
        };
        assert_eq!(bsdf.pdf(&mut ctx, PdfDirection::Forward), 0.0);
        assert_eq!(bsdf.pdf(&mut ctx, PdfDirection::Reverse), 0.0);
    }
}
