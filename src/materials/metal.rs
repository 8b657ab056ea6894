// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFEvalResult, BSDFSampleRecord, EvaluationContext, EventType,
                        PdfDirection, SamplingContext, BSDF};
use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::materials::microfacet::fresnel_metal;
use crate::math::constants::{Float, Vector3f, COS_EPSILON};

/// Perfect mirror with conductor Fresnel.
pub struct MetalBSDF {
    id: String,
}

impl MetalBSDF {
    pub fn new(id: Option<String>) -> Self {
        Self { id: id.unwrap_or_else(|| generate_node_id("metal")) }
    }
}

impl ComputationNode for MetalBSDF {
    fn id(&self) -> &str {
        &self.id
    }
}

impl BSDF for MetalBSDF {
    fn short_name(&self) -> &'static str {
        "metal"
    }

    fn is_delta(&self) -> bool {
        true
    }

    fn sample(&self, ctx: &mut SamplingContext) -> Option<BSDFSampleRecord> {
        let wo = ctx.outgoing_dir;
        if wo.z < COS_EPSILON {
            return None;
        }

        let fresnel = fresnel_metal(wo.z, ctx.params.ior, ctx.params.k);
        Some(BSDFSampleRecord {
            incoming_dir: Vector3f::new(-wo.x, -wo.y, wo.z),
            weight: ctx.params.base_color * fresnel,
            pdf: 1.0,
            event: EventType::SPECULAR_REFLECTION,
        })
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
    use super::*;
    use crate::core::interaction::MaterialParams;
    use crate::materials::test_utils::sample_once;
    use crate::math::spectrum::RayColor;

    #[test]
    fn test_mirror_direction() {
        let bsdf = MetalBSDF::new(None);
        let mut params = MaterialParams::default();
        params.base_color = RayColor::one();
        let wo = Vector3f::new(0.3, -0.4, 0.8).normalize();
        let record = sample_once(&bsdf, &params, wo, Vector3f::new(0.1, 0.2, 0.3)).unwrap();
        assert!((record.incoming_dir.x + wo.x).abs() < 1e-6);
        assert!((record.incoming_dir.z - wo.z).abs() < 1e-6);
        assert!(record.event.is_specular());
        assert!(record.weight.max() <= 1.0 && record.weight.max() > 0.5);
    }
}
