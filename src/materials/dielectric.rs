// Copyright @yucwang 2026

use crate::core::bsdf::{dispersed_ior, BSDFEvalResult, BSDFSampleRecord, EvaluationContext,
                        EventType, PdfDirection, SamplingContext, BSDF};
use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::materials::microfacet::{fresnel_dielectric, refract};
use crate::math::constants::{Float, Vector3f, COS_EPSILON};
use crate::math::spectrum::RayColor;

/// Minimum probability of picking the reflection branch. Keeps thin
/// reflection fringes from turning into fireflies.
pub const MIN_REFLECTION_PROBABILITY: Float = 0.25;

/// Smooth glass interface.
pub struct DielectricBSDF {
    id: String,
}

impl DielectricBSDF {
    pub fn new(id: Option<String>) -> Self {
        Self { id: id.unwrap_or_else(|| generate_node_id("dielectric")) }
    }
}

impl ComputationNode for DielectricBSDF {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("DielectricBSDF [id={}]", self.id)
    }
}

/// Probability of sampling reflection given the Fresnel term.
pub fn reflection_probability(fresnel: Float) -> Float {
    if fresnel >= 1.0 {
        1.0
    } else {
        fresnel.max(MIN_REFLECTION_PROBABILITY)
    }
}

impl BSDF for DielectricBSDF {
    fn short_name(&self) -> &'static str {
        "dielectric"
    }

    fn is_delta(&self) -> bool {
        true
    }

    fn sample(&self, ctx: &mut SamplingContext) -> Option<BSDFSampleRecord> {
        let n_dot_v = ctx.outgoing_dir.z;
        if n_dot_v.abs() < COS_EPSILON {
            return None;
        }

        let (ior, collapse) = dispersed_ior(ctx.params, ctx.wavelength);
        let fallback = if collapse {
            ctx.wavelength.is_single = true;
            ctx.wavelength.single_wavelength_fallback()
        } else {
            RayColor::one()
        };

        let fresnel = fresnel_dielectric(n_dot_v, ior);
        let p = reflection_probability(fresnel);

        let mut record = if ctx.sample.z < p {
            let wo = ctx.outgoing_dir;
            BSDFSampleRecord {
                incoming_dir: Vector3f::new(-wo.x, -wo.y, wo.z),
                weight: RayColor::splat(fresnel / p),
                pdf: p,
                event: EventType::SPECULAR_REFLECTION,
            }
        } else {
            let incoming_dir = refract(&ctx.outgoing_dir, &Vector3f::new(0.0, 0.0, 1.0), ior)?;
            BSDFSampleRecord {
                incoming_dir,
                weight: ctx.params.base_color * ((1.0 - fresnel) / (1.0 - p)),
                pdf: 1.0 - p,
                event: EventType::SPECULAR_REFRACTION,
            }
        };

        record.weight *= fallback;
        Some(record)
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
    use crate::core::rng::LcgRng;
    use crate::materials::test_utils::sample_once;
    use crate::math::spectrum::Wavelength;

    fn assert_close(a: Float, b: Float) {
        assert!((a - b).abs() < 1e-5, "expected {} ≈ {}", a, b);
    }

    #[test]
    fn test_normal_incidence_reflection_weight() {
        let bsdf = DielectricBSDF::new(None);
        let params = MaterialParams::default();
        let wo = Vector3f::new(0.0, 0.0, 1.0);

        let f = fresnel_dielectric(1.0, 1.5);
        assert_close(f, 0.04);

        let record = sample_once(&bsdf, &params, wo, Vector3f::new(0.5, 0.5, 0.1)).unwrap();
        assert_eq!(record.event, EventType::SPECULAR_REFLECTION);
        let p = reflection_probability(f);
        assert_close(p, 0.25);
        assert_close(record.pdf, p);
        assert_close(record.weight[0], f / p);
        assert_close(record.weight[1], f / p);
    }

    #[test]
    fn test_transmission_branch() {
        let bsdf = DielectricBSDF::new(None);
        let mut params = MaterialParams::default();
        params.base_color = RayColor::one();
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let record = sample_once(&bsdf, &params, wo, Vector3f::new(0.5, 0.5, 0.9)).unwrap();
        assert_eq!(record.event, EventType::SPECULAR_REFRACTION);
        assert_close(record.incoming_dir.z, -1.0);
        assert_close(record.weight[0], 0.96 / 0.75);
    }

    #[test]
    fn test_total_internal_reflection() {
        let bsdf = DielectricBSDF::new(None);
        let params = MaterialParams::default();
        // Grazing from inside the glass.
        let wo = Vector3f::new(0.9, 0.0, -0.2).normalize();
        let record = sample_once(&bsdf, &params, wo, Vector3f::new(0.5, 0.5, 0.99)).unwrap();
        assert_eq!(record.event, EventType::SPECULAR_REFLECTION);
        assert_close(record.weight[0], 1.0);
        assert!(record.incoming_dir.z < 0.0);
    }

    #[test]
    fn test_dispersion_collapses_wavelength() {
        let bsdf = DielectricBSDF::new(None);
        let mut params = MaterialParams::default();
        params.dispersion.enable = true;
        params.base_color = RayColor::one();
        let mut wavelength = Wavelength::new(0.5);
        let mut rng = LcgRng::new(0);
        let mut ctx = SamplingContext {
            params: &params,
            outgoing_dir: Vector3f::new(0.0, 0.0, 1.0),
            sample: Vector3f::new(0.5, 0.5, 0.9),
            wavelength: &mut wavelength,
            rng: &mut rng,
        };
        let record = bsdf.sample(&mut ctx).unwrap();
        assert!(wavelength.is_single);
        assert_eq!(record.weight[0], 0.0);
        assert!(record.weight[1] > 0.0);
        assert_eq!(record.weight[2], 0.0);
    }
}
