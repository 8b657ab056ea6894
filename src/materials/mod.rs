// Copyright @yucwang 2026

pub mod dielectric;
pub mod diffuse;
pub mod metal;
pub mod microfacet;
pub mod null;
pub mod plastic;
pub mod roughdielectric;
pub mod roughmetal;
pub mod roughplastic;

use crate::core::bsdf::BSDF;
use crate::core::error::RenderError;

use self::dielectric::DielectricBSDF;
use self::diffuse::DiffuseBSDF;
use self::metal::MetalBSDF;
use self::null::NullBSDF;
use self::plastic::PlasticBSDF;
use self::roughdielectric::RoughDielectricBSDF;
use self::roughmetal::RoughMetalBSDF;
use self::roughplastic::RoughPlasticBSDF;

pub const BSDF_NAMES: [&str; 8] = [
    "null", "diffuse", "dielectric", "roughDielectric",
    "metal", "roughMetal", "plastic", "roughPlastic",
];

/// Builds a BSDF from its short name.
pub fn create_bsdf(name: &str) -> Result<Box<dyn BSDF>, RenderError> {
    let bsdf: Box<dyn BSDF> = match name {
        "null" => Box::new(NullBSDF::new(None)),
        "diffuse" => Box::new(DiffuseBSDF::new(None)),
        "dielectric" => Box::new(DielectricBSDF::new(None)),
        "roughDielectric" => Box::new(RoughDielectricBSDF::new(None)),
        "metal" => Box::new(MetalBSDF::new(None)),
        "roughMetal" => Box::new(RoughMetalBSDF::new(None)),
        "plastic" => Box::new(PlasticBSDF::new(None)),
        "roughPlastic" => Box::new(RoughPlasticBSDF::new(None)),
        _ => return Err(RenderError::UnknownBsdf(name.to_string())),
    };
    Ok(bsdf)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::core::bsdf::{BSDFEvalResult, BSDFSampleRecord, EvaluationContext, PdfDirection,
                            SamplingContext, BSDF};
    use crate::core::interaction::MaterialParams;
    use crate::core::rng::LcgRng;
    use crate::math::constants::{Float, Vector3f};
    use crate::math::spectrum::Wavelength;
    use crate::math::warp::sample_uniform_sphere;

    pub fn sample_once(bsdf: &dyn BSDF, params: &MaterialParams,
                       wo: Vector3f, u: Vector3f) -> Option<BSDFSampleRecord> {
        let mut wavelength = Wavelength::default();
        let seed = (u.x.to_bits() as u64) << 32 | u.y.to_bits() as u64;
        let mut rng = LcgRng::new(seed);
        let mut ctx = SamplingContext {
            params,
            outgoing_dir: wo,
            sample: u,
            wavelength: &mut wavelength,
            rng: &mut rng,
        };
        bsdf.sample(&mut ctx)
    }

    pub fn evaluate_once(bsdf: &dyn BSDF, params: &MaterialParams,
                         wo: Vector3f, wi: Vector3f) -> BSDFEvalResult {
        let wavelength = Wavelength::default();
        let mut rng = LcgRng::new(1);
        let mut ctx = EvaluationContext {
            params,
            outgoing_dir: wo,
            incoming_dir: wi,
            wavelength: &wavelength,
            rng: &mut rng,
        };
        bsdf.evaluate(&mut ctx)
    }

    fn pdf_once(bsdf: &dyn BSDF, params: &MaterialParams,
                wo: Vector3f, wi: Vector3f, dir: PdfDirection) -> Float {
        let wavelength = Wavelength::default();
        let mut rng = LcgRng::new(1);
        let mut ctx = EvaluationContext {
            params,
            outgoing_dir: wo,
            incoming_dir: wi,
            wavelength: &wavelength,
            rng: &mut rng,
        };
        bsdf.pdf(&mut ctx, dir)
    }

    fn assert_rel_close(a: Float, b: Float, rel: Float) {
        let scale = a.abs().max(b.abs()).max(1.0e-3);
        assert!((a - b).abs() <= rel * scale, "expected {} ≈ {}", a, b);
    }

    fn check(bsdf: &dyn BSDF, params: &MaterialParams, seed: u64, sample_pdf_matches: bool) {
        let mut rng = LcgRng::new(seed);
        let mut checked = 0;
        for _ in 0..2000 {
            let wo = sample_uniform_sphere(&rng.next_vec2());
            let record = match sample_once(bsdf, params, wo, rng.next_vec3()) {
                Some(record) => record,
                None => continue,
            };
            assert!(record.pdf > 0.0 && record.pdf.is_finite());
            assert!(record.weight.is_valid());
            if record.event.is_specular() {
                continue;
            }

            let wi = record.incoming_dir;
            let eval = evaluate_once(bsdf, params, wo, wi);
            let forward = pdf_once(bsdf, params, wo, wi, PdfDirection::Forward);
            let reverse = pdf_once(bsdf, params, wo, wi, PdfDirection::Reverse);
            assert_rel_close(forward, eval.direct_pdf_w, 1e-5);
            assert_rel_close(reverse, eval.reverse_pdf_w, 1e-5);
            if sample_pdf_matches && eval.direct_pdf_w > 0.0 {
                // re-deriving the half vector in f32 costs more precision the sharper the lobe
                let tolerance = 1.0e-3 * (1.0 + 0.1 * eval.direct_pdf_w);
                assert_rel_close(record.pdf, eval.direct_pdf_w, tolerance);
            }
            checked += 1;
        }
        assert!(checked > 100, "only {} samples checked", checked);
    }

    /// Sampled density, evaluated density and `pdf` all agree.
    pub fn assert_pdf_consistency(bsdf: &dyn BSDF, params: &MaterialParams, seed: u64) {
        check(bsdf, params, seed, true);
    }

    /// Lobe mixtures report the density of the picked lobe only, so only
    /// `pdf` and `evaluate` are compared.
    pub fn assert_pdf_consistency_mixture(bsdf: &dyn BSDF, params: &MaterialParams, seed: u64) {
        check(bsdf, params, seed, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_utils::evaluate_once;
    use crate::core::interaction::MaterialParams;
    use crate::math::constants::Vector2f;
    use crate::math::warp::sample_uniform_sphere;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_evaluate_is_non_negative(u0 in 0.0f32..1.0, u1 in 0.0f32..1.0,
                                         u2 in 0.0f32..1.0, u3 in 0.0f32..1.0,
                                         roughness in 0.05f32..1.0) {
            let wo = sample_uniform_sphere(&Vector2f::new(u0, u1));
            let wi = sample_uniform_sphere(&Vector2f::new(u2, u3));
            let params = MaterialParams { roughness, ..MaterialParams::default() };
            for name in BSDF_NAMES.iter() {
                let bsdf = create_bsdf(name).unwrap();
                let eval = evaluate_once(bsdf.as_ref(), &params, wo, wi);
                prop_assert!(eval.value.is_valid(), "{} returned {:?}", name, eval.value);
                prop_assert!(eval.direct_pdf_w >= 0.0 && eval.direct_pdf_w.is_finite());
                prop_assert!(eval.reverse_pdf_w >= 0.0 && eval.reverse_pdf_w.is_finite());
            }
        }
    }

    #[test]
    fn test_factory_knows_every_name() {
        for name in BSDF_NAMES.iter() {
            let bsdf = create_bsdf(name).unwrap();
            assert_eq!(bsdf.short_name(), *name);
        }
    }

    #[test]
    fn test_factory_rejects_unknown_name() {
        match create_bsdf("velvet") {
            Err(RenderError::UnknownBsdf(name)) => assert_eq!(name, "velvet"),
            _ => panic!("expected UnknownBsdf"),
        }
    }
}
