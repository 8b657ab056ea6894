// Copyright @yucwang 2026

use crate::core::bsdf::{BSDFEvalResult, BSDFSampleRecord, EvaluationContext, EventType,
                        PdfDirection, SamplingContext, BSDF, SPECULAR_EVENT_ROUGHNESS_THRESHOLD};
use crate::core::computation_node::{generate_node_id, ComputationNode};
use crate::core::interaction::MaterialParams;
use crate::core::rng::LcgRng;
use crate::materials::metal::MetalBSDF;
use crate::materials::microfacet::{fresnel_metal, reflect, Microfacet};
use crate::math::constants::{Float, Vector2f, Vector3f, COS_EPSILON, FLOAT_MAX};
use crate::math::spectrum::RayColor;

pub const MAX_SCATTERING_ORDER_LIMIT: u32 = 32;

/// GGX conductor. With multiple scattering enabled the microsurface is
/// walked stochastically (Heitz et al. 2016) instead of using the single
/// bounce closed form.
pub struct RoughMetalBSDF {
    id: String,
    use_multiscatter: bool,
    max_scattering_order: u32,
    smooth: MetalBSDF,
}

impl RoughMetalBSDF {
    pub fn new(id: Option<String>) -> Self {
        let id = id.unwrap_or_else(|| generate_node_id("roughMetal"));
        Self {
            smooth: MetalBSDF::new(Some(format!("{}_smooth", id))),
            id,
            use_multiscatter: false,
            max_scattering_order: 4,
        }
    }

    /// Enables the random walk, bounded by `max_order` bounces (clamped to [1, 32]).
    pub fn with_multiscatter(mut self, max_order: u32) -> Self {
        self.use_multiscatter = true;
        self.max_scattering_order = max_order.max(1).min(MAX_SCATTERING_ORDER_LIMIT);
        self
    }

    pub fn use_multiscatter(&self) -> bool {
        self.use_multiscatter
    }

    pub fn max_scattering_order(&self) -> u32 {
        self.max_scattering_order
    }

    fn microfacet(params: &MaterialParams) -> Microfacet {
        Microfacet::new(params.roughness * params.roughness, params.roughness_anisotropy)
    }

    fn fresnel(params: &MaterialParams, cos_theta: Float) -> RayColor {
        RayColor::splat(fresnel_metal(cos_theta, params.ior, params.k))
    }

    /// Single bounce density of reflecting `wo` into `wi`.
    fn single_scatter_pdf(microfacet: &Microfacet, wo: &Vector3f, wi: &Vector3f) -> Option<Float> {
        let m = wo + wi;
        if m.norm_squared() <= 0.0 {
            return None;
        }
        let m = m.normalize();
        let v_dot_h = m.dot(wo);
        if wo.z < COS_EPSILON || wi.z < COS_EPSILON || v_dot_h < COS_EPSILON {
            return None;
        }
        Some(microfacet.pdf(&m) / (4.0 * v_dot_h))
    }

    fn sample_random_walk(&self, microfacet: &Microfacet, params: &MaterialParams,
                          wo: &Vector3f, rng: &mut LcgRng) -> Option<(Vector3f, RayColor)> {
        let mut scattering_order = 0;
        let mut throughput = RayColor::one();
        let mut wr = -wo;
        let mut hr = 1.0 + Microfacet::height_distribution_c1(0.999);

        while scattering_order <= self.max_scattering_order {
            let u = rng.next_f32().max(0.00001).min(0.99999);
            hr = microfacet.sample_height(&wr, hr, u);
            debug_assert!(!hr.is_nan());
            if hr == FLOAT_MAX {
                break;
            }

            let wm = microfacet.sample_d(&-wr, rng.next_f32(), rng.next_f32());
            let v_dot_h = wm.dot(&-wr);
            wr = reflect(&-wr, &wm);

            throughput *= params.base_color;
            throughput *= Self::fresnel(params, v_dot_h);
            scattering_order += 1;
        }

        if scattering_order > self.max_scattering_order {
            return None;
        }
        Some((wr, throughput))
    }

    fn evaluate_random_walk(&self, microfacet: &Microfacet, params: &MaterialParams,
                            wo: &Vector3f, wi: &Vector3f, rng: &mut LcgRng) -> RayColor {
        let mut wr = -wo;
        let mut hr = 1.0 + Microfacet::height_distribution_inv_c1(0.999);
        let mut throughput = RayColor::one();
        let mut sum = RayColor::zero();

        for _ in 0..=self.max_scattering_order {
            let u = rng.next_f32().max(0.00001).min(0.99999);
            hr = microfacet.sample_height(&wr, hr, u);
            if hr == FLOAT_MAX {
                break;
            }

            // next event estimation towards wi
            let phase = microfacet.eval_phase_function(&-wr, wi);
            let shadowing = microfacet.g1(wi, hr);
            let contribution = phase * shadowing;

            let wm = microfacet.sample_d(&-wr, rng.next_f32(), rng.next_f32());
            let v_dot_m = wm.dot(&-wr);
            wr = reflect(&-wr, &wm);

            throughput *= params.base_color;
            throughput *= Self::fresnel(params, v_dot_m);

            if contribution.is_finite() {
                sum += throughput * contribution;
            }
        }

        sum
    }
}

impl ComputationNode for RoughMetalBSDF {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_string(&self) -> String {
        format!("RoughMetalBSDF [id={}, multiscatter={}, max_order={}]",
                self.id, self.use_multiscatter, self.max_scattering_order)
    }
}

impl BSDF for RoughMetalBSDF {
    fn short_name(&self) -> &'static str {
        "roughMetal"
    }

    fn sample(&self, ctx: &mut SamplingContext) -> Option<BSDFSampleRecord> {
        if ctx.params.roughness < SPECULAR_EVENT_ROUGHNESS_THRESHOLD {
            return self.smooth.sample(ctx);
        }

        let wo = ctx.outgoing_dir;
        let n_dot_v = wo.z;
        if n_dot_v < COS_EPSILON {
            return None;
        }

        let microfacet = Self::microfacet(ctx.params);

        if self.use_multiscatter {
            let (wr, throughput) = self.sample_random_walk(&microfacet, ctx.params, &wo, ctx.rng)?;
            debug_assert!(wr.z >= 0.0);

            // single scattering density stands in for the walk's
            let pdf = Self::single_scatter_pdf(&microfacet, &wo, &wr)?;
            debug_assert!(pdf.is_finite());
            return Some(BSDFSampleRecord {
                incoming_dir: wr,
                weight: throughput,
                pdf,
                event: EventType::GLOSSY_REFLECTION,
            });
        }

        let m = microfacet.sample(&Vector2f::new(ctx.sample.x, ctx.sample.y));
        let incoming_dir = reflect(&wo, &m);
        let n_dot_l = incoming_dir.z;
        let v_dot_h = m.dot(&wo);
        if n_dot_l < COS_EPSILON || v_dot_h < COS_EPSILON {
            return None;
        }

        let pdf = microfacet.pdf(&m);
        let d = microfacet.d(&m);
        let g = microfacet.g(n_dot_v, n_dot_l);
        let fresnel = Self::fresnel(ctx.params, v_dot_h);

        Some(BSDFSampleRecord {
            incoming_dir,
            weight: ctx.params.base_color * fresnel * (v_dot_h * g * d / (pdf * n_dot_v)),
            pdf: pdf / (4.0 * v_dot_h),
            event: EventType::GLOSSY_REFLECTION,
        })
    }

    fn evaluate(&self, ctx: &mut EvaluationContext) -> BSDFEvalResult {
        if ctx.params.roughness < SPECULAR_EVENT_ROUGHNESS_THRESHOLD {
            return self.smooth.evaluate(ctx);
        }

        let wo = ctx.outgoing_dir;
        let wi = ctx.incoming_dir;
        let microfacet = Self::microfacet(ctx.params);
        let pdf = match Self::single_scatter_pdf(&microfacet, &wo, &wi) {
            Some(pdf) => pdf,
            None => return BSDFEvalResult::default(),
        };

        let value = if self.use_multiscatter {
            self.evaluate_random_walk(&microfacet, ctx.params, &wo, &wi, ctx.rng)
        } else {
            let m = (wo + wi).normalize();
            let v_dot_h = m.dot(&wo);
            let d = microfacet.d(&m);
            let g = microfacet.g(wo.z, wi.z);
            ctx.params.base_color * Self::fresnel(ctx.params, v_dot_h) * (g * d / (4.0 * wo.z))
        };

        BSDFEvalResult::new(value, pdf, pdf)
    }

    fn pdf(&self, ctx: &mut EvaluationContext, _dir: PdfDirection) -> Float {
        if ctx.params.roughness < SPECULAR_EVENT_ROUGHNESS_THRESHOLD {
            return 0.0;
        }
        let microfacet = Self::microfacet(ctx.params);
        Self::single_scatter_pdf(&microfacet, &ctx.outgoing_dir, &ctx.incoming_dir).unwrap_or(0.0)
    }
}
