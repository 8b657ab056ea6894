// Copyright @yucwang 2026

use crate::core::bsdf::PdfDirection;
use crate::core::context::{LightSamplingStrategy, PathTerminationReason, PathVertexRecord,
                           RenderingContext};
use crate::core::emitter::Emitter;
use crate::core::integrator::{Integrator, RenderParams};
use crate::core::interaction::{HitPoint, ShadingData};
use crate::core::scene::{shadow_ray, Scene, RAY_OFFSET};
use crate::integrators::path_state::{combine_mis, pdf_a_to_w, russian_roulette_threshold, PathState};
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RayColor;

/// Path tracer with next event estimation at every vertex, combined with
/// BSDF sampling through the balance heuristic.
pub struct PathTracerMIS {
    /// Debug multiplier of the light sampling technique.
    pub light_sampling_weight: RayColor,
    /// Debug multiplier of the BSDF sampling technique.
    pub bsdf_sampling_weight: RayColor,
}

impl Default for PathTracerMIS {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTracerMIS {
    pub fn new() -> Self {
        Self {
            light_sampling_weight: RayColor::one(),
            bsdf_sampling_weight: RayColor::one(),
        }
    }

    fn light_pick_probability(scene: &Scene, strategy: LightSamplingStrategy) -> Float {
        match strategy {
            LightSamplingStrategy::Single if !scene.lights().is_empty() => 1.0 / scene.lights().len() as Float,
            _ => 1.0,
        }
    }

    fn sample_light(&self, scene: &Scene, light: &dyn Emitter, shading_data: &ShadingData,
                    is_last_segment: bool, pick_probability: Float, ctx: &mut RenderingContext) -> RayColor {
        let position = shading_data.position();
        let sample = ctx.rng.next_vec2();
        let illumination = match light.illuminate(&position, &sample, &ctx.wavelength) {
            Some(illumination) => illumination,
            None => return RayColor::zero(),
        };
        debug_assert!(illumination.radiance.is_valid());
        debug_assert!(illumination.direct_pdf_w > 0.0 && illumination.direct_pdf_w.is_finite());

        let material = match shading_data.material() {
            Some(material) => material,
            None => return RayColor::zero(),
        };
        let eval = material.evaluate(&ctx.wavelength, shading_data, &illumination.direction_to_light, &mut ctx.rng);
        if eval.is_zero() {
            return RayColor::zero();
        }

        let segment = shadow_ray(position, illumination.direction_to_light, illumination.distance);
        ctx.counters.num_shadow_rays += 1;
        if scene.traverse_shadow(&segment) {
            return RayColor::zero();
        }
        ctx.counters.num_shadow_rays_hit += 1;

        // the last segment has no BSDF sampled continuation to share the energy with
        let weight = if light.is_delta() || is_last_segment {
            1.0
        } else {
            combine_mis(illumination.direct_pdf_w * pick_probability, eval.direct_pdf_w)
        };

        let result = illumination.radiance * eval.value
            * (weight / (pick_probability * illumination.direct_pdf_w));
        debug_assert!(result.is_valid());
        result
    }

    fn sample_lights(&self, scene: &Scene, shading_data: &ShadingData, is_last_segment: bool,
                     pick_probability: Float, params: &RenderParams, ctx: &mut RenderingContext) -> RayColor {
        let lights = scene.lights();
        if lights.is_empty() {
            return RayColor::zero();
        }

        let mut result = RayColor::zero();
        match params.settings.light_sampling_strategy {
            LightSamplingStrategy::Single => {
                let index = ctx.rng.next_below(lights.len() as u32) as usize;
                result = self.sample_light(scene, lights[index].as_ref(), shading_data,
                                           is_last_segment, pick_probability, ctx);
            }
            LightSamplingStrategy::All => {
                for light in lights {
                    result += self.sample_light(scene, light.as_ref(), shading_data,
                                                is_last_segment, pick_probability, ctx);
                }
            }
        }
        result * self.light_sampling_weight
    }

    /// Radiance of a light hit by a BSDF sampled ray, weighted against light sampling.
    fn evaluate_light(&self, light: &dyn Emitter, ray_dir: &Vector3f, distance: Float, cos_at_light: Float,
                      state: &PathState, pick_probability: Float, ctx: &RenderingContext) -> RayColor {
        let radiance = light.get_radiance(ray_dir, cos_at_light, &ctx.wavelength);
        if radiance.radiance.almost_zero() {
            return RayColor::zero();
        }

        let mut weight = 1.0;
        if !state.last_specular {
            let direct_pdf_w = pdf_a_to_w(radiance.direct_pdf_a, distance, cos_at_light);
            weight = if direct_pdf_w.is_finite() {
                combine_mis(state.last_pdf_w, direct_pdf_w * pick_probability)
            } else {
                0.0
            };
        }
        radiance.radiance * self.bsdf_sampling_weight * weight
    }

    fn evaluate_global_lights(&self, scene: &Scene, ray_dir: &Vector3f, state: &PathState,
                              pick_probability: Float, ctx: &RenderingContext) -> RayColor {
        let mut result = RayColor::zero();
        for light in scene.global_lights() {
            let radiance = light.get_radiance(ray_dir, 1.0, &ctx.wavelength);
            if radiance.radiance.almost_zero() {
                continue;
            }
            // solid angle density for lights at infinity
            let weight = if state.last_specular {
                1.0
            } else {
                combine_mis(state.last_pdf_w, radiance.direct_pdf_a * pick_probability)
            };
            result += radiance.radiance * weight;
        }
        result * self.bsdf_sampling_weight
    }
}

impl Integrator for PathTracerMIS {
    fn name(&self) -> &'static str {
        "pathMis"
    }

    fn render_pixel(&self, primary_ray: &Ray3f, params: &RenderParams, ctx: &mut RenderingContext) -> RayColor {
        let scene = params.scene;
        let settings = params.settings;
        let pick_probability = Self::light_pick_probability(scene, settings.light_sampling_strategy);

        let mut state = PathState::new(*primary_ray);
        let mut result = RayColor::zero();
        let mut termination = PathTerminationReason::None;
        let mut depth = 0u32;

        loop {
            let ray = state.ray;
            let mut hit_point = HitPoint::default();
            scene.traverse(&ray, &mut hit_point);

            if hit_point.is_miss() {
                let background = self.evaluate_global_lights(scene, &ray.dir(), &state, pick_probability, ctx);
                result.mul_and_accumulate(&state.throughput, &background);
                termination = PathTerminationReason::HitBackground;
                break;
            }

            let intersection = scene.evaluate_intersection(&ray, &hit_point);

            if hit_point.is_light() {
                if let Some(light) = scene.hit_light(hit_point.object_id) {
                    let cos_at_light = -intersection.cos_theta(&ray.dir());
                    let color = self.evaluate_light(light, &ray.dir(), hit_point.distance, cos_at_light,
                                                    &state, pick_probability, ctx);
                    debug_assert!(color.is_valid());
                    result.mul_and_accumulate(&state.throughput, &color);
                }
                termination = PathTerminationReason::HitLight;
                break;
            }

            // media are not simulated here, their boundaries are invisible
            if scene.hit_object(hit_point.object_id).map_or(false, |object| object.is_medium_boundary()) {
                state.ray = Ray3f::new(ray.at(hit_point.distance + RAY_OFFSET), ray.dir(), None, None);
                depth += 1;
                if depth >= settings.max_ray_depth {
                    termination = PathTerminationReason::Depth;
                    break;
                }
                continue;
            }

            let mut shading_data = ShadingData {
                intersection,
                material_params: Default::default(),
                outgoing_dir_world_space: -ray.dir(),
            };
            scene.evaluate_shading_data(&ctx.wavelength, &mut shading_data);

            let emission = shading_data.material_params.emission_color * self.bsdf_sampling_weight;
            debug_assert!(emission.is_valid());
            result.mul_and_accumulate(&state.throughput, &emission);

            let is_delta = shading_data.material().map_or(true, |material| material.is_delta());
            if !is_delta {
                let is_last_segment = depth >= settings.max_ray_depth;
                let light_color = self.sample_lights(scene, &shading_data, is_last_segment,
                                                     pick_probability, params, ctx);
                result.mul_and_accumulate(&state.throughput, &light_color);
            }

            if depth >= settings.max_ray_depth {
                termination = PathTerminationReason::Depth;
                break;
            }

            if depth >= settings.min_russian_roulette_depth {
                let threshold = russian_roulette_threshold(&shading_data.material_params.base_color, &ctx.wavelength);
                if ctx.rng.next_f32() > threshold {
                    termination = PathTerminationReason::RussianRoulette;
                    break;
                }
                state.throughput *= 1.0 / threshold;
            }

            let material = match shading_data.material() {
                Some(material) => material,
                None => {
                    termination = PathTerminationReason::NoSampledEvent;
                    break;
                }
            };
            let u = ctx.rng.next_vec3();
            let sample = match material.sample(&mut ctx.wavelength, &shading_data, u, &mut ctx.rng) {
                Some(sample) => sample,
                None => {
                    termination = PathTerminationReason::NoSampledEvent;
                    break;
                }
            };

            debug_assert!(sample.weight.is_valid());
            state.throughput *= sample.weight;
            if state.throughput.almost_zero() {
                termination = PathTerminationReason::Throughput;
                break;
            }

            debug_assert!(sample.pdf >= 0.0);
            state.last_specular = sample.event.is_specular();
            // lobe mixtures report the picked lobe only, light sampling sees all of them
            state.last_pdf_w = if state.last_specular {
                sample.pdf
            } else {
                let pdf = material.pdf(&ctx.wavelength, &shading_data, &sample.incoming_dir,
                                       PdfDirection::Forward, &mut ctx.rng);
                if pdf > 0.0 { pdf } else { sample.pdf }
            };
            state.last_event = sample.event;

            let throughput = state.throughput;
            ctx.record_vertex(|| PathVertexRecord {
                ray_origin: ray.origin(),
                ray_dir: ray.dir(),
                distance: hit_point.distance,
                object_id: hit_point.object_id,
                hit_light: false,
                position: shading_data.position(),
                normal: shading_data.normal(),
                throughput,
                event: sample.event,
            });

            state.ray = Ray3f::offset(shading_data.position(), sample.incoming_dir, RAY_OFFSET, None);
            depth += 1;
        }

        ctx.finish_path(termination);
        ctx.counters.num_rays += depth as u64 + 1;

        debug_assert!(result.is_valid());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::RenderingParams;
    use crate::integrators::path::PathTracer;
    use crate::integrators::test_utils::{average_over_sphere, image_mean, lit_empty_box, null_sphere_scene,
                                         render_image, render_sample, sphere_under_sky};
    use crate::scenes::cornell_box;

    #[test]
    fn test_lambertian_sphere_under_uniform_sky_converges() {
        let albedo = 0.8;
        let sky = 1.0;
        let (scene, camera) = sphere_under_sky(albedo, sky);
        let value = average_over_sphere(&mut PathTracerMIS::new(), &scene, &camera, 10_000);
        let expected = albedo * sky;
        assert!((value - expected).abs() / expected < 0.02, "got {} expected {}", value, expected);
    }

    #[test]
    fn test_null_surface_reflects_nothing() {
        let (scene, camera) = null_sphere_scene();
        let color = render_sample(&mut PathTracerMIS::new(), &scene, &camera, 0.5, 0.5, 256);
        assert!(color.almost_zero());
    }

    #[test]
    fn test_cornell_box_is_finite_and_non_negative() {
        let preset = cornell_box(1.0).unwrap();
        let mut integrator = PathTracerMIS::new();
        for &(x, y) in [(0.5, 0.5), (0.1, 0.9), (0.5, 0.05), (0.9, 0.6)].iter() {
            let color = render_sample(&mut integrator, &preset.scene, &preset.camera, x, y, 64);
            assert!(color.is_valid());
        }
        let center = render_sample(&mut integrator, &preset.scene, &preset.camera, 0.5, 0.6, 256);
        assert!(center.max() > 0.0);
    }

    #[test]
    fn test_matches_path_tracer_next_to_area_light() {
        let (scene, camera) = lit_empty_box();
        let reference = image_mean(&render_image(&mut PathTracer::new(), &scene, &camera, 24, 24, 64));
        let value = image_mean(&render_image(&mut PathTracerMIS::new(), &scene, &camera, 24, 24, 64));
        assert!(reference > 0.0);
        assert!((value - reference).abs() / reference < 0.02, "got {} expected {}", value, reference);
    }

    #[test]
    fn test_pick_probability_follows_strategy() {
        let (scene, _) = sphere_under_sky(0.5, 1.0);
        let mut settings = RenderingParams::default();
        assert_eq!(PathTracerMIS::light_pick_probability(&scene, settings.light_sampling_strategy), 1.0);
        settings.light_sampling_strategy = LightSamplingStrategy::All;
        assert_eq!(PathTracerMIS::light_pick_probability(&scene, settings.light_sampling_strategy), 1.0);
    }
}
