// Copyright @yucwang 2026

use crate::core::bsdf::EventType;
use crate::core::context::{PathTerminationReason, PathVertexRecord, RenderingContext};
use crate::core::integrator::{Integrator, RenderParams};
use crate::core::interaction::{HitPoint, ShadingData};
use crate::core::medium::Medium;
use crate::core::scene::{Scene, RAY_OFFSET};
use crate::integrators::path_state::russian_roulette_threshold;
use crate::math::constants::Vector3f;
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RayColor, Wavelength};

/// Unidirectional path tracer without light sampling. Light is only found by
/// hitting it. Handles participating media bounded by material-less shapes.
#[derive(Debug, Default)]
pub struct PathTracer;

impl PathTracer {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_global_lights(scene: &Scene, dir: &Vector3f, wavelength: &Wavelength) -> RayColor {
        let mut result = RayColor::zero();
        for light in scene.global_lights() {
            let radiance = light.get_radiance(dir, 1.0, wavelength).radiance;
            debug_assert!(radiance.is_valid());
            result += radiance;
        }
        result
    }
}

impl Integrator for PathTracer {
    fn name(&self) -> &'static str {
        "path"
    }

    fn render_pixel(&self, primary_ray: &Ray3f, params: &RenderParams, ctx: &mut RenderingContext) -> RayColor {
        let scene = params.scene;
        let settings = params.settings;

        let mut ray = *primary_ray;
        let mut result = RayColor::zero();
        let mut throughput = RayColor::one();
        let mut last_event = EventType::empty();
        let mut termination = PathTerminationReason::None;
        let mut depth = 0u32;
        let mut current_medium: Option<&dyn Medium> = scene.medium_at_point(&ray.origin());

        loop {
            let mut hit_point = HitPoint::default();
            scene.traverse(&ray, &mut hit_point);

            if let Some(medium) = current_medium {
                let (weight, event) = medium.sample(&ray, 0.0, hit_point.distance, &mut ctx.rng);
                debug_assert!(weight.is_valid());
                throughput *= weight;

                if throughput.almost_zero() {
                    termination = PathTerminationReason::AttenuatedInMedium;
                    break;
                }

                if event.scattered() {
                    let position = ray.at(event.distance);
                    ctx.record_vertex(|| PathVertexRecord {
                        ray_origin: ray.origin(),
                        ray_dir: ray.dir(),
                        distance: event.distance,
                        object_id: HitPoint::INVALID_OBJECT,
                        hit_light: false,
                        position,
                        normal: Vector3f::zeros(),
                        throughput,
                        event: last_event,
                    });
                    ray = Ray3f::new(position, event.direction, None, None);
                    depth += 1;
                    if depth >= settings.max_ray_depth {
                        termination = PathTerminationReason::Depth;
                        break;
                    }
                    continue;
                }
            }

            if hit_point.is_miss() {
                result.mul_and_accumulate(&throughput, &Self::evaluate_global_lights(scene, &ray.dir(), &ctx.wavelength));
                termination = PathTerminationReason::HitBackground;
                break;
            }

            let intersection = scene.evaluate_intersection(&ray, &hit_point);

            if hit_point.is_light() {
                if let Some(light) = scene.hit_light(hit_point.object_id) {
                    let cos_at_light = -intersection.cos_theta(&ray.dir());
                    let radiance = light.get_radiance(&ray.dir(), cos_at_light, &ctx.wavelength).radiance;
                    debug_assert!(radiance.is_valid());
                    result.mul_and_accumulate(&throughput, &radiance);
                }
                termination = PathTerminationReason::HitLight;
                break;
            }

            if let Some(object) = scene.hit_object(hit_point.object_id) {
                if object.is_medium_boundary() {
                    let entering = ray.dir().dot(&intersection.normal()) < 0.0;
                    // TODO: keep a medium stack so nested volumes restore the outer medium on exit.
                    current_medium = if entering { object.medium.as_deref() } else { None };
                    ray = Ray3f::new(ray.at(hit_point.distance + RAY_OFFSET), ray.dir(), None, None);
                    depth += 1;
                    if depth >= settings.max_ray_depth {
                        termination = PathTerminationReason::Depth;
                        break;
                    }
                    continue;
                }
            }

            let mut shading_data = ShadingData {
                intersection,
                material_params: Default::default(),
                outgoing_dir_world_space: -ray.dir(),
            };
            scene.evaluate_shading_data(&ctx.wavelength, &mut shading_data);

            let emission = shading_data.material_params.emission_color;
            debug_assert!(emission.is_valid());
            result.mul_and_accumulate(&throughput, &emission);

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
                throughput *= 1.0 / threshold;
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
            throughput *= sample.weight;
            last_event = sample.event;

            if throughput.almost_zero() {
                termination = PathTerminationReason::Throughput;
                break;
            }

            ctx.record_vertex(|| PathVertexRecord {
                ray_origin: ray.origin(),
                ray_dir: ray.dir(),
                distance: hit_point.distance,
                object_id: hit_point.object_id,
                hit_light: false,
                position: shading_data.position(),
                normal: shading_data.normal(),
                throughput,
                event: last_event,
            });

            ray = Ray3f::offset(shading_data.position(), sample.incoming_dir, RAY_OFFSET, None);
            depth += 1;
        }

        ctx.finish_path(termination);
        ctx.counters.num_rays += depth as u64 + 1;

        debug_assert!(result.is_valid());
        result
    }
}
