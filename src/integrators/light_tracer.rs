// Copyright @yucwang 2026

use crate::core::context::RenderingContext;
use crate::core::integrator::{Integrator, RenderParams};
use crate::core::interaction::{HitPoint, ShadingData};
use crate::core::scene::{shadow_ray, RAY_OFFSET};
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RayColor;

/// Traces paths from the lights and splats every non-specular vertex that
/// sees the camera straight into the film. Camera rays contribute nothing.
pub struct LightTracer;

impl LightTracer {
    pub fn new() -> Self {
        Self
    }

    fn connect_to_camera(&self, params: &RenderParams, shading_data: &ShadingData,
                         throughput: &RayColor, ctx: &mut RenderingContext) {
        let material = match shading_data.material() {
            Some(material) => material,
            None => return,
        };

        let sample_position = shading_data.position();
        let to_camera = params.camera.position() - sample_position;
        let distance_sqr = to_camera.norm_squared();
        let distance = distance_sqr.sqrt();
        let dir_to_camera = to_camera / distance;

        let eval = material.evaluate(&ctx.wavelength, shading_data, &dir_to_camera, &mut ctx.rng);
        debug_assert!(eval.value.is_valid());
        if eval.value.almost_zero() {
            return;
        }

        let film_position = match params.camera.world_to_film(&sample_position) {
            Some(film_position) => film_position,
            None => return,
        };

        let segment = shadow_ray(sample_position, dir_to_camera, distance);
        ctx.counters.num_shadow_rays += 1;
        if params.scene.traverse_shadow(&segment) {
            return;
        }
        ctx.counters.num_shadow_rays_hit += 1;

        let camera_pdf_a = params.camera.pdf_w(&-dir_to_camera) / distance_sqr;
        let contribution = eval.value * *throughput * camera_pdf_a;
        if contribution.is_valid() {
            params.film.accumulate_color_at(&film_position, &contribution, &mut ctx.rng);
        }
    }
}

impl Default for LightTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Integrator for LightTracer {
    fn name(&self) -> &'static str {
        "lightTracer"
    }

    fn render_pixel(&self, _ray: &Ray3f, params: &RenderParams, ctx: &mut RenderingContext) -> RayColor {
        let scene = params.scene;
        let lights = scene.lights();
        if lights.is_empty() {
            return RayColor::zero();
        }

        let pick_probability = 1.0 / lights.len() as Float;
        let light = &lights[ctx.rng.next_below(lights.len() as u32) as usize];

        let position_sample = ctx.rng.next_vec2();
        let direction_sample = ctx.rng.next_vec2();
        let emitted = match light.emit(&position_sample, &direction_sample, &ctx.wavelength) {
            Some(emitted) => emitted,
            None => return RayColor::zero(),
        };
        if emitted.radiance.almost_zero() {
            return RayColor::zero();
        }

        let emission_pdf_w = emitted.emission_pdf_w * pick_probability;
        debug_assert!(emission_pdf_w > 0.0);
        let mut throughput = emitted.radiance * (1.0 / emission_pdf_w);

        let origin = emitted.position + emitted.direction * 0.0005;
        let mut ray = Ray3f::new(origin, emitted.direction, None, None);
        let mut depth = 0;

        loop {
            let mut hit_point = HitPoint::default();
            scene.traverse(&ray, &mut hit_point);
            ctx.counters.num_rays += 1;

            if hit_point.is_miss() || hit_point.is_light() {
                break;
            }

            if scene.hit_object(hit_point.object_id).map_or(false, |object| object.is_medium_boundary()) {
                ray = Ray3f::new(ray.at(hit_point.distance + RAY_OFFSET), ray.dir(), None, None);
                continue;
            }

            let mut shading_data = ShadingData {
                intersection: scene.evaluate_intersection(&ray, &hit_point),
                material_params: Default::default(),
                outgoing_dir_world_space: -ray.dir(),
            };
            scene.evaluate_shading_data(&ctx.wavelength, &mut shading_data);

            if depth >= params.settings.max_ray_depth {
                break;
            }

            let material = match shading_data.material() {
                Some(material) => material,
                None => break,
            };
            if !material.is_delta() {
                self.connect_to_camera(params, &shading_data, &throughput, ctx);
            }

            let u = ctx.rng.next_vec3();
            let sample = match material.sample(&mut ctx.wavelength, &shading_data, u, &mut ctx.rng) {
                Some(sample) => sample,
                None => break,
            };
            debug_assert!(sample.weight.is_valid());
            throughput *= sample.weight;
            if throughput.almost_zero() {
                break;
            }

            ray = Ray3f::offset(shading_data.position(), sample.incoming_dir, RAY_OFFSET, None);
            depth += 1;
        }

        RayColor::zero()
    }
}
