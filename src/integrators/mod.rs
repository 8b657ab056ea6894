// Copyright @yucwang 2026

pub mod debug;
pub mod light_tracer;
pub mod path;
pub mod path_mis;
pub mod path_state;
pub mod vcm;

use crate::core::error::RenderError;
use crate::core::integrator::Integrator;

use self::debug::{DebugIntegrator, DebugRenderingMode};
use self::light_tracer::LightTracer;
use self::path::PathTracer;
use self::path_mis::PathTracerMIS;
use self::vcm::{VcmConfig, VertexConnectionAndMerging};

pub const INTEGRATOR_NAMES: [&str; 5] = ["path", "pathMis", "vcm", "lightTracer", "debug"];

/// Builds an integrator from its short name.
pub fn create_integrator(name: &str, vcm_config: &VcmConfig) -> Result<Box<dyn Integrator>, RenderError> {
    let integrator: Box<dyn Integrator> = match name {
        "path" => Box::new(PathTracer::new()),
        "pathMis" => Box::new(PathTracerMIS::new()),
        "vcm" => Box::new(VertexConnectionAndMerging::new(vcm_config.clone())?),
        "lightTracer" => Box::new(LightTracer::new()),
        "debug" => Box::new(DebugIntegrator::new(DebugRenderingMode::Normals)),
        _ => return Err(RenderError::InvalidConfig(format!("unknown integrator '{}'", name))),
    };
    Ok(integrator)
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::Arc;

    use crate::core::context::{RenderingContext, RenderingParams};
    use crate::core::film::Film;
    use crate::core::integrator::{Integrator, RenderParams};
    use crate::core::material::Material;
    use crate::core::scene::{Scene, SceneBuilder};
    use crate::core::sensor::Sensor;
    use crate::emitters::background::BackgroundLight;
    use crate::materials::null::NullBSDF;
    use crate::math::bitmap::Bitmap;
    use crate::math::constants::{Float, Vector2f, Vector3f};
    use crate::math::spectrum::RayColor;
    use crate::scenes;
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::shapes::sphere::Sphere;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(Vector3f::new(0.0, 0.0, 4.0), Vector3f::zeros(),
                               Vector3f::new(0.0, 1.0, 0.0), (30.0 as Float).to_radians(), 1.0)
    }

    fn sphere_scene(material: Material, sky: Float) -> (Scene, PerspectiveCamera) {
        let mut builder = SceneBuilder::new();
        builder
            .add_object(Arc::new(Sphere::new(Vector3f::zeros(), 1.0)), Arc::new(material))
            .add_light(Box::new(BackgroundLight::new(RayColor::splat(sky))));
        (builder.build().unwrap(), camera())
    }

    /// Unit Lambertian sphere at the origin, lit only by a uniform sky.
    pub fn sphere_under_sky(albedo: Float, sky: Float) -> (Scene, PerspectiveCamera) {
        let mut material = Material::new("lambert");
        material.base_color.base_value = RayColor::splat(albedo);
        sphere_scene(material, sky)
    }

    pub fn null_sphere_scene() -> (Scene, PerspectiveCamera) {
        let material = Material::new("null").with_bsdf(Box::new(NullBSDF::new(None)));
        sphere_scene(material, 1.0)
    }

    /// Average `render_pixel` result at one film position, after a single
    /// `pre_render` on a tiny film.
    pub fn render_sample(integrator: &mut dyn Integrator, scene: &Scene, camera: &dyn Sensor,
                         x: Float, y: Float, samples: u32) -> RayColor {
        let film = Film::new(4, 4);
        let settings = RenderingParams::default();
        let params = RenderParams {
            scene,
            camera,
            film: &film,
            settings: &settings,
            iteration: 0,
            span: tracing::Span::none(),
        };
        let mut contexts = vec![RenderingContext::new(17, integrator.create_context())];
        integrator.pre_render(&params, &mut contexts);

        let ctx = &mut contexts[0];
        let ray = camera.generate_ray(&Vector2f::new(x, y));
        let mut sum = RayColor::zero();
        for _ in 0..samples {
            ctx.start_sample();
            let color = integrator.render_pixel(&ray, &params, ctx);
            assert!(color.is_valid(), "invalid color {:?}", color);
            sum += color;
        }
        sum * (1.0 / samples as Float)
    }

    /// Mean channel average of camera samples spread over the middle of the
    /// image, where the test sphere covers the film.
    pub fn average_over_sphere(integrator: &mut dyn Integrator, scene: &Scene, camera: &dyn Sensor,
                               samples: u32) -> Float {
        let film = Film::new(4, 4);
        let settings = RenderingParams::default();
        let params = RenderParams {
            scene,
            camera,
            film: &film,
            settings: &settings,
            iteration: 0,
            span: tracing::Span::none(),
        };
        let mut contexts = vec![RenderingContext::new(5, integrator.create_context())];
        integrator.pre_render(&params, &mut contexts);

        let ctx = &mut contexts[0];
        let mut sum = 0.0f64;
        for _ in 0..samples {
            ctx.start_sample();
            let film_pos = Vector2f::new(0.4, 0.4) + ctx.rng.next_vec2() * 0.2;
            let ray = camera.generate_ray(&film_pos);
            let color = integrator.render_pixel(&ray, &params, ctx);
            assert!(color.is_valid());
            sum += color.average() as f64;
        }
        (sum / samples as f64) as Float
    }

    /// Empty Cornell box under a wide ceiling light, so most surfaces sit
    /// within a unit of the light.
    pub fn lit_empty_box() -> (Scene, PerspectiveCamera) {
        let mut builder = SceneBuilder::new();
        scenes::add_cornell_walls(&mut builder).unwrap();
        scenes::add_ceiling_light(&mut builder, 0.8, RayColor::splat(2.0));
        (builder.build().unwrap(), scenes::cornell_camera(1.0))
    }

    pub fn image_mean(image: &Bitmap) -> f64 {
        let sum: f64 = image.pixels().iter().map(|p| (p.x + p.y + p.z) as f64 / 3.0).sum();
        sum / image.pixels().len() as f64
    }

    /// Progressive render through the film, one thread, `iterations` passes.
    pub fn render_image(integrator: &mut dyn Integrator, scene: &Scene, camera: &dyn Sensor,
                        width: usize, height: usize, iterations: u32) -> Bitmap {
        let film = Film::new(width, height);
        let settings = RenderingParams::default();
        let mut contexts = vec![RenderingContext::new(23, integrator.create_context())];

        for iteration in 0..iterations {
            let params = RenderParams {
                scene,
                camera,
                film: &film,
                settings: &settings,
                iteration,
                span: tracing::Span::none(),
            };
            integrator.pre_render(&params, &mut contexts);

            let ctx = &mut contexts[0];
            for y in 0..height {
                for x in 0..width {
                    ctx.start_sample();
                    let jitter = ctx.rng.next_vec2();
                    let film_pos = Vector2f::new((x as Float + jitter.x) / width as Float,
                                                 (y as Float + jitter.y) / height as Float);
                    let ray = camera.generate_ray(&film_pos);
                    let color = integrator.render_pixel(&ray, &params, ctx);
                    assert!(color.is_valid(), "invalid color {:?}", color);
                    film.accumulate_color(x, y, &color);
                }
            }
        }
        film.resolve(iterations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_knows_every_name() {
        for name in INTEGRATOR_NAMES.iter() {
            let integrator = create_integrator(name, &VcmConfig::default()).unwrap();
            assert_eq!(integrator.name(), *name);
        }
    }

    #[test]
    fn test_factory_rejects_unknown_name() {
        assert!(create_integrator("bdpt", &VcmConfig::default()).is_err());
    }
}
