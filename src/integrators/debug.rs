// Copyright @yucwang 2026

use crate::core::context::RenderingContext;
use crate::core::error::RenderError;
use crate::core::integrator::{Integrator, RenderParams};
use crate::core::interaction::{HitPoint, ShadingData};
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RayColor;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DebugRenderingMode {
    Depth,
    Normals,
    TexCoords,
    BaseColor,
    Roughness,
    Emission,
}

impl DebugRenderingMode {
    pub const NAMES: [&'static str; 6] = ["depth", "normals", "texCoords", "baseColor", "roughness", "emission"];

    pub fn from_name(name: &str) -> Result<Self, RenderError> {
        match name {
            "depth" => Ok(DebugRenderingMode::Depth),
            "normals" => Ok(DebugRenderingMode::Normals),
            "texCoords" => Ok(DebugRenderingMode::TexCoords),
            "baseColor" => Ok(DebugRenderingMode::BaseColor),
            "roughness" => Ok(DebugRenderingMode::Roughness),
            "emission" => Ok(DebugRenderingMode::Emission),
            _ => Err(RenderError::InvalidConfig(format!("unknown debug rendering mode '{}'", name))),
        }
    }
}

/// Shows one geometric or material quantity of the first hit.
pub struct DebugIntegrator {
    pub mode: DebugRenderingMode,
}

impl DebugIntegrator {
    pub fn new(mode: DebugRenderingMode) -> Self {
        Self { mode }
    }
}

fn bipolar_to_unipolar(v: &Vector3f) -> RayColor {
    let color = RayColor::from_vector(v * 0.5 + Vector3f::repeat(0.5));
    color.clamp01()
}

fn depth_color(distance: Float) -> RayColor {
    RayColor::splat(1.0 - 1.0 / (1.0 + distance / 10.0))
}

fn fract(v: Float) -> Float {
    v - v.floor()
}

impl Integrator for DebugIntegrator {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn render_pixel(&self, ray: &Ray3f, params: &RenderParams, ctx: &mut RenderingContext) -> RayColor {
        let scene = params.scene;
        let mut hit_point = HitPoint::default();
        scene.traverse(ray, &mut hit_point);
        ctx.counters.num_rays += 1;

        if hit_point.is_miss() {
            return RayColor::zero();
        }
        if hit_point.is_light() {
            return RayColor::new(1.0, 1.0, 0.0);
        }

        if self.mode == DebugRenderingMode::Depth {
            return depth_color(hit_point.distance);
        }

        let mut shading_data = ShadingData {
            intersection: scene.evaluate_intersection(ray, &hit_point),
            material_params: Default::default(),
            outgoing_dir_world_space: -ray.dir(),
        };
        scene.evaluate_shading_data(&ctx.wavelength, &mut shading_data);

        match self.mode {
            DebugRenderingMode::Depth => depth_color(hit_point.distance),
            DebugRenderingMode::Normals => bipolar_to_unipolar(&shading_data.normal()),
            DebugRenderingMode::TexCoords => {
                let uv = shading_data.intersection.tex_coord;
                RayColor::new(fract(uv.x), fract(uv.y), 0.0)
            }
            DebugRenderingMode::BaseColor => shading_data.material_params.base_color,
            DebugRenderingMode::Roughness => RayColor::splat(shading_data.material_params.roughness),
            DebugRenderingMode::Emission => shading_data.material_params.emission_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sensor::Sensor;
    use crate::integrators::test_utils::{render_sample, sphere_under_sky};
    use crate::scenes::cornell_box;

    fn assert_close(a: Float, b: Float, eps: Float) {
        assert!((a - b).abs() < eps, "expected {} ≈ {}", a, b);
    }

    #[test]
    fn test_mode_names() {
        for name in DebugRenderingMode::NAMES.iter() {
            assert!(DebugRenderingMode::from_name(name).is_ok());
        }
        assert!(DebugRenderingMode::from_name("triangleId").is_err());
    }

    #[test]
    fn test_normals_face_the_camera() {
        let (scene, camera) = sphere_under_sky(0.5, 1.0);
        let mut integrator = DebugIntegrator::new(DebugRenderingMode::Normals);
        let color = render_sample(&mut integrator, &scene, &camera, 0.5, 0.5, 1);
        assert_close(color[0], 0.5, 1e-2);
        assert_close(color[1], 0.5, 1e-2);
        assert_close(color[2], 1.0, 1e-2);
    }

    #[test]
    fn test_depth_grows_with_distance() {
        let (scene, camera) = sphere_under_sky(0.5, 1.0);
        let mut integrator = DebugIntegrator::new(DebugRenderingMode::Depth);
        let color = render_sample(&mut integrator, &scene, &camera, 0.5, 0.5, 1);
        // the sphere front is 3 units away from the camera
        assert_close(color[0], 1.0 - 1.0 / 1.3, 1e-3);

        let background = render_sample(&mut integrator, &scene, &camera, 0.01, 0.01, 1);
        assert_eq!(background, RayColor::zero());
    }

    #[test]
    fn test_base_color_mode() {
        let (scene, camera) = sphere_under_sky(0.25, 1.0);
        let mut integrator = DebugIntegrator::new(DebugRenderingMode::BaseColor);
        let color = render_sample(&mut integrator, &scene, &camera, 0.5, 0.5, 1);
        assert_close(color[1], 0.25, 1e-5);
    }

    #[test]
    fn test_lights_show_up_yellow() {
        let preset = cornell_box(1.0).unwrap();
        let integrator = DebugIntegrator::new(DebugRenderingMode::Emission);
        let film = crate::core::film::Film::new(32, 32);
        let settings = crate::core::context::RenderingParams::default();
        let params = RenderParams {
            scene: &preset.scene,
            camera: &preset.camera,
            film: &film,
            settings: &settings,
            iteration: 0,
            span: tracing::Span::none(),
        };
        let mut ctx = RenderingContext::new(3, None);
        let mut found = false;
        for y in 0..32 {
            for x in 0..32 {
                let film_pos = crate::math::constants::Vector2f::new((x as Float + 0.5) / 32.0, (y as Float + 0.5) / 32.0);
                let ray = preset.camera.generate_ray(&film_pos);
                if integrator.render_pixel(&ray, &params, &mut ctx) == RayColor::new(1.0, 1.0, 0.0) {
                    found = true;
                }
            }
        }
        assert!(found);
    }
}
