// Copyright @yucwang 2026

//! Built-in test scenes. There is no scene file format; the binaries pick a
//! preset by name.

use std::sync::Arc;

use crate::core::error::RenderError;
use crate::core::material::Material;
use crate::core::scene::{Scene, SceneBuilder};
use crate::emitters::area::AreaLight;
use crate::emitters::background::BackgroundLight;
use crate::emitters::directional::DirectionalLight;
use crate::emitters::point::PointLight;
use crate::media::homogeneous_medium::HomogeneousMedium;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::RayColor;
use crate::sensors::perspective::PerspectiveCamera;
use crate::shapes::rectangle::Rectangle;
use crate::shapes::sphere::Sphere;
use crate::textures::checkerboard::CheckerboardTexture;

pub const SCENE_NAMES: [&str; 5] = ["cornell", "cornellEmpty", "cornellFog", "sphereSky", "materials"];

pub struct ScenePreset {
    pub name: &'static str,
    pub scene: Scene,
    pub camera: PerspectiveCamera,
}

pub fn by_name(name: &str, aspect: Float) -> Result<ScenePreset, RenderError> {
    match name {
        "cornell" => cornell_box(aspect),
        "cornellEmpty" => empty_cornell_box(aspect),
        "cornellFog" => foggy_cornell_box(aspect),
        "sphereSky" => sphere_under_sky(aspect),
        "materials" => material_spheres(aspect),
        _ => Err(RenderError::InvalidConfig(format!(
            "unknown scene '{}', expected one of {:?}", name, SCENE_NAMES))),
    }
}

fn material(name: &str, bsdf: &str, base_color: RayColor, roughness: Float) -> Result<Arc<Material>, RenderError> {
    let mut material = Material::new(name);
    material.set_bsdf(bsdf)?;
    material.base_color.base_value = base_color;
    material.roughness.base_value = roughness;
    material.compile()?;
    Ok(Arc::new(material))
}

fn diffuse(name: &str, base_color: RayColor) -> Result<Arc<Material>, RenderError> {
    material(name, "diffuse", base_color, 1.0)
}

pub(crate) fn cornell_camera(aspect: Float) -> PerspectiveCamera {
    PerspectiveCamera::new(Vector3f::new(0.0, 0.0, 3.4), Vector3f::zeros(),
                           Vector3f::new(0.0, 1.0, 0.0), (40.0 as Float).to_radians(), aspect)
}

/// Walls of the [-1, 1]³ box with the front side open, normals pointing inwards.
pub(crate) fn add_cornell_walls(builder: &mut SceneBuilder) -> Result<(), RenderError> {
    let white = diffuse("white", RayColor::splat(0.73))?;
    let red = diffuse("red", RayColor::new(0.63, 0.065, 0.05))?;
    let green = diffuse("green", RayColor::new(0.14, 0.45, 0.091))?;

    builder
        .add_object(Arc::new(Rectangle::new(Vector3f::new(-1.0, -1.0, -1.0),
                                            Vector3f::new(0.0, 0.0, 2.0), Vector3f::new(2.0, 0.0, 0.0))),
                    white.clone())
        .add_object(Arc::new(Rectangle::new(Vector3f::new(-1.0, 1.0, -1.0),
                                            Vector3f::new(2.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 2.0))),
                    white.clone())
        .add_object(Arc::new(Rectangle::new(Vector3f::new(-1.0, -1.0, -1.0),
                                            Vector3f::new(2.0, 0.0, 0.0), Vector3f::new(0.0, 2.0, 0.0))),
                    white)
        .add_object(Arc::new(Rectangle::new(Vector3f::new(-1.0, -1.0, -1.0),
                                            Vector3f::new(0.0, 2.0, 0.0), Vector3f::new(0.0, 0.0, 2.0))),
                    red)
        .add_object(Arc::new(Rectangle::new(Vector3f::new(1.0, -1.0, -1.0),
                                            Vector3f::new(0.0, 0.0, 2.0), Vector3f::new(0.0, 2.0, 0.0))),
                    green);
    Ok(())
}

/// Square light facing down, just below the ceiling.
pub(crate) fn add_ceiling_light(builder: &mut SceneBuilder, half_size: Float, radiance: RayColor) {
    let ceiling_light = Rectangle::new(Vector3f::new(-half_size, 0.98, -half_size),
                                       Vector3f::new(2.0 * half_size, 0.0, 0.0),
                                       Vector3f::new(0.0, 0.0, 2.0 * half_size));
    builder.add_light(Box::new(AreaLight::new(Arc::new(ceiling_light), radiance)));
}

fn add_cornell_light(builder: &mut SceneBuilder) {
    add_ceiling_light(builder, 0.25, RayColor::new(17.0, 12.0, 4.0));
}

/// The box with nothing inside.
pub fn empty_cornell_box(aspect: Float) -> Result<ScenePreset, RenderError> {
    let mut builder = SceneBuilder::new();
    add_cornell_walls(&mut builder)?;
    add_cornell_light(&mut builder);
    Ok(ScenePreset { name: "cornellEmpty", scene: builder.build()?, camera: cornell_camera(aspect) })
}

/// Classic box with a diffuse and a glass sphere under a ceiling light.
pub fn cornell_box(aspect: Float) -> Result<ScenePreset, RenderError> {
    let mut builder = SceneBuilder::new();
    add_cornell_walls(&mut builder)?;
    add_cornell_light(&mut builder);

    let glass = material("glass", "dielectric", RayColor::one(), 0.0)?;
    let plastic = material("plastic", "roughPlastic", RayColor::new(0.2, 0.3, 0.8), 0.3)?;
    builder
        .add_object(Arc::new(Sphere::new(Vector3f::new(-0.45, -0.6, -0.3), 0.4)), plastic)
        .add_object(Arc::new(Sphere::new(Vector3f::new(0.45, -0.6, 0.3), 0.4)), glass);

    Ok(ScenePreset { name: "cornell", scene: builder.build()?, camera: cornell_camera(aspect) })
}

/// Cornell box with a ball of scattering fog in the middle.
pub fn foggy_cornell_box(aspect: Float) -> Result<ScenePreset, RenderError> {
    let mut builder = SceneBuilder::new();
    add_cornell_walls(&mut builder)?;
    add_cornell_light(&mut builder);

    let fog = HomogeneousMedium::scattering(RayColor::splat(1.5), RayColor::new(0.9, 0.9, 0.8));
    builder.add_medium_boundary(Arc::new(Sphere::new(Vector3f::new(0.0, -0.3, 0.0), 0.6)), Arc::new(fog));

    Ok(ScenePreset { name: "cornellFog", scene: builder.build()?, camera: cornell_camera(aspect) })
}

/// Grey diffuse sphere under a uniform sky, the furnace-like reference scene.
pub fn sphere_under_sky(aspect: Float) -> Result<ScenePreset, RenderError> {
    let mut builder = SceneBuilder::new();
    builder
        .add_object(Arc::new(Sphere::new(Vector3f::zeros(), 1.0)), diffuse("grey", RayColor::splat(0.5))?)
        .add_light(Box::new(BackgroundLight::new(RayColor::splat(1.0))));

    let camera = PerspectiveCamera::new(Vector3f::new(0.0, 0.0, 4.0), Vector3f::zeros(),
                                        Vector3f::new(0.0, 1.0, 0.0), (30.0 as Float).to_radians(), aspect);
    Ok(ScenePreset { name: "sphereSky", scene: builder.build()?, camera })
}

/// One sphere per BSDF on a checkerboard floor, lit by the sky, the sun and a point light.
pub fn material_spheres(aspect: Float) -> Result<ScenePreset, RenderError> {
    let mut builder = SceneBuilder::new();

    let mut floor = Material::new("floor");
    floor.base_color.texture = Some(Arc::new(CheckerboardTexture::new(RayColor::splat(0.8), RayColor::splat(0.2), 8.0)));
    floor.compile()?;
    builder.add_object(Arc::new(Rectangle::new(Vector3f::new(-6.0, 0.0, -6.0),
                                               Vector3f::new(0.0, 0.0, 12.0), Vector3f::new(12.0, 0.0, 0.0))),
                       Arc::new(floor));

    let spheres = [
        ("diffuse", RayColor::new(0.8, 0.2, 0.2), 1.0),
        ("plastic", RayColor::new(0.2, 0.6, 0.2), 0.0),
        ("roughPlastic", RayColor::new(0.2, 0.2, 0.8), 0.3),
        ("metal", RayColor::new(0.95, 0.64, 0.54), 0.0),
        ("roughMetal", RayColor::new(0.91, 0.92, 0.92), 0.25),
        ("dielectric", RayColor::one(), 0.0),
        ("roughDielectric", RayColor::one(), 0.2),
    ];
    let count = spheres.len() as Float;
    for (i, (bsdf, color, roughness)) in spheres.iter().enumerate() {
        let x = (i as Float - 0.5 * (count - 1.0)) * 1.1;
        builder.add_object(Arc::new(Sphere::new(Vector3f::new(x, 0.5, 0.0), 0.5)),
                           material(bsdf, bsdf, *color, *roughness)?);
    }

    builder
        .add_light(Box::new(BackgroundLight::new(RayColor::new(0.3, 0.4, 0.6))))
        .add_light(Box::new(DirectionalLight::new(Vector3f::new(-0.4, -1.0, -0.3), RayColor::splat(2.0))))
        .add_light(Box::new(PointLight::new(Vector3f::new(0.0, 3.0, 3.0), RayColor::splat(8.0))));

    let camera = PerspectiveCamera::new(Vector3f::new(0.0, 2.0, 8.0), Vector3f::new(0.0, 0.5, 0.0),
                                        Vector3f::new(0.0, 1.0, 0.0), (45.0 as Float).to_radians(), aspect);
    Ok(ScenePreset { name: "materials", scene: builder.build()?, camera })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sensor::Sensor;

    #[test]
    fn test_every_preset_builds() {
        for name in SCENE_NAMES.iter() {
            let preset = by_name(name, 1.5).unwrap();
            assert_eq!(preset.name, *name);
            assert!(!preset.scene.lights().is_empty());
        }
        assert!(by_name("sponza", 1.0).is_err());
    }

    #[test]
    fn test_cornell_camera_sees_the_back_wall() {
        let preset = cornell_box(1.0).unwrap();
        let ray = preset.camera.generate_ray(&crate::math::constants::Vector2f::new(0.5, 0.5));
        let mut hit = crate::core::interaction::HitPoint::default();
        preset.scene.traverse(&ray, &mut hit);
        assert!(!hit.is_miss());
        assert!((hit.distance - 4.4).abs() < 1e-3);
    }
}
