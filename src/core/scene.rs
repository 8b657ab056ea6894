// Copyright @yucwang 2026

use crate::core::bvh::BVH;
use crate::core::emitter::Emitter;
use crate::core::error::RenderError;
use crate::core::interaction::{HitPoint, IntersectionData, MaterialParams, ShadingData};
use crate::core::material::Material;
use crate::core::medium::Medium;
use crate::core::shape::{Shape, ShapeHit};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;
use crate::math::spectrum::Wavelength;
use log::{info, warn};
use std::sync::Arc;

/// Distance a secondary ray starts away from the surface it leaves.
pub const RAY_OFFSET: Float = 0.001;

/// Fraction of a shadow segment that is tested for occluders.
pub const SHADOW_RAY_SCALE: Float = 0.999;

/// Segment from `from` towards a point `distance` away along `dir`. Both
/// ends stop short of the surfaces they touch, so neither endpoint occludes it.
pub fn shadow_ray(from: Vector3f, dir: Vector3f, distance: Float) -> Ray3f {
    let max_t = (distance * SHADOW_RAY_SCALE - RAY_OFFSET).max(0.0);
    Ray3f::offset(from, dir, RAY_OFFSET, Some(max_t))
}

/// Geometry bound to a material. Objects without a material only mark the
/// boundary of their medium.
pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub material: Option<Arc<Material>>,
    pub medium: Option<Arc<dyn Medium>>,
}

impl SceneObject {
    pub fn is_medium_boundary(&self) -> bool {
        self.material.is_none()
    }
}

#[derive(Debug, Copy, Clone)]
enum Primitive {
    Object(u32),
    Light(u32),
}

pub struct Scene {
    objects: Vec<SceneObject>,
    lights: Vec<Arc<dyn Emitter>>,
    global_lights: Vec<Arc<dyn Emitter>>,
    primitives: Vec<Primitive>,
    bvh: BVH,
    bounds: AABB,
}

impl Scene {
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn lights(&self) -> &[Arc<dyn Emitter>] {
        &self.lights
    }

    /// Lights no ray can hit, evaluated when a path leaves the scene.
    pub fn global_lights(&self) -> &[Arc<dyn Emitter>] {
        &self.global_lights
    }

    pub fn hit_object(&self, object_id: u32) -> Option<&SceneObject> {
        self.objects.get(object_id as usize)
    }

    pub fn hit_light(&self, light_id: u32) -> Option<&dyn Emitter> {
        self.lights.get(light_id as usize).map(|light| light.as_ref())
    }

    fn primitive_shape(&self, primitive: Primitive) -> Option<&dyn Shape> {
        match primitive {
            Primitive::Object(id) => Some(self.objects[id as usize].shape.as_ref()),
            Primitive::Light(id) => self.lights[id as usize].shape(),
        }
    }

    /// Hit of `primitive`, or None when its material mask cuts the surface away.
    fn intersect_primitive(&self, primitive: Primitive, ray: &Ray3f) -> Option<ShapeHit> {
        let hit = self.primitive_shape(primitive)?.ray_intersection(ray)?;
        if let Primitive::Object(id) = primitive {
            if let Some(material) = &self.objects[id as usize].material {
                if !material.mask_value(&hit.uv) {
                    return None;
                }
            }
        }
        Some(hit)
    }

    /// Nearest hit along the ray.
    pub fn traverse(&self, ray: &Ray3f, hit_point: &mut HitPoint) {
        let mut segment = *ray;
        self.bvh.traverse(ray, |prim, max_t| {
            segment.max_t = max_t;
            let primitive = self.primitives[prim];
            let hit = self.intersect_primitive(primitive, &segment)?;
            let (object_id, sub_object_id) = match primitive {
                Primitive::Object(id) => (id, 0),
                Primitive::Light(id) => (id, HitPoint::LIGHT_OBJECT),
            };
            hit_point.set(hit.distance, object_id, sub_object_id);
            hit_point.uv = hit.uv;
            Some(hit.distance)
        });
    }

    /// True when anything blocks the ray segment. Medium boundaries are transparent.
    pub fn traverse_shadow(&self, ray: &Ray3f) -> bool {
        self.bvh.traverse_any(ray, |prim| {
            let primitive = self.primitives[prim];
            if let Primitive::Object(id) = primitive {
                if self.objects[id as usize].is_medium_boundary() {
                    return false;
                }
            }
            self.intersect_primitive(primitive, ray).is_some()
        })
    }

    pub fn evaluate_intersection(&self, ray: &Ray3f, hit_point: &HitPoint) -> IntersectionData {
        debug_assert!(!hit_point.is_miss());
        let hit = ShapeHit { distance: hit_point.distance, uv: hit_point.uv };

        if hit_point.is_light() {
            let shape = self.lights.get(hit_point.object_id as usize).and_then(|light| light.shape());
            return match shape {
                Some(shape) => {
                    let geometry = shape.evaluate_intersection(ray, &hit);
                    IntersectionData {
                        frame: geometry.frame,
                        position: geometry.position,
                        tex_coord: geometry.tex_coord,
                        material: None,
                    }
                }
                None => IntersectionData::default(),
            };
        }

        let object = match self.hit_object(hit_point.object_id) {
            Some(object) => object,
            None => return IntersectionData::default(),
        };
        let geometry = object.shape.evaluate_intersection(ray, &hit);

        let mut frame = geometry.frame;
        if let Some(material) = &object.material {
            if material.normal_map.is_some() {
                let normal = frame.from_local(&material.normal_vector(&geometry.tex_coord)).normalize();
                frame = Frame::from_normal_tangent(&normal, &frame.x);
            }
        }

        IntersectionData {
            frame,
            position: geometry.position,
            tex_coord: geometry.tex_coord,
            material: object.material.clone(),
        }
    }

    pub fn evaluate_shading_data(&self, wavelength: &Wavelength, shading_data: &mut ShadingData) {
        match shading_data.intersection.material.clone() {
            Some(material) => material.evaluate_shading_data(wavelength, shading_data),
            None => shading_data.material_params = MaterialParams::default(),
        }
    }

    /// Medium of the innermost boundary containing `point`.
    pub fn medium_at_point(&self, point: &Vector3f) -> Option<&dyn Medium> {
        self.objects.iter()
            .filter(|object| object.shape.contains(point))
            .filter_map(|object| object.medium.as_deref())
            .last()
    }
}

pub struct SceneBuilder {
    objects: Vec<SceneObject>,
    lights: Vec<Box<dyn Emitter>>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self { objects: Vec::new(), lights: Vec::new() }
    }

    pub fn add_object(&mut self, shape: Arc<dyn Shape>, material: Arc<Material>) -> &mut Self {
        self.objects.push(SceneObject { shape, material: Some(material), medium: None });
        self
    }

    pub fn add_medium_boundary(&mut self, shape: Arc<dyn Shape>, medium: Arc<dyn Medium>) -> &mut Self {
        self.objects.push(SceneObject { shape, material: None, medium: Some(medium) });
        self
    }

    pub fn add_light(&mut self, light: Box<dyn Emitter>) -> &mut Self {
        self.lights.push(light);
        self
    }

    pub fn build(self) -> Result<Scene, RenderError> {
        if self.objects.is_empty() && self.lights.is_empty() {
            return Err(RenderError::InvalidConfig(String::from("scene is empty")));
        }
        if self.lights.is_empty() {
            warn!("Scene has no lights, only emissive materials will contribute.");
        }

        let mut primitives = Vec::new();
        let mut prim_bounds = Vec::new();
        for (id, object) in self.objects.iter().enumerate() {
            primitives.push(Primitive::Object(id as u32));
            prim_bounds.push(object.shape.bounding_box());
        }
        for (id, light) in self.lights.iter().enumerate() {
            if let Some(shape) = light.shape() {
                primitives.push(Primitive::Light(id as u32));
                prim_bounds.push(shape.bounding_box());
            }
        }

        let bvh = BVH::new(&prim_bounds);
        let bounds = bvh.bounds();

        let mut lights: Vec<Arc<dyn Emitter>> = Vec::with_capacity(self.lights.len());
        for mut light in self.lights {
            light.set_scene_bounds(&bounds);
            lights.push(Arc::from(light));
        }
        let global_lights = lights.iter()
            .filter(|light| light.shape().is_none() && !light.is_delta())
            .cloned()
            .collect();

        info!("Scene built: {} objects, {} lights, {} primitives.",
              self.objects.len(), lights.len(), primitives.len());

        Ok(Scene { objects: self.objects, lights, global_lights, primitives, bvh, bounds })
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitters::area::AreaLight;
    use crate::emitters::background::BackgroundLight;
    use crate::math::spectrum::RayColor;
    use crate::media::homogeneous_medium::HomogeneousMedium;
    use crate::shapes::rectangle::Rectangle;
    use crate::shapes::sphere::Sphere;
    use crate::textures::constant::ConstantTexture;

    fn test_scene() -> Scene {
        let mut builder = SceneBuilder::new();
        builder.add_object(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0)),
                           Arc::new(Material::new("sphere")));
        builder.add_object(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, 10.0), 1.0)),
                           Arc::new(Material::new("far")));
        let light_shape = Rectangle::new(Vector3f::new(-1.0, 3.0, 4.0),
                                         Vector3f::new(2.0, 0.0, 0.0),
                                         Vector3f::new(0.0, 0.0, 2.0));
        builder.add_light(Box::new(AreaLight::new(Arc::new(light_shape), RayColor::one())));
        builder.add_light(Box::new(BackgroundLight::new(RayColor::splat(0.5))));
        builder.build().unwrap()
    }

    fn ray(o: Vector3f, d: Vector3f) -> Ray3f {
        Ray3f::new(o, d, None, None)
    }

    #[test]
    fn test_traverse_nearest_object() {
        let scene = test_scene();
        let mut hit = HitPoint::default();
        scene.traverse(&ray(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0)), &mut hit);
        assert_eq!(hit.object_id, 0);
        assert!(!hit.is_light());
        assert!((hit.distance - 4.0).abs() < 1e-4);

        let data = scene.evaluate_intersection(&ray(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0)), &hit);
        assert!((data.normal().z + 1.0).abs() < 1e-4);
        assert!(data.material.is_some());
    }

    #[test]
    fn test_traverse_hits_light() {
        let scene = test_scene();
        let mut hit = HitPoint::default();
        let r = ray(Vector3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 1.0, 0.0));
        scene.traverse(&r, &mut hit);
        // starts inside the sphere, so the far wall of the sphere comes first
        assert_eq!(hit.object_id, 0);

        let r = ray(Vector3f::new(0.0, 1.5, 5.0), Vector3f::new(0.0, 1.0, 0.0));
        let mut hit = HitPoint::default();
        scene.traverse(&r, &mut hit);
        assert!(hit.is_light());
        assert!((hit.distance - 1.5).abs() < 1e-4);
        assert!(scene.evaluate_intersection(&r, &hit).material.is_none());
    }

    #[test]
    fn test_shadow_and_globals() {
        let scene = test_scene();
        let mut blocked = ray(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0));
        blocked.max_t = 3.9;
        assert!(!scene.traverse_shadow(&blocked));
        blocked.max_t = 4.1;
        assert!(scene.traverse_shadow(&blocked));

        assert_eq!(scene.lights().len(), 2);
        assert_eq!(scene.global_lights().len(), 1);
        assert!(scene.bounds().is_valid());
    }

    #[test]
    fn test_shadow_ray_stops_short_of_nearby_light() {
        let preset = crate::scenes::empty_cornell_box(1.0).unwrap();
        let light = &preset.scene.lights()[0];
        let wavelength = Wavelength::default();
        for &(height, u) in [(0.48, 0.5), (0.8, 0.1), (0.7, 0.9), (0.0, 0.3)].iter() {
            let receiver = Vector3f::new(0.0, height, 0.0);
            let sample = crate::math::constants::Vector2f::new(u, 1.0 - u);
            let illumination = light.illuminate(&receiver, &sample, &wavelength).unwrap();
            let segment = shadow_ray(receiver, illumination.direction_to_light, illumination.distance);
            assert!(segment.max_t < illumination.distance);
            assert!(!preset.scene.traverse_shadow(&segment),
                    "light {} away occludes itself", illumination.distance);
        }

        // the floor still blocks a point below it
        let below = Vector3f::new(0.0, -1.5, 0.0);
        let to_light = Vector3f::new(0.0, 0.98, 0.0) - below;
        assert!(preset.scene.traverse_shadow(&shadow_ray(below, to_light, to_light.norm())));
    }

    #[test]
    fn test_mask_cuts_surface() {
        let mut material = Material::new("masked");
        material.mask_map = Some(Arc::new(ConstantTexture::new(RayColor::zero())));
        let mut builder = SceneBuilder::new();
        builder.add_object(Arc::new(Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0)), Arc::new(material));
        let scene = builder.build().unwrap();
        let mut hit = HitPoint::default();
        scene.traverse(&ray(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0)), &mut hit);
        assert!(hit.is_miss());
    }

    #[test]
    fn test_medium_lookup() {
        let mut builder = SceneBuilder::new();
        builder.add_medium_boundary(Arc::new(Sphere::new(Vector3f::zeros(), 2.0)),
                                    Arc::new(HomogeneousMedium::absorptive(RayColor::one())));
        let scene = builder.build().unwrap();
        assert!(scene.medium_at_point(&Vector3f::zeros()).is_some());
        assert!(scene.medium_at_point(&Vector3f::new(3.0, 0.0, 0.0)).is_none());
        assert!(scene.hit_object(0).unwrap().is_medium_boundary());
        let mut shadow = ray(Vector3f::new(-5.0, 0.0, 0.0), Vector3f::new(1.0, 0.0, 0.0));
        shadow.max_t = 10.0;
        assert!(!scene.traverse_shadow(&shadow));
    }

    #[test]
    fn test_empty_scene_is_rejected() {
        assert!(SceneBuilder::new().build().is_err());
    }
}
