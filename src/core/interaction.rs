// Copyright @yucwang 2023

use std::sync::Arc;

use crate::core::material::Material;
use crate::math::constants::{ Float, Vector2f, Vector3f, FLOAT_MAX };
use crate::math::frame::Frame;
use crate::math::spectrum::RayColor;

/// Result of a scene traversal. Only lives until the intersection is evaluated.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HitPoint {
    pub object_id: u32,
    pub sub_object_id: u32,
    pub distance: Float,
    pub uv: Vector2f,
}

impl HitPoint {
    /// `sub_object_id` of a traceable light.
    pub const LIGHT_OBJECT: u32 = u32::MAX;
    pub const INVALID_OBJECT: u32 = u32::MAX;
    pub const DEFAULT_DISTANCE: Float = FLOAT_MAX;

    pub fn set(&mut self, distance: Float, object_id: u32, sub_object_id: u32) {
        self.distance = distance;
        self.object_id = object_id;
        self.sub_object_id = sub_object_id;
    }

    pub fn is_miss(&self) -> bool {
        self.distance == Self::DEFAULT_DISTANCE
    }

    pub fn is_light(&self) -> bool {
        !self.is_miss() && self.sub_object_id == Self::LIGHT_OBJECT
    }
}

impl Default for HitPoint {
    fn default() -> Self {
        Self {
            object_id: Self::INVALID_OBJECT,
            sub_object_id: 0,
            distance: Self::DEFAULT_DISTANCE,
            uv: Vector2f::zeros(),
        }
    }
}

#[derive(Clone)]
pub struct IntersectionData {
    pub frame: Frame,
    pub position: Vector3f,
    pub tex_coord: Vector2f,
    pub material: Option<Arc<Material>>,
}

impl Default for IntersectionData {
    fn default() -> Self {
        Self {
            frame: Frame::default(),
            position: Vector3f::zeros(),
            tex_coord: Vector2f::zeros(),
            material: None,
        }
    }
}

impl IntersectionData {
    pub fn normal(&self) -> Vector3f {
        self.frame.z
    }

    pub fn world_to_local(&self, v: &Vector3f) -> Vector3f {
        self.frame.to_local(v)
    }

    pub fn local_to_world(&self, v: &Vector3f) -> Vector3f {
        self.frame.from_local(v)
    }

    pub fn cos_theta(&self, dir: &Vector3f) -> Float {
        self.frame.cos_theta(dir)
    }
}

/// Cauchy dispersion coefficients, micrometers. Defaults are BK7 glass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DispersionParams {
    pub enable: bool,
    pub c: Float,
    pub d: Float,
}

impl Default for DispersionParams {
    fn default() -> Self {
        Self { enable: false, c: 0.00420, d: 0.0 }
    }
}

/// Material inputs resolved at one surface point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaterialParams {
    pub base_color: RayColor,
    pub emission_color: RayColor,
    pub roughness: Float,
    pub roughness_anisotropy: Float,
    pub metalness: Float,
    pub ior: Float,
    pub k: Float,
    pub dispersion: DispersionParams,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            base_color: RayColor::splat(0.7),
            emission_color: RayColor::zero(),
            roughness: 0.1,
            roughness_anisotropy: 0.0,
            metalness: 0.0,
            ior: 1.5,
            k: 4.0,
            dispersion: DispersionParams::default(),
        }
    }
}

#[derive(Clone, Default)]
pub struct ShadingData {
    pub intersection: IntersectionData,
    pub material_params: MaterialParams,
    pub outgoing_dir_world_space: Vector3f,
}

impl ShadingData {
    pub fn material(&self) -> Option<&Material> {
        self.intersection.material.as_deref()
    }

    pub fn position(&self) -> Vector3f {
        self.intersection.position
    }

    pub fn normal(&self) -> Vector3f {
        self.intersection.normal()
    }
}
