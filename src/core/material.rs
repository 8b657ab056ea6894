// Copyright @yucwang 2026

use std::sync::Arc;

use log::warn;

use crate::core::bsdf::{BSDFEvalResult, EvaluationContext, EventType, PdfDirection,
                        SamplingContext, BSDF};
use crate::core::error::RenderError;
use crate::core::interaction::{DispersionParams, MaterialParams, ShadingData};
use crate::core::rng::LcgRng;
use crate::core::texture::Texture;
use crate::materials::create_bsdf;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::numeric::lerp;
use crate::math::spectrum::{RayColor, Wavelength};

const MASK_THRESHOLD: Float = 0.5;

/// Color input: base value modulated by an optional texture.
#[derive(Clone)]
pub struct ColorParameter {
    pub base_value: RayColor,
    pub texture: Option<Arc<dyn Texture>>,
}

impl ColorParameter {
    pub fn new(base_value: RayColor) -> Self {
        Self { base_value, texture: None }
    }

    pub fn evaluate(&self, uv: &Vector2f) -> RayColor {
        match &self.texture {
            Some(texture) => self.base_value * texture.eval(uv),
            None => self.base_value,
        }
    }
}

/// Scalar input: base value modulated by the first channel of an optional texture.
#[derive(Clone)]
pub struct ScalarParameter {
    pub base_value: Float,
    pub texture: Option<Arc<dyn Texture>>,
}

impl ScalarParameter {
    pub fn new(base_value: Float) -> Self {
        Self { base_value, texture: None }
    }

    pub fn evaluate(&self, uv: &Vector2f) -> Float {
        match &self.texture {
            Some(texture) => self.base_value * texture.eval(uv)[0],
            None => self.base_value,
        }
    }
}

/// Result of sampling a material, with the direction back in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MaterialSample {
    pub incoming_dir: Vector3f,
    pub weight: RayColor,
    pub pdf: Float,
    pub event: EventType,
}

/// Binds one BSDF to its spatially varying parameters.
pub struct Material {
    pub name: String,
    bsdf: Option<Box<dyn BSDF>>,
    pub base_color: ColorParameter,
    pub emission: ColorParameter,
    pub roughness: ScalarParameter,
    pub roughness_anisotropy: ScalarParameter,
    pub metalness: ScalarParameter,
    pub ior: Float,
    pub k: Float,
    pub normal_map: Option<Arc<dyn Texture>>,
    pub normal_map_strength: Float,
    pub mask_map: Option<Arc<dyn Texture>>,
    pub dispersion: DispersionParams,
}

impl Material {
    pub const DEFAULT_BSDF: &'static str = "diffuse";

    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bsdf: create_bsdf(Self::DEFAULT_BSDF).ok(),
            base_color: ColorParameter::new(RayColor::splat(0.7)),
            emission: ColorParameter::new(RayColor::zero()),
            roughness: ScalarParameter::new(0.1),
            roughness_anisotropy: ScalarParameter::new(0.0),
            metalness: ScalarParameter::new(0.0),
            ior: 1.5,
            k: 4.0,
            normal_map: None,
            normal_map_strength: 1.0,
            mask_map: None,
            dispersion: DispersionParams::default(),
        }
    }

    /// Material with no BSDF at all. Pure absorber.
    pub fn absorbing(name: &str) -> Self {
        let mut material = Self::new(name);
        material.bsdf = None;
        material
    }

    pub fn set_bsdf(&mut self, name: &str) -> Result<(), RenderError> {
        self.bsdf = Some(create_bsdf(name)?);
        Ok(())
    }

    pub fn with_bsdf(mut self, bsdf: Box<dyn BSDF>) -> Self {
        self.bsdf = Some(bsdf);
        self
    }

    pub fn bsdf(&self) -> Option<&dyn BSDF> {
        self.bsdf.as_deref()
    }

    pub fn is_emissive(&self) -> bool {
        !self.emission.base_value.almost_zero()
    }

    pub fn is_delta(&self) -> bool {
        self.bsdf.as_ref().map_or(false, |bsdf| bsdf.is_delta())
    }

    /// Validates parameters and clamps colors into their physical range.
    pub fn compile(&mut self) -> Result<(), RenderError> {
        let invalid = |reason: &str| RenderError::InvalidMaterial {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        let scalars = [
            ("roughness", self.roughness.base_value),
            ("roughness anisotropy", self.roughness_anisotropy.base_value),
            ("metalness", self.metalness.base_value),
        ];
        for (label, value) in scalars.iter() {
            if !value.is_finite() {
                return Err(invalid(&format!("{} is not finite", label)));
            }
        }
        if !self.base_color.base_value.is_valid() {
            return Err(invalid("base color must be finite and non-negative"));
        }
        if !self.emission.base_value.is_valid() {
            return Err(invalid("emission must be finite and non-negative"));
        }
        if !(self.ior.is_finite() && self.ior >= 0.0) {
            return Err(invalid("index of refraction must be non-negative"));
        }
        if !(self.k.is_finite() && self.k >= 0.0) {
            return Err(invalid("extinction coefficient must be non-negative"));
        }
        if !(self.normal_map_strength.is_finite() && self.normal_map_strength >= 0.0) {
            return Err(invalid("normal map strength must be non-negative"));
        }

        if self.base_color.base_value.max() > 1.0 {
            warn!("material '{}': base color clamped to [0, 1]", self.name);
        }
        self.base_color.base_value = self.base_color.base_value.clamp01();
        self.roughness.base_value = self.roughness.base_value.max(0.0).min(1.0);
        self.roughness_anisotropy.base_value = self.roughness_anisotropy.base_value.max(-1.0).min(1.0);
        self.metalness.base_value = self.metalness.base_value.max(0.0).min(1.0);
        Ok(())
    }

    /// Tangent space normal, z-up when there is no normal map.
    pub fn normal_vector(&self, uv: &Vector2f) -> Vector3f {
        let z = Vector3f::new(0.0, 0.0, 1.0);
        let texture = match &self.normal_map {
            Some(texture) => texture,
            None => return z,
        };

        let texel = texture.eval(uv);
        let x = 2.0 * texel[0] - 1.0;
        let y = 2.0 * texel[1] - 1.0;
        let mapped = Vector3f::new(x, y, (1.0 - x * x - y * y).max(0.0).sqrt());

        let t = self.normal_map_strength;
        let normal = Vector3f::new(lerp(z.x, mapped.x, t), lerp(z.y, mapped.y, t), lerp(z.z, mapped.z, t));
        if normal.norm_squared() <= 0.0 {
            return z;
        }
        normal.normalize()
    }

    /// False where the mask cuts the surface away.
    pub fn mask_value(&self, uv: &Vector2f) -> bool {
        match &self.mask_map {
            Some(mask) => mask.eval(uv)[0] > MASK_THRESHOLD,
            None => true,
        }
    }

    pub fn evaluate_shading_data(&self, _wavelength: &Wavelength, shading_data: &mut ShadingData) {
        let uv = shading_data.intersection.tex_coord;
        shading_data.material_params = MaterialParams {
            base_color: self.base_color.evaluate(&uv),
            emission_color: self.emission.evaluate(&uv),
            roughness: self.roughness.evaluate(&uv),
            roughness_anisotropy: self.roughness_anisotropy.evaluate(&uv),
            metalness: self.metalness.evaluate(&uv),
            ior: self.ior,
            k: self.k,
            dispersion: self.dispersion,
        };
    }

    pub fn sample(&self, wavelength: &mut Wavelength, shading_data: &ShadingData,
                  u: Vector3f, rng: &mut LcgRng) -> Option<MaterialSample> {
        let bsdf = self.bsdf.as_ref()?;
        let intersection = &shading_data.intersection;

        let mut ctx = SamplingContext {
            params: &shading_data.material_params,
            outgoing_dir: intersection.world_to_local(&shading_data.outgoing_dir_world_space),
            sample: u,
            wavelength,
            rng,
        };
        let record = bsdf.sample(&mut ctx)?;

        debug_assert!(record.pdf >= 0.0 && record.pdf.is_finite());
        debug_assert!(record.weight.is_valid());

        Some(MaterialSample {
            incoming_dir: intersection.local_to_world(&record.incoming_dir).normalize(),
            weight: record.weight,
            pdf: record.pdf,
            event: record.event,
        })
    }

    pub fn evaluate(&self, wavelength: &Wavelength, shading_data: &ShadingData,
                    incoming_dir_world_space: &Vector3f, rng: &mut LcgRng) -> BSDFEvalResult {
        let bsdf = match &self.bsdf {
            Some(bsdf) => bsdf,
            None => return BSDFEvalResult::default(),
        };
        let intersection = &shading_data.intersection;

        let mut ctx = EvaluationContext {
            params: &shading_data.material_params,
            outgoing_dir: intersection.world_to_local(&shading_data.outgoing_dir_world_space),
            incoming_dir: intersection.world_to_local(incoming_dir_world_space),
            wavelength,
            rng,
        };
        bsdf.evaluate(&mut ctx)
    }

    pub fn pdf(&self, wavelength: &Wavelength, shading_data: &ShadingData,
               incoming_dir_world_space: &Vector3f, dir: PdfDirection, rng: &mut LcgRng) -> Float {
        let bsdf = match &self.bsdf {
            Some(bsdf) => bsdf,
            None => return 0.0,
        };
        let intersection = &shading_data.intersection;

        let mut ctx = EvaluationContext {
            params: &shading_data.material_params,
            outgoing_dir: intersection.world_to_local(&shading_data.outgoing_dir_world_space),
            incoming_dir: intersection.world_to_local(incoming_dir_world_space),
            wavelength,
            rng,
        };
        bsdf.pdf(&mut ctx, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interaction::IntersectionData;
    use crate::math::frame::Frame;
    use crate::textures::checkerboard::CheckerboardTexture;
    use crate::textures::constant::ConstantTexture;

    fn shading_data_for(material: Arc<Material>, normal: Vector3f, outgoing: Vector3f) -> ShadingData {
        let mut intersection = IntersectionData::default();
        intersection.frame = Frame::from_normal(&normal);
        intersection.material = Some(material.clone());
        let mut shading_data = ShadingData {
            intersection,
            material_params: MaterialParams::default(),
            outgoing_dir_world_space: outgoing,
        };
        material.evaluate_shading_data(&Wavelength::default(), &mut shading_data);
        shading_data
    }

    #[test]
    fn test_textured_parameters() {
        let mut material = Material::new("checker");
        material.base_color.base_value = RayColor::splat(0.5);
        material.base_color.texture = Some(Arc::new(CheckerboardTexture::new(
            RayColor::one(), RayColor::zero(), 2.0)));
        let mut shading_data = ShadingData::default();
        shading_data.intersection.tex_coord = Vector2f::new(0.1, 0.1);
        material.evaluate_shading_data(&Wavelength::default(), &mut shading_data);
        assert_eq!(shading_data.material_params.base_color, RayColor::splat(0.5));

        shading_data.intersection.tex_coord = Vector2f::new(0.6, 0.1);
        material.evaluate_shading_data(&Wavelength::default(), &mut shading_data);
        assert!(shading_data.material_params.base_color.is_black());
    }

    #[test]
    fn test_sample_returns_world_space_direction() {
        let material = Arc::new(Material::new("diffuse"));
        let normal = Vector3f::new(0.0, 1.0, 0.0);
        let shading_data = shading_data_for(material.clone(), normal, Vector3f::new(0.0, 1.0, 0.0));
        let mut rng = LcgRng::new(3);
        let mut wavelength = Wavelength::default();
        for _ in 0..64 {
            let sample = material.sample(&mut wavelength, &shading_data, rng.next_vec3(), &mut rng).unwrap();
            assert!(sample.incoming_dir.dot(&normal) > 0.0);
            let eval = material.evaluate(&wavelength, &shading_data, &sample.incoming_dir, &mut rng);
            assert!((eval.direct_pdf_w - sample.pdf).abs() < 1e-4);
        }
    }

    #[test]
    fn test_absorbing_material_contributes_nothing() {
        let material = Arc::new(Material::absorbing("black hole"));
        let up = Vector3f::new(0.0, 0.0, 1.0);
        let shading_data = shading_data_for(material.clone(), up, up);
        let mut rng = LcgRng::new(0);
        let mut wavelength = Wavelength::default();
        assert!(material.sample(&mut wavelength, &shading_data, rng.next_vec3(), &mut rng).is_none());
        assert!(material.evaluate(&wavelength, &shading_data, &up, &mut rng).value.is_black());
        assert_eq!(material.pdf(&wavelength, &shading_data, &up, PdfDirection::Forward, &mut rng), 0.0);
    }

    #[test]
    fn test_compile_rejects_nan_and_clamps() {
        let mut material = Material::new("bad");
        material.roughness.base_value = Float::NAN;
        assert!(material.compile().is_err());

        let mut material = Material::new("bright");
        material.base_color.base_value = RayColor::new(2.0, 0.5, 0.1);
        material.compile().unwrap();
        assert_eq!(material.base_color.base_value, RayColor::new(1.0, 0.5, 0.1));

        let mut material = Material::new("negative ior");
        material.ior = -1.0;
        assert!(material.compile().is_err());
    }

    #[test]
    fn test_normal_and_mask_maps() {
        let mut material = Material::new("mapped");
        assert_eq!(material.normal_vector(&Vector2f::zeros()), Vector3f::new(0.0, 0.0, 1.0));
        assert!(material.mask_value(&Vector2f::zeros()));

        material.normal_map = Some(Arc::new(ConstantTexture::new(RayColor::new(1.0, 0.5, 1.0))));
        material.normal_map_strength = 1.0;
        let n = material.normal_vector(&Vector2f::zeros());
        assert!((n.x - 1.0).abs() < 1e-5);

        material.mask_map = Some(Arc::new(ConstantTexture::new(RayColor::splat(0.2))));
        assert!(!material.mask_value(&Vector2f::zeros()));
    }
}
