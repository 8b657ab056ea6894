// Copyright @yucwang 2023

use bitflags::bitflags;

use crate::core::computation_node::ComputationNode;
use crate::core::interaction::MaterialParams;
use crate::core::rng::LcgRng;
use crate::math::constants::{ Float, Vector3f };
use crate::math::spectrum::{ RayColor, Wavelength };

/// Rough variants switch to their smooth counterpart below this roughness.
pub const SPECULAR_EVENT_ROUGHNESS_THRESHOLD: Float = 0.005;

bitflags! {
    /// Kind of scattering event. The empty set means nothing was sampled.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct EventType: u8 {
        const DIFFUSE      = 0b0000_0001;
        const GLOSSY       = 0b0000_0010;
        const SPECULAR     = 0b0000_0100;
        const REFLECTION   = 0b0001_0000;
        const TRANSMISSION = 0b0010_0000;

        const DIFFUSE_REFLECTION    = Self::DIFFUSE.bits() | Self::REFLECTION.bits();
        const GLOSSY_REFLECTION     = Self::GLOSSY.bits() | Self::REFLECTION.bits();
        const GLOSSY_REFRACTION     = Self::GLOSSY.bits() | Self::TRANSMISSION.bits();
        const SPECULAR_REFLECTION   = Self::SPECULAR.bits() | Self::REFLECTION.bits();
        const SPECULAR_REFRACTION   = Self::SPECULAR.bits() | Self::TRANSMISSION.bits();
    }
}

impl EventType {
    pub fn is_specular(&self) -> bool {
        self.contains(EventType::SPECULAR)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PdfDirection {
    Forward,
    Reverse,
}

/// Inputs of `BSDF::sample`. Directions are local, pointing away from the surface.
pub struct SamplingContext<'a> {
    pub params: &'a MaterialParams,
    pub outgoing_dir: Vector3f,
    pub sample: Vector3f,
    pub wavelength: &'a mut Wavelength,
    pub rng: &'a mut LcgRng,
}

/// Inputs of `BSDF::evaluate` and `BSDF::pdf`.
pub struct EvaluationContext<'a> {
    pub params: &'a MaterialParams,
    pub outgoing_dir: Vector3f,
    pub incoming_dir: Vector3f,
    pub wavelength: &'a Wavelength,
    pub rng: &'a mut LcgRng,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BSDFSampleRecord {
    pub incoming_dir: Vector3f,
    /// f·|cos θi| / pdf
    pub weight: RayColor,
    pub pdf: Float,
    pub event: EventType,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BSDFEvalResult {
    /// f·|cos θi|
    pub value: RayColor,
    pub direct_pdf_w: Float,
    pub reverse_pdf_w: Float,
}

impl Default for BSDFEvalResult {
    fn default() -> Self {
        Self {
            value: RayColor::zero(),
            direct_pdf_w: 0.0,
            reverse_pdf_w: 0.0,
        }
    }
}

impl BSDFEvalResult {
    pub fn new(value: RayColor, direct_pdf_w: Float, reverse_pdf_w: Float) -> Self {
        Self { value, direct_pdf_w, reverse_pdf_w }
    }

    pub fn is_zero(&self) -> bool {
        self.value.almost_zero()
    }
}

pub trait BSDF: ComputationNode + Send + Sync {
    /// Name used by the factory.
    fn short_name(&self) -> &'static str;

    fn is_delta(&self) -> bool {
        false
    }

    fn sample(&self, ctx: &mut SamplingContext) -> Option<BSDFSampleRecord>;

    fn evaluate(&self, ctx: &mut EvaluationContext) -> BSDFEvalResult;

    fn pdf(&self, ctx: &mut EvaluationContext, dir: PdfDirection) -> Float;
}

/// Index of refraction after applying Cauchy dispersion for the hero wavelength.
/// The flag is set when a multi-wavelength carrier has to collapse.
pub(crate) fn dispersed_ior(params: &MaterialParams, wavelength: &Wavelength) -> (Float, bool) {
    let mut ior = params.ior;
    if !params.dispersion.enable {
        return (ior, false);
    }
    let lambda = wavelength.micrometers();
    let lambda2 = lambda * lambda;
    ior += params.dispersion.c / lambda2;
    ior += params.dispersion.d / (lambda2 * lambda2);
    (ior, !wavelength.is_single)
}
