// Copyright @yucwang 2026

use crate::core::context::{IntegratorContext, RenderingContext, RenderingParams};
use crate::core::film::Film;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RayColor;

/// Read-only state handed to every integrator call of one iteration.
pub struct RenderParams<'a> {
    pub scene: &'a Scene,
    pub camera: &'a dyn Sensor,
    pub film: &'a Film,
    pub settings: &'a RenderingParams,
    pub iteration: u32,
    /// Parent of every profiling span opened while rendering the iteration.
    pub span: tracing::Span,
}

pub trait Integrator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Per-thread scratch data. Called once for each render thread.
    fn create_context(&self) -> Option<Box<dyn IntegratorContext>> {
        None
    }

    /// Runs before any pixel of the iteration. `contexts` holds the scratch
    /// of every render thread.
    fn pre_render(&mut self, _params: &RenderParams, _contexts: &mut [RenderingContext]) {}

    /// Radiance arriving at the camera along `ray`. Light tracing integrators
    /// may also splat into `params.film`.
    fn render_pixel(&self, ray: &Ray3f, params: &RenderParams, ctx: &mut RenderingContext) -> RayColor;
}
