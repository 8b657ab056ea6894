// Copyright @yucwang 2026

use crate::core::bsdf::EventType;
use crate::core::error::RenderError;
use crate::core::rng::LcgRng;
use crate::math::constants::{Float, Vector3f};
use crate::math::spectrum::{RayColor, Wavelength};
use std::any::Any;
use std::ops::AddAssign;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LightSamplingStrategy {
    /// One light picked uniformly per vertex.
    Single,
    /// Every light sampled at every vertex.
    All,
}

/// Settings shared by every integrator.
#[derive(Debug, Clone)]
pub struct RenderingParams {
    pub max_ray_depth: u32,
    pub min_russian_roulette_depth: u32,
    pub light_sampling_strategy: LightSamplingStrategy,
    pub tile_size: usize,
    /// Zero picks the number of available cores.
    pub num_threads: usize,
    pub seed: u64,
}

impl Default for RenderingParams {
    fn default() -> Self {
        Self {
            max_ray_depth: 20,
            min_russian_roulette_depth: 2,
            light_sampling_strategy: LightSamplingStrategy::Single,
            tile_size: 16,
            num_threads: 0,
            seed: 0,
        }
    }
}

impl RenderingParams {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_ray_depth == 0 {
            return Err(RenderError::InvalidConfig(String::from("max_ray_depth must be at least 1")));
        }
        if self.tile_size == 0 {
            return Err(RenderError::InvalidConfig(String::from("tile_size must be positive")));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct RayCounters {
    pub num_rays: u64,
    pub num_shadow_rays: u64,
    pub num_shadow_rays_hit: u64,
}

impl RayCounters {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl AddAssign for RayCounters {
    fn add_assign(&mut self, other: Self) {
        self.num_rays += other.num_rays;
        self.num_shadow_rays += other.num_shadow_rays;
        self.num_shadow_rays_hit += other.num_shadow_rays_hit;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PathTerminationReason {
    None,
    HitBackground,
    HitLight,
    Depth,
    Throughput,
    RussianRoulette,
    NoSampledEvent,
    AttenuatedInMedium,
}

/// One vertex of a recorded camera path.
#[derive(Debug, Clone)]
pub struct PathVertexRecord {
    pub ray_origin: Vector3f,
    pub ray_dir: Vector3f,
    pub distance: Float,
    pub object_id: u32,
    pub hit_light: bool,
    pub position: Vector3f,
    pub normal: Vector3f,
    pub throughput: RayColor,
    pub event: EventType,
}

/// Filled by integrators when a context asks for it. Used to debug a single pixel.
#[derive(Debug, Clone)]
pub struct PathDebugData {
    pub vertices: Vec<PathVertexRecord>,
    pub termination_reason: PathTerminationReason,
}

impl Default for PathDebugData {
    fn default() -> Self {
        Self { vertices: Vec::new(), termination_reason: PathTerminationReason::None }
    }
}

/// Integrator specific per-thread scratch data.
pub trait IntegratorContext: Any + Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Everything one render thread owns.
pub struct RenderingContext {
    pub rng: LcgRng,
    pub wavelength: Wavelength,
    pub counters: RayCounters,
    pub path_debug: Option<PathDebugData>,
    pub integrator_context: Option<Box<dyn IntegratorContext>>,
}

impl RenderingContext {
    pub fn new(seed: u64, integrator_context: Option<Box<dyn IntegratorContext>>) -> Self {
        Self {
            rng: LcgRng::new(seed),
            wavelength: Wavelength::default(),
            counters: RayCounters::default(),
            path_debug: None,
            integrator_context,
        }
    }

    /// Picks a fresh hero wavelength for the next pixel sample.
    pub fn start_sample(&mut self) {
        self.wavelength = Wavelength::new(self.rng.next_f32());
    }

    pub fn enable_path_debugging(&mut self) {
        self.path_debug = Some(PathDebugData::default());
    }

    /// Appends a vertex when path debugging is on. The record is only built then.
    pub fn record_vertex<F: FnOnce() -> PathVertexRecord>(&mut self, record: F) {
        if let Some(debug) = self.path_debug.as_mut() {
            debug.vertices.push(record());
        }
    }

    pub fn finish_path(&mut self, reason: PathTerminationReason) {
        if let Some(debug) = self.path_debug.as_mut() {
            debug.termination_reason = reason;
        }
    }

    pub fn integrator_context_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.integrator_context.as_mut()?.as_any_mut().downcast_mut::<T>()
    }

    pub fn integrator_context<T: 'static>(&self) -> Option<&T> {
        self.integrator_context.as_ref()?.as_any().downcast_ref::<T>()
    }
}
