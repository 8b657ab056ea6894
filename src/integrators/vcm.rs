// Copyright @yucwang 2026

//! Vertex connection and merging (Georgiev et al. 2012).
//!
//! Every pixel sample traces one light sub-path and one camera sub-path.
//! Light vertices are connected to the camera and to the camera vertices, and
//! the photons recorded in the previous iteration are merged around each
//! camera vertex. All techniques share one balance heuristic weight built from
//! the running `d_vc`, `d_vm` and `d_vcm` quantities of `PathState`.

use std::any::Any;
use std::thread;

use log::{debug, info};

use crate::core::bsdf::PdfDirection;
use crate::core::context::{IntegratorContext, RenderingContext};
use crate::core::emitter::Emitter;
use crate::core::error::RenderError;
use crate::core::hash_grid::{GridPoint, HashGrid};
use crate::core::integrator::{Integrator, RenderParams};
use crate::core::interaction::{HitPoint, ShadingData};
use crate::core::scene::{shadow_ray, Scene, RAY_OFFSET};
use crate::integrators::path_state::{mis, pdf_w_to_a, PathState};
use crate::math::constants::{Float, Vector3f, PI};
use crate::math::packed::{PackedColorRgbHdr, PackedUnitVector3};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RayColor;

pub const MAX_LIGHT_VERTICES: usize = 256;

const EMISSION_RAY_OFFSET: Float = 0.0005;
const MIN_COSINE: Float = 1.0e-6;

/// Density estimation kernel used when merging photons.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VertexMergingKernel {
    Uniform,
    Epanechnikov,
    Smooth,
}

impl VertexMergingKernel {
    pub fn from_name(name: &str) -> Result<Self, RenderError> {
        match name {
            "uniform" => Ok(VertexMergingKernel::Uniform),
            "epanechnikov" => Ok(VertexMergingKernel::Epanechnikov),
            "smooth" => Ok(VertexMergingKernel::Smooth),
            _ => Err(RenderError::InvalidConfig(format!("unknown merging kernel '{}'", name))),
        }
    }

    /// Kernel value relative to the uniform kernel of the same radius.
    /// `t` is the squared distance over the squared radius.
    pub fn weight(&self, t: Float) -> Float {
        let t = t.max(0.0).min(1.0);
        match self {
            VertexMergingKernel::Uniform => 1.0,
            VertexMergingKernel::Epanechnikov => 2.0 * (1.0 - t),
            VertexMergingKernel::Smooth => 3.0 * (1.0 - t) * (1.0 - t),
        }
    }
}

/// Per technique multipliers. Anything but white biases the image; used to
/// inspect what each technique contributes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TechniqueWeights {
    pub bsdf_sampling: RayColor,
    pub light_sampling: RayColor,
    pub vertex_connecting: RayColor,
    pub vertex_merging: RayColor,
    pub camera_connecting: RayColor,
}

impl Default for TechniqueWeights {
    fn default() -> Self {
        Self {
            bsdf_sampling: RayColor::one(),
            light_sampling: RayColor::one(),
            vertex_connecting: RayColor::one(),
            vertex_merging: RayColor::one(),
            camera_connecting: RayColor::one(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VcmConfig {
    pub use_vertex_connection: bool,
    pub use_vertex_merging: bool,
    pub max_path_length: u32,
    pub initial_merging_radius: Float,
    pub min_merging_radius: Float,
    /// Radius shrink factor per iteration, in (0, 1].
    pub merging_radius_multiplier: Float,
    pub kernel: VertexMergingKernel,
    pub weights: TechniqueWeights,
}

impl Default for VcmConfig {
    fn default() -> Self {
        Self {
            use_vertex_connection: true,
            use_vertex_merging: true,
            max_path_length: 10,
            initial_merging_radius: 0.02,
            min_merging_radius: 0.02,
            merging_radius_multiplier: 1.0,
            kernel: VertexMergingKernel::Uniform,
            weights: TechniqueWeights::default(),
        }
    }
}

impl VcmConfig {
    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |reason: &str| Err(RenderError::InvalidConfig(format!("vcm: {}", reason)));
        if !self.use_vertex_connection && !self.use_vertex_merging {
            return invalid("vertex connection and vertex merging are both disabled");
        }
        if self.max_path_length == 0 {
            return invalid("max_path_length must be at least 1");
        }
        if !(self.min_merging_radius > 0.0 && self.min_merging_radius.is_finite()) {
            return invalid("min_merging_radius must be positive");
        }
        if !(self.initial_merging_radius >= self.min_merging_radius && self.initial_merging_radius.is_finite()) {
            return invalid("initial_merging_radius must not be below min_merging_radius");
        }
        if !(self.merging_radius_multiplier > 0.0 && self.merging_radius_multiplier <= 1.0) {
            return invalid("merging_radius_multiplier must be in (0, 1]");
        }
        Ok(())
    }
}

/// Non-specular vertex of the current light sub-path.
pub struct LightVertex {
    pub shading_data: ShadingData,
    pub throughput: RayColor,
    pub d_vc: Float,
    pub d_vm: Float,
    pub d_vcm: Float,
    pub path_length: u8,
}

/// Light vertex reduced to what merging needs.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct Photon {
    pub position: [f32; 3],
    pub throughput: PackedColorRgbHdr,
    /// Direction towards the previous light vertex.
    pub direction: PackedUnitVector3,
    pub d_vm: f32,
    pub d_vcm: f32,
    pub path_length: u32,
}

impl GridPoint for Photon {
    fn position(&self) -> Vector3f {
        Vector3f::new(self.position[0], self.position[1], self.position[2])
    }
}

/// Scratch owned by one render thread.
pub struct VcmContext {
    /// Photons recorded by this thread during the running iteration.
    pub photons: Vec<Photon>,
    pub light_vertices: Vec<LightVertex>,
}

impl VcmContext {
    pub fn new() -> Self {
        Self { photons: Vec::new(), light_vertices: Vec::with_capacity(MAX_LIGHT_VERTICES) }
    }
}

impl Default for VcmContext {
    fn default() -> Self {
        Self::new()
    }
}

impl IntegratorContext for VcmContext {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub struct VertexConnectionAndMerging {
    config: VcmConfig,
    light_path_count: Float,
    merging_radius_vc: Float,
    merging_radius_vm: Float,
    vertex_merging_normalization: Float,
    mis_vm_weight_factor_vc: Float,
    mis_vc_weight_factor_vc: Float,
    mis_vm_weight_factor_vm: Float,
    mis_vc_weight_factor_vm: Float,
    photon_count_prefix_sum: Vec<usize>,
    photons: Vec<Photon>,
    hash_grid: HashGrid,
}

impl VertexConnectionAndMerging {
    pub fn new(config: VcmConfig) -> Result<Self, RenderError> {
        config.validate()?;
        info!("VCM: connection={} merging={} max_path_length={} radius={} (min {}, x{}) kernel={:?}",
              config.use_vertex_connection, config.use_vertex_merging, config.max_path_length,
              config.initial_merging_radius, config.min_merging_radius,
              config.merging_radius_multiplier, config.kernel);
        let radius = config.initial_merging_radius;
        Ok(Self {
            config,
            light_path_count: 0.0,
            merging_radius_vc: radius,
            merging_radius_vm: radius,
            vertex_merging_normalization: 0.0,
            mis_vm_weight_factor_vc: 0.0,
            mis_vc_weight_factor_vc: 0.0,
            mis_vm_weight_factor_vm: 0.0,
            mis_vc_weight_factor_vm: 0.0,
            photon_count_prefix_sum: Vec::new(),
            photons: Vec::new(),
            hash_grid: HashGrid::new(),
        })
    }

    pub fn config(&self) -> &VcmConfig {
        &self.config
    }

    pub fn merging_radius_vc(&self) -> Float {
        self.merging_radius_vc
    }

    /// Radius of merge queries in the running iteration.
    pub fn merging_radius_vm(&self) -> Float {
        self.merging_radius_vm
    }

    pub fn num_photons(&self) -> usize {
        self.photons.len()
    }

    fn update_radius(&mut self, iteration: u32) {
        if iteration == 0 {
            self.merging_radius_vc = self.config.initial_merging_radius;
            self.merging_radius_vm = self.config.initial_merging_radius;
        } else {
            // merging lags one iteration behind: the photons it uses were
            // weighted with the previous connection radius
            self.merging_radius_vm = self.merging_radius_vc;
            self.merging_radius_vc = (self.merging_radius_vc * self.config.merging_radius_multiplier)
                .max(self.config.min_merging_radius);
        }
    }

    fn update_weight_factors(&mut self, iteration: u32) {
        let use_vc = self.config.use_vertex_connection;
        let use_vm = self.config.use_vertex_merging;

        self.vertex_merging_normalization =
            1.0 / (PI * self.merging_radius_vm * self.merging_radius_vm * self.light_path_count);

        let eta_vcm = PI * self.merging_radius_vc * self.merging_radius_vc * self.light_path_count;
        // no merging in the first iteration, there are no photons yet
        self.mis_vm_weight_factor_vc = if use_vm && iteration > 0 { mis(eta_vcm) } else { 0.0 };
        self.mis_vc_weight_factor_vc = if use_vc { mis(1.0 / eta_vcm) } else { 0.0 };

        let eta_vcm = PI * self.merging_radius_vm * self.merging_radius_vm * self.light_path_count;
        self.mis_vm_weight_factor_vm = if use_vm { mis(eta_vcm) } else { 0.0 };
        self.mis_vc_weight_factor_vm = if use_vc { mis(1.0 / eta_vcm) } else { 0.0 };
    }

    /// Moves the photons every thread recorded during the last iteration into
    /// one buffer. Each thread copies into its own disjoint range.
    fn gather_photons(&mut self, iteration: u32, contexts: &mut [RenderingContext]) {
        self.photon_count_prefix_sum.clear();
        let mut total = 0;
        for ctx in contexts.iter_mut() {
            if let Some(scratch) = ctx.integrator_context_mut::<VcmContext>() {
                if iteration == 0 {
                    scratch.photons.clear();
                }
                total += scratch.photons.len();
            }
            self.photon_count_prefix_sum.push(total);
        }

        self.photons.clear();
        self.photons.resize(total, Photon::default());

        let prefix_sum = &self.photon_count_prefix_sum;
        let mut remaining: &mut [Photon] = &mut self.photons;
        thread::scope(|scope| {
            let mut offset = 0;
            for (ctx, &end) in contexts.iter_mut().zip(prefix_sum.iter()) {
                let (chunk, rest) = std::mem::take(&mut remaining).split_at_mut(end - offset);
                remaining = rest;
                offset = end;

                let scratch = match ctx.integrator_context_mut::<VcmContext>() {
                    Some(scratch) => scratch,
                    None => continue,
                };
                debug_assert_eq!(chunk.len(), scratch.photons.len());
                scope.spawn(move || {
                    chunk.copy_from_slice(&scratch.photons);
                    scratch.photons.clear();
                });
            }
        });
    }

    fn trace_light_path(&self, params: &RenderParams, ctx: &mut RenderingContext, scratch: &mut VcmContext) {
        scratch.light_vertices.clear();

        let scene = params.scene;
        let mut state = match self.generate_light_sample(scene, ctx) {
            Some(state) => state,
            None => return,
        };

        let mut traveled = 0.0;
        loop {
            let ray = state.ray;
            let mut hit_point = HitPoint::default();
            scene.traverse(&ray, &mut hit_point);
            ctx.counters.num_rays += 1;

            if hit_point.is_miss() || hit_point.is_light() {
                break;
            }

            let intersection = scene.evaluate_intersection(&ray, &hit_point);
            if scene.hit_object(hit_point.object_id).map_or(false, |object| object.is_medium_boundary()) {
                traveled += hit_point.distance + RAY_OFFSET;
                state.ray = Ray3f::new(ray.at(hit_point.distance + RAY_OFFSET), ray.dir(), None, None);
                continue;
            }

            let mut shading_data = ShadingData {
                intersection,
                material_params: Default::default(),
                outgoing_dir_world_space: -ray.dir(),
            };
            scene.evaluate_shading_data(&ctx.wavelength, &mut shading_data);

            let cos_theta = ray.dir().dot(&shading_data.normal());
            state.update_after_hit(traveled + hit_point.distance, cos_theta,
                                   state.length > 1 || state.is_finite_light);
            traveled = 0.0;

            let is_delta = shading_data.material().map_or(true, |material| material.bsdf().is_none() || material.is_delta());
            if !is_delta {
                if self.config.use_vertex_merging {
                    let position = shading_data.position();
                    scratch.photons.push(Photon {
                        position: [position.x, position.y, position.z],
                        throughput: PackedColorRgbHdr::from_vector(&state.throughput.to_vector()),
                        direction: PackedUnitVector3::from_vector(&shading_data.outgoing_dir_world_space),
                        d_vm: state.d_vm,
                        d_vcm: state.d_vcm,
                        path_length: state.length,
                    });
                }

                if self.config.use_vertex_connection && scratch.light_vertices.len() < MAX_LIGHT_VERTICES {
                    let vertex = LightVertex {
                        shading_data: shading_data.clone(),
                        throughput: state.throughput,
                        d_vc: state.d_vc,
                        d_vm: state.d_vm,
                        d_vcm: state.d_vcm,
                        path_length: state.length.min(u8::MAX as u32) as u8,
                    };
                    self.connect_to_camera(params, &vertex, ctx);
                    scratch.light_vertices.push(vertex);
                }
            }

            if state.length + 2 > self.config.max_path_length {
                break;
            }

            if !self.advance_path(&mut state, &shading_data, ctx) {
                break;
            }
        }
    }

    fn generate_light_sample(&self, scene: &Scene, ctx: &mut RenderingContext) -> Option<PathState> {
        let lights = scene.lights();
        if lights.is_empty() {
            return None;
        }

        let pick_probability = 1.0 / lights.len() as Float;
        let light = &lights[ctx.rng.next_below(lights.len() as u32) as usize];

        let position_sample = ctx.rng.next_vec2();
        let direction_sample = ctx.rng.next_vec2();
        let emitted = light.emit(&position_sample, &direction_sample, &ctx.wavelength)?;
        if emitted.radiance.almost_zero() {
            return None;
        }
        debug_assert!(emitted.emission_pdf_w > 0.0);

        // camera vertices sample every light, so only emission pays for the pick
        let emission_pdf_w = emitted.emission_pdf_w * pick_probability;
        let inv_emission_pdf_w = 1.0 / emission_pdf_w;

        let origin = emitted.position + emitted.direction * EMISSION_RAY_OFFSET;
        let mut state = PathState::new(Ray3f::new(origin, emitted.direction, None, None));
        state.throughput = emitted.radiance * inv_emission_pdf_w;
        state.is_finite_light = light.is_finite();

        state.d_vcm = mis(emitted.direct_pdf_a * inv_emission_pdf_w);
        state.d_vc = if light.is_delta() {
            0.0
        } else {
            let cos_at_light = if state.is_finite_light { emitted.cos_at_light } else { 1.0 };
            mis(cos_at_light * inv_emission_pdf_w)
        };
        state.d_vm = state.d_vc * self.mis_vc_weight_factor_vc;
        state.debug_check();
        Some(state)
    }

    /// Samples the BSDF and moves the path on. False when the path ends.
    fn advance_path(&self, state: &mut PathState, shading_data: &ShadingData, ctx: &mut RenderingContext) -> bool {
        let material = match shading_data.material() {
            Some(material) => material,
            None => return false,
        };

        let u = ctx.rng.next_vec3();
        let sample = match material.sample(&mut ctx.wavelength, shading_data, u, &mut ctx.rng) {
            Some(sample) => sample,
            None => return false,
        };
        debug_assert!(sample.weight.is_valid());

        state.throughput *= sample.weight;
        if state.throughput.almost_zero() {
            return false;
        }

        let cos_theta_out = shading_data.intersection.cos_theta(&sample.incoming_dir);
        let (pdf_w, reverse_pdf_w) = if sample.event.is_specular() {
            (sample.pdf, sample.pdf)
        } else {
            let forward = material.pdf(&ctx.wavelength, shading_data, &sample.incoming_dir,
                                       PdfDirection::Forward, &mut ctx.rng);
            let reverse = material.pdf(&ctx.wavelength, shading_data, &sample.incoming_dir,
                                       PdfDirection::Reverse, &mut ctx.rng);
            (if forward > 0.0 { forward } else { sample.pdf }, reverse)
        };
        if !(pdf_w > 0.0) {
            return false;
        }

        state.update_after_scatter(cos_theta_out, pdf_w, reverse_pdf_w, sample.event,
                                   self.mis_vm_weight_factor_vc, self.mis_vc_weight_factor_vc);
        state.ray = Ray3f::offset(shading_data.position(), sample.incoming_dir, RAY_OFFSET, None);
        true
    }

    fn connect_to_camera(&self, params: &RenderParams, vertex: &LightVertex, ctx: &mut RenderingContext) {
        let shading_data = &vertex.shading_data;
        let sample_position = shading_data.position();
        let film_position = match params.camera.world_to_film(&sample_position) {
            Some(film_position) => film_position,
            None => return,
        };

        let to_camera = params.camera.position() - sample_position;
        let distance_sqr = to_camera.norm_squared();
        let distance = distance_sqr.sqrt();
        let dir_to_camera = to_camera / distance;

        let cos_to_camera = shading_data.normal().dot(&dir_to_camera);
        if cos_to_camera <= MIN_COSINE {
            return;
        }

        let material = match shading_data.material() {
            Some(material) => material,
            None => return,
        };
        let eval = material.evaluate(&ctx.wavelength, shading_data, &dir_to_camera, &mut ctx.rng);
        if eval.is_zero() {
            return;
        }

        let segment = shadow_ray(sample_position, dir_to_camera, distance);
        ctx.counters.num_shadow_rays += 1;
        if params.scene.traverse_shadow(&segment) {
            return;
        }
        ctx.counters.num_shadow_rays_hit += 1;

        let camera_pdf_w = params.camera.pdf_w(&-dir_to_camera);
        let camera_pdf_a = camera_pdf_w * cos_to_camera / distance_sqr;

        let w_light = mis(camera_pdf_a)
            * (self.mis_vm_weight_factor_vc + vertex.d_vcm + vertex.d_vc * mis(eval.reverse_pdf_w));
        let mis_weight = 1.0 / (w_light + 1.0);

        let contribution = eval.value * vertex.throughput * self.config.weights.camera_connecting
            * (mis_weight * camera_pdf_w / distance_sqr);
        if contribution.is_valid() {
            params.film.accumulate_color_at(&film_position, &contribution, &mut ctx.rng);
        }
    }

    /// Radiance of a light reached by the camera path, weighted against light
    /// sampling and light tracing.
    fn evaluate_light(&self, light: &dyn Emitter, ray_dir: &Vector3f, cos_at_light: Float,
                      state: &PathState, params: &RenderParams, ctx: &RenderingContext) -> RayColor {
        let radiance = light.get_radiance(ray_dir, cos_at_light, &ctx.wavelength);
        if radiance.radiance.almost_zero() {
            return RayColor::zero();
        }

        let mut color = radiance.radiance;
        // directly visible lights have a single technique
        if state.length > 1 {
            let use_vertex_merging = self.config.use_vertex_merging && params.iteration > 0;
            if use_vertex_merging && !self.config.use_vertex_connection {
                // pure photon mapping only sees lights through specular chains
                if !state.last_specular {
                    return RayColor::zero();
                }
            } else {
                let pick_probability = 1.0 / params.scene.lights().len().max(1) as Float;
                let w_camera = mis(radiance.direct_pdf_a) * state.d_vcm
                    + mis(radiance.emission_pdf_w * pick_probability) * state.d_vc;
                color *= 1.0 / (1.0 + w_camera);
            }
        }
        color * self.config.weights.bsdf_sampling
    }

    fn evaluate_global_lights(&self, state: &PathState, params: &RenderParams, ctx: &RenderingContext) -> RayColor {
        let ray_dir = state.ray.dir();
        let mut result = RayColor::zero();
        for light in params.scene.global_lights() {
            result += self.evaluate_light(light.as_ref(), &ray_dir, 1.0, state, params, ctx);
        }
        result
    }

    fn sample_light(&self, scene: &Scene, light: &dyn Emitter, shading_data: &ShadingData,
                    state: &PathState, ctx: &mut RenderingContext) -> RayColor {
        let position = shading_data.position();
        let sample = ctx.rng.next_vec2();
        let illumination = match light.illuminate(&position, &sample, &ctx.wavelength) {
            Some(illumination) => illumination,
            None => return RayColor::zero(),
        };
        debug_assert!(illumination.direct_pdf_w > 0.0 && illumination.direct_pdf_w.is_finite());
        debug_assert!(illumination.emission_pdf_w >= 0.0 && illumination.cos_at_light >= 0.0);

        let cos_to_light = shading_data.normal().dot(&illumination.direction_to_light);
        if cos_to_light <= MIN_COSINE {
            return RayColor::zero();
        }

        let material = match shading_data.material() {
            Some(material) => material,
            None => return RayColor::zero(),
        };
        let eval = material.evaluate(&ctx.wavelength, shading_data, &illumination.direction_to_light, &mut ctx.rng);
        if eval.is_zero() {
            return RayColor::zero();
        }

        let segment = shadow_ray(position, illumination.direction_to_light, illumination.distance);
        ctx.counters.num_shadow_rays += 1;
        if scene.traverse_shadow(&segment) {
            return RayColor::zero();
        }
        ctx.counters.num_shadow_rays_hit += 1;

        let light_path_pick = 1.0 / scene.lights().len() as Float;
        let bsdf_pdf_w = if light.is_delta() { 0.0 } else { eval.direct_pdf_w };
        let w_light = mis(bsdf_pdf_w / illumination.direct_pdf_w);
        let w_camera = mis(illumination.emission_pdf_w * light_path_pick * cos_to_light
                           / (illumination.direct_pdf_w * illumination.cos_at_light.max(MIN_COSINE)))
            * (self.mis_vm_weight_factor_vc + state.d_vcm + state.d_vc * mis(eval.reverse_pdf_w));
        let mis_weight = 1.0 / (w_light + 1.0 + w_camera);

        illumination.radiance * eval.value * (mis_weight / illumination.direct_pdf_w)
    }

    fn sample_lights(&self, scene: &Scene, shading_data: &ShadingData, state: &PathState,
                     ctx: &mut RenderingContext) -> RayColor {
        let mut result = RayColor::zero();
        for light in scene.lights() {
            result += self.sample_light(scene, light.as_ref(), shading_data, state, ctx);
        }
        result * self.config.weights.light_sampling
    }

    fn connect_vertices(&self, scene: &Scene, state: &PathState, shading_data: &ShadingData,
                        vertex: &LightVertex, ctx: &mut RenderingContext) -> RayColor {
        let to_light = vertex.shading_data.position() - shading_data.position();
        let distance_sqr = to_light.norm_squared();
        if distance_sqr <= 0.0 {
            return RayColor::zero();
        }
        let distance = distance_sqr.sqrt();
        let light_dir = to_light / distance;

        let cos_camera_vertex = shading_data.normal().dot(&light_dir);
        let cos_light_vertex = -vertex.shading_data.normal().dot(&light_dir);
        if cos_camera_vertex <= 0.0 || cos_light_vertex <= 0.0 {
            return RayColor::zero();
        }

        let (camera_material, light_material) = match (shading_data.material(), vertex.shading_data.material()) {
            (Some(camera_material), Some(light_material)) => (camera_material, light_material),
            _ => return RayColor::zero(),
        };

        let camera_eval = camera_material.evaluate(&ctx.wavelength, shading_data, &light_dir, &mut ctx.rng);
        if camera_eval.is_zero() {
            return RayColor::zero();
        }
        let light_eval = light_material.evaluate(&ctx.wavelength, &vertex.shading_data, &-light_dir, &mut ctx.rng);
        if light_eval.is_zero() {
            return RayColor::zero();
        }

        let segment = shadow_ray(shading_data.position(), light_dir, distance);
        ctx.counters.num_shadow_rays += 1;
        if scene.traverse_shadow(&segment) {
            return RayColor::zero();
        }
        ctx.counters.num_shadow_rays_hit += 1;

        let camera_bsdf_pdf_a = pdf_w_to_a(camera_eval.direct_pdf_w, distance, cos_light_vertex);
        let light_bsdf_pdf_a = pdf_w_to_a(light_eval.direct_pdf_w, distance, cos_camera_vertex);

        let w_light = mis(camera_bsdf_pdf_a)
            * (self.mis_vm_weight_factor_vc + vertex.d_vcm + vertex.d_vc * mis(light_eval.reverse_pdf_w));
        let w_camera = mis(light_bsdf_pdf_a)
            * (self.mis_vm_weight_factor_vc + state.d_vcm + state.d_vc * mis(camera_eval.reverse_pdf_w));
        debug_assert!(w_light >= 0.0 && w_camera >= 0.0);
        let mis_weight = 1.0 / (w_light + 1.0 + w_camera);

        camera_eval.value * light_eval.value * (mis_weight / distance_sqr)
    }

    fn merge_vertices(&self, state: &PathState, shading_data: &ShadingData, ctx: &mut RenderingContext) -> RayColor {
        let material = match shading_data.material() {
            Some(material) => material,
            None => return RayColor::zero(),
        };
        let position = shading_data.position();
        let inv_radius_sqr = 1.0 / (self.merging_radius_vm * self.merging_radius_vm);
        let max_path_length = self.config.max_path_length;
        let kernel = self.config.kernel;

        let mut contribution = RayColor::zero();
        let wavelength = ctx.wavelength;
        let rng = &mut ctx.rng;
        self.hash_grid.process(&self.photons, &position, |photon| {
            if photon.path_length + state.length > max_path_length {
                return;
            }

            let light_direction = photon.direction.to_vector();
            let cos_to_light = shading_data.intersection.cos_theta(&light_direction);
            if cos_to_light < MIN_COSINE {
                return;
            }

            let eval = material.evaluate(&wavelength, shading_data, &light_direction, &mut *rng);
            if eval.is_zero() {
                return;
            }

            let throughput = RayColor::from_vector(photon.throughput.to_vector());
            let w_light = photon.d_vcm * self.mis_vc_weight_factor_vm + photon.d_vm * mis(eval.direct_pdf_w);
            let w_camera = state.d_vcm * self.mis_vc_weight_factor_vm + state.d_vm * mis(eval.reverse_pdf_w);
            let mis_weight = 1.0 / (w_light + 1.0 + w_camera);

            let dist_sqr = (photon.position() - position).norm_squared();
            let weight = mis_weight / cos_to_light * kernel.weight(dist_sqr * inv_radius_sqr);
            contribution.mul_and_accumulate(&(eval.value * throughput), &RayColor::splat(weight));
        });

        contribution
    }

    fn render_camera_path(&self, primary_ray: &Ray3f, params: &RenderParams, ctx: &mut RenderingContext,
                          scratch: &VcmContext) -> RayColor {
        let scene = params.scene;
        let use_vc = self.config.use_vertex_connection;
        let use_vm = self.config.use_vertex_merging && params.iteration > 0;

        let mut state = PathState::new(*primary_ray);
        let camera_pdf = params.camera.pdf_w(&primary_ray.dir());
        state.d_vcm = if camera_pdf > 0.0 { mis(1.0 / camera_pdf) } else { 0.0 };

        let mut result = RayColor::zero();
        let mut traveled = 0.0;

        loop {
            let ray = state.ray;
            let mut hit_point = HitPoint::default();
            scene.traverse(&ray, &mut hit_point);
            ctx.counters.num_rays += 1;

            if hit_point.is_miss() {
                let background = self.evaluate_global_lights(&state, params, ctx);
                result.mul_and_accumulate(&state.throughput, &background);
                break;
            }

            let intersection = scene.evaluate_intersection(&ray, &hit_point);

            if !hit_point.is_light()
                && scene.hit_object(hit_point.object_id).map_or(false, |object| object.is_medium_boundary()) {
                traveled += hit_point.distance + RAY_OFFSET;
                state.ray = Ray3f::new(ray.at(hit_point.distance + RAY_OFFSET), ray.dir(), None, None);
                continue;
            }

            let cos_theta = intersection.cos_theta(&ray.dir());
            state.update_after_hit(traveled + hit_point.distance, cos_theta, true);
            traveled = 0.0;

            if hit_point.is_light() {
                if let Some(light) = scene.hit_light(hit_point.object_id) {
                    let color = self.evaluate_light(light, &ray.dir(), -cos_theta, &state, params, ctx);
                    debug_assert!(color.is_valid());
                    result.mul_and_accumulate(&state.throughput, &color);
                }
                break;
            }

            let mut shading_data = ShadingData {
                intersection,
                material_params: Default::default(),
                outgoing_dir_world_space: -ray.dir(),
            };
            scene.evaluate_shading_data(&ctx.wavelength, &mut shading_data);

            debug_assert!(shading_data.material_params.emission_color.is_valid());
            result.mul_and_accumulate(&state.throughput, &shading_data.material_params.emission_color);

            if state.length >= self.config.max_path_length {
                break;
            }

            let is_delta = shading_data.material().map_or(true, |material| material.bsdf().is_none() || material.is_delta());

            if !is_delta && use_vc {
                let light_color = self.sample_lights(scene, &shading_data, &state, ctx);
                debug_assert!(light_color.is_valid());
                result.mul_and_accumulate(&state.throughput, &light_color);

                let mut connection_color = RayColor::zero();
                for vertex in scratch.light_vertices.iter() {
                    // vertices are ordered by length, all later ones are too long as well
                    if vertex.path_length as u32 + state.length + 1 > self.config.max_path_length {
                        break;
                    }
                    let color = self.connect_vertices(scene, &state, &shading_data, vertex, ctx);
                    connection_color.mul_and_accumulate(&vertex.throughput, &color);
                }
                connection_color *= self.config.weights.vertex_connecting;
                debug_assert!(connection_color.is_valid());
                result.mul_and_accumulate(&state.throughput, &connection_color);
            }

            if !is_delta && use_vm {
                let merging_color = self.merge_vertices(&state, &shading_data, ctx)
                    * self.config.weights.vertex_merging
                    * self.vertex_merging_normalization;
                debug_assert!(merging_color.is_valid());
                result.mul_and_accumulate(&state.throughput, &merging_color);
            }

            if !self.advance_path(&mut state, &shading_data, ctx) {
                break;
            }
        }

        result
    }
}

impl Integrator for VertexConnectionAndMerging {
    fn name(&self) -> &'static str {
        "vcm"
    }

    fn create_context(&self) -> Option<Box<dyn IntegratorContext>> {
        Some(Box::new(VcmContext::new()))
    }

    fn pre_render(&mut self, params: &RenderParams, contexts: &mut [RenderingContext]) {
        debug_assert!(self.config.validate().is_ok());
        let _span = tracing::trace_span!(parent: &params.span, "vcm_pre_render", iteration = params.iteration).entered();

        self.light_path_count = (params.film.width() * params.film.height()) as Float;
        self.update_radius(params.iteration);
        self.update_weight_factors(params.iteration);

        if self.config.use_vertex_merging {
            {
                let _copy = tracing::trace_span!(parent: &params.span, "vcm_copy_photons").entered();
                self.gather_photons(params.iteration, contexts);
            }
            let _build = tracing::trace_span!(parent: &params.span, "vcm_build_hash_grid").entered();
            self.hash_grid.build(&self.photons, self.merging_radius_vm);
        }

        debug!("VCM iteration {}: radius vc={:.5} vm={:.5}, {} photons",
               params.iteration, self.merging_radius_vc, self.merging_radius_vm, self.photons.len());
    }

    fn render_pixel(&self, ray: &Ray3f, params: &RenderParams, ctx: &mut RenderingContext) -> RayColor {
        let mut boxed = match ctx.integrator_context.take() {
            Some(boxed) => boxed,
            None => return RayColor::zero(),
        };

        let result = match boxed.as_any_mut().downcast_mut::<VcmContext>() {
            Some(scratch) => {
                self.trace_light_path(params, ctx, scratch);
                self.render_camera_path(ray, params, ctx, scratch)
            }
            None => RayColor::zero(),
        };

        ctx.integrator_context = Some(boxed);
        debug_assert!(result.is_valid());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::RenderingParams;
    use crate::core::film::Film;
    use crate::integrators::path_mis::PathTracerMIS;
    use crate::integrators::test_utils::{image_mean, lit_empty_box, null_sphere_scene, render_image,
                                         render_sample};
    use crate::scenes::cornell_box;

    fn render_params<'a>(preset: &'a crate::scenes::ScenePreset, film: &'a Film,
                         settings: &'a RenderingParams, iteration: u32) -> RenderParams<'a> {
        RenderParams {
            scene: &preset.scene,
            camera: &preset.camera,
            film,
            settings,
            iteration,
            span: tracing::Span::none(),
        }
    }

    #[test]
    fn test_photon_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Photon>(), 32);
    }

    #[test]
    fn test_config_validation() {
        assert!(VcmConfig::default().validate().is_ok());

        let mut config = VcmConfig::default();
        config.min_merging_radius = 0.05;
        assert!(config.validate().is_err());

        let mut config = VcmConfig::default();
        config.merging_radius_multiplier = 1.5;
        assert!(VertexConnectionAndMerging::new(config).is_err());

        let mut config = VcmConfig::default();
        config.use_vertex_connection = false;
        config.use_vertex_merging = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_kernel_names() {
        assert_eq!(VertexMergingKernel::from_name("smooth").unwrap(), VertexMergingKernel::Smooth);
        assert!(VertexMergingKernel::from_name("gaussian").is_err());
    }

    #[test]
    fn test_kernels_are_normalized() {
        for kernel in [VertexMergingKernel::Uniform, VertexMergingKernel::Epanechnikov,
                       VertexMergingKernel::Smooth].iter() {
            let steps = 10_000;
            let integral: Float = (0..steps)
                .map(|i| kernel.weight((i as Float + 0.5) / steps as Float))
                .sum::<Float>() / steps as Float;
            assert!((integral - 1.0).abs() < 1e-3, "{:?} integrates to {}", kernel, integral);
        }
    }

    #[test]
    fn test_merging_radius_shrinks_to_minimum() {
        let config = VcmConfig {
            initial_merging_radius: 0.08,
            min_merging_radius: 0.01,
            merging_radius_multiplier: 0.5,
            ..VcmConfig::default()
        };
        let mut vcm = VertexConnectionAndMerging::new(config).unwrap();
        let steps = ((0.01f32 / 0.08).ln() / 0.5f32.ln()).ceil() as u32;

        let mut previous = Float::MAX;
        for iteration in 0..8 {
            vcm.update_radius(iteration);
            let radius = vcm.merging_radius_vc();
            assert!(radius <= previous);
            assert!(radius >= 0.01);
            if iteration >= steps {
                assert!((radius - 0.01).abs() < 1e-6);
            }
            previous = radius;
        }
    }

    #[test]
    fn test_merging_radius_lags_one_iteration() {
        let config = VcmConfig {
            initial_merging_radius: 0.1,
            min_merging_radius: 0.001,
            merging_radius_multiplier: 0.9,
            ..VcmConfig::default()
        };
        let mut vcm = VertexConnectionAndMerging::new(config).unwrap();
        vcm.update_radius(0);
        assert_eq!(vcm.merging_radius_vm(), 0.1);
        for iteration in 1..6 {
            let previous_vc = vcm.merging_radius_vc();
            vcm.update_radius(iteration);
            assert_eq!(vcm.merging_radius_vm(), previous_vc);
            assert!(vcm.merging_radius_vc() < previous_vc);
        }
    }

    #[test]
    fn test_first_iteration_disables_merging_weights() {
        let mut vcm = VertexConnectionAndMerging::new(VcmConfig::default()).unwrap();
        vcm.light_path_count = 64.0;
        vcm.update_radius(0);
        vcm.update_weight_factors(0);
        assert_eq!(vcm.mis_vm_weight_factor_vc, 0.0);
        assert!(vcm.mis_vc_weight_factor_vc > 0.0);
        vcm.update_radius(1);
        vcm.update_weight_factors(1);
        assert!(vcm.mis_vm_weight_factor_vc > 0.0);
        assert!((vcm.mis_vm_weight_factor_vc * vcm.mis_vc_weight_factor_vc - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_photons_from_all_threads_are_gathered_in_order() {
        let preset = cornell_box(1.0).unwrap();
        let film = Film::new(4, 4);
        let settings = RenderingParams::default();
        let mut vcm = VertexConnectionAndMerging::new(VcmConfig::default()).unwrap();

        let mut contexts: Vec<RenderingContext> = (0..3)
            .map(|seed| RenderingContext::new(seed, vcm.create_context()))
            .collect();
        for (index, ctx) in contexts.iter_mut().enumerate() {
            let scratch = ctx.integrator_context_mut::<VcmContext>().unwrap();
            for k in 0..(index + 2) {
                scratch.photons.push(Photon {
                    position: [index as f32, k as f32, 0.0],
                    path_length: 1,
                    ..Photon::default()
                });
            }
        }

        vcm.pre_render(&render_params(&preset, &film, &settings, 1), &mut contexts);
        assert_eq!(vcm.num_photons(), 2 + 3 + 4);
        assert_eq!(vcm.photon_count_prefix_sum, vec![2, 5, 9]);
        assert_eq!(vcm.photons[2].position, [1.0, 0.0, 0.0]);
        assert_eq!(vcm.photons[8].position, [2.0, 3.0, 0.0]);
        for ctx in contexts.iter_mut() {
            assert!(ctx.integrator_context_mut::<VcmContext>().unwrap().photons.is_empty());
        }
    }

    #[test]
    fn test_first_iteration_drops_stale_photons() {
        let preset = cornell_box(1.0).unwrap();
        let film = Film::new(4, 4);
        let settings = RenderingParams::default();
        let mut vcm = VertexConnectionAndMerging::new(VcmConfig::default()).unwrap();
        let mut contexts = vec![RenderingContext::new(1, vcm.create_context())];
        contexts[0].integrator_context_mut::<VcmContext>().unwrap().photons.push(Photon::default());

        vcm.pre_render(&render_params(&preset, &film, &settings, 0), &mut contexts);
        assert_eq!(vcm.num_photons(), 0);
    }

    #[test]
    fn test_cornell_box_is_finite_and_non_negative() {
        let preset = cornell_box(1.0).unwrap();
        let mut vcm = VertexConnectionAndMerging::new(VcmConfig {
            initial_merging_radius: 0.05,
            min_merging_radius: 0.01,
            merging_radius_multiplier: 0.9,
            ..VcmConfig::default()
        }).unwrap();
        let image = render_image(&mut vcm, &preset.scene, &preset.camera, 8, 8, 3);
        let mut total = 0.0;
        for pixel in image.pixels() {
            assert!(pixel.iter().all(|v| v.is_finite() && *v >= 0.0), "bad pixel {:?}", pixel);
            total += pixel.sum();
        }
        assert!(total > 0.0);
        assert!(vcm.num_photons() > 0);
    }

    #[test]
    fn test_connections_match_path_tracer_next_to_area_light() {
        let (scene, camera) = lit_empty_box();
        let reference = image_mean(&render_image(&mut PathTracerMIS::new(), &scene, &camera, 24, 24, 64));
        let mut bpt = VertexConnectionAndMerging::new(VcmConfig {
            use_vertex_merging: false,
            max_path_length: 32,
            ..VcmConfig::default()
        }).unwrap();
        let value = image_mean(&render_image(&mut bpt, &scene, &camera, 24, 24, 64));
        assert!(reference > 0.0);
        assert!((value - reference).abs() / reference < 0.02, "got {} expected {}", value, reference);
    }

    #[test]
    fn test_null_surface_reflects_nothing() {
        let (scene, camera) = null_sphere_scene();
        let mut vcm = VertexConnectionAndMerging::new(VcmConfig::default()).unwrap();
        let color = render_sample(&mut vcm, &scene, &camera, 0.5, 0.5, 64);
        assert!(color.almost_zero());
    }
}
