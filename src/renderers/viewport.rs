// Copyright @yucwang 2026

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::core::context::{RayCounters, RenderingContext, RenderingParams};
use crate::core::error::RenderError;
use crate::core::film::Film;
use crate::core::integrator::{Integrator, RenderParams};
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tile {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

fn generate_tiles(width: usize, height: usize, tile_size: usize) -> Vec<Tile> {
    let mut tiles = Vec::new();
    for min_y in (0..height).step_by(tile_size) {
        for min_x in (0..width).step_by(tile_size) {
            tiles.push(Tile {
                min_x,
                min_y,
                max_x: (min_x + tile_size).min(width),
                max_y: (min_y + tile_size).min(height),
            });
        }
    }
    tiles
}

/// Progressive renderer. Every call to `render` adds one sample per pixel
/// to the film; `image` returns the running average.
pub struct Viewport {
    film: Film,
    integrator: Box<dyn Integrator>,
    settings: RenderingParams,
    contexts: Vec<RenderingContext>,
    tiles: Vec<Tile>,
    passes_finished: u32,
    counters: RayCounters,
    show_progress: bool,
}

impl Viewport {
    pub fn new(width: usize, height: usize, integrator: Box<dyn Integrator>,
               settings: RenderingParams) -> Result<Self, RenderError> {
        settings.validate()?;
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidConfig(format!("empty viewport {}x{}", width, height)));
        }

        let num_threads = match settings.num_threads {
            0 => thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        };
        let contexts = (0..num_threads)
            .map(|i| {
                let seed = settings.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (i as u64 + 1);
                RenderingContext::new(seed, integrator.create_context())
            })
            .collect();

        info!("Viewport {}x{}: integrator '{}', {} threads, tile size {}",
              width, height, integrator.name(), num_threads, settings.tile_size);

        Ok(Self {
            film: Film::new(width, height),
            tiles: generate_tiles(width, height, settings.tile_size),
            integrator,
            settings,
            contexts,
            passes_finished: 0,
            counters: RayCounters::default(),
            show_progress: false,
        })
    }

    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn width(&self) -> usize {
        self.film.width()
    }

    pub fn height(&self) -> usize {
        self.film.height()
    }

    pub fn passes_finished(&self) -> u32 {
        self.passes_finished
    }

    /// Counters of the last finished pass, summed over all threads.
    pub fn counters(&self) -> RayCounters {
        self.counters
    }

    pub fn integrator(&self) -> &dyn Integrator {
        self.integrator.as_ref()
    }

    pub fn num_threads(&self) -> usize {
        self.contexts.len()
    }

    /// Drops every accumulated sample. Integrator state restarts with the
    /// next pass at iteration zero.
    pub fn reset(&mut self) {
        self.film.clear();
        self.passes_finished = 0;
        self.counters.reset();
    }

    pub fn image(&self) -> Bitmap {
        self.film.resolve(self.passes_finished.max(1))
    }

    /// Renders one progressive pass.
    pub fn render(&mut self, scene: &Scene, camera: &dyn Sensor) {
        let iteration = self.passes_finished;
        let span = tracing::trace_span!("render_pass", iteration);
        let _entered = span.enter();
        let start = Instant::now();

        for ctx in self.contexts.iter_mut() {
            ctx.counters.reset();
        }

        let params = RenderParams {
            scene,
            camera,
            film: &self.film,
            settings: &self.settings,
            iteration,
            span: span.clone(),
        };

        {
            let _pre_render = tracing::trace_span!(parent: &span, "pre_render").entered();
            self.integrator.pre_render(&params, &mut self.contexts);
        }

        let progress = if self.show_progress {
            let bar = ProgressBar::new(self.tiles.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tiles")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let integrator: &dyn Integrator = self.integrator.as_ref();
        let tiles = &self.tiles;
        let next_tile = AtomicUsize::new(0);
        let params = &params;
        let progress_ref = &progress;
        let next_tile_ref = &next_tile;
        let contexts = &mut self.contexts;

        thread::scope(|scope| {
            for ctx in contexts.iter_mut() {
                scope.spawn(move || {
                    let _worker = tracing::trace_span!(parent: &params.span, "render_tiles").entered();
                    loop {
                        let index = next_tile_ref.fetch_add(1, Ordering::Relaxed);
                        let tile = match tiles.get(index) {
                            Some(tile) => tile,
                            None => break,
                        };
                        render_tile(integrator, params, ctx, tile);
                        progress_ref.inc(1);
                    }
                });
            }
        });
        progress.finish_and_clear();

        self.counters.reset();
        for ctx in self.contexts.iter() {
            self.counters += ctx.counters;
        }
        self.passes_finished += 1;

        let elapsed = start.elapsed().as_secs_f64();
        let total_rays = (self.counters.num_rays + self.counters.num_shadow_rays) as f64;
        info!("Pass {} finished in {:.3} s: {} rays, {} shadow rays ({} unoccluded), {:.2} Mrays/s",
              iteration, elapsed, self.counters.num_rays, self.counters.num_shadow_rays,
              self.counters.num_shadow_rays_hit,
              total_rays / elapsed.max(1.0e-9) / 1.0e6);
    }

    pub fn render_passes(&mut self, scene: &Scene, camera: &dyn Sensor, passes: u32) -> Bitmap {
        for _ in 0..passes {
            self.render(scene, camera);
        }
        self.image()
    }
}

fn render_tile(integrator: &dyn Integrator, params: &RenderParams, ctx: &mut RenderingContext, tile: &Tile) {
    let film = params.film;
    let inv_width = 1.0 / film.width() as Float;
    let inv_height = 1.0 / film.height() as Float;

    for y in tile.min_y..tile.max_y {
        for x in tile.min_x..tile.max_x {
            ctx.start_sample();
            let jitter = ctx.rng.next_vec2();
            let film_pos = Vector2f::new((x as Float + jitter.x) * inv_width, (y as Float + jitter.y) * inv_height);
            let ray = params.camera.generate_ray(&film_pos);

            let color = integrator.render_pixel(&ray, params, ctx);
            debug_assert!(color.is_valid());
            film.accumulate_color(x, y, &color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrators::create_integrator;
    use crate::integrators::path::PathTracer;
    use crate::integrators::vcm::VcmConfig;
    use crate::scenes::cornell_box;

    #[test]
    fn test_tiles_cover_the_film_once() {
        let tiles = generate_tiles(37, 21, 16);
        assert_eq!(tiles.len(), 3 * 2);
        let covered: usize = tiles.iter().map(|t| (t.max_x - t.min_x) * (t.max_y - t.min_y)).sum();
        assert_eq!(covered, 37 * 21);
        assert_eq!(tiles.last().unwrap().max_x, 37);
    }

    #[test]
    fn test_rejects_empty_viewport() {
        assert!(Viewport::new(0, 4, Box::new(PathTracer::new()), RenderingParams::default()).is_err());
    }

    #[test]
    fn test_progressive_passes() {
        let preset = cornell_box(1.0).unwrap();
        let settings = RenderingParams { num_threads: 3, tile_size: 4, ..RenderingParams::default() };
        let mut viewport = Viewport::new(12, 12, Box::new(PathTracer::new()), settings).unwrap();
        assert_eq!(viewport.num_threads(), 3);

        let image = viewport.render_passes(&preset.scene, &preset.camera, 2);
        assert_eq!(viewport.passes_finished(), 2);
        assert!(viewport.counters().num_rays >= 144);
        assert!(image.pixels().iter().all(|p| p.iter().all(|v| v.is_finite() && *v >= 0.0)));

        viewport.reset();
        assert_eq!(viewport.passes_finished(), 0);
        assert!(viewport.image().pixels().iter().all(|p| p.sum() == 0.0));
    }

    #[test]
    fn test_every_integrator_renders_through_the_viewport() {
        let preset = cornell_box(1.0).unwrap();
        for name in crate::integrators::INTEGRATOR_NAMES.iter() {
            let integrator = create_integrator(name, &VcmConfig::default()).unwrap();
            let settings = RenderingParams { num_threads: 2, tile_size: 3, ..RenderingParams::default() };
            let mut viewport = Viewport::new(6, 6, integrator, settings).unwrap();
            let image = viewport.render_passes(&preset.scene, &preset.camera, 2);
            let total: Float = image.pixels().iter().map(|p| p.sum()).sum();
            assert!(total.is_finite() && total > 0.0, "integrator '{}' produced {}", name, total);
        }
    }
}
