// Copyright @yucwang 2026

use clap::Parser;
use log::error;

use madeleine::core::context::{RenderingContext, RenderingParams};
use madeleine::core::error::RenderError;
use madeleine::core::film::Film;
use madeleine::core::integrator::RenderParams;
use madeleine::core::sensor::Sensor;
use madeleine::integrators::create_integrator;
use madeleine::integrators::vcm::VcmConfig;
use madeleine::math::constants::{Float, Vector2f, Vector3f};
use madeleine::scenes;

/// Estimates the radiance of a single pixel and prints mean and standard error.
#[derive(Parser, Debug)]
#[command(name = "render_pixel", version, about)]
struct Args {
    x: usize,
    y: usize,

    #[arg(short, long, default_value = "cornell")]
    scene: String,

    #[arg(short, long, default_value = "pathMis")]
    integrator: String,

    #[arg(short = 'W', long, default_value_t = 512)]
    width: usize,

    #[arg(short = 'H', long, default_value_t = 512)]
    height: usize,

    #[arg(long, default_value_t = 1024)]
    spp: u32,

    #[arg(long, default_value_t = 20)]
    max_ray_depth: u32,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn run(args: &Args) -> Result<(), RenderError> {
    if args.x >= args.width || args.y >= args.height {
        return Err(RenderError::InvalidConfig(format!(
            "pixel ({}, {}) outside of {}x{}", args.x, args.y, args.width, args.height)));
    }

    let preset = scenes::by_name(&args.scene, args.width as Float / args.height as Float)?;
    let mut integrator = create_integrator(&args.integrator, &VcmConfig::default())?;
    let settings = RenderingParams { max_ray_depth: args.max_ray_depth, seed: args.seed, ..RenderingParams::default() };
    settings.validate()?;

    let film = Film::new(args.width, args.height);
    let params = RenderParams {
        scene: &preset.scene,
        camera: &preset.camera,
        film: &film,
        settings: &settings,
        iteration: 0,
        span: tracing::Span::none(),
    };
    let mut contexts = vec![RenderingContext::new(args.seed, integrator.create_context())];
    integrator.pre_render(&params, &mut contexts);
    let ctx = &mut contexts[0];

    let mut sum = Vector3f::zeros();
    let mut sum_sqr = Vector3f::zeros();
    for _ in 0..args.spp {
        ctx.start_sample();
        let jitter = ctx.rng.next_vec2();
        let film_pos = Vector2f::new((args.x as Float + jitter.x) / args.width as Float,
                                     (args.y as Float + jitter.y) / args.height as Float);
        let ray = preset.camera.generate_ray(&film_pos);
        let color = integrator.render_pixel(&ray, &params, ctx).to_vector();
        sum += color;
        sum_sqr += color.component_mul(&color);
    }

    let n = args.spp.max(1) as Float;
    let mean = sum / n;
    let variance = (sum_sqr / n - mean.component_mul(&mean)).map(|v| v.max(0.0));
    let std_error = (variance / n).map(|v| v.sqrt());
    println!("pixel ({}, {}) with '{}', {} samples", args.x, args.y, integrator.name(), args.spp);
    println!("mean      = ({:.6}, {:.6}, {:.6})", mean.x, mean.y, mean.z);
    println!("std error = ({:.6}, {:.6}, {:.6})", std_error.x, std_error.y, std_error.z);
    println!("rays = {}, shadow rays = {}", ctx.counters.num_rays, ctx.counters.num_shadow_rays);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
