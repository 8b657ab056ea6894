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
use madeleine::math::constants::{Float, Vector2f};
use madeleine::scenes;

/// Traces camera paths through one pixel and prints every vertex.
#[derive(Parser, Debug)]
#[command(name = "trace_pixel_path", version, about)]
struct Args {
    x: usize,
    y: usize,

    #[arg(short, long, default_value = "cornell")]
    scene: String,

    /// Integrator recording the path, path or pathMis
    #[arg(short, long, default_value = "path")]
    integrator: String,

    #[arg(short = 'W', long, default_value_t = 512)]
    width: usize,

    #[arg(short = 'H', long, default_value_t = 512)]
    height: usize,

    #[arg(short = 'n', long, default_value_t = 1)]
    paths: u32,

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
    let settings = RenderingParams { seed: args.seed, ..RenderingParams::default() };
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

    let film_pos = Vector2f::new((args.x as Float + 0.5) / args.width as Float,
                                 (args.y as Float + 0.5) / args.height as Float);
    let ray = preset.camera.generate_ray(&film_pos);

    for path in 0..args.paths {
        ctx.enable_path_debugging();
        ctx.start_sample();
        let color = integrator.render_pixel(&ray, &params, ctx);
        let debug = match ctx.path_debug.take() {
            Some(debug) => debug,
            None => continue,
        };

        println!("path {}: color = {:?}, {} vertices, terminated by {:?}",
                 path, color, debug.vertices.len(), debug.termination_reason);
        for (i, vertex) in debug.vertices.iter().enumerate() {
            println!("  [{}] object {}{} at t = {:.4}, p = ({:.4}, {:.4}, {:.4}), n = ({:.3}, {:.3}, {:.3}), event {:?}, throughput {:?}",
                     i, vertex.object_id, if vertex.hit_light { " (light)" } else { "" }, vertex.distance,
                     vertex.position.x, vertex.position.y, vertex.position.z,
                     vertex.normal.x, vertex.normal.y, vertex.normal.z,
                     vertex.event, vertex.throughput);
        }
    }
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
