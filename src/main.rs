// Copyright 2020 TwoCookingMice

use clap::Parser;
use log::{error, info};

use madeleine::core::context::{LightSamplingStrategy, RenderingParams};
use madeleine::core::error::RenderError;
use madeleine::core::integrator::Integrator;
use madeleine::integrators::create_integrator;
use madeleine::integrators::debug::{DebugIntegrator, DebugRenderingMode};
use madeleine::integrators::vcm::{VcmConfig, VertexMergingKernel};
use madeleine::io::write_image;
use madeleine::math::constants::Float;
use madeleine::renderers::viewport::Viewport;
use madeleine::scenes;

/// Progressive renderer for the built-in scenes.
#[derive(Parser, Debug)]
#[command(name = "madeleine", version, about)]
struct Cli {
    /// Scene preset: cornell, cornellEmpty, cornellFog, sphereSky or materials
    #[arg(short, long, default_value = "cornell")]
    scene: String,

    /// Integrator: path, pathMis, vcm, lightTracer or debug
    #[arg(short, long, default_value = "vcm")]
    integrator: String,

    /// Output image. `.exr` keeps linear radiance, other extensions are tone mapped.
    #[arg(short, long, default_value = "out.exr")]
    output: String,

    #[arg(short = 'W', long, default_value_t = 512)]
    width: usize,

    #[arg(short = 'H', long, default_value_t = 512)]
    height: usize,

    /// Number of progressive passes, one sample per pixel each
    #[arg(short = 'n', long, default_value_t = 64)]
    passes: u32,

    /// Render threads, 0 uses every core
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 20)]
    max_ray_depth: u32,

    #[arg(long, default_value_t = 2)]
    min_russian_roulette_depth: u32,

    #[arg(long, default_value_t = 16)]
    tile_size: usize,

    /// Sample every light at each vertex instead of picking one
    #[arg(long)]
    all_lights: bool,

    /// Exposure applied before tone mapping
    #[arg(long, default_value_t = 1.0)]
    exposure: Float,

    /// Quantity shown by the debug integrator
    #[arg(long, default_value = "normals")]
    debug_mode: String,

    #[arg(long, default_value_t = 10)]
    vcm_max_path_length: u32,

    #[arg(long, default_value_t = 0.02)]
    vcm_radius: Float,

    #[arg(long)]
    vcm_min_radius: Option<Float>,

    #[arg(long, default_value_t = 1.0)]
    vcm_radius_multiplier: Float,

    /// Merging kernel: uniform, epanechnikov or smooth
    #[arg(long, default_value = "uniform")]
    vcm_kernel: String,

    /// Disable vertex connection (photon mapping only)
    #[arg(long)]
    no_vertex_connection: bool,

    /// Disable vertex merging (bidirectional path tracing only)
    #[arg(long)]
    no_vertex_merging: bool,

    #[arg(long)]
    no_progress: bool,
}

fn vcm_config(cli: &Cli) -> Result<VcmConfig, RenderError> {
    Ok(VcmConfig {
        use_vertex_connection: !cli.no_vertex_connection,
        use_vertex_merging: !cli.no_vertex_merging,
        max_path_length: cli.vcm_max_path_length,
        initial_merging_radius: cli.vcm_radius,
        min_merging_radius: cli.vcm_min_radius.unwrap_or(cli.vcm_radius),
        merging_radius_multiplier: cli.vcm_radius_multiplier,
        kernel: VertexMergingKernel::from_name(&cli.vcm_kernel)?,
        ..VcmConfig::default()
    })
}

fn run(cli: &Cli) -> Result<(), RenderError> {
    let settings = RenderingParams {
        max_ray_depth: cli.max_ray_depth,
        min_russian_roulette_depth: cli.min_russian_roulette_depth,
        light_sampling_strategy: if cli.all_lights { LightSamplingStrategy::All } else { LightSamplingStrategy::Single },
        tile_size: cli.tile_size,
        num_threads: cli.threads,
        seed: cli.seed,
    };

    let aspect = cli.width as Float / cli.height.max(1) as Float;
    let preset = scenes::by_name(&cli.scene, aspect)?;

    let integrator: Box<dyn Integrator> = if cli.integrator == "debug" {
        Box::new(DebugIntegrator::new(DebugRenderingMode::from_name(&cli.debug_mode)?))
    } else {
        create_integrator(&cli.integrator, &vcm_config(cli)?)?
    };

    info!("Rendering scene '{}' at {}x{} with '{}', {} passes.",
          preset.name, cli.width, cli.height, integrator.name(), cli.passes);

    let mut viewport = Viewport::new(cli.width, cli.height, integrator, settings)?
        .with_progress_bar(!cli.no_progress);
    let image = viewport.render_passes(&preset.scene, &preset.camera, cli.passes);

    write_image(&image, cli.exposure, &cli.output)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
