use pcsim::{
    bench_barriers, write_bodies, BarrierStrategy, Scenario, ScenarioConfig, Simulation, SvgFrames,
};
use pcsim::{BorderConfig, EngineConfig, ParametersConfig, RandomBodiesConfig};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Parallel n-body simulation with collisions")]
struct Args {
    /// Scenario file, looked up as given and then under scenarios/
    #[arg(short, long)]
    file_name: Option<String>,

    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    #[arg(short = 'n', long, default_value_t = 100)]
    bodies: usize,

    #[arg(short, long, default_value_t = 5.0)]
    radius: f64,

    #[arg(short, long, default_value_t = 1000)]
    timesteps: u64,

    #[arg(long, value_enum, default_value_t = BarrierStrategy::Dissemination)]
    barrier: BarrierStrategy,

    /// Bounce bodies off a square border of side 2 * radius * bodies
    #[arg(long)]
    border: bool,

    #[arg(long)]
    zero_velocity: bool,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    no_timing: bool,

    /// Write an SVG frame per tick into <output>/frames
    #[arg(long)]
    render: bool,

    /// Directory for StartingBodies.txt and FinalBodies.txt
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Compare the two barriers across worker counts and exit
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let direct = PathBuf::from(file_name);
    let config_path = if direct.is_file() {
        direct
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };
    ScenarioConfig::from_path(&config_path)
        .with_context(|| format!("loading scenario {}", config_path.display()))
}

fn scenario_from_args(args: &Args) -> ScenarioConfig {
    ScenarioConfig {
        engine: EngineConfig {
            workers: args.workers,
            barrier: args.barrier,
            timing: !args.no_timing,
            rendering: args.render,
            render_every: None,
        },
        parameters: ParametersConfig {
            G: None,
            dt: None,
            timesteps: args.timesteps,
            overlap_tolerance: None,
            border: Some(BorderConfig {
                enabled: args.border,
                size: None,
            }),
        },
        bodies: Vec::new(),
        random: Some(RandomBodiesConfig {
            count: args.bodies,
            radius: Some(args.radius),
            mass: None,
            zero_velocity: args.zero_velocity,
            seed: args.seed,
            varied: false,
        }),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.bench {
        bench_barriers(args.bodies, args.timesteps)?;
        return Ok(());
    }

    let scenario_cfg = match &args.file_name {
        Some(name) => load_scenario_from_yaml(name)?,
        None => scenario_from_args(&args),
    };
    let scenario = Scenario::build_scenario(scenario_cfg).context("building scenario")?;

    let p = &scenario.parameters;
    info!(
        "{} workers, {} bodies, {} timesteps, {:?} barrier, {}",
        scenario.engine.workers,
        scenario.bodies.len(),
        p.timesteps,
        scenario.engine.barrier,
        if p.border.enabled {
            format!("border {0} x {0}", p.border.size)
        } else {
            "no border".to_string()
        }
    );

    let view_size = if p.border.size > 0.0 { p.border.size } else { 600.0 };
    let rendering = scenario.engine.rendering;
    let mut sim = Simulation::new(scenario)?;
    if rendering {
        sim.set_renderer(Box::new(SvgFrames::new(args.output.join("frames"), view_size)?));
    }

    fs::create_dir_all(&args.output)?;
    write_bodies(args.output.join("StartingBodies.txt"), &sim.bodies())?;

    let report = sim.run_to_completion()?;
    println!("Time is {:.3} seconds", report.elapsed.as_secs_f64());
    println!("Detected collisions: {}", report.collisions());
    if sim.engine().timing {
        if let Some(stats) = sim.barrier_stats() {
            for (id, wait) in stats.per_worker.iter().enumerate() {
                println!("Worker {id} spent {} nanoseconds in the barrier", wait.as_nanos());
            }
            println!("The average time was {} nanoseconds.", stats.average.as_nanos());
        }
    }

    write_bodies(args.output.join("FinalBodies.txt"), &sim.bodies())?;
    println!(
        "Printed final positions and velocities to {}",
        args.output.join("FinalBodies.txt").display()
    );

    Ok(())
}
