use std::time::Duration;

use crate::configuration::config::{BarrierStrategy, RandomBodiesConfig};
use crate::error::Result;
use crate::simulation::engine::{Engine, Simulation};
use crate::simulation::params::{Border, Parameters};
use crate::simulation::scenario::{random_bodies, Scenario, DEFAULT_DT, DEFAULT_G};

/// Worker counts compared by [`bench_barriers`]
pub const BENCH_WORKERS: [usize; 4] = [1, 2, 4, 8];

/// Helper to build a seeded scenario of `n` bodies for `workers` workers
fn make_scenario(
    n: usize,
    ticks: u64,
    workers: usize,
    barrier: BarrierStrategy,
) -> Result<Scenario> {
    let radius = 5.0;
    let size = 2.0 * radius * n as f64;
    let random = RandomBodiesConfig {
        count: n,
        radius: Some(radius),
        mass: None,
        zero_velocity: false,
        seed: Some(42),
        varied: false,
    };

    Ok(Scenario {
        engine: Engine {
            workers,
            barrier,
            timing: true,
            rendering: false,
            render_every: 1,
        },
        parameters: Parameters {
            G: DEFAULT_G,
            dt: DEFAULT_DT,
            timesteps: ticks,
            overlap_tolerance: radius / 2.0,
            border: Border { enabled: true, size },
        },
        bodies: random_bodies(&random, size)?,
    })
}

/// One benchmark row
#[derive(Debug, Clone)]
pub struct BenchRow {
    pub workers: usize,
    pub barrier: BarrierStrategy,
    pub elapsed: Duration,
    pub average_wait: Duration,
    pub collisions: usize,
}

/// Run the same seeded scenario under both barriers for each worker count
/// Prints CSV so the output can be pasted straight into a spreadsheet
pub fn bench_barriers(n: usize, ticks: u64) -> Result<Vec<BenchRow>> {
    println!("workers,barrier,elapsed_ms,avg_barrier_ms,collisions");

    let mut rows = Vec::new();
    for workers in BENCH_WORKERS {
        for barrier in [BarrierStrategy::Dissemination, BarrierStrategy::Rendezvous] {
            let mut sim = Simulation::new(make_scenario(n, ticks, workers, barrier)?)?;
            let report = sim.run_to_completion()?;
            let row = BenchRow {
                workers,
                barrier,
                elapsed: report.elapsed,
                average_wait: report.barrier_stats().average,
                collisions: report.collisions(),
            };

            println!(
                "{},{:?},{:.3},{:.3},{}",
                row.workers,
                row.barrier,
                row.elapsed.as_secs_f64() * 1000.0,
                row.average_wait.as_secs_f64() * 1000.0,
                row.collisions
            );
            rows.push(row);
        }
    }
    Ok(rows)
}
