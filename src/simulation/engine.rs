//! High-level runtime engine
//!
//! `Engine` holds the run settings (worker count, barrier strategy, timing,
//! rendering). `Simulation` owns the body store, the per-worker force buffers
//! and the barrier, launches one thread per worker for a run and collects
//! their reports.

use std::thread;
use std::time::{Duration, Instant};

use log::info;
use parking_lot::{Mutex, RwLock};

use crate::configuration::config::BarrierStrategy;
use crate::error::{Result, SimError};
use crate::simulation::barrier::{build_barrier, PhaseBarrier};
use crate::simulation::params::Parameters;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::{Body, BodyState, NVec2};
use crate::simulation::worker::{SimContext, StartGate, Worker, WorkerReport};
use crate::visualization::render::RenderSink;

#[derive(Debug, Clone)]
pub struct Engine {
    pub workers: usize, // worker threads per run
    pub barrier: BarrierStrategy, // dissemination or rendezvous
    pub timing: bool, // time spent blocked in barriers
    pub rendering: bool, // feed the render sink
    pub render_every: u64, // ticks between frames
}

/// Time the workers spent blocked in barriers
#[derive(Debug, Clone, PartialEq)]
pub struct BarrierStats {
    pub per_worker: Vec<Duration>,
    pub total: Duration,
    pub average: Duration,
}

/// Outcome of one `run_to_completion`
#[derive(Debug, Clone)]
pub struct RunReport {
    pub ticks: u64,
    pub elapsed: Duration,
    pub workers: Vec<WorkerReport>,
}

impl RunReport {
    pub fn collisions(&self) -> usize {
        self.workers.iter().map(|w| w.collisions).sum()
    }

    pub fn barrier_stats(&self) -> BarrierStats {
        let per_worker: Vec<Duration> = self.workers.iter().map(|w| w.barrier_wait).collect();
        let total: Duration = per_worker.iter().sum();
        let average = if per_worker.is_empty() {
            Duration::ZERO
        } else {
            total / per_worker.len() as u32
        };
        BarrierStats {
            per_worker,
            total,
            average,
        }
    }
}

pub struct Simulation {
    engine: Engine,
    parameters: Parameters,
    bodies: Vec<Mutex<Body>>,
    partials: Vec<RwLock<Vec<NVec2>>>,
    barrier: Box<dyn PhaseBarrier>,
    renderer: Option<Box<dyn RenderSink>>,
    ticks_done: u64,
    collisions: usize,
    last_report: Option<RunReport>,
}

impl Simulation {
    /// Validate `scenario` and build the barrier its engine settings select
    pub fn new(scenario: Scenario) -> Result<Self> {
        let barrier = build_barrier(scenario.engine.barrier, scenario.engine.workers);
        Self::with_barrier(scenario, barrier)
    }

    /// Like [`Simulation::new`] with a caller-supplied barrier
    pub fn with_barrier(scenario: Scenario, barrier: Box<dyn PhaseBarrier>) -> Result<Self> {
        scenario.validate()?;
        let Scenario {
            engine,
            parameters,
            bodies,
        } = scenario;

        if barrier.parties() != engine.workers {
            return Err(SimError::BarrierMismatch {
                barrier: barrier.parties(),
                workers: engine.workers,
            });
        }

        let n = bodies.len();
        let partials = (0..engine.workers)
            .map(|_| RwLock::new(vec![NVec2::zeros(); n]))
            .collect();

        Ok(Self {
            engine,
            parameters,
            bodies: bodies.into_iter().map(Mutex::new).collect(),
            partials,
            barrier,
            renderer: None,
            ticks_done: 0,
            collisions: 0,
            last_report: None,
        })
    }

    /// Sink that receives the body circles when rendering is enabled
    pub fn set_renderer(&mut self, sink: Box<dyn RenderSink>) {
        self.renderer = Some(sink);
    }

    /// Run every worker for the configured number of ticks and join them
    ///
    /// A second call continues from the current state. A worker panic poisons
    /// the barrier, so once a run has failed with `WorkerPanicked` later runs
    /// fail with `BarrierBroken`.
    pub fn run_to_completion(&mut self) -> Result<&RunReport> {
        let workers = self.engine.workers;
        let ticks = self.parameters.timesteps;
        info!(
            "running {} bodies on {} workers for {} ticks with a {:?} barrier",
            self.bodies.len(),
            workers,
            ticks,
            self.engine.barrier
        );

        let ctx = SimContext::new(
            &self.bodies,
            &self.partials,
            &self.parameters,
            self.barrier.as_ref(),
            self.ticks_done,
        );
        let gate = StartGate::new();
        let mut renderer = if self.engine.rendering {
            self.renderer.as_deref_mut()
        } else {
            None
        };
        let timing = self.engine.timing;
        let render_every = self.engine.render_every;

        let start = Instant::now();
        let results: Vec<Result<WorkerReport>> = thread::scope(|s| {
            let mut handles = Vec::with_capacity(workers);
            for id in 0..workers {
                let mut worker = Worker::new(id, &ctx, timing);
                if id == 0 {
                    if let Some(sink) = renderer.take() {
                        worker = worker.with_renderer(sink, render_every);
                    }
                }
                let gate = &gate;
                let spawned = thread::Builder::new()
                    .name(format!("worker-{id}"))
                    .spawn_scoped(s, move || worker.run(gate));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        gate.open(false);
                        return vec![Err(SimError::Spawn(e))];
                    }
                }
            }
            gate.open(true);

            handles
                .into_iter()
                .enumerate()
                .map(|(id, h)| h.join().unwrap_or(Err(SimError::WorkerPanicked(id))))
                .collect()
        });
        let elapsed = start.elapsed();

        let mut reports = Vec::with_capacity(workers);
        let mut failure = None;
        for result in results {
            match result {
                Ok(report) => reports.push(report),
                // the others only saw the barrier it broke on the way out
                Err(e @ SimError::WorkerPanicked(_)) => return Err(e),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        if let Some(e) = failure {
            return Err(e);
        }
        let report = RunReport {
            ticks,
            elapsed,
            workers: reports,
        };

        self.ticks_done += ticks;
        self.collisions += report.collisions();
        info!(
            "finished {} ticks in {:?}, {} collisions",
            ticks,
            elapsed,
            report.collisions()
        );
        if timing {
            let stats = report.barrier_stats();
            for (id, wait) in stats.per_worker.iter().enumerate() {
                info!("worker {id} spent {wait:?} in the barrier");
            }
            info!("average barrier wait {:?}", stats.average);
        }

        Ok(self.last_report.insert(report))
    }

    /// Snapshot of every body, in index order
    pub fn bodies(&self) -> Vec<BodyState> {
        self.bodies.iter().map(|b| b.lock().state()).collect()
    }

    /// Barrier waits of the latest run, `None` before the first run
    pub fn barrier_stats(&self) -> Option<BarrierStats> {
        self.last_report.as_ref().map(RunReport::barrier_stats)
    }

    /// Body-body collisions resolved over every run so far
    pub fn collision_count(&self) -> usize {
        self.collisions
    }

    pub fn report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    pub fn ticks_done(&self) -> u64 {
        self.ticks_done
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}
