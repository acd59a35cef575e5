//! Worker threads and the context they share
//!
//! Every worker runs the same tick loop over its stride of body indices:
//!
//! ```text
//! forces -> barrier -> integrate + move -> barrier -> collisions -> barrier
//! ```
//!
//! The barriers order the phases. Inside the collision phase each body also
//! carries a turn counter, so the pairs touching a body are resolved in
//! ascending row order whatever the thread timing. The partial force buffers
//! are written only by their owner and read by everyone after the force
//! barrier.
//!
//! A worker that panics poisons the barrier on its way out, so the others
//! leave the run instead of waiting for it forever.

use std::ops::Range;
use std::iter::StepBy;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::error::{Result, SimError};
use crate::simulation::barrier::PhaseBarrier;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec2};
use crate::simulation::{collisions, forces, integrator};
use crate::visualization::render::{Circle, RenderSink};

const NO_BODY: usize = usize::MAX;
const SPINS_BEFORE_YIELD: u32 = 64;

/// Everything the workers of one run share, built by the engine per run
pub struct SimContext<'a> {
    pub bodies: &'a [Mutex<Body>],
    pub partials: &'a [RwLock<Vec<NVec2>>], // one force buffer per worker
    pub params: &'a Parameters,
    pub barrier: &'a dyn PhaseBarrier,
    pub workers: usize,
    pub first_tick: u64, // ticks completed by earlier runs
    diverged: AtomicUsize,
    turns: Vec<AtomicUsize>, // next collision row allowed to touch each body
    aborted: AtomicBool,
}

impl<'a> SimContext<'a> {
    pub fn new(
        bodies: &'a [Mutex<Body>],
        partials: &'a [RwLock<Vec<NVec2>>],
        params: &'a Parameters,
        barrier: &'a dyn PhaseBarrier,
        first_tick: u64,
    ) -> Self {
        Self {
            bodies,
            partials,
            params,
            barrier,
            workers: partials.len(),
            first_tick,
            diverged: AtomicUsize::new(NO_BODY),
            turns: bodies.iter().map(|_| AtomicUsize::new(0)).collect(),
            aborted: AtomicBool::new(false),
        }
    }

    /// Indices below `upto` owned by `worker`: `i mod W == worker`
    pub fn owned(&self, worker: usize, upto: usize) -> StepBy<Range<usize>> {
        (worker..upto).step_by(self.workers.max(1))
    }

    /// Record that body `i` left finite state, first report wins
    pub fn flag_divergence(&self, i: usize) {
        let _ = self
            .diverged
            .compare_exchange(NO_BODY, i, Ordering::AcqRel, Ordering::Acquire);
    }

    pub fn diverged_body(&self) -> Option<usize> {
        match self.diverged.load(Ordering::Acquire) {
            NO_BODY => None,
            i => Some(i),
        }
    }

    /// Block until row `row` may touch body `body` in the collision phase
    pub fn wait_turn(&self, body: usize, row: usize) -> Result<()> {
        let mut spins = 0;
        while self.turns[body].load(Ordering::Acquire) != row {
            if self.aborted.load(Ordering::Acquire) {
                return Err(SimError::BarrierBroken);
            }
            if spins < SPINS_BEFORE_YIELD {
                std::hint::spin_loop();
                spins += 1;
            } else {
                thread::yield_now();
            }
        }
        Ok(())
    }

    /// Hand body `body` on to row `next`
    pub fn pass_turn(&self, body: usize, next: usize) {
        self.turns[body].store(next, Ordering::Release);
    }

    /// Stop the run: break the barrier and every turn wait
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
        self.barrier.poison();
    }

    pub fn circles(&self) -> Vec<Circle> {
        self.bodies
            .iter()
            .map(|b| {
                let b = b.lock();
                Circle {
                    center: b.x,
                    radius: b.radius,
                }
            })
            .collect()
    }
}

/// One-shot gate the workers wait on before their first tick
///
/// Lets the engine call off a run when a later worker fails to spawn, instead
/// of leaving the earlier ones blocked in the first barrier.
pub struct StartGate {
    state: Mutex<Option<bool>>,
    opened: Condvar,
}

impl StartGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(None),
            opened: Condvar::new(),
        }
    }

    pub fn open(&self, go: bool) {
        *self.state.lock() = Some(go);
        self.opened.notify_all();
    }

    /// Block until the gate opens; true means run
    pub fn wait(&self) -> bool {
        let mut state = self.state.lock();
        loop {
            if let Some(go) = *state {
                return go;
            }
            self.opened.wait(&mut state);
        }
    }
}

impl Default for StartGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Aborts the run if the worker unwinds
struct AbortOnPanic<'a>(&'a SimContext<'a>);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

/// What a worker hands back to the engine when it is done
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    pub id: usize,
    pub collisions: usize,
    pub barrier_wait: Duration, // zero unless timing is on
    pub barrier_calls: u64,
}

pub struct Worker<'a> {
    id: usize,
    ctx: &'a SimContext<'a>,
    timing: bool,
    barrier_wait: Duration,
    barrier_calls: u64,
    collisions: usize,
    renderer: Option<&'a mut dyn RenderSink>,
    render_every: u64,
}

impl<'a> Worker<'a> {
    pub fn new(id: usize, ctx: &'a SimContext<'a>, timing: bool) -> Self {
        Self {
            id,
            ctx,
            timing,
            barrier_wait: Duration::ZERO,
            barrier_calls: 0,
            collisions: 0,
            renderer: None,
            render_every: 1,
        }
    }

    /// Draw the bodies into `sink` every `every` ticks
    pub fn with_renderer(mut self, sink: &'a mut dyn RenderSink, every: u64) -> Self {
        self.renderer = Some(sink);
        self.render_every = every.max(1);
        self
    }

    /// Run the configured number of ticks once `gate` opens
    pub fn run(mut self, gate: &StartGate) -> Result<WorkerReport> {
        if !gate.wait() {
            return Ok(self.report());
        }

        let ctx = self.ctx;
        let _guard = AbortOnPanic(ctx);
        let n = ctx.bodies.len();

        for step in 0..ctx.params.timesteps {
            let tick = ctx.first_tick + step;

            {
                let mut partial = ctx.partials[self.id].write();
                partial.resize(n, NVec2::zeros());
                forces::accumulate_partition(ctx, self.id, &mut partial);
            }
            self.barrier()?;

            integrator::integrate_partition(ctx, self.id);
            self.barrier()?;

            self.collisions += collisions::resolve_partition(ctx, self.id)?;
            self.barrier()?;

            // Bodies stay read-only until the next tick's first barrier
            if tick % self.render_every == 0 {
                self.render(tick);
            }

            // Set only before the last barrier, so every worker sees the same value here
            if let Some(body) = ctx.diverged_body() {
                return Err(SimError::Diverged { body, tick });
            }

            if self.id == 0 && step % 100 == 0 {
                debug!("tick {tick}, worker 0 has seen {} collisions", self.collisions);
            }
        }

        Ok(self.report())
    }

    fn barrier(&mut self) -> Result<()> {
        self.barrier_calls += 1;
        if self.timing {
            let start = Instant::now();
            let res = self.ctx.barrier.arrive_and_wait(self.id);
            self.barrier_wait += start.elapsed();
            res
        } else {
            self.ctx.barrier.arrive_and_wait(self.id)
        }
    }

    fn render(&mut self, tick: u64) {
        let Some(sink) = self.renderer.as_deref_mut() else {
            return;
        };
        let circles = self.ctx.circles();
        if let Err(e) = sink.draw(tick, &circles) {
            warn!("render sink failed at tick {tick}, rendering disabled: {e}");
            self.renderer = None;
        }
    }

    fn report(&self) -> WorkerReport {
        WorkerReport {
            id: self.id,
            collisions: self.collisions,
            barrier_wait: self.barrier_wait,
            barrier_calls: self.barrier_calls,
        }
    }
}
