//! Phase barriers shared by the simulation workers
//!
//! Two interchangeable full barriers behind one [`PhaseBarrier`] trait:
//! - [`DisseminationBarrier`]: ⌈log2 W⌉ rounds of pairwise semaphore
//!   handshakes, no central counter
//! - [`RendezvousBarrier`]: a generation-counting barrier, all W arrive before
//!   any leaves
//!
//! Either one establishes the happens-before edge between phases: every write
//! made by any worker before `arrive_and_wait` is visible to every worker after
//! the matching call returns.
//!
//! A barrier can be poisoned. Every blocked and every later `arrive_and_wait`
//! then fails with [`SimError::BarrierBroken`], so the remaining workers of a
//! run can leave when one of them dies.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::configuration::config::BarrierStrategy;
use crate::error::{Result, SimError};

/// A reusable synchronization point for exactly `parties()` workers
pub trait PhaseBarrier: Send + Sync {
    /// Block worker `worker` (in `0..parties()`) until every worker has arrived
    fn arrive_and_wait(&self, worker: usize) -> Result<()>;

    /// Number of workers this barrier was built for
    fn parties(&self) -> usize;

    /// Fail every current and future wait
    fn poison(&self);
}

/// Build the barrier selected by `strategy` for `workers` participants
pub fn build_barrier(strategy: BarrierStrategy, workers: usize) -> Box<dyn PhaseBarrier> {
    match strategy {
        BarrierStrategy::Dissemination => Box::new(DisseminationBarrier::new(workers)),
        BarrierStrategy::Rendezvous => Box::new(RendezvousBarrier::new(workers)),
    }
}

/// Counting semaphore that can be closed
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
    closed: AtomicBool,
}

impl Semaphore {
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Add one permit, waking a waiter if there is one
    pub fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.available.notify_one();
    }

    /// Take one permit, blocking until one is available
    ///
    /// Fails once the semaphore is closed, permits or not.
    pub fn acquire(&self) -> Result<()> {
        let mut permits = self.permits.lock();
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(SimError::BarrierBroken);
            }
            if *permits > 0 {
                *permits -= 1;
                return Ok(());
            }
            self.available.wait(&mut permits);
        }
    }

    /// Wake every waiter and fail every later acquire
    pub fn close(&self) {
        // under the lock so a waiter cannot miss the wakeup
        let _permits = self.permits.lock();
        self.closed.store(true, Ordering::Release);
        self.available.notify_all();
    }
}

/// Number of dissemination rounds for `workers` participants, ⌈log2 W⌉
pub fn dissemination_rounds(workers: usize) -> usize {
    if workers <= 1 {
        0
    } else {
        (usize::BITS - (workers - 1).leading_zeros()) as usize
    }
}

/// Dissemination barrier over a `rounds x workers` grid of semaphores
///
/// In round `k` worker `id` signals `(id + 2^k) mod W` and then waits on its own
/// slot. Each slot gets exactly one release and one acquire per use, so the grid
/// needs no reset between uses.
pub struct DisseminationBarrier {
    workers: usize,
    slots: Vec<Vec<Semaphore>>,
    broken: AtomicBool, // also covers W = 1, which has no slots
}

impl DisseminationBarrier {
    pub fn new(workers: usize) -> Self {
        let rounds = dissemination_rounds(workers);
        let slots = (0..rounds)
            .map(|_| (0..workers).map(|_| Semaphore::new(0)).collect())
            .collect();
        Self {
            workers,
            slots,
            broken: AtomicBool::new(false),
        }
    }

    pub fn rounds(&self) -> usize {
        self.slots.len()
    }

    /// Worker signalled by `worker` in `round`
    pub fn neighbor(&self, worker: usize, round: usize) -> usize {
        (worker + (1usize << round)) % self.workers
    }
}

impl PhaseBarrier for DisseminationBarrier {
    fn arrive_and_wait(&self, worker: usize) -> Result<()> {
        debug_assert!(
            worker < self.workers,
            "worker {worker} outside barrier of {}",
            self.workers
        );
        if self.broken.load(Ordering::Acquire) {
            return Err(SimError::BarrierBroken);
        }
        for (round, slots) in self.slots.iter().enumerate() {
            slots[self.neighbor(worker, round)].release();
            slots[worker].acquire()?;
        }
        Ok(())
    }

    fn parties(&self) -> usize {
        self.workers
    }

    fn poison(&self) {
        self.broken.store(true, Ordering::Release);
        for sem in self.slots.iter().flatten() {
            sem.close();
        }
    }
}

struct RendezvousState {
    arrived: usize,
    generation: u64,
    broken: bool,
}

/// All-wait rendezvous barrier
pub struct RendezvousBarrier {
    workers: usize,
    state: Mutex<RendezvousState>,
    released: Condvar,
}

impl RendezvousBarrier {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            state: Mutex::new(RendezvousState {
                arrived: 0,
                generation: 0,
                broken: false,
            }),
            released: Condvar::new(),
        }
    }
}

impl PhaseBarrier for RendezvousBarrier {
    fn arrive_and_wait(&self, _worker: usize) -> Result<()> {
        let mut state = self.state.lock();
        if state.broken {
            return Err(SimError::BarrierBroken);
        }

        state.arrived += 1;
        if state.arrived >= self.workers {
            // last one in opens the next generation
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
            return Ok(());
        }

        let generation = state.generation;
        while state.generation == generation {
            if state.broken {
                return Err(SimError::BarrierBroken);
            }
            self.released.wait(&mut state);
        }
        Ok(())
    }

    fn parties(&self) -> usize {
        self.workers
    }

    fn poison(&self) {
        self.state.lock().broken = true;
        self.released.notify_all();
    }
}
