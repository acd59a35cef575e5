pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;
pub mod error;

pub use simulation::states::{Body, BodyId, BodyState, NVec2};
pub use simulation::barrier::{build_barrier, DisseminationBarrier, PhaseBarrier, RendezvousBarrier};
pub use simulation::engine::{BarrierStats, Engine, RunReport, Simulation};
pub use simulation::params::{Border, Parameters};
pub use simulation::scenario::Scenario;
pub use simulation::worker::WorkerReport;

pub use configuration::config::{
    BarrierStrategy, BodyConfig, BorderConfig, EngineConfig, ParametersConfig, RandomBodiesConfig,
    ScenarioConfig,
};

pub use visualization::render::{Circle, RenderSink, SvgFrames};
pub use visualization::snapshot::write_bodies;

pub use benchmark::benchmark::bench_barriers;

pub use error::{Result, SimError};
