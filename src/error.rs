//! Error types for the simulation engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("barrier built for {barrier} workers but {workers} workers were configured")]
    BarrierMismatch { barrier: usize, workers: usize },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("run aborted, another worker left the barrier")]
    BarrierBroken,

    #[error("body {body} left finite state at tick {tick}")]
    Diverged { body: usize, tick: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
