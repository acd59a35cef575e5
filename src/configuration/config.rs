//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]        – worker count, barrier strategy, timing and rendering switches
//! - [`ParametersConfig`]    – physical constants, step size, tick count, border
//! - [`BodyConfig`]          – explicit initial state for a body
//! - [`RandomBodiesConfig`]  – bodies sampled inside the border
//! - [`ScenarioConfig`]      – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! Two bodies on a head-on course, run by two workers:
//!
//! ```yaml
//! engine:
//!   workers: 2
//!   barrier: "dissemination"   # or "rendezvous"
//!   timing: true
//!   rendering: false
//!
//! parameters:
//!   G: 0.0667                  # gravitational constant
//!   dt: 0.1                    # step size
//!   timesteps: 1000            # ticks to run
//!   overlap_tolerance: 15.0    # defaults to half the smallest radius
//!   border:
//!     enabled: false
//!     size: 600.0
//!
//! bodies:
//!   - x: [ 120.0, 200.0 ]
//!     v: [  -1.0,   0.0 ]
//!     m: 10.0
//!     radius: 30.0
//!   - x: [  60.0, 200.0 ]
//!     v: [   1.0,   0.0 ]
//!     m: 10.0
//!     radius: 30.0
//! ```
//!
//! A `random:` block may be given instead of (or in addition to) `bodies:`.
//! The scenario builder maps this configuration into runtime types.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::Result;

/// Which barrier the workers synchronize on
/// barrier: "dissemination"` or `barrier: "rendezvous"
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BarrierStrategy {
    #[default]
    #[serde(rename = "dissemination")] // ⌈log2 W⌉ rounds of semaphore handshakes
    Dissemination,

    #[serde(rename = "rendezvous")] // Counting barrier, all W arrive before any leaves
    Rendezvous,
}

/// Engine-level configuration
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub workers: usize, // number of worker threads, at least 1
    #[serde(default)]
    pub barrier: BarrierStrategy,
    #[serde(default)]
    pub timing: bool, // record time spent blocked in barriers
    #[serde(default)]
    pub rendering: bool, // hand circles to a render sink each tick
    pub render_every: Option<u64>, // draw every n-th tick, default 1
}

/// Optional square border spanning [0, size] on both axes
#[derive(Deserialize, Debug, Clone)]
pub struct BorderConfig {
    pub enabled: bool,
    pub size: Option<f64>, // derived from the bodies when omitted
}

/// Global numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub G: Option<f64>, // gravitational constant, default 0.0667
    pub dt: Option<f64>, // step size, default 0.1
    pub timesteps: u64, // ticks to run
    pub overlap_tolerance: Option<f64>, // allowed penetration before rewinding
    pub border: Option<BorderConfig>,
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>, // initial position [x, y]
    pub v: Vec<f64>, // initial velocity [vx, vy]
    pub m: f64, // mass
    pub radius: f64, // radius
}

/// Bodies placed uniformly at random inside the border
#[derive(Deserialize, Debug, Clone)]
pub struct RandomBodiesConfig {
    pub count: usize,
    pub radius: Option<f64>, // shared radius, required unless `varied`
    pub mass: Option<f64>, // shared mass, defaults to radius^3
    #[serde(default)]
    pub zero_velocity: bool,
    pub seed: Option<u64>, // fixed seed for reproducible runs
    #[serde(default)]
    pub varied: bool, // draw a radius per body, mass = radius^3
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
    pub random: Option<RandomBodiesConfig>,
}

impl ScenarioConfig {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}
