//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! (`Scenario`) containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - initial bodies, explicit ones first, then any randomized ones
//!
//! `Simulation::new` consumes a `Scenario` and validates it again, so a
//! scenario assembled by hand gets the same checks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::config::{BodyConfig, RandomBodiesConfig, ScenarioConfig};
use crate::error::{Result, SimError};
use crate::simulation::engine::Engine;
use crate::simulation::params::{Border, Parameters};
use crate::simulation::states::{Body, NVec2};

pub const DEFAULT_G: f64 = 6.67e-2;
pub const DEFAULT_DT: f64 = 0.1;
/// Border side used for varied-size random bodies when none is given
pub const DEFAULT_VARIED_BORDER: f64 = 1000.0;

const UNIFORM_SPEED: f64 = 8.0;
const VARIED_SPEED: f64 = 15.0;
const VARIED_RADIUS: (f64, f64) = (2.0, 50.0);

#[derive(Debug, Clone)]
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub bodies: Vec<Body>,
}

fn invalid(msg: impl Into<String>) -> SimError {
    SimError::InvalidConfiguration(msg.into())
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        // Bodies: map `BodyConfig` -> runtime `Body` using nalgebra vectors
        let mut bodies = cfg
            .bodies
            .iter()
            .enumerate()
            .map(|(i, bc)| body_from_config(i, bc))
            .collect::<Result<Vec<Body>>>()?;

        let p_cfg = cfg.parameters;
        let border_cfg = p_cfg.border.clone();
        let border_size = match border_cfg.as_ref().and_then(|b| b.size) {
            Some(size) => size,
            None => match &cfg.random {
                Some(r) if r.varied => DEFAULT_VARIED_BORDER,
                Some(r) => {
                    let radius = r
                        .radius
                        .ok_or_else(|| invalid("random bodies need a radius unless varied"))?;
                    2.0 * radius * r.count as f64
                }
                None if border_cfg.as_ref().is_some_and(|b| b.enabled) => {
                    return Err(invalid("an enabled border needs a size when bodies are explicit"));
                }
                None => 0.0,
            },
        };

        if let Some(r) = &cfg.random {
            bodies.extend(random_bodies(r, border_size)?);
        }

        // Default tolerance: half the smallest radius
        let overlap_tolerance = p_cfg.overlap_tolerance.unwrap_or_else(|| {
            let smallest = bodies.iter().map(|b| b.radius).fold(f64::INFINITY, f64::min);
            if smallest.is_finite() { smallest / 2.0 } else { 0.0 }
        });

        let parameters = Parameters {
            G: p_cfg.G.unwrap_or(DEFAULT_G),
            dt: p_cfg.dt.unwrap_or(DEFAULT_DT),
            timesteps: p_cfg.timesteps,
            overlap_tolerance,
            border: Border {
                enabled: border_cfg.is_some_and(|b| b.enabled),
                size: border_size,
            },
        };

        // Engine (runtime) from EngineConfig
        let e_cfg = cfg.engine;
        let engine = Engine {
            workers: e_cfg.workers,
            barrier: e_cfg.barrier,
            timing: e_cfg.timing,
            rendering: e_cfg.rendering,
            render_every: e_cfg.render_every.unwrap_or(1),
        };

        let scenario = Self {
            engine,
            parameters,
            bodies,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.engine.workers == 0 {
            return Err(invalid("worker count must be at least 1"));
        }

        let p = &self.parameters;
        if !(p.dt.is_finite() && p.dt > 0.0) {
            return Err(invalid(format!("timestep must be positive, got {}", p.dt)));
        }
        if !p.G.is_finite() {
            return Err(invalid("gravitational constant must be finite"));
        }
        if !(p.overlap_tolerance.is_finite() && p.overlap_tolerance >= 0.0) {
            return Err(invalid(format!(
                "overlap tolerance must be non-negative, got {}",
                p.overlap_tolerance
            )));
        }
        if p.border.enabled && !(p.border.size.is_finite() && p.border.size > 0.0) {
            return Err(invalid(format!("border size must be positive, got {}", p.border.size)));
        }

        for (i, b) in self.bodies.iter().enumerate() {
            if !(b.m.is_finite() && b.m > 0.0) {
                return Err(invalid(format!("body {i} has non-positive mass {}", b.m)));
            }
            if !(b.radius.is_finite() && b.radius > 0.0) {
                return Err(invalid(format!("body {i} has non-positive radius {}", b.radius)));
            }
            if !b.is_finite() {
                return Err(invalid(format!("body {i} has a non-finite position or velocity")));
            }
        }
        Ok(())
    }
}

fn body_from_config(i: usize, bc: &BodyConfig) -> Result<Body> {
    match (bc.x.as_slice(), bc.v.as_slice()) {
        ([x, y], [vx, vy]) => {
            Ok(Body::new(bc.m, bc.radius, NVec2::new(*x, *y), NVec2::new(*vx, *vy)))
        }
        _ => Err(invalid(format!("body {i} needs two position and two velocity components"))),
    }
}

/// Uniform sample in [lo, hi), the midpoint if the range is empty
fn sample(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        0.5 * (lo + hi)
    }
}

/// Bodies placed uniformly inside a border of side `size`
pub fn random_bodies(cfg: &RandomBodiesConfig, size: f64) -> Result<Vec<Body>> {
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let speed = if cfg.varied { VARIED_SPEED } else { UNIFORM_SPEED };

    let mut bodies = Vec::with_capacity(cfg.count);
    for _ in 0..cfg.count {
        let radius = if cfg.varied {
            rng.gen_range(VARIED_RADIUS.0..VARIED_RADIUS.1)
        } else {
            cfg.radius.ok_or_else(|| invalid("random bodies need a radius unless varied"))?
        };
        let m = match cfg.mass {
            Some(m) if !cfg.varied => m,
            _ => radius * radius * radius,
        };

        let x = NVec2::new(
            sample(&mut rng, radius, size - radius),
            sample(&mut rng, radius, size - radius),
        );
        let v = if cfg.zero_velocity {
            NVec2::zeros()
        } else {
            NVec2::new(rng.gen_range(-speed..speed), rng.gen_range(-speed..speed))
        };
        bodies.push(Body::new(m, radius, x, v));
    }
    Ok(bodies)
}
