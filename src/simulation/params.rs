//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - gravitational constant and step size (`G`, `dt`),
//! - number of ticks to run,
//! - overlap tolerance used by the rewind correction,
//! - the optional square border

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub enabled: bool,
    pub size: f64, // side length, border spans [0, size] on both axes
}

#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct Parameters {
    pub G: f64, // gravitational constant
    pub dt: f64, // step size
    pub timesteps: u64, // ticks per run
    pub overlap_tolerance: f64, // allowed penetration depth before rewinding
    pub border: Border,
}
