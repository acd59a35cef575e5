pub mod states;
pub mod params;
pub mod barrier;
pub mod forces;
pub mod integrator;
pub mod collisions;
pub mod worker;
pub mod engine;
pub mod scenario;
