//! Core state types for the collision simulation.
//!
//! Defines the mutable `Body` that lives in the shared body store and the
//! plain `BodyState` snapshot handed to sinks and callers.
//!
//! Bodies refer to each other only by index (`BodyId`), never by reference.

use std::collections::HashSet;
use std::fmt;

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

/// Stable index of a body in the body store
pub type BodyId = usize;

#[derive(Debug, Clone)]
pub struct Body {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
    pub m: f64, // mass
    pub radius: f64, // radius
    pub x_old: NVec2, // position before the last move
    pub v_old: NVec2, // velocity before the last change
    pub last_force: NVec2, // force applied by the most recent integration
    curr_collisions: HashSet<BodyId>,
    prev_collisions: HashSet<BodyId>,
    curr_wall_x: bool,
    curr_wall_y: bool,
    prev_wall_x: bool,
    prev_wall_y: bool,
}

impl Body {
    pub fn new(m: f64, radius: f64, x: NVec2, v: NVec2) -> Self {
        Self {
            x,
            v,
            m,
            radius,
            x_old: x,
            v_old: v,
            last_force: NVec2::zeros(),
            curr_collisions: HashSet::new(),
            prev_collisions: HashSet::new(),
            curr_wall_x: false,
            curr_wall_y: false,
            prev_wall_x: false,
            prev_wall_y: false,
        }
    }

    /// Advance the position by `v * dt`, snapshotting position and velocity first
    pub fn advance(&mut self, dt: f64) {
        self.x_old = self.x;
        self.v_old = self.v;
        self.x += dt * self.v;
    }

    /// Rebuild the position from the last snapshot, moving only `fraction` of a step
    pub fn advance_fraction(&mut self, dt: f64, fraction: f64) {
        self.x = self.x_old + (dt * fraction) * self.v_old;
    }

    pub fn set_velocity(&mut self, v: NVec2) {
        self.v = v;
    }

    /// v += dv * dt
    pub fn change_velocity_by(&mut self, dv: NVec2, dt: f64) {
        self.v_old = self.v;
        self.v += dt * dv;
    }

    /// v = v_old + dv * dt, used when rewinding a tick
    pub fn change_old_velocity_by(&mut self, dv: NVec2, dt: f64) {
        self.v = self.v_old + dt * dv;
    }

    pub fn record_force(&mut self, f: NVec2) {
        self.last_force = f;
    }

    pub fn add_recent_collision(&mut self, other: BodyId) {
        self.curr_collisions.insert(other);
    }

    /// True if `other` was resolved against this body on the previous tick
    pub fn collided_last_tick(&self, other: BodyId) -> bool {
        self.prev_collisions.contains(&other)
    }

    pub fn mark_wall_x(&mut self) {
        self.curr_wall_x = true;
    }

    pub fn mark_wall_y(&mut self) {
        self.curr_wall_y = true;
    }

    pub fn hit_wall_x_last_tick(&self) -> bool {
        self.prev_wall_x
    }

    pub fn hit_wall_y_last_tick(&self) -> bool {
        self.prev_wall_y
    }

    /// Current-tick collision set and wall flags become the previous-tick ones
    pub fn rotate_collision_window(&mut self) {
        self.prev_collisions = std::mem::take(&mut self.curr_collisions);
        self.prev_wall_x = std::mem::replace(&mut self.curr_wall_x, false);
        self.prev_wall_y = std::mem::replace(&mut self.curr_wall_y, false);
    }

    pub fn is_finite(&self) -> bool {
        self.x.iter().chain(self.v.iter()).all(|c| c.is_finite())
    }

    pub fn state(&self) -> BodyState {
        BodyState {
            x: self.x,
            v: self.v,
            m: self.m,
            radius: self.radius,
        }
    }
}

/// Read-only copy of a body's physical state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub x: NVec2,
    pub v: NVec2,
    pub m: f64,
    pub radius: f64,
}

impl From<BodyState> for Body {
    fn from(s: BodyState) -> Self {
        Body::new(s.m, s.radius, s.x, s.v)
    }
}

impl fmt::Display for BodyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Body Pos({:11.3}, {:11.3})\t\tVel[{:11.3}, {:11.3}]",
            self.x.x, self.x.y, self.v.x, self.v.y
        )
    }
}
