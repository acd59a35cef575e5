//! Collision detection and resolution
//!
//! Pairs are partitioned the same way as the force kernel: worker `w` owns
//! every row `i` with `i mod W == w` and tests `i` against each `j > i`.
//! Rows meet on shared partners, so each body keeps a turn counter. Row `i`
//! touches body `j` only once rows `0..i` are done with it, which gives every
//! body the same sequence of updates as a single worker walking the rows in
//! order. A pair is resolved with both bodies locked, lower index first.
//!
//! Resolution order for a colliding pair:
//! 1. skip it if it was already resolved on the previous tick
//! 2. rewind both bodies if they overlap by more than the tolerance
//! 3. exchange momentum along the line of centres (2D elastic collision)

use log::warn;

use crate::error::Result;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, BodyId, NVec2};
use crate::simulation::worker::SimContext;

/// Resolve every pair and border contact owned by `worker`
///
/// Returns the number of body-body collisions this worker resolved.
pub fn resolve_partition(ctx: &SimContext<'_>, worker: usize) -> Result<usize> {
    let n = ctx.bodies.len();
    let params = ctx.params;
    let mut collisions = 0;

    for i in ctx.owned(worker, n) {
        // rows 0..i have all passed body i
        ctx.wait_turn(i, i)?;

        for j in (i + 1)..n {
            ctx.wait_turn(j, i)?;
            {
                let mut bi = ctx.bodies[i].lock();
                let mut bj = ctx.bodies[j].lock();
                if collide_pair(&mut bi, i, &mut bj, j, params) {
                    collisions += 1;
                }
            }
            ctx.pass_turn(j, i + 1);
        }

        {
            let mut bi = ctx.bodies[i].lock();
            if params.border.enabled {
                reflect_off_border(&mut bi, params.border.size);
            }
            bi.rotate_collision_window();

            if !bi.is_finite() {
                ctx.flag_divergence(i);
            }
        }
        // no later row touches i, reset it for the next tick
        ctx.pass_turn(i, 0);
    }

    Ok(collisions)
}

/// Test and resolve one pair, `b1` being the lower index
///
/// Returns true if the pair collided this tick.
pub fn collide_pair(
    b1: &mut Body,
    i: BodyId,
    b2: &mut Body,
    j: BodyId,
    params: &Parameters,
) -> bool {
    if b1.collided_last_tick(j) {
        return false;
    }

    let reach = b1.radius + b2.radius;
    let distance = (b2.x - b1.x).norm();
    // also rejects NaN distances
    if !(distance < reach) {
        return false;
    }

    let overlap = reach - distance;
    if overlap > params.overlap_tolerance {
        rewind(b1, b2, params.dt, params.overlap_tolerance / overlap);
    }

    b1.add_recent_collision(j);

    match elastic_velocities(b1.x, b1.v, b1.m, b2.x, b2.v, b2.m) {
        Some((v1, v2)) => {
            b1.set_velocity(v1);
            b2.set_velocity(v2);
        }
        None => warn!("bodies {i} and {j} share a centre, no line of contact"),
    }
    true
}

/// Back both bodies off to `fraction` of the last step
///
/// Velocities are rebuilt from the pre-step velocity plus the share of the last
/// applied force, positions from the pre-step position.
pub fn rewind(b1: &mut Body, b2: &mut Body, dt: f64, fraction: f64) {
    for b in [b1, b2] {
        let dv = b.last_force / b.m;
        b.change_old_velocity_by(dv, dt * fraction);
        b.advance_fraction(dt, fraction);
    }
}

/// Post-collision velocities of two bodies in a 2D elastic collision
///
/// The components along the line of centres follow the 1D elastic equations,
/// the perpendicular components are unchanged. `None` if the centres coincide.
pub fn elastic_velocities(
    x1: NVec2,
    v1: NVec2,
    m1: f64,
    x2: NVec2,
    v2: NVec2,
    m2: f64,
) -> Option<(NVec2, NVec2)> {
    let r = x2 - x1;
    let distance = r.norm();
    if distance == 0.0 || !distance.is_finite() {
        return None;
    }
    let n = r / distance;

    // along-axis speeds before and after
    let u1 = v1.dot(&n);
    let u2 = v2.dot(&n);
    let total = m1 + m2;
    let w1 = ((m1 - m2) * u1 + 2.0 * m2 * u2) / total;
    let w2 = ((m2 - m1) * u2 + 2.0 * m1 * u1) / total;

    Some((v1 + (w1 - u1) * n, v2 + (w2 - u2) * n))
}

/// Reflect the velocity component perpendicular to any border edge the body touches
///
/// A body touches an edge when its centre is within one radius of it and it is
/// moving toward it. An edge hit on the previous tick is not processed again.
/// Returns true if any component was reflected.
pub fn reflect_off_border(b: &mut Body, size: f64) -> bool {
    let mut hit = false;

    if !b.hit_wall_x_last_tick() {
        let low = b.x.x <= b.radius && b.v.x < 0.0;
        let high = b.x.x >= size - b.radius && b.v.x > 0.0;
        if low || high {
            b.set_velocity(NVec2::new(-b.v.x, b.v.y));
            b.mark_wall_x();
            hit = true;
        }
    }

    if !b.hit_wall_y_last_tick() {
        let low = b.x.y <= b.radius && b.v.y < 0.0;
        let high = b.x.y >= size - b.radius && b.v.y > 0.0;
        if low || high {
            b.set_velocity(NVec2::new(b.v.x, -b.v.y));
            b.mark_wall_y();
            hit = true;
        }
    }

    hit
}
