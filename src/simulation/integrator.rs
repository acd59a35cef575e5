//! Fixed-step integration for the bodies a worker owns
//!
//! Runs after the force barrier: reduces every worker's partial force buffer
//! into the net force on each owned body, kicks its velocity, then moves it.

use parking_lot::RwLockReadGuard;

use crate::simulation::states::NVec2;
use crate::simulation::worker::SimContext;

/// Integrate every body owned by `worker` over one step
///
/// For owned `i`: `F_i = sum of partials[w][i]`, `v_i += F_i / m_i * dt`,
/// `x_i += v_i * dt`. Non-finite results are flagged on the context.
pub fn integrate_partition(ctx: &SimContext<'_>, worker: usize) {
    let n = ctx.bodies.len();
    let dt = ctx.params.dt;

    // Read-only in this phase, the owners wrote them before the barrier
    let partials: Vec<RwLockReadGuard<'_, Vec<NVec2>>> =
        ctx.partials.iter().map(|p| p.read()).collect();

    for i in ctx.owned(worker, n) {
        let force = partials
            .iter()
            .fold(NVec2::zeros(), |acc, p| acc + p[i]);

        let mut body = ctx.bodies[i].lock();
        body.record_force(force);
        let dv = force / body.m;
        body.change_velocity_by(dv, dt);
        body.advance(dt);

        if !body.is_finite() {
            ctx.flag_divergence(i);
        }
    }
}
