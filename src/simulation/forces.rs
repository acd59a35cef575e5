//! Gravitational force kernel
//!
//! Exact pairwise Newtonian gravity, partitioned across workers by stride:
//! worker `w` owns every primary index `i` with `i mod W == w` and pairs it with
//! every `j > i`. Contributions go into the worker's own partial buffer; the
//! integrator sums all buffers for an index after the phase barrier, so no two
//! workers ever write the same force slot.

use log::warn;

use crate::simulation::states::NVec2;
use crate::simulation::worker::SimContext;

/// Force exerted on body `i` by body `j`
///
/// Returns `None` when the two centres coincide and the force is undefined.
#[allow(non_snake_case)]
pub fn pairwise_force(G: f64, xi: NVec2, mi: f64, xj: NVec2, mj: f64) -> Option<NVec2> {
    // r points from i to j, i is pulled along +r
    let r = xj - xi;
    let distance = r.norm();
    if distance == 0.0 || !distance.is_finite() {
        return None;
    }

    // |F| = G * mi * mj / d^2, direction r / d
    let magnitude = G * mi * mj / (distance * distance);
    Some((magnitude / distance) * r)
}

/// Accumulate the forces of every pair owned by `worker` into `out`
///
/// `out` is zeroed first; it must have one slot per body.
pub fn accumulate_partition(ctx: &SimContext<'_>, worker: usize, out: &mut [NVec2]) {
    out.fill(NVec2::zeros());

    let n = ctx.bodies.len();
    if n < 2 {
        return;
    }

    // Positions and masses are read-only in this phase
    let snapshot: Vec<(NVec2, f64)> = ctx
        .bodies
        .iter()
        .map(|b| {
            let b = b.lock();
            (b.x, b.m)
        })
        .collect();

    for i in ctx.owned(worker, n - 1) {
        let (xi, mi) = snapshot[i];
        for j in (i + 1)..n {
            let (xj, mj) = snapshot[j];
            match pairwise_force(ctx.params.G, xi, mi, xj, mj) {
                Some(f) => {
                    // equal and opposite
                    out[i] += f;
                    out[j] -= f;
                }
                None => warn!("bodies {i} and {j} share a centre, skipping pair this tick"),
            }
        }
    }
}
