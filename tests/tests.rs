use std::io;
use std::sync::{Arc, Mutex};

use pcsim::simulation::collisions::{collide_pair, elastic_velocities, reflect_off_border};
use pcsim::simulation::forces::pairwise_force;
use pcsim::visualization::snapshot::write_bodies_to;
use pcsim::{
    BarrierStrategy, Body, Border, Circle, Engine, NVec2, Parameters, RenderSink,
    RendezvousBarrier, Scenario, ScenarioConfig, SimError, Simulation, SvgFrames,
};

const G: f64 = 0.0667;

/// Build a body from plain arrays
pub fn body(m: f64, radius: f64, x: [f64; 2], v: [f64; 2]) -> Body {
    Body::new(m, radius, NVec2::new(x[0], x[1]), NVec2::new(v[0], v[1]))
}

/// Default physics parameters for tests
pub fn test_params(timesteps: u64) -> Parameters {
    Parameters {
        G,
        dt: 0.1,
        timesteps,
        overlap_tolerance: 15.0,
        border: Border { enabled: false, size: 0.0 },
    }
}

/// Wrap bodies into a scenario for `workers` workers
pub fn scenario(
    workers: usize,
    barrier: BarrierStrategy,
    parameters: Parameters,
    bodies: Vec<Body>,
) -> Scenario {
    Scenario {
        engine: Engine {
            workers,
            barrier,
            timing: true,
            rendering: false,
            render_every: 1,
        },
        parameters,
        bodies,
    }
}

/// Validated simulation over `bodies`
pub fn start(
    workers: usize,
    barrier: BarrierStrategy,
    parameters: Parameters,
    bodies: Vec<Body>,
) -> Simulation {
    Simulation::new(scenario(workers, barrier, parameters, bodies)).unwrap()
}

/// Scenario built from an inline YAML document
pub fn parse_scenario(yaml: &str) -> Scenario {
    Scenario::build_scenario(ScenarioConfig::from_reader(yaml.as_bytes()).unwrap()).unwrap()
}

/// Shipped scenario from `scenarios/`
pub fn shipped_scenario(name: &str) -> Scenario {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(name);
    Scenario::build_scenario(ScenarioConfig::from_path(path).unwrap()).unwrap()
}

/// The two touching bodies on a head-on course
pub fn head_on_pair() -> Vec<Body> {
    vec![
        body(10.0, 30.0, [120.0, 200.0], [-1.0, 0.0]),
        body(10.0, 30.0, [60.0, 200.0], [1.0, 0.0]),
    ]
}

/// Four head-on pairs, far enough apart that pairs never meet
pub fn four_pairs() -> Vec<Body> {
    (0..4)
        .flat_map(|k| {
            let y = 1000.0 * k as f64;
            vec![
                body(10.0, 30.0, [120.0, y], [-1.0, 0.0]),
                body(10.0, 30.0, [60.0, y], [1.0, 0.0]),
            ]
        })
        .collect()
}

fn close(a: NVec2, b: NVec2, tol: f64) -> bool {
    (a - b).norm() < tol
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn gravity_newton_third_law() {
    let a = NVec2::new(-0.5, 0.0);
    let b = NVec2::new(0.5, 0.0);
    let on_a = pairwise_force(G, a, 2.0, b, 3.0).unwrap();
    let on_b = pairwise_force(G, b, 3.0, a, 2.0).unwrap();

    let net = on_a + on_b;
    assert!(net.norm() < 1e-12, "Net force not zero: {:?}", net);
}

#[test]
fn gravity_points_toward_other_body() {
    let a = NVec2::new(0.0, 0.0);
    let b = NVec2::new(3.0, 4.0);
    let f = pairwise_force(G, a, 1.0, b, 1.0).unwrap();

    assert!(f.dot(&(b - a)) > 0.0, "Force is not toward second body");
    assert!((f.norm() - G / 25.0).abs() < 1e-12);
}

#[test]
fn gravity_inverse_square_law() {
    let origin = NVec2::zeros();
    let f_r = pairwise_force(G, origin, 1.0, NVec2::new(1.0, 0.0), 1.0).unwrap();
    let f_2r = pairwise_force(G, origin, 1.0, NVec2::new(2.0, 0.0), 1.0).unwrap();

    let ratio = f_r.norm() / f_2r.norm();
    assert!((ratio - 4.0).abs() < 1e-9, "Expected 4x, got {}", ratio);
}

#[test]
fn gravity_coincident_bodies_have_no_force() {
    let x = NVec2::new(5.0, 5.0);
    assert!(pairwise_force(G, x, 1.0, x, 1.0).is_none());
}

#[test]
fn coincident_bodies_stay_finite() {
    let bodies = vec![
        body(10.0, 5.0, [50.0, 50.0], [0.0, 0.0]),
        body(10.0, 5.0, [50.0, 50.0], [0.0, 0.0]),
    ];
    let mut sim = start(1, BarrierStrategy::Rendezvous, test_params(3), bodies);
    sim.run_to_completion().unwrap();

    for b in sim.bodies() {
        assert!(b.x.iter().chain(b.v.iter()).all(|c| c.is_finite()), "Non-finite body {:?}", b);
    }
}

#[test]
fn partitioned_forces_match_single_worker() {
    // spread out so nothing collides, only gravity acts
    let bodies: Vec<Body> = (0..7)
        .map(|i| {
            let i_f = i as f64;
            let x = [(i_f * 0.37).sin() * 500.0, (i_f * 0.13).cos() * 500.0];
            body(1000.0 + 100.0 * i_f, 1.0, x, [0.0, 0.0])
        })
        .collect();

    let mut serial = start(1, BarrierStrategy::Rendezvous, test_params(20), bodies.clone());
    let mut parallel = start(3, BarrierStrategy::Dissemination, test_params(20), bodies);
    serial.run_to_completion().unwrap();
    parallel.run_to_completion().unwrap();

    for (a, b) in serial.bodies().iter().zip(parallel.bodies().iter()) {
        assert!(close(a.x, b.x, 1e-9), "{:?} vs {:?}", a.x, b.x);
        assert!(close(a.v, b.v, 1e-9), "{:?} vs {:?}", a.v, b.v);
    }
    assert_eq!(serial.collision_count(), 0);
}

#[test]
fn net_momentum_is_conserved_by_gravity() {
    let bodies = vec![
        body(500.0, 1.0, [0.0, 0.0], [0.0, 0.0]),
        body(300.0, 1.0, [100.0, 0.0], [0.0, 1.0]),
        body(200.0, 1.0, [0.0, 150.0], [1.0, 0.0]),
    ];
    let before: NVec2 = bodies.iter().fold(NVec2::zeros(), |p, b| p + b.m * b.v);

    let mut sim = start(2, BarrierStrategy::Dissemination, test_params(50), bodies);
    sim.run_to_completion().unwrap();

    let after: NVec2 = sim.bodies().iter().fold(NVec2::zeros(), |p, b| p + b.m * b.v);
    assert!(close(before, after, 1e-9), "{:?} vs {:?}", before, after);
}

// ==================================================================================
// Body / motion tests
// ==================================================================================

#[test]
fn body_without_velocity_does_not_move() {
    let mut b = body(1.0, 1.0, [3.0, 4.0], [0.0, 0.0]);
    b.advance(0.1);
    assert_eq!(b.x, NVec2::new(3.0, 4.0));
}

#[test]
fn body_moves_by_velocity_times_dt() {
    let mut b = body(1.0, 1.0, [0.0, 0.0], [-10.0, 10.0]);
    b.advance(0.5);
    assert!(close(b.x, NVec2::new(-5.0, 5.0), 1e-12));
    assert_eq!(b.x_old, NVec2::zeros());
}

#[test]
fn fractional_move_starts_from_snapshot() {
    let mut b = body(1.0, 1.0, [0.0, 0.0], [4.0, 0.0]);
    b.advance(1.0);
    b.advance_fraction(1.0, 0.25);
    assert!(close(b.x, NVec2::new(1.0, 0.0), 1e-12));
}

#[test]
fn collision_window_rotates() {
    let mut b = body(1.0, 1.0, [0.0, 0.0], [0.0, 0.0]);
    b.add_recent_collision(3);
    assert!(!b.collided_last_tick(3));
    b.rotate_collision_window();
    assert!(b.collided_last_tick(3));
    b.rotate_collision_window();
    assert!(!b.collided_last_tick(3));
}

// ==================================================================================
// Collision tests
// ==================================================================================

#[test]
fn equal_masses_exchange_velocities() {
    let (v1, v2) = elastic_velocities(
        NVec2::new(0.0, 0.0),
        NVec2::new(1.0, 0.0),
        10.0,
        NVec2::new(50.0, 0.0),
        NVec2::new(-1.0, 0.0),
        10.0,
    )
    .unwrap();

    assert!(close(v1, NVec2::new(-1.0, 0.0), 1e-12), "{:?}", v1);
    assert!(close(v2, NVec2::new(1.0, 0.0), 1e-12), "{:?}", v2);
}

#[test]
fn perpendicular_component_is_kept() {
    let (v1, v2) = elastic_velocities(
        NVec2::new(0.0, 0.0),
        NVec2::new(1.0, 1.0),
        2.0,
        NVec2::new(10.0, 0.0),
        NVec2::new(0.0, 0.0),
        2.0,
    )
    .unwrap();

    assert!(close(v1, NVec2::new(0.0, 1.0), 1e-12), "{:?}", v1);
    assert!(close(v2, NVec2::new(1.0, 0.0), 1e-12), "{:?}", v2);
}

#[test]
fn unequal_masses_conserve_momentum_and_energy() {
    let (m1, m2) = (3.0, 7.0);
    let (v1, v2) = (NVec2::new(2.0, -1.0), NVec2::new(-0.5, 0.25));
    let (w1, w2) =
        elastic_velocities(NVec2::new(0.0, 0.0), v1, m1, NVec2::new(4.0, 3.0), v2, m2).unwrap();

    let p_before = m1 * v1 + m2 * v2;
    let p_after = m1 * w1 + m2 * w2;
    assert!(close(p_before, p_after, 1e-12));

    let e_before = 0.5 * m1 * v1.norm_squared() + 0.5 * m2 * v2.norm_squared();
    let e_after = 0.5 * m1 * w1.norm_squared() + 0.5 * m2 * w2.norm_squared();
    assert!((e_before - e_after).abs() < 1e-12);
}

#[test]
fn rewind_leaves_overlap_within_tolerance() {
    let params = Parameters {
        G: 0.0,
        dt: 1.0,
        timesteps: 1,
        overlap_tolerance: 2.0,
        border: Border { enabled: false, size: 0.0 },
    };
    let mut b1 = body(1.0, 10.0, [0.0, 0.0], [10.0, 0.0]);
    let mut b2 = body(1.0, 10.0, [25.0, 0.0], [-10.0, 0.0]);
    b1.advance(params.dt);
    b2.advance(params.dt);
    // 15 deep after the step
    assert!((b2.x - b1.x).norm() < 20.0 - params.overlap_tolerance);

    assert!(collide_pair(&mut b1, 0, &mut b2, 1, &params));

    let overlap = 20.0 - (b2.x - b1.x).norm();
    assert!(overlap <= params.overlap_tolerance + 1e-9, "overlap {} after rewind", overlap);
    assert!(close(b1.v, NVec2::new(-10.0, 0.0), 1e-12));
    assert!(close(b2.v, NVec2::new(10.0, 0.0), 1e-12));
}

#[test]
fn pair_is_not_resolved_twice_in_a_row() {
    let params = test_params(1);
    let mut b1 = body(1.0, 10.0, [0.0, 0.0], [1.0, 0.0]);
    let mut b2 = body(1.0, 10.0, [15.0, 0.0], [-1.0, 0.0]);

    assert!(collide_pair(&mut b1, 0, &mut b2, 1, &params));
    b1.rotate_collision_window();
    assert!(!collide_pair(&mut b1, 0, &mut b2, 1, &params));
    b1.rotate_collision_window();
    assert!(collide_pair(&mut b1, 0, &mut b2, 1, &params));
}

#[test]
fn border_reflects_perpendicular_component() {
    let mut b = body(1.0, 5.0, [-2.0, 50.0], [-3.0, 4.0]);
    assert!(reflect_off_border(&mut b, 100.0));
    assert_eq!(b.v, NVec2::new(3.0, 4.0));

    let mut b = body(1.0, 5.0, [50.0, 97.0], [1.0, 2.0]);
    assert!(reflect_off_border(&mut b, 100.0));
    assert_eq!(b.v, NVec2::new(1.0, -2.0));
}

#[test]
fn border_contact_has_one_tick_cooldown() {
    let mut b = body(1.0, 5.0, [2.0, 50.0], [-3.0, 0.0]);
    assert!(reflect_off_border(&mut b, 100.0));
    b.rotate_collision_window();

    b.set_velocity(NVec2::new(-3.0, 0.0));
    assert!(!reflect_off_border(&mut b, 100.0));
    assert_eq!(b.v, NVec2::new(-3.0, 0.0));
}

#[test]
fn body_inside_border_is_untouched() {
    let mut b = body(1.0, 5.0, [50.0, 50.0], [-3.0, 4.0]);
    assert!(!reflect_off_border(&mut b, 100.0));
    assert_eq!(b.v, NVec2::new(-3.0, 4.0));
}

// ==================================================================================
// End-to-end scenarios
// ==================================================================================

#[test]
fn head_on_pair_bounces_apart() {
    let mut sim = start(2, BarrierStrategy::Dissemination, test_params(10), head_on_pair());
    sim.run_to_completion().unwrap();

    let bodies = sim.bodies();
    assert!(bodies[0].v.x > 0.0, "body 0 still moving left: {:?}", bodies[0].v);
    assert!(bodies[1].v.x < 0.0, "body 1 still moving right: {:?}", bodies[1].v);
    assert!((bodies[0].v.x - 1.0).abs() < 1e-3);
    assert!(bodies[0].v.y.abs() < 1e-12);
    assert!(bodies[0].x.x > 120.0);
    assert_eq!(sim.collision_count(), 1);
}

#[test]
fn lone_body_stays_put() {
    let bodies = vec![body(42.0, 3.0, [10.0, 20.0], [0.0, 0.0])];
    let mut sim = start(2, BarrierStrategy::Dissemination, test_params(250), bodies);
    sim.run_to_completion().unwrap();

    assert_eq!(sim.bodies()[0].x, NVec2::new(10.0, 20.0));
    assert_eq!(sim.collision_count(), 0);
}

#[test]
fn separate_pairs_collide_once_each() {
    let mut sim = start(4, BarrierStrategy::Dissemination, test_params(60), four_pairs());
    sim.run_to_completion().unwrap();

    assert_eq!(sim.collision_count(), 4);
    for pair in sim.bodies().chunks(2) {
        assert!(pair[0].v.x > 0.0 && pair[1].v.x < 0.0);
    }
}

/// Run a shipped scenario on `workers` workers with `barrier` for `ticks` ticks
fn run_shipped(name: &str, workers: usize, barrier: BarrierStrategy, ticks: u64) -> Simulation {
    let mut s = shipped_scenario(name);
    s.engine.workers = workers;
    s.engine.barrier = barrier;
    s.engine.rendering = false;
    s.parameters.timesteps = ticks;

    let mut sim = Simulation::new(s).unwrap();
    sim.run_to_completion().unwrap();
    sim
}

#[test]
fn barrier_strategy_does_not_change_outcome() {
    // mixed sizes in a box: bodies share partners and hit the border
    let diss = run_shipped("ten_bodies.yaml", 4, BarrierStrategy::Dissemination, 400);
    let rend = run_shipped("ten_bodies.yaml", 4, BarrierStrategy::Rendezvous, 400);
    let again = run_shipped("ten_bodies.yaml", 4, BarrierStrategy::Dissemination, 400);

    assert!(diss.collision_count() > 0);
    assert_eq!(diss.collision_count(), rend.collision_count());
    assert_eq!(diss.bodies(), rend.bodies());
    assert_eq!(diss.bodies(), again.bodies());
}

/// Two bodies apart from each other, both overlapping a third
fn shared_partner() -> Vec<Body> {
    vec![
        body(2.0, 10.0, [-15.0, 0.0], [1.0, 0.5]),
        body(3.0, 10.0, [0.0, 15.0], [0.5, -1.0]),
        body(5.0, 10.0, [0.0, 0.0], [-0.5, 1.0]),
    ]
}

#[test]
fn shared_partner_resolves_in_row_order() {
    let mut params = test_params(1);
    params.G = 0.0;
    params.overlap_tolerance = 2.0;

    let mut serial = start(1, BarrierStrategy::Rendezvous, params.clone(), shared_partner());
    serial.run_to_completion().unwrap();
    assert_eq!(serial.collision_count(), 2);
    let expected = serial.bodies();

    for round in 0..200 {
        let barrier = if round % 2 == 0 {
            BarrierStrategy::Rendezvous
        } else {
            BarrierStrategy::Dissemination
        };
        let mut sim = start(2, barrier, params.clone(), shared_partner());
        sim.run_to_completion().unwrap();

        assert_eq!(sim.collision_count(), 2);
        assert_eq!(sim.bodies(), expected, "round {round} diverged from the serial order");
    }
}

#[test]
fn empty_scenario_runs() {
    let mut sim = start(3, BarrierStrategy::Dissemination, test_params(5), Vec::new());
    let report = sim.run_to_completion().unwrap();
    assert_eq!(report.collisions(), 0);
    assert!(sim.bodies().is_empty());
}

#[test]
fn second_run_continues() {
    let bodies = vec![body(1.0, 1.0, [0.0, 0.0], [1.0, 0.0])];
    let mut sim = start(1, BarrierStrategy::Rendezvous, test_params(10), bodies);
    sim.run_to_completion().unwrap();
    sim.run_to_completion().unwrap();

    assert_eq!(sim.ticks_done(), 20);
    assert!((sim.bodies()[0].x.x - 2.0).abs() < 1e-9);
}

#[test]
fn more_workers_than_bodies() {
    let mut sim = start(8, BarrierStrategy::Dissemination, test_params(10), head_on_pair());
    sim.run_to_completion().unwrap();
    assert_eq!(sim.collision_count(), 1);
}

// ==================================================================================
// Engine bookkeeping and errors
// ==================================================================================

#[test]
fn barrier_stats_cover_every_worker() {
    let mut sim = start(4, BarrierStrategy::Rendezvous, test_params(30), four_pairs());
    assert!(sim.barrier_stats().is_none());
    let report = sim.run_to_completion().unwrap();

    assert_eq!(report.workers.len(), 4);
    assert!(report.workers.iter().all(|w| w.barrier_calls == 90));

    let stats = sim.barrier_stats().unwrap();
    assert_eq!(stats.per_worker.len(), 4);
    assert_eq!(stats.average, stats.total / 4);
}

#[test]
fn timing_off_records_no_wait() {
    let mut s = scenario(2, BarrierStrategy::Dissemination, test_params(10), head_on_pair());
    s.engine.timing = false;
    let mut sim = Simulation::new(s).unwrap();
    sim.run_to_completion().unwrap();

    assert!(sim.barrier_stats().unwrap().per_worker.iter().all(|d| d.is_zero()));
}

#[test]
fn barrier_size_must_match_workers() {
    let s = scenario(4, BarrierStrategy::Rendezvous, test_params(1), head_on_pair());
    match Simulation::with_barrier(s, Box::new(RendezvousBarrier::new(3))) {
        Err(SimError::BarrierMismatch { barrier: 3, workers: 4 }) => {}
        other => panic!("expected a barrier mismatch, got {:?}", other.err()),
    }
}

#[test]
fn zero_workers_is_rejected() {
    let s = scenario(0, BarrierStrategy::Dissemination, test_params(1), head_on_pair());
    assert!(matches!(Simulation::new(s), Err(SimError::InvalidConfiguration(_))));
}

#[test]
fn non_positive_mass_is_rejected() {
    let bodies = vec![body(0.0, 1.0, [0.0, 0.0], [0.0, 0.0])];
    let s = scenario(1, BarrierStrategy::Dissemination, test_params(1), bodies);
    assert!(matches!(Simulation::new(s), Err(SimError::InvalidConfiguration(_))));
}

#[test]
fn runaway_state_aborts_the_run() {
    let mut params = test_params(5);
    params.G = 1e308;
    let bodies = vec![
        body(10.0, 0.1, [0.0, 0.0], [0.0, 0.0]),
        body(10.0, 0.1, [1.0, 0.0], [0.0, 0.0]),
    ];
    let mut sim = start(2, BarrierStrategy::Dissemination, params, bodies);

    match sim.run_to_completion() {
        Err(SimError::Diverged { tick: 0, .. }) => {}
        other => panic!("expected divergence at tick 0, got {:?}", other.map(|r| r.ticks)),
    }
}

// ==================================================================================
// Sinks
// ==================================================================================

/// Render sink that remembers which ticks it saw
struct RecordingSink {
    frames: Arc<Mutex<Vec<(u64, usize)>>>,
}

impl RenderSink for RecordingSink {
    fn draw(&mut self, tick: u64, circles: &[Circle]) -> io::Result<()> {
        self.frames.lock().unwrap().push((tick, circles.len()));
        Ok(())
    }
}

#[test]
fn render_sink_receives_throttled_frames() {
    let mut s = scenario(2, BarrierStrategy::Dissemination, test_params(6), head_on_pair());
    s.engine.rendering = true;
    s.engine.render_every = 2;

    let frames = Arc::new(Mutex::new(Vec::new()));
    let mut sim = Simulation::new(s).unwrap();
    sim.set_renderer(Box::new(RecordingSink { frames: frames.clone() }));
    sim.run_to_completion().unwrap();

    assert_eq!(*frames.lock().unwrap(), vec![(0, 2), (2, 2), (4, 2)]);
}

/// Render sink that dies on its first frame
struct PanickingSink;

impl RenderSink for PanickingSink {
    fn draw(&mut self, _tick: u64, _circles: &[Circle]) -> io::Result<()> {
        panic!("sink gave up");
    }
}

#[test]
fn panicking_worker_fails_the_run() {
    for (workers, barrier) in [
        (2, BarrierStrategy::Dissemination),
        (3, BarrierStrategy::Rendezvous),
        (5, BarrierStrategy::Dissemination),
    ] {
        let mut s = scenario(workers, barrier, test_params(10), four_pairs());
        s.engine.rendering = true;
        let mut sim = Simulation::new(s).unwrap();
        sim.set_renderer(Box::new(PanickingSink));

        match sim.run_to_completion() {
            Err(SimError::WorkerPanicked(0)) => {}
            other => panic!("expected worker 0 to be reported, got {:?}", other.err()),
        }
        // the barrier stays broken
        assert!(matches!(sim.run_to_completion(), Err(SimError::BarrierBroken)));
    }
}

#[test]
fn svg_frames_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = SvgFrames::new(dir.path().join("frames"), 600.0).unwrap();
    let circles = [Circle { center: NVec2::new(100.0, 200.0), radius: 30.0 }];
    sink.draw(7, &circles).unwrap();

    let svg = std::fs::read_to_string(dir.path().join("frames").join("frame_000007.svg")).unwrap();
    assert!(svg.contains(r#"<circle cx="100.000" cy="200.000" r="30.000""#));
    assert_eq!(sink.frames_written(), 1);
}

#[test]
fn snapshot_lines_match_dump_format() {
    let states: Vec<_> = head_on_pair().iter().map(Body::state).collect();
    let mut out = Vec::new();
    write_bodies_to(&mut out, &states).unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Body Pos(    120.000,     200.000)\t\tVel[     -1.000,       0.000]");
}

#[test]
fn snapshot_file_round_trips_line_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("StartingBodies.txt");
    let states: Vec<_> = four_pairs().iter().map(Body::state).collect();
    pcsim::write_bodies(&path, &states).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 8);
}

// ==================================================================================
// Configuration
// ==================================================================================

const HEAD_ON_YAML: &str = r#"
engine:
  workers: 2
  barrier: "rendezvous"

parameters:
  timesteps: 10

bodies:
  - x: [ 120.0, 200.0 ]
    v: [  -1.0,   0.0 ]
    m: 10.0
    radius: 30.0
  - x: [  60.0, 200.0 ]
    v: [   1.0,   0.0 ]
    m: 10.0
    radius: 20.0
"#;

#[test]
fn yaml_scenario_fills_defaults() {
    let cfg = ScenarioConfig::from_reader(HEAD_ON_YAML.as_bytes()).unwrap();
    let s = Scenario::build_scenario(cfg).unwrap();

    assert_eq!(s.engine.workers, 2);
    assert_eq!(s.engine.barrier, BarrierStrategy::Rendezvous);
    assert!(!s.engine.timing);
    assert_eq!(s.parameters.G, 0.0667);
    assert_eq!(s.parameters.dt, 0.1);
    assert_eq!(s.parameters.overlap_tolerance, 10.0);
    assert!(!s.parameters.border.enabled);
    assert_eq!(s.bodies.len(), 2);
}

#[test]
fn random_bodies_stay_inside_border() {
    let yaml = r#"
engine: { workers: 1 }
parameters:
  timesteps: 1
  border: { enabled: true }
random: { count: 50, radius: 2.0, seed: 3 }
"#;
    let s = parse_scenario(yaml);

    assert_eq!(s.parameters.border.size, 200.0);
    assert_eq!(s.bodies.len(), 50);
    for b in &s.bodies {
        assert_eq!(b.m, 8.0);
        assert!(b.x.x >= 2.0 && b.x.x < 198.0 && b.x.y >= 2.0 && b.x.y < 198.0);
        assert!(b.v.x >= -8.0 && b.v.x < 8.0);
    }
}

#[test]
fn varied_bodies_use_cubed_radius() {
    let yaml = r#"
engine: { workers: 1 }
parameters: { timesteps: 1 }
random: { count: 10, varied: true, zero_velocity: true, seed: 9 }
"#;
    let s = parse_scenario(yaml);

    assert_eq!(s.parameters.border.size, 1000.0);
    for b in &s.bodies {
        assert!(b.radius >= 2.0 && b.radius < 50.0);
        assert!((b.m - b.radius.powi(3)).abs() < 1e-9);
        assert_eq!(b.v, NVec2::zeros());
    }
}

#[test]
fn seeded_scenarios_are_reproducible() {
    let yaml = r#"
engine: { workers: 1 }
parameters: { timesteps: 1 }
random: { count: 5, radius: 1.0, seed: 11 }
"#;
    let a = parse_scenario(yaml);
    let b = parse_scenario(yaml);
    for (x, y) in a.bodies.iter().zip(b.bodies.iter()) {
        assert_eq!(x.x, y.x);
        assert_eq!(x.v, y.v);
    }
}

#[test]
fn enabled_border_without_size_needs_random_bodies() {
    let yaml = r#"
engine: { workers: 1 }
parameters:
  timesteps: 1
  border: { enabled: true }
bodies:
  - { x: [ 1.0, 1.0 ], v: [ 0.0, 0.0 ], m: 1.0, radius: 1.0 }
"#;
    let cfg = ScenarioConfig::from_reader(yaml.as_bytes()).unwrap();
    assert!(matches!(Scenario::build_scenario(cfg), Err(SimError::InvalidConfiguration(_))));
}

#[test]
fn body_needs_two_components() {
    let yaml = r#"
engine: { workers: 1 }
parameters: { timesteps: 1 }
bodies:
  - { x: [ 1.0, 1.0, 1.0 ], v: [ 0.0, 0.0 ], m: 1.0, radius: 1.0 }
"#;
    let cfg = ScenarioConfig::from_reader(yaml.as_bytes()).unwrap();
    assert!(matches!(Scenario::build_scenario(cfg), Err(SimError::InvalidConfiguration(_))));
}

#[test]
fn shipped_scenarios_parse() {
    let names = [
        "head_on.yaml",
        "four_in_line.yaml",
        "ten_bodies.yaml",
        "random_border.yaml",
        "varied.yaml",
    ];
    for name in names {
        shipped_scenario(name);
    }
}
