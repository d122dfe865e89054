//! The simulation loop.
//!
//! A [`Simulation`] owns a set of [`Body`]s and a list of forces. Each
//! [`tick`](ForceSimulation::tick) cools alpha, lets every force adjust
//! velocities (or positions), then integrates with velocity decay. Bodies
//! with a fixed position are reset to it after integration.

use std::f64::consts::PI;

use super::forces::Force;

const INITIAL_RADIUS: f64 = 10.0;

/// A point mass in the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Position x.
    pub x: f64,
    /// Position y.
    pub y: f64,
    /// Velocity x.
    pub vx: f64,
    /// Velocity y.
    pub vy: f64,
    /// Fixed x, if pinned.
    pub fx: Option<f64>,
    /// Fixed y, if pinned.
    pub fy: Option<f64>,
    /// Collision radius.
    pub radius: f64,
}

impl Body {
    /// A body at rest at the given position.
    pub fn at(x: f64, y: f64, radius: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            fx: None,
            fy: None,
            radius,
        }
    }

    /// Fix the body at `(x, y)`.
    pub fn pin(&mut self, x: f64, y: f64) {
        self.fx = Some(x);
        self.fy = Some(y);
        self.x = x;
        self.y = y;
    }

    /// Whether the body has a fixed position.
    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}

/// Phyllotaxis placement for the `i`-th body without a position.
///
/// Spreads bodies evenly on a spiral around `(cx, cy)` so no two start
/// coincident.
pub fn phyllotaxis(i: usize, cx: f64, cy: f64) -> (f64, f64) {
    let angle_step = PI * (3.0 - 5f64.sqrt());
    let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
    let angle = i as f64 * angle_step;
    (cx + radius * angle.cos(), cy + radius * angle.sin())
}

/// Deterministic linear congruential generator.
///
/// Used wherever the forces need to break symmetry, so layouts are
/// reproducible.
#[derive(Clone, Debug)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    /// Generator with the standard seed.
    pub fn new() -> Self {
        Self::with_seed(1)
    }

    /// Generator with a custom seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: seed % Self::M,
        }
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (Self::A * self.state + Self::C) % Self::M;
        self.state as f64 / Self::M as f64
    }

    /// A tiny random offset used to separate coincident points.
    pub fn jiggle(&mut self) -> f64 {
        (self.next_f64() - 0.5) * 1e-6
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new()
    }
}

/// A tickable force simulation with pluggable forces.
pub trait ForceSimulation {
    /// Register a force. Forces apply in registration order.
    fn add_force(&mut self, force: Box<dyn Force>);

    /// Advance the simulation by one step.
    fn tick(&mut self);

    /// Current alpha.
    fn alpha(&self) -> f64;

    /// Current bodies.
    fn bodies(&self) -> &[Body];

    /// Run `ticks` steps.
    fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }
}

/// Semi-implicit Euler integration with alpha cooling.
pub struct Simulation {
    bodies: Vec<Body>,
    forces: Vec<Box<dyn Force>>,
    alpha: f64,
    alpha_target: f64,
    alpha_decay: f64,
    velocity_retain: f64,
    random: Lcg,
}

impl Simulation {
    /// Create a simulation over `bodies`.
    ///
    /// `velocity_decay` is the fraction of velocity lost per tick.
    pub fn new(bodies: Vec<Body>, alpha_decay: f64, velocity_decay: f64) -> Self {
        Self {
            bodies,
            forces: Vec::new(),
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_decay,
            velocity_retain: 1.0 - velocity_decay,
            random: Lcg::new(),
        }
    }

    /// Consume the simulation, returning the final bodies.
    pub fn into_bodies(self) -> Vec<Body> {
        self.bodies
    }
}

impl ForceSimulation for Simulation {
    fn add_force(&mut self, force: Box<dyn Force>) {
        self.forces.push(force);
    }

    fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        for force in &mut self.forces {
            force.apply(&mut self.bodies, self.alpha, &mut self.random);
        }

        for body in &mut self.bodies {
            match body.fx {
                Some(fx) => {
                    body.x = fx;
                    body.vx = 0.0;
                }
                None => {
                    body.vx *= self.velocity_retain;
                    body.x += body.vx;
                }
            }
            match body.fy {
                Some(fy) => {
                    body.y = fy;
                    body.vy = 0.0;
                }
                None => {
                    body.vy *= self.velocity_retain;
                    body.y += body.vy;
                }
            }
        }
    }

    fn alpha(&self) -> f64 {
        self.alpha
    }

    fn bodies(&self) -> &[Body] {
        &self.bodies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_sequence_is_fixed() {
        let mut a = Lcg::new();
        let mut b = Lcg::new();
        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
        // (1664525 * 1 + 1013904223) / 2^32
        let first = Lcg::new().next_f64();
        assert!((first - 1_015_568_748.0 / 4_294_967_296.0).abs() < 1e-15);
    }

    #[test]
    fn test_lcg_range_and_jiggle() {
        let mut lcg = Lcg::with_seed(42);
        for _ in 0..1000 {
            let v = lcg.next_f64();
            assert!((0.0..1.0).contains(&v));
            assert!(lcg.jiggle().abs() <= 0.5e-6);
        }
    }

    #[test]
    fn test_phyllotaxis_spreads_points() {
        let points: Vec<_> = (0..50).map(|i| phyllotaxis(i, 0.0, 0.0)).collect();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                let d = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
                assert!(d > 1.0);
            }
        }
        let (x, y) = phyllotaxis(0, 100.0, -50.0);
        assert!((x - 100.0).abs() <= 10.0 && (y + 50.0).abs() <= 10.0);
    }

    #[test]
    fn test_alpha_decays_geometrically() {
        let mut sim = Simulation::new(vec![Body::at(0.0, 0.0, 1.0)], 0.0228, 0.4);
        sim.run(300);
        assert!(sim.alpha() < 0.001);
        let mut sim = Simulation::new(vec![Body::at(0.0, 0.0, 1.0)], 0.0228, 0.4);
        sim.run(299);
        assert!(sim.alpha() > 0.001);
    }

    #[test]
    fn test_velocity_integration_and_decay() {
        let mut body = Body::at(0.0, 0.0, 1.0);
        body.vx = 10.0;
        let mut sim = Simulation::new(vec![body], 0.0228, 0.4);
        sim.tick();
        let b = &sim.bodies()[0];
        assert!((b.vx - 6.0).abs() < 1e-12);
        assert!((b.x - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_pinned_body_stays_put() {
        let mut body = Body::at(3.0, 4.0, 1.0);
        body.pin(0.0, 0.0);
        body.vx = 5.0;
        let mut sim = Simulation::new(vec![body], 0.0228, 0.4);
        sim.run(10);
        let b = &sim.bodies()[0];
        assert_eq!((b.x, b.y, b.vx, b.vy), (0.0, 0.0, 0.0, 0.0));
        assert!(b.is_pinned());
    }
}
