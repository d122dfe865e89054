//! The four composable forces: link, many-body, center and collide.
//!
//! Each force reads positions and adjusts velocities, except the center
//! force which translates positions directly. Forces receive the current
//! alpha so their effect fades as the simulation cools.

use std::collections::HashMap;

use super::quadtree::QuadTree;
use super::simulation::{Body, Lcg};

/// A force acting on the bodies of a simulation.
pub trait Force: Send {
    /// Apply one tick of the force.
    fn apply(&mut self, bodies: &mut [Body], alpha: f64, random: &mut Lcg);
}

/// Replace an exact zero with a tiny random offset.
fn nonzero(v: f64, random: &mut Lcg) -> f64 {
    if v == 0.0 { random.jiggle() } else { v }
}

// ============================================================================
// Link
// ============================================================================

/// Spring between linked bodies pulling them toward a target distance.
///
/// The correction is split between the endpoints in proportion to their
/// degree, so hubs move less than leaves.
pub struct LinkForce {
    links: Vec<(usize, usize)>,
    distance: f64,
    strengths: Vec<f64>,
    bias: Vec<f64>,
    iterations: usize,
}

impl LinkForce {
    /// Create a link force over `links` between `body_count` bodies.
    ///
    /// `strength: None` uses `1 / min(degree(source), degree(target))`.
    pub fn new(
        links: Vec<(usize, usize)>,
        body_count: usize,
        distance: f64,
        strength: Option<f64>,
        iterations: usize,
    ) -> Self {
        let mut degree = vec![0usize; body_count];
        for &(s, t) in &links {
            degree[s] += 1;
            degree[t] += 1;
        }
        let bias = links
            .iter()
            .map(|&(s, t)| degree[s] as f64 / (degree[s] + degree[t]) as f64)
            .collect();
        let strengths = links
            .iter()
            .map(|&(s, t)| strength.unwrap_or_else(|| 1.0 / degree[s].min(degree[t]) as f64))
            .collect();
        Self {
            links,
            distance,
            strengths,
            bias,
            iterations: iterations.max(1),
        }
    }
}

impl Force for LinkForce {
    fn apply(&mut self, bodies: &mut [Body], alpha: f64, random: &mut Lcg) {
        for _ in 0..self.iterations {
            for (i, &(s, t)) in self.links.iter().enumerate() {
                let (source, target) = (&bodies[s], &bodies[t]);
                let x = nonzero(target.x + target.vx - source.x - source.vx, random);
                let y = nonzero(target.y + target.vy - source.y - source.vy, random);
                let l = (x * x + y * y).sqrt();
                let l = (l - self.distance) / l * alpha * self.strengths[i];
                let (x, y) = (x * l, y * l);

                let b = self.bias[i];
                bodies[t].vx -= x * b;
                bodies[t].vy -= y * b;
                bodies[s].vx += x * (1.0 - b);
                bodies[s].vy += y * (1.0 - b);
            }
        }
    }
}

// ============================================================================
// Many-body
// ============================================================================

/// Pairwise repulsion (or attraction) approximated with Barnes–Hut.
pub struct ManyBodyForce {
    strength: f64,
    theta2: f64,
    distance_min2: f64,
    distance_max2: f64,
}

impl ManyBodyForce {
    /// Create a many-body force with the same strength for every body.
    pub fn new(strength: f64, theta: f64, distance_min: f64, distance_max: Option<f64>) -> Self {
        Self {
            strength,
            theta2: theta * theta,
            distance_min2: distance_min * distance_min,
            distance_max2: distance_max.map_or(f64::INFINITY, |d| d * d),
        }
    }

    /// Velocity change of body `i` from every quad of `tree`.
    fn force_on(
        &self,
        tree: &QuadTree,
        i: usize,
        bodies: &[Body],
        alpha: f64,
        random: &mut Lcg,
    ) -> (f64, f64) {
        let Some(root) = tree.root() else {
            return (0.0, 0.0);
        };
        let body = &bodies[i];
        let (mut dvx, mut dvy) = (0.0, 0.0);
        let mut stack = vec![root];

        while let Some(q) = stack.pop() {
            let quad = tree.quad(q);
            if quad.value == 0.0 {
                continue;
            }
            let mut x = quad.cx - body.x;
            let mut y = quad.cy - body.y;
            let w = quad.width();
            let mut l = x * x + y * y;

            // Far enough away: treat the quad as a single body.
            if w * w / self.theta2 < l {
                if l < self.distance_max2 {
                    if x == 0.0 {
                        x = random.jiggle();
                        l += x * x;
                    }
                    if y == 0.0 {
                        y = random.jiggle();
                        l += y * y;
                    }
                    if l < self.distance_min2 {
                        l = (self.distance_min2 * l).sqrt();
                    }
                    dvx += x * quad.value * alpha / l;
                    dvy += y * quad.value * alpha / l;
                }
                continue;
            }

            if !quad.is_leaf() || l >= self.distance_max2 {
                // Reverse so children are visited in quadrant order.
                stack.extend(quad.children.iter().rev().flatten());
                continue;
            }

            let alone = quad.bodies.len() == 1 && quad.bodies[0] == i;
            if !alone {
                if x == 0.0 {
                    x = random.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = random.jiggle();
                    l += y * y;
                }
                if l < self.distance_min2 {
                    l = (self.distance_min2 * l).sqrt();
                }
            }
            for &j in &quad.bodies {
                if j != i {
                    let w = self.strength * alpha / l;
                    dvx += x * w;
                    dvy += y * w;
                }
            }
        }

        (dvx, dvy)
    }
}

impl Force for ManyBodyForce {
    fn apply(&mut self, bodies: &mut [Body], alpha: f64, random: &mut Lcg) {
        let points: Vec<(f64, f64)> = bodies.iter().map(|b| (b.x, b.y)).collect();
        let strengths = vec![self.strength; bodies.len()];
        let mut tree = QuadTree::build(&points);
        tree.accumulate(&points, &strengths);

        for i in 0..bodies.len() {
            let (dvx, dvy) = self.force_on(&tree, i, bodies, alpha, random);
            bodies[i].vx += dvx;
            bodies[i].vy += dvy;
        }
    }
}

// ============================================================================
// Center
// ============================================================================

/// Translates bodies so their centroid sits on a fixed point.
///
/// Pinned bodies count towards the centroid but are not moved; the shift
/// falls on the free bodies alone.
pub struct CenterForce {
    x: f64,
    y: f64,
    strength: f64,
}

impl CenterForce {
    /// Center on `(x, y)`.
    pub fn new(x: f64, y: f64, strength: f64) -> Self {
        Self { x, y, strength }
    }
}

impl Force for CenterForce {
    fn apply(&mut self, bodies: &mut [Body], _alpha: f64, _random: &mut Lcg) {
        if bodies.is_empty() {
            return;
        }
        let n = bodies.len() as f64;
        let (sx, sy) = bodies
            .iter()
            .fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
        let dx = (sx / n - self.x) * self.strength;
        let dy = (sy / n - self.y) * self.strength;
        for body in bodies.iter_mut().filter(|b| !b.is_pinned()) {
            body.x -= dx;
            body.y -= dy;
        }
    }
}

// ============================================================================
// Collide
// ============================================================================

/// Pushes apart bodies whose circles overlap.
///
/// Candidate pairs come from a uniform grid with cells twice the largest
/// radius, so only neighbouring cells need checking. Each pair is resolved
/// once per pass.
pub struct CollideForce {
    strength: f64,
    iterations: usize,
}

impl CollideForce {
    /// Create a collision force.
    pub fn new(strength: f64, iterations: usize) -> Self {
        Self {
            strength,
            iterations: iterations.max(1),
        }
    }

    fn pass(&self, bodies: &mut [Body], random: &mut Lcg) {
        let max_radius = bodies.iter().map(|b| b.radius).fold(0.0, f64::max);
        if max_radius <= 0.0 {
            return;
        }
        let cell = 2.0 * max_radius;
        let key = |x: f64, y: f64| ((x / cell).floor() as i64, (y / cell).floor() as i64);

        let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, b) in bodies.iter().enumerate() {
            let (x, y) = (b.x + b.vx, b.y + b.vy);
            if x.is_finite() && y.is_finite() {
                grid.entry(key(x, y)).or_default().push(i);
            }
        }

        for i in 0..bodies.len() {
            let ri = bodies[i].radius;
            let ri2 = ri * ri;
            let xi = bodies[i].x + bodies[i].vx;
            let yi = bodies[i].y + bodies[i].vy;
            if !(xi.is_finite() && yi.is_finite()) {
                continue;
            }
            let (gx, gy) = key(xi, yi);

            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(cell_bodies) = grid.get(&(gx + dx, gy + dy)) else {
                        continue;
                    };
                    for &j in cell_bodies {
                        if j <= i {
                            continue;
                        }
                        let rj = bodies[j].radius;
                        let r = ri + rj;
                        let mut x = xi - bodies[j].x - bodies[j].vx;
                        let mut y = yi - bodies[j].y - bodies[j].vy;
                        let mut l = x * x + y * y;
                        if l >= r * r {
                            continue;
                        }
                        if x == 0.0 {
                            x = random.jiggle();
                            l += x * x;
                        }
                        if y == 0.0 {
                            y = random.jiggle();
                            l += y * y;
                        }
                        let d = l.sqrt();
                        let push = (r - d) / d * self.strength;
                        let (x, y) = (x * push, y * push);
                        let rj2 = rj * rj;
                        let share = rj2 / (ri2 + rj2);
                        bodies[i].vx += x * share;
                        bodies[i].vy += y * share;
                        bodies[j].vx -= x * (1.0 - share);
                        bodies[j].vy -= y * (1.0 - share);
                    }
                }
            }
        }
    }
}

impl Force for CollideForce {
    fn apply(&mut self, bodies: &mut [Body], _alpha: f64, random: &mut Lcg) {
        for _ in 0..self.iterations {
            self.pass(bodies, random);
        }
    }
}
