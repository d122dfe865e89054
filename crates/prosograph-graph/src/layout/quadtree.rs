//! Barnes–Hut quadtree for the many-body force.
//!
//! Quads live in an arena and refer to each other by index. A leaf holds
//! one or more bodies at exactly the same position; an internal quad
//! holds up to four children. After [`QuadTree::accumulate`] every quad
//! carries its total strength and strength-weighted centre.

/// Depth at which distinct but nearly equal points share a leaf.
const MAX_DEPTH: usize = 48;

/// One square region of the tree.
#[derive(Clone, Debug)]
pub struct Quad {
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub y0: f64,
    /// Right edge.
    pub x1: f64,
    /// Bottom edge.
    pub y1: f64,
    /// Child quads in order top-left, top-right, bottom-left, bottom-right.
    pub children: [Option<usize>; 4],
    /// Bodies of a leaf, in insertion order.
    pub bodies: Vec<usize>,
    /// Weighted centre x.
    pub cx: f64,
    /// Weighted centre y.
    pub cy: f64,
    /// Total strength of the bodies below.
    pub value: f64,
}

impl Quad {
    fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            children: [None; 4],
            bodies: Vec::new(),
            cx: 0.0,
            cy: 0.0,
            value: 0.0,
        }
    }

    /// Whether the quad has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Side length.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }
}

/// A quadtree over a fixed set of points.
#[derive(Clone, Debug, Default)]
pub struct QuadTree {
    quads: Vec<Quad>,
}

impl QuadTree {
    /// Build a tree over `points`. Non-finite points are left out.
    pub fn build(points: &[(f64, f64)]) -> Self {
        let finite = |p: &(f64, f64)| p.0.is_finite() && p.1.is_finite();
        let mut tree = Self::default();
        let Some((x0, y0, x1, y1)) = extent(points.iter().filter(|&p| finite(p))) else {
            return tree;
        };
        tree.quads.push(Quad::new(x0, y0, x1, y1));
        for (i, p) in points.iter().enumerate() {
            if finite(p) {
                tree.insert(0, i, points, 0);
            }
        }
        tree
    }

    /// Root quad index, if the tree has any points.
    pub fn root(&self) -> Option<usize> {
        if self.quads.is_empty() { None } else { Some(0) }
    }

    /// Access a quad.
    pub fn quad(&self, index: usize) -> &Quad {
        &self.quads[index]
    }

    /// Number of quads.
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// Whether the tree has no quads.
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    fn insert(&mut self, q: usize, body: usize, points: &[(f64, f64)], depth: usize) {
        if !self.quads[q].is_leaf() {
            let child = self.child_for(q, points[body]);
            self.insert(child, body, points, depth + 1);
            return;
        }

        let Some(&first) = self.quads[q].bodies.first() else {
            self.quads[q].bodies.push(body);
            return;
        };
        if points[first] == points[body] || depth >= MAX_DEPTH {
            self.quads[q].bodies.push(body);
            return;
        }

        // Split: the resident bodies share one position, so one child.
        let resident = std::mem::take(&mut self.quads[q].bodies);
        let child = self.child_for(q, points[first]);
        self.quads[child].bodies = resident;
        let target = self.child_for(q, points[body]);
        self.insert(target, body, points, depth + 1);
    }

    fn child_for(&mut self, q: usize, (x, y): (f64, f64)) -> usize {
        let quad = &self.quads[q];
        let mx = (quad.x0 + quad.x1) / 2.0;
        let my = (quad.y0 + quad.y1) / 2.0;
        let right = x >= mx;
        let bottom = y >= my;
        let slot = usize::from(right) | (usize::from(bottom) << 1);
        if let Some(existing) = quad.children[slot] {
            return existing;
        }
        let (x0, x1) = if right { (mx, quad.x1) } else { (quad.x0, mx) };
        let (y0, y1) = if bottom { (my, quad.y1) } else { (quad.y0, my) };
        let index = self.quads.len();
        self.quads.push(Quad::new(x0, y0, x1, y1));
        self.quads[q].children[slot] = Some(index);
        index
    }

    /// Compute total strength and weighted centre of every quad.
    pub fn accumulate(&mut self, points: &[(f64, f64)], strengths: &[f64]) {
        if let Some(root) = self.root() {
            self.accumulate_quad(root, points, strengths);
        }
    }

    fn accumulate_quad(&mut self, q: usize, points: &[(f64, f64)], strengths: &[f64]) {
        if self.quads[q].is_leaf() {
            let quad = &mut self.quads[q];
            if let Some(&first) = quad.bodies.first() {
                quad.cx = points[first].0;
                quad.cy = points[first].1;
            }
            quad.value = quad.bodies.iter().map(|&b| strengths[b]).sum();
            return;
        }

        let children = self.quads[q].children;
        let (mut value, mut weight, mut x, mut y) = (0.0, 0.0, 0.0, 0.0);
        for child in children.into_iter().flatten() {
            self.accumulate_quad(child, points, strengths);
            let c = &self.quads[child];
            let w = c.value.abs();
            value += c.value;
            weight += w;
            x += w * c.cx;
            y += w * c.cy;
        }
        let quad = &mut self.quads[q];
        quad.value = value;
        if weight > 0.0 {
            quad.cx = x / weight;
            quad.cy = y / weight;
        }
    }
}

/// Square bounding box of `points`, at least one unit wide.
fn extent<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<(f64, f64, f64, f64)> {
    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for &(x, y) in points {
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    let (x0, y0, x1, y1) = bounds?;
    let side = (x1 - x0).max(y1 - y0).max(1.0);
    // Pad so the maximum edge falls strictly inside.
    let side = side * (1.0 + 1e-9);
    Some((x0, y0, x0 + side, y0 + side))
}
