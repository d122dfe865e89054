//! Simulation parameters.

use serde::{Deserialize, Serialize};

use prosograph_core::{Error, Result};

/// Most ticks a layout may run. Parameters implying more are rejected.
pub const TICK_CEILING: usize = 10_000;

/// Parameters of the force-directed layout.
///
/// The simulation runs a fixed number of ticks derived from `alpha_min`
/// and `alpha_decay`, see [`LayoutParams::tick_count`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Alpha level at which the simulation would be considered cooled.
    pub alpha_min: f64,
    /// Fraction of the remaining alpha removed per tick.
    pub alpha_decay: f64,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f64,
    /// Target length of links.
    pub link_distance: f64,
    /// Link stiffness. `None` uses `1 / min(degree)` of the two endpoints.
    pub link_strength: Option<f64>,
    /// Link relaxation passes per tick.
    pub link_iterations: usize,
    /// Many-body strength; negative values repel.
    pub charge_strength: f64,
    /// Barnes–Hut accuracy; larger is faster and coarser.
    pub charge_theta: f64,
    /// Distance below which many-body forces stop growing.
    pub charge_distance_min: f64,
    /// Distance beyond which many-body forces are ignored.
    pub charge_distance_max: Option<f64>,
    /// Collision stiffness in `[0, 1]`.
    pub collide_strength: f64,
    /// Collision relaxation passes per tick.
    pub collide_iterations: usize,
    /// Added to each node's size to get its collision radius.
    pub collide_padding: f64,
    /// Strength of the centering force in `[0, 1]`.
    pub center_strength: f64,
    /// Hard cap on the number of ticks.
    pub max_ticks: Option<usize>,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            alpha_min: 0.001,
            alpha_decay: 0.0228,
            velocity_decay: 0.4,
            link_distance: 300.0,
            link_strength: None,
            link_iterations: 1,
            charge_strength: -30.0,
            charge_theta: 0.9,
            charge_distance_min: 1.0,
            charge_distance_max: None,
            collide_strength: 1.0,
            collide_iterations: 3,
            collide_padding: 2.0,
            center_strength: 1.0,
            max_ticks: None,
        }
    }
}

impl LayoutParams {
    /// Parameters for interactive re-layout of a small neighbourhood.
    pub fn local() -> Self {
        LocalLayoutParams::default().apply(&Self::default())
    }

    /// Number of ticks to run: `ceil(ln(alpha_min) / ln(1 - alpha_decay))`,
    /// capped by `max_ticks`.
    pub fn tick_count(&self) -> usize {
        let computed = (self.alpha_min.ln() / (1.0 - self.alpha_decay).ln()).ceil();
        let computed = if computed.is_finite() && computed > 0.0 {
            computed as usize
        } else {
            0
        };
        match self.max_ticks {
            Some(cap) => computed.min(cap),
            None => computed,
        }
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if !in_open_unit(self.alpha_min) {
            return Err(Error::config(format!(
                "alpha_min must be in (0, 1), got {}",
                self.alpha_min
            )));
        }
        if !in_open_unit(self.alpha_decay) {
            return Err(Error::config(format!(
                "alpha_decay must be in (0, 1), got {}",
                self.alpha_decay
            )));
        }
        let ticks = self.tick_count();
        if ticks > TICK_CEILING {
            return Err(Error::config(format!(
                "alpha_min {} and alpha_decay {} need {ticks} ticks, more than {TICK_CEILING}; \
                 raise alpha_decay or set max_ticks",
                self.alpha_min, self.alpha_decay
            )));
        }
        if !(0.0..=1.0).contains(&self.velocity_decay) {
            return Err(Error::config(format!(
                "velocity_decay must be in [0, 1], got {}",
                self.velocity_decay
            )));
        }
        if self.link_distance.is_nan() || self.link_distance < 0.0 {
            return Err(Error::config("link_distance must not be negative"));
        }
        if self.charge_theta.is_nan() || self.charge_theta <= 0.0 {
            return Err(Error::config("charge_theta must be positive"));
        }
        if !(0.0..=1.0).contains(&self.collide_strength) {
            return Err(Error::config("collide_strength must be in [0, 1]"));
        }
        Ok(())
    }
}

fn in_open_unit(v: f64) -> bool {
    v > 0.0 && v < 1.0
}

/// Overrides applied on top of [`LayoutParams`] for local re-layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalLayoutParams {
    /// Many-body strength; small graphs need stronger repulsion.
    pub charge_strength: f64,
    /// Tick cap bounding request latency.
    pub max_ticks: usize,
}

impl Default for LocalLayoutParams {
    fn default() -> Self {
        Self {
            charge_strength: -500.0,
            max_ticks: 300,
        }
    }
}

impl LocalLayoutParams {
    /// `base` with these overrides applied.
    pub fn apply(&self, base: &LayoutParams) -> LayoutParams {
        LayoutParams {
            charge_strength: self.charge_strength,
            max_ticks: Some(self.max_ticks),
            ..base.clone()
        }
    }
}
