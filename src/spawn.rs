//! Spawn placement for dots.
//!
//! Two strategies place dots inside a patch without visible overlap:
//!
//! | Strategy | How |
//! |----------|-----|
//! | [`PlacementConfig::Rejection`] | Uniform draws, retried until clear of every live dot |
//! | [`PlacementConfig::Lattice`] | Jittered, shuffled grid precomputed per patch |
//!
//! Both are driven through [`Placement`], one per patch.

use crate::agent::{rotate, Agent};
use crate::error::{FieldError, Result};
use crate::patch::{Patch, Side};
use crate::spatial::Rect;
use glam::DVec2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tracing::debug;

/// Which placement strategy a field uses, and its tuning.
///
/// # Example
///
/// ```
/// use rdk::spawn::PlacementConfig;
///
/// let sparse = PlacementConfig::Rejection { spacing: 2.0, max_attempts: 500 };
/// let grid = PlacementConfig::Lattice { separation_multiplier: 1.5 };
/// assert_ne!(sparse, grid);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PlacementConfig {
    /// Rejection sampling.
    Rejection {
        /// Extra gap kept between dot edges.
        spacing: f64,
        /// Draws before the patch is declared overcrowded.
        max_attempts: u32,
    },
    /// Jittered lattice.
    Lattice {
        /// Lattice pitch as a multiple of the dot diameter (`>= 1`).
        separation_multiplier: f64,
    },
}

impl Default for PlacementConfig {
    fn default() -> Self {
        PlacementConfig::Rejection {
            spacing: 2.0,
            max_attempts: 1000,
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> Result<()> {
        match *self {
            PlacementConfig::Rejection {
                spacing,
                max_attempts,
            } => {
                if spacing < 0.0 {
                    return Err(FieldError::InvalidConfig("spacing must be >= 0".into()));
                }
                if max_attempts == 0 {
                    return Err(FieldError::InvalidConfig(
                        "max_attempts must be at least 1".into(),
                    ));
                }
            }
            PlacementConfig::Lattice {
                separation_multiplier,
            } => {
                if !(separation_multiplier >= 1.0) {
                    return Err(FieldError::InvalidConfig(
                        "separation_multiplier must be >= 1".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Hash a lattice cell to `[-1, 1)`.
///
/// The usual `fract(sin(dot(p, k)) * 43758.5453)` shader hash, so the
/// jitter is the same every run.
fn cell_jitter(col: usize, row: usize, salt: f64) -> f64 {
    let s = (col as f64 * 12.9898 + row as f64 * 78.233 + salt * 45.164).sin() * 43758.5453;
    s.fract().abs() * 2.0 - 1.0
}

/// Jittered grid of spawn points covering one patch.
#[derive(Clone, Debug)]
pub struct Lattice {
    points: Vec<DVec2>,
    cursor: usize,
}

impl Lattice {
    /// Lay out a grid of pitch `2 * radius * separation_multiplier` inside
    /// `inner`, centred, with each point jittered by at most half the free
    /// space between neighbouring dots. Every point keeps a whole dot inside
    /// `inner` and clear of every other point's dot.
    pub fn build(inner: &Rect, radius: f64, separation_multiplier: f64) -> Self {
        let pitch = 2.0 * radius * separation_multiplier;
        let cols = (inner.width / pitch).floor().max(0.0) as usize;
        let rows = (inner.height / pitch).floor().max(0.0) as usize;
        let amplitude = (pitch - 2.0 * radius) * 0.5;

        let origin = DVec2::new(
            inner.min_x() + (inner.width - cols as f64 * pitch) * 0.5 + pitch * 0.5,
            inner.min_y() + (inner.height - rows as f64 * pitch) * 0.5 + pitch * 0.5,
        );

        let mut points = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let jitter = DVec2::new(cell_jitter(col, row, 0.0), cell_jitter(col, row, 1.0));
                points.push(origin + DVec2::new(col as f64, row as f64) * pitch + jitter * amplitude);
            }
        }

        Self { points, cursor: 0 }
    }

    /// Number of usable points.
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.points.shuffle(rng);
        self.cursor = 0;
    }

    /// Next point clear of every dot in `others`, scanning from the
    /// cursor. Falls back to the point with the most clearance.
    fn next_free(&mut self, radius: f64, others: &[&Agent]) -> DVec2 {
        let n = self.points.len();
        let mut best = (f64::NEG_INFINITY, self.points[self.cursor % n]);

        for k in 0..n {
            let idx = (self.cursor + k) % n;
            let p = self.points[idx];
            let clearance = others
                .iter()
                .map(|a| p.distance(a.position) - a.radius() - radius)
                .fold(f64::INFINITY, f64::min);
            if clearance > 0.0 {
                self.cursor = (idx + 1) % n;
                return p;
            }
            if clearance > best.0 {
                best = (clearance, p);
            }
        }

        debug!(clearance = best.0, "no free lattice point, using the least crowded one");
        self.cursor = (self.cursor + 1) % n;
        best.1
    }
}

/// Runtime placement state for one patch.
#[derive(Clone, Debug)]
pub enum Placement {
    Rejection {
        area: Rect,
        spacing: f64,
        max_attempts: u32,
    },
    Lattice(Lattice),
}

impl Placement {
    /// Prepare placement for `patch`. A lattice too small for `population`
    /// is rejected here, before any dot exists.
    pub fn new(config: &PlacementConfig, patch: &Patch, radius: f64, population: usize) -> Result<Self> {
        match *config {
            PlacementConfig::Rejection {
                spacing,
                max_attempts,
            } => Ok(Placement::Rejection {
                area: patch.centre_area(radius),
                spacing,
                max_attempts,
            }),
            PlacementConfig::Lattice {
                separation_multiplier,
            } => {
                let lattice = Lattice::build(&patch.inner(), radius, separation_multiplier);
                if lattice.capacity() < population {
                    return Err(FieldError::InfeasibleLattice {
                        capacity: lattice.capacity(),
                        population,
                    });
                }
                Ok(Placement::Lattice(lattice))
            }
        }
    }

    /// Positions for a whole new population of `count` dots.
    pub fn initial_positions<R: Rng>(
        &mut self,
        side: Side,
        count: usize,
        radius: f64,
        rng: &mut R,
    ) -> Result<Vec<DVec2>> {
        match self {
            Placement::Rejection {
                area,
                spacing,
                max_attempts,
            } => {
                let min_dist = 2.0 * radius + *spacing;
                let mut placed: Vec<DVec2> = Vec::with_capacity(count);
                for _ in 0..count {
                    let p = sample_clear(rng, area, *max_attempts, side, |c| {
                        placed.iter().all(|q| c.distance(*q) > min_dist)
                    })?;
                    placed.push(p);
                }
                Ok(placed)
            }
            Placement::Lattice(lattice) => {
                lattice.shuffle(rng);
                lattice.cursor = count % lattice.capacity().max(1);
                Ok(lattice.points.iter().take(count).copied().collect())
            }
        }
    }

    /// New position for `agents[index]`, clear of every other live dot.
    pub fn respawn_position<R: Rng>(
        &mut self,
        side: Side,
        agents: &[Agent],
        index: usize,
        rng: &mut R,
    ) -> Result<DVec2> {
        let me = &agents[index];
        let others: Vec<&Agent> = agents
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, a)| a)
            .collect();

        match self {
            Placement::Rejection {
                area,
                spacing,
                max_attempts,
            } => {
                let radius = me.radius();
                sample_clear(rng, area, *max_attempts, side, |c| {
                    others
                        .iter()
                        .all(|a| c.distance(a.position) > radius + a.radius() + *spacing)
                })
            }
            Placement::Lattice(lattice) => Ok(lattice.next_free(me.radius(), &others)),
        }
    }
}

/// Draw uniform points in `area` until `is_clear` accepts one.
fn sample_clear<R, F>(rng: &mut R, area: &Rect, max_attempts: u32, side: Side, is_clear: F) -> Result<DVec2>
where
    R: Rng,
    F: Fn(DVec2) -> bool,
{
    for _ in 0..max_attempts {
        let candidate = random_in_rect(rng, area);
        if is_clear(candidate) {
            return Ok(candidate);
        }
    }
    Err(FieldError::OvercrowdedPatch {
        side,
        attempts: max_attempts,
    })
}

/// Uniform point inside `rect`. A degenerate extent yields its edge.
pub fn random_in_rect<R: Rng>(rng: &mut R, rect: &Rect) -> DVec2 {
    let x = if rect.width > 0.0 {
        rng.gen_range(rect.min_x()..rect.max_x())
    } else {
        rect.min_x()
    };
    let y = if rect.height > 0.0 {
        rng.gen_range(rect.min_y()..rect.max_y())
    } else {
        rect.min_y()
    };
    DVec2::new(x, y)
}

/// Velocity of magnitude `speed` in a uniformly random direction.
pub fn random_heading<R: Rng>(rng: &mut R, speed: f64) -> DVec2 {
    rotate(DVec2::new(speed, 0.0), rng.gen_range(0.0..TAU))
}
