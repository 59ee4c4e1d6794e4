//! One moving dot and its per-frame kinematics.

use crate::patch::Direction;
use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// How a dot chooses its heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    /// Coherent motion: strictly horizontal, reversing every flip period.
    Fixed(Direction),
    /// Random walk: a uniformly random turn every turn period.
    Random,
}

impl MotionMode {
    #[inline]
    pub fn is_fixed(self) -> bool {
        matches!(self, MotionMode::Fixed(_))
    }

    #[inline]
    pub fn is_random(self) -> bool {
        matches!(self, MotionMode::Random)
    }
}

/// Rotate `v` counter-clockwise by `angle` radians.
#[inline]
pub fn rotate(v: DVec2, angle: f64) -> DVec2 {
    let (sin, cos) = angle.sin_cos();
    DVec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// A single dot.
///
/// `position` and `velocity` are public so collision routines can adjust
/// them; the radius and timers only change through methods.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub position: DVec2,
    pub velocity: DVec2,
    radius: f64,
    mode: MotionMode,
    /// Time since the last heading change.
    heading_timer: f64,
    heading_period: f64,
    /// Counts down to the next respawn.
    lifetime_timer: f64,
    max_lifetime: f64,
}

impl Agent {
    /// Create a dot with both timers at their starting values.
    pub fn new(
        position: DVec2,
        velocity: DVec2,
        radius: f64,
        mode: MotionMode,
        heading_period: f64,
        max_lifetime: f64,
    ) -> Self {
        debug_assert!(radius > 0.0, "agent radius must be positive");
        Self {
            position,
            velocity,
            radius,
            mode,
            heading_timer: 0.0,
            heading_period,
            lifetime_timer: max_lifetime,
            max_lifetime,
        }
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    #[inline]
    pub fn heading_timer(&self) -> f64 {
        self.heading_timer
    }

    #[inline]
    pub fn heading_period(&self) -> f64 {
        self.heading_period
    }

    #[inline]
    pub fn lifetime_timer(&self) -> f64 {
        self.lifetime_timer
    }

    #[inline]
    pub fn max_lifetime(&self) -> f64 {
        self.max_lifetime
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Whether the lifetime has run out.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.lifetime_timer <= 0.0
    }

    /// Start a new trial for this dot: new mode, heading, period and
    /// lifetime. `lifetime_phase` in `(0, 1]` sets how much of the lifetime
    /// remains, so a freshly assigned population does not expire at once.
    pub fn reassign(
        &mut self,
        position: DVec2,
        velocity: DVec2,
        mode: MotionMode,
        heading_period: f64,
        max_lifetime: f64,
        lifetime_phase: f64,
    ) {
        self.position = position;
        self.velocity = velocity;
        self.mode = mode;
        self.heading_timer = 0.0;
        self.heading_period = heading_period;
        self.max_lifetime = max_lifetime;
        self.lifetime_timer = max_lifetime * lifetime_phase;
    }

    /// Move to `position` and restart both timers.
    pub fn respawn_at(&mut self, position: DVec2) {
        self.position = position;
        self.heading_timer = 0.0;
        self.lifetime_timer = self.max_lifetime;
    }

    /// Advance timers, apply any due heading change, then integrate.
    pub fn update<R: Rng>(&mut self, delta: f64, rng: &mut R) {
        self.heading_timer += delta;
        self.lifetime_timer -= delta;

        if self.heading_timer >= self.heading_period {
            let angle = match self.mode {
                MotionMode::Fixed(_) => PI,
                MotionMode::Random => rng.gen_range(0.0..TAU),
            };
            self.velocity = rotate(self.velocity, angle);
            self.heading_timer = 0.0;
        }

        self.position += self.velocity * delta;
    }

    /// Line segment of `length` centred on the dot and aligned with its
    /// heading, for renderers that draw segments instead of dots.
    pub fn segment(&self, length: f64) -> (DVec2, DVec2) {
        let dir = self.velocity.try_normalize().unwrap_or(DVec2::X);
        let half = dir * (length * 0.5);
        (self.position - half, self.position + half)
    }
}
