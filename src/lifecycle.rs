//! Dot lifetimes and population lifecycle.
//!
//! Every dot carries its own maximum lifetime. When it runs out the dot is
//! relocated inside its patch and both of its timers restart. Lifetimes are
//! drawn from a range and stretched by a per-dot stagger multiplier, so a
//! population never respawns in one visible wave.
//!
//! # Quick Start
//!
//! ```
//! use rdk::lifecycle::{Lifecycle, PopulationLifecycle};
//!
//! let lifecycle = Lifecycle::new()
//!     .lifetime_range(800.0, 1600.0)
//!     .stagger(0.5);
//! assert_eq!(lifecycle.population, PopulationLifecycle::Reassign);
//!
//! let tutorial = Lifecycle::tutorial();
//! assert_eq!(tutorial.population, PopulationLifecycle::Recreate);
//! ```

use crate::error::{FieldError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What happens to the dot vectors between trials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationLifecycle {
    /// Keep the dots and reassign position, mode and timers.
    #[default]
    Reassign,
    /// Drop the dots and build fresh ones (tutorial trials).
    Recreate,
}

/// Lifetime configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lifecycle {
    /// Shortest base lifetime.
    pub lifetime_min: f64,
    /// Longest base lifetime.
    pub lifetime_max: f64,
    /// Extra lifetime fraction given to the last dot of a population; dot
    /// `i` of `n` gets `1 + stagger * i / n` times its base lifetime.
    pub stagger: f64,
    pub population: PopulationLifecycle,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            lifetime_min: 800.0,
            lifetime_max: 1600.0,
            stagger: 0.5,
            population: PopulationLifecycle::Reassign,
        }
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tutorial preset: default lifetimes, dots rebuilt every trial.
    pub fn tutorial() -> Self {
        Self {
            population: PopulationLifecycle::Recreate,
            ..Default::default()
        }
    }

    /// Same lifetime for every dot (before stagger).
    pub fn lifetime(mut self, lifetime: f64) -> Self {
        self.lifetime_min = lifetime;
        self.lifetime_max = lifetime;
        self
    }

    pub fn lifetime_range(mut self, min: f64, max: f64) -> Self {
        self.lifetime_min = min;
        self.lifetime_max = max;
        self
    }

    pub fn stagger(mut self, stagger: f64) -> Self {
        self.stagger = stagger;
        self
    }

    pub fn recreate_each_trial(mut self) -> Self {
        self.population = PopulationLifecycle::Recreate;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lifetime_min > 0.0) || self.lifetime_max < self.lifetime_min {
            return Err(FieldError::InvalidConfig(
                "lifetimes must satisfy 0 < lifetime_min <= lifetime_max".into(),
            ));
        }
        if self.stagger < 0.0 {
            return Err(FieldError::InvalidConfig("stagger must be >= 0".into()));
        }
        Ok(())
    }

    /// Stagger multiplier for dot `index` of `count`.
    #[inline]
    pub fn stagger_multiplier(&self, index: usize, count: usize) -> f64 {
        1.0 + self.stagger * index as f64 / count.max(1) as f64
    }

    /// Draw the maximum lifetime for dot `index` of `count`.
    pub fn max_lifetime_for<R: Rng>(&self, index: usize, count: usize, rng: &mut R) -> f64 {
        let base = if self.lifetime_max > self.lifetime_min {
            rng.gen_range(self.lifetime_min..=self.lifetime_max)
        } else {
            self.lifetime_min
        };
        base * self.stagger_multiplier(index, count)
    }

    /// Fraction of the lifetime left at trial start, in `(0, 1]`.
    pub fn initial_phase<R: Rng>(&self, rng: &mut R) -> f64 {
        1.0 - rng.gen_range(0.0..1.0)
    }
}
