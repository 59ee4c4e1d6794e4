//! Configuration values for fields and sessions.
//!
//! Everything is a plain value passed in at construction. All types derive
//! `serde` traits so a host can load them from JSON, and every field has a
//! default, so partial documents work.
//!
//! Every duration (periods, lifetimes, run and pause times, and the `delta`
//! passed to `update`) must use the same unit. The defaults assume
//! milliseconds, with speed in units per millisecond.
//!
//! ```
//! use rdk::config::FieldConfig;
//! use rdk::spawn::PlacementConfig;
//!
//! let config = FieldConfig::new()
//!     .with_population(60)
//!     .with_dot_radius(2.5)
//!     .with_coherence(35.0)
//!     .with_placement(PlacementConfig::Lattice { separation_multiplier: 1.5 });
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{FieldError, Result};
use crate::field::MotionStyle;
use crate::lifecycle::Lifecycle;
use crate::spatial::SpatialConfig;
use crate::spawn::PlacementConfig;
use crate::staircase::{IncorrectPolicy, MAX_COHERENCE};
use serde::{Deserialize, Serialize};

/// Where the two patches sit.
///
/// The left patch's top-left corner is at the origin; the right patch
/// follows `gap` units to its right. Both share width and height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchGeometry {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
    pub gap: f64,
    pub outline_thickness: f64,
}

impl Default for PatchGeometry {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            width: 300.0,
            height: 300.0,
            gap: 100.0,
            outline_thickness: 4.0,
        }
    }
}

impl PatchGeometry {
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(FieldError::InvalidConfig("patch size must be positive".into()));
        }
        if self.gap < 0.0 {
            return Err(FieldError::InvalidConfig(
                "patch gap must be >= 0 so the patches never overlap".into(),
            ));
        }
        if self.outline_thickness < 0.0
            || self.outline_thickness * 2.0 >= self.width.min(self.height)
        {
            return Err(FieldError::InvalidConfig(
                "outline thickness leaves no room inside the patch".into(),
            ));
        }
        Ok(())
    }
}

/// Everything a [`MotionField`](crate::field::MotionField) needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Dots per patch.
    pub population: usize,
    pub dot_radius: f64,
    /// Dot speed in distance per time unit.
    pub speed: f64,
    /// Time between direction reversals of coherent dots.
    pub horizontal_period: f64,
    /// Time between random turns of random dots.
    pub random_period: f64,
    /// Starting coherence percentage.
    pub coherence_percent: f64,
    pub geometry: PatchGeometry,
    pub placement: PlacementConfig,
    pub lifecycle: Lifecycle,
    pub style: MotionStyle,
    pub spatial: SpatialConfig,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            population: 50,
            dot_radius: 3.0,
            speed: 0.05,
            horizontal_period: 2000.0,
            random_period: 250.0,
            coherence_percent: 50.0,
            geometry: PatchGeometry::default(),
            placement: PlacementConfig::default(),
            lifecycle: Lifecycle::default(),
            style: MotionStyle::default(),
            spatial: SpatialConfig::default(),
        }
    }
}

impl FieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    pub fn with_dot_radius(mut self, radius: f64) -> Self {
        self.dot_radius = radius;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Set the coherent flip period and the random turn period.
    pub fn with_periods(mut self, horizontal: f64, random: f64) -> Self {
        self.horizontal_period = horizontal;
        self.random_period = random;
        self
    }

    pub fn with_coherence(mut self, coherence_percent: f64) -> Self {
        self.coherence_percent = coherence_percent;
        self
    }

    pub fn with_geometry(mut self, geometry: PatchGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn with_style(mut self, style: MotionStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_spatial_config(mut self, spatial: SpatialConfig) -> Self {
        self.spatial = spatial;
        self
    }

    /// Check every value. Lattice feasibility depends on the built patches
    /// and is checked when the field is constructed.
    pub fn validate(&self) -> Result<()> {
        if self.population == 0 {
            return Err(FieldError::InvalidConfig("population must be at least 1".into()));
        }
        if !(self.dot_radius > 0.0) {
            return Err(FieldError::InvalidConfig("dot radius must be positive".into()));
        }
        if !(self.speed >= 0.0) {
            return Err(FieldError::InvalidConfig("speed must be >= 0".into()));
        }
        if !(self.horizontal_period > 0.0 && self.random_period > 0.0) {
            return Err(FieldError::InvalidConfig("heading periods must be positive".into()));
        }
        if !(0.0..=MAX_COHERENCE).contains(&self.coherence_percent) {
            return Err(FieldError::InvalidConfig(
                "coherence percent must lie in [0, 100]".into(),
            ));
        }
        self.geometry.validate()?;
        let inner = self.geometry.width.min(self.geometry.height)
            - 2.0 * self.geometry.outline_thickness;
        if 2.0 * self.dot_radius > inner {
            return Err(FieldError::InvalidConfig(
                "a dot does not fit inside the patch".into(),
            ));
        }
        self.placement.validate()?;
        self.lifecycle.validate()?;
        self.style.validate()?;
        self.spatial.validate()
    }
}

/// Staircase tuning for a session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaircaseConfig {
    /// Factor applied after a correct answer.
    pub correct_factor: f64,
    /// Factor applied after an incorrect answer.
    pub incorrect_factor: f64,
    pub policy: IncorrectPolicy,
    /// Floor applied after every update.
    pub min_coherence: f64,
}

impl Default for StaircaseConfig {
    fn default() -> Self {
        Self {
            correct_factor: 0.8,
            incorrect_factor: 1.25,
            policy: IncorrectPolicy::Scale,
            min_coherence: 1.0,
        }
    }
}

impl StaircaseConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.correct_factor > 0.0 && self.incorrect_factor > 0.0) {
            return Err(FieldError::InvalidConfig(
                "staircase factors must be positive".into(),
            ));
        }
        if !(0.0..=MAX_COHERENCE).contains(&self.min_coherence) {
            return Err(FieldError::InvalidConfig(
                "min_coherence must lie in [0, 100]".into(),
            ));
        }
        Ok(())
    }
}

/// A full session: field, staircase, and trial pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    pub field: FieldConfig,
    pub staircase: StaircaseConfig,
    /// Responses before the session ends.
    pub max_steps: u32,
    /// Correctness reversals before the session ends.
    pub max_reversals: u32,
    /// Motion time allowed before the trial pauses. Zero disables it.
    pub max_run_time: f64,
    pub pause_duration: f64,
    pub feedback_duration: f64,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            staircase: StaircaseConfig::default(),
            max_steps: 40,
            max_reversals: 10,
            max_run_time: 5000.0,
            pause_duration: 1000.0,
            feedback_duration: 750.0,
        }
    }
}

impl TrialConfig {
    pub fn new(field: FieldConfig) -> Self {
        Self {
            field,
            ..Default::default()
        }
    }

    pub fn with_staircase(mut self, staircase: StaircaseConfig) -> Self {
        self.staircase = staircase;
        self
    }

    pub fn with_limits(mut self, max_steps: u32, max_reversals: u32) -> Self {
        self.max_steps = max_steps;
        self.max_reversals = max_reversals;
        self
    }

    pub fn with_timing(mut self, max_run_time: f64, pause_duration: f64, feedback_duration: f64) -> Self {
        self.max_run_time = max_run_time;
        self.pause_duration = pause_duration;
        self.feedback_duration = feedback_duration;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.field.validate()?;
        self.staircase.validate()?;
        if self.max_steps == 0 {
            return Err(FieldError::InvalidConfig("max_steps must be at least 1".into()));
        }
        if self.max_run_time < 0.0 || self.pause_duration < 0.0 || self.feedback_duration < 0.0 {
            return Err(FieldError::InvalidConfig("durations must be >= 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(FieldConfig::default().validate().is_ok());
        assert!(TrialConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(FieldConfig::new().with_population(0).validate().is_err());
        assert!(FieldConfig::new().with_dot_radius(0.0).validate().is_err());
        assert!(FieldConfig::new().with_coherence(120.0).validate().is_err());
        assert!(FieldConfig::new().with_periods(0.0, 10.0).validate().is_err());
        assert!(FieldConfig::new().with_dot_radius(200.0).validate().is_err());

        let geometry = PatchGeometry {
            outline_thickness: 150.0,
            ..Default::default()
        };
        assert!(FieldConfig::new().with_geometry(geometry).validate().is_err());

        let geometry = PatchGeometry {
            gap: -10.0,
            ..Default::default()
        };
        assert!(geometry.validate().is_err());
    }

    #[test]
    fn test_trial_limits_validated() {
        assert!(TrialConfig::default().with_limits(0, 5).validate().is_err());
        assert!(TrialConfig::default()
            .with_timing(-1.0, 0.0, 0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "field": {
                "population": 12,
                "placement": { "strategy": "lattice", "separation_multiplier": 2.0 },
                "style": { "style": "line_segment", "length": 8.0 }
            },
            "staircase": { "policy": "mirror_excess" },
            "max_steps": 5
        }"#;
        let config: TrialConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.field.population, 12);
        assert_eq!(config.field.dot_radius, 3.0);
        assert_eq!(
            config.field.placement,
            PlacementConfig::Lattice {
                separation_multiplier: 2.0
            }
        );
        assert_eq!(config.field.style, MotionStyle::LineSegment { length: 8.0 });
        assert_eq!(config.staircase.policy, IncorrectPolicy::MirrorExcess);
        assert_eq!(config.max_steps, 5);
        assert_eq!(config.max_reversals, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = TrialConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: TrialConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
