//! Adaptive staircase on the coherence percentage.
//!
//! A correct answer lowers coherence (harder), an incorrect one raises it
//! (easier). Two field variants disagree on the sign used for an incorrect
//! answer with a factor above one, so both are kept as named policies and
//! the session configuration picks one.

use serde::{Deserialize, Serialize};

/// Upper bound of the coherence percentage.
pub const MAX_COHERENCE: f64 = 100.0;

/// How an incorrect answer with `factor > 1` moves the level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncorrectPolicy {
    /// `p * factor`.
    #[default]
    Scale,
    /// `p - (p * factor - p)`, the same form the correct branch uses.
    MirrorExcess,
}

/// Staircase state: the current coherence percentage.
///
/// The controller clamps only from above. A lower floor, if any, belongs to
/// the session configuration.
///
/// # Example
///
/// ```
/// use rdk::staircase::{CoherenceController, IncorrectPolicy};
///
/// let mut c = CoherenceController::new(50.0, IncorrectPolicy::Scale);
/// assert_eq!(c.update(0.5, true), 25.0);
/// assert_eq!(c.update(2.0, false), 50.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoherenceController {
    coherence_percent: f64,
    policy: IncorrectPolicy,
}

impl CoherenceController {
    pub fn new(coherence_percent: f64, policy: IncorrectPolicy) -> Self {
        Self {
            coherence_percent: coherence_percent.min(MAX_COHERENCE),
            policy,
        }
    }

    #[inline]
    pub fn coherence_percent(&self) -> f64 {
        self.coherence_percent
    }

    #[inline]
    pub fn policy(&self) -> IncorrectPolicy {
        self.policy
    }

    /// Overwrite the level, e.g. after an external floor clamp.
    pub fn set_coherence_percent(&mut self, coherence_percent: f64) {
        self.coherence_percent = coherence_percent.min(MAX_COHERENCE);
    }

    /// Apply one response and return the new level.
    pub fn update(&mut self, factor: f64, is_correct: bool) -> f64 {
        let p = self.coherence_percent;
        let excess = p * factor - p;

        let next = if is_correct {
            if factor > 1.0 {
                p - excess
            } else {
                p * factor
            }
        } else {
            match self.policy {
                IncorrectPolicy::MirrorExcess if factor > 1.0 => p - excess,
                _ => p * factor,
            }
        };

        self.coherence_percent = next.min(MAX_COHERENCE);
        self.coherence_percent
    }
}
