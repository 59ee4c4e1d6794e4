//! Trial flow for a test session.
//!
//! ```text
//!            respond              feedback over
//! Running ------------> Feedback ---------------> Running (next trial)
//!    |  ^                   |
//!    |  | pause over        +---------------------> Finished (limits reached)
//!    v  |
//!   Paused  (respond is still accepted here)
//! ```
//!
//! Only `Running` steps the motion field. Leaving `Feedback` or `Paused`
//! starts a fresh trial: new coherent side and direction, fresh positions.
//! Leaving `Paused` does not count as a step.

use crate::config::TrialConfig;
use crate::error::Result;
use crate::field::MotionField;
use crate::patch::Side;
use crate::staircase::CoherenceController;
use tracing::{debug, info, warn};

/// Phase of the current trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrialState {
    /// Dots are moving and a response is expected.
    Running,
    /// The last response is being acknowledged.
    Feedback { correct: bool },
    /// The run time ran out without a response.
    Paused,
    /// The session is over. Terminal.
    Finished,
}

impl TrialState {
    /// Whether a response is accepted in this state.
    pub fn accepts_response(self) -> bool {
        matches!(self, TrialState::Running | TrialState::Paused)
    }
}

/// Result of one response, handed back to the host for reporting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialOutcome {
    /// 1-based step number of this response.
    pub step: u32,
    pub correct: bool,
    pub coherence_before: f64,
    pub coherence_after: f64,
    /// Time from trial start to the response, pauses included.
    pub reaction_time: f64,
    /// Whether correctness flipped relative to the previous response.
    pub reversal: bool,
}

/// Drives a [`MotionField`] and a [`CoherenceController`] through a session.
#[derive(Debug)]
pub struct TrialStateMachine {
    config: TrialConfig,
    field: MotionField,
    controller: CoherenceController,
    state: TrialState,
    /// Time spent in the current state.
    elapsed: f64,
    /// Time since the current trial started.
    trial_time: f64,
    step_count: u32,
    reversal_count: u32,
    last_correct: Option<bool>,
}

impl TrialStateMachine {
    /// Start a session seeded from OS entropy.
    pub fn new(config: TrialConfig) -> Result<Self> {
        config.validate()?;
        let field = MotionField::new(config.field.clone())?;
        Ok(Self::with_field(config, field))
    }

    /// Start a reproducible session.
    pub fn with_seed(config: TrialConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let field = MotionField::with_seed(config.field.clone(), seed)?;
        Ok(Self::with_field(config, field))
    }

    fn with_field(config: TrialConfig, field: MotionField) -> Self {
        let controller =
            CoherenceController::new(field.coherence_percent(), config.staircase.policy);
        info!(
            coherence = controller.coherence_percent(),
            max_steps = config.max_steps,
            max_reversals = config.max_reversals,
            "session started"
        );
        Self {
            config,
            field,
            controller,
            state: TrialState::Running,
            elapsed: 0.0,
            trial_time: 0.0,
            step_count: 0,
            reversal_count: 0,
            last_correct: None,
        }
    }

    /// Advance the session by `delta`.
    pub fn update(&mut self, delta: f64) -> Result<()> {
        match self.state {
            TrialState::Finished => return Ok(()),
            TrialState::Running => {
                self.field.update_dots(delta)?;
                self.elapsed += delta;
                self.trial_time += delta;
                let limit = self.config.max_run_time;
                if limit > 0.0 && self.elapsed >= limit {
                    warn!(
                        step = self.step_count + 1,
                        run_time = self.elapsed,
                        "no response in time, pausing trial"
                    );
                    self.enter(TrialState::Paused);
                }
            }
            TrialState::Paused => {
                self.elapsed += delta;
                self.trial_time += delta;
                if self.elapsed >= self.config.pause_duration {
                    self.reset()?;
                }
            }
            TrialState::Feedback { .. } => {
                self.elapsed += delta;
                if self.elapsed >= self.config.feedback_duration {
                    self.reset()?;
                }
            }
        }
        Ok(())
    }

    /// The subject picked `side` as the coherent patch.
    ///
    /// Returns `None` when no response is expected.
    pub fn respond(&mut self, side: Side) -> Option<TrialOutcome> {
        let correct = side == self.field.coherent_side();
        self.submit_answer(correct)
    }

    /// Record a response of known correctness: count the step and any
    /// reversal, move the staircase, then show feedback.
    ///
    /// Returns `None` when no response is expected.
    pub fn submit_answer(&mut self, is_correct: bool) -> Option<TrialOutcome> {
        if !self.state.accepts_response() {
            debug!(state = ?self.state, "response ignored");
            return None;
        }

        let before = self.coherence_percent();
        let factor = if is_correct {
            self.config.staircase.correct_factor
        } else {
            self.config.staircase.incorrect_factor
        };
        let after = self.update_coherency(factor, is_correct);

        self.step_count += 1;
        let reversal = self.last_correct.is_some_and(|last| last != is_correct);
        if reversal {
            self.reversal_count += 1;
        }
        self.last_correct = Some(is_correct);

        let outcome = TrialOutcome {
            step: self.step_count,
            correct: is_correct,
            coherence_before: before,
            coherence_after: after,
            reaction_time: self.trial_time,
            reversal,
        };
        info!(
            step = outcome.step,
            correct = is_correct,
            from = before,
            to = after,
            reversals = self.reversal_count,
            "response recorded"
        );
        self.enter(TrialState::Feedback {
            correct: is_correct,
        });
        Some(outcome)
    }

    /// Apply one staircase update and the configured floor. Returns the new
    /// coherence percentage.
    pub fn update_coherency(&mut self, factor: f64, is_correct: bool) -> f64 {
        let level = self.controller.update(factor, is_correct);
        let floor = self.config.staircase.min_coherence;
        if level < floor {
            self.controller.set_coherence_percent(floor);
        }
        self.controller.coherence_percent()
    }

    /// Start a new trial at the current coherence.
    ///
    /// Does nothing once the session is finished. Called during feedback
    /// after the last allowed response, it finishes the session instead.
    pub fn reset(&mut self) -> Result<()> {
        match self.state {
            TrialState::Finished => return Ok(()),
            TrialState::Feedback { .. } if self.limits_reached() => {
                info!(
                    steps = self.step_count,
                    reversals = self.reversal_count,
                    coherence = self.coherence_percent(),
                    "session finished"
                );
                self.enter(TrialState::Finished);
                return Ok(());
            }
            _ => {}
        }
        self.field.reset(self.controller.coherence_percent())?;
        self.trial_time = 0.0;
        self.enter(TrialState::Running);
        Ok(())
    }

    #[inline]
    pub fn state(&self) -> TrialState {
        self.state
    }

    /// Force a state. Forcing [`TrialState::Finished`] stops all updates.
    pub fn set_state(&mut self, state: TrialState) {
        debug!(from = ?self.state, to = ?state, "state forced");
        self.enter(state);
    }

    pub fn coherent_patch_side(&self) -> Side {
        self.field.coherent_side()
    }

    pub fn coherence_percent(&self) -> f64 {
        self.controller.coherence_percent()
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn reversal_count(&self) -> u32 {
        self.reversal_count
    }

    pub fn is_finished(&self) -> bool {
        self.state == TrialState::Finished
    }

    pub fn field(&self) -> &MotionField {
        &self.field
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    fn limits_reached(&self) -> bool {
        self.step_count >= self.config.max_steps || self.reversal_count >= self.config.max_reversals
    }

    fn enter(&mut self, state: TrialState) {
        self.state = state;
        self.elapsed = 0.0;
    }
}
