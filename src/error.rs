//! Error types for RDK.
//!
//! Every failure here is fatal for the operation that raised it: a field
//! with an invalid configuration is never constructed, and a step that
//! cannot place a respawning dot stops rather than continuing with a
//! corrupted population.

use crate::patch::Side;
use thiserror::Error;

/// Errors that can occur while building or stepping a motion field.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    /// A configuration value is out of its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The placement lattice has fewer points than the population needs.
    #[error(
        "infeasible configuration: lattice holds {capacity} points but the population is {population}"
    )]
    InfeasibleLattice {
        /// Usable lattice points in one patch.
        capacity: usize,
        /// Dots per patch.
        population: usize,
    },

    /// Rejection sampling found no free spot within its attempt budget.
    #[error("overcrowded patch: no free spot on the {side:?} side after {attempts} attempts")]
    OvercrowdedPatch {
        /// Patch that could not take the dot.
        side: Side,
        /// Attempts made before giving up.
        attempts: u32,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FieldError>;
