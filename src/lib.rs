//! # RDK - Random Dot Kinematogram
//!
//! Simulation core for a motion-coherence test. Two rectangular patches
//! each hold a population of moving dots. In one patch a fraction of the
//! dots move coherently left or right; everything else wanders. The subject
//! picks the coherent patch and an adaptive staircase makes the next trial
//! harder or easier.
//!
//! The crate owns no window, renderer, or clock. A host calls
//! [`TrialStateMachine::update`] once per frame with the elapsed time and
//! reads dot positions back for drawing.
//!
//! ## Quick Start
//!
//! ```
//! use rdk::prelude::*;
//!
//! let config = TrialConfig::new(FieldConfig::new().with_population(40).with_coherence(60.0));
//! let mut session = TrialStateMachine::with_seed(config, 42).unwrap();
//!
//! for _ in 0..30 {
//!     session.update(16.0).unwrap();
//! }
//! for side in Side::ALL {
//!     for dot in session.field().agents(side) {
//!         let _ = (dot.position, dot.radius());
//!     }
//! }
//!
//! let outcome = session.respond(Side::Left).unwrap();
//! assert_eq!(outcome.step, 1);
//! ```
//!
//! ## Core Concepts
//!
//! ### Dots
//!
//! Each [`Agent`] is a circle with a constant speed. Coherent dots
//! ([`MotionMode::Fixed`]) move strictly horizontally and reverse every
//! `horizontal_period`. Random dots turn by a random angle every
//! `random_period`. Every dot has a lifetime; when it runs out the dot is
//! respawned somewhere clear inside its patch.
//!
//! ### Frame step
//!
//! [`MotionField::update_dots`] rebuilds a [`QuadTree`] per patch, resolves
//! dot-dot collisions as equal-mass elastic collisions, integrates, pushes
//! random dots back inside the walls, then respawns expired dots.
//!
//! ### Placement
//!
//! | Strategy | Config |
//! |----------|--------|
//! | Rejection sampling | [`PlacementConfig::Rejection`] |
//! | Jittered lattice | [`PlacementConfig::Lattice`] |
//!
//! ### Staircase
//!
//! [`CoherenceController`] scales the coherence percentage after every
//! response. [`IncorrectPolicy`] picks how an incorrect answer moves it.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber.

pub mod agent;
pub mod collision;
pub mod config;
pub mod error;
pub mod field;
pub mod lifecycle;
pub mod patch;
pub mod spatial;
pub mod spawn;
pub mod staircase;
pub mod trial;

pub use agent::{Agent, MotionMode};
pub use config::{FieldConfig, PatchGeometry, StaircaseConfig, TrialConfig};
pub use error::{FieldError, Result};
pub use field::{MotionField, MotionStyle};
pub use glam::DVec2;
pub use lifecycle::{Lifecycle, PopulationLifecycle};
pub use patch::{Direction, Patch, PatchPair, Side};
pub use spatial::{QuadTree, Rect, SpatialConfig};
pub use spawn::PlacementConfig;
pub use staircase::{CoherenceController, IncorrectPolicy};
pub use trial::{TrialOutcome, TrialState, TrialStateMachine};

/// Prelude module for convenient imports.
///
/// ```
/// use rdk::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::{Agent, MotionMode};
    pub use crate::config::{FieldConfig, PatchGeometry, StaircaseConfig, TrialConfig};
    pub use crate::error::FieldError;
    pub use crate::field::{MotionField, MotionStyle};
    pub use crate::lifecycle::{Lifecycle, PopulationLifecycle};
    pub use crate::patch::{Direction, Side};
    pub use crate::spawn::PlacementConfig;
    pub use crate::staircase::{CoherenceController, IncorrectPolicy};
    pub use crate::trial::{TrialOutcome, TrialState, TrialStateMachine};
    pub use crate::DVec2;
}
