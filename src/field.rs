//! The motion field: two patches, their dot populations, and the per-frame
//! simulation step.
//!
//! # Frame order
//!
//! For each patch, [`MotionField::update_dots`] runs:
//!
//! 1. rebuild the shared quadtree from that patch's dots,
//! 2. resolve dot-dot collisions using the tree,
//! 3. advance kinematics (timers, heading changes, integration),
//! 4. push random dots back inside the walls,
//! 5. respawn dots whose lifetime ran out.
//!
//! The tree is always fully rebuilt before it is queried for a patch, and
//! wall resolution comes last so every random dot is inside its patch when
//! the frame ends.

use crate::agent::{Agent, MotionMode};
use crate::collision;
use crate::config::FieldConfig;
use crate::error::{FieldError, Result};
use crate::lifecycle::PopulationLifecycle;
use crate::patch::{Direction, Patch, PatchPair, Side};
use crate::spatial::{QuadTree, Rect};
use crate::spawn::{random_heading, Placement};
use crate::staircase::MAX_COHERENCE;
use glam::DVec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How dots are presented. Kinematics are shared by both styles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum MotionStyle {
    /// Plain dots.
    #[default]
    DotCoherence,
    /// Each dot is drawn as a segment of `length` along its heading.
    LineSegment { length: f64 },
}

impl MotionStyle {
    pub fn validate(&self) -> Result<()> {
        match *self {
            MotionStyle::LineSegment { length } if !(length > 0.0) => Err(
                FieldError::InvalidConfig("segment length must be positive".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// Number of coherent dots for a population at a coherence percentage.
pub fn coherent_count(population: usize, coherence_percent: f64) -> usize {
    let pct = coherence_percent.clamp(0.0, MAX_COHERENCE);
    ((population as f64 * pct / MAX_COHERENCE).round() as usize).min(population)
}

/// One patch's dots plus its placement state.
#[derive(Clone, Debug)]
struct Population {
    side: Side,
    agents: Vec<Agent>,
    placement: Placement,
}

/// Both patches and their populations.
///
/// # Example
///
/// ```
/// use rdk::config::FieldConfig;
/// use rdk::field::MotionField;
/// use rdk::patch::Side;
///
/// let mut field = MotionField::with_seed(FieldConfig::new().with_population(20), 7).unwrap();
/// for _ in 0..60 {
///     field.update_dots(16.0).unwrap();
/// }
/// assert_eq!(field.agents(Side::Left).len(), 20);
/// ```
#[derive(Clone, Debug)]
pub struct MotionField {
    config: FieldConfig,
    patches: PatchPair,
    populations: [Population; 2],
    index: QuadTree,
    candidates: Vec<usize>,
    coherent_side: Side,
    coherent_direction: Direction,
    coherence_percent: f64,
    rng: SmallRng,
    trial: u64,
    frame: u64,
}

impl MotionField {
    /// Build a field seeded from OS entropy.
    pub fn new(config: FieldConfig) -> Result<Self> {
        Self::from_rng(config, SmallRng::from_entropy())
    }

    /// Build a field with a fixed seed, for reproducible runs.
    pub fn with_seed(config: FieldConfig, seed: u64) -> Result<Self> {
        Self::from_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn from_rng(config: FieldConfig, mut rng: SmallRng) -> Result<Self> {
        config.validate()?;
        let patches = PatchPair::from_geometry(&config.geometry)?;
        let index = QuadTree::new(patches.union(), config.spatial);

        let populations = [
            Population::new(Side::Left, &config, patches.get(Side::Left), &mut rng)?,
            Population::new(Side::Right, &config, patches.get(Side::Right), &mut rng)?,
        ];

        let mut field = Self {
            coherence_percent: config.coherence_percent,
            config,
            patches,
            populations,
            index,
            candidates: Vec::new(),
            coherent_side: Side::Left,
            coherent_direction: Direction::Right,
            rng,
            trial: 0,
            frame: 0,
        };
        field.reset(field.coherence_percent)?;
        Ok(field)
    }

    /// Start a new trial: re-roll the coherent side and direction, assign
    /// modes at `coherence_percent`, and place every dot afresh.
    pub fn reset(&mut self, coherence_percent: f64) -> Result<()> {
        self.coherence_percent = coherence_percent.clamp(0.0, MAX_COHERENCE);
        self.coherent_side = if self.rng.gen_bool(0.5) {
            Side::Left
        } else {
            Side::Right
        };
        self.coherent_direction = if self.rng.gen_bool(0.5) {
            Direction::Left
        } else {
            Direction::Right
        };

        let coherent = coherent_count(self.config.population, self.coherence_percent);
        for population in self.populations.iter_mut() {
            let fixed = if population.side == self.coherent_side {
                coherent
            } else {
                0
            };
            population.assign(&self.config, fixed, self.coherent_direction, &mut self.rng)?;
        }

        self.trial += 1;
        self.frame = 0;
        debug!(
            trial = self.trial,
            side = ?self.coherent_side,
            direction = ?self.coherent_direction,
            coherence = self.coherence_percent,
            coherent,
            "field reset"
        );
        Ok(())
    }

    /// Advance both populations by `delta`.
    pub fn update_dots(&mut self, delta: f64) -> Result<()> {
        let Self {
            populations,
            patches,
            index,
            candidates,
            rng,
            ..
        } = self;

        for population in populations.iter_mut() {
            population.step(patches.get(population.side), index, candidates, rng, delta)?;
        }
        self.frame += 1;
        Ok(())
    }

    pub fn agents(&self, side: Side) -> &[Agent] {
        &self.population(side).agents
    }

    /// Segment endpoints for every dot on `side` in the line-segment style;
    /// empty in the dot style.
    pub fn segments(&self, side: Side) -> Vec<(DVec2, DVec2)> {
        match self.config.style {
            MotionStyle::LineSegment { length } => {
                self.agents(side).iter().map(|a| a.segment(length)).collect()
            }
            MotionStyle::DotCoherence => Vec::new(),
        }
    }

    pub fn patches(&self) -> &PatchPair {
        &self.patches
    }

    pub fn patch(&self, side: Side) -> &Patch {
        self.patches.get(side)
    }

    #[inline]
    pub fn coherent_side(&self) -> Side {
        self.coherent_side
    }

    #[inline]
    pub fn coherent_direction(&self) -> Direction {
        self.coherent_direction
    }

    #[inline]
    pub fn coherence_percent(&self) -> f64 {
        self.coherence_percent
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn style(&self) -> MotionStyle {
        self.config.style
    }

    /// The shared quadtree as left by the last patch stepped.
    pub fn index(&self) -> &QuadTree {
        &self.index
    }

    /// Trials started since construction, including the first.
    pub fn trial(&self) -> u64 {
        self.trial
    }

    /// Frames stepped since the last reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn population(&self, side: Side) -> &Population {
        &self.populations[side_slot(side)]
    }
}

fn side_slot(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

impl Population {
    fn new(side: Side, config: &FieldConfig, patch: &Patch, rng: &mut SmallRng) -> Result<Self> {
        let placement = Placement::new(&config.placement, patch, config.dot_radius, config.population)?;
        Ok(Self {
            side,
            agents: fresh_agents(config, rng),
            placement,
        })
    }

    /// Give every dot its trial state; the first `fixed` dots move
    /// coherently in `direction`.
    fn assign(
        &mut self,
        config: &FieldConfig,
        fixed: usize,
        direction: Direction,
        rng: &mut SmallRng,
    ) -> Result<()> {
        if config.lifecycle.population == PopulationLifecycle::Recreate {
            self.agents = fresh_agents(config, rng);
        }

        let count = self.agents.len();
        let positions = self
            .placement
            .initial_positions(self.side, count, config.dot_radius, rng)?;

        for (i, (agent, position)) in self.agents.iter_mut().zip(positions).enumerate() {
            let (mode, velocity, period) = if i < fixed {
                (
                    MotionMode::Fixed(direction),
                    direction.unit() * config.speed,
                    config.horizontal_period,
                )
            } else {
                (
                    MotionMode::Random,
                    random_heading(rng, config.speed),
                    config.random_period,
                )
            };
            let max_lifetime = config.lifecycle.max_lifetime_for(i, count, rng);
            let phase = config.lifecycle.initial_phase(rng);
            agent.reassign(position, velocity, mode, period, max_lifetime, phase);
        }
        Ok(())
    }

    fn step(
        &mut self,
        patch: &Patch,
        index: &mut QuadTree,
        candidates: &mut Vec<usize>,
        rng: &mut SmallRng,
        delta: f64,
    ) -> Result<()> {
        index.rebuild(
            self.agents
                .iter()
                .enumerate()
                .map(|(i, a)| (i, Rect::around(a.position, a.radius()))),
        );
        collision::resolve_population(&mut self.agents, index, candidates);

        let inner = patch.inner();
        for agent in self.agents.iter_mut() {
            agent.update(delta, rng);
            collision::resolve_walls(agent, &inner);
        }

        for i in 0..self.agents.len() {
            if self.agents[i].is_expired() {
                let position = self
                    .placement
                    .respawn_position(self.side, &self.agents, i, rng)?;
                self.agents[i].respawn_at(position);
            }
        }
        Ok(())
    }
}

/// Placeholder dots; [`Population::assign`] gives them real state.
fn fresh_agents(config: &FieldConfig, rng: &mut SmallRng) -> Vec<Agent> {
    let count = config.population;
    (0..count)
        .map(|i| {
            Agent::new(
                DVec2::ZERO,
                DVec2::ZERO,
                config.dot_radius,
                MotionMode::Random,
                config.random_period,
                config.lifecycle.max_lifetime_for(i, count, rng),
            )
        })
        .collect()
}
