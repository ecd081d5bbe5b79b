//! Game state and core simulation types
//!
//! Everything the tick loop owns lives here. Rendering only ever sees it
//! through a shared borrow.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Collision;
use super::particles::ParticleSystem;
use crate::consts::MAX_PENDING_EVENTS;
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first input
    Idle,
    /// Active gameplay
    Playing,
    /// Run ended by a collision; score is final
    Ended,
}

/// The player character (bird)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bird {
    /// Vertical center (pixels, down is positive)
    pub y: f32,
    /// Vertical velocity (pixels/tick)
    pub vy: f32,
}

impl Bird {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            y: tuning.bird_start_y(),
            vy: 0.0,
        }
    }

    /// Gravity first, then integrate position
    #[inline]
    pub fn integrate(&mut self, gravity: f32) {
        self.vy += gravity;
        self.y += self.vy;
    }
}

/// A pipe pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    /// Left edge (pixels)
    pub x: f32,
    /// Vertical center of the gap
    pub gap_y: f32,
    /// Already counted toward the score
    pub passed: bool,
}

impl Pipe {
    /// Trailing (right) edge
    #[inline]
    pub fn trailing_edge(&self, tuning: &Tuning) -> f32 {
        self.x + tuning.pipe_width
    }

    /// Bottom of the top body
    #[inline]
    pub fn gap_top(&self, tuning: &Tuning) -> f32 {
        self.gap_y - tuning.pipe_gap / 2.0
    }

    /// Top of the bottom body
    #[inline]
    pub fn gap_bottom(&self, tuning: &Tuning) -> f32 {
        self.gap_y + tuning.pipe_gap / 2.0
    }
}

/// Gameplay events recorded during a tick (audio/presentation hooks)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// An impulse was applied
    Flap,
    /// A pipe was passed; carries the new score
    Scored(u32),
    /// The run ended
    Crashed(Collision),
}

/// Queue an event, dropping the oldest once `MAX_PENDING_EVENTS` are waiting
pub(crate) fn record_event(events: &mut Vec<GameEvent>, event: GameEvent) {
    if events.len() >= MAX_PENDING_EVENTS {
        let excess = events.len() + 1 - MAX_PENDING_EVENTS;
        events.drain(..excess);
    }
    events.push(event);
}

/// Stream offset separating particle randomness from pipe randomness
const FX_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Current phase
    pub phase: GamePhase,
    /// Ticks while Playing since the run started
    pub frame: u64,
    /// Pipes passed this run
    pub score: u32,
    pub bird: Bird,
    /// Live pipes in spawn order
    pub pipes: Vec<Pipe>,
    /// Visual particles (not gameplay-affecting)
    pub particles: ParticleSystem,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    /// Pipe gap RNG
    pub(crate) rng: Pcg32,
    /// Particle RNG, independent of `rng`
    pub(crate) fx_rng: Pcg32,
}

impl GameState {
    /// Create a fresh Idle state with the given seed
    pub fn new(seed: u64, tuning: &Tuning, max_particles: usize) -> Self {
        Self {
            seed,
            phase: GamePhase::Idle,
            frame: 0,
            score: 0,
            bird: Bird::new(tuning),
            pipes: Vec::new(),
            particles: ParticleSystem::new(max_particles),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            fx_rng: Pcg32::seed_from_u64(seed ^ FX_STREAM),
        }
    }

    /// Whether the simulation advances on tick
    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Playing
    }
}
