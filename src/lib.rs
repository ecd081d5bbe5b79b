//! Flappy Pinta - an embeddable Flappy-style arcade minigame
//!
//! Core modules:
//! - `sim`: Fixed-step simulation (bird physics, pipes, collisions, particles)
//! - `session`: Session controller and the score collaborator boundary
//! - `renderer`: Frame composition and the WebGPU pipeline
//! - `platform`: Input normalization shared by every host
//! - `audio`: Event cues and Web Audio playback
//! - `scores` / `settings`: Score collaborator and presentation settings
//! - `tuning`: Data-driven physics constants and viewport
//! - `web`: Browser host exported through wasm-bindgen

pub mod audio;
pub mod platform;
pub mod renderer;
pub mod scores;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use scores::{
    SaveStatus, SaveTracker, ScoreBook, ScoreRecord, ScoreSubmitter, SharedScoreBook, SubmitError,
    SubmitTicket,
};
pub use session::{RunSummary, Session};
pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per nominal display refresh)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Particles per burst (flap and score)
    pub const BURST_PARTICLES: usize = 12;
    /// Burst speed range (pixels/tick)
    pub const BURST_MIN_SPEED: f32 = 2.0;
    pub const BURST_MAX_SPEED: f32 = 5.0;
    /// Downward acceleration applied to particles (pixels/tick²)
    pub const PARTICLE_GRAVITY: f32 = 0.15;
    /// Life lost per tick
    pub const PARTICLE_DECAY: f32 = 0.04;
    /// Number of palette entries particles pick from
    pub const PARTICLE_COLORS: u32 = 4;

    /// Horizontal offset of the score burst ahead of the bird
    pub const SCORE_BURST_OFFSET: f32 = 20.0;

    /// Undrained gameplay events kept per session; older ones are dropped
    pub const MAX_PENDING_EVENTS: usize = 64;
}
