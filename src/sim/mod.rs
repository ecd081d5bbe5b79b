//! Fixed-step simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only (units are pixels and ticks)
//! - Seeded RNG only, with particles on their own stream
//! - Stable iteration order (pipes in spawn order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod particles;
pub mod state;
pub mod tick;

pub use collision::{Collision, bird_bounds_collision, bird_pipe_collision, first_collision};
pub use particles::{Particle, ParticleSystem};
pub use state::{Bird, GameEvent, GamePhase, GameState, Pipe};
pub use tick::{TickInput, spawn_pipe, tick};
