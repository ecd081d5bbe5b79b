//! Collision predicates for the bird against the world and pipes
//!
//! The bird is tested as its axis-aligned extent `(x ± r, y ± r)`, which is
//! what the player reads from the sprite. Every predicate is total: no
//! division, no failure.

use super::state::{Bird, Pipe};
use crate::tuning::Tuning;

/// What the bird hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Top edge of the viewport
    Ceiling,
    /// Bottom edge of the viewport
    Floor,
    /// A pipe body; index into the pipe sequence
    Pipe { index: usize },
}

/// Bird against the top and bottom edges
pub fn bird_bounds_collision(bird: &Bird, tuning: &Tuning) -> Option<Collision> {
    let r = tuning.bird_radius;
    if bird.y + r > tuning.height {
        Some(Collision::Floor)
    } else if bird.y - r < 0.0 {
        Some(Collision::Ceiling)
    } else {
        None
    }
}

/// Horizontal overlap between the bird and a pipe column
#[inline]
pub fn bird_in_pipe_column(pipe: &Pipe, tuning: &Tuning) -> bool {
    let r = tuning.bird_radius;
    tuning.bird_x + r > pipe.x && tuning.bird_x - r < pipe.trailing_edge(tuning)
}

/// Bird against one pipe pair: inside the column and outside the gap band
pub fn bird_pipe_collision(bird: &Bird, pipe: &Pipe, tuning: &Tuning) -> bool {
    if !bird_in_pipe_column(pipe, tuning) {
        return false;
    }
    let r = tuning.bird_radius;
    bird.y - r < pipe.gap_top(tuning) || bird.y + r > pipe.gap_bottom(tuning)
}

/// First collision this tick: world bounds, then pipes in sequence order
pub fn first_collision(bird: &Bird, pipes: &[Pipe], tuning: &Tuning) -> Option<Collision> {
    if let Some(hit) = bird_bounds_collision(bird, tuning) {
        return Some(hit);
    }
    pipes
        .iter()
        .position(|pipe| bird_pipe_collision(bird, pipe, tuning))
        .map(|index| Collision::Pipe { index })
}
