//! Data-driven game balance
//!
//! Physics constants and viewport size, fixed for the lifetime of a session.
//! Units are pixels and ticks (one tick = `SIM_DT`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reasons a tuning is rejected at construction
#[derive(Debug, Clone, PartialEq)]
pub enum TuningError {
    /// A field is NaN or infinite
    NotFinite(&'static str),
    /// A size, speed or rate must be strictly positive
    NonPositive(&'static str),
    /// Gravity must pull down (positive y)
    GravityNotDownward(f32),
    /// The jump impulse must point up (negative y)
    JumpNotUpward(f32),
    /// The bird does not fit inside the viewport
    BirdOutOfBounds,
    /// No room left for the gap center band
    GapMarginTooLarge { margin: f32, height: f32 },
    /// The gap would reach past the top or bottom edge
    GapMarginTooSmall { margin: f32, half_gap: f32 },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::NotFinite(field) => write!(f, "tuning field `{}` is not finite", field),
            TuningError::NonPositive(field) => {
                write!(f, "tuning field `{}` must be positive", field)
            }
            TuningError::GravityNotDownward(g) => write!(f, "gravity must be positive, got {}", g),
            TuningError::JumpNotUpward(j) => write!(f, "jump must be negative, got {}", j),
            TuningError::BirdOutOfBounds => write!(f, "bird does not fit inside the viewport"),
            TuningError::GapMarginTooLarge { margin, height } => write!(
                f,
                "gap margin {} leaves no room in a viewport of height {}",
                margin, height
            ),
            TuningError::GapMarginTooSmall { margin, half_gap } => write!(
                f,
                "gap margin {} is smaller than half the gap ({})",
                margin, half_gap
            ),
        }
    }
}

impl std::error::Error for TuningError {}

/// Physics and layout constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Viewport width (pixels)
    pub width: f32,
    /// Viewport height (pixels)
    pub height: f32,
    /// Fixed horizontal position of the bird center
    pub bird_x: f32,
    /// Bird collision radius
    pub bird_radius: f32,
    /// Downward acceleration per tick
    pub gravity: f32,
    /// Velocity set by an impulse (negative = up)
    pub jump: f32,
    /// Pipe width
    pub pipe_width: f32,
    /// Vertical size of the gap between the two pipe bodies
    pub pipe_gap: f32,
    /// Leftward pipe speed per tick
    pub pipe_speed: f32,
    /// Ticks between pipe spawns
    pub pipe_interval: u32,
    /// Minimum distance from either edge to the gap center
    pub gap_margin: f32,
    /// Pipes spawn this far past the right edge
    pub spawn_offset: f32,
    /// Pipes are dropped this far past the left edge
    pub cull_margin: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 560.0,
            bird_x: 70.0,
            bird_radius: 14.0,
            gravity: 0.45,
            jump: -8.5,
            pipe_width: 56.0,
            pipe_gap: 160.0,
            pipe_speed: 2.8,
            pipe_interval: 100,
            gap_margin: 150.0,
            spawn_offset: 10.0,
            cull_margin: 10.0,
        }
    }
}

impl Tuning {
    /// Parse a tuning from JSON (missing fields take defaults) and validate it
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would produce undefined physics
    pub fn validate(&self) -> Result<(), TuningError> {
        let floats = [
            ("width", self.width),
            ("height", self.height),
            ("bird_x", self.bird_x),
            ("bird_radius", self.bird_radius),
            ("gravity", self.gravity),
            ("jump", self.jump),
            ("pipe_width", self.pipe_width),
            ("pipe_gap", self.pipe_gap),
            ("pipe_speed", self.pipe_speed),
            ("gap_margin", self.gap_margin),
            ("spawn_offset", self.spawn_offset),
            ("cull_margin", self.cull_margin),
        ];
        if let Some(&(name, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TuningError::NotFinite(name));
        }

        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("bird_radius", self.bird_radius),
            ("pipe_width", self.pipe_width),
            ("pipe_gap", self.pipe_gap),
            ("pipe_speed", self.pipe_speed),
        ];
        if let Some(&(name, _)) = positive.iter().find(|(_, v)| *v <= 0.0) {
            return Err(TuningError::NonPositive(name));
        }
        if self.pipe_interval == 0 {
            return Err(TuningError::NonPositive("pipe_interval"));
        }
        if self.spawn_offset < 0.0 {
            return Err(TuningError::NonPositive("spawn_offset"));
        }
        if self.cull_margin < 0.0 {
            return Err(TuningError::NonPositive("cull_margin"));
        }

        if self.gravity <= 0.0 {
            return Err(TuningError::GravityNotDownward(self.gravity));
        }
        if self.jump >= 0.0 {
            return Err(TuningError::JumpNotUpward(self.jump));
        }

        let fits_x = self.bird_x - self.bird_radius >= 0.0
            && self.bird_x + self.bird_radius <= self.width;
        if !fits_x || self.bird_radius * 2.0 >= self.height {
            return Err(TuningError::BirdOutOfBounds);
        }

        if self.gap_margin * 2.0 > self.height {
            return Err(TuningError::GapMarginTooLarge {
                margin: self.gap_margin,
                height: self.height,
            });
        }
        let half_gap = self.pipe_gap / 2.0;
        if self.gap_margin < half_gap {
            return Err(TuningError::GapMarginTooSmall {
                margin: self.gap_margin,
                half_gap,
            });
        }

        Ok(())
    }

    /// Starting vertical position of the bird
    #[inline]
    pub fn bird_start_y(&self) -> f32 {
        self.height / 2.0
    }

    /// Width of the band the gap center is drawn from
    #[inline]
    pub fn gap_band(&self) -> f32 {
        self.height - self.gap_margin * 2.0
    }
}
