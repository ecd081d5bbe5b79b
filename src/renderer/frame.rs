//! Frame composition
//!
//! Turns a read-only view of the session into one complete frame: triangle
//! geometry for the GPU plus the overlay information the host paints as text.

use glam::{Affine2, Vec2};
use serde::Serialize;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::scores::SaveStatus;
use crate::session::RunSummary;
use crate::settings::Settings;
use crate::sim::{Bird, GamePhase, GameState, Pipe};
use crate::tuning::Tuning;

/// Star field seeds; positions are derived, not random
const STAR_SEEDS: [u32; 10] = [23, 67, 112, 198, 245, 310, 87, 155, 290, 40];

/// Pipe cap height and overhang
const CAP_HEIGHT: f32 = 20.0;
const CAP_OVERHANG: f32 = 4.0;
/// Body stops short of the gap so the cap covers its end
const CAP_INSET: f32 = 12.0;

/// Everything a frame may read, borrowed immutably
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub state: &'a GameState,
    pub tuning: &'a Tuning,
    pub settings: &'a Settings,
    pub personal_best: u32,
    pub save_status: SaveStatus,
    pub summary: Option<RunSummary>,
}

/// End-of-run panel contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryOverlay {
    pub final_score: u32,
    pub personal_best: u32,
    pub new_record: bool,
    /// Submission still in flight (spinner instead of retry)
    pub saving: bool,
    /// Submission failed; shown as a notice, play continues
    pub save_failed: bool,
    /// Retry affordance visible
    pub retry: bool,
}

/// Information that must be visible in the current phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overlay {
    pub phase: GamePhase,
    /// "Tap to fly" prompt (Idle)
    pub prompt: bool,
    /// Live score readout (Playing, Ended)
    pub score: Option<u32>,
    /// Personal best badge (always)
    pub personal_best: u32,
    /// Run summary (Ended)
    pub summary: Option<SummaryOverlay>,
}

/// One complete frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub vertices: Vec<Vertex>,
    pub overlay: Overlay,
}

/// Compose the frame for the current view
pub fn compose(view: &FrameView<'_>) -> Frame {
    let mut vertices = Vec::with_capacity(2048);
    let tuning = view.tuning;
    let segments = view.settings.quality.circle_segments();

    vertices.extend(shapes::rect_v_gradient(
        0.0,
        0.0,
        tuning.width,
        tuning.height,
        colors::SKY_TOP,
        colors::SKY_BOTTOM,
    ));

    if view.settings.quality.starfield_enabled() {
        for (i, seed) in STAR_SEEDS.iter().enumerate() {
            let (pos, radius) = star(*seed, i as u32, tuning);
            vertices.extend(shapes::circle(pos, radius, colors::STAR, 6));
        }
    }

    for pipe in &view.state.pipes {
        draw_pipe(&mut vertices, pipe, tuning);
    }

    draw_bird(&mut vertices, view, segments);

    for p in view.state.particles.iter() {
        let color = colors::with_alpha(colors::particle(p.color), p.life.clamp(0.0, 1.0));
        vertices.extend(shapes::circle(p.pos, 3.0 * p.life.max(0.0), color, 8));
    }

    match view.state.phase {
        GamePhase::Idle => vertices.extend(shapes::rect(
            0.0,
            0.0,
            tuning.width,
            tuning.height,
            colors::IDLE_VEIL,
        )),
        GamePhase::Ended => vertices.extend(shapes::rect(
            0.0,
            0.0,
            tuning.width,
            tuning.height,
            colors::ENDED_VEIL,
        )),
        GamePhase::Playing => {}
    }

    Frame {
        vertices,
        overlay: overlay(view),
    }
}

/// Phase-dependent overlay information
pub fn overlay(view: &FrameView<'_>) -> Overlay {
    let phase = view.state.phase;
    let summary = match (phase, view.summary) {
        (GamePhase::Ended, Some(run)) => {
            let saving = view.save_status == SaveStatus::Saving;
            Some(SummaryOverlay {
                final_score: run.final_score,
                personal_best: run.personal_best,
                new_record: run.new_record,
                saving,
                save_failed: view.save_status == SaveStatus::Failed,
                retry: !saving,
            })
        }
        _ => None,
    };

    Overlay {
        phase,
        prompt: phase == GamePhase::Idle,
        score: match phase {
            GamePhase::Idle => None,
            GamePhase::Playing | GamePhase::Ended => Some(view.state.score),
        },
        personal_best: view.personal_best,
        summary,
    }
}

fn star(seed: u32, i: u32, tuning: &Tuning) -> (Vec2, f32) {
    let sx = ((seed * 37 + i * 53) as f32) % tuning.width;
    let sy = ((seed * 13 + i * 71) as f32) % (tuning.height * 0.6);
    let radius = 0.5 + ((seed * 7) % 10) as f32 / 10.0;
    (Vec2::new(sx, sy), radius)
}

fn draw_pipe(out: &mut Vec<Vertex>, pipe: &Pipe, tuning: &Tuning) {
    let w = tuning.pipe_width;
    let top_h = pipe.gap_top(tuning);
    let bot_y = pipe.gap_bottom(tuning);

    // Top half: body then cap hanging over the gap
    out.extend(shapes::rect_h_gradient(
        pipe.x,
        0.0,
        w,
        (top_h - CAP_INSET).max(0.0),
        colors::PIPE_LEFT,
        colors::PIPE_RIGHT,
    ));
    out.extend(shapes::rect(
        pipe.x - CAP_OVERHANG,
        top_h - CAP_HEIGHT,
        w + CAP_OVERHANG * 2.0,
        CAP_HEIGHT,
        colors::PIPE_CAP,
    ));

    // Bottom half
    out.extend(shapes::rect_h_gradient(
        pipe.x,
        bot_y + CAP_INSET,
        w,
        (tuning.height - bot_y - CAP_INSET).max(0.0),
        colors::PIPE_LEFT,
        colors::PIPE_RIGHT,
    ));
    out.extend(shapes::rect(
        pipe.x - CAP_OVERHANG,
        bot_y,
        w + CAP_OVERHANG * 2.0,
        CAP_HEIGHT,
        colors::PIPE_CAP,
    ));
}

/// Nose-up when rising, nose-down when falling
pub fn bird_tilt(bird: &Bird) -> f32 {
    (bird.vy / 12.0).clamp(-0.5, 0.8)
}

fn draw_bird(out: &mut Vec<Vertex>, view: &FrameView<'_>, segments: u32) {
    let state = view.state;
    let r = view.tuning.bird_radius;
    let reduced = view.settings.reduced_motion;
    let tilt = if reduced { 0.0 } else { bird_tilt(&state.bird) };
    let flutter = if reduced {
        0.0
    } else {
        (state.frame as f32 * 0.3).sin() * 3.0
    };

    // Built around the origin, then rotated into place
    let mut bird = Vec::with_capacity(segments as usize * 18);
    if state.phase == GamePhase::Playing && view.settings.effective_glow() {
        bird.extend(shapes::circle(Vec2::ZERO, r + 10.0, colors::BIRD_GLOW, segments));
    }
    bird.extend(shapes::circle(Vec2::ZERO, r, colors::BIRD_RIM, segments));
    bird.extend(shapes::circle(Vec2::new(-1.0, -1.0), r - 2.0, colors::BIRD_BODY, segments));
    bird.extend(shapes::ellipse(
        Vec2::new(-6.0, 4.0 + flutter),
        8.0,
        5.0,
        -0.3,
        colors::BIRD_BELLY,
        segments,
    ));
    bird.extend(shapes::circle(Vec2::new(7.0, -5.0), 5.0, colors::EYE_WHITE, segments));
    bird.extend(shapes::circle(Vec2::new(8.0, -4.0), 3.0, colors::PUPIL, segments));
    bird.extend(shapes::circle(Vec2::new(9.0, -5.0), 1.0, colors::EYE_WHITE, 6));
    bird.extend(shapes::triangle(
        Vec2::new(r, -2.0),
        Vec2::new(r + 8.0, 0.0),
        Vec2::new(r, 3.0),
        colors::BEAK,
    ));

    shapes::transform(
        &mut bird,
        Affine2::from_angle_translation(tilt, Vec2::new(view.tuning.bird_x, state.bird.y)),
    );
    out.extend(bird);
}
