//! Session controller
//!
//! Owns one game instance and is the only thing hosts talk to. Host input is
//! reduced to `request_impulse`, `start`, `reset` and `close`; the host's
//! frame callback calls `advance` (or `tick`) and then `frame`.
//!
//! Hosts and the tick loop share one thread. A host with concurrent input
//! delivery must marshal calls onto the loop's thread first.

use serde::Serialize;

use crate::consts::*;
use crate::renderer::{Frame, FrameView, compose};
use crate::scores::{SaveStatus, SaveTracker, ScoreSubmitter};
use crate::settings::Settings;
use crate::sim::{self, Collision, GameEvent, GamePhase, GameState, TickInput};
use crate::tuning::{Tuning, TuningError};

/// Golden-ratio increment used to derive per-run seeds
const SEED_STEP: u64 = 0x9E37_79B9_7F4A_7C15;

/// Outcome of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub final_score: u32,
    /// Personal best as known when the run ended
    pub personal_best: u32,
    /// Final score beats the personal best
    pub new_record: bool,
}

impl RunSummary {
    pub fn new(final_score: u32, personal_best: u32) -> Self {
        Self {
            final_score,
            personal_best,
            new_record: final_score > personal_best,
        }
    }
}

/// One embedded game instance
pub struct Session {
    tuning: Tuning,
    settings: Settings,
    state: GameState,
    submitter: Box<dyn ScoreSubmitter>,
    saves: SaveTracker,
    personal_best: u32,
    summary: Option<RunSummary>,
    /// Impulse requested since the last tick (coalesced, not counted)
    pending_impulse: bool,
    closed: bool,
    accumulator: f32,
    base_seed: u64,
    runs: u64,
}

impl Session {
    /// Build a session; a malformed tuning fails here rather than mid-run
    pub fn new(
        tuning: Tuning,
        settings: Settings,
        personal_best: u32,
        seed: u64,
        submitter: Box<dyn ScoreSubmitter>,
    ) -> Result<Self, TuningError> {
        tuning.validate()?;
        let state = GameState::new(seed, &tuning, settings.max_particles());
        log::info!(
            "Session created (seed {}, personal best {})",
            seed,
            personal_best
        );
        Ok(Self {
            tuning,
            settings,
            state,
            submitter,
            saves: SaveTracker::new(),
            personal_best,
            summary: None,
            pending_impulse: false,
            closed: false,
            accumulator: 0.0,
            base_seed: seed,
            runs: 0,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn personal_best(&self) -> u32 {
        self.personal_best
    }

    pub fn save_status(&self) -> SaveStatus {
        self.saves.status()
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.summary
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Leave Idle without an impulse; idempotent while Playing
    pub fn start(&mut self) {
        if self.closed {
            log::debug!("start() after close ignored");
            return;
        }
        match self.state.phase {
            GamePhase::Idle => {
                self.state.phase = GamePhase::Playing;
                log::info!("Run started (seed {})", self.state.seed);
            }
            GamePhase::Playing => {}
            GamePhase::Ended => log::debug!("start() while ended ignored; reset first"),
        }
    }

    /// Normalized input from any device
    ///
    /// Idle: start and flap. Playing: flap on the next tick. Ended or closed:
    /// ignored.
    pub fn request_impulse(&mut self) {
        if self.closed {
            return;
        }
        match self.state.phase {
            GamePhase::Idle => {
                self.start();
                self.pending_impulse = true;
            }
            GamePhase::Playing => self.pending_impulse = true,
            GamePhase::Ended => {}
        }
    }

    /// Run exactly one simulation step
    pub fn tick(&mut self) {
        if self.closed || !self.state.is_running() {
            return;
        }
        let input = TickInput {
            impulse: std::mem::take(&mut self.pending_impulse),
        };
        if let Some(hit) = sim::tick(&mut self.state, &input, &self.tuning) {
            self.finish(hit);
        }
    }

    /// Host frame entry point: run as many fixed steps as `dt` seconds cover
    ///
    /// Returns the number of ticks executed. Time is not banked outside
    /// Playing.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if self.closed {
            return 0;
        }
        if !self.state.is_running() {
            self.accumulator = 0.0;
            return 0;
        }

        // Non-finite deltas count as zero
        self.accumulator += if dt.is_finite() { dt.clamp(0.0, 0.1) } else { 0.0 };
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.tick();
            self.accumulator -= SIM_DT;
            substeps += 1;
            if !self.state.is_running() {
                self.accumulator = 0.0;
                break;
            }
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog instead of spiraling
            self.accumulator = 0.0;
        }
        substeps
    }

    /// Ended -> Idle with a fresh world; ignored in other phases
    pub fn reset(&mut self) {
        if self.closed {
            log::debug!("reset() after close ignored");
            return;
        }
        if self.state.phase != GamePhase::Ended {
            log::debug!("reset() ignored in {:?}", self.state.phase);
            return;
        }

        self.runs += 1;
        let seed = self
            .base_seed
            .wrapping_add(self.runs.wrapping_mul(SEED_STEP));
        self.saves.detach();
        self.state = GameState::new(seed, &self.tuning, self.settings.max_particles());
        self.summary = None;
        self.pending_impulse = false;
        self.accumulator = 0.0;
        log::info!("Session reset (run {}, seed {})", self.runs, seed);
    }

    /// Stop reacting to anything; idempotent
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.pending_impulse = false;
        log::info!("Session closed in {:?}", self.state.phase);
    }

    /// Host-supplied refresh of the personal best
    pub fn set_personal_best(&mut self, best: u32) {
        self.personal_best = best;
    }

    /// Swap presentation settings; gameplay is unaffected
    pub fn apply_settings(&mut self, settings: Settings) {
        self.state.particles.set_limit(settings.max_particles());
        self.settings = settings;
    }

    /// Gameplay events since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    /// Read-only view handed to the renderer
    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            state: &self.state,
            tuning: &self.tuning,
            settings: &self.settings,
            personal_best: self.personal_best,
            save_status: self.saves.status(),
            summary: self.summary,
        }
    }

    /// Compose the current frame
    pub fn frame(&self) -> Frame {
        compose(&self.view())
    }

    fn finish(&mut self, hit: Collision) {
        let summary = RunSummary::new(self.state.score, self.personal_best);
        log::info!(
            "Run ended by {:?} at frame {} with score {}{}",
            hit,
            self.state.frame,
            summary.final_score,
            if summary.new_record { " (new record)" } else { "" }
        );
        self.summary = Some(summary);
        let ticket = self.saves.begin(summary.final_score);
        self.submitter.submit(summary.final_score, ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::{ScoreBook, SharedScoreBook, SubmitError, SubmitTicket};
    use crate::sim::{Bird, Pipe};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records submissions; tickets are held until the test settles them
    #[derive(Default)]
    struct Recorder {
        scores: Vec<u32>,
        tickets: Vec<SubmitTicket>,
    }

    struct RecordingSubmitter(Rc<RefCell<Recorder>>);

    impl ScoreSubmitter for RecordingSubmitter {
        fn submit(&mut self, score: u32, ticket: SubmitTicket) {
            let mut rec = self.0.borrow_mut();
            rec.scores.push(score);
            rec.tickets.push(ticket);
        }
    }

    fn session_with(tuning: Tuning) -> (Session, Rc<RefCell<Recorder>>) {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let session = Session::new(
            tuning,
            Settings::default(),
            5,
            42,
            Box::new(RecordingSubmitter(Rc::clone(&recorder))),
        )
        .expect("valid tuning");
        (session, recorder)
    }

    fn session() -> (Session, Rc<RefCell<Recorder>>) {
        session_with(Tuning::default())
    }

    fn crash(session: &mut Session) {
        session.start();
        for _ in 0..200 {
            session.tick();
        }
        assert_eq!(session.phase(), GamePhase::Ended);
    }

    #[test]
    fn test_rejects_bad_tuning() {
        let tuning = Tuning {
            pipe_gap: -10.0,
            ..Default::default()
        };
        let result = Session::new(
            tuning,
            Settings::default(),
            0,
            1,
            Box::new(crate::scores::ScoreBook::new("ana")),
        );
        assert!(matches!(result, Err(TuningError::NonPositive("pipe_gap"))));
    }

    #[test]
    fn test_falls_to_floor_and_submits_once() {
        let tuning = Tuning {
            gravity: 0.45,
            jump: -8.5,
            pipe_speed: 2.8,
            pipe_interval: 100,
            ..Default::default()
        };
        let (mut session, recorder) = session_with(tuning);
        assert_eq!(session.state().bird.y, 280.0);

        session.start();
        for _ in 0..100 {
            session.tick();
        }

        assert_eq!(session.phase(), GamePhase::Ended);
        let bird = session.state().bird;
        assert!(bird.y + session.tuning().bird_radius > session.tuning().height);
        assert_eq!(session.score(), 0);
        assert_eq!(recorder.borrow().scores, vec![0]);
        assert_eq!(session.save_status(), SaveStatus::Saving);
        assert_eq!(
            session.summary(),
            Some(RunSummary {
                final_score: 0,
                personal_best: 5,
                new_record: false
            })
        );
    }

    #[test]
    fn test_impulses_coalesce() {
        let (mut session, _) = session();
        session.start();
        for _ in 0..5 {
            session.tick();
        }

        session.request_impulse();
        session.request_impulse();
        session.request_impulse();
        let y = session.state().bird.y;
        session.tick();

        let tuning = session.tuning().clone();
        let vy = tuning.jump + tuning.gravity;
        assert!((session.state().bird.vy - vy).abs() < 1e-5);
        assert!((session.state().bird.y - (y + vy)).abs() < 1e-4);
        let flaps = session
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::Flap)
            .count();
        assert_eq!(flaps, 1);

        // Nothing left over for the following tick
        session.tick();
        assert!((session.state().bird.vy - (vy + tuning.gravity)).abs() < 1e-5);
    }

    #[test]
    fn test_first_input_starts_and_flaps() {
        let (mut session, _) = session();
        assert_eq!(session.phase(), GamePhase::Idle);
        session.request_impulse();
        assert_eq!(session.phase(), GamePhase::Playing);

        session.tick();
        let tuning = session.tuning();
        assert!((session.state().bird.vy - (tuning.jump + tuning.gravity)).abs() < 1e-5);
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut session, _) = session();
        session.start();
        session.tick();
        let frame = session.state().frame;
        session.start();
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.state().frame, frame);
    }

    #[test]
    fn test_idle_ticks_do_nothing() {
        let (mut session, _) = session();
        for _ in 0..10 {
            session.tick();
        }
        assert_eq!(session.advance(1.0), 0);
        assert_eq!(session.state().frame, 0);
        assert_eq!(session.state().bird, Bird::new(session.tuning()));
    }

    #[test]
    fn test_ended_is_frozen_and_ignores_input() {
        let (mut session, recorder) = session();
        crash(&mut session);
        let bird = session.state().bird;
        let frame = session.state().frame;

        session.request_impulse();
        session.start();
        for _ in 0..10 {
            session.tick();
        }
        session.advance(0.5);

        assert_eq!(session.phase(), GamePhase::Ended);
        assert_eq!(session.state().bird, bird);
        assert_eq!(session.state().frame, frame);
        assert_eq!(recorder.borrow().scores.len(), 1);
    }

    #[test]
    fn test_reset_restores_idle() {
        let (mut session, _) = session();
        session.start();
        session.state.pipes.push(Pipe {
            x: 60.0,
            gap_y: 450.0,
            passed: false,
        });
        session.request_impulse();
        session.tick();
        assert_eq!(session.phase(), GamePhase::Ended);
        assert!(!session.state().particles.is_empty());

        session.reset();
        let state = session.state();
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(state.pipes.is_empty());
        assert!(state.particles.is_empty());
        assert!(state.events.is_empty());
        assert_eq!(state.frame, 0);
        assert_eq!(state.score, 0);
        assert_eq!(state.bird, Bird::new(session.tuning()));
        assert_ne!(state.seed, 42);
        assert_eq!(session.summary(), None);
        assert_eq!(session.save_status(), SaveStatus::Idle);
    }

    #[test]
    fn test_reset_outside_ended_is_ignored() {
        let (mut session, _) = session();
        session.start();
        session.tick();
        session.reset();
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.state().frame, 1);
    }

    #[test]
    fn test_late_submission_after_reset() {
        let (mut session, recorder) = session();
        crash(&mut session);
        session.reset();

        let ticket = recorder.borrow_mut().tickets.pop().expect("ticket");
        ticket.complete(Err(SubmitError::Unavailable));
        assert_eq!(session.save_status(), SaveStatus::Idle);

        // The next run submits normally
        crash(&mut session);
        assert_eq!(recorder.borrow().scores.len(), 2);
        let ticket = recorder.borrow_mut().tickets.pop().expect("ticket");
        ticket.complete(Ok(()));
        assert_eq!(session.save_status(), SaveStatus::Saved);
    }

    #[test]
    fn test_failed_submission_is_non_fatal() {
        let (mut session, recorder) = session();
        crash(&mut session);
        let ticket = recorder.borrow_mut().tickets.pop().expect("ticket");
        ticket.complete(Err(SubmitError::Rejected("quota".into())));

        assert_eq!(session.save_status(), SaveStatus::Failed);
        let overlay = session.frame().overlay;
        let panel = overlay.summary.expect("summary");
        assert!(panel.save_failed);
        assert!(panel.retry);

        session.reset();
        assert_eq!(session.phase(), GamePhase::Idle);
    }

    #[test]
    fn test_close_stops_everything() {
        let (mut session, recorder) = session();
        session.start();
        session.tick();
        session.close();
        let before = session.state().clone();

        // Late frame callbacks and input after teardown
        for _ in 0..300 {
            session.tick();
            session.advance(SIM_DT);
        }
        session.request_impulse();
        session.reset();
        session.start();
        session.close();

        let after = session.state();
        assert_eq!(after.phase, before.phase);
        assert_eq!(after.frame, before.frame);
        assert_eq!(after.bird, before.bird);
        assert_eq!(after.pipes, before.pipes);
        assert!(recorder.borrow().scores.is_empty());
        assert!(session.is_closed());
    }

    #[test]
    fn test_advance_runs_fixed_steps() {
        let (mut session, _) = session();
        session.start();
        assert_eq!(session.advance(SIM_DT * 0.5), 0);
        assert_eq!(session.advance(SIM_DT * 0.6), 1);
        assert_eq!(session.advance(SIM_DT * 3.0), 3);
        // A long stall is clamped to 0.1s worth of ticks
        assert_eq!(session.advance(10.0), 6);
        assert_eq!(session.state().frame, 10);
    }

    #[test]
    fn test_new_record_uses_supplied_best() {
        let (mut session, _) = session();
        session.set_personal_best(0);
        session.start();
        session.state.score = 3;
        session.state.bird = Bird { y: 600.0, vy: 0.0 };
        session.tick();
        let summary = session.summary().expect("ended");
        assert_eq!(summary.final_score, 3);
        assert!(summary.new_record);
        // The core never bumps the best on its own
        assert_eq!(session.personal_best(), 0);
    }

    #[test]
    fn test_book_best_refreshes_between_runs() {
        let book = SharedScoreBook::new(ScoreBook::new("ana"));
        let mut session = Session::new(
            Tuning::default(),
            Settings::default(),
            book.own_best(),
            9,
            Box::new(book.clone()),
        )
        .expect("valid tuning");

        let mut runs = Vec::new();
        for _ in 0..2 {
            session.set_personal_best(session.personal_best().max(book.own_best()));
            session.start();
            session.state.score = 1;
            session.state.bird = Bird { y: 600.0, vy: 0.0 };
            session.tick();
            runs.push(session.summary().expect("ended"));
            session.reset();
        }

        assert_eq!(runs[0], RunSummary::new(1, 0));
        assert!(runs[0].new_record);
        // Matching the stored best is not a record
        assert_eq!(runs[1], RunSummary::new(1, 1));
        assert!(!runs[1].new_record);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_advance_ignores_bad_delta() {
        let (mut session, _) = session();
        session.start();
        assert_eq!(session.advance(f32::NAN), 0);
        assert_eq!(session.advance(f32::INFINITY), 0);
        assert_eq!(session.advance(SIM_DT * 1.5), 1);
        assert_eq!(session.state().frame, 1);
    }

    #[test]
    fn test_disabling_particles_keeps_outcome() {
        let play = |particles: bool| {
            let recorder = Rc::new(RefCell::new(Recorder::default()));
            let settings = Settings {
                particles,
                ..Default::default()
            };
            let mut session = Session::new(
                Tuning::default(),
                settings,
                0,
                777,
                Box::new(RecordingSubmitter(Rc::clone(&recorder))),
            )
            .expect("valid tuning");
            session.start();
            for i in 0..2000 {
                if session.state().bird.y > 300.0 && i % 3 == 0 {
                    session.request_impulse();
                }
                session.tick();
            }
            let scores = recorder.borrow().scores.clone();
            (session.state().frame, session.score(), scores)
        };
        assert_eq!(play(true), play(false));
    }
}
