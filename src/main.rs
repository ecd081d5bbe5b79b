//! Flappy Pinta entry point
//!
//! The browser build is a library (`FlappyGame`); this binary is a native
//! headless demo that plays a few runs with a simple autopilot.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use flappy_pinta::sim::{GameEvent, GameState};
    use flappy_pinta::{ScoreBook, Session, Settings, SharedScoreBook, Tuning};

    /// Flap once the bird sinks below the center of the next gap
    fn wants_flap(state: &GameState, tuning: &Tuning) -> bool {
        let target = state
            .pipes
            .iter()
            .find(|p| p.trailing_edge(tuning) >= tuning.bird_x - tuning.bird_radius)
            .map_or(tuning.bird_start_y(), |p| p.gap_y + tuning.pipe_gap / 6.0);
        state.bird.vy > 0.0 && state.bird.y > target
    }

    env_logger::init();
    log::info!("Flappy Pinta (native) starting...");
    log::info!("The playable build is the wasm library; running the headless autopilot");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(2024_u64);
    let runs = args.next().and_then(|s| s.parse().ok()).unwrap_or(3_u32);

    let book = SharedScoreBook::new(ScoreBook::load("autopilot"));
    let tuning = Tuning::default();
    let mut session = match Session::new(
        tuning,
        Settings::default(),
        0,
        seed,
        Box::new(book.clone()),
    ) {
        Ok(session) => session,
        Err(e) => {
            log::error!("Invalid tuning: {}", e);
            std::process::exit(1);
        }
    };

    // Cap each run at ten simulated minutes
    const MAX_TICKS: u32 = 60 * 60 * 10;

    for run in 1..=runs {
        session.set_personal_best(book.own_best());
        session.start();

        let mut ticks = 0;
        let mut flaps = 0;
        while session.state().is_running() && ticks < MAX_TICKS {
            if wants_flap(session.state(), session.tuning()) {
                session.request_impulse();
            }
            session.tick();
            ticks += 1;
            flaps += session
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::Flap))
                .count();
        }
        log::debug!("Run {} used {} flaps", run, flaps);

        let Some(summary) = session.summary() else {
            log::info!("Run {} still alive after {} ticks, stopping", run, ticks);
            break;
        };
        println!(
            "run {}: score {} in {} ticks{}",
            run,
            summary.final_score,
            ticks,
            if summary.new_record { " (new best)" } else { "" }
        );
        session.reset();
    }

    session.close();
    println!("best: {}", book.own_best());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is FlappyGame, this is just to satisfy the compiler
}
