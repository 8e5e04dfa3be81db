//! Brick Arcade headless runner
//!
//! Drives a session with an autopilot paddle and logs what happens. The
//! browser build embeds the library instead and renders from the event stream.
//!
//! Usage: `brick-arcade [seed] [seconds]`
//! Settings JSON may be supplied through `BRICK_ARCADE_SETTINGS`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use brick_arcade::audio::{AudioSink, play_event};
    use brick_arcade::sim::Key;
    use brick_arcade::{SessionEvent, SessionOrchestrator, SessionPhase, Settings, Tick};

    /// Sink that only logs the notes it would play
    struct LogSink {
        notes: usize,
    }

    impl AudioSink for LogSink {
        fn play_tone(&mut self, freq_hz: f32, duration_ms: f32) {
            self.notes += 1;
            log::trace!("tone {:.1}Hz for {}ms", freq_hz, duration_ms);
        }
    }

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5eed);
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(120.0);

    let settings_json = std::env::var("BRICK_ARCADE_SETTINGS").ok();
    let settings = Settings::load_or_default(settings_json.as_deref());

    log::info!("Brick Arcade (headless) starting...");
    let mut session = SessionOrchestrator::new(settings, seed);
    let mut sink = LogSink { notes: 0 };
    let mut bricks_broken = 0usize;
    let mut bosses = 0u32;

    let frame_ms = 1000.0 / 60.0;
    let mut now_ms = 0.0;
    session.input_mut().key_down(Key::Enter);

    while now_ms < seconds * 1000.0 {
        now_ms += frame_ms;

        // Autopilot: keep the paddle under the ball
        let dx = session.ball().pos.x - session.paddle().pos.x;
        let input = session.input_mut();
        input.release_keys();
        if dx < -8.0 {
            input.key_down(Key::ArrowLeft);
        } else if dx > 8.0 {
            input.key_down(Key::ArrowRight);
        }
        if dx.abs() > 120.0 {
            input.key_down(Key::Shift);
        }

        session.update(Tick::new(now_ms, frame_ms));

        for event in session.drain_events() {
            play_event(&event, &mut sink);
            match event {
                SessionEvent::BrickDestroyed { .. } => bricks_broken += 1,
                SessionEvent::BossDefeated { boss_number, bonus } => {
                    bosses = boss_number;
                    log::info!("Boss {} down (+{})", boss_number, bonus);
                }
                SessionEvent::LivesChanged { lives } => log::info!("Lives: {}", lives),
                _ => {}
            }
        }

        if session.phase() == SessionPhase::GameOver {
            break;
        }
    }

    let snapshot = session.snapshot();
    log::info!(
        "Finished in {:?}: score {}, lives {}, {:.1}s played, {} bricks broken, {} bosses, {} notes",
        snapshot.phase,
        snapshot.score,
        snapshot.lives,
        snapshot.elapsed_ms / 1000.0,
        bricks_broken,
        bosses,
        sink.notes
    );
    session.destroy();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser host embeds the library directly
}
