//! Brick Arcade - session core for a brick-breaker mini-game
//!
//! Core modules:
//! - `sim`: Deterministic session simulation (state machines, packing, collisions)
//! - `platform`: Window visibility tracking
//! - `settings`: Flat user settings object (JSON)
//! - `audio`: Hit-sound gating and note selection
//!
//! Rendering, tweens, particles and audio synthesis stay outside the crate.
//! They consume the [`sim::SessionEvent`] stream drained from a session.

pub mod audio;
pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::{BaseKey, MusicalScale, Settings, SoundSettings};
pub use sim::{Intent, SessionEvent, SessionOrchestrator, SessionPhase, Tick};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation step in milliseconds (120 Hz)
    pub const SIM_DT_MS: f64 = 1000.0 / 120.0;
    /// Longest frame delta accepted before clamping (tab switches, debugger stalls)
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Play field dimensions (y grows downward)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;
    /// Anything falling past this line is lost
    pub const DEATH_LINE_Y: f32 = FIELD_HEIGHT + 40.0;

    /// Region bricks are packed into
    pub const BRICK_AREA_X: f32 = 20.0;
    pub const BRICK_AREA_Y: f32 = 70.0;
    pub const BRICK_AREA_WIDTH: f32 = 760.0;
    pub const BRICK_AREA_HEIGHT: f32 = 300.0;
    /// Empty space kept around every brick
    pub const BRICK_MARGIN: f32 = 8.0;

    /// Packing search budgets
    pub const PACK_MAX_ATTEMPTS: u32 = 2000;
    pub const PACK_MAX_CONSECUTIVE_FAILURES: u32 = 100;
    pub const ADD_ONE_MAX_ATTEMPTS: u32 = 100;

    /// Logical brick heights and their draw weights (small bricks dominate)
    pub const BRICK_SIZES: [f32; 7] = [16.0, 20.0, 24.0, 32.0, 40.0, 48.0, 64.0];
    pub const BRICK_SIZE_WEIGHTS: [u32; 7] = [34, 24, 16, 11, 7, 5, 3];
    /// Heights we ship textures for
    pub const BRICK_ASSET_SIZES: [u32; 5] = [16, 24, 32, 48, 64];

    /// Paddle defaults (position is the paddle center)
    pub const PADDLE_WIDTH: f32 = 110.0;
    pub const PADDLE_HEIGHT: f32 = 18.0;
    pub const PADDLE_GROUND_Y: f32 = 560.0;
    pub const PADDLE_SPEED: f32 = 420.0;
    pub const PADDLE_FAST_SPEED: f32 = 760.0;
    /// Fraction of paddle velocity transferred to the ball on contact
    pub const PADDLE_ENGLISH: f32 = 0.3;

    /// Jump physics (pixels/s, pixels/s²)
    pub const JUMP_SPEED: f32 = 520.0;
    pub const GRAVITY: f32 = 1400.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    pub const BALL_SPEED: f32 = 350.0;
    /// Half-angle of the launch cone around straight up (radians, 30°)
    pub const BALL_LAUNCH_HALF_ANGLE: f32 = std::f32::consts::PI / 6.0;
    /// Minimum upward speed after a paddle hit
    pub const BALL_MIN_UP_SPEED: f32 = 220.0;

    /// Special ball defaults
    pub const SPECIAL_BALL_RADIUS: f32 = 10.0;
    pub const SPECIAL_BALL_SPEED: f32 = 300.0;

    /// Lives at session start
    pub const INITIAL_LIVES: u8 = 3;

    /// Timer intervals and delays (milliseconds)
    pub const BRICK_SPAWN_INTERVAL_MS: f64 = 5000.0;
    pub const SPECIAL_BALL_INTERVAL_MS: f64 = 30000.0;
    pub const BALL_DEATH_DELAY_MS: f64 = 1000.0;
    pub const BALL_RELAUNCH_DELAY_MS: f64 = 500.0;

    /// Boss encounter timing and footprint
    pub const BOSS_SPAWN_DELAY_MS: f64 = 1200.0;
    pub const BOSS_DEFEAT_DELAY_MS: f64 = 1500.0;
    pub const BOSS_FLASH_MS: f64 = 150.0;
    pub const BOSS_HEIGHT: f32 = 96.0;
    pub const BOSS_CENTER_X: f32 = FIELD_WIDTH / 2.0;
    pub const BOSS_CENTER_Y: f32 = 190.0;

    /// Scoring
    pub const ALL_CLEAR_BONUS: u64 = 100;
    pub const DEFAULT_BRICK_SCORE: u64 = 10;

    /// Camera shake requests (duration ms, intensity)
    pub const BRICK_SHAKE: (f64, f32) = (80.0, 0.002);
    pub const BOSS_HIT_SHAKE: (f64, f32) = (120.0, 0.006);
    pub const BOSS_DEFEAT_SHAKE: (f64, f32) = (400.0, 0.015);
}
