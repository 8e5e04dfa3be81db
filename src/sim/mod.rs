//! Session simulation module
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Host time arrives through `Tick`, never read from the system
//! - No rendering or platform dependencies

pub mod boss;
pub mod brick_field;
pub mod clock;
pub mod geometry;
pub mod input;
pub mod scoring;
pub mod session;
pub mod state;
pub mod tick;
pub mod timers;

pub use boss::{BossEncounter, BossEvent, BossPhase, BossRecord, BossSpawn};
pub use brick_field::{AspectCatalog, AspectInfo, BrickField, Placement};
pub use clock::SessionClock;
pub use geometry::{Contact, Rect};
pub use input::{InputContext, InputController, Intent, Key, PadButton};
pub use session::{SessionOrchestrator, paddle_deflection};
pub use state::{
    Ball, BallState, Boss, Brick, EntityId, Paddle, SessionEvent, SessionPhase, SessionSnapshot,
    SessionState, SpecialBall,
};
pub use tick::Tick;
pub use timers::{Scheduler, TimerKind};
