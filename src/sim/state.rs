//! Session state and entity types
//!
//! Entities here are the session's own view of the play field. The renderer
//! mirrors them from the [`SessionEvent`] stream.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Field is laid out, waiting for a start intent
    NotStarted,
    /// Active gameplay (a boss battle may be running)
    Playing,
    /// Game is paused
    Paused,
    /// Run ended, waiting for a restart intent
    GameOver,
    /// Torn down; every entry point is a no-op
    Destroyed,
}

/// Score, lives and phase - everything a restart puts back to defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub score: u64,
    pub lives: u8,
    pub phase: SessionPhase,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            score: 0,
            lives: INITIAL_LIVES,
            phase: SessionPhase::NotStarted,
        }
    }
}

/// The player's paddle (position is its center)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub width: f32,
    pub height: f32,
    pub jumping: bool,
}

impl Default for Paddle {
    fn default() -> Self {
        Self {
            pos: Vec2::new(FIELD_WIDTH / 2.0, PADDLE_GROUND_Y),
            vel: Vec2::ZERO,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
            jumping: false,
        }
    }
}

impl Paddle {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.pos, self.width, self.height)
    }

    /// Where a serving ball sits
    pub fn serve_point(&self, ball_radius: f32) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y - self.height / 2.0 - ball_radius - 2.0)
    }
}

/// Main ball lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    /// Resting on the paddle before the session starts
    Serving,
    /// Moving with collisions enabled
    InPlay,
    /// Fell below the death line; parked off-field until the death resolves
    Lost,
    /// Back above the paddle, waiting to relaunch
    Respawning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub state: BallState,
}

impl Ball {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            state: BallState::Serving,
        }
    }

    pub fn collisions_enabled(&self) -> bool {
        self.state == BallState::InPlay
    }
}

/// Bonus ball dropped by the periodic spawner; never costs a life
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialBall {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Boss this ball can hit: the one on screen when it spawned, if any.
    /// Later bosses are different entities and never match.
    pub boss_collider: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: EntityId,
    pub rect: Rect,
    pub family: String,
    /// Texture key, e.g. `stone-24`
    pub texture: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub id: EntityId,
    pub rect: Rect,
    pub family: String,
    pub collider_enabled: bool,
}

/// Everything the renderer, HUD and audio collaborators react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    PhaseChanged { from: SessionPhase, to: SessionPhase },
    ScoreChanged { score: u64, delta: u64 },
    LivesChanged { lives: u8 },
    BrickSpawned { id: EntityId, rect: Rect, texture: String },
    BrickDestroyed { id: EntityId },
    /// Fade these bricks out and remove them
    BricksFadeOut { ids: Vec<EntityId> },
    /// Fade freshly spawned bricks in
    BricksFadeIn { ids: Vec<EntityId> },
    AllClearBonus { bonus: u64 },
    BallLaunched { pos: Vec2, vel: Vec2 },
    BallLost,
    BallRespawned { pos: Vec2 },
    SpecialBallSpawned { id: EntityId, pos: Vec2 },
    SpecialBallDestroyed { id: EntityId },
    BossIncoming { boss_number: u32 },
    BossSpawned { id: EntityId, rect: Rect, family: String, max_hits: u32 },
    BossHit { hits: u32, max_hits: u32 },
    BossFlash { on: bool },
    BossDefeated { boss_number: u32, bonus: u64 },
    BossRemoved { id: EntityId },
    PaddleJumped,
    PaddleLanded { airtime_ms: f64 },
    CameraShake { duration_ms: f64, intensity: f32 },
    /// Play a hit note; only emitted while sound is on and the window visible
    HitSound { freq_hz: f32 },
}

/// Read-only view for HUD collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub score: u64,
    pub lives: u8,
    pub elapsed_ms: f64,
    pub boss_battle: bool,
    pub boss_number: u32,
    pub boss_hits: Option<(u32, u32)>,
    pub bricks: usize,
    pub special_balls: usize,
}

/// Monotonic entity id allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIds {
    next: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}
