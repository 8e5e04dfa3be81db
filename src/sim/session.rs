//! Session orchestration
//!
//! Owns the clock, the brick field, the boss encounter and every entity, and
//! sequences `NotStarted -> Playing <-> Paused -> GameOver -> NotStarted`.
//! Terminal and re-entrant transitions are guarded by explicit state checks:
//! calling them in the wrong state is a no-op, never an error.
//!
//! The per-frame `update` lives in `tick.rs`.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::boss::{BossEncounter, BossEvent};
use super::brick_field::{BrickField, Placement, default_brick_catalog};
use super::clock::SessionClock;
use super::geometry::Rect;
use super::input::InputController;
use super::scoring::score_for_texture;
use super::state::{
    Ball, BallState, Boss, Brick, EntityId, EntityIds, Paddle, SessionEvent, SessionPhase,
    SessionSnapshot, SessionState, SpecialBall,
};
use super::timers::{Scheduler, TimerKind};
use crate::audio::HitSounds;
use crate::consts::*;
use crate::platform::{VisibilityChange, VisibilityManager};
use crate::settings::{Settings, SettingsOutcome};

pub struct SessionOrchestrator {
    pub(super) state: SessionState,
    pub(super) clock: SessionClock,
    pub(super) field: BrickField,
    pub(super) boss: BossEncounter,
    pub(super) input: InputController,
    pub(super) scheduler: Scheduler,
    pub(super) visibility: VisibilityManager,
    pub(super) settings: Settings,
    pub(super) sounds: HitSounds,
    pub(super) rng: Pcg32,
    pub(super) ids: EntityIds,
    pub(super) paddle: Paddle,
    pub(super) ball: Ball,
    pub(super) special_balls: Vec<SpecialBall>,
    pub(super) bricks: Vec<Brick>,
    pub(super) boss_entity: Option<Boss>,
    pub(super) events: Vec<SessionEvent>,
    /// Latest host time seen by `update`
    pub(super) now_ms: f64,
    /// Unsimulated time carried to the next frame
    pub(super) accumulator_ms: f64,
    /// Host time at game over, freezes the elapsed display
    pub(super) ended_at_ms: Option<f64>,
}

impl SessionOrchestrator {
    /// Create a session and lay out the first brick field
    pub fn new(settings: Settings, seed: u64) -> Self {
        let mut field = BrickField::default();
        field.initialize_aspect_ratios(&default_brick_catalog());

        let mut input = InputController::default();
        input.set_virtual_pad_visible(settings.show_virtual_pad);

        let mut ids = EntityIds::default();
        let paddle = Paddle::default();
        let ball = Ball::new(ids.next_id(), paddle.serve_point(BALL_RADIUS));

        let mut session = Self {
            state: SessionState::default(),
            clock: SessionClock::new(),
            field,
            boss: BossEncounter::default(),
            input,
            scheduler: Scheduler::new(),
            visibility: VisibilityManager::new(),
            sounds: HitSounds::new(&settings.sound, seed.rotate_left(17)),
            settings,
            rng: Pcg32::seed_from_u64(seed),
            ids,
            paddle,
            ball,
            special_balls: Vec::new(),
            bricks: Vec::new(),
            boss_entity: None,
            events: Vec::new(),
            now_ms: 0.0,
            accumulator_ms: 0.0,
            ended_at_ms: None,
        };
        session.repack_field(false);
        log::info!("Session created with seed: {}", seed);
        session
    }

    // === Read access ===

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn lives(&self) -> u8 {
        self.state.lives
    }

    /// Orthogonal to pause: true from battle start until bricks return
    pub fn is_boss_battle(&self) -> bool {
        matches!(
            self.state.phase,
            SessionPhase::Playing | SessionPhase::Paused
        ) && self.boss.is_active()
    }

    pub fn boss(&self) -> &BossEncounter {
        &self.boss
    }

    pub fn boss_entity(&self) -> Option<&Boss> {
        self.boss_entity.as_ref()
    }

    pub fn field(&self) -> &BrickField {
        &self.field
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn paddle(&self) -> &Paddle {
        &self.paddle
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn special_balls(&self) -> &[SpecialBall] {
        &self.special_balls
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Physics debug drawing requested for this session
    pub fn debug_mode(&self) -> bool {
        self.settings.debug_mode
    }

    /// Host forwards raw keyboard/pointer events here
    pub fn input_mut(&mut self) -> &mut InputController {
        &mut self.input
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    /// Visible and focused, per the last host notifications
    pub fn window_visible(&self) -> bool {
        self.visibility.is_visible()
    }

    /// Unpaused play time in milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        match self.state.phase {
            SessionPhase::NotStarted | SessionPhase::Destroyed => 0.0,
            _ => self.clock.elapsed(self.ended_at_ms.unwrap_or(self.now_ms)),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.state.phase,
            score: self.state.score,
            lives: self.state.lives,
            elapsed_ms: self.elapsed_ms(),
            boss_battle: self.is_boss_battle(),
            boss_number: self.boss.bosses_defeated(),
            boss_hits: self.boss.record().map(|r| (r.hits, r.max_hits)),
            bricks: self.bricks.len(),
            special_balls: self.special_balls.len(),
        }
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // === Lifecycle ===

    /// Begin play; only valid before the first start or after a restart
    pub fn start(&mut self) {
        if self.state.phase != SessionPhase::NotStarted {
            log::debug!("start ignored in {:?}", self.state.phase);
            return;
        }

        if self.bricks.is_empty() {
            self.repack_field(true);
        }
        self.clock.start(self.now_ms);
        self.ended_at_ms = None;
        self.scheduler.set_paused(false);
        self.scheduler
            .every(TimerKind::SpawnBrick, BRICK_SPAWN_INTERVAL_MS);
        self.scheduler
            .every(TimerKind::SpawnSpecialBall, SPECIAL_BALL_INTERVAL_MS);
        self.set_phase(SessionPhase::Playing);
        self.launch_ball();
    }

    /// Pause or resume; no-op outside `Playing`/`Paused`
    pub fn toggle_pause(&mut self) {
        match self.state.phase {
            SessionPhase::Playing => {
                self.clock.begin_pause(self.now_ms);
                self.scheduler.set_paused(true);
                self.boss.set_paused(true);
                self.set_phase(SessionPhase::Paused);
            }
            SessionPhase::Paused => {
                self.clock.end_pause(self.now_ms);
                self.scheduler.set_paused(false);
                self.boss.set_paused(false);
                self.set_phase(SessionPhase::Playing);
            }
            other => log::debug!("toggle_pause ignored in {:?}", other),
        }
    }

    /// Reset everything and wait for a new start; only valid after game over
    pub fn restart(&mut self) {
        if self.state.phase != SessionPhase::GameOver {
            log::debug!("restart ignored in {:?}", self.state.phase);
            return;
        }

        self.clear_entities();
        self.state = SessionState::default();
        self.clock = SessionClock::new();
        self.field.clear();
        self.boss.reset();
        self.input.reset_transient();
        self.scheduler.clear();
        self.scheduler.set_paused(false);
        self.paddle = Paddle::default();
        self.ball.state = BallState::Serving;
        self.ball.vel = Vec2::ZERO;
        self.ball.pos = self.paddle.serve_point(self.ball.radius);
        self.accumulator_ms = 0.0;
        self.ended_at_ms = None;

        self.events.push(SessionEvent::PhaseChanged {
            from: SessionPhase::GameOver,
            to: SessionPhase::NotStarted,
        });
        self.events.push(SessionEvent::ScoreChanged { score: 0, delta: 0 });
        self.events.push(SessionEvent::LivesChanged {
            lives: self.state.lives,
        });
        log::info!("Session restarted");
    }

    /// Tear the session down: cancel timers, detach listeners, drop entities
    pub fn destroy(&mut self) {
        if self.state.phase == SessionPhase::Destroyed {
            return;
        }
        self.scheduler.clear();
        self.boss.reset();
        self.visibility.detach();
        self.input.reset_transient();
        self.clear_entities();
        self.field.clear();
        self.set_phase(SessionPhase::Destroyed);
    }

    // === Host API ===

    /// Apply changed settings to the live session
    pub fn apply_settings(&mut self, settings: Settings) -> SettingsOutcome {
        let outcome = if self.settings.requires_recreate(&settings) {
            log::info!("debug_mode changed, session must be recreated");
            SettingsOutcome::RecreateRequired
        } else {
            SettingsOutcome::Applied
        };
        if self.state.phase != SessionPhase::Destroyed {
            self.input
                .set_virtual_pad_visible(settings.show_virtual_pad);
            self.sounds.apply(&settings.sound);
        }
        self.settings = settings;
        outcome
    }

    /// Settings panel opened: pause if currently playing
    pub fn pause_for_settings(&mut self) {
        if self.state.phase == SessionPhase::Playing {
            self.toggle_pause();
        }
    }

    /// `document.visibilityState` changed
    pub fn on_visibility_change(&mut self, visible: bool) {
        let change = self.visibility.set_document_visible(visible);
        self.auto_pause(change);
    }

    /// Window focus/blur
    pub fn on_window_focus(&mut self, focused: bool) {
        let change = self.visibility.set_window_focused(focused);
        self.auto_pause(change);
    }

    fn auto_pause(&mut self, change: Option<VisibilityChange>) {
        if change == Some(VisibilityChange::Hidden) && self.state.phase == SessionPhase::Playing {
            log::info!("Auto-paused (window hidden)");
            self.toggle_pause();
        }
    }

    // === Collision entry points ===

    /// Main ball touched the paddle
    pub fn on_ball_hits_paddle(&mut self) {
        if self.state.phase != SessionPhase::Playing || !self.ball.collisions_enabled() {
            return;
        }
        self.ball.vel = paddle_deflection(self.ball.vel, self.paddle.vel);
    }

    /// A ball (main or special) touched a brick
    pub fn on_ball_hits_brick(&mut self, brick_id: EntityId) {
        if self.state.phase != SessionPhase::Playing {
            return;
        }
        let Some(idx) = self.bricks.iter().position(|b| b.id == brick_id) else {
            debug_assert!(false, "collision with unknown brick {brick_id:?}");
            log::warn!("Collision with unknown brick {:?}", brick_id);
            return;
        };

        let brick = self.bricks.remove(idx);
        self.events.push(SessionEvent::BrickDestroyed { id: brick.id });
        self.hit_feedback(BRICK_SHAKE);
        self.add_score(score_for_texture(&brick.texture));
        self.field
            .rebuild_occupancy(self.bricks.iter().map(|b| b.rect));

        if self.boss.check_trigger(self.state.score) {
            self.start_boss_battle();
        }

        // An encounter empties the field on purpose, that is not an all-clear
        if !self.boss.is_active() && self.bricks.is_empty() {
            log::info!("All bricks cleared (+{})", ALL_CLEAR_BONUS);
            self.events.push(SessionEvent::AllClearBonus {
                bonus: ALL_CLEAR_BONUS,
            });
            self.add_score(ALL_CLEAR_BONUS);
            self.repack_field(true);
        }
    }

    /// A ball with a boss collider touched the boss
    pub fn on_ball_hits_boss(&mut self) {
        if self.state.phase != SessionPhase::Playing {
            return;
        }
        if !self.boss_entity.as_ref().is_some_and(|b| b.collider_enabled) {
            return;
        }
        let Some(outcome) = self.boss.register_hit() else {
            return;
        };

        if let Some(record) = self.boss.record() {
            self.events.push(SessionEvent::BossHit {
                hits: record.hits,
                max_hits: record.max_hits,
            });
        }
        if outcome.flash_started {
            self.events.push(SessionEvent::BossFlash { on: true });
        }
        self.hit_feedback(BOSS_HIT_SHAKE);

        if outcome.defeated {
            self.defeat_boss();
        }
    }

    /// Main ball fell past the death line
    pub fn on_ball_falls_below_death_line(&mut self) {
        if self.state.phase != SessionPhase::Playing || self.ball.state != BallState::InPlay {
            log::debug!("Ball death ignored ({:?}, {:?})", self.state.phase, self.ball.state);
            return;
        }

        self.ball.state = BallState::Lost;
        self.ball.vel = Vec2::ZERO;
        self.ball.pos = Vec2::new(self.ball.pos.x, DEATH_LINE_Y + 100.0);
        self.state.lives = self.state.lives.saturating_sub(1);
        log::info!("Ball lost, {} lives left", self.state.lives);

        self.events.push(SessionEvent::BallLost);
        self.events.push(SessionEvent::LivesChanged {
            lives: self.state.lives,
        });
        self.scheduler
            .once(TimerKind::ResolveBallDeath, BALL_DEATH_DELAY_MS);
    }

    /// A special ball fell past the death line; never costs a life
    pub fn on_special_ball_falls_below_death_line(&mut self, id: EntityId) {
        let before = self.special_balls.len();
        self.special_balls.retain(|b| b.id != id);
        if self.special_balls.len() != before {
            self.events.push(SessionEvent::SpecialBallDestroyed { id });
        }
    }

    // === Internals shared with tick.rs ===

    pub(super) fn handle_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::SpawnBrick => self.spawn_periodic_brick(),
            TimerKind::SpawnSpecialBall => self.spawn_special_ball(),
            TimerKind::ResolveBallDeath => self.resolve_ball_death(),
            TimerKind::RelaunchBall => {
                if self.ball.state == BallState::Respawning {
                    self.launch_ball();
                }
            }
        }
    }

    pub(super) fn handle_boss_event(&mut self, event: BossEvent) {
        match event {
            BossEvent::BattleWillStart { .. } => {}
            BossEvent::Started(spawn) => {
                let id = self.ids.next_id();
                let rect = Rect::from_center(
                    Vec2::new(BOSS_CENTER_X, BOSS_CENTER_Y),
                    spawn.width,
                    spawn.height,
                );
                log::info!("Boss {} spawned", spawn.boss_number);
                self.events.push(SessionEvent::BossSpawned {
                    id,
                    rect,
                    family: spawn.family.clone(),
                    max_hits: spawn.max_hits,
                });
                self.boss_entity = Some(Boss {
                    id,
                    rect,
                    family: spawn.family,
                    collider_enabled: true,
                });
            }
            BossEvent::FlashEnded { .. } => {
                self.events.push(SessionEvent::BossFlash { on: false });
            }
            BossEvent::Defeated { boss_number } => {
                if let Some(boss) = self.boss_entity.take() {
                    self.events.push(SessionEvent::BossRemoved { id: boss.id });
                }
                log::info!("Boss {} cleared, regenerating bricks", boss_number);
                self.repack_field(true);
            }
        }
    }

    pub(super) fn set_phase(&mut self, to: SessionPhase) {
        let from = self.state.phase;
        if from == to {
            return;
        }
        self.state.phase = to;
        log::info!("Session {:?} -> {:?}", from, to);
        self.events.push(SessionEvent::PhaseChanged { from, to });
    }

    pub(super) fn hit_feedback(&mut self, (duration_ms, intensity): (f64, f32)) {
        self.events.push(SessionEvent::CameraShake {
            duration_ms,
            intensity,
        });
        if let Some(freq_hz) = self.sounds.next_hit_note(self.visibility.is_visible()) {
            self.events.push(SessionEvent::HitSound { freq_hz });
        }
    }

    fn add_score(&mut self, delta: u64) {
        self.state.score += delta;
        self.events.push(SessionEvent::ScoreChanged {
            score: self.state.score,
            delta,
        });
    }

    fn spawn_brick(&mut self, placement: Placement) -> EntityId {
        let id = self.ids.next_id();
        let texture = placement.texture();
        self.events.push(SessionEvent::BrickSpawned {
            id,
            rect: placement.rect,
            texture: texture.clone(),
        });
        self.bricks.push(Brick {
            id,
            rect: placement.rect,
            family: placement.family,
            texture,
        });
        id
    }

    /// Pack the field around whatever bricks are still alive
    fn repack_field(&mut self, fade_in: bool) {
        self.field
            .rebuild_occupancy(self.bricks.iter().map(|b| b.rect));
        let placements = self.field.pack_initial(&mut self.rng);
        let ids: Vec<EntityId> = placements
            .into_iter()
            .map(|p| self.spawn_brick(p))
            .collect();
        if fade_in && !ids.is_empty() {
            self.events.push(SessionEvent::BricksFadeIn { ids });
        }
    }

    fn spawn_periodic_brick(&mut self) {
        if self.boss.is_active() {
            return;
        }
        if let Some(placement) = self.field.add_one(&mut self.rng) {
            let id = self.spawn_brick(placement);
            self.events.push(SessionEvent::BricksFadeIn { ids: vec![id] });
        }
    }

    fn spawn_special_ball(&mut self) {
        let id = self.ids.next_id();
        let x = self
            .rng
            .random_range(SPECIAL_BALL_RADIUS * 4.0..FIELD_WIDTH - SPECIAL_BALL_RADIUS * 4.0);
        let angle = self
            .rng
            .random_range(-BALL_LAUNCH_HALF_ANGLE..=BALL_LAUNCH_HALF_ANGLE);
        let pos = Vec2::new(x, SPECIAL_BALL_RADIUS * 2.0);
        // Boss collider only for a boss already on screen
        let boss_collider = self
            .boss_entity
            .as_ref()
            .filter(|b| b.collider_enabled)
            .map(|b| b.id);

        self.special_balls.push(SpecialBall {
            id,
            pos,
            vel: Vec2::new(angle.sin(), angle.cos()) * SPECIAL_BALL_SPEED,
            radius: SPECIAL_BALL_RADIUS,
            boss_collider,
        });
        log::debug!("Special ball {:?} spawned (boss collider: {:?})", id, boss_collider);
        self.events.push(SessionEvent::SpecialBallSpawned { id, pos });
    }

    fn start_boss_battle(&mut self) {
        let Some(BossEvent::BattleWillStart { boss_number }) = self.boss.begin(&mut self.rng)
        else {
            return;
        };

        self.events.push(SessionEvent::BossIncoming { boss_number });
        let ids: Vec<EntityId> = self.bricks.drain(..).map(|b| b.id).collect();
        if !ids.is_empty() {
            self.events.push(SessionEvent::BricksFadeOut { ids });
        }
        self.field.clear();
    }

    fn defeat_boss(&mut self) {
        let Some(bonus) = self.boss.defeat() else {
            return;
        };
        if let Some(boss) = self.boss_entity.as_mut() {
            boss.collider_enabled = false;
        }
        self.events.push(SessionEvent::BossDefeated {
            boss_number: self.boss.bosses_defeated(),
            bonus,
        });
        self.events.push(SessionEvent::CameraShake {
            duration_ms: BOSS_DEFEAT_SHAKE.0,
            intensity: BOSS_DEFEAT_SHAKE.1,
        });
        self.add_score(bonus);
    }

    fn resolve_ball_death(&mut self) {
        if self.ball.state != BallState::Lost {
            return;
        }
        if self.state.lives == 0 {
            self.game_over();
            return;
        }

        self.ball.state = BallState::Respawning;
        self.ball.pos = self.paddle.serve_point(self.ball.radius);
        self.events.push(SessionEvent::BallRespawned { pos: self.ball.pos });
        self.scheduler
            .once(TimerKind::RelaunchBall, BALL_RELAUNCH_DELAY_MS);
    }

    fn game_over(&mut self) {
        if self.state.phase != SessionPhase::Playing {
            return;
        }
        self.scheduler.clear();
        self.paddle.vel = Vec2::ZERO;
        if self.paddle.jumping {
            self.paddle.jumping = false;
            self.paddle.pos.y = PADDLE_GROUND_Y;
            self.clock.end_jump();
        }
        self.ended_at_ms = Some(self.now_ms);
        log::info!("Game over with score {}", self.state.score);
        self.set_phase(SessionPhase::GameOver);
    }

    /// Launch from above the paddle at a random angle inside the cone
    fn launch_ball(&mut self) {
        let angle = self
            .rng
            .random_range(-BALL_LAUNCH_HALF_ANGLE..=BALL_LAUNCH_HALF_ANGLE);
        self.ball.pos = self.paddle.serve_point(self.ball.radius);
        self.ball.vel = Vec2::new(angle.sin(), -angle.cos()) * BALL_SPEED;
        self.ball.state = BallState::InPlay;
        self.events.push(SessionEvent::BallLaunched {
            pos: self.ball.pos,
            vel: self.ball.vel,
        });
    }

    fn clear_entities(&mut self) {
        for brick in self.bricks.drain(..) {
            self.events.push(SessionEvent::BrickDestroyed { id: brick.id });
        }
        for ball in self.special_balls.drain(..) {
            self.events
                .push(SessionEvent::SpecialBallDestroyed { id: ball.id });
        }
        if let Some(boss) = self.boss_entity.take() {
            self.events.push(SessionEvent::BossRemoved { id: boss.id });
        }
    }
}

/// Ball velocity after touching the paddle
///
/// Picks up part of the paddle's motion and always leaves upward at a
/// minimum speed, so it can never graze along the paddle indefinitely.
pub fn paddle_deflection(ball_vel: Vec2, paddle_vel: Vec2) -> Vec2 {
    Vec2::new(
        ball_vel.x + paddle_vel.x * PADDLE_ENGLISH,
        -ball_vel.y.abs().max(BALL_MIN_UP_SPEED),
    )
}
