//! Per-frame session update
//!
//! Host frames arrive with variable deltas. Physics and timers advance in
//! fixed `SIM_DT_MS` steps; the remainder carries over to the next frame.

use glam::Vec2;

use super::geometry::{Contact, bounce, circle_rect_contact};
use super::input::{InputContext, Intent};
use super::session::{SessionOrchestrator, paddle_deflection};
use super::state::{BallState, Brick, EntityId, SessionEvent, SessionPhase};
use crate::consts::*;

/// Host frame timing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tick {
    /// Host timestamp (ms)
    pub now_ms: f64,
    /// Time since the previous frame (ms)
    pub delta_ms: f64,
}

impl Tick {
    pub fn new(now_ms: f64, delta_ms: f64) -> Self {
        Self { now_ms, delta_ms }
    }
}

impl SessionOrchestrator {
    /// Advance the session by one host frame
    pub fn update(&mut self, tick: Tick) {
        if self.state.phase == SessionPhase::Destroyed {
            return;
        }
        self.now_ms = tick.now_ms;

        let intent = self.input.poll(InputContext {
            started: self.state.phase != SessionPhase::NotStarted,
            game_over: self.state.phase == SessionPhase::GameOver,
        });

        match self.state.phase {
            SessionPhase::NotStarted if intent.start_requested => self.start(),
            SessionPhase::GameOver if intent.restart_requested => self.restart(),
            SessionPhase::Playing | SessionPhase::Paused if intent.pause_requested => {
                self.toggle_pause()
            }
            _ => {}
        }

        if self.state.phase != SessionPhase::Playing {
            return;
        }

        if intent.jump_requested {
            self.jump();
        }
        self.steer_paddle(&intent);

        self.accumulator_ms += tick.delta_ms.clamp(0.0, MAX_FRAME_MS);
        while self.accumulator_ms >= SIM_DT_MS && self.state.phase == SessionPhase::Playing {
            self.accumulator_ms -= SIM_DT_MS;
            self.step(SIM_DT_MS);
        }
    }

    fn step(&mut self, dt_ms: f64) {
        let dt = (dt_ms / 1000.0) as f32;

        self.step_paddle(dt, dt_ms);
        self.step_ball(dt);

        let ids: Vec<EntityId> = self.special_balls.iter().map(|b| b.id).collect();
        for id in ids {
            self.step_special_ball(id, dt);
        }

        for kind in self.scheduler.advance(dt_ms) {
            if self.state.phase != SessionPhase::Playing {
                break;
            }
            self.handle_timer(kind);
        }
        // A death timer above may have ended the session
        if self.state.phase == SessionPhase::Playing {
            for event in self.boss.advance(dt_ms) {
                self.handle_boss_event(event);
            }
        }
    }

    fn steer_paddle(&mut self, intent: &Intent) {
        let speed = if intent.fast_move {
            PADDLE_FAST_SPEED
        } else {
            PADDLE_SPEED
        };
        self.paddle.vel.x = intent.horizontal() * speed;
    }

    fn jump(&mut self) {
        if self.paddle.jumping {
            return;
        }
        self.paddle.jumping = true;
        self.paddle.vel.y = -JUMP_SPEED;
        self.clock.begin_jump();
        self.events.push(SessionEvent::PaddleJumped);
    }

    fn step_paddle(&mut self, dt: f32, dt_ms: f64) {
        let half_width = self.paddle.width / 2.0;
        let x = self.paddle.pos.x;
        let next = clamp_paddle_x(x, x + self.paddle.vel.x * dt, half_width);
        if next == x {
            self.paddle.vel.x = 0.0;
        }
        self.paddle.pos.x = next;

        if !self.paddle.jumping {
            return;
        }
        self.paddle.vel.y += GRAVITY * dt;
        self.paddle.pos.y += self.paddle.vel.y * dt;
        self.clock.add_jump_duration(dt_ms);

        if self.paddle.vel.y > 0.0 && self.paddle.pos.y >= PADDLE_GROUND_Y {
            self.paddle.pos.y = PADDLE_GROUND_Y;
            self.paddle.vel.y = 0.0;
            self.paddle.jumping = false;
            let airtime_ms = self.clock.end_jump();
            log::debug!("Paddle landed after {:.0}ms", airtime_ms);
            self.events.push(SessionEvent::PaddleLanded { airtime_ms });
        }
    }

    fn step_ball(&mut self, dt: f32) {
        match self.ball.state {
            BallState::Serving | BallState::Respawning => {
                self.ball.pos = self.paddle.serve_point(self.ball.radius);
                return;
            }
            BallState::Lost => return,
            BallState::InPlay => {}
        }

        let radius = self.ball.radius;
        self.ball.pos += self.ball.vel * dt;
        bounce_off_walls(&mut self.ball.pos, &mut self.ball.vel, radius);

        let paddle_rect = self.paddle.rect();
        if let Some(contact) = circle_rect_contact(self.ball.pos, radius, &paddle_rect) {
            if self.ball.vel.y > 0.0 {
                self.ball.pos.y = paddle_rect.y - radius;
                self.on_ball_hits_paddle();
            } else {
                self.ball.pos += contact.normal * contact.penetration;
            }
        }

        let boss_rect = self
            .boss_entity
            .as_ref()
            .filter(|b| b.collider_enabled)
            .map(|b| b.rect);
        if let Some(contact) =
            boss_rect.and_then(|rect| circle_rect_contact(self.ball.pos, radius, &rect))
        {
            bounce(&mut self.ball.pos, &mut self.ball.vel, &contact);
            self.on_ball_hits_boss();
        }

        let hits = brick_contacts(&self.bricks, self.ball.pos, radius);
        if let Some(contact) = deepest(&hits) {
            bounce(&mut self.ball.pos, &mut self.ball.vel, &contact);
        }
        self.dispatch_brick_hits(hits);

        if self.ball.pos.y - radius > DEATH_LINE_Y {
            self.on_ball_falls_below_death_line();
        }
    }

    fn step_special_ball(&mut self, id: EntityId, dt: f32) {
        let Some(idx) = self.special_balls.iter().position(|b| b.id == id) else {
            return;
        };
        let paddle_rect = self.paddle.rect();
        let paddle_vel = self.paddle.vel;
        let live_boss = self
            .boss_entity
            .as_ref()
            .filter(|b| b.collider_enabled)
            .map(|b| (b.id, b.rect));

        let ball = &mut self.special_balls[idx];
        ball.pos += ball.vel * dt;
        bounce_off_walls(&mut ball.pos, &mut ball.vel, ball.radius);

        if circle_rect_contact(ball.pos, ball.radius, &paddle_rect).is_some() && ball.vel.y > 0.0 {
            ball.pos.y = paddle_rect.y - ball.radius;
            ball.vel = paddle_deflection(ball.vel, paddle_vel);
        }

        // Only the boss this ball was wired to at spawn
        let boss_rect = live_boss
            .filter(|(boss_id, _)| ball.boss_collider == Some(*boss_id))
            .map(|(_, rect)| rect);
        let mut hit_boss = false;
        if let Some(contact) =
            boss_rect.and_then(|rect| circle_rect_contact(ball.pos, ball.radius, &rect))
        {
            bounce(&mut ball.pos, &mut ball.vel, &contact);
            hit_boss = true;
        }

        let hits = brick_contacts(&self.bricks, ball.pos, ball.radius);
        if let Some(contact) = deepest(&hits) {
            bounce(&mut ball.pos, &mut ball.vel, &contact);
        }
        let fell = ball.pos.y - ball.radius > DEATH_LINE_Y;

        if hit_boss {
            self.on_ball_hits_boss();
        }
        self.dispatch_brick_hits(hits);
        if fell {
            self.on_special_ball_falls_below_death_line(id);
        }
    }

    /// Report each touched brick once; a boss trigger can clear the rest mid-way
    fn dispatch_brick_hits(&mut self, hits: Vec<(EntityId, Contact)>) {
        for (brick_id, _) in hits {
            if self.bricks.iter().any(|b| b.id == brick_id) {
                self.on_ball_hits_brick(brick_id);
            }
        }
    }
}

/// Paddle x after a move, blocking only motion that would leave the field
///
/// A paddle already past a bound may still move back toward the center.
pub fn clamp_paddle_x(current: f32, next: f32, half_width: f32) -> f32 {
    let min = half_width;
    let max = FIELD_WIDTH - half_width;
    if next < current {
        next.max(min.min(current))
    } else {
        next.min(max.max(current))
    }
}

/// Bounce off the left, right and top walls; the bottom is open
fn bounce_off_walls(pos: &mut Vec2, vel: &mut Vec2, radius: f32) {
    if pos.x - radius < 0.0 {
        pos.x = radius;
        vel.x = vel.x.abs();
    }
    if pos.x + radius > FIELD_WIDTH {
        pos.x = FIELD_WIDTH - radius;
        vel.x = -vel.x.abs();
    }
    if pos.y - radius < 0.0 {
        pos.y = radius;
        vel.y = vel.y.abs();
    }
}

fn brick_contacts(bricks: &[Brick], center: Vec2, radius: f32) -> Vec<(EntityId, Contact)> {
    bricks
        .iter()
        .filter_map(|b| circle_rect_contact(center, radius, &b.rect).map(|c| (b.id, c)))
        .collect()
}

fn deepest(hits: &[(EntityId, Contact)]) -> Option<Contact> {
    hits.iter()
        .map(|(_, c)| *c)
        .max_by(|a, b| a.penetration.total_cmp(&b.penetration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::geometry::Rect;
    use crate::sim::input::Key;
    use crate::sim::state::SpecialBall;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn run(session: &mut SessionOrchestrator, ms: f64) {
        let frames = (ms / FRAME_MS).ceil() as usize;
        for _ in 0..frames {
            let now = session.now_ms + FRAME_MS;
            session.update(Tick::new(now, FRAME_MS));
        }
    }

    /// Started session with the main ball held on the paddle
    fn parked_session(seed: u64) -> SessionOrchestrator {
        let mut session = SessionOrchestrator::new(Settings::default(), seed);
        session.start();
        session.ball.state = BallState::Serving;
        session.drain_events();
        session
    }

    #[test]
    fn test_clamp_paddle_x() {
        let half = 50.0;
        // Blocked at the left bound
        assert_eq!(clamp_paddle_x(55.0, 40.0, half), 50.0);
        // Free motion inside the field
        assert_eq!(clamp_paddle_x(300.0, 310.0, half), 310.0);
        // Past the bound: moving further out is blocked, moving back is not
        assert_eq!(clamp_paddle_x(20.0, 10.0, half), 20.0);
        assert_eq!(clamp_paddle_x(20.0, 30.0, half), 30.0);
        assert_eq!(clamp_paddle_x(790.0, 780.0, half), 780.0);
        assert_eq!(clamp_paddle_x(790.0, 795.0, half), 790.0);
    }

    #[test]
    fn test_enter_starts_session() {
        let mut session = SessionOrchestrator::new(Settings::default(), 1);
        run(&mut session, 100.0);
        assert_eq!(session.phase(), SessionPhase::NotStarted);

        session.input_mut().key_down(Key::Enter);
        run(&mut session, FRAME_MS);
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.ball().state, BallState::InPlay);
    }

    #[test]
    fn test_paddle_stays_inside_field() {
        let mut session = parked_session(2);
        session.input_mut().key_down(Key::ArrowLeft);
        session.input_mut().key_down(Key::Shift);
        run(&mut session, 2000.0);
        let paddle = session.paddle();
        assert!((paddle.pos.x - paddle.width / 2.0).abs() < 0.001);
        assert_eq!(paddle.vel.x, 0.0);

        session.input_mut().release_keys();
        session.input_mut().key_down(Key::D);
        run(&mut session, 200.0);
        assert!(session.paddle().pos.x > PADDLE_WIDTH / 2.0);
    }

    #[test]
    fn test_jump_lands_and_reports_airtime() {
        let mut session = parked_session(3);
        session.input_mut().key_down(Key::ArrowUp);
        run(&mut session, FRAME_MS);
        assert!(session.paddle().jumping);
        assert!(session.clock().is_jumping());

        run(&mut session, 1000.0);
        assert!(!session.paddle().jumping);
        assert_eq!(session.paddle().pos.y, PADDLE_GROUND_Y);

        let events = session.drain_events();
        assert!(events.contains(&SessionEvent::PaddleJumped));
        let airtime = events
            .iter()
            .find_map(|e| match e {
                SessionEvent::PaddleLanded { airtime_ms } => Some(*airtime_ms),
                _ => None,
            })
            .expect("landing event");
        let expected = 2000.0 * JUMP_SPEED as f64 / GRAVITY as f64;
        assert!((airtime - expected).abs() < 40.0, "airtime {airtime}");
    }

    #[test]
    fn test_pause_key_freezes_simulation() {
        let mut session = SessionOrchestrator::new(Settings::default(), 4);
        session.start();
        run(&mut session, 50.0);

        session.input_mut().key_down(Key::Escape);
        run(&mut session, FRAME_MS);
        assert_eq!(session.phase(), SessionPhase::Paused);

        let pos = session.ball().pos;
        run(&mut session, 500.0);
        assert_eq!(session.ball().pos, pos);

        session.input_mut().key_down(Key::P);
        run(&mut session, FRAME_MS);
        assert_eq!(session.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_long_frames_are_clamped() {
        let mut session = SessionOrchestrator::new(Settings::default(), 5);
        session.start();
        let before = session.ball().pos;
        session.update(Tick::new(10_000.0, 10_000.0));
        let moved = session.ball().pos.distance(before);
        assert!(moved <= BALL_SPEED * (MAX_FRAME_MS as f32 / 1000.0) + 1.0);
        // A clamped frame never reaches the first spawner interval
        let spawned = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::BricksFadeIn { .. }))
            .count();
        assert_eq!(spawned, 0);
    }

    #[test]
    fn test_ball_below_death_line_costs_life_then_relaunches() {
        let mut session = parked_session(6);
        session.ball.state = BallState::InPlay;
        session.ball.pos = Vec2::new(400.0, DEATH_LINE_Y + 5.0);
        session.ball.vel = Vec2::new(0.0, 300.0);

        run(&mut session, FRAME_MS);
        assert_eq!(session.lives(), INITIAL_LIVES - 1);
        assert_eq!(session.ball().state, BallState::Lost);

        run(&mut session, BALL_DEATH_DELAY_MS + 50.0);
        assert_eq!(session.ball().state, BallState::Respawning);

        run(&mut session, BALL_RELAUNCH_DELAY_MS + 50.0);
        assert_eq!(session.ball().state, BallState::InPlay);
        assert_eq!(session.lives(), INITIAL_LIVES - 1);
    }

    #[test]
    fn test_ball_breaks_brick_on_contact() {
        let mut session = parked_session(7);
        // Lowest brick, so nothing else sits in the ball's path
        let brick = session
            .bricks()
            .iter()
            .max_by(|a, b| a.rect.bottom().total_cmp(&b.rect.bottom()))
            .cloned()
            .expect("packed field");
        let below = Vec2::new(brick.rect.center().x, brick.rect.bottom() + BALL_RADIUS + 1.0);
        session.ball.state = BallState::InPlay;
        session.ball.pos = below;
        session.ball.vel = Vec2::new(0.0, -BALL_SPEED);

        run(&mut session, FRAME_MS);
        assert!(session.bricks().iter().all(|b| b.id != brick.id));
        assert!(session.score() > 0);
        // Reflected back down
        assert!(session.ball().vel.y > 0.0);
    }

    #[test]
    fn test_paddle_contact_sends_ball_up() {
        let mut session = parked_session(8);
        let top = session.paddle().rect().y;
        session.ball.state = BallState::InPlay;
        session.ball.pos = Vec2::new(session.paddle().pos.x, top - BALL_RADIUS + 1.0);
        session.ball.vel = Vec2::new(0.0, 100.0);

        run(&mut session, FRAME_MS);
        assert!(session.ball().vel.y <= -BALL_MIN_UP_SPEED);
    }

    #[test]
    fn test_boss_does_not_spawn_after_game_over() {
        let mut session = parked_session(14);
        session.special_balls.clear();
        session.state.lives = 1;
        if let Some(event) = session.boss.begin(&mut session.rng) {
            session.handle_boss_event(event);
        }
        session.ball.state = BallState::InPlay;
        session.on_ball_falls_below_death_line();
        session.drain_events();

        // Death resolves and the boss delay runs out in the same step
        session.step(BOSS_SPAWN_DELAY_MS.max(BALL_DEATH_DELAY_MS) + 1.0);
        assert_eq!(session.phase(), SessionPhase::GameOver);
        assert!(session.boss_entity().is_none());
        let events = session.drain_events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, SessionEvent::BossSpawned { .. })));
    }

    #[test]
    fn test_special_ball_miss_is_free() {
        let mut session = parked_session(9);
        session.special_balls.push(SpecialBall {
            id: EntityId(9999),
            pos: Vec2::new(400.0, DEATH_LINE_Y + 20.0),
            vel: Vec2::new(0.0, 300.0),
            radius: SPECIAL_BALL_RADIUS,
            boss_collider: None,
        });

        run(&mut session, FRAME_MS);
        assert!(session.special_balls().is_empty());
        assert_eq!(session.lives(), INITIAL_LIVES);
        assert!(
            session
                .drain_events()
                .contains(&SessionEvent::SpecialBallDestroyed { id: EntityId(9999) })
        );
    }

    #[test]
    fn test_special_ball_without_boss_collider_passes_boss() {
        let mut session = parked_session(10);
        session.bricks.clear();
        session.field.clear();
        let rect = Rect::from_center(Vec2::new(400.0, 190.0), 200.0, 96.0);
        session.boss_entity = Some(crate::sim::state::Boss {
            id: EntityId(500),
            rect,
            family: "saucer".into(),
            collider_enabled: true,
        });
        session.special_balls.push(SpecialBall {
            id: EntityId(501),
            pos: rect.center(),
            vel: Vec2::new(0.0, 300.0),
            radius: SPECIAL_BALL_RADIUS,
            boss_collider: None,
        });

        run(&mut session, FRAME_MS);
        let ball = &session.special_balls()[0];
        assert!(ball.vel.y > 0.0);
        assert!(ball.pos.y > rect.center().y);
    }
}
