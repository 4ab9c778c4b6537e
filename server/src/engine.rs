// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Pure, synchronous Pong physics (C5). No I/O, no async, no knowledge of
//! sockets or persistence -- a [`GameSession`](crate::session::GameSession)
//! ticks it and serializes [`GameEngine::snapshot`] onto the wire. The
//! source this was distilled from carried two divergent engines with
//! different canvas sizes and per-tick speed increases; this keeps neither
//! and fixes the canonical constants below as explicit constructor
//! parameters so a test can exercise a scaled-down arena without touching
//! the defaults.

use common::id::PlayerRole;
use common::wire::GameStateFrame;
use rand::Rng;

pub const CANVAS_WIDTH: f32 = 1000.0;
pub const CANVAS_HEIGHT: f32 = 600.0;
pub const GRID: f32 = 15.0;
pub const PADDLE_HEIGHT: f32 = GRID * 5.0;
pub const PADDLE_SPEED: f32 = 6.0;
pub const BALL_SPEED: f32 = 5.0;
pub const TARGET_SCORE: u32 = 11;

#[derive(Copy, Clone, Debug)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub dy: f32,
}

impl Paddle {
    fn clamp_y(&mut self, canvas_height: f32) {
        self.y = self.y.clamp(GRID, canvas_height - GRID - self.h);
    }

    fn aabb_overlaps(&self, ball: &Ball) -> bool {
        self.x < ball.x + ball.w
            && self.x + self.w > ball.x
            && self.y < ball.y + ball.h
            && self.y + self.h > ball.y
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub dx: f32,
    pub dy: f32,
    pub resetting: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PaddleDirection {
    Up,
    Down,
    Stop,
}

impl PaddleDirection {
    /// `"w"`/`"s"` are the only input frames the wire protocol defines
    /// (§6); anything else is ignored by the caller, not mapped here.
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "w" => Some(Self::Up),
            "s" => Some(Self::Down),
            _ => None,
        }
    }
}

/// A deterministic Pong match. `update` is the only place time enters;
/// everything else is a pure function of current state.
#[derive(Clone, Debug)]
pub struct GameEngine {
    canvas_width: f32,
    canvas_height: f32,
    left_paddle: Paddle,
    right_paddle: Paddle,
    ball: Ball,
    score1: u32,
    score2: u32,
    last_update: f64,
}

impl GameEngine {
    pub fn new(canvas_width: f32, canvas_height: f32) -> Self {
        let left_paddle = Paddle {
            x: GRID * 2.0,
            y: canvas_height / 2.0 - PADDLE_HEIGHT / 2.0,
            w: GRID,
            h: PADDLE_HEIGHT,
            dy: 0.0,
        };
        let right_paddle = Paddle {
            x: canvas_width - GRID * 3.0,
            y: canvas_height / 2.0 - PADDLE_HEIGHT / 2.0,
            w: GRID,
            h: PADDLE_HEIGHT,
            dy: 0.0,
        };
        let ball = Ball {
            x: canvas_width / 2.0,
            y: canvas_height / 2.0,
            w: GRID,
            h: GRID,
            dx: 0.0,
            dy: 0.0,
            resetting: true,
        };
        Self {
            canvas_width,
            canvas_height,
            left_paddle,
            right_paddle,
            ball,
            score1: 0,
            score2: 0,
            last_update: 0.0,
        }
    }

    pub fn canonical() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }

    /// Chooses a random heading with `|dx| >= 0.3*speed` and
    /// `|dy| >= 0.7*speed` so the ball never travels nearly vertically or
    /// nearly horizontally.
    pub fn start_ball(&mut self) {
        let (dx, dy) = random_heading(&mut rand::thread_rng());
        self.ball.dx = dx;
        self.ball.dy = dy;
        self.ball.resetting = false;
    }

    pub fn move_paddle(&mut self, role: PlayerRole, direction: PaddleDirection) {
        let paddle = match role {
            PlayerRole::Player1 => &mut self.left_paddle,
            PlayerRole::Player2 => &mut self.right_paddle,
        };
        paddle.dy = match direction {
            PaddleDirection::Up => -PADDLE_SPEED,
            PaddleDirection::Down => PADDLE_SPEED,
            PaddleDirection::Stop => 0.0,
        };
    }

    /// Advances the simulation to `now` (seconds, monotonic) and returns
    /// `true` iff the match has reached its target score. Calling this with
    /// a non-monotonic `now` is undefined behavior; the caller (C6) must
    /// never do so.
    pub fn update(&mut self, now: f64) -> bool {
        let dt = ((now - self.last_update).max(0.0) * 60.0) as f32;
        self.last_update = now;

        self.left_paddle.y += self.left_paddle.dy * dt;
        self.right_paddle.y += self.right_paddle.dy * dt;
        self.left_paddle.clamp_y(self.canvas_height);
        self.right_paddle.clamp_y(self.canvas_height);

        if !self.ball.resetting {
            self.ball.x += self.ball.dx * dt;
            self.ball.y += self.ball.dy * dt;

            if self.ball.y <= GRID || self.ball.y + self.ball.h >= self.canvas_height - GRID {
                self.ball.dy *= -1.0;
            }

            if self.ball.x < 0.0 {
                self.score2 += 1;
                self.reset_ball();
            } else if self.ball.x > self.canvas_width {
                self.score1 += 1;
                self.reset_ball();
            } else {
                self.handle_paddle_collision(true);
                self.handle_paddle_collision(false);
            }
        }

        self.score1.max(self.score2) >= TARGET_SCORE
    }

    fn handle_paddle_collision(&mut self, left: bool) {
        let (paddle, snap_edge) = if left {
            (self.left_paddle, self.left_paddle.x + self.left_paddle.w)
        } else {
            (self.right_paddle, self.right_paddle.x - self.ball.w)
        };
        if paddle.aabb_overlaps(&self.ball) {
            self.ball.dx *= -1.0;
            self.ball.x = snap_edge;
        }
    }

    /// Re-centers the ball and re-launches it with a fresh random
    /// direction at base speed.
    pub fn reset_ball(&mut self) {
        self.ball.x = self.canvas_width / 2.0;
        self.ball.y = self.canvas_height / 2.0;
        self.ball.resetting = true;
        self.start_ball();
    }

    /// `disconnected`, when given, wins unconditionally for the other
    /// player regardless of score; otherwise the player with score >= the
    /// target wins, or `None` if neither has reached it yet.
    pub fn winner(&self, disconnected: Option<PlayerRole>) -> Option<PlayerRole> {
        if let Some(who) = disconnected {
            return Some(who.other());
        }
        if self.score1 >= TARGET_SCORE {
            Some(PlayerRole::Player1)
        } else if self.score2 >= TARGET_SCORE {
            Some(PlayerRole::Player2)
        } else {
            None
        }
    }

    pub fn scores(&self) -> (u32, u32) {
        (self.score1, self.score2)
    }

    pub fn snapshot(&self) -> GameStateFrame {
        GameStateFrame {
            ball_x: self.ball.x,
            ball_y: self.ball.y,
            p1_y: self.left_paddle.y,
            p2_y: self.right_paddle.y,
            score1: self.score1,
            score2: self.score2,
        }
    }

    #[cfg(test)]
    pub fn paddle_y(&self, role: PlayerRole) -> f32 {
        match role {
            PlayerRole::Player1 => self.left_paddle.y,
            PlayerRole::Player2 => self.right_paddle.y,
        }
    }

    #[cfg(test)]
    pub fn max_paddle_y(&self) -> f32 {
        self.canvas_height - GRID - PADDLE_HEIGHT
    }
}

fn random_heading(rng: &mut impl Rng) -> (f32, f32) {
    let dx_mag = rng.gen_range(0.3 * BALL_SPEED..=BALL_SPEED);
    let dy_mag = (BALL_SPEED * BALL_SPEED - dx_mag * dx_mag).max(0.7 * BALL_SPEED * 0.7 * BALL_SPEED).sqrt();
    // Recompute dy to respect the 0.7 floor exactly, then rescale so speed
    // stays close to BALL_SPEED without fixating on one ratio every launch.
    let dy_mag = dy_mag.max(0.7 * BALL_SPEED);
    let dx = if rng.gen_bool(0.5) { dx_mag } else { -dx_mag };
    let dy = if rng.gen_bool(0.5) { dy_mag } else { -dy_mag };
    (dx, dy)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_game_centers_ball_and_paddles() {
        let engine = GameEngine::canonical();
        let snap = engine.snapshot();
        assert_eq!(snap.ball_x, CANVAS_WIDTH / 2.0);
        assert_eq!(snap.ball_y, CANVAS_HEIGHT / 2.0);
        assert_eq!(snap.score1, 0);
        assert_eq!(snap.score2, 0);
    }

    #[test]
    fn paddle_clamps_at_top_and_bottom() {
        let mut engine = GameEngine::canonical();
        engine.move_paddle(PlayerRole::Player1, PaddleDirection::Up);
        for _ in 0..10_000 {
            engine.update(engine_now(&engine));
        }
        assert_eq!(engine.paddle_y(PlayerRole::Player1), GRID);

        engine.move_paddle(PlayerRole::Player1, PaddleDirection::Down);
        for _ in 0..10_000 {
            engine.update(engine_now(&engine));
        }
        assert_eq!(engine.paddle_y(PlayerRole::Player1), engine.max_paddle_y());
    }

    fn engine_now(engine: &GameEngine) -> f64 {
        // Advance by a fixed nominal 60Hz tick each call regardless of
        // engine internal state -- tests own their own clock.
        engine.last_update + 1.0 / 60.0
    }

    #[test]
    fn ball_reflects_off_top_wall() {
        let mut engine = GameEngine::canonical();
        engine.ball.resetting = false;
        engine.ball.y = GRID;
        engine.ball.dy = -BALL_SPEED;
        engine.ball.dx = 0.0;
        let dy_before = engine.ball.dy;
        engine.update(1.0 / 60.0);
        assert_eq!(engine.ball.dy, -dy_before);
    }

    #[test]
    fn score_transition_to_target_ends_match_within_one_tick() {
        let mut engine = GameEngine::canonical();
        engine.score1 = TARGET_SCORE - 1;
        engine.ball.resetting = false;
        engine.ball.x = -1.0;
        engine.ball.dx = -BALL_SPEED;
        let ended = engine.update(1.0 / 60.0);
        assert!(ended);
        assert_eq!(engine.scores().0, TARGET_SCORE);
    }

    #[test]
    fn disconnect_awards_win_to_the_other_player_regardless_of_score() {
        let engine = GameEngine::canonical();
        let winner = engine.winner(Some(PlayerRole::Player1));
        assert_eq!(winner, Some(PlayerRole::Player2));
    }

    #[test]
    fn paddle_collision_reflects_and_snaps_to_edge() {
        let mut engine = GameEngine::canonical();
        engine.ball.resetting = false;
        engine.ball.dx = -BALL_SPEED;
        engine.ball.dy = 0.0;
        engine.ball.x = engine.left_paddle.x + engine.left_paddle.w - 1.0;
        engine.ball.y = engine.left_paddle.y;
        engine.update(1.0 / 60.0);
        assert!(engine.ball.dx > 0.0);
        assert_eq!(engine.ball.x, engine.left_paddle.x + engine.left_paddle.w);
    }
}
