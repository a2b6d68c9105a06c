//! Player motion
//!
//! Turns directional intent and discrete actions into velocity changes.
//! Horizontal speed is acceleration-limited: walk speed chases the coin-driven
//! target at `acceleration_rate`, and the actual velocity chases
//! `direction * walk_speed` at `acceleration` or `deceleration`. Jumps and
//! slides are impulses gated on ground contact.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::PhysicsBody;
use super::coins::CoinPurse;
use super::state::Cue;
use super::tick::{MoveIntent, TickInput};
use crate::move_toward;
use crate::tuning::{CoinTuning, MotionTuning};

/// Which way the player faces. Never neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Everything the motion integrator owns about the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Walk speed, chasing `target_speed`
    pub current_speed: f32,
    /// Set from the coin purse every step
    pub target_speed: f32,
    pub grounded: bool,
    pub facing: Facing,
    pub slide_remaining: f32,
    pub coins: CoinPurse,
    pub autorun: bool,
    pub drop_cooldown: f32,
    /// Cleared by a scheduled deadline
    pub stunned: bool,
    pub alive: bool,
}

impl PlayerState {
    pub fn new(position: Vec2, motion: &MotionTuning, coins: CoinTuning) -> Self {
        let coins = CoinPurse::new(coins);
        Self {
            position,
            velocity: Vec2::ZERO,
            current_speed: motion.walk_speed,
            target_speed: coins.target_speed(),
            grounded: false,
            facing: Facing::Right,
            slide_remaining: 0.0,
            coins,
            autorun: false,
            drop_cooldown: 0.0,
            stunned: false,
            alive: true,
        }
    }

    pub fn is_sliding(&self) -> bool {
        self.slide_remaining > 0.0
    }

    /// By-value view handed to the generator, scoring and UI each tick
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            velocity: self.velocity,
            current_speed: self.current_speed,
            target_speed: self.target_speed,
            grounded: self.grounded,
            facing: self.facing,
            sliding: self.is_sliding(),
            coins: self.coins.count(),
            alive: self.alive,
        }
    }

    fn sync_from(&mut self, body: &impl PhysicsBody) {
        self.position = body.position();
        self.velocity = body.velocity();
    }
}

/// Read-only copy of the player for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub current_speed: f32,
    pub target_speed: f32,
    pub grounded: bool,
    pub facing: Facing,
    pub sliding: bool,
    pub coins: u32,
    pub alive: bool,
}

impl PlayerSnapshot {
    /// Snapshot of a player standing still at `position`
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            current_speed: 0.0,
            target_speed: 0.0,
            grounded: true,
            facing: Facing::Right,
            sliding: false,
            coins: 0,
            alive: true,
        }
    }
}

/// Side effects of one motion step the run has to forward
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionReport {
    pub coins_dropped: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionIntegrator {
    tuning: MotionTuning,
}

impl MotionIntegrator {
    pub fn new(tuning: MotionTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &MotionTuning {
        &self.tuning
    }

    /// Re-evaluate ground contact, emitting a cue on each edge
    fn check_ground(&self, player: &mut PlayerState, body: &impl PhysicsBody, cues: &mut Vec<Cue>) {
        let probe = player.position - Vec2::new(0.0, self.tuning.ground_check_offset);
        let grounded = body.overlaps_ground(probe, self.tuning.ground_check_radius);
        if grounded != player.grounded {
            cues.push(Cue::Grounded(grounded));
        }
        player.grounded = grounded;
    }

    /// One fixed step. Pushes the resulting velocity into `body` but does not
    /// step it.
    pub fn step(
        &self,
        player: &mut PlayerState,
        body: &mut impl PhysicsBody,
        input: &TickInput,
        dt: f32,
        cues: &mut Vec<Cue>,
    ) -> MotionReport {
        let mut report = MotionReport::default();
        player.sync_from(body);
        player.drop_cooldown = (player.drop_cooldown - dt).max(0.0);
        self.check_ground(player, body, cues);

        if !player.alive {
            player.velocity = Vec2::ZERO;
            body.set_velocity(Vec2::ZERO);
            return report;
        }

        if !player.stunned {
            if input.autorun_toggle {
                player.autorun = !player.autorun;
                log::debug!("Autorun {}", if player.autorun { "on" } else { "off" });
            }

            if input.coin_drop && player.drop_cooldown <= 0.0 && player.coins.drop_one() {
                player.drop_cooldown = self.tuning.coin_drop_cooldown;
                report.coins_dropped = 1;
                cues.push(Cue::CoinDropped);
            }

            if input.jump && player.grounded {
                player.velocity.y = self.tuning.jump_force;
                cues.push(Cue::Jumped);
            }

            if input.slide && player.grounded && !player.is_sliding() {
                player.slide_remaining = self.tuning.slide_duration;
                player.velocity.x =
                    player.facing.sign() * player.current_speed * self.tuning.slide_burst_factor;
                cues.push(Cue::Slid);
            }
        }

        if player.is_sliding() {
            player.slide_remaining = (player.slide_remaining - dt).max(0.0);
        }

        player.target_speed = player.coins.target_speed();
        player.current_speed = move_toward(
            player.current_speed,
            player.target_speed,
            self.tuning.acceleration_rate * dt,
        );

        if !player.stunned {
            let direction = match input.direction {
                MoveIntent::Left => {
                    player.facing = Facing::Left;
                    -1.0
                }
                MoveIntent::Right => {
                    player.facing = Facing::Right;
                    1.0
                }
                MoveIntent::None if player.autorun => player.facing.sign(),
                MoveIntent::None => 0.0,
            };

            // The slide keeps its burst velocity until the timer runs out
            if !player.is_sliding() {
                let (target_vx, rate) = if direction != 0.0 {
                    (direction * player.current_speed, self.tuning.acceleration)
                } else {
                    (0.0, self.tuning.deceleration)
                };
                player.velocity.x = move_toward(player.velocity.x, target_vx, rate * dt);
            }
        }

        body.set_velocity(player.velocity);
        report
    }
}
