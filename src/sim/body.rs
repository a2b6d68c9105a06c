//! Physics collaborator contract
//!
//! The core never integrates rigid bodies itself. It reads and writes the
//! player's velocity, asks whether a probe circle touches ground, and lets the
//! body advance. `FlatGround` is a minimal body with gravity over an infinite
//! ground plane, enough for headless runs and tests.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// What the simulation needs from a physics engine
pub trait PhysicsBody {
    fn position(&self) -> Vec2;
    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, vel: Vec2);
    /// Overlap-circle query against the ground layer
    fn overlaps_ground(&self, center: Vec2, radius: f32) -> bool;
    /// Advance the body by one fixed step
    fn step(&mut self, dt: f32);
}

/// Default downward acceleration for `FlatGround`
pub const DEFAULT_GRAVITY: f32 = 25.0;

/// Player body over a flat floor at `ground_y`
///
/// The body origin sits `feet_offset` above its feet, so a standing player
/// has `pos.y == ground_y + feet_offset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatGround {
    pub pos: Vec2,
    pub vel: Vec2,
    pub gravity: f32,
    pub ground_y: f32,
    pub feet_offset: f32,
}

impl FlatGround {
    /// Body standing at `x` on a floor at y = 0
    pub fn standing_at(x: f32) -> Self {
        Self {
            pos: Vec2::new(x, 1.0),
            vel: Vec2::ZERO,
            gravity: DEFAULT_GRAVITY,
            ground_y: 0.0,
            feet_offset: 1.0,
        }
    }

    fn rest_height(&self) -> f32 {
        self.ground_y + self.feet_offset
    }
}

impl Default for FlatGround {
    fn default() -> Self {
        Self::standing_at(0.0)
    }
}

impl PhysicsBody for FlatGround {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn velocity(&self) -> Vec2 {
        self.vel
    }

    fn set_velocity(&mut self, vel: Vec2) {
        self.vel = vel;
    }

    fn overlaps_ground(&self, center: Vec2, radius: f32) -> bool {
        // Ground is the half-plane y <= ground_y
        center.y - radius <= self.ground_y + 1e-4
    }

    fn step(&mut self, dt: f32) {
        self.vel.y -= self.gravity * dt;
        self.pos += self.vel * dt;

        let rest = self.rest_height();
        if self.pos.y < rest {
            self.pos.y = rest;
            self.vel.y = self.vel.y.max(0.0);
        }
    }
}
