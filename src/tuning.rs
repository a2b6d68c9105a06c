//! Data-driven game balance
//!
//! Every gameplay constant lives here with its default. A tuning file only
//! needs the values it overrides; missing sections and fields fall back to
//! the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult, require_non_negative, require_positive};

/// Player movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Horizontal speed the player starts at
    pub walk_speed: f32,
    /// Vertical velocity applied on jump
    pub jump_force: f32,
    /// Slide length in seconds
    pub slide_duration: f32,
    /// Slide burst as a multiple of the current walk speed
    pub slide_burst_factor: f32,
    /// How fast walk speed follows the coin-driven target (units/s per second)
    pub acceleration_rate: f32,
    /// Horizontal acceleration while a direction is held
    pub acceleration: f32,
    /// Horizontal deceleration with no direction
    pub deceleration: f32,
    /// Ground probe distance below the player origin
    pub ground_check_offset: f32,
    /// Ground probe radius
    pub ground_check_radius: f32,
    /// Minimum time between two coin drops
    pub coin_drop_cooldown: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            walk_speed: 3.0,
            jump_force: 10.0,
            slide_duration: 0.5,
            slide_burst_factor: 1.5,
            acceleration_rate: 5.0,
            acceleration: 30.0,
            deceleration: 40.0,
            ground_check_offset: 1.0,
            ground_check_radius: 0.1,
            coin_drop_cooldown: 0.2,
        }
    }
}

/// Coin count to target speed curve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinTuning {
    pub base_speed: f32,
    pub speed_per_coin: f32,
    pub max_speed: f32,
}

impl Default for CoinTuning {
    fn default() -> Self {
        Self {
            base_speed: 5.0,
            speed_per_coin: 0.25,
            max_speed: 15.0,
        }
    }
}

/// Level generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerTuning {
    /// Spawn the next pair once the player is closer than this to the frontier
    pub spawn_distance: f32,
    /// How many recent obstacle variants are avoided
    pub memory_size: usize,
    /// Draws before a recent variant is accepted anyway
    pub max_attempts: u32,
}

impl Default for SpawnerTuning {
    fn default() -> Self {
        Self {
            spawn_distance: 20.0,
            memory_size: 3,
            max_attempts: 10,
        }
    }
}

/// Score values and timers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    pub points_per_unit: f32,
    pub coin_value: i64,
    pub combo_bonus: i64,
    pub combo_duration: f32,
    pub obstacle_value: i64,
    pub milestone_bonus: i64,
    pub milestone_step: u32,
    pub spring_value: i64,
    pub breakable_value: i64,
    pub coin_loss_per_coin: i64,
    pub speed_check_interval: f32,
    pub sustained_speed_duration: f32,
    pub speed_bonus: i64,
    pub double_points_duration: f32,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            points_per_unit: 10.0,
            coin_value: 15,
            combo_bonus: 5,
            combo_duration: 1.0,
            obstacle_value: 100,
            milestone_bonus: 100,
            milestone_step: 10,
            spring_value: 25,
            breakable_value: 50,
            coin_loss_per_coin: 10,
            speed_check_interval: 0.1,
            sustained_speed_duration: 3.0,
            speed_bonus: 50,
            double_points_duration: 3.0,
        }
    }
}

/// Hazards and delayed effects
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    pub stun_duration: f32,
    pub coin_loss_min: u32,
    pub coin_loss_max: u32,
    pub gate_bounce_speed: f32,
    pub death_delay: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            stun_duration: 0.75,
            coin_loss_min: 1,
            coin_loss_max: 3,
            gate_bounce_speed: 5.0,
            death_delay: 1.2,
        }
    }
}

/// Run history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryTuning {
    pub capacity: usize,
}

impl Default for HistoryTuning {
    fn default() -> Self {
        Self { capacity: 15 }
    }
}

/// Complete balance sheet for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub motion: MotionTuning,
    pub coins: CoinTuning,
    pub spawner: SpawnerTuning,
    pub scoring: ScoreTuning,
    pub hazards: HazardTuning,
    pub history: HistoryTuning,
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> RunnerResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> RunnerResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> RunnerResult<()> {
        let m = &self.motion;
        require_positive("motion.walk_speed", m.walk_speed)?;
        require_non_negative("motion.jump_force", m.jump_force)?;
        require_non_negative("motion.slide_duration", m.slide_duration)?;
        require_non_negative("motion.slide_burst_factor", m.slide_burst_factor)?;
        require_positive("motion.acceleration_rate", m.acceleration_rate)?;
        require_positive("motion.acceleration", m.acceleration)?;
        require_positive("motion.deceleration", m.deceleration)?;
        require_positive("motion.ground_check_radius", m.ground_check_radius)?;
        require_non_negative("motion.coin_drop_cooldown", m.coin_drop_cooldown)?;

        let c = &self.coins;
        require_positive("coins.base_speed", c.base_speed)?;
        require_non_negative("coins.speed_per_coin", c.speed_per_coin)?;
        if c.max_speed < c.base_speed {
            return Err(RunnerError::InvalidTuning {
                name: "coins.max_speed",
                value: c.max_speed,
                expected: "[coins.base_speed, ∞)",
            });
        }

        require_positive("spawner.spawn_distance", self.spawner.spawn_distance)?;
        if self.spawner.max_attempts == 0 {
            return Err(RunnerError::InvalidTuning {
                name: "spawner.max_attempts",
                value: 0.0,
                expected: "[1, ∞)",
            });
        }

        let s = &self.scoring;
        require_positive("scoring.combo_duration", s.combo_duration)?;
        require_positive("scoring.speed_check_interval", s.speed_check_interval)?;
        require_positive("scoring.sustained_speed_duration", s.sustained_speed_duration)?;
        require_non_negative("scoring.double_points_duration", s.double_points_duration)?;
        if s.milestone_step == 0 {
            return Err(RunnerError::InvalidTuning {
                name: "scoring.milestone_step",
                value: 0.0,
                expected: "[1, ∞)",
            });
        }

        let h = &self.hazards;
        require_non_negative("hazards.stun_duration", h.stun_duration)?;
        require_non_negative("hazards.death_delay", h.death_delay)?;
        if h.coin_loss_max < h.coin_loss_min {
            return Err(RunnerError::InvalidTuning {
                name: "hazards.coin_loss_max",
                value: h.coin_loss_max as f32,
                expected: "[hazards.coin_loss_min, ∞)",
            });
        }

        Ok(())
    }
}
