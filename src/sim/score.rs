//! Scoring
//!
//! Every point goes through `ScoreEngine::award`, which updates the grand
//! total and one category in the same call. The breakdown therefore always
//! sums to the total, including the (negative) coin-loss penalties.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::motion::PlayerSnapshot;
use super::segment::TriggerId;
use crate::tuning::ScoreTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreCategory {
    Distance,
    Coin,
    Combo,
    Obstacle,
    Milestone,
    Spring,
    Breakable,
    SpeedBonus,
    CoinLossPenalty,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 9] = [
        ScoreCategory::Distance,
        ScoreCategory::Coin,
        ScoreCategory::Combo,
        ScoreCategory::Obstacle,
        ScoreCategory::Milestone,
        ScoreCategory::Spring,
        ScoreCategory::Breakable,
        ScoreCategory::SpeedBonus,
        ScoreCategory::CoinLossPenalty,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScoreCategory::Distance => "Distance",
            ScoreCategory::Coin => "Coins",
            ScoreCategory::Combo => "Combo",
            ScoreCategory::Obstacle => "Obstacles",
            ScoreCategory::Milestone => "Milestones",
            ScoreCategory::Spring => "Springs",
            ScoreCategory::Breakable => "Breakables",
            ScoreCategory::SpeedBonus => "Speed bonus",
            ScoreCategory::CoinLossPenalty => "Coins lost",
        }
    }
}

/// Points per category for the end-of-run screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub distance: i64,
    pub coin: i64,
    pub combo: i64,
    pub obstacle: i64,
    pub milestone: i64,
    pub spring: i64,
    pub breakable: i64,
    pub speed_bonus: i64,
    /// Stored as a negative number
    pub coin_loss_penalty: i64,
}

impl ScoreBreakdown {
    fn slot(&mut self, category: ScoreCategory) -> &mut i64 {
        match category {
            ScoreCategory::Distance => &mut self.distance,
            ScoreCategory::Coin => &mut self.coin,
            ScoreCategory::Combo => &mut self.combo,
            ScoreCategory::Obstacle => &mut self.obstacle,
            ScoreCategory::Milestone => &mut self.milestone,
            ScoreCategory::Spring => &mut self.spring,
            ScoreCategory::Breakable => &mut self.breakable,
            ScoreCategory::SpeedBonus => &mut self.speed_bonus,
            ScoreCategory::CoinLossPenalty => &mut self.coin_loss_penalty,
        }
    }

    pub fn get(&self, category: ScoreCategory) -> i64 {
        match category {
            ScoreCategory::Distance => self.distance,
            ScoreCategory::Coin => self.coin,
            ScoreCategory::Combo => self.combo,
            ScoreCategory::Obstacle => self.obstacle,
            ScoreCategory::Milestone => self.milestone,
            ScoreCategory::Spring => self.spring,
            ScoreCategory::Breakable => self.breakable,
            ScoreCategory::SpeedBonus => self.speed_bonus,
            ScoreCategory::CoinLossPenalty => self.coin_loss_penalty,
        }
    }

    pub fn sum(&self) -> i64 {
        ScoreCategory::ALL.iter().map(|&c| self.get(c)).sum()
    }
}

/// One award, as emitted to collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub category: ScoreCategory,
    pub amount: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub total: i64,
    pub breakdown: ScoreBreakdown,
    pub combo_active: bool,
    pub combo_remaining: f32,
    pub obstacles_passed: u32,
    pub next_milestone: u32,
    /// Seconds spent at or above target speed since the last bonus
    pub sustained_speed: f32,
}

#[derive(Debug, Clone)]
pub struct ScoreEngine {
    tuning: ScoreTuning,
    state: ScoreState,
    last_x: f32,
    /// Time banked toward the next speed check
    check_clock: f32,
    sustained_checks: u32,
    double_points_remaining: f32,
    fired: HashSet<TriggerId>,
    deltas: Vec<ScoreDelta>,
}

impl ScoreEngine {
    pub fn new(tuning: ScoreTuning, start_x: f32) -> Self {
        let next_milestone = tuning.milestone_step;
        Self {
            tuning,
            state: ScoreState {
                total: 0,
                breakdown: ScoreBreakdown::default(),
                combo_active: false,
                combo_remaining: 0.0,
                obstacles_passed: 0,
                next_milestone,
                sustained_speed: 0.0,
            },
            last_x: start_x,
            check_clock: 0.0,
            sustained_checks: 0,
            double_points_remaining: 0.0,
            fired: HashSet::new(),
            deltas: Vec::new(),
        }
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn total(&self) -> i64 {
        self.state.total
    }

    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.state.breakdown
    }

    /// Hand emitted deltas to the caller
    pub fn drain_deltas(&mut self) -> Vec<ScoreDelta> {
        std::mem::take(&mut self.deltas)
    }

    /// The single place the total changes
    pub fn award(&mut self, category: ScoreCategory, amount: i64) -> ScoreDelta {
        self.state.total += amount;
        *self.state.breakdown.slot(category) += amount;
        let delta = ScoreDelta {
            category,
            amount,
            total: self.state.total,
        };
        self.deltas.push(delta);
        delta
    }

    fn checks_for_bonus(&self) -> u32 {
        let checks = (self.tuning.sustained_speed_duration / self.tuning.speed_check_interval).round();
        (checks as u32).max(1)
    }

    /// Per-tick polling: distance, combo decay and the speed-check cadence
    pub fn update(&mut self, player: &PlayerSnapshot, dt: f32) {
        let x = player.position.x;
        let dx = x - self.last_x;
        if dx > 0.0 {
            let earned = (dx * self.tuning.points_per_unit).floor() as i64;
            if earned > 0 {
                self.award(ScoreCategory::Distance, earned);
            }
        }
        self.last_x = x;

        if self.state.combo_active {
            self.state.combo_remaining -= dt;
            if self.state.combo_remaining <= 0.0 {
                self.state.combo_remaining = 0.0;
                self.state.combo_active = false;
                log::debug!("Combo ended");
            }
        }

        if self.double_points_remaining > 0.0 {
            self.double_points_remaining = (self.double_points_remaining - dt).max(0.0);
        }

        self.check_clock += dt;
        while self.check_clock >= self.tuning.speed_check_interval {
            self.check_clock -= self.tuning.speed_check_interval;
            self.check_sustained_speed(player);
        }
    }

    /// One speed check. Any failing check wipes the streak.
    pub fn check_sustained_speed(&mut self, player: &PlayerSnapshot) {
        if player.current_speed >= player.target_speed {
            self.sustained_checks += 1;
            if self.sustained_checks >= self.checks_for_bonus() {
                self.sustained_checks = 0;
                self.award(ScoreCategory::SpeedBonus, self.tuning.speed_bonus);
                log::info!("Max speed sustained, +{}", self.tuning.speed_bonus);
            }
        } else {
            self.sustained_checks = 0;
        }
        self.state.sustained_speed = self.sustained_checks as f32 * self.tuning.speed_check_interval;
    }

    pub fn double_points_active(&self) -> bool {
        self.double_points_remaining > 0.0
    }

    pub fn activate_double_points(&mut self, duration: f32) {
        self.double_points_remaining = duration.max(0.0);
    }

    fn coin_multiplier(&self) -> i64 {
        if self.double_points_active() { 2 } else { 1 }
    }

    pub fn coin_pickup(&mut self, combo_eligible: bool) {
        let multiplier = self.coin_multiplier();
        self.award(ScoreCategory::Coin, self.tuning.coin_value * multiplier);
        if self.state.combo_active && combo_eligible {
            self.award(ScoreCategory::Combo, self.tuning.combo_bonus * multiplier);
        }
        self.state.combo_remaining = self.tuning.combo_duration;
        self.state.combo_active = true;
    }

    /// Returns false if this trigger already paid out
    pub fn obstacle_passed(&mut self, trigger: TriggerId) -> bool {
        if !self.fired.insert(trigger) {
            return false;
        }
        self.state.obstacles_passed += 1;
        self.award(ScoreCategory::Obstacle, self.tuning.obstacle_value);
        if self.state.obstacles_passed >= self.state.next_milestone {
            self.award(ScoreCategory::Milestone, self.tuning.milestone_bonus);
            self.state.next_milestone += self.tuning.milestone_step;
            log::info!(
                "Milestone: {} obstacles passed, next at {}",
                self.state.obstacles_passed,
                self.state.next_milestone
            );
        }
        true
    }

    pub fn spring_bounce(&mut self, trigger: TriggerId) -> bool {
        if !self.fired.insert(trigger) {
            return false;
        }
        self.award(ScoreCategory::Spring, self.tuning.spring_value);
        true
    }

    pub fn breakable_used(&mut self, trigger: TriggerId) -> bool {
        if !self.fired.insert(trigger) {
            return false;
        }
        self.award(ScoreCategory::Breakable, self.tuning.breakable_value);
        true
    }

    pub fn coin_loss(&mut self, count: u32) {
        if count == 0 {
            return;
        }
        let penalty = count as i64 * self.tuning.coin_loss_per_coin;
        self.award(ScoreCategory::CoinLossPenalty, -penalty);
        log::debug!("Lost {} coins, -{}", count, penalty);
    }
}
