//! Coin purse and the coin-driven speed curve
//!
//! More coins means a higher target speed, capped at `max_speed`. Dropping a
//! coin trades speed for control.

use serde::{Deserialize, Serialize};

use crate::tuning::CoinTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinPurse {
    count: u32,
    curve: CoinTuning,
    /// Seconds of double-coin pickups left
    double_coins_remaining: f32,
}

impl CoinPurse {
    pub fn new(curve: CoinTuning) -> Self {
        Self {
            count: 0,
            curve,
            double_coins_remaining: 0.0,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Target horizontal speed for the current coin count
    pub fn target_speed(&self) -> f32 {
        let speed = self.curve.base_speed + self.count as f32 * self.curve.speed_per_coin;
        speed.min(self.curve.max_speed)
    }

    /// Add collected coins, doubled while the power-up runs. Returns the amount added.
    pub fn add(&mut self, amount: u32) -> u32 {
        let amount = if self.double_coins_active() {
            amount.saturating_mul(2)
        } else {
            amount
        };
        self.count = self.count.saturating_add(amount);
        log::debug!("Coins +{} (total {})", amount, self.count);
        amount
    }

    /// Remove one coin. Returns false when the purse is empty.
    pub fn drop_one(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        log::debug!("Coin dropped (total {})", self.count);
        true
    }

    /// Remove up to `n` coins, returning how many were actually lost
    pub fn drop_many(&mut self, n: u32) -> u32 {
        let lost = n.min(self.count);
        self.count -= lost;
        lost
    }

    pub fn activate_double_coins(&mut self, duration: f32) {
        self.double_coins_remaining = duration.max(0.0);
    }

    pub fn double_coins_active(&self) -> bool {
        self.double_coins_remaining > 0.0
    }

    pub fn tick(&mut self, dt: f32) {
        if self.double_coins_remaining > 0.0 {
            self.double_coins_remaining = (self.double_coins_remaining - dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_curve_and_cap() {
        let mut purse = CoinPurse::new(CoinTuning::default());
        assert_eq!(purse.target_speed(), 5.0);
        purse.add(4);
        assert_eq!(purse.target_speed(), 6.0);
        purse.add(1000);
        assert_eq!(purse.target_speed(), 15.0);
    }

    #[test]
    fn test_drop_on_empty_is_declined() {
        let mut purse = CoinPurse::new(CoinTuning::default());
        assert!(!purse.drop_one());
        purse.add(1);
        assert!(purse.drop_one());
        assert_eq!(purse.count(), 0);
    }

    #[test]
    fn test_drop_many_clamps_to_count() {
        let mut purse = CoinPurse::new(CoinTuning::default());
        purse.add(2);
        assert_eq!(purse.drop_many(3), 2);
        assert_eq!(purse.count(), 0);
    }

    #[test]
    fn test_double_coins_expire() {
        let mut purse = CoinPurse::new(CoinTuning::default());
        purse.activate_double_coins(0.5);
        assert_eq!(purse.add(1), 2);
        purse.tick(0.6);
        assert!(!purse.double_coins_active());
        assert_eq!(purse.add(1), 1);
        assert_eq!(purse.count(), 3);
    }

    #[test]
    fn test_huge_coin_values_saturate() {
        let mut purse = CoinPurse::new(CoinTuning::default());
        purse.activate_double_coins(1.0);
        assert_eq!(purse.add(u32::MAX), u32::MAX);
        assert_eq!(purse.add(5), 10);
        assert_eq!(purse.count(), u32::MAX);
        assert_eq!(purse.target_speed(), 15.0);
    }
}
