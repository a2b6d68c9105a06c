//! Coin Dash - simulation core of a side-scrolling runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, level generation, triggers, scoring)
//! - `history`: Recent run scores
//! - `tuning`: Data-driven game balance
//! - `error`: Crate error type

pub mod error;
pub mod history;
pub mod sim;
pub mod tuning;

pub use error::{RunnerError, RunnerResult};
pub use history::RunHistory;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed physics timestep (50 Hz)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the stepper will simulate
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Player collision box, centered on the body origin
    pub const PLAYER_HALF_EXTENTS: Vec2 = Vec2::new(0.4, 1.0);
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}
