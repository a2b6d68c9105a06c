//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep for physics
//! - Seeded RNG only
//! - Stable iteration order (segments in spawn order, fixtures by trigger ID)
//! - No rendering, audio or platform dependencies

pub mod body;
pub mod coins;
pub mod motion;
pub mod score;
pub mod segment;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod triggers;

pub use body::{FlatGround, PhysicsBody};
pub use coins::CoinPurse;
pub use motion::{Facing, MotionIntegrator, PlayerSnapshot, PlayerState};
pub use score::{ScoreBreakdown, ScoreCategory, ScoreDelta, ScoreEngine, ScoreState};
pub use segment::{
    Fixture, FixtureKind, FixtureSpec, FixtureTemplate, GateFailure, GateRequirement, Segment,
    SegmentId, SegmentKind, SegmentLibrary, SegmentTemplate, TriggerId,
};
pub use spawner::{ObstacleMemory, SegmentGenerator};
pub use state::{Cue, Deadline, Effect, GameEvent, RunPhase, RunState};
pub use tick::{FrameStepper, MoveIntent, TickInput, fixed_tick, tick};
