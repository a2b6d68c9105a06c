//! Run state
//!
//! One `RunState` per run. It owns the player, the physics body, the level
//! generator and the score engine, and is the object collision collaborators
//! notify. Delayed effects are deadlines on the run clock, checked once per
//! tick.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{FlatGround, PhysicsBody};
use super::motion::{MotionIntegrator, PlayerSnapshot, PlayerState};
use super::score::ScoreEngine;
use super::segment::{FixtureKind, GateFailure, SegmentLibrary, TriggerId};
use super::spawner::SegmentGenerator;
use super::triggers::{Contact, is_side_impact};
use crate::error::RunnerResult;
use crate::tuning::Tuning;

/// Stream offset so hazard rolls do not share a sequence with level generation
const HAZARD_RNG_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RunPhase {
    Running,
    /// Player is dead; the run ends when the death deadline fires
    Dying,
    Over { final_score: i64 },
}

/// Value changes for animation, audio and HUD. Never needed for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Cue {
    Grounded(bool),
    Jumped,
    Slid,
    CoinDropped,
    CoinCollected { value: u32 },
    Bounced,
    Stunned,
    Recovered,
    Died,
    PlatformBroken(TriggerId),
    GateBlocked(TriggerId),
    GatePassed(TriggerId),
    RunOver { final_score: i64 },
}

/// Events collision and trigger collaborators report to the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    CoinPickup { value: u32, combo_eligible: bool },
    ObstaclePassed { trigger: TriggerId },
    SpringBounce { trigger: TriggerId },
    BreakablePlatformUsed { trigger: TriggerId },
    CoinLoss { count: u32 },
    WallImpact,
    SpeedGateResult { passed: bool, on_fail: GateFailure },
    /// Lethal hazard touched
    Killed,
}

/// Something that happens once the run clock reaches a deadline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    BreakPlatform(TriggerId),
    EndStun,
    EndRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    pub at: f64,
    pub effect: Effect,
}

/// Everything one run needs, with the physics body supplied by the caller
#[derive(Debug, Clone)]
pub struct RunState<B: PhysicsBody = FlatGround> {
    pub seed: u64,
    pub tuning: Tuning,
    /// Seconds since the run started
    pub clock: f64,
    pub phase: RunPhase,
    pub player: PlayerState,
    pub body: B,
    pub motion: MotionIntegrator,
    pub generator: SegmentGenerator,
    pub score: ScoreEngine,
    deadlines: Vec<Deadline>,
    cues: Vec<Cue>,
    rng: Pcg32,
}

impl RunState<FlatGround> {
    /// Default tuning, the built-in level set and a flat floor
    pub fn standard(seed: u64) -> RunnerResult<Self> {
        Self::new(seed, Tuning::default(), SegmentLibrary::standard(), FlatGround::standing_at(0.0))
    }
}

impl<B: PhysicsBody> RunState<B> {
    /// Validate the setup and build a run. Nothing is simulated until the
    /// first tick.
    pub fn new(seed: u64, tuning: Tuning, library: SegmentLibrary, body: B) -> RunnerResult<Self> {
        tuning.validate()?;

        let player = PlayerState::new(body.position(), &tuning.motion, tuning.coins.clone());
        let generator = SegmentGenerator::new(
            library,
            tuning.spawner.clone(),
            seed,
            player.target_speed,
        )?;
        let score = ScoreEngine::new(tuning.scoring.clone(), player.position.x);

        log::info!("Run started (seed {})", seed);
        Ok(Self {
            seed,
            motion: MotionIntegrator::new(tuning.motion.clone()),
            tuning,
            clock: 0.0,
            phase: RunPhase::Running,
            player,
            body,
            generator,
            score,
            deadlines: Vec::new(),
            cues: Vec::new(),
            rng: Pcg32::seed_from_u64(seed ^ HAZARD_RNG_STREAM),
        })
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.player.snapshot()
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, RunPhase::Over { .. })
    }

    pub fn final_score(&self) -> Option<i64> {
        match self.phase {
            RunPhase::Over { final_score } => Some(final_score),
            _ => None,
        }
    }

    pub fn push_cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    pub(crate) fn cues_mut(&mut self) -> &mut Vec<Cue> {
        &mut self.cues
    }

    /// Cues emitted since the last drain, oldest first
    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    pub fn deadlines(&self) -> &[Deadline] {
        &self.deadlines
    }

    pub fn schedule(&mut self, delay: f32, effect: Effect) {
        self.deadlines.push(Deadline {
            at: self.clock + delay.max(0.0) as f64,
            effect,
        });
    }

    /// Fire every deadline the clock has reached, earliest first
    pub fn fire_due_deadlines(&mut self) {
        let clock = self.clock;
        let (mut due, pending): (Vec<Deadline>, Vec<Deadline>) =
            self.deadlines.drain(..).partition(|d| d.at <= clock);
        self.deadlines = pending;
        due.sort_by(|a, b| a.at.total_cmp(&b.at));

        for deadline in due {
            self.apply_effect(deadline.effect);
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::BreakPlatform(trigger) => match self.generator.fixture_mut(trigger) {
                Some(fixture) => {
                    if let FixtureKind::Breakable { broken, .. } = &mut fixture.kind {
                        *broken = true;
                    }
                    fixture.active = false;
                    self.cues.push(Cue::PlatformBroken(trigger));
                    log::debug!("Platform {:?} broke", trigger);
                }
                None => log::warn!("Breakable platform {:?} no longer exists", trigger),
            },
            Effect::EndStun => {
                self.player.stunned = false;
                self.cues.push(Cue::Recovered);
            }
            Effect::EndRun => {
                let final_score = self.score.total();
                self.phase = RunPhase::Over { final_score };
                self.cues.push(Cue::RunOver { final_score });
                log::info!(
                    "Run over: score {} at x={:.1} after {:.1}s",
                    final_score,
                    self.player.position.x,
                    self.clock
                );
            }
        }
    }

    /// Entry point for collision and trigger collaborators
    pub fn notify(&mut self, event: GameEvent) {
        if self.is_over() {
            return;
        }
        match event {
            GameEvent::CoinPickup {
                value,
                combo_eligible,
            } => {
                let added = self.player.coins.add(value);
                self.player.target_speed = self.player.coins.target_speed();
                self.score.coin_pickup(combo_eligible);
                self.cues.push(Cue::CoinCollected { value: added });
            }
            GameEvent::ObstaclePassed { trigger } => {
                self.score.obstacle_passed(trigger);
            }
            GameEvent::SpringBounce { trigger } => {
                self.score.spring_bounce(trigger);
            }
            GameEvent::BreakablePlatformUsed { trigger } => {
                self.score.breakable_used(trigger);
            }
            GameEvent::CoinLoss { count } => self.score.coin_loss(count),
            GameEvent::WallImpact => self.wall_impact(),
            GameEvent::SpeedGateResult { passed, on_fail } => self.gate_result(passed, on_fail),
            GameEvent::Killed => self.kill(),
        }
    }

    /// Contact reported by the physics engine; only side-on hits count
    pub fn report_contact(&mut self, normal: Vec2) {
        if is_side_impact(normal) {
            self.notify(GameEvent::WallImpact);
        }
    }

    fn wall_impact(&mut self) {
        if self.player.stunned || !self.player.alive {
            return;
        }
        let hazards = &self.tuning.hazards;
        let to_lose = self.rng.random_range(hazards.coin_loss_min..=hazards.coin_loss_max);
        let stun = hazards.stun_duration;

        self.player.stunned = true;
        self.cues.push(Cue::Stunned);
        let lost = self.player.coins.drop_many(to_lose);
        self.player.target_speed = self.player.coins.target_speed();
        log::info!("Side wall hit: stunned for {:.2}s, lost {} coins", stun, lost);

        self.notify(GameEvent::CoinLoss { count: lost });
        self.schedule(stun, Effect::EndStun);
    }

    fn gate_result(&mut self, passed: bool, on_fail: GateFailure) {
        if passed {
            let duration = self.tuning.scoring.double_points_duration;
            self.player.coins.activate_double_coins(duration);
            self.score.activate_double_points(duration);
            log::info!("Gate passed, double points for {:.1}s", duration);
            return;
        }

        log::info!("Gate blocked ({:?})", on_fail);
        match on_fail {
            GateFailure::Kill => self.kill(),
            GateFailure::Bounce => {
                let bounce = -self.player.facing.sign() * self.tuning.hazards.gate_bounce_speed;
                self.player.velocity.x = bounce;
                self.body.set_velocity(self.player.velocity);
                self.cues.push(Cue::Bounced);
            }
            GateFailure::Block => {}
        }
    }

    /// Freeze the player; the run ends after the death delay
    pub fn kill(&mut self) {
        if !self.player.alive {
            return;
        }
        self.player.alive = false;
        self.player.velocity = Vec2::ZERO;
        self.body.set_velocity(Vec2::ZERO);
        self.phase = RunPhase::Dying;
        self.cues.push(Cue::Died);
        log::info!("Player died at x={:.1}", self.player.position.x);
        self.schedule(self.tuning.hazards.death_delay, Effect::EndRun);
    }

    /// Apply what the trigger pass detected this tick
    pub fn resolve_contact(&mut self, contact: Contact) {
        match contact {
            Contact::Coin { value, .. } => self.notify(GameEvent::CoinPickup {
                value,
                combo_eligible: true,
            }),
            Contact::ObstacleEnd { trigger } => self.notify(GameEvent::ObstaclePassed { trigger }),
            Contact::Spring {
                trigger,
                bounce_force,
            } => {
                self.player.velocity.y = bounce_force;
                self.body.set_velocity(self.player.velocity);
                self.cues.push(Cue::Bounced);
                self.notify(GameEvent::SpringBounce { trigger });
            }
            Contact::Breakable {
                trigger,
                break_delay,
            } => {
                self.notify(GameEvent::BreakablePlatformUsed { trigger });
                self.schedule(break_delay, Effect::BreakPlatform(trigger));
            }
            Contact::SpeedGate {
                trigger,
                passed,
                on_fail,
            } => {
                if passed {
                    self.cues.push(Cue::GatePassed(trigger));
                } else {
                    self.close_barrier(trigger);
                }
                self.notify(GameEvent::SpeedGateResult { passed, on_fail });
            }
            Contact::Spikes { .. } => self.notify(GameEvent::Killed),
            Contact::Wall { normal, .. } => self.report_contact(normal),
        }
    }

    fn close_barrier(&mut self, trigger: TriggerId) {
        let Some(fixture) = self.generator.fixture_mut(trigger) else {
            log::warn!("Speed gate {:?} no longer exists", trigger);
            return;
        };
        match &mut fixture.kind {
            FixtureKind::SpeedGate {
                has_barrier: true,
                barrier_closed,
                ..
            } => {
                *barrier_closed = true;
                self.cues.push(Cue::GateBlocked(trigger));
            }
            _ => log::warn!("Speed gate {:?} has no barrier to close", trigger),
        }
    }
}
