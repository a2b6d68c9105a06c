//! Fixed timestep simulation tick
//!
//! Physics runs on `SIM_DT` steps; triggers, the generator and scoring poll
//! once per frame. `FrameStepper` glues the two together for a render loop.

use serde::{Deserialize, Serialize};

use super::body::PhysicsBody;
use super::state::{GameEvent, RunState};
use super::triggers::collect_contacts;
use crate::consts::*;

/// Held horizontal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveIntent {
    #[default]
    None,
    Left,
    Right,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    pub direction: MoveIntent,
    pub jump: bool,
    pub slide: bool,
    /// Throw one coin away
    pub coin_drop: bool,
    pub autorun_toggle: bool,
}

impl TickInput {
    /// Merge a frame's input: direction is replaced, actions stay set until consumed
    pub fn latch(&mut self, frame: &TickInput) {
        self.direction = frame.direction;
        self.jump |= frame.jump;
        self.slide |= frame.slide;
        self.coin_drop |= frame.coin_drop;
        self.autorun_toggle |= frame.autorun_toggle;
    }

    /// Clear one-shot actions after a step used them
    pub fn clear_actions(&mut self) {
        self.jump = false;
        self.slide = false;
        self.coin_drop = false;
        self.autorun_toggle = false;
    }
}

/// One physics step: motion, then the body
pub fn fixed_tick<B: PhysicsBody>(run: &mut RunState<B>, input: &TickInput, dt: f32) {
    if run.is_over() {
        return;
    }

    let mut cues = std::mem::take(run.cues_mut());
    let report = run
        .motion
        .step(&mut run.player, &mut run.body, input, dt, &mut cues);
    *run.cues_mut() = cues;

    if report.coins_dropped > 0 {
        run.notify(GameEvent::CoinLoss {
            count: report.coins_dropped,
        });
    }

    run.body.step(dt);
    run.player.position = run.body.position();
    run.player.velocity = run.body.velocity();
}

/// Per-frame polling: deadlines, timers, triggers, level streaming, scoring
pub fn tick<B: PhysicsBody>(run: &mut RunState<B>, dt: f32) {
    if run.is_over() {
        return;
    }

    run.clock += dt as f64;
    run.fire_due_deadlines();
    if run.is_over() {
        return;
    }
    run.player.coins.tick(dt);

    let snapshot = run.snapshot();
    if snapshot.alive {
        let contacts = collect_contacts(run.generator.segments_mut(), &snapshot);
        for contact in contacts {
            run.resolve_contact(contact);
        }
    }

    // Contacts may have changed coins or speed
    let snapshot = run.snapshot();
    let spawned = run.generator.advance(&snapshot);
    if !spawned.is_empty() {
        log::debug!(
            "Spawned {} segments, frontier at {:.1}",
            spawned.len(),
            run.generator.frontier().x
        );
    }
    run.score.update(&snapshot, dt);
}

/// Accumulator loop for a variable frame rate
#[derive(Debug, Clone, Default)]
pub struct FrameStepper {
    accumulator: f32,
    pending: TickInput,
}

impl FrameStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions latched but not yet consumed by a fixed step
    pub fn pending(&self) -> &TickInput {
        &self.pending
    }

    /// Advance one rendered frame. Returns the number of fixed steps run.
    pub fn frame<B: PhysicsBody>(
        &mut self,
        run: &mut RunState<B>,
        input: &TickInput,
        frame_dt: f32,
    ) -> u32 {
        let frame_dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.pending.latch(input);
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            fixed_tick(run, &self.pending, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            self.pending.clear_actions();
        }

        tick(run, frame_dt);
        substeps
    }
}
