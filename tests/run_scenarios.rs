//! Whole-run scenarios driven through the frame stepper

use coin_dash::RunHistory;
use coin_dash::consts::SIM_DT;
use coin_dash::sim::{
    Cue, FixtureSpec, FixtureTemplate, FlatGround, FrameStepper, GateFailure, GateRequirement,
    MoveIntent, RunPhase, RunState, ScoreCategory, SegmentLibrary, SegmentTemplate, TickInput,
};
use coin_dash::tuning::Tuning;
use glam::Vec2;
use proptest::prelude::*;

fn coin(x: f32) -> FixtureTemplate {
    FixtureTemplate::new(
        FixtureSpec::Coin {
            value: 1,
            spawn_chance: None,
        },
        Vec2::new(x, 1.0),
        Vec2::splat(0.3),
    )
}

/// Short start with coins, one coinless flat and a single obstacle variant
fn library(obstacle: FixtureTemplate) -> SegmentLibrary {
    SegmentLibrary {
        start: SegmentTemplate::new("start", 10.0, vec![coin(2.0), coin(4.0), coin(6.0)]),
        flats: vec![SegmentTemplate::new("flat", 4.0, vec![])],
        obstacles: vec![SegmentTemplate::new(
            "only",
            6.0,
            vec![
                obstacle,
                FixtureTemplate::new(FixtureSpec::ObstacleEnd, Vec2::new(5.5, 2.0), Vec2::new(0.25, 2.0)),
            ],
        )],
    }
}

fn new_run(seed: u64, obstacle: FixtureTemplate) -> RunState {
    RunState::new(seed, Tuning::default(), library(obstacle), FlatGround::standing_at(0.0)).unwrap()
}

fn run_right(run: &mut RunState, stepper: &mut FrameStepper, frames: u32) -> Vec<Cue> {
    let input = TickInput {
        direction: MoveIntent::Right,
        ..Default::default()
    };
    let mut cues = Vec::new();
    for _ in 0..frames {
        stepper.frame(run, &input, SIM_DT);
        cues.extend(run.drain_cues());
        if run.is_over() {
            break;
        }
    }
    cues
}

#[test]
fn test_spikes_end_the_run_and_score_is_recorded() {
    let spikes = FixtureTemplate::new(FixtureSpec::Spikes, Vec2::new(2.0, 0.25), Vec2::new(0.5, 0.25));
    let mut run = new_run(1, spikes);
    let mut stepper = FrameStepper::new();

    let cues = run_right(&mut run, &mut stepper, 1500);
    assert!(cues.contains(&Cue::Died));
    let final_score = run.final_score().expect("run should be over");
    assert!(cues.contains(&Cue::RunOver { final_score }));
    assert_eq!(run.player.coins.count(), 3);
    assert!(final_score >= 45);

    let mut history = RunHistory::default();
    history.record(10);
    history.record(final_score);
    assert_eq!(history.best().map(|e| e.score), Some(final_score));
}

#[test]
fn test_wall_hit_stuns_and_costs_coins() {
    let wall = FixtureTemplate::new(FixtureSpec::Wall, Vec2::new(2.0, 2.0), Vec2::new(0.5, 2.0));
    let mut run = new_run(2, wall);
    let mut stepper = FrameStepper::new();

    let mut cues = Vec::new();
    for _ in 0..1500 {
        cues.extend(run_right(&mut run, &mut stepper, 1));
        if cues.contains(&Cue::Stunned) {
            break;
        }
    }
    assert!(run.player.stunned);
    let lost = 3 - run.player.coins.count() as i64;
    assert!((1..=3).contains(&lost));
    assert_eq!(
        run.score.breakdown().get(ScoreCategory::CoinLossPenalty),
        -10 * lost
    );

    // Stun wears off after 0.75 s
    let cues = run_right(&mut run, &mut stepper, 40);
    assert!(cues.contains(&Cue::Recovered));
    assert!(!run.player.stunned);
}

#[test]
fn test_impossible_gate_kills_when_configured() {
    let gate = FixtureTemplate::new(
        FixtureSpec::SpeedGate {
            requirement: GateRequirement::Fixed(100.0),
            on_fail: GateFailure::Kill,
            has_barrier: true,
        },
        Vec2::new(2.0, 2.0),
        Vec2::new(0.5, 2.0),
    );
    let mut run = new_run(3, gate);
    let mut stepper = FrameStepper::new();
    let cues = run_right(&mut run, &mut stepper, 1500);
    assert!(cues.iter().any(|c| matches!(c, Cue::GateBlocked(_))));
    assert!(cues.contains(&Cue::Died));
    assert!(run.is_over());
}

#[test]
fn test_open_gate_grants_double_points() {
    let gate = FixtureTemplate::new(
        FixtureSpec::SpeedGate {
            requirement: GateRequirement::Fixed(0.0),
            on_fail: GateFailure::Bounce,
            has_barrier: false,
        },
        Vec2::new(2.0, 2.0),
        Vec2::new(0.5, 2.0),
    );
    let mut run = new_run(4, gate);
    let mut stepper = FrameStepper::new();
    let mut passed = false;
    for _ in 0..1500 {
        let cues = run_right(&mut run, &mut stepper, 1);
        if cues.iter().any(|c| matches!(c, Cue::GatePassed(_))) {
            passed = true;
            break;
        }
    }
    assert!(passed);
    assert!(run.score.double_points_active());
    assert!(run.player.coins.double_coins_active());
    assert_eq!(run.phase, RunPhase::Running);
}

#[test]
fn test_obstacles_are_scored_once_each() {
    let spring = FixtureTemplate::new(
        FixtureSpec::Spring { bounce_force: 12.0 },
        Vec2::new(2.0, 0.2),
        Vec2::new(0.5, 0.2),
    );
    let mut run = new_run(5, spring);
    let mut stepper = FrameStepper::new();
    run_right(&mut run, &mut stepper, 1500);

    let breakdown = run.score.breakdown();
    let passed = run.score.state().obstacles_passed as i64;
    assert!(passed >= 2);
    assert_eq!(breakdown.get(ScoreCategory::Obstacle), passed * 100);
    // The last spring may be behind the player while its end trigger is not yet
    let springs = breakdown.get(ScoreCategory::Spring) / 25;
    assert!(springs == passed || springs == passed + 1);
    assert_eq!(run.score.total(), breakdown.sum());
}

#[test]
fn test_standard_run_is_reproducible() {
    let play = || {
        let mut run = RunState::standard(77).unwrap();
        let mut stepper = FrameStepper::new();
        for frame in 0..2000u32 {
            let x = run.player.position.x;
            let input = TickInput {
                autorun_toggle: frame == 0,
                jump: run.generator.hazard_ahead(x, 1.2).is_some(),
                ..Default::default()
            };
            stepper.frame(&mut run, &input, 1.0 / 60.0);
            if run.is_over() {
                break;
            }
        }
        let names: Vec<String> = run.generator.segments().iter().map(|s| s.name.clone()).collect();
        (names, run.score.total(), run.snapshot())
    };
    assert_eq!(play(), play());
}

proptest! {
    #[test]
    fn prop_timers_and_totals_hold_under_random_input(
        seed in any::<u64>(),
        frames in prop::collection::vec((0u8..3, any::<bool>(), any::<bool>(), any::<bool>(), 0.005f32..0.1), 1..300),
    ) {
        let mut run = RunState::standard(seed).unwrap();
        let mut stepper = FrameStepper::new();
        let max_speed = run.tuning.coins.max_speed;
        let mut farthest = run.generator.farthest_x();

        for (dir, jump, slide, coin_drop, dt) in frames {
            let direction = match dir {
                0 => MoveIntent::None,
                1 => MoveIntent::Left,
                _ => MoveIntent::Right,
            };
            let input = TickInput { direction, jump, slide, coin_drop, autorun_toggle: false };
            stepper.frame(&mut run, &input, dt);

            prop_assert!(run.player.slide_remaining >= 0.0);
            prop_assert!(run.score.state().combo_remaining >= 0.0);
            prop_assert!(run.player.target_speed <= max_speed);
            prop_assert_eq!(run.score.total(), run.score.breakdown().sum());
            prop_assert!(run.generator.farthest_x() >= farthest);
            farthest = run.generator.farthest_x();
        }
    }
}
