//! Headless demo: a simple bot plays one run and the score is appended to
//! the run history.
//!
//! Usage: coin-dash [seed] [seconds] [history.json] [tuning.json]

use coin_dash::sim::{
    FlatGround, FrameStepper, MoveIntent, RunState, ScoreCategory, SegmentLibrary, TickInput,
};
use coin_dash::{RunHistory, RunnerResult, Tuning};

const FRAME_DT: f32 = 1.0 / 60.0;
/// How far ahead the bot looks for spikes
const JUMP_LOOKAHEAD: f32 = 1.2;
/// Segments further behind the player than this are dropped
const KEEP_BEHIND: f32 = 30.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Coin Dash (headless) starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Headless demo is native only
}

fn run() -> RunnerResult<()> {
    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42u64);
    let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0f32);
    let history_path = args.next().unwrap_or_else(|| "run_history.json".to_string());
    let tuning = match args.next() {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };

    let capacity = tuning.history.capacity;
    let mut run = RunState::new(seed, tuning, SegmentLibrary::standard(), FlatGround::standing_at(0.0))?;
    let mut stepper = FrameStepper::new();

    let frames = (seconds / FRAME_DT).ceil() as u32;
    for frame in 0..frames {
        let x = run.player.position.x;
        let input = TickInput {
            direction: MoveIntent::None,
            autorun_toggle: frame == 0,
            jump: run.generator.hazard_ahead(x, JUMP_LOOKAHEAD).is_some(),
            ..Default::default()
        };
        stepper.frame(&mut run, &input, FRAME_DT);

        for cue in run.drain_cues() {
            log::debug!("{:.2}s {:?}", run.clock, cue);
        }
        let evicted = run.generator.evict_before(x - KEEP_BEHIND);
        if evicted > 0 {
            log::debug!("Evicted {} segments", evicted);
        }

        if run.is_over() {
            break;
        }
    }

    let snapshot = run.snapshot();
    let score = run.final_score().unwrap_or_else(|| run.score.total());
    log::info!(
        "Finished at x={:.1} with {} coins after {:.1}s",
        snapshot.position.x,
        snapshot.coins,
        run.clock
    );
    for category in ScoreCategory::ALL {
        log::info!("  {:<20} {:>6}", category.label(), run.score.breakdown().get(category));
    }
    log::info!("  {:<20} {:>6}", "total", score);

    let mut history = RunHistory::load(&history_path, capacity)?;
    let entry = history.record(score);
    history.save(&history_path)?;

    println!("Run {}: {}", entry.run, entry.score);
    for line in history.leaderboard_lines() {
        println!("  {}", line);
    }
    Ok(())
}
