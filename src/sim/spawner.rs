//! Procedural level generation
//!
//! The level is a chain of segments, each starting where the previous one
//! ended. The chain always reads `Start, Flat, (Obstacle, Flat)*`: when the
//! player gets within `spawn_distance` of the frontier, one obstacle and one
//! flat are appended. Recently used obstacle variants are avoided so the same
//! arrangement does not show up twice in a row.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::motion::PlayerSnapshot;
use super::segment::{
    Aabb, Fixture, FixtureKind, FixtureSpec, GateRequirement, Segment, SegmentId, SegmentKind,
    SegmentLibrary, SegmentTemplate, TriggerId,
};
use crate::error::{RunnerError, RunnerResult};
use crate::tuning::SpawnerTuning;

/// Result of one obstacle draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObstaclePick {
    pub index: usize,
    /// The retry budget ran out and a recent variant was accepted
    pub repeated: bool,
}

/// FIFO of the last few obstacle variants chosen
#[derive(Debug, Clone, Default)]
pub struct ObstacleMemory {
    window: usize,
    recent: VecDeque<usize>,
}

impl ObstacleMemory {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            recent: VecDeque::with_capacity(window + 1),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.recent.contains(&index)
    }

    /// Oldest first
    pub fn recent(&self) -> impl Iterator<Item = usize> + '_ {
        self.recent.iter().copied()
    }

    pub fn remember(&mut self, index: usize) {
        self.recent.push_back(index);
        while self.recent.len() > self.window {
            self.recent.pop_front();
        }
    }

    /// Draw a variant in `0..variant_count`, redrawing recent ones up to
    /// `max_attempts` times in total. The accepted index is remembered.
    pub fn pick(&mut self, rng: &mut impl Rng, variant_count: usize, max_attempts: u32) -> ObstaclePick {
        let mut attempts = 0;
        let index = loop {
            let index = rng.random_range(0..variant_count);
            attempts += 1;
            if !self.contains(index) || attempts >= max_attempts {
                break index;
            }
        };

        let repeated = self.contains(index);
        if repeated {
            log::debug!(
                "Obstacle retry budget exhausted after {} draws, repeating variant {}",
                attempts,
                index
            );
        }
        self.remember(index);
        ObstaclePick { index, repeated }
    }
}

/// Owns the generated chain and the frontier it grows from
#[derive(Debug, Clone)]
pub struct SegmentGenerator {
    library: SegmentLibrary,
    tuning: SpawnerTuning,
    rng: Pcg32,
    memory: ObstacleMemory,
    segments: Vec<Segment>,
    frontier: Vec2,
    farthest_x: f32,
    next_segment_id: u32,
    next_trigger_id: u32,
    last_pick: Option<ObstaclePick>,
}

/// End marker that moves the chain forward
fn forward_anchor(template: &SegmentTemplate) -> Option<Vec2> {
    template
        .end_anchor
        .filter(|end| end.x.is_finite() && end.x > 0.0)
}

/// Drop templates whose end marker is missing or does not advance; they cannot be chained from
fn usable(templates: Vec<SegmentTemplate>, role: &str) -> Vec<SegmentTemplate> {
    templates
        .into_iter()
        .filter(|t| {
            if forward_anchor(t).is_some() {
                return true;
            }
            match t.end_anchor {
                None => log::warn!("{} segment '{}' has no end anchor, skipping it", role, t.name),
                Some(end) => log::warn!(
                    "{} segment '{}' end anchor x={} does not advance, skipping it",
                    role,
                    t.name,
                    end.x
                ),
            }
            false
        })
        .collect()
}

impl SegmentGenerator {
    /// Validate the library, then lay down the start segment at the origin
    /// followed by one flat.
    ///
    /// `reference_speed` is used to roll speed-gate requirements in these
    /// first segments.
    pub fn new(
        library: SegmentLibrary,
        tuning: SpawnerTuning,
        seed: u64,
        reference_speed: f32,
    ) -> RunnerResult<Self> {
        library.validate()?;
        let SegmentLibrary {
            start,
            flats,
            obstacles,
        } = library;
        let obstacles = usable(obstacles, "Obstacle");
        if obstacles.is_empty() {
            return Err(RunnerError::NoObstacleVariants);
        }
        let flats = usable(flats, "Flat");
        if flats.is_empty() {
            return Err(RunnerError::NoFlatVariants);
        }

        let mut generator = Self {
            library: SegmentLibrary {
                start,
                flats,
                obstacles,
            },
            memory: ObstacleMemory::new(tuning.memory_size),
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            segments: Vec::new(),
            frontier: Vec2::ZERO,
            farthest_x: 0.0,
            next_segment_id: 1,
            next_trigger_id: 1,
            last_pick: None,
        };

        let start_end = generator.spawn(SegmentKind::Start, 0, Vec2::ZERO, reference_speed);
        let flat = generator.random_flat();
        let flat_end = generator.spawn(SegmentKind::Flat, flat, start_end, reference_speed);
        generator.set_frontier(flat_end);

        log::info!(
            "Level seeded: {} obstacle / {} flat variants, frontier at {:.1}",
            generator.library.obstacles.len(),
            generator.library.flats.len(),
            generator.frontier.x
        );
        Ok(generator)
    }

    /// Extend the chain if the player is close to the frontier.
    /// Returns the ids of segments spawned this call (empty or one pair).
    pub fn advance(&mut self, player: &PlayerSnapshot) -> Vec<SegmentId> {
        if player.position.distance(self.frontier) >= self.tuning.spawn_distance {
            return Vec::new();
        }

        let pick = self
            .memory
            .pick(&mut self.rng, self.library.obstacles.len(), self.tuning.max_attempts);
        self.last_pick = Some(pick);

        let reference = player.target_speed;
        let obstacle_end = self.spawn(SegmentKind::Obstacle, pick.index, self.frontier, reference);
        let obstacle_id = self.last_segment_id();

        let flat = self.random_flat();
        let flat_end = self.spawn(SegmentKind::Flat, flat, obstacle_end, reference);
        let flat_id = self.last_segment_id();
        self.set_frontier(flat_end);

        log::debug!(
            "Spawned obstacle '{}' and flat '{}', frontier now {:.1}",
            self.library.obstacles[pick.index].name,
            self.library.flats[flat].name,
            self.frontier.x
        );
        vec![obstacle_id, flat_id]
    }

    fn random_flat(&mut self) -> usize {
        self.rng.random_range(0..self.library.flats.len())
    }

    fn last_segment_id(&self) -> SegmentId {
        SegmentId(self.next_segment_id - 1)
    }

    fn set_frontier(&mut self, frontier: Vec2) {
        self.frontier = frontier;
        self.farthest_x = self.farthest_x.max(frontier.x);
    }

    fn template(&self, kind: SegmentKind, variant: usize) -> &SegmentTemplate {
        match kind {
            SegmentKind::Start => &self.library.start,
            SegmentKind::Flat => &self.library.flats[variant],
            SegmentKind::Obstacle => &self.library.obstacles[variant],
        }
    }

    /// Instantiate a template at `anchor` and return its world end anchor
    fn spawn(&mut self, kind: SegmentKind, variant: usize, anchor: Vec2, reference_speed: f32) -> Vec2 {
        let template = self.template(kind, variant).clone();
        let end = match forward_anchor(&template) {
            Some(offset) => anchor + offset,
            None => {
                // Only the start template can get here; the pools are filtered
                log::warn!(
                    "Segment '{}' has no usable end anchor, chaining from its start",
                    template.name
                );
                anchor
            }
        };

        let fixtures = template
            .fixtures
            .iter()
            .map(|ft| {
                let id = TriggerId(self.next_trigger_id);
                self.next_trigger_id += 1;
                let bounds = Aabb::from_center(anchor + ft.offset, ft.half_extents);
                let (kind, active) = self.resolve_fixture(&ft.spec, reference_speed);
                Fixture {
                    id,
                    kind,
                    bounds,
                    active,
                    fired: false,
                    occupied: false,
                }
            })
            .collect();

        let id = SegmentId(self.next_segment_id);
        self.next_segment_id += 1;
        self.segments.push(Segment {
            id,
            kind,
            variant,
            name: template.name,
            start: anchor,
            end,
            fixtures,
        });
        end
    }

    /// Roll everything that is decided once at creation time
    fn resolve_fixture(&mut self, spec: &FixtureSpec, reference_speed: f32) -> (FixtureKind, bool) {
        match *spec {
            FixtureSpec::Coin {
                value,
                spawn_chance,
            } => {
                let active = match spawn_chance {
                    Some(chance) => self.rng.random::<f32>() <= chance,
                    None => true,
                };
                (FixtureKind::Coin { value }, active)
            }
            FixtureSpec::ObstacleEnd => (FixtureKind::ObstacleEnd, true),
            FixtureSpec::Spring { bounce_force } => (FixtureKind::Spring { bounce_force }, true),
            FixtureSpec::Breakable { break_delay } => (
                FixtureKind::Breakable {
                    break_delay,
                    broken: false,
                },
                true,
            ),
            FixtureSpec::SpeedGate {
                requirement,
                on_fail,
                has_barrier,
            } => {
                let required_speed = match requirement {
                    GateRequirement::Fixed(speed) => speed,
                    GateRequirement::AroundTarget { spread } if spread > 0.0 => {
                        (reference_speed + self.rng.random_range(-spread..=spread)).max(0.0)
                    }
                    GateRequirement::AroundTarget { .. } => reference_speed.max(0.0),
                };
                if !has_barrier {
                    log::warn!("Speed gate without a barrier; failures will not block");
                }
                (
                    FixtureKind::SpeedGate {
                        required_speed,
                        on_fail,
                        has_barrier,
                        barrier_closed: false,
                    },
                    true,
                )
            }
            FixtureSpec::Spikes => (FixtureKind::Spikes, true),
            FixtureSpec::Wall => (FixtureKind::Wall, true),
        }
    }

    pub fn frontier(&self) -> Vec2 {
        self.frontier
    }

    /// Largest frontier X ever reached; never decreases
    pub fn farthest_x(&self) -> f32 {
        self.farthest_x
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Find a fixture anywhere in the chain
    pub fn fixture_mut(&mut self, id: TriggerId) -> Option<&mut Fixture> {
        self.segments.iter_mut().find_map(|s| s.fixture_mut(id))
    }

    pub fn memory(&self) -> &ObstacleMemory {
        &self.memory
    }

    pub fn last_pick(&self) -> Option<ObstaclePick> {
        self.last_pick
    }

    /// Drop segments that end behind `x`. Returns how many were removed.
    pub fn evict_before(&mut self, x: f32) -> usize {
        let before = self.segments.len();
        self.segments.retain(|s| s.end.x >= x);
        before - self.segments.len()
    }

    /// Nearest active hazard whose box starts ahead of `x`, within `range`
    pub fn hazard_ahead(&self, x: f32, range: f32) -> Option<&Fixture> {
        self.segments
            .iter()
            .flat_map(|s| s.fixtures.iter())
            .filter(|f| f.active && matches!(f.kind, FixtureKind::Spikes))
            .filter(|f| f.bounds.max.x >= x && f.bounds.min.x - x <= range)
            .min_by(|a, b| a.bounds.min.x.total_cmp(&b.bounds.min.x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn generator(seed: u64) -> SegmentGenerator {
        SegmentGenerator::new(SegmentLibrary::standard(), SpawnerTuning::default(), seed, 5.0).unwrap()
    }

    fn kinds(generator: &SegmentGenerator) -> Vec<SegmentKind> {
        generator.segments().iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_initial_chain() {
        let generator = generator(1);
        assert_eq!(kinds(&generator), vec![SegmentKind::Start, SegmentKind::Flat]);
        let segments = generator.segments();
        assert_eq!(segments[0].start, Vec2::ZERO);
        assert_eq!(segments[1].start, segments[0].end);
        assert_eq!(generator.frontier(), segments[1].end);
        assert_eq!(generator.farthest_x(), generator.frontier().x);
    }

    #[test]
    fn test_no_spawn_when_far_from_frontier() {
        let mut generator = generator(2);
        let far = PlayerSnapshot::at(generator.frontier() - Vec2::new(50.0, 0.0));
        assert!(generator.advance(&far).is_empty());
        assert_eq!(generator.segments().len(), 2);
    }

    #[test]
    fn test_spawns_exactly_one_pair_per_call() {
        let mut generator = generator(3);
        let near = PlayerSnapshot::at(generator.frontier());
        let spawned = generator.advance(&near);
        assert_eq!(spawned.len(), 2);
        let segments = generator.segments();
        assert_eq!(segments[2].kind, SegmentKind::Obstacle);
        assert_eq!(segments[3].kind, SegmentKind::Flat);
        assert_eq!(segments[2].start, segments[1].end);
        assert_eq!(segments[3].start, segments[2].end);
        assert_eq!(generator.frontier(), segments[3].end);
    }

    #[test]
    fn test_rejects_empty_obstacle_pool() {
        let mut lib = SegmentLibrary::standard();
        lib.obstacles.clear();
        let result = SegmentGenerator::new(lib, SpawnerTuning::default(), 0, 5.0);
        assert!(matches!(result, Err(RunnerError::NoObstacleVariants)));
    }

    #[test]
    fn test_obstacles_without_anchor_are_skipped() {
        let mut lib = SegmentLibrary::standard();
        for obstacle in lib.obstacles.iter_mut().skip(1) {
            obstacle.end_anchor = None;
        }
        let mut generator = SegmentGenerator::new(lib.clone(), SpawnerTuning::default(), 4, 5.0).unwrap();
        for _ in 0..5 {
            let near = PlayerSnapshot::at(generator.frontier());
            generator.advance(&near);
        }
        assert!(
            generator
                .segments()
                .iter()
                .filter(|s| s.kind == SegmentKind::Obstacle)
                .all(|s| s.name == lib.obstacles[0].name)
        );

        lib.obstacles[0].end_anchor = None;
        let result = SegmentGenerator::new(lib, SpawnerTuning::default(), 4, 5.0);
        assert!(matches!(result, Err(RunnerError::NoObstacleVariants)));
    }

    #[test]
    fn test_backward_anchors_are_skipped() {
        let mut lib = SegmentLibrary::standard();
        for obstacle in lib.obstacles.iter_mut().skip(1) {
            obstacle.end_anchor = Some(Vec2::new(-40.0, 0.0));
        }
        lib.flats[0].end_anchor = Some(Vec2::ZERO);
        let mut generator = SegmentGenerator::new(lib.clone(), SpawnerTuning::default(), 4, 5.0).unwrap();
        for _ in 0..10 {
            let before = generator.frontier().x;
            let near = PlayerSnapshot::at(generator.frontier());
            generator.advance(&near);
            assert!(generator.frontier().x > before);
        }
        assert!(
            generator
                .segments()
                .iter()
                .filter(|s| s.kind == SegmentKind::Obstacle)
                .all(|s| s.name == lib.obstacles[0].name)
        );
        assert!(
            generator
                .segments()
                .iter()
                .filter(|s| s.kind == SegmentKind::Flat)
                .all(|s| s.name == lib.flats[1].name)
        );

        lib.obstacles[0].end_anchor = Some(Vec2::new(f32::NAN, 0.0));
        let result = SegmentGenerator::new(lib, SpawnerTuning::default(), 4, 5.0);
        assert!(matches!(result, Err(RunnerError::NoObstacleVariants)));
    }

    #[test]
    fn test_start_with_backward_anchor_chains_from_origin() {
        let mut lib = SegmentLibrary::standard();
        lib.start.end_anchor = Some(Vec2::new(-5.0, 0.0));
        let generator = SegmentGenerator::new(lib, SpawnerTuning::default(), 7, 5.0).unwrap();
        assert_eq!(generator.segments()[0].end, Vec2::ZERO);
        assert!(generator.frontier().x > 0.0);
    }

    #[test]
    fn test_invalid_library_fails_at_setup() {
        let mut lib = SegmentLibrary::standard();
        if let FixtureSpec::Coin { spawn_chance, .. } = &mut lib.flats[0].fixtures[0].spec {
            *spawn_chance = Some(1.5);
        }
        let result = SegmentGenerator::new(lib, SpawnerTuning::default(), 8, 5.0);
        assert!(matches!(result, Err(RunnerError::InvalidTuning { .. })));
    }

    #[test]
    fn test_optional_coin_rolls() {
        let mut lib = SegmentLibrary::standard();
        for flat in &mut lib.flats {
            for fixture in &mut flat.fixtures {
                if let FixtureSpec::Coin { spawn_chance, .. } = &mut fixture.spec {
                    *spawn_chance = Some(0.0);
                }
            }
        }
        let generator = SegmentGenerator::new(lib, SpawnerTuning::default(), 5, 5.0).unwrap();
        // Chance 0 means never present; required coins on the start stay
        assert_eq!(generator.segments()[1].active_coins(), 0);
        assert_eq!(generator.segments()[0].active_coins(), 2);
    }

    #[test]
    fn test_gate_roll_around_target() {
        let mut generator = generator(6);
        let mut rolled = Vec::new();
        for _ in 0..60 {
            let mut near = PlayerSnapshot::at(generator.frontier());
            near.target_speed = 8.0;
            generator.advance(&near);
        }
        for segment in generator.segments() {
            for fixture in &segment.fixtures {
                if let FixtureKind::SpeedGate { required_speed, .. } = fixture.kind {
                    rolled.push(required_speed);
                }
            }
        }
        assert!(!rolled.is_empty());
        assert!(rolled.iter().all(|&s| (6.5..=9.5).contains(&s)));
    }

    #[test]
    fn test_memory_window_evicts_oldest() {
        let mut memory = ObstacleMemory::new(3);
        for i in 0..5 {
            memory.remember(i);
        }
        assert_eq!(memory.recent().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert!(!memory.contains(1));
    }

    #[test]
    fn test_single_variant_always_repeats() {
        let mut memory = ObstacleMemory::new(3);
        let mut rng = Pcg32::seed_from_u64(7);
        assert!(!memory.pick(&mut rng, 1, 10).repeated);
        let pick = memory.pick(&mut rng, 1, 10);
        assert_eq!(pick.index, 0);
        assert!(pick.repeated);
    }

    #[test]
    fn test_no_repeats_within_window_over_1000_draws() {
        let mut memory = ObstacleMemory::new(3);
        let mut rng = Pcg32::seed_from_u64(0xC0FFEE);
        let mut history: Vec<usize> = Vec::new();
        let mut exhausted = 0;

        for _ in 0..1000 {
            let pick = memory.pick(&mut rng, 5, 10);
            let window_start = history.len().saturating_sub(3);
            let in_window = history[window_start..].contains(&pick.index);
            assert_eq!(in_window, pick.repeated);
            if pick.repeated {
                exhausted += 1;
            }
            history.push(pick.index);
        }
        // (3/5)^10 per draw: a handful at most
        assert!(exhausted < 30, "too many retry exhaustions: {}", exhausted);
    }

    #[test]
    fn test_evict_before() {
        let mut generator = generator(8);
        for _ in 0..4 {
            let near = PlayerSnapshot::at(generator.frontier());
            generator.advance(&near);
        }
        let cut = generator.segments()[3].end.x;
        let removed = generator.evict_before(cut);
        assert_eq!(removed, 3);
        assert!(generator.segments().iter().all(|s| s.end.x >= cut));
        assert_eq!(generator.farthest_x(), generator.frontier().x);
    }

    #[test]
    fn test_hazard_ahead_finds_spikes() {
        let mut generator = generator(9);
        for _ in 0..10 {
            let near = PlayerSnapshot::at(generator.frontier());
            generator.advance(&near);
        }
        let spikes = generator
            .segments()
            .iter()
            .flat_map(|s| s.fixtures.iter())
            .find(|f| matches!(f.kind, FixtureKind::Spikes))
            .map(|f| f.bounds);
        if let Some(bounds) = spikes {
            let hazard = generator.hazard_ahead(bounds.min.x - 1.0, 2.0);
            assert!(hazard.is_some());
        }
    }

    proptest! {
        #[test]
        fn prop_chain_alternates_and_frontier_grows(seed in any::<u64>(), steps in 1usize..40) {
            let mut generator = generator(seed);
            let mut last_frontier = generator.frontier().x;
            let mut last_farthest = generator.farthest_x();
            for step in 0..steps {
                // Alternate near and far players
                let pos = if step % 3 == 2 {
                    generator.frontier() - Vec2::new(100.0, 0.0)
                } else {
                    generator.frontier() - Vec2::new(5.0, 0.0)
                };
                generator.advance(&PlayerSnapshot::at(pos));
                prop_assert!(generator.frontier().x >= last_frontier);
                prop_assert!(generator.farthest_x() >= last_farthest);
                last_frontier = generator.frontier().x;
                last_farthest = generator.farthest_x();
            }

            let kinds = kinds(&generator);
            prop_assert_eq!(kinds[0], SegmentKind::Start);
            prop_assert_eq!(kinds[1], SegmentKind::Flat);
            prop_assert_eq!((kinds.len() - 2) % 2, 0);
            for pair in kinds[2..].chunks(2) {
                prop_assert_eq!(pair[0], SegmentKind::Obstacle);
                prop_assert_eq!(pair[1], SegmentKind::Flat);
            }
            for pair in generator.segments().windows(2) {
                prop_assert_eq!(pair[1].start, pair[0].end);
            }
        }
    }
}
