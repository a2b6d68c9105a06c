//! Level segments
//!
//! A `SegmentTemplate` is an authored chunk of level: its end anchor relative
//! to its start, plus the fixtures (coins, hazards, triggers) placed on it.
//! The generator turns templates into `Segment`s anchored in world space.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{RunnerResult, require_non_negative, require_probability};

/// Segment role in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    Start,
    Flat,
    Obstacle,
}

/// Stable id of a spawned segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// Stable id of a spawned fixture; one-shot rewards are keyed by it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Speed a gate asks for
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GateRequirement {
    Fixed(f32),
    /// Rolled once at spawn, uniformly within `target ± spread`
    AroundTarget { spread: f32 },
}

/// What a failed gate does to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GateFailure {
    Kill,
    #[default]
    Bounce,
    /// Only close the barrier
    Block,
}

/// Fixture as authored in a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FixtureSpec {
    Coin {
        value: u32,
        /// Chance to be present; `None` means always present
        #[serde(default)]
        spawn_chance: Option<f32>,
    },
    ObstacleEnd,
    Spring {
        bounce_force: f32,
    },
    Breakable {
        break_delay: f32,
    },
    SpeedGate {
        requirement: GateRequirement,
        #[serde(default)]
        on_fail: GateFailure,
        #[serde(default)]
        has_barrier: bool,
    },
    Spikes,
    Wall,
}

impl FixtureSpec {
    pub fn validate(&self) -> RunnerResult<()> {
        match *self {
            FixtureSpec::Coin {
                spawn_chance: Some(chance),
                ..
            } => require_probability("fixture.spawn_chance", chance),
            FixtureSpec::SpeedGate { requirement, .. } => match requirement {
                GateRequirement::Fixed(speed) => require_non_negative("fixture.required_speed", speed),
                GateRequirement::AroundTarget { spread } => {
                    require_non_negative("fixture.speed_spread", spread)
                }
            },
            FixtureSpec::Spring { bounce_force } => require_non_negative("fixture.bounce_force", bounce_force),
            FixtureSpec::Breakable { break_delay } => require_non_negative("fixture.break_delay", break_delay),
            _ => Ok(()),
        }
    }
}

/// A fixture placed relative to its segment's start anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureTemplate {
    pub spec: FixtureSpec,
    pub offset: Vec2,
    pub half_extents: Vec2,
}

impl FixtureTemplate {
    pub fn new(spec: FixtureSpec, offset: Vec2, half_extents: Vec2) -> Self {
        Self {
            spec,
            offset,
            half_extents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTemplate {
    pub name: String,
    /// End marker relative to the start anchor. Segments chain from it.
    pub end_anchor: Option<Vec2>,
    #[serde(default)]
    pub fixtures: Vec<FixtureTemplate>,
}

impl SegmentTemplate {
    pub fn new(name: &str, length: f32, fixtures: Vec<FixtureTemplate>) -> Self {
        Self {
            name: name.to_string(),
            end_anchor: Some(Vec2::new(length, 0.0)),
            fixtures,
        }
    }
}

/// Fixture resolved into world space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FixtureKind {
    Coin { value: u32 },
    ObstacleEnd,
    Spring { bounce_force: f32 },
    Breakable { break_delay: f32, broken: bool },
    SpeedGate {
        required_speed: f32,
        on_fail: GateFailure,
        has_barrier: bool,
        barrier_closed: bool,
    },
    Spikes,
    Wall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: TriggerId,
    pub kind: FixtureKind,
    pub bounds: Aabb,
    /// Inactive fixtures are skipped entirely (rolled-out coins, collected coins, broken platforms)
    pub active: bool,
    /// Set once a one-shot fixture has fired
    pub fired: bool,
    /// Player overlapped this fixture last tick
    pub occupied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub kind: SegmentKind,
    pub variant: usize,
    pub name: String,
    pub start: Vec2,
    pub end: Vec2,
    pub fixtures: Vec<Fixture>,
}

impl Segment {
    pub fn fixture(&self, id: TriggerId) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.id == id)
    }

    pub fn fixture_mut(&mut self, id: TriggerId) -> Option<&mut Fixture> {
        self.fixtures.iter_mut().find(|f| f.id == id)
    }

    pub fn active_coins(&self) -> usize {
        self.fixtures
            .iter()
            .filter(|f| f.active && matches!(f.kind, FixtureKind::Coin { .. }))
            .count()
    }
}

/// All authored segments for a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentLibrary {
    pub start: SegmentTemplate,
    pub flats: Vec<SegmentTemplate>,
    pub obstacles: Vec<SegmentTemplate>,
}

impl SegmentLibrary {
    pub fn from_json(json: &str) -> RunnerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject fixture parameters the generator cannot roll with
    pub fn validate(&self) -> RunnerResult<()> {
        let templates = std::iter::once(&self.start)
            .chain(self.flats.iter())
            .chain(self.obstacles.iter());
        for template in templates {
            for fixture in &template.fixtures {
                fixture.spec.validate().inspect_err(|e| {
                    log::warn!("Segment '{}' has an invalid fixture: {}", template.name, e);
                })?;
            }
        }
        Ok(())
    }

    /// Built-in level set
    pub fn standard() -> Self {
        use FixtureSpec::*;

        let coin = |x: f32, y: f32, chance: Option<f32>| {
            FixtureTemplate::new(
                Coin {
                    value: 1,
                    spawn_chance: chance,
                },
                Vec2::new(x, y),
                Vec2::splat(0.3),
            )
        };
        let end_trigger = |x: f32| FixtureTemplate::new(ObstacleEnd, Vec2::new(x, 2.0), Vec2::new(0.25, 2.0));

        let start = SegmentTemplate::new("start", 10.0, vec![coin(6.0, 1.0, None), coin(8.0, 1.0, None)]);

        let flats = vec![
            SegmentTemplate::new(
                "flat_short",
                12.0,
                vec![
                    coin(3.0, 1.0, Some(0.75)),
                    coin(6.0, 1.0, Some(0.75)),
                    coin(9.0, 1.0, Some(0.75)),
                ],
            ),
            SegmentTemplate::new(
                "flat_long",
                18.0,
                vec![
                    coin(4.0, 1.0, Some(0.5)),
                    coin(5.0, 1.5, Some(0.5)),
                    coin(6.0, 1.0, Some(0.5)),
                    coin(12.0, 1.0, Some(0.9)),
                ],
            ),
        ];

        let obstacles = vec![
            SegmentTemplate::new(
                "spike_pit",
                12.0,
                vec![
                    FixtureTemplate::new(Spikes, Vec2::new(6.0, 0.25), Vec2::new(0.75, 0.25)),
                    coin(6.0, 3.0, Some(0.75)),
                    end_trigger(11.5),
                ],
            ),
            SegmentTemplate::new(
                "spring_wall",
                14.0,
                vec![
                    FixtureTemplate::new(
                        Spring { bounce_force: 20.0 },
                        Vec2::new(4.0, 0.2),
                        Vec2::new(0.5, 0.2),
                    ),
                    FixtureTemplate::new(Wall, Vec2::new(9.0, 2.0), Vec2::new(0.5, 2.0)),
                    coin(9.0, 6.0, None),
                    end_trigger(13.5),
                ],
            ),
            SegmentTemplate::new(
                "crumbling_bridge",
                12.0,
                vec![
                    FixtureTemplate::new(
                        Breakable { break_delay: 0.5 },
                        Vec2::new(6.0, 0.0),
                        Vec2::new(2.0, 0.3),
                    ),
                    coin(5.0, 1.0, Some(0.75)),
                    coin(7.0, 1.0, Some(0.75)),
                    end_trigger(11.5),
                ],
            ),
            SegmentTemplate::new(
                "speed_gate",
                14.0,
                vec![
                    FixtureTemplate::new(
                        SpeedGate {
                            requirement: GateRequirement::AroundTarget { spread: 1.5 },
                            on_fail: GateFailure::Bounce,
                            has_barrier: true,
                        },
                        Vec2::new(8.0, 2.0),
                        Vec2::new(0.5, 2.0),
                    ),
                    coin(3.0, 1.0, None),
                    coin(4.0, 1.0, None),
                    end_trigger(13.5),
                ],
            ),
            SegmentTemplate::new(
                "coin_hop",
                16.0,
                vec![
                    FixtureTemplate::new(Spikes, Vec2::new(5.0, 0.25), Vec2::new(0.5, 0.25)),
                    FixtureTemplate::new(Spikes, Vec2::new(11.0, 0.25), Vec2::new(0.5, 0.25)),
                    coin(5.0, 2.5, Some(0.6)),
                    coin(8.0, 1.0, Some(0.6)),
                    coin(11.0, 2.5, Some(0.6)),
                    end_trigger(15.5),
                ],
            ),
        ];

        Self {
            start,
            flats,
            obstacles,
        }
    }
}
