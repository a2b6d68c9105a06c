//! Trigger resolution
//!
//! Overlap tests between the player box and the fixtures the generator
//! spawned. Each fixture reacts on entry (the first tick of an overlap), so
//! standing inside a trigger does not repeat it. What a contact does to the
//! run is decided by `RunState`; this module only detects it.

use glam::Vec2;

use super::motion::PlayerSnapshot;
use super::segment::{Aabb, FixtureKind, GateFailure, Segment, TriggerId};
use crate::consts::PLAYER_HALF_EXTENTS;

/// A fixture the player just entered
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    Coin {
        trigger: TriggerId,
        value: u32,
    },
    ObstacleEnd {
        trigger: TriggerId,
    },
    Spring {
        trigger: TriggerId,
        bounce_force: f32,
    },
    Breakable {
        trigger: TriggerId,
        break_delay: f32,
    },
    SpeedGate {
        trigger: TriggerId,
        passed: bool,
        on_fail: GateFailure,
    },
    Spikes {
        trigger: TriggerId,
    },
    /// Contact normal points from the wall toward the player
    Wall {
        trigger: TriggerId,
        normal: Vec2,
    },
}

/// Player collision box
pub fn player_bounds(player: &PlayerSnapshot) -> Aabb {
    Aabb::from_center(player.position, PLAYER_HALF_EXTENTS)
}

/// Side-on hit: near-horizontal normal. Top and bottom bumps do not count.
pub fn is_side_impact(normal: Vec2) -> bool {
    normal.x.abs() > 0.8 && normal.y.abs() < 0.3
}

/// Walk every active fixture, update its occupancy and report entries.
pub fn collect_contacts(segments: &mut [Segment], player: &PlayerSnapshot) -> Vec<Contact> {
    let bounds = player_bounds(player);
    let mut contacts = Vec::new();

    for fixture in segments.iter_mut().flat_map(|s| s.fixtures.iter_mut()) {
        if !fixture.active {
            continue;
        }
        let overlapping = fixture.bounds.overlaps(&bounds);
        let entered = overlapping && !fixture.occupied;
        fixture.occupied = overlapping;
        if !entered {
            continue;
        }

        let trigger = fixture.id;
        // Landing checks compare the player origin with the fixture center
        let from_above = player.position.y > fixture.bounds.center().y;

        match fixture.kind {
            FixtureKind::Coin { value } => {
                fixture.active = false;
                fixture.fired = true;
                contacts.push(Contact::Coin { trigger, value });
            }
            FixtureKind::ObstacleEnd if !fixture.fired => {
                fixture.fired = true;
                contacts.push(Contact::ObstacleEnd { trigger });
            }
            FixtureKind::Spring { bounce_force } if from_above => {
                fixture.fired = true;
                contacts.push(Contact::Spring {
                    trigger,
                    bounce_force,
                });
            }
            FixtureKind::Breakable { break_delay, .. } if from_above && !fixture.fired => {
                fixture.fired = true;
                contacts.push(Contact::Breakable {
                    trigger,
                    break_delay,
                });
            }
            FixtureKind::SpeedGate {
                required_speed,
                on_fail,
                ..
            } if !fixture.fired => {
                fixture.fired = true;
                contacts.push(Contact::SpeedGate {
                    trigger,
                    passed: player.current_speed >= required_speed,
                    on_fail,
                });
            }
            FixtureKind::Spikes => contacts.push(Contact::Spikes { trigger }),
            FixtureKind::Wall => {
                let normal = if player.position.x < fixture.bounds.center().x {
                    Vec2::NEG_X
                } else {
                    Vec2::X
                };
                contacts.push(Contact::Wall { trigger, normal });
            }
            _ => {}
        }
    }

    contacts
}
