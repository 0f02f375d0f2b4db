#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative segment world for Skyline Runner.
//!
//! The world is the only writer of the live segment collection. It scrolls
//! segments, releases the ones that leave the screen, and appends new ones
//! described by placement plans, broadcasting an [`Event`] for every change.

mod segments;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skyline_runner_core::{
    Command, ConfigError, Event, Footprint, PlacementPlan, SegmentState, Viewport,
};

use crate::segments::{Segment, SegmentTrack};

const DEFAULT_VIEWPORT_WIDTH: f32 = 20.0;

/// Margins that push the spawn and despawn boundaries past the viewport edges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AllocatorConfig {
    /// Distance beyond the right viewport edge at which new segments are requested.
    pub spawn_margin: f32,
    /// Distance beyond the left viewport edge a segment must pass before release.
    pub despawn_margin: f32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            spawn_margin: 2.0,
            despawn_margin: 2.0,
        }
    }
}

impl AllocatorConfig {
    /// Rejects margins that are not small positive distances.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("allocator.spawn_margin", self.spawn_margin)?;
        ConfigError::require_positive("allocator.despawn_margin", self.despawn_margin)
    }
}

/// Represents the authoritative Skyline Runner segment world.
#[derive(Debug)]
pub struct World {
    config: AllocatorConfig,
    viewport: Viewport,
    spawn_boundary: f32,
    despawn_boundary: f32,
    segments: SegmentTrack,
    tick_index: u64,
}

impl World {
    /// Creates an empty world framed by a default viewport.
    #[must_use]
    pub fn new(config: AllocatorConfig) -> Self {
        let mut world = Self {
            config,
            viewport: Viewport::centred(DEFAULT_VIEWPORT_WIDTH),
            spawn_boundary: 0.0,
            despawn_boundary: 0.0,
            segments: SegmentTrack::new(),
            tick_index: 0,
        };
        world.configure_viewport(world.viewport);
        world
    }

    fn configure_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.spawn_boundary = viewport.right() + self.config.spawn_margin;
        self.despawn_boundary = viewport.left() - self.config.despawn_margin;
    }

    fn scroll(&mut self, distance: f32) {
        for segment in self.segments.iter_mut() {
            segment.footprint = segment.footprint.translated(-distance);
            segment.state = SegmentState::Active;
        }
    }

    fn release_passed_segments(&mut self, out_events: &mut Vec<Event>) {
        while let Some(front) = self.segments.front() {
            if front.footprint.right() >= self.despawn_boundary {
                break;
            }

            let Some(released) = self.segments.pop_front() else {
                break;
            };
            log::trace!(
                "segment {} released at right edge {:.2}",
                released.id.get(),
                released.footprint.right()
            );
            out_events.push(Event::SegmentDespawned {
                segment: released.id,
            });
        }
    }

    fn needs_segment(&self) -> bool {
        match self.segments.back() {
            Some(rightmost) => rightmost.footprint.right() < self.spawn_boundary,
            None => true,
        }
    }

    fn spawn(&mut self, plan: PlacementPlan, out_events: &mut Vec<Event>) {
        assert!(
            plan.width.is_finite() && plan.width > 0.0,
            "placement produced an invalid segment width {}",
            plan.width
        );
        assert!(
            plan.gap.is_finite() && plan.gap >= 0.0,
            "placement produced an invalid gap {}",
            plan.gap
        );

        let half_width = plan.width * 0.5;
        let anchor_x = match self.segments.back() {
            Some(previous) => previous.footprint.right() + half_width + plan.gap,
            None => self.spawn_boundary + half_width,
        };
        let footprint = Footprint::new(Vec2::new(anchor_x, plan.elevation), plan.width);

        if let Some(previous) = self.segments.back() {
            assert!(
                !previous.footprint.overlaps(&footprint),
                "segment placed at [{}, {}] overlaps segment {}",
                footprint.left(),
                footprint.right(),
                previous.id.get()
            );
        }

        let id = self.segments.allocate_id();
        log::trace!(
            "segment {} spawned at [{:.2}, {:.2}] on tier {} ({:?})",
            id.get(),
            footprint.left(),
            footprint.right(),
            plan.tier.index(),
            plan.kind
        );
        self.segments.push_back(Segment {
            id,
            footprint,
            tier: plan.tier,
            kind: plan.kind,
            state: SegmentState::Spawned,
            spawn_points: Vec::new(),
        });
        out_events.push(Event::SegmentSpawned {
            segment: id,
            footprint,
            width: plan.width,
            kind: plan.kind,
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureViewport { viewport } => world.configure_viewport(viewport),
        Command::Tick { dt, scroll_speed } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            let distance = scroll_speed * dt.as_secs_f32();
            world.scroll(distance);
            out_events.push(Event::WorldScrolled { distance });
            world.release_passed_segments(out_events);
        }
        Command::MaybeSpawnNext => {
            if world.needs_segment() {
                out_events.push(Event::SegmentRequested {
                    previous: world.segments.back().map(Segment::snapshot),
                });
            }
        }
        Command::SpawnSegment { plan } => world.spawn(plan, out_events),
        Command::AttachSpawnPoints { segment, offsets } => {
            if let Some(stored) = world.segments.get_mut(segment) {
                stored.spawn_points = offsets;
            }
        }
        Command::Reset => {
            world.segments.clear();
            out_events.push(Event::SegmentsCleared);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use skyline_runner_core::{SegmentSnapshot, SegmentView, Viewport};

    use super::{Segment, World};

    /// Captures a read-only view of the live segments ordered by position.
    #[must_use]
    pub fn segment_view(world: &World) -> SegmentView {
        SegmentView::from_snapshots(world.segments.iter().map(Segment::snapshot).collect())
    }

    /// Snapshot of the rightmost live segment, if any.
    #[must_use]
    pub fn rightmost_segment(world: &World) -> Option<SegmentSnapshot> {
        world.segments.back().map(Segment::snapshot)
    }

    /// Number of live segments.
    #[must_use]
    pub fn segment_count(world: &World) -> usize {
        world.segments.len()
    }

    /// World-space x beyond which the rightmost segment must reach.
    #[must_use]
    pub fn spawn_boundary(world: &World) -> f32 {
        world.spawn_boundary
    }

    /// World-space x a segment's right edge must pass before release.
    #[must_use]
    pub fn despawn_boundary(world: &World) -> f32 {
        world.despawn_boundary
    }

    /// Viewport the boundaries were last derived from.
    #[must_use]
    pub fn viewport(world: &World) -> Viewport {
        world.viewport
    }

    /// Number of scroll ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use skyline_runner_core::{SegmentId, SegmentKind, VerticalTier};

    use super::*;

    fn plan(width: f32, gap: f32) -> PlacementPlan {
        PlacementPlan {
            width,
            tier: VerticalTier::LOWEST,
            elevation: -3.0,
            gap,
            kind: SegmentKind::Regular,
        }
    }

    fn configured_world() -> World {
        let mut world = World::new(AllocatorConfig::default());
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureViewport {
                viewport: Viewport::new(0.0, 10.0),
            },
            &mut events,
        );
        assert!(events.is_empty(), "viewport changes are silent");
        world
    }

    fn tick(world: &mut World, scroll_speed: f32) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_secs(1),
                scroll_speed,
            },
            &mut events,
        );
        events
    }

    #[test]
    fn viewport_configures_boundaries_with_margins() {
        let world = configured_world();
        assert_eq!(query::spawn_boundary(&world), 12.0);
        assert_eq!(query::despawn_boundary(&world), -2.0);
    }

    #[test]
    fn empty_world_requests_initial_segment() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(&mut world, Command::MaybeSpawnNext, &mut events);
        assert_eq!(events, vec![Event::SegmentRequested { previous: None }]);
    }

    #[test]
    fn initial_segment_is_anchored_beyond_spawn_boundary() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(50.0, 0.0),
            },
            &mut events,
        );

        let rightmost = query::rightmost_segment(&world).expect("segment spawned");
        assert_eq!(rightmost.footprint.left(), 12.0);
        assert_eq!(rightmost.footprint.right(), 62.0);
        assert_eq!(rightmost.state, SegmentState::Spawned);
        assert_eq!(
            events,
            vec![Event::SegmentSpawned {
                segment: SegmentId::new(0),
                footprint: rightmost.footprint,
                width: 50.0,
                kind: SegmentKind::Regular,
            }]
        );
    }

    #[test]
    fn next_segment_is_anchored_after_previous_right_edge_and_gap() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(10.0, 0.0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(20.0, 3.0),
            },
            &mut events,
        );

        let view = query::segment_view(&world);
        let segments: Vec<_> = view.iter().collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].footprint.left(), 25.0);
        assert_eq!(segments[1].footprint.anchor().x, 35.0);
        assert_eq!(segments[1].footprint.top(), -3.0);
    }

    #[test]
    fn no_request_while_rightmost_reaches_past_spawn_boundary() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(10.0, 0.0),
            },
            &mut events,
        );
        events.clear();

        apply(&mut world, Command::MaybeSpawnNext, &mut events);
        assert!(events.is_empty());

        let _ = tick(&mut world, 11.0);
        apply(&mut world, Command::MaybeSpawnNext, &mut events);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Event::SegmentRequested { previous: Some(snapshot) } if snapshot.id == SegmentId::new(0)
        ));
    }

    #[test]
    fn segment_is_released_on_the_tick_it_passes_the_despawn_boundary() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(10.0, 0.0),
            },
            &mut events,
        );
        assert_eq!(
            query::rightmost_segment(&world).map(|s| s.footprint.right()),
            Some(22.0)
        );

        let events = tick(&mut world, 23.0);
        assert_eq!(query::segment_count(&world), 1, "right edge at -1 stays");
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::SegmentDespawned { .. })));

        let events = tick(&mut world, 4.0);
        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced {
                    dt: Duration::from_secs(1)
                },
                Event::WorldScrolled { distance: 4.0 },
                Event::SegmentDespawned {
                    segment: SegmentId::new(0)
                },
            ]
        );
        assert_eq!(query::segment_count(&world), 0);

        let events = tick(&mut world, 4.0);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::SegmentDespawned { .. })));
    }

    #[test]
    fn scrolling_promotes_spawned_segments_to_active() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(10.0, 0.0),
            },
            &mut events,
        );
        let _ = tick(&mut world, 0.0);
        let snapshot = query::rightmost_segment(&world).expect("segment present");
        assert_eq!(snapshot.state, SegmentState::Active);
        assert_eq!(snapshot.footprint.left(), 12.0);
        assert_eq!(query::tick_index(&world), 1);
    }

    #[test]
    fn spawn_points_attach_to_live_segments_only() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(10.0, 0.0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::AttachSpawnPoints {
                segment: SegmentId::new(0),
                offsets: vec![-5.0, -1.0, 3.0],
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::AttachSpawnPoints {
                segment: SegmentId::new(9),
                offsets: vec![0.0],
            },
            &mut events,
        );

        let snapshot = query::rightmost_segment(&world).expect("segment present");
        assert_eq!(snapshot.spawn_points, vec![-5.0, -1.0, 3.0]);
    }

    #[test]
    fn reset_clears_segments() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(10.0, 0.0),
            },
            &mut events,
        );
        events.clear();
        apply(&mut world, Command::Reset, &mut events);
        assert_eq!(events, vec![Event::SegmentsCleared]);
        assert!(query::segment_view(&world).is_empty());
    }

    #[test]
    fn viewport_resize_moves_boundaries_without_touching_segments() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(10.0, 0.0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ConfigureViewport {
                viewport: Viewport::new(-5.0, 30.0),
            },
            &mut events,
        );
        assert_eq!(query::spawn_boundary(&world), 32.0);
        assert_eq!(query::despawn_boundary(&world), -7.0);
        assert_eq!(query::viewport(&world).width(), 35.0);
        assert_eq!(query::segment_count(&world), 1);
    }

    #[test]
    #[should_panic(expected = "invalid segment width")]
    fn zero_width_placement_fails_loudly() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(0.0, 0.0),
            },
            &mut events,
        );
    }

    #[test]
    #[should_panic(expected = "invalid gap")]
    fn negative_gap_placement_fails_loudly() {
        let mut world = configured_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnSegment {
                plan: plan(10.0, -1.0),
            },
            &mut events,
        );
    }

    #[test]
    fn allocator_config_rejects_non_positive_margins() {
        let config = AllocatorConfig {
            spawn_margin: 0.0,
            ..AllocatorConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(AllocatorConfig::default().validate().is_ok());
    }
}
