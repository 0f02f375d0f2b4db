#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session that wires the segment world and the generation systems into a
//! single tick-driven pipeline.
//!
//! Each [`Session::tick`] advances difficulty, scrolls the world, measures
//! distance, raises levels at milestones, and tops up the segment stream.
//! Every event produced along the way is delivered to [`EventBus`]
//! listeners once the tick completes.

mod bus;

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use skyline_runner_core::{
    Command, ConfigError, DifficultyParameters, Event, LevelIndex, RunState, RunSummary,
    SegmentView, Viewport,
};
use skyline_runner_system_difficulty::{Difficulty, DifficultyConfig};
use skyline_runner_system_odometer::{Odometer, ScoreConfig};
use skyline_runner_system_placement::{Placement, PlacementConfig};
use skyline_runner_system_spawn_points::{SpawnPointConfig, SpawnPoints};
use skyline_runner_world::{self as world, query, AllocatorConfig, World};

pub use crate::bus::{EventBus, SubscriptionId};

/// Complete tuning of a session, one section per component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Difficulty ramp and milestone spacing.
    pub difficulty: DifficultyConfig,
    /// Spawn and despawn margins.
    pub allocator: AllocatorConfig,
    /// Segment sizing and placement.
    pub placement: PlacementConfig,
    /// Spawn-point density.
    pub spawn_points: SpawnPointConfig,
    /// Scoring weights.
    pub score: ScoreConfig,
}

impl SessionConfig {
    /// Validates every section, reporting the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.difficulty.validate()?;
        self.allocator.validate()?;
        self.placement.validate()?;
        self.spawn_points.validate()?;
        self.score.validate()
    }
}

/// Owns one instance of every generation component for a single player.
#[derive(Debug)]
pub struct Session {
    world: World,
    difficulty: Difficulty,
    placement: Placement,
    spawn_points: SpawnPoints,
    odometer: Odometer,
    rng: ChaCha8Rng,
    run_state: RunState,
    bus: EventBus,
    last_events: Vec<Event>,
}

impl Session {
    /// Creates a session with no personal best on record.
    pub fn new(config: SessionConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_personal_best(config, seed, None)
    }

    /// Creates a session whose first run is measured against `personal_best`.
    pub fn with_personal_best(
        config: SessionConfig,
        seed: u64,
        personal_best: Option<f32>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let SessionConfig {
            difficulty,
            allocator,
            placement,
            spawn_points,
            score,
        } = config;
        let max_scroll_speed = difficulty.max_scroll_speed;

        Ok(Self {
            world: World::new(allocator),
            difficulty: Difficulty::new(difficulty),
            placement: Placement::new(placement),
            spawn_points: SpawnPoints::new(spawn_points, max_scroll_speed),
            odometer: Odometer::new(score, personal_best),
            rng: ChaCha8Rng::seed_from_u64(seed),
            run_state: RunState::AwaitingLanding,
            bus: EventBus::new(),
            last_events: Vec::new(),
        })
    }

    /// Recomputes the spawn and despawn boundaries from the camera viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::ConfigureViewport { viewport },
            &mut events,
        );
        debug_assert!(events.is_empty(), "viewport changes are silent");
    }

    /// Updates the runner state that gates scrolling and the difficulty timer.
    pub fn set_run_state(&mut self, run_state: RunState) {
        if self.run_state != run_state {
            log::debug!("run state {:?} -> {:?}", self.run_state, run_state);
        }
        self.run_state = run_state;
    }

    /// Advances the session by `dt` and returns the events it produced.
    pub fn tick(&mut self, dt: Duration) -> &[Event] {
        let mut events = Vec::new();
        self.difficulty.advance(dt, self.run_state, &mut events);

        if self.run_state.is_active() && !dt.is_zero() {
            let scroll_speed = self.difficulty.current_parameters().scroll_speed;
            let mut scrolled = Vec::new();
            world::apply(
                &mut self.world,
                Command::Tick { dt, scroll_speed },
                &mut scrolled,
            );

            let mut progress = Vec::new();
            self.odometer.handle(&scrolled, &mut progress);
            let mut levels = Vec::new();
            self.difficulty.handle(&progress, &mut levels);

            events.extend(scrolled);
            events.extend(progress);
            events.extend(levels);
        }

        self.generate(&mut events);
        self.publish(events)
    }

    /// Appends at most one segment if the stream no longer reaches the spawn boundary.
    pub fn maybe_spawn_next(&mut self) -> &[Event] {
        let mut events = Vec::new();
        self.generate(&mut events);
        self.publish(events)
    }

    /// Starts a new run with a fresh random stream.
    ///
    /// The best distance so far carries over as the next run's personal best.
    pub fn restart(&mut self, seed: u64) -> &[Event] {
        let best = self.odometer.best_distance();
        let personal_best =
            (self.odometer.personal_best().is_some() || best > 0.0).then_some(best);

        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Reset, &mut events);
        self.placement.reset();
        self.odometer.reset(personal_best);
        self.difficulty.reset(&mut events);
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.run_state = RunState::AwaitingLanding;
        log::info!("run restarted with seed {seed:#x}");

        self.publish(events)
    }

    /// Credits a defeated enemy to the current run.
    pub fn record_kill(&mut self) -> &[Event] {
        let mut events = Vec::new();
        self.odometer.record_kill(&mut events);
        self.publish(events)
    }

    /// Registers a listener for every event the session publishes.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Removes a listener; returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Tallies of the current run.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        self.odometer.summary(self.difficulty.level())
    }

    /// Live segments ordered along the scroll axis.
    #[must_use]
    pub fn segments(&self) -> SegmentView {
        query::segment_view(&self.world)
    }

    /// Difficulty parameters currently in effect.
    #[must_use]
    pub fn parameters(&self) -> DifficultyParameters {
        self.difficulty.current_parameters()
    }

    /// Level reached in the current run.
    #[must_use]
    pub fn level(&self) -> LevelIndex {
        self.difficulty.level()
    }

    /// Ramp completion expressed as a percentage.
    #[must_use]
    pub fn difficulty_percentage(&self) -> f32 {
        self.difficulty.difficulty_percentage()
    }

    /// Runner state last reported by the host.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Events published by the most recent session operation.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.last_events
    }

    fn generate(&mut self, events: &mut Vec<Event>) {
        let parameters = self.difficulty.current_parameters();
        let level = self.difficulty.level();

        let mut requests = Vec::new();
        world::apply(&mut self.world, Command::MaybeSpawnNext, &mut requests);
        if requests.is_empty() {
            return;
        }

        let mut commands = Vec::new();
        self.placement
            .handle(&requests, level, parameters, &mut self.rng, &mut commands);
        let mut spawned = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut spawned);
        }

        let mut occupied = Vec::new();
        let mut attachments = Vec::new();
        self.spawn_points.handle(
            &spawned,
            parameters,
            &mut self.rng,
            &mut occupied,
            &mut attachments,
        );
        for command in attachments {
            world::apply(&mut self.world, command, &mut occupied);
        }

        events.extend(requests);
        events.extend(spawned);
        events.extend(occupied);
    }

    fn publish(&mut self, events: Vec<Event>) -> &[Event] {
        self.bus.publish(&events);
        self.last_events = events;
        &self.last_events
    }
}
