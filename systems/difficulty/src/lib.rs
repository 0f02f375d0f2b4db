#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Difficulty model that ramps scroll speed and gap bounds over active time
//! and raises the level index at fixed distance milestones.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use skyline_runner_core::{lerp, ConfigError, DifficultyParameters, Event, LevelIndex, RunState};

/// Tuning knobs for the difficulty ramp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DifficultyConfig {
    /// Scroll speed at the start of a run, in world units per second.
    pub base_scroll_speed: f32,
    /// Scroll speed reached once the ramp completes.
    pub max_scroll_speed: f32,
    /// Lower gap bound at the start of a run.
    pub base_min_gap: f32,
    /// Upper gap bound at the start of a run.
    pub base_max_gap: f32,
    /// Lower gap bound once the ramp completes.
    pub min_gap_limit: f32,
    /// Upper gap bound once the ramp completes.
    pub max_gap_limit: f32,
    /// Seconds of active play needed to reach the limit values.
    pub ramp_duration_secs: f32,
    /// Overall difficulty multiplier reached once the ramp completes.
    pub max_difficulty_multiplier: f32,
    /// Distance travelled per level increase.
    pub milestone_distance: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_scroll_speed: 5.0,
            max_scroll_speed: 15.0,
            base_min_gap: 3.0,
            base_max_gap: 6.0,
            min_gap_limit: 2.0,
            max_gap_limit: 4.0,
            ramp_duration_secs: 300.0,
            max_difficulty_multiplier: 2.0,
            milestone_distance: 1_000.0,
        }
    }
}

impl DifficultyConfig {
    /// Rejects ranges and durations that cannot drive a monotonic ramp.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_non_negative("difficulty.base_scroll_speed", self.base_scroll_speed)?;
        ConfigError::require_positive("difficulty.max_scroll_speed", self.max_scroll_speed)?;
        ConfigError::require_ordered(
            "difficulty.scroll_speed",
            self.base_scroll_speed,
            self.max_scroll_speed,
        )?;
        ConfigError::require_non_negative("difficulty.base_min_gap", self.base_min_gap)?;
        ConfigError::require_non_negative("difficulty.min_gap_limit", self.min_gap_limit)?;
        ConfigError::require_ordered("difficulty.base_gap", self.base_min_gap, self.base_max_gap)?;
        ConfigError::require_ordered(
            "difficulty.gap_limit",
            self.min_gap_limit,
            self.max_gap_limit,
        )?;
        ConfigError::require_positive("difficulty.ramp_duration_secs", self.ramp_duration_secs)?;
        ConfigError::require_positive(
            "difficulty.max_difficulty_multiplier",
            self.max_difficulty_multiplier,
        )?;
        ConfigError::require_positive("difficulty.milestone_distance", self.milestone_distance)
    }

    /// Parameters in effect before any active time accumulates.
    #[must_use]
    pub fn base_parameters(&self) -> DifficultyParameters {
        DifficultyParameters {
            scroll_speed: self.base_scroll_speed,
            min_gap: self.base_min_gap,
            max_gap: self.base_max_gap,
        }
    }
}

/// Pure system that owns the run's difficulty timer and milestone counter.
#[derive(Debug)]
pub struct Difficulty {
    config: DifficultyConfig,
    elapsed: Duration,
    level: LevelIndex,
    last_milestone: u64,
    last_distance: f32,
    published: Option<DifficultyParameters>,
}

impl Difficulty {
    /// Creates a difficulty model sitting at the base of its ramp.
    #[must_use]
    pub fn new(config: DifficultyConfig) -> Self {
        Self {
            config,
            elapsed: Duration::ZERO,
            level: LevelIndex::START,
            last_milestone: 0,
            last_distance: 0.0,
            published: None,
        }
    }

    /// Configuration the model was created with.
    #[must_use]
    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    /// Accumulates active time and publishes parameters that changed.
    ///
    /// The first call of a run publishes the parameters in effect whatever
    /// the run state. After that, nothing happens unless `run_state` is
    /// active, and a zero `dt` is a no-op.
    pub fn advance(&mut self, dt: Duration, run_state: RunState, out: &mut Vec<Event>) {
        if self.published.is_none() {
            self.publish(out);
        }
        if !run_state.is_active() || dt.is_zero() {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        self.publish(out);
    }

    /// Returns to the base of the ramp and republishes base parameters.
    pub fn reset(&mut self, out: &mut Vec<Event>) {
        self.elapsed = Duration::ZERO;
        self.level = LevelIndex::START;
        self.last_milestone = 0;
        self.last_distance = 0.0;
        self.published = None;
        self.publish(out);
    }

    /// Interpolates the current parameters from elapsed active time.
    #[must_use]
    pub fn current_parameters(&self) -> DifficultyParameters {
        let progress = self.normalized_progress();
        DifficultyParameters {
            scroll_speed: lerp(
                self.config.base_scroll_speed,
                self.config.max_scroll_speed,
                progress,
            ),
            min_gap: lerp(self.config.base_min_gap, self.config.min_gap_limit, progress),
            max_gap: lerp(self.config.base_max_gap, self.config.max_gap_limit, progress),
        }
    }

    /// Fraction of the ramp completed, in `[0, 1]`.
    #[must_use]
    pub fn normalized_progress(&self) -> f32 {
        (self.elapsed.as_secs_f32() / self.config.ramp_duration_secs).clamp(0.0, 1.0)
    }

    /// Ramp completion expressed as a percentage.
    #[must_use]
    pub fn difficulty_percentage(&self) -> f32 {
        self.normalized_progress() * 100.0
    }

    /// Overall multiplier growing from one toward the configured maximum.
    #[must_use]
    pub fn difficulty_multiplier(&self) -> f32 {
        lerp(
            1.0,
            self.config.max_difficulty_multiplier,
            self.normalized_progress(),
        )
    }

    /// Active time accumulated since the last reset.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Level reached in the current run.
    #[must_use]
    pub fn level(&self) -> LevelIndex {
        self.level
    }

    /// Raises the level once for every milestone crossed by `distance`.
    ///
    /// `distance` must never decrease between calls within a run.
    pub fn on_distance_update(&mut self, distance: f32, out: &mut Vec<Event>) {
        debug_assert!(
            distance >= self.last_distance,
            "distance decreased from {} to {}",
            self.last_distance,
            distance
        );
        self.last_distance = distance;

        let milestone = (distance / self.config.milestone_distance).floor().max(0.0) as u64;
        while self.last_milestone < milestone {
            self.last_milestone += 1;
            self.level = self.level.next();
            log::info!(
                "level {} reached at distance {:.1}",
                self.level.get(),
                distance
            );
            out.push(Event::LevelIncreased { level: self.level });
        }
    }

    /// Consumes distance updates from the event stream.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Event>) {
        for event in events {
            if let Event::DistanceUpdated { distance } = event {
                self.on_distance_update(*distance, out);
            }
        }
    }

    fn publish(&mut self, out: &mut Vec<Event>) {
        let parameters = self.current_parameters();
        if self.published == Some(parameters) {
            return;
        }

        self.published = Some(parameters);
        out.push(Event::DifficultyParametersChanged { parameters });
    }
}
