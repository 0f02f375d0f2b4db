#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn-point distributor that scatters enemy attachment points along the
//! top edge of freshly spawned segments.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use skyline_runner_core::{
    lerp, Command, ConfigError, DifficultyParameters, Event, Footprint, SegmentId, SegmentKind,
    SpawnCandidate,
};

/// Tuning knobs for spawn-point density.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnPointConfig {
    /// Distance between candidates at the base scroll speed.
    pub base_spacing: f32,
    /// Distance between candidates at the maximum scroll speed.
    pub limit_spacing: f32,
    /// Acceptance probability on ordinary segments.
    pub base_probability: f32,
    /// Acceptance probability on segments wider than the threshold.
    pub large_segment_probability: f32,
    /// Width above which a segment counts as large.
    pub large_segment_threshold: f32,
}

impl Default for SpawnPointConfig {
    fn default() -> Self {
        Self {
            base_spacing: 4.0,
            limit_spacing: 10.0,
            base_probability: 0.25,
            large_segment_probability: 0.45,
            large_segment_threshold: 400.0,
        }
    }
}

impl SpawnPointConfig {
    /// Rejects spacings and probabilities the distributor cannot sample.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("spawn_points.base_spacing", self.base_spacing)?;
        ConfigError::require_positive("spawn_points.limit_spacing", self.limit_spacing)?;
        ConfigError::require_probability("spawn_points.base_probability", self.base_probability)?;
        ConfigError::require_probability(
            "spawn_points.large_segment_probability",
            self.large_segment_probability,
        )?;
        ConfigError::require_non_negative(
            "spawn_points.large_segment_threshold",
            self.large_segment_threshold,
        )
    }
}

/// Pure system that samples spawn points for new segments.
#[derive(Debug)]
pub struct SpawnPoints {
    config: SpawnPointConfig,
    max_scroll_speed: f32,
}

impl SpawnPoints {
    /// Creates a distributor whose spacing saturates at `max_scroll_speed`.
    #[must_use]
    pub fn new(config: SpawnPointConfig, max_scroll_speed: f32) -> Self {
        Self {
            config,
            max_scroll_speed,
        }
    }

    /// Configuration the distributor was created with.
    #[must_use]
    pub fn config(&self) -> &SpawnPointConfig {
        &self.config
    }

    /// Candidate spacing for the current scroll speed.
    ///
    /// Faster runs spread candidates further apart.
    #[must_use]
    pub fn spacing(&self, parameters: DifficultyParameters) -> f32 {
        let progress = if self.max_scroll_speed > 0.0 {
            parameters.scroll_speed / self.max_scroll_speed
        } else {
            1.0
        };
        lerp(self.config.base_spacing, self.config.limit_spacing, progress)
    }

    /// Acceptance probability for a segment of the given width.
    #[must_use]
    pub fn spawn_probability(&self, width: f32) -> f32 {
        if width > self.config.large_segment_threshold {
            self.config.large_segment_probability
        } else {
            self.config.base_probability
        }
    }

    /// Lays candidates along the top edge from the left edge rightwards.
    ///
    /// Offsets start at `-width / 2` and stop before `width / 2`.
    #[must_use]
    pub fn candidates(&self, footprint: Footprint, spacing: f32) -> Vec<SpawnCandidate> {
        assert!(
            spacing.is_finite() && spacing > 0.0,
            "spawn-point spacing must be positive, got {spacing}"
        );

        let half_width = footprint.width() * 0.5;
        let weight = self.spawn_probability(footprint.width());
        let anchor = footprint.anchor();
        (0u32..)
            .map(|index| -half_width + index as f32 * spacing)
            .take_while(|offset| *offset < half_width)
            .map(|offset| SpawnCandidate {
                offset,
                position: anchor + Vec2::new(offset, 0.0),
                weight,
            })
            .collect()
    }

    /// Runs one independent trial per candidate and reports the accepted ones.
    pub fn populate<R: Rng + ?Sized>(
        &self,
        segment: SegmentId,
        footprint: Footprint,
        parameters: DifficultyParameters,
        rng: &mut R,
        out_events: &mut Vec<Event>,
        out_commands: &mut Vec<Command>,
    ) {
        let spacing = self.spacing(parameters);
        let mut offsets = Vec::new();
        for candidate in self.candidates(footprint, spacing) {
            if !rng.gen_bool(f64::from(candidate.weight)) {
                continue;
            }

            offsets.push(candidate.offset);
            out_events.push(Event::SpawnPointOccupied {
                segment,
                position: candidate.position,
            });
        }

        log::trace!(
            "segment {} received {} spawn points at spacing {:.2}",
            segment.get(),
            offsets.len(),
            spacing
        );
        if !offsets.is_empty() {
            out_commands.push(Command::AttachSpawnPoints { segment, offsets });
        }
    }

    /// Populates every non-initial segment announced in `events`.
    pub fn handle<R: Rng + ?Sized>(
        &self,
        events: &[Event],
        parameters: DifficultyParameters,
        rng: &mut R,
        out_events: &mut Vec<Event>,
        out_commands: &mut Vec<Command>,
    ) {
        for event in events {
            let Event::SegmentSpawned {
                segment,
                footprint,
                kind,
                ..
            } = event
            else {
                continue;
            };

            if *kind == SegmentKind::Initial {
                continue;
            }

            self.populate(
                *segment,
                *footprint,
                parameters,
                rng,
                out_events,
                out_commands,
            );
        }
    }
}
