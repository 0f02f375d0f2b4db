#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gap and placement policy that sizes, elevates and spaces new segments.

use rand::Rng;
use serde::{Deserialize, Serialize};
use skyline_runner_core::{
    Command, ConfigError, DifficultyParameters, Event, LevelIndex, PlacementPlan, SegmentKind,
    SegmentSnapshot, VerticalTier,
};

/// Tuning knobs for segment sizing and placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    /// Narrowest regular segment.
    pub min_building_width: f32,
    /// Widest regular segment; also the width of the initial segment.
    pub max_building_width: f32,
    /// Probability that a gap separates a new segment from the previous one.
    pub gap_chance: f32,
    /// Allowed top-edge elevations, lowest first.
    pub tiers: Vec<f32>,
    /// Width of the oversized segment spawned after each level increase.
    pub set_piece_width: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            min_building_width: 20.0,
            max_building_width: 50.0,
            gap_chance: 1.0,
            tiers: vec![-4.0, -2.5, -1.0],
            set_piece_width: 450.0,
        }
    }
}

impl PlacementConfig {
    /// Rejects width ranges, probabilities and tier lists the policy cannot sample.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("placement.min_building_width", self.min_building_width)?;
        ConfigError::require_positive("placement.max_building_width", self.max_building_width)?;
        ConfigError::require_ordered(
            "placement.building_width",
            self.min_building_width,
            self.max_building_width,
        )?;
        ConfigError::require_probability("placement.gap_chance", self.gap_chance)?;
        ConfigError::require_positive("placement.set_piece_width", self.set_piece_width)?;
        ConfigError::require_ordered(
            "placement.set_piece_width",
            self.max_building_width,
            self.set_piece_width,
        )?;

        if self.tiers.is_empty() {
            return Err(ConfigError::NoTiers);
        }
        for (index, elevation) in self.tiers.iter().enumerate() {
            if !elevation.is_finite() {
                return Err(ConfigError::NotFinite {
                    field: "placement.tiers",
                    value: *elevation,
                });
            }
            if index > 0 && *elevation < self.tiers[index - 1] {
                return Err(ConfigError::UnorderedTiers { index });
            }
        }
        Ok(())
    }

    fn elevation(&self, tier: VerticalTier) -> f32 {
        self.tiers.get(tier.index()).copied().unwrap_or(self.tiers[0])
    }
}

/// Chooses width, tier and gap for the segment that follows `previous`.
///
/// With no previous segment the plan describes the initial segment. When
/// `current_level` differs from `previous_level` a set-piece is produced.
pub fn choose_placement<R: Rng + ?Sized>(
    previous: Option<&SegmentSnapshot>,
    current_level: LevelIndex,
    previous_level: LevelIndex,
    parameters: DifficultyParameters,
    config: &PlacementConfig,
    rng: &mut R,
) -> PlacementPlan {
    let Some(previous) = previous else {
        return PlacementPlan {
            width: config.max_building_width,
            tier: VerticalTier::LOWEST,
            elevation: config.elevation(VerticalTier::LOWEST),
            gap: 0.0,
            kind: SegmentKind::Initial,
        };
    };

    if current_level != previous_level {
        let gap = sample_gap(parameters, config, rng);
        return PlacementPlan {
            width: config.set_piece_width,
            tier: VerticalTier::LOWEST,
            elevation: config.elevation(VerticalTier::LOWEST),
            gap,
            kind: SegmentKind::SetPiece,
        };
    }

    let width = rng.gen_range(config.min_building_width..=config.max_building_width);
    let gap = sample_gap(parameters, config, rng);
    let tier = choose_tier(previous.tier, config.tiers.len(), rng);

    PlacementPlan {
        width,
        tier,
        elevation: config.elevation(tier),
        gap,
        kind: SegmentKind::Regular,
    }
}

fn sample_gap<R: Rng + ?Sized>(
    parameters: DifficultyParameters,
    config: &PlacementConfig,
    rng: &mut R,
) -> f32 {
    if !rng.gen_bool(f64::from(config.gap_chance)) {
        return 0.0;
    }

    let low = parameters.min_gap.min(parameters.max_gap);
    let high = parameters.min_gap.max(parameters.max_gap);
    rng.gen_range(low..=high)
}

/// From the lowest tier only the lowest two tiers are reachable, which rules
/// out consecutive maximal climbs.
fn choose_tier<R: Rng + ?Sized>(
    previous: VerticalTier,
    tier_count: usize,
    rng: &mut R,
) -> VerticalTier {
    let reachable = if previous.is_lowest() {
        tier_count.min(2)
    } else {
        tier_count
    };
    let index = rng.gen_range(0..reachable.max(1));
    VerticalTier::new(index as u32)
}

/// Pure system that answers segment requests with placement commands.
#[derive(Debug)]
pub struct Placement {
    config: PlacementConfig,
    consumed_level: LevelIndex,
}

impl Placement {
    /// Creates a placement policy using the supplied configuration.
    #[must_use]
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            consumed_level: LevelIndex::START,
        }
    }

    /// Configuration the policy was created with.
    #[must_use]
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Level whose transition was most recently turned into a set-piece.
    #[must_use]
    pub fn consumed_level(&self) -> LevelIndex {
        self.consumed_level
    }

    /// Forgets consumed level transitions so a new run starts clean.
    pub fn reset(&mut self) {
        self.consumed_level = LevelIndex::START;
    }

    /// Chooses the next placement and marks any pending level transition consumed.
    pub fn choose<R: Rng + ?Sized>(
        &mut self,
        previous: Option<&SegmentSnapshot>,
        current_level: LevelIndex,
        parameters: DifficultyParameters,
        rng: &mut R,
    ) -> PlacementPlan {
        let plan = choose_placement(
            previous,
            current_level,
            self.consumed_level,
            parameters,
            &self.config,
            rng,
        );
        if plan.kind == SegmentKind::SetPiece {
            log::debug!(
                "set-piece of width {:.1} for level {}",
                plan.width,
                current_level.get()
            );
        }
        self.consumed_level = current_level;
        plan
    }

    /// Consumes segment requests and emits spawn commands.
    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        events: &[Event],
        current_level: LevelIndex,
        parameters: DifficultyParameters,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            if let Event::SegmentRequested { previous } = event {
                let plan = self.choose(previous.as_ref(), current_level, parameters, rng);
                out.push(Command::SpawnSegment { plan });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PlacementConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_width_range_is_rejected() {
        let config = PlacementConfig {
            min_building_width: 60.0,
            ..PlacementConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange {
                field: "placement.building_width",
                ..
            })
        ));
    }

    #[test]
    fn tier_list_must_be_present_and_ascending() {
        let empty = PlacementConfig {
            tiers: Vec::new(),
            ..PlacementConfig::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::NoTiers));

        let unordered = PlacementConfig {
            tiers: vec![-1.0, -3.0],
            ..PlacementConfig::default()
        };
        assert_eq!(
            unordered.validate(),
            Err(ConfigError::UnorderedTiers { index: 1 })
        );
    }

    #[test]
    fn non_finite_tier_is_reported_as_not_finite() {
        let config = PlacementConfig {
            tiers: vec![-4.0, f32::NAN],
            ..PlacementConfig::default()
        };
        let error = config.validate().expect_err("NaN tier must be rejected");
        assert!(matches!(
            error,
            ConfigError::NotFinite {
                field: "placement.tiers",
                value,
            } if value.is_nan()
        ));
        assert!(!error.to_string().contains("positive"));
    }

    #[test]
    fn elevation_reads_tier_list() {
        let config = PlacementConfig::default();
        assert_eq!(config.elevation(VerticalTier::new(2)), -1.0);
        assert_eq!(config.elevation(VerticalTier::LOWEST), -4.0);
    }
}
