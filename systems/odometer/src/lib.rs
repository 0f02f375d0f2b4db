#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Odometer that turns scrolled distance into the cumulative distance and
//! score of a run.

use serde::{Deserialize, Serialize};
use skyline_runner_core::{ConfigError, Event, LevelIndex, RunSummary};

/// Scoring weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreConfig {
    /// Score earned per world unit travelled.
    pub points_per_meter: f32,
    /// Extra score per world unit travelled beyond the personal best.
    pub high_score_bonus: f32,
    /// Score earned per defeated enemy.
    pub enemy_kill_bonus: f32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            points_per_meter: 10.0,
            high_score_bonus: 100.0,
            enemy_kill_bonus: 1_000.0,
        }
    }
}

impl ScoreConfig {
    /// Rejects negative or non-finite weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_non_negative("score.points_per_meter", self.points_per_meter)?;
        ConfigError::require_non_negative("score.high_score_bonus", self.high_score_bonus)?;
        ConfigError::require_non_negative("score.enemy_kill_bonus", self.enemy_kill_bonus)
    }
}

/// Pure system accumulating distance, kills and score for the current run.
#[derive(Debug)]
pub struct Odometer {
    config: ScoreConfig,
    distance: f32,
    bonus_score: f32,
    enemies_killed: u32,
    personal_best: Option<f32>,
    surpassed: bool,
}

impl Odometer {
    /// Creates an odometer for a run measured against `personal_best`.
    #[must_use]
    pub fn new(config: ScoreConfig, personal_best: Option<f32>) -> Self {
        Self {
            config,
            distance: 0.0,
            bonus_score: 0.0,
            enemies_killed: 0,
            personal_best,
            surpassed: false,
        }
    }

    /// Starts a fresh run measured against `personal_best`.
    pub fn reset(&mut self, personal_best: Option<f32>) {
        self.distance = 0.0;
        self.bonus_score = 0.0;
        self.enemies_killed = 0;
        self.personal_best = personal_best;
        self.surpassed = false;
    }

    /// Consumes scroll reports and emits distance and score updates.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Event>) {
        for event in events {
            if let Event::WorldScrolled { distance } = event {
                self.travel(*distance, out);
            }
        }
    }

    fn travel(&mut self, step: f32, out: &mut Vec<Event>) {
        if step <= 0.0 {
            return;
        }

        self.distance += step;
        out.push(Event::DistanceUpdated {
            distance: self.distance,
        });

        if let Some(best) = self.personal_best {
            if self.distance > best {
                self.bonus_score += step * self.config.high_score_bonus;
                if !self.surpassed {
                    self.surpassed = true;
                    log::info!("personal best of {best:.1} surpassed");
                    out.push(Event::PersonalBestSurpassed {
                        distance: self.distance,
                    });
                }
            }
        }

        out.push(Event::ScoreUpdated {
            total: self.total_score(),
        });
    }

    /// Credits a defeated enemy and republishes the score.
    pub fn record_kill(&mut self, out: &mut Vec<Event>) {
        self.enemies_killed = self.enemies_killed.saturating_add(1);
        self.bonus_score += self.config.enemy_kill_bonus;
        out.push(Event::ScoreUpdated {
            total: self.total_score(),
        });
    }

    /// Cumulative distance of the current run.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Score earned from distance alone.
    #[must_use]
    pub fn distance_score(&self) -> f32 {
        self.distance * self.config.points_per_meter
    }

    /// Distance score plus bonuses.
    #[must_use]
    pub fn total_score(&self) -> f32 {
        self.distance_score() + self.bonus_score
    }

    /// Personal best the current run is measured against.
    #[must_use]
    pub fn personal_best(&self) -> Option<f32> {
        self.personal_best
    }

    /// Best distance known after this run, including the run itself.
    #[must_use]
    pub fn best_distance(&self) -> f32 {
        self.personal_best.unwrap_or(0.0).max(self.distance)
    }

    /// Tallies of the current run.
    #[must_use]
    pub fn summary(&self, level: LevelIndex) -> RunSummary {
        RunSummary {
            distance: self.distance,
            distance_score: self.distance_score(),
            bonus_score: self.bonus_score,
            total_score: self.total_score(),
            enemies_killed: self.enemies_killed,
            level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrolled(distance: f32) -> Event {
        Event::WorldScrolled { distance }
    }

    #[test]
    fn scrolling_updates_distance_then_score() {
        let mut odometer = Odometer::new(ScoreConfig::default(), None);
        let mut events = Vec::new();
        odometer.handle(&[scrolled(2.5), scrolled(0.0)], &mut events);

        assert_eq!(
            events,
            vec![
                Event::DistanceUpdated { distance: 2.5 },
                Event::ScoreUpdated { total: 25.0 },
            ]
        );
    }

    #[test]
    fn personal_best_is_announced_once_and_earns_bonus_per_unit() {
        let mut odometer = Odometer::new(ScoreConfig::default(), Some(10.0));
        let mut events = Vec::new();
        odometer.handle(&[scrolled(8.0), scrolled(4.0), scrolled(2.0)], &mut events);

        let announcements: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, Event::PersonalBestSurpassed { .. }))
            .collect();
        assert_eq!(
            announcements,
            vec![&Event::PersonalBestSurpassed { distance: 12.0 }]
        );

        let summary = odometer.summary(LevelIndex::START);
        assert_eq!(summary.distance, 14.0);
        assert_eq!(summary.distance_score, 140.0);
        assert_eq!(summary.bonus_score, 600.0);
        assert_eq!(summary.total_score, 740.0);
        assert_eq!(odometer.best_distance(), 14.0);
    }

    #[test]
    fn kills_add_bonus_and_reset_clears_the_run() {
        let mut odometer = Odometer::new(ScoreConfig::default(), None);
        let mut events = Vec::new();
        odometer.handle(&[scrolled(1.0)], &mut events);
        odometer.record_kill(&mut events);

        assert_eq!(events.last(), Some(&Event::ScoreUpdated { total: 1_010.0 }));
        let summary = odometer.summary(LevelIndex::new(3));
        assert_eq!(summary.enemies_killed, 1);
        assert_eq!(summary.level, LevelIndex::new(3));

        odometer.reset(Some(odometer.best_distance()));
        assert_eq!(odometer.summary(LevelIndex::START), RunSummary::default());
        assert_eq!(odometer.personal_best(), Some(1.0));
    }

    #[test]
    fn negative_weights_are_rejected() {
        let config = ScoreConfig {
            enemy_kill_bonus: -1.0,
            ..ScoreConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(ScoreConfig::default().validate().is_ok());
    }
}
