#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skyline Runner level generator.
//!
//! This crate defines the message surface that connects the session, the
//! authoritative segment world, and pure systems. The session submits
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and external collaborators to react to deterministically.
//! Systems consume event streams, query immutable snapshots, and respond
//! exclusively with new command batches or derived events.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rounding slack, in world units, allowed where adjacent footprints meet.
pub const EDGE_TOLERANCE: f32 = 1.0e-3;

/// Describes whether the controlled runner is currently advancing the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    /// The runner has not touched the ground since the run started.
    #[default]
    AwaitingLanding,
    /// The runner is grounded and alive; the world scrolls and difficulty ramps.
    Running,
    /// Gameplay is paused by the host.
    Paused,
    /// The runner died; the run is frozen until it restarts.
    Dead,
}

impl RunState {
    /// Reports whether simulation time counts toward difficulty and distance.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Commands that express all permissible segment world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Recomputes the spawn and despawn boundaries from the camera viewport.
    ConfigureViewport {
        /// Visible world-space extent along the scroll axis.
        viewport: Viewport,
    },
    /// Scrolls every active segment and despawns the ones that left the screen.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
        /// Scroll speed in world units per second sampled for this tick.
        scroll_speed: f32,
    },
    /// Asks the world whether a new segment is required beyond the spawn boundary.
    MaybeSpawnNext,
    /// Appends a segment described by the provided placement plan.
    SpawnSegment {
        /// Width, tier and gap chosen by the placement policy.
        plan: PlacementPlan,
    },
    /// Records the accepted spawn-point offsets on a live segment.
    AttachSpawnPoints {
        /// Segment that owns the spawn points.
        segment: SegmentId,
        /// Offsets along the top edge relative to the segment anchor.
        offsets: Vec<f32>,
    },
    /// Drops every segment so a fresh run can begin.
    Reset,
}

/// Events broadcast after processing commands or advancing systems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced while the run was active.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports how far the world scrolled during the tick.
    WorldScrolled {
        /// Distance in world units travelled along the scroll axis.
        distance: f32,
    },
    /// Requests a new footprint from the placement policy.
    SegmentRequested {
        /// Rightmost live segment, or `None` when the collection is empty.
        previous: Option<SegmentSnapshot>,
    },
    /// Confirms that a segment entered the world.
    SegmentSpawned {
        /// Identifier assigned to the segment.
        segment: SegmentId,
        /// Base footprint that sub-objects attach against.
        footprint: Footprint,
        /// Extent of the segment along the scroll axis.
        width: f32,
        /// Role of the segment within the run.
        kind: SegmentKind,
    },
    /// Confirms that a segment crossed the despawn boundary and was released.
    SegmentDespawned {
        /// Identifier of the released segment.
        segment: SegmentId,
    },
    /// Announces that every segment was dropped for a restart.
    SegmentsCleared,
    /// Marks an accepted spawn point that an external spawner should occupy.
    SpawnPointOccupied {
        /// Segment that carries the spawn point.
        segment: SegmentId,
        /// Absolute world position of the spawn point.
        position: Vec2,
    },
    /// Reports the cumulative distance travelled in the current run.
    DistanceUpdated {
        /// Total distance in world units.
        distance: f32,
    },
    /// Announces that cumulative distance crossed another milestone.
    LevelIncreased {
        /// Level index reached by the crossing.
        level: LevelIndex,
    },
    /// Publishes freshly interpolated difficulty parameters.
    DifficultyParametersChanged {
        /// Scroll speed and gap bounds now in effect.
        parameters: DifficultyParameters,
    },
    /// Reports the run's total score after it changed.
    ScoreUpdated {
        /// Distance score plus bonus score.
        total: f32,
    },
    /// Announces that the run went further than the stored personal best.
    PersonalBestSurpassed {
        /// Distance at which the previous best was exceeded.
        distance: f32,
    },
}

/// World-space extent of the camera viewport along the scroll axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    left: f32,
    right: f32,
}

impl Viewport {
    /// Creates a viewport spanning the provided world-space edges.
    #[must_use]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Creates a viewport of the given width centred on the origin.
    #[must_use]
    pub fn centred(width: f32) -> Self {
        let half = width * 0.5;
        Self::new(-half, half)
    }

    /// Left edge of the viewport.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.left
    }

    /// Right edge of the viewport.
    #[must_use]
    pub const fn right(&self) -> f32 {
        self.right
    }

    /// Visible width of the viewport.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

/// Unique identifier assigned to a segment.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SegmentId(u32);

impl SegmentId {
    /// Creates a new segment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Distance-based level reached in the current run.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LevelIndex(u32);

impl LevelIndex {
    /// Level every run starts on.
    pub const START: Self = Self(0);

    /// Creates a level index wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying level number.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the level immediately after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Index into the ordered list of allowed segment elevations.
///
/// Index zero is always the lowest tier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VerticalTier(u32);

impl VerticalTier {
    /// Lowest tier, used for initial and set-piece segments.
    pub const LOWEST: Self = Self(0);

    /// Creates a tier wrapper from a position in the tier list.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position of the tier in the configured tier list.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Reports whether this is the lowest tier.
    #[must_use]
    pub const fn is_lowest(&self) -> bool {
        self.0 == 0
    }
}

/// Role a segment plays within the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    /// First segment of a run; the runner lands on it.
    Initial,
    /// Ordinary randomly sized building.
    Regular,
    /// Oversized building spawned once per level increase.
    SetPiece,
}

/// Lifecycle stage of a live segment.
///
/// Removal from the world's collection is the terminal despawn transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentState {
    /// Appended to the collection but not yet scrolled.
    Spawned,
    /// Scrolled at least once.
    Active,
}

/// World-space footprint of a segment's top edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    anchor: Vec2,
    width: f32,
}

impl Footprint {
    /// Creates a footprint centred on `anchor` spanning `width` world units.
    #[must_use]
    pub const fn new(anchor: Vec2, width: f32) -> Self {
        Self { anchor, width }
    }

    /// Centre of the top edge.
    #[must_use]
    pub const fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Extent along the scroll axis.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Left edge of the footprint.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.anchor.x - self.width * 0.5
    }

    /// Right edge of the footprint.
    ///
    /// The world scrolls toward negative x, so this is both the edge that
    /// gates spawning and the last edge to leave the screen.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.anchor.x + self.width * 0.5
    }

    /// Elevation of the top edge.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.anchor.y
    }

    /// Returns a copy moved along the scroll axis by `dx`.
    #[must_use]
    pub fn translated(self, dx: f32) -> Self {
        Self {
            anchor: Vec2::new(self.anchor.x + dx, self.anchor.y),
            width: self.width,
        }
    }

    /// Reports whether the two footprints share more than [`EDGE_TOLERANCE`] of span.
    #[must_use]
    pub fn overlaps(&self, other: &Footprint) -> bool {
        self.left() < other.right() - EDGE_TOLERANCE
            && other.left() < self.right() - EDGE_TOLERANCE
    }
}

/// Immutable representation of a single segment used for queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentSnapshot {
    /// Identifier assigned to the segment.
    pub id: SegmentId,
    /// Current world-space footprint.
    pub footprint: Footprint,
    /// Tier the segment was placed on.
    pub tier: VerticalTier,
    /// Role of the segment within the run.
    pub kind: SegmentKind,
    /// Lifecycle stage of the segment.
    pub state: SegmentState,
    /// Accepted spawn-point offsets relative to the anchor.
    pub spawn_points: Vec<f32>,
}

/// Read-only snapshot describing the live segments ordered by position.
#[derive(Clone, Debug, Default)]
pub struct SegmentView {
    snapshots: Vec<SegmentSnapshot>,
}

impl SegmentView {
    /// Creates a new segment view, ordering snapshots along the scroll axis.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<SegmentSnapshot>) -> Self {
        snapshots.sort_by(|a, b| a.footprint.left().total_cmp(&b.footprint.left()));
        Self { snapshots }
    }

    /// Iterator over the captured snapshots from left to right.
    pub fn iter(&self) -> impl Iterator<Item = &SegmentSnapshot> {
        self.snapshots.iter()
    }

    /// Number of live segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no segment is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Rightmost live segment, if any.
    #[must_use]
    pub fn rightmost(&self) -> Option<&SegmentSnapshot> {
        self.snapshots.last()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<SegmentSnapshot> {
        self.snapshots
    }
}

/// Difficulty-scaled parameters consumed by the allocator and policies.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParameters {
    /// Scroll speed in world units per second.
    pub scroll_speed: f32,
    /// Lower bound for sampled gaps between segments.
    pub min_gap: f32,
    /// Upper bound for sampled gaps between segments.
    pub max_gap: f32,
}

/// Decision produced by the placement policy for the next segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementPlan {
    /// Extent of the new segment along the scroll axis.
    pub width: f32,
    /// Tier the new segment sits on.
    pub tier: VerticalTier,
    /// Elevation of the chosen tier.
    pub elevation: f32,
    /// Empty space left between the previous segment and the new one.
    pub gap: f32,
    /// Role of the new segment.
    pub kind: SegmentKind,
}

/// Candidate attachment point along a segment's top edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnCandidate {
    /// Offset from the segment anchor along the scroll axis.
    pub offset: f32,
    /// Absolute world position of the candidate.
    pub position: Vec2,
    /// Probability that the candidate is accepted.
    pub weight: f32,
}

/// Final tallies of a finished or in-progress run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Distance travelled in world units.
    pub distance: f32,
    /// Score earned from distance alone.
    pub distance_score: f32,
    /// Score earned from kills and personal-best bonuses.
    pub bonus_score: f32,
    /// Sum of distance and bonus score.
    pub total_score: f32,
    /// Number of enemies defeated during the run.
    pub enemies_killed: u32,
    /// Highest level reached.
    pub level: LevelIndex,
}

/// Reasons a configuration is rejected before a run starts.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A lower bound exceeds its upper bound.
    #[error("`{field}` range is inverted: minimum {min} exceeds maximum {max}")]
    InvertedRange {
        /// Name of the offending range.
        field: &'static str,
        /// Configured lower bound.
        min: f32,
        /// Configured upper bound.
        max: f32,
    },
    /// A value that must be strictly positive is zero, negative or not finite.
    #[error("`{field}` must be a positive finite number, got {value}")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
        /// Configured value.
        value: f32,
    },
    /// A value that may take any sign is NaN or infinite.
    #[error("`{field}` must be a finite number, got {value}")]
    NotFinite {
        /// Name of the offending field.
        field: &'static str,
        /// Configured value.
        value: f32,
    },
    /// A value that must be non-negative is negative or not finite.
    #[error("`{field}` must be a non-negative finite number, got {value}")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// Configured value.
        value: f32,
    },
    /// A probability lies outside `[0, 1]`.
    #[error("`{field}` must be a probability in [0, 1], got {value}")]
    InvalidProbability {
        /// Name of the offending field.
        field: &'static str,
        /// Configured value.
        value: f32,
    },
    /// No vertical tier was configured.
    #[error("at least one vertical tier must be configured")]
    NoTiers,
    /// Vertical tiers are not listed from lowest to highest.
    #[error("vertical tier {index} is lower than the tier before it")]
    UnorderedTiers {
        /// Position of the first out-of-order tier.
        index: usize,
    },
}

impl ConfigError {
    /// Rejects `value` unless it is finite and strictly positive.
    pub fn require_positive(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(Self::NotPositive { field, value })
        }
    }

    /// Rejects `value` unless it is finite and non-negative.
    pub fn require_non_negative(field: &'static str, value: f32) -> Result<(), Self> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::Negative { field, value })
        }
    }

    /// Rejects `value` unless it lies within `[0, 1]`.
    pub fn require_probability(field: &'static str, value: f32) -> Result<(), Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(Self::InvalidProbability { field, value })
        }
    }

    /// Rejects the range unless `min <= max`.
    pub fn require_ordered(field: &'static str, min: f32, max: f32) -> Result<(), Self> {
        if min <= max {
            Ok(())
        } else {
            Err(Self::InvertedRange { field, min, max })
        }
    }
}

/// Linearly interpolates between `start` and `end`, clamping `t` to `[0, 1]`.
#[must_use]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    start + (end - start) * t
}
