//! Authoritative storage for the live segment collection.

use std::collections::VecDeque;

use skyline_runner_core::{
    Footprint, SegmentId, SegmentKind, SegmentSnapshot, SegmentState, VerticalTier,
};

/// Segment stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Segment {
    /// Identifier allocated by the world for the segment.
    pub(crate) id: SegmentId,
    /// Current world-space footprint.
    pub(crate) footprint: Footprint,
    /// Tier the segment sits on.
    pub(crate) tier: VerticalTier,
    /// Role of the segment within the run.
    pub(crate) kind: SegmentKind,
    /// Lifecycle stage of the segment.
    pub(crate) state: SegmentState,
    /// Accepted spawn-point offsets relative to the anchor.
    pub(crate) spawn_points: Vec<f32>,
}

impl Segment {
    pub(crate) fn snapshot(&self) -> SegmentSnapshot {
        SegmentSnapshot {
            id: self.id,
            footprint: self.footprint,
            tier: self.tier,
            kind: self.kind,
            state: self.state,
            spawn_points: self.spawn_points.clone(),
        }
    }
}

/// Ordered segment queue that owns identifier allocation.
///
/// Segments are appended on the right and released from the left, so the
/// queue order always matches the order along the scroll axis.
#[derive(Debug)]
pub(crate) struct SegmentTrack {
    entries: VecDeque<Segment>,
    next_segment_id: SegmentId,
}

impl SegmentTrack {
    /// Creates an empty track with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_segment_id: SegmentId::new(0),
        }
    }

    pub(crate) fn allocate_id(&mut self) -> SegmentId {
        let id = self.next_segment_id;
        self.next_segment_id = SegmentId::new(id.get().wrapping_add(1));
        id
    }

    pub(crate) fn push_back(&mut self, segment: Segment) {
        self.entries.push_back(segment);
    }

    pub(crate) fn front(&self) -> Option<&Segment> {
        self.entries.front()
    }

    pub(crate) fn back(&self) -> Option<&Segment> {
        self.entries.back()
    }

    pub(crate) fn pop_front(&mut self) -> Option<Segment> {
        self.entries.pop_front()
    }

    pub(crate) fn get_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.entries.iter_mut().find(|segment| segment.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Segment> {
        self.entries.iter_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
