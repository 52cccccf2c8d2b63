//! Detection result structures.
//!
//! These structures hold the results of physics queries (shape casts and
//! raycasts) used for ground detection and edge probing, plus the messages
//! and diagnostics derived from them.

use bevy::prelude::*;

use crate::config::GROUND_CAST_CAPACITY;

/// A single contact reported by a ground query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    /// Distance travelled by the cast before the contact.
    pub distance: f32,
    /// World-space surface normal at the contact.
    pub normal: Vec2,
    /// World position of the contact.
    pub point: Vec2,
    /// Collider that was hit.
    pub entity: Entity,
}

impl GroundHit {
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Entity) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// Reusable, fixed-capacity storage for shape-cast results.
///
/// Owned by a single detector and cleared before every cast, so the step
/// loop never allocates after construction.
#[derive(Debug, Clone)]
pub struct GroundCastBuffer {
    hits: Vec<GroundHit>,
}

impl GroundCastBuffer {
    pub fn new() -> Self {
        Self {
            hits: Vec::with_capacity(GROUND_CAST_CAPACITY),
        }
    }

    pub fn capacity(&self) -> usize {
        GROUND_CAST_CAPACITY
    }

    /// Store a hit. Returns whether there is room for another one.
    ///
    /// Hits offered to a full buffer are dropped.
    pub fn push(&mut self, hit: GroundHit) -> bool {
        if self.hits.len() < GROUND_CAST_CAPACITY {
            self.hits.push(hit);
        }
        self.hits.len() < GROUND_CAST_CAPACITY
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.hits.len() >= GROUND_CAST_CAPACITY
    }

    /// Hits in the order the query reported them.
    pub fn iter(&self) -> impl Iterator<Item = &GroundHit> {
        self.hits.iter()
    }
}

impl Default for GroundCastBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Grounded state change produced by a ground check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTransition {
    Landed,
    Airborne,
}

impl GroundTransition {
    pub fn from_grounded(grounded: bool) -> Self {
        if grounded {
            GroundTransition::Landed
        } else {
            GroundTransition::Airborne
        }
    }

    pub fn is_grounded(self) -> bool {
        self == GroundTransition::Landed
    }
}

/// Message written when a detector's grounded state flips.
///
/// At most one is written per detector per step, and never on steady state.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundStateChanged {
    /// The character whose state changed.
    pub entity: Entity,
    /// The new state.
    pub grounded: bool,
}

/// Why a candidate hit was or wasn't taken as ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateVerdict {
    Accepted,
    /// Local normal is too steep.
    SteepNormal,
    /// Contact is above the character's feet.
    AboveFeet,
    /// Contact is beyond the standing distance.
    TooFar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateReport {
    pub hit: GroundHit,
    pub verdict: CandidateVerdict,
}

/// Data captured from the last ground check, for debug overlays and tests.
#[derive(Debug, Clone, Default)]
pub struct GroundDiagnostics {
    /// Where the ground cast started.
    pub cast_origin: Vec2,
    /// Direction the ground cast travelled.
    pub cast_direction: Vec2,
    /// Every candidate in cast order, with its verdict.
    pub candidates: Vec<CandidateReport>,
    /// Point of the accepted ground hit, if any.
    pub ground_point: Option<Vec2>,
    /// Last surface point measured by the height corrector.
    pub surface_point: Option<Vec2>,
}

impl GroundDiagnostics {
    pub(crate) fn begin_cast(&mut self, origin: Vec2, direction: Vec2) {
        self.cast_origin = origin;
        self.cast_direction = direction;
        self.candidates.clear();
        self.ground_point = None;
    }

    pub fn accepted(&self) -> impl Iterator<Item = &CandidateReport> {
        self.candidates
            .iter()
            .filter(|report| report.verdict == CandidateVerdict::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some_entity() -> Entity {
        World::new().spawn_empty().id()
    }

    #[test]
    fn ground_hit_new() {
        let entity = some_entity();
        let hit = GroundHit::new(5.0, Vec2::Y, Vec2::new(10.0, 0.0), entity);
        assert_eq!(hit.distance, 5.0);
        assert_eq!(hit.normal, Vec2::Y);
        assert_eq!(hit.point, Vec2::new(10.0, 0.0));
        assert_eq!(hit.entity, entity);
    }

    #[test]
    fn buffer_stops_at_capacity() {
        let entity = some_entity();
        let mut buffer = GroundCastBuffer::new();

        let mut accepted_more = true;
        for i in 0..GROUND_CAST_CAPACITY + 3 {
            accepted_more = buffer.push(GroundHit::new(i as f32, Vec2::Y, Vec2::ZERO, entity));
        }

        assert!(!accepted_more);
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), GROUND_CAST_CAPACITY);
        // Overflowing hits are dropped, not rotated in.
        let last = buffer.iter().last().copied().unwrap();
        assert_eq!(last.distance, (GROUND_CAST_CAPACITY - 1) as f32);
    }

    #[test]
    fn buffer_reuses_allocation() {
        let entity = some_entity();
        let mut buffer = GroundCastBuffer::new();
        buffer.push(GroundHit::new(0.0, Vec2::Y, Vec2::ZERO, entity));
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.hits.capacity() >= GROUND_CAST_CAPACITY);
    }

    #[test]
    fn transition_from_grounded() {
        assert_eq!(GroundTransition::from_grounded(true), GroundTransition::Landed);
        assert!(!GroundTransition::from_grounded(false).is_grounded());
    }
}
