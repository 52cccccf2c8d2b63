//! Physics backend abstraction.
//!
//! The detector never talks to a physics engine directly. It asks a
//! [`GroundQuery`] for shape casts, closest points and rays, which keeps the
//! kernel testable against synthetic geometry. A [`GroundDetectionBackend`]
//! wires a concrete engine into the Bevy app.

use bevy::prelude::*;

use crate::detection::{GroundCastBuffer, GroundHit};

/// Parameters of one downward sweep of the character's collision shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeCastRequest {
    /// World position of the shape center.
    pub origin: Vec2,
    /// Orientation of the shape.
    pub rotation: Rot2,
    pub direction: Dir2,
    pub max_distance: f32,
    /// Only colliders whose memberships intersect this mask are reported.
    pub mask: u32,
}

/// Spatial queries the detector depends on.
///
/// One value answers for one character: the implementation knows which shape
/// to sweep and which collider to exclude from its own results.
pub trait GroundQuery {
    /// Sweep the character shape and append hits to `results`, in the order
    /// the engine reports them, until the buffer is full.
    fn cast_shape(&self, request: &ShapeCastRequest, results: &mut GroundCastBuffer);

    /// Closest point on `collider` to a world point.
    ///
    /// Returns `None` when the collider can't be resolved.
    fn closest_point(&self, collider: Entity, point: Vec2) -> Option<Vec2>;

    /// Cast a ray against colliders in `mask`.
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Dir2,
        max_distance: f32,
        mask: u32,
    ) -> Option<GroundHit>;

    /// Layer memberships of a collider. Zero when unknown.
    fn collider_layers(&self, collider: Entity) -> u32;
}

/// Trait for physics backend implementations.
///
/// Implement this trait to run the ground detector on top of a physics
/// engine. The backend plugin registers the systems that build a
/// [`GroundQuery`] for each character and drive the detector with it.
pub trait GroundDetectionBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;
}
