//! Sensor geometry: the body pose and the collision shape it carries.

use bevy::prelude::*;

/// World pose of the character body.
///
/// Local space has its origin at the body position, with +Y along the body's
/// "up" and +X along its "right".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorPose {
    pub position: Vec2,
    pub rotation: Rot2,
}

impl SensorPose {
    pub fn new(position: Vec2, rotation: Rot2) -> Self {
        Self { position, rotation }
    }

    pub fn from_translation(position: Vec2) -> Self {
        Self::new(position, Rot2::IDENTITY)
    }

    pub fn up(&self) -> Vec2 {
        self.rotation * Vec2::Y
    }

    pub fn right(&self) -> Vec2 {
        self.rotation * Vec2::X
    }

    /// Local point to world space.
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.position + self.rotation * local
    }

    /// World point to local space.
    pub fn inverse_transform_point(&self, world: Vec2) -> Vec2 {
        self.rotation.inverse() * (world - self.position)
    }

    /// Local direction to world space. Directions ignore the position.
    pub fn transform_direction(&self, local: Vec2) -> Vec2 {
        self.rotation * local
    }

    /// World direction to local space.
    pub fn inverse_transform_direction(&self, world: Vec2) -> Vec2 {
        self.rotation.inverse() * world
    }
}

impl Default for SensorPose {
    fn default() -> Self {
        Self::from_translation(Vec2::ZERO)
    }
}

/// Size and placement of the character's collision shape.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SensorShape {
    /// Full width and height of the shape.
    pub size: Vec2,
    /// Shape center relative to the body origin, in local axes.
    pub offset: Vec2,
}

impl SensorShape {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            offset: Vec2::ZERO,
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Local-space Y of the shape bottom.
    pub fn local_bottom(&self) -> f32 {
        self.offset.y - self.half_extents().y
    }
}

/// Which way the character is facing along its local X axis.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    pub fn from_right(facing_right: bool) -> Self {
        if facing_right {
            Facing::Right
        } else {
            Facing::Left
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn identity_pose_axes() {
        let pose = SensorPose::from_translation(Vec2::new(3.0, 4.0));
        assert_eq!(pose.up(), Vec2::Y);
        assert_eq!(pose.right(), Vec2::X);
        assert_eq!(pose.transform_point(Vec2::new(1.0, -1.0)), Vec2::new(4.0, 3.0));
    }

    #[test]
    fn rotated_pose_round_trips_points() {
        let pose = SensorPose::new(Vec2::new(-2.0, 5.0), Rot2::degrees(30.0));
        let world = Vec2::new(1.5, -0.5);
        let back = pose.transform_point(pose.inverse_transform_point(world));
        assert!((back - world).length() < EPS);
    }

    #[test]
    fn quarter_turn_points_up_left() {
        let pose = SensorPose::new(Vec2::ZERO, Rot2::degrees(90.0));
        assert!((pose.up() - Vec2::NEG_X).length() < EPS);
        assert!((pose.right() - Vec2::Y).length() < EPS);

        let local = pose.inverse_transform_direction(Vec2::NEG_X);
        assert!((local - Vec2::Y).length() < EPS);
    }

    #[test]
    fn shape_bottom_includes_offset() {
        let shape = SensorShape::new(Vec2::new(1.0, 2.0)).with_offset(Vec2::new(0.0, 0.5));
        assert_eq!(shape.half_extents(), Vec2::new(0.5, 1.0));
        assert_eq!(shape.local_bottom(), -0.5);
    }

    #[test]
    fn facing_sign() {
        assert_eq!(Facing::from_right(true).sign(), 1.0);
        assert_eq!(Facing::from_right(false).sign(), -1.0);
    }
}
