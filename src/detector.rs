//! The ground detector kernel.
//!
//! [`GroundDetector`] is stepped once per fixed update. It sweeps the
//! character's shape downward, reduces the results to a single ground hit,
//! tracks the grounded/airborne state, and snaps the character back onto the
//! surface when physics integration lets it drift.

use bevy::prelude::*;

use crate::backend::{GroundQuery, ShapeCastRequest};
use crate::config::{
    GroundFilter, GroundSensorConfig, EDGE_PROBE_LENGTH, EDGE_PROBE_LIFT, MIN_GROUND_NORMAL_UP,
};
use crate::detection::{
    CandidateReport, CandidateVerdict, GroundCastBuffer, GroundDiagnostics, GroundHit,
    GroundTransition,
};
use crate::error::ConfigError;
use crate::geometry::{Facing, SensorPose, SensorShape};

/// Ground detection and surface adherence for one 2D character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use ground_detector_2d::prelude::*;
///
/// let mut detector = GroundDetector::new();
/// detector.init(SensorShape::new(Vec2::new(0.5, 1.5)));
/// detector.set_pose(SensorPose::from_translation(Vec2::new(0.0, 2.0)));
///
/// assert!(!detector.is_grounded());
/// assert_eq!(detector.bottom(), Vec2::new(0.0, 1.25));
/// // No ground hit yet, so there is no slope to follow.
/// assert_eq!(detector.check_slope(true), Vec2::ZERO);
/// ```
#[derive(Component, Debug, Clone)]
pub struct GroundDetector {
    config: GroundSensorConfig,
    filter: GroundFilter,
    shape: Option<SensorShape>,
    shape_offset: Vec2,
    pose: SensorPose,
    facing: Facing,
    ground_hit: Option<GroundHit>,
    is_grounded: bool,
    cast_results: GroundCastBuffer,
    diagnostics: Option<GroundDiagnostics>,
}

impl Default for GroundDetector {
    fn default() -> Self {
        Self {
            config: GroundSensorConfig::default(),
            filter: GroundFilter::default(),
            shape: None,
            shape_offset: Vec2::ZERO,
            pose: SensorPose::default(),
            facing: Facing::Right,
            ground_hit: None,
            is_grounded: false,
            cast_results: GroundCastBuffer::new(),
            diagnostics: None,
        }
    }
}

impl GroundDetector {
    /// Create a detector with default thresholds and the default ground filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom thresholds, rejecting out-of-range values.
    pub fn with_config(config: GroundSensorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..default()
        })
    }

    #[must_use]
    pub fn with_filter(mut self, filter: GroundFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Offset of the collision shape from the body origin, applied whenever
    /// the shape is derived by a backend.
    #[must_use]
    pub fn with_shape_offset(mut self, offset: Vec2) -> Self {
        self.shape_offset = offset;
        if let Some(shape) = self.shape.as_mut() {
            shape.offset = offset;
        }
        self
    }

    /// Record per-candidate data on every ground check.
    #[must_use]
    pub fn with_diagnostics(mut self) -> Self {
        self.diagnostics = Some(GroundDiagnostics::default());
        self
    }

    /// (Re)derive the sensor geometry from the collision shape.
    pub fn init(&mut self, shape: SensorShape) {
        self.shape = Some(shape);
    }

    /// Initialize from a shape size, using the configured shape offset.
    pub fn init_from_size(&mut self, size: Vec2) {
        self.init(SensorShape::new(size).with_offset(self.shape_offset));
    }

    /// Forget the collision shape. The detector reports airborne from the
    /// next ground check on.
    pub fn clear_shape(&mut self) {
        self.shape = None;
    }

    pub fn set_pose(&mut self, pose: SensorPose) {
        self.pose = pose;
    }

    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    pub fn config(&self) -> &GroundSensorConfig {
        &self.config
    }

    pub fn filter(&self) -> &GroundFilter {
        &self.filter
    }

    pub fn shape(&self) -> Option<&SensorShape> {
        self.shape.as_ref()
    }

    pub fn pose(&self) -> &SensorPose {
        &self.pose
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_grounded(&self) -> bool {
        self.is_grounded
    }

    /// The ground contact accepted by the last ground check.
    pub fn ground_hit(&self) -> Option<&GroundHit> {
        self.ground_hit.as_ref()
    }

    pub fn diagnostics(&self) -> Option<&GroundDiagnostics> {
        self.diagnostics.as_ref()
    }

    // === Geometry ===

    /// Half the shape size, or zero without a shape.
    pub fn extents(&self) -> Vec2 {
        self.shape
            .map(|shape| shape.half_extents())
            .unwrap_or(Vec2::ZERO)
    }

    pub fn offset(&self) -> Vec2 {
        self.shape.map(|shape| shape.offset).unwrap_or(Vec2::ZERO)
    }

    pub fn up(&self) -> Vec2 {
        self.pose.up()
    }

    pub fn down(&self) -> Vec2 {
        -self.up()
    }

    pub fn right(&self) -> Vec2 {
        self.pose.right()
    }

    /// Body right, flipped when facing left.
    pub fn forward(&self) -> Vec2 {
        self.right() * self.facing.sign()
    }

    pub fn center(&self) -> Vec2 {
        self.pose.transform_point(self.offset())
    }

    /// Leading edge of the shape, at mid height.
    pub fn front(&self) -> Vec2 {
        self.center() + self.forward() * self.extents().x
    }

    pub fn top(&self) -> Vec2 {
        self.center() + self.up() * self.extents().y
    }

    pub fn bottom(&self) -> Vec2 {
        self.center() + self.down() * self.extents().y
    }

    fn down_dir(&self) -> Dir2 {
        Dir2::new(self.down()).unwrap_or(Dir2::NEG_Y)
    }

    // === Ground sensor ===

    /// Sweep for ground and update the grounded state.
    ///
    /// Returns the transition when the grounded state flips. On landing the
    /// character is snapped onto the surface before returning.
    ///
    /// Hits are scanned in the order the query reports them. Every hit that
    /// passes the normal, height and distance tests replaces the previous
    /// candidate, so the last qualifying hit wins.
    pub fn check_ground<Q: GroundQuery + ?Sized>(
        &mut self,
        query: &Q,
    ) -> Option<GroundTransition> {
        self.ground_hit = None;
        self.cast_results.clear();

        if self.shape.is_some() && self.filter.ground_mask() != 0 {
            self.scan_ground(query);
        } else if let Some(diagnostics) = self.diagnostics.as_mut() {
            diagnostics.begin_cast(self.pose.position, Vec2::ZERO);
        }

        let grounded = self.ground_hit.is_some();
        if grounded == self.is_grounded {
            return None;
        }

        self.is_grounded = grounded;
        debug!(grounded, "ground state changed");
        if grounded {
            self.correct_stand_height(query, 0.0);
        }

        Some(GroundTransition::from_grounded(grounded))
    }

    fn scan_ground<Q: GroundQuery + ?Sized>(&mut self, query: &Q) {
        let request = ShapeCastRequest {
            origin: self.center(),
            rotation: self.pose.rotation,
            direction: self.down_dir(),
            max_distance: self.config.ray_distance,
            mask: self.filter.ground_mask(),
        };
        query.cast_shape(&request, &mut self.cast_results);

        let local_bottom = self.pose.inverse_transform_point(self.bottom()).y;

        if let Some(diagnostics) = self.diagnostics.as_mut() {
            diagnostics.begin_cast(request.origin, *request.direction);
        }

        for hit in self.cast_results.iter() {
            let verdict = classify(&self.pose, &self.config, local_bottom, hit);
            if verdict == CandidateVerdict::Accepted {
                self.ground_hit = Some(*hit);
            }
            if let Some(diagnostics) = self.diagnostics.as_mut() {
                diagnostics.candidates.push(CandidateReport { hit: *hit, verdict });
            }
        }

        if let Some(diagnostics) = self.diagnostics.as_mut() {
            diagnostics.ground_point = self.ground_hit.map(|hit| hit.point);
        }
    }

    // === Slope resolver ===

    /// Direction along the ground surface for the given facing.
    ///
    /// Returns `Vec2::ZERO` when there is no ground hit.
    pub fn check_slope(&self, facing_right: bool) -> Vec2 {
        let Some(hit) = self.ground_hit else {
            return Vec2::ZERO;
        };
        let n = hit.normal;
        if facing_right {
            Vec2::new(n.y, -n.x)
        } else {
            Vec2::new(-n.y, n.x)
        }
    }

    // === Height corrector ===

    /// Snap the shape bottom onto the measured ground surface.
    ///
    /// The surface is found by asking for the closest point on the ground
    /// collider to the hit point pushed one unit out along the normal. The
    /// character moves along its local up when `threshold <= 0`, or when the
    /// gap is strictly greater than `threshold`.
    ///
    /// Returns the world translation that was applied.
    pub fn correct_stand_height<Q: GroundQuery + ?Sized>(
        &mut self,
        query: &Q,
        threshold: f32,
    ) -> Option<Vec2> {
        let hit = self.ground_hit?;
        let shape = self.shape?;

        let probe = hit.point + hit.normal;
        let surface = query.closest_point(hit.entity, probe).unwrap_or(hit.point);
        if let Some(diagnostics) = self.diagnostics.as_mut() {
            diagnostics.surface_point = Some(surface);
        }

        let local_surface = self.pose.inverse_transform_point(surface);
        let gap = local_surface.y - shape.local_bottom();
        if threshold > 0.0 && gap.abs() <= threshold {
            return None;
        }

        let translation = self.pose.transform_direction(Vec2::new(0.0, gap));
        self.pose.position += translation;
        debug!(gap, threshold, "corrected stand height");
        Some(translation)
    }

    /// Late pass: keep the character flush with platform-layer ground.
    pub fn maintain_platform_height<Q: GroundQuery + ?Sized>(
        &mut self,
        query: &Q,
    ) -> Option<Vec2> {
        if !self.is_grounded {
            return None;
        }
        let hit = self.ground_hit?;
        if !self.filter.is_platform(query.collider_layers(hit.entity)) {
            return None;
        }
        self.correct_stand_height(query, self.config.stand_height_threshold)
    }

    // === Edge detector ===

    /// Whether the ground ends just ahead of the leading foot.
    ///
    /// Always `false` while airborne or without a shape.
    pub fn check_edge<Q: GroundQuery + ?Sized>(&self, query: &Q) -> bool {
        if self.shape.is_none() || !self.is_grounded {
            return false;
        }

        let origin =
            self.bottom() + self.forward() * self.extents().x + self.up() * EDGE_PROBE_LIFT;
        query
            .cast_ray(
                origin,
                self.down_dir(),
                EDGE_PROBE_LENGTH + EDGE_PROBE_LIFT,
                self.filter.ground_mask(),
            )
            .is_none()
    }
}

fn classify(
    pose: &SensorPose,
    config: &GroundSensorConfig,
    local_bottom: f32,
    hit: &GroundHit,
) -> CandidateVerdict {
    let point = pose.inverse_transform_point(hit.point);
    let normal = pose.inverse_transform_direction(hit.normal);

    if normal.y <= MIN_GROUND_NORMAL_UP {
        CandidateVerdict::SteepNormal
    } else if point.y > local_bottom + config.ray_offset {
        CandidateVerdict::AboveFeet
    } else if hit.distance >= config.distance_threshold {
        CandidateVerdict::TooFar
    } else {
        CandidateVerdict::Accepted
    }
}
