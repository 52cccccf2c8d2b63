//! Avian2D physics backend implementation.
//!
//! This module drives [`GroundDetector`] with Avian's spatial query pipeline.
//! Enable with the `avian2d` feature.

use avian2d::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::backend::{GroundDetectionBackend, GroundQuery, ShapeCastRequest};
use crate::detection::{GroundCastBuffer, GroundHit, GroundStateChanged};
use crate::detector::GroundDetector;
use crate::geometry::SensorPose;

/// Avian2D physics backend for the ground detector.
///
/// Ground casts, closest-point measurements and edge probes all go through
/// [`SpatialQueryPipeline`]. Height corrections are written to the body's
/// [`Position`] before Avian's physics step runs.
pub struct Avian2dBackend;

impl GroundDetectionBackend for Avian2dBackend {
    fn plugin() -> impl Plugin {
        Avian2dBackendPlugin
    }
}

/// Plugin that sets up Avian2D-specific systems for the ground detector.
pub struct Avian2dBackendPlugin;

impl Plugin for Avian2dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::GroundDetectionSet;

        app.add_systems(
            FixedUpdate,
            (
                init_ground_detectors.in_set(GroundDetectionSet::Init),
                avian_ground_detection.in_set(GroundDetectionSet::Sense),
                avian_platform_height_correction.in_set(GroundDetectionSet::Correct),
            ),
        );
    }
}

/// Collider data read when measuring the ground.
pub type GroundColliderData = (
    &'static Collider,
    &'static Position,
    &'static Rotation,
    Option<&'static CollisionLayers>,
);

/// System parameter giving access to ground queries for any character.
///
/// Locomotion systems use it to probe for ledges on demand:
///
/// ```rust,no_run
/// use avian2d::prelude::*;
/// use bevy::prelude::*;
/// use ground_detector_2d::avian::GroundQueries;
/// use ground_detector_2d::prelude::*;
///
/// fn stop_at_ledges(
///     queries: GroundQueries,
///     mut characters: Query<(Entity, &GroundDetector, Option<&Collider>, &mut LinearVelocity)>,
/// ) {
///     for (entity, detector, collider, mut velocity) in &mut characters {
///         if detector.check_edge(&queries.for_character(entity, collider)) {
///             velocity.x = 0.0;
///         }
///     }
/// }
/// ```
#[derive(SystemParam)]
pub struct GroundQueries<'w, 's> {
    pipeline: Res<'w, SpatialQueryPipeline>,
    colliders: Query<'w, 's, GroundColliderData, Without<GroundDetector>>,
}

impl<'w, 's> GroundQueries<'w, 's> {
    /// Ground queries on behalf of `character`, sweeping `shape`.
    ///
    /// The character is excluded from its own results. Without a shape the
    /// ground cast reports nothing.
    pub fn for_character<'a>(
        &'a self,
        character: Entity,
        shape: Option<&'a Collider>,
    ) -> AvianGroundQuery<'a, 'w, 's> {
        AvianGroundQuery {
            queries: self,
            shape,
            character,
        }
    }
}

/// [`GroundQuery`] backed by Avian for a single character.
pub struct AvianGroundQuery<'a, 'w, 's> {
    queries: &'a GroundQueries<'w, 's>,
    shape: Option<&'a Collider>,
    character: Entity,
}

impl AvianGroundQuery<'_, '_, '_> {
    fn filter(&self, mask: u32) -> SpatialQueryFilter {
        SpatialQueryFilter::from_mask(LayerMask(mask)).with_excluded_entities([self.character])
    }
}

impl GroundQuery for AvianGroundQuery<'_, '_, '_> {
    fn cast_shape(&self, request: &ShapeCastRequest, results: &mut GroundCastBuffer) {
        let Some(shape) = self.shape else {
            return;
        };

        let filter = self.filter(request.mask);
        let config = ShapeCastConfig::from_max_distance(request.max_distance);

        self.queries.pipeline.shape_hits_callback(
            shape,
            request.origin,
            request.rotation.as_radians(),
            request.direction,
            &config,
            &filter,
            |hit| {
                // normal1 and point1 describe the surface of the hit collider.
                results.push(GroundHit::new(
                    hit.distance,
                    hit.normal1,
                    hit.point1,
                    hit.entity,
                ))
            },
        );
    }

    /// Colliders that carry their own [`GroundDetector`] are not resolved, so
    /// standing on another character measures against the raw hit point.
    fn closest_point(&self, collider: Entity, point: Vec2) -> Option<Vec2> {
        let (shape, position, rotation, _) = self.queries.colliders.get(collider).ok()?;
        let (projected, _inside) = shape.project_point(*position, *rotation, point, true);
        Some(projected)
    }

    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Dir2,
        max_distance: f32,
        mask: u32,
    ) -> Option<GroundHit> {
        let filter = self.filter(mask);
        self.queries
            .pipeline
            .cast_ray(origin, direction, max_distance, true, &filter)
            .map(|hit| {
                let point = origin + *direction * hit.distance;
                GroundHit::new(hit.distance, hit.normal, point, hit.entity)
            })
    }

    fn collider_layers(&self, collider: Entity) -> u32 {
        match self.queries.colliders.get(collider) {
            Ok((_, _, _, Some(layers))) => layers.memberships.0,
            Ok((_, _, _, None)) => CollisionLayers::default().memberships.0,
            Err(_) => 0,
        }
    }
}

/// Full width and height of a collider.
///
/// Capsules, balls and cuboids are measured from their parameters; any other
/// shape falls back to its bounding box.
pub fn collider_size(collider: &Collider) -> Option<Vec2> {
    let shape = collider.shape_scaled();
    let size = if let Some(capsule) = shape.as_capsule() {
        // Capsule: half-length of segment + radius, along each axis
        let segment = capsule.segment;
        let half_width = (segment.a.x - segment.b.x).abs() / 2.0;
        let half_height = (segment.a.y - segment.b.y).abs() / 2.0;
        Vec2::new(half_width + capsule.radius, half_height + capsule.radius) * 2.0
    } else if let Some(ball) = shape.as_ball() {
        Vec2::splat(ball.radius * 2.0)
    } else if let Some(cuboid) = shape.as_cuboid() {
        Vec2::new(cuboid.half_extents.x, cuboid.half_extents.y) * 2.0
    } else {
        let aabb = collider.aabb(Vec2::ZERO, Rotation::default());
        aabb.max - aabb.min
    };

    (size.is_finite() && size.x > 0.0 && size.y > 0.0).then_some(size)
}

/// Derive sensor geometry for new detectors and for colliders that changed.
pub fn init_ground_detectors(
    mut q_detectors: Query<
        (Entity, &mut GroundDetector, Option<&Collider>),
        Or<(Added<GroundDetector>, Changed<Collider>)>,
    >,
) {
    for (entity, mut detector, collider) in &mut q_detectors {
        match collider.and_then(collider_size) {
            Some(size) => detector.init_from_size(size),
            None => {
                warn!(?entity, "ground detector has no usable collider; it stays airborne");
                detector.clear_shape();
            }
        }
    }
}

/// Avian-specific ground detection system.
///
/// Syncs each detector with its body pose, runs the ground check, writes a
/// [`GroundStateChanged`] message on every flip, and applies the landing
/// snap to the body's [`Position`].
pub fn avian_ground_detection(
    queries: GroundQueries,
    mut q_detectors: Query<(
        Entity,
        &mut GroundDetector,
        &mut Position,
        &Rotation,
        Option<&Collider>,
    )>,
    mut messages: MessageWriter<GroundStateChanged>,
) {
    for (entity, mut detector, mut position, rotation, collider) in &mut q_detectors {
        if collider.is_none() && detector.shape().is_some() {
            warn!(?entity, "ground detector lost its collider");
            detector.clear_shape();
        }

        detector.set_pose(body_pose(&position, rotation));

        let query = queries.for_character(entity, collider);
        if let Some(transition) = detector.check_ground(&query) {
            messages.write(GroundStateChanged {
                entity,
                grounded: transition.is_grounded(),
            });
        }

        write_back_position(&detector, &mut position);
    }
}

/// Late pass keeping grounded characters flush with platform surfaces.
pub fn avian_platform_height_correction(
    queries: GroundQueries,
    mut q_detectors: Query<(
        Entity,
        &mut GroundDetector,
        &mut Position,
        &Rotation,
        Option<&Collider>,
    )>,
) {
    for (entity, mut detector, mut position, rotation, collider) in &mut q_detectors {
        if !detector.is_grounded() {
            continue;
        }

        detector.set_pose(body_pose(&position, rotation));

        let query = queries.for_character(entity, collider);
        if detector.maintain_platform_height(&query).is_some() {
            write_back_position(&detector, &mut position);
        }
    }
}

fn body_pose(position: &Position, rotation: &Rotation) -> SensorPose {
    SensorPose::new(position.0, Rot2::radians(rotation.as_radians()))
}

fn write_back_position(detector: &GroundDetector, position: &mut Mut<Position>) {
    let corrected = detector.pose().position;
    if position.0 != corrected {
        position.0 = corrected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GroundDetectorPlugin;
    use bevy::ecs::message::Messages;
    use bevy::ecs::system::RunSystemOnce;

    fn create_test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::transform::TransformPlugin);
        // Insert SceneSpawner resource required by Avian's ColliderHierarchyPlugin
        app.insert_resource(bevy::scene::SceneSpawner::default());
        app.add_plugins(PhysicsPlugins::default());
        app.add_plugins(GroundDetectorPlugin::<Avian2dBackend>::default());
        app.insert_resource(Time::<Fixed>::from_hz(60.0));
        app.finish();
        app.cleanup();
        app
    }

    #[test]
    fn capsule_size_includes_caps() {
        let size = collider_size(&Collider::capsule(0.25, 1.0)).unwrap();
        assert!((size.x - 0.5).abs() < 0.001);
        assert!((size.y - 1.5).abs() < 0.001);
    }

    #[test]
    fn ball_and_rectangle_sizes() {
        let ball = collider_size(&Collider::circle(0.5)).unwrap();
        assert!((ball - Vec2::ONE).length() < 0.001);

        let rect = collider_size(&Collider::rectangle(2.0, 1.0)).unwrap();
        assert!((rect - Vec2::new(2.0, 1.0)).length() < 0.001);
    }

    #[test]
    fn other_shapes_use_bounding_box() {
        let triangle = Collider::triangle(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 3.0),
        );
        let size = collider_size(&triangle).unwrap();
        assert!((size - Vec2::new(2.0, 3.0)).length() < 0.01);
    }

    #[test]
    fn plugin_registers_ground_messages() {
        let app = create_test_app();
        assert!(app
            .world()
            .contains_resource::<Messages<GroundStateChanged>>());
    }

    #[test]
    fn init_derives_shape_from_collider() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((
                Transform::default(),
                RigidBody::Kinematic,
                Collider::capsule(0.25, 1.0),
                GroundDetector::new(),
            ))
            .id();

        let _ = app.world_mut().run_system_once(init_ground_detectors);

        let detector = app.world().get::<GroundDetector>(entity).unwrap();
        let extents = detector.extents();
        assert!((extents.x - 0.25).abs() < 0.001);
        assert!((extents.y - 0.75).abs() < 0.001);
    }

    #[test]
    fn init_without_collider_leaves_detector_shapeless() {
        let mut app = create_test_app();

        let entity = app
            .world_mut()
            .spawn((Transform::default(), GroundDetector::new()))
            .id();

        let _ = app.world_mut().run_system_once(init_ground_detectors);

        let detector = app.world().get::<GroundDetector>(entity).unwrap();
        assert!(detector.shape().is_none());
    }
}
