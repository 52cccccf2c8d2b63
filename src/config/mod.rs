//! Detector configuration.

mod layers;
mod sensors;

pub use layers::{GameLayer, GroundFilter};
pub use sensors::GroundSensorConfig;

/// Maximum number of shape-cast hits considered per ground check.
pub const GROUND_CAST_CAPACITY: usize = 5;

/// Minimum "up" component of a local surface normal for it to count as ground.
///
/// Rejects surfaces steeper than 60 degrees from horizontal.
pub const MIN_GROUND_NORMAL_UP: f32 = 0.5;

/// How far below the feet the edge probe reaches.
pub const EDGE_PROBE_LENGTH: f32 = 1.0;

/// Lift applied to the edge probe origin so it does not start inside geometry.
pub const EDGE_PROBE_LIFT: f32 = 0.1;
