//! Configuration for the ground sensor thresholds.

use bevy::prelude::*;

use crate::error::ConfigError;

/// Tunable distances used by the ground cast and the height corrector.
///
/// All values are in world units and are validated once, when the detector
/// is built, rather than on every query.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct GroundSensorConfig {
    /// How far the collision shape is swept downward looking for ground.
    pub ray_distance: f32,

    /// Height above the shape bottom still counted as "under the feet".
    pub ray_offset: f32,

    /// Hits at or beyond this distance are too far to be standing ground.
    pub distance_threshold: f32,

    /// Gap tolerated by the late platform pass before the character is snapped.
    pub stand_height_threshold: f32,
}

impl GroundSensorConfig {
    pub const RAY_DISTANCE_RANGE: (f32, f32) = (0.00001, 1.0);
    pub const RAY_OFFSET_RANGE: (f32, f32) = (0.00001, 1.0);
    pub const DISTANCE_THRESHOLD_RANGE: (f32, f32) = (0.01, 1.0);
    pub const STAND_HEIGHT_THRESHOLD_RANGE: (f32, f32) = (0.0, 1.0);

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("ray_distance", self.ray_distance, Self::RAY_DISTANCE_RANGE)?;
        check_range("ray_offset", self.ray_offset, Self::RAY_OFFSET_RANGE)?;
        check_range(
            "distance_threshold",
            self.distance_threshold,
            Self::DISTANCE_THRESHOLD_RANGE,
        )?;
        check_range(
            "stand_height_threshold",
            self.stand_height_threshold,
            Self::STAND_HEIGHT_THRESHOLD_RANGE,
        )
    }

    /// Copy of this config with every field clamped into its range.
    #[must_use]
    pub fn clamped(self) -> Self {
        let clamp = |value: f32, (min, max): (f32, f32)| value.clamp(min, max);
        Self {
            ray_distance: clamp(self.ray_distance, Self::RAY_DISTANCE_RANGE),
            ray_offset: clamp(self.ray_offset, Self::RAY_OFFSET_RANGE),
            distance_threshold: clamp(self.distance_threshold, Self::DISTANCE_THRESHOLD_RANGE),
            stand_height_threshold: clamp(
                self.stand_height_threshold,
                Self::STAND_HEIGHT_THRESHOLD_RANGE,
            ),
        }
    }
}

impl Default for GroundSensorConfig {
    fn default() -> Self {
        Self {
            ray_distance: 0.2,
            ray_offset: 0.25,
            distance_threshold: 0.05,
            stand_height_threshold: 0.05,
        }
    }
}

fn check_range(name: &'static str, value: f32, (min, max): (f32, f32)) -> Result<(), ConfigError> {
    // NaN fails both comparisons, so test for containment rather than exclusion.
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GroundSensorConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_ray_distance() {
        let config = GroundSensorConfig {
            ray_distance: 0.0,
            ..default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                name: "ray_distance",
                ..
            }
        ));
    }

    #[test]
    fn rejects_threshold_below_minimum() {
        let config = GroundSensorConfig {
            distance_threshold: 0.001,
            ..default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nan() {
        let config = GroundSensorConfig {
            ray_offset: f32::NAN,
            ..default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn clamped_config_validates() {
        let config = GroundSensorConfig {
            ray_distance: 5.0,
            ray_offset: -1.0,
            distance_threshold: 0.0,
            stand_height_threshold: 2.0,
        }
        .clamped();

        assert!(config.validate().is_ok());
        assert_eq!(config.ray_distance, 1.0);
        assert_eq!(config.distance_threshold, 0.01);
        assert_eq!(config.stand_height_threshold, 1.0);
    }
}
