//! Collision layers and the ground filter.

use bevy::prelude::*;

use crate::error::ConfigError;

/// Named collision layers known to the detector.
///
/// Each variant maps to one bit, in declaration order, so the masks line up
/// with an Avian `PhysicsLayer` enum declared the same way.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameLayer {
    #[default]
    Default,
    Platform,
    PhysicsObject,
    Character,
}

impl GameLayer {
    pub const ALL: [GameLayer; 4] = [
        GameLayer::Default,
        GameLayer::Platform,
        GameLayer::PhysicsObject,
        GameLayer::Character,
    ];

    /// Bit of this layer inside a layer mask.
    pub const fn bits(self) -> u32 {
        1 << self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            GameLayer::Default => "Default",
            GameLayer::Platform => "Platform",
            GameLayer::PhysicsObject => "PhysicsObject",
            GameLayer::Character => "Character",
        }
    }

    /// Look up a layer by its name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layer| layer.name() == name)
    }

    /// Combined mask of several layers.
    pub fn mask(layers: impl IntoIterator<Item = GameLayer>) -> u32 {
        layers.into_iter().fold(0, |mask, layer| mask | layer.bits())
    }
}

/// Which layers count as ground, and which of those are platforms.
///
/// Built once per detector and never re-derived per query.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundFilter {
    ground: u32,
    platform: u32,
}

impl GroundFilter {
    pub const fn new(ground: u32, platform: u32) -> Self {
        Self { ground, platform }
    }

    /// Resolve layer names into a filter.
    ///
    /// ```rust
    /// use ground_detector_2d::prelude::*;
    ///
    /// let filter = GroundFilter::from_layer_names(&["Platform", "PhysicsObject"], "Platform").unwrap();
    /// assert!(filter.is_platform(GameLayer::Platform.bits()));
    /// assert!(GroundFilter::from_layer_names(&["Lava"], "Platform").is_err());
    /// ```
    pub fn from_layer_names(ground: &[&str], platform: &str) -> Result<Self, ConfigError> {
        let resolve = |name: &str| {
            GameLayer::from_name(name).ok_or_else(|| ConfigError::UnknownLayer(name.to_owned()))
        };

        let mut ground_mask = 0;
        for name in ground {
            ground_mask |= resolve(name)?.bits();
        }
        let platform_mask = resolve(platform)?.bits();

        Ok(Self::new(ground_mask, platform_mask))
    }

    pub fn ground_mask(&self) -> u32 {
        self.ground
    }

    pub fn platform_mask(&self) -> u32 {
        self.platform
    }

    /// Whether a collider with these memberships is eligible ground.
    pub fn is_ground(&self, memberships: u32) -> bool {
        self.ground & memberships != 0
    }

    /// Whether a collider with these memberships is a platform.
    pub fn is_platform(&self, memberships: u32) -> bool {
        self.platform & memberships != 0
    }
}

impl Default for GroundFilter {
    fn default() -> Self {
        Self::new(
            GameLayer::mask([GameLayer::Platform, GameLayer::PhysicsObject]),
            GameLayer::Platform.bits(),
        )
    }
}
