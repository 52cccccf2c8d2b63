//! Ground detection and surface adherence for 2D capsule characters.
//!
//! Every fixed step a [`GroundDetector`](detector::GroundDetector) sweeps the
//! character's collision shape downward, picks the surface it stands on, and
//! reports grounded/airborne transitions. It also exposes the slope tangent
//! under the feet and a ledge probe, and it snaps the character back onto
//! platforms when momentum integration lets it drift.
//!
//! The kernel only depends on the [`GroundQuery`](backend::GroundQuery)
//! trait. The `avian2d` feature (on by default) provides a backend built on
//! Avian's spatial queries.
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use ground_detector_2d::prelude::*;
//!
//! # #[cfg(feature = "avian2d")]
//! fn build(app: &mut App) {
//!     app.add_plugins(GroundDetectorPlugin::<Avian2dBackend>::default());
//! }
//! ```

use std::marker::PhantomData;

use bevy::prelude::*;

pub mod backend;
pub mod config;
pub mod debug;
pub mod detection;
pub mod detector;
pub mod error;
pub mod geometry;

#[cfg(feature = "avian2d")]
pub use backend::avian;

use backend::GroundDetectionBackend;

pub mod prelude {
    pub use crate::backend::{GroundDetectionBackend, GroundQuery, ShapeCastRequest};
    pub use crate::config::{GameLayer, GroundFilter, GroundSensorConfig};
    pub use crate::debug::GroundDetectorDebugPlugin;
    pub use crate::detection::{
        CandidateReport, CandidateVerdict, GroundCastBuffer, GroundDiagnostics, GroundHit,
        GroundStateChanged, GroundTransition,
    };
    pub use crate::detector::GroundDetector;
    pub use crate::error::ConfigError;
    pub use crate::geometry::{Facing, SensorPose, SensorShape};
    pub use crate::{GroundDetectionSet, GroundDetectorPlugin};

    #[cfg(feature = "avian2d")]
    pub use crate::backend::Avian2dBackend;
}

/// Ordering of the detector systems inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroundDetectionSet {
    /// Derive sensor geometry from colliders.
    Init,
    /// Ground check and landing snap.
    Sense,
    /// Late platform height correction.
    Correct,
}

/// Adds ground detection driven by the backend `B`.
pub struct GroundDetectorPlugin<B: GroundDetectionBackend> {
    _backend: PhantomData<B>,
}

impl<B: GroundDetectionBackend> Default for GroundDetectorPlugin<B> {
    fn default() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B: GroundDetectionBackend> Plugin for GroundDetectorPlugin<B> {
    fn build(&self, app: &mut App) {
        app.add_message::<detection::GroundStateChanged>();

        app.register_type::<config::GroundSensorConfig>()
            .register_type::<config::GroundFilter>()
            .register_type::<config::GameLayer>()
            .register_type::<geometry::SensorShape>()
            .register_type::<geometry::Facing>();

        app.configure_sets(
            FixedUpdate,
            (
                GroundDetectionSet::Init,
                GroundDetectionSet::Sense,
                GroundDetectionSet::Correct,
            )
                .chain(),
        );

        app.add_plugins(B::plugin());
    }
}
