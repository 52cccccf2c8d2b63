mod traits;

#[cfg(feature = "avian2d")]
pub mod avian;

pub use traits::{GroundDetectionBackend, GroundQuery, ShapeCastRequest};

#[cfg(feature = "avian2d")]
pub use avian::Avian2dBackend;
