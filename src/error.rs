//! Configuration errors.

/// Errors raised while building a detector configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("unknown collision layer '{0}'")]
    UnknownLayer(String),
}
