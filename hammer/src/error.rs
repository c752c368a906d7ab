use thiserror::Error;

use crate::object::BodyId;

/// Errors surfaced at the physics API boundary.
///
/// The simulation step itself never fails; everything here comes from a
/// caller handing the interface a stale id or malformed input.
#[derive(Debug, Error)]
pub enum HammerError {
    #[error("body {0} is not registered")]
    BodyNotFound(BodyId),

    #[error("invalid shape settings: {0}")]
    InvalidShapeSettings(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Placeholder operations that the engine does not model.
    #[error("operation `{0}` is not supported by the hammer backend")]
    Unsupported(&'static str),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HammerError>;
