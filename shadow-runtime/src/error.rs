//! Errors raised while configuring the shadow runtime.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A `MirrorConfig` or logging setting was rejected by `validate()`.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
