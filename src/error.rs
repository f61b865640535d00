use thiserror::Error;

/// Errors raised by the picking and camera core.
///
/// Anything that is not an invalid argument (empty scene, no hit, no keys
/// held) is a normal outcome and never surfaces here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewportError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ViewportError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result type alias using [`ViewportError`].
pub type Result<T> = std::result::Result<T, ViewportError>;
