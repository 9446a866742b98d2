/// Convenience result type used across the composer.
pub type ComposerResult<T> = Result<T, ComposerError>;

/// Top-level error taxonomy used by composer APIs.
///
/// Geometry and history invariants are not represented here; they are asserted. Everything in
/// this enum is recoverable at the boundary of the user action that produced it.
#[derive(thiserror::Error, Debug)]
pub enum ComposerError {
    /// Malformed or semantically invalid document JSON.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Invalid argument or layer data passed to an operation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A layer or layer stack could not be rasterized (decode failure, oversized surface, ...).
    #[error("rasterization error: {0}")]
    Raster(String),

    /// The external image generator failed.
    #[error("generation error: {0}")]
    Generation(String),

    /// A generation request was superseded or cancelled before its results were applied.
    #[error("generation cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ComposerError {
    /// Build a [`ComposerError::InvalidDocument`] value.
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    /// Build a [`ComposerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ComposerError::Raster`] value.
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    /// Build a [`ComposerError::Generation`] value.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Build a [`ComposerError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Cancellation is a clean abort and never needs a user-facing message.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
