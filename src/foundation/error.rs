/// Convenience result type used across giftframe.
pub type FrameResult<T> = Result<T, FrameError>;

/// Top-level error taxonomy used by resolution, assignment and rendering APIs.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    /// Invalid caller-provided data (unknown shape, empty bulk assignment, bad color...).
    ///
    /// Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persistence collaborator was unreachable or rejected the operation.
    #[error("store error: {0}")]
    Store(String),

    /// Raster export failed. Non-fatal when saving a template.
    #[error("export error: {0}")]
    Export(String),

    /// Errors while building or rasterizing a draw program.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrameError {
    /// Build a [`FrameError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FrameError::Store`] value.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Build a [`FrameError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`FrameError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`FrameError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors that must never be retried.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<serde_json::Error> for FrameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
