/// Convenience result type used across Marionette.
pub type MarionetteResult<T> = Result<T, MarionetteError>;

/// Top-level error taxonomy used by runtime APIs.
#[derive(thiserror::Error, Debug)]
pub enum MarionetteError {
    /// Malformed document, template, or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A selector string that does not parse.
    #[error("selector error: {0}")]
    Selector(String),

    /// Errors while applying behaviors or resolving values for a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies, IO, or host callbacks.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MarionetteError {
    /// Build a [`MarionetteError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MarionetteError::Selector`] value.
    pub fn selector(msg: impl Into<String>) -> Self {
        Self::Selector(msg.into())
    }

    /// Build a [`MarionetteError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`MarionetteError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
