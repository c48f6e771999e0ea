/// Crate-wide result alias.
pub type LiveDrawResult<T> = Result<T, LiveDrawError>;

/// Errors raised by the library API.
///
/// Compile and runtime problems in user drawing code are *not* errors: they travel as
/// [`crate::Diagnostic`] values. This type covers API misuse, configuration and I/O.
#[derive(thiserror::Error, Debug)]
pub enum LiveDrawError {
    /// Invalid argument or input value.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The async runtime required by the pipeline is not available.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Rendering backend failure outside of user code.
    #[error("render error: {0}")]
    Render(String),

    /// Serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LiveDrawError {
    /// Build a [`LiveDrawError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LiveDrawError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`LiveDrawError::Runtime`].
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Build a [`LiveDrawError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LiveDrawError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
