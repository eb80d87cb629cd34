/// Convenience result type used across the engine.
pub type GeoCamResult<T> = Result<T, GeoCamError>;

/// Error taxonomy for capture, rendering and encoding APIs.
#[derive(thiserror::Error, Debug)]
pub enum GeoCamError {
    /// Invalid caller-provided values or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Camera unavailable, inactive or producing unusable frames.
    #[error("device error: {0}")]
    Device(String),

    /// Tile or geocoder request failed, timed out or returned an unusable body.
    #[error("network error: {0}")]
    Network(String),

    /// Drawing, rasterization or font failures.
    #[error("render error: {0}")]
    Render(String),

    /// Encoder setup, streaming or finalize failures.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GeoCamError {
    /// Build a [`GeoCamError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GeoCamError::Device`] value.
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Build a [`GeoCamError::Network`] value.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Build a [`GeoCamError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`GeoCamError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`GeoCamError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
