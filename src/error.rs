use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading data, planning a scale or binding a time source.
#[derive(Debug, Error)]
pub enum GaugeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to read series data: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse series data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Time source '{component}' did not become ready within {timeout:?}")]
    SourceTimeout {
        component: String,
        timeout: Duration,
    },

    #[error("Window error: {0}")]
    Window(String),
}

impl From<json5::Error> for GaugeError {
    fn from(e: json5::Error) -> Self {
        GaugeError::Config(e.to_string())
    }
}

impl From<winit::error::EventLoopError> for GaugeError {
    fn from(e: winit::error::EventLoopError) -> Self {
        GaugeError::Window(e.to_string())
    }
}

impl From<winit::error::OsError> for GaugeError {
    fn from(e: winit::error::OsError) -> Self {
        GaugeError::Window(e.to_string())
    }
}

impl From<pixels::Error> for GaugeError {
    fn from(e: pixels::Error) -> Self {
        GaugeError::Window(e.to_string())
    }
}

/// Result type alias using [`GaugeError`].
pub type Result<T> = std::result::Result<T, GaugeError>;
