//! Error types for the emotion pipeline

use std::time::Duration;

use thiserror::Error;

/// Core emoscope errors
///
/// Expansion and aggregation never produce errors; everything here comes from
/// the external collaborators (capture, detector) or from construction-time
/// validation.
#[derive(Error, Debug)]
pub enum EmoscopeError {
    // Session-terminal failures
    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Model load failed: {0}")]
    ModelLoadFailed(String),

    // Per-cycle failures, recovered by the loop
    #[error("Detection cycle failed: {0}")]
    DetectionCycle(String),

    #[error("Detection timed out after {0:?}")]
    DetectionTimeout(Duration),

    #[error("Detection loop started without a ready model")]
    ModelNotReady,

    // Validation
    #[error("Invalid emotion library: {0}")]
    InvalidLibrary(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Input
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmoscopeError {
    /// Whether the detection loop can keep going after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EmoscopeError::DetectionCycle(_) | EmoscopeError::DetectionTimeout(_)
        )
    }
}

/// Result type for emoscope operations
pub type EmoscopeResult<T> = Result<T, EmoscopeError>;
