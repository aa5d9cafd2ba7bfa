//! Error type shared by extraction, encoding and output assembly.

/// Errors raised by the export core
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// No objects were selected for export
    #[error("no cameras selected for export")]
    NoObjects,

    /// Frame range is empty, reversed, or outside the scene limits
    #[error("invalid frame range {start} - {end} (end must be greater than start, both within 0-{max})", max = crate::scene::MAX_FRAME)]
    InvalidFrameRange { start: i32, end: i32 },

    /// Translation scale must be a positive finite number
    #[error("invalid translation scale {0} (must be positive and finite)")]
    InvalidScale(f64),

    /// Object name not present in the scene
    #[error("object '{0}' not found in scene")]
    UnknownObject(String),

    /// Keyframe string could not be parsed back into values
    #[error("malformed keyframe string: {0}")]
    MalformedKeyframes(String),

    /// JSON serialization failed
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
