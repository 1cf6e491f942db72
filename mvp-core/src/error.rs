/// Error types for the visualizer core
use thiserror::Error;

/// Result type for visualizer operations
pub type Result<T> = std::result::Result<T, VisualizerError>;

/// Errors that can occur while editing or loading visualizer state.
///
/// Out-of-range numbers never show up here; they are clamped by the setters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisualizerError {
    #[error("degenerate camera basis: {0}")]
    DegenerateBasis(&'static str),

    #[error("non-finite component in {0}")]
    NonFinite(&'static str),

    #[error("invalid camera limits: {0}")]
    InvalidLimits(String),

    #[error("model matrix would become singular")]
    SingularModel,

    #[error("invalid grid shader parameters: {0}")]
    InvalidGrid(String),

    #[error("command error: {0}")]
    Command(String),
}
