use doco_core::CoreError;
use thiserror::Error;

/// Errors returned by the previewer.
///
/// Rules never fail; errors come from configuration and the parser boundary.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// The markdown adapter rejected the input.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// A rule name outside the fixed rule list.
    #[error("Unknown rule: {name}")]
    UnknownRule {
        /// Name as given by the caller
        name: String,
    },
    /// JSON options could not be deserialized.
    #[error("Invalid preview options: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
