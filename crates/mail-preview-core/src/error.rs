//! Error types for Mail Preview
//!
//! Dispatch misses (`UnrecognizedPath`, `UnknownViewer`, `UnknownAction`) never
//! escape the handler: they are turned into 404 responses. Everything else is a
//! genuine failure the developer needs to see.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Mail Preview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Mail Preview
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Dispatch Misses
    // ==========================================================================
    #[error("Unrecognized preview path: {0}")]
    UnrecognizedPath(String),

    #[error("Unknown viewer: {0}")]
    UnknownViewer(String),

    #[error("Unknown action {action:?} on viewer {viewer}")]
    UnknownAction { viewer: String, action: String },

    // ==========================================================================
    // Preview Definitions
    // ==========================================================================
    #[error("Failed to load preview {}: {reason}", path.display())]
    PreviewLoad { path: PathBuf, reason: String },

    #[error("Invalid preview definition: {0}")]
    InvalidDefinition(String),

    #[error("Action {viewer}.{action} failed: {reason}")]
    Action {
        viewer: String,
        action: String,
        reason: String,
    },

    // ==========================================================================
    // Rendering
    // ==========================================================================
    #[error("Template error: {0}")]
    Template(String),

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
}

impl Error {
    /// Returns the error type string (for logs and JSON output)
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::UnrecognizedPath(_) => "UNRECOGNIZED_PATH",
            Self::UnknownViewer(_) | Self::UnknownAction { .. } => "NOT_FOUND",
            Self::PreviewLoad { .. } | Self::InvalidDefinition(_) | Self::Json5(_) => {
                "PREVIEW_LOAD_FAILURE"
            }
            Self::Action { .. } => "ACTION_FAILED",
            Self::Template(_) => "TEMPLATE_ERROR",
            Self::Io(_) => "OS_ERROR",
            Self::Serialization(_) => "TYPE_ERROR",
        }
    }

    /// HTTP status this error maps to when it reaches the response layer.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::UnrecognizedPath(_) | Self::UnknownViewer(_) | Self::UnknownAction { .. } => 404,
            _ => 500,
        }
    }

    /// True when a router in front of the handler should try another route.
    #[must_use]
    pub const fn is_pass_through(&self) -> bool {
        matches!(self, Self::UnrecognizedPath(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_misses_map_to_404() {
        let cases = [
            Error::UnrecognizedPath("/nofile".into()),
            Error::UnknownViewer("Ghost".into()),
            Error::UnknownAction {
                viewer: "Notifier".into(),
                action: "missing".into(),
            },
        ];
        for err in cases {
            assert_eq!(err.status(), 404, "{err}");
        }
    }

    #[test]
    fn only_unrecognized_path_passes_through() {
        assert!(Error::UnrecognizedPath("/x".into()).is_pass_through());
        assert!(!Error::UnknownViewer("Ghost".into()).is_pass_through());
        assert!(
            !Error::UnknownAction {
                viewer: "A".into(),
                action: "b".into(),
            }
            .is_pass_through()
        );
    }

    #[test]
    fn failures_map_to_500() {
        let err = Error::Template("boom".into());
        assert_eq!(err.status(), 500);
        assert_eq!(err.error_type(), "TEMPLATE_ERROR");

        let err = Error::Action {
            viewer: "Notifier".into(),
            action: "digest".into(),
            reason: "no recipients".into(),
        };
        assert_eq!(err.status(), 500);
        assert_eq!(err.to_string(), "Action Notifier.digest failed: no recipients");
    }

    #[test]
    fn preview_load_display_includes_path() {
        let err = Error::PreviewLoad {
            path: PathBuf::from("app/mailers/broken.json5"),
            reason: "unexpected end of input".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("app/mailers/broken.json5"));
        assert!(msg.contains("unexpected end of input"));
        assert_eq!(err.error_type(), "PREVIEW_LOAD_FAILURE");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert_eq!(err.error_type(), "OS_ERROR");
    }
}
