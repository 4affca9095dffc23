//! Error types of the research pipeline.
//!
//! Only [`ConfigurationError`] is fatal. Everything else is caught at the
//! user action that caused it and turned into an inline message.

use std::io;
use std::path::PathBuf;

use deep_research_model::ErrorKind;
use thiserror::Error;

/// The credential (or the place it should come from) is unusable.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The credential was found nowhere.
    #[error("{name} not found! Please set {name} in your .env file.")]
    MissingCredential {
        /// Name of the variable.
        name: &'static str,
    },
    /// An env or secrets file exists but could not be used.
    #[error("failed to read {}: {reason}", path.display())]
    Unreadable {
        /// Path of the file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
}

/// The user submitted without a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("Please enter a topic.")]
pub struct EmptyInputError;

/// The remote call failed or returned an unusable response.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GenerationError {
    kind: ErrorKind,
    message: String,
}

impl GenerationError {
    /// Creates a new error.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the kind reported by the provider.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the underlying message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The citation widget was present but could not be shown.
#[derive(Debug, Error)]
pub enum WidgetRenderError {
    /// The markup could not be understood.
    #[error("invalid widget markup: {0}")]
    Markup(String),
    /// The output surface refused the widget.
    #[error(transparent)]
    Output(#[from] io::Error),
}

/// An export could not be produced or delivered.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writing the PDF document failed.
    #[error("failed to write PDF: {0}")]
    Pdf(#[source] io::Error),
    /// Saving an artifact failed.
    #[error("failed to save {}: {source}", path.display())]
    Save {
        /// Destination of the artifact.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// Why a submitted query produced no result.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Nothing to ask.
    #[error(transparent)]
    EmptyInput(#[from] EmptyInputError),
    /// The generation call failed.
    #[error("An error occurred: {0}")]
    Generation(#[from] GenerationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ConfigurationError::MissingCredential {
            name: "GEMINI_API_KEY",
        };
        assert_eq!(
            err.to_string(),
            "GEMINI_API_KEY not found! Please set GEMINI_API_KEY in your \
             .env file."
        );

        let err = SubmitError::from(GenerationError::new(
            ErrorKind::Other,
            "connection refused",
        ));
        assert_eq!(err.to_string(), "An error occurred: connection refused");
        assert_eq!(
            SubmitError::from(EmptyInputError).to_string(),
            "Please enter a topic."
        );
    }
}
