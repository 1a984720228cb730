//! Top-level error type for quill.
//!
//! Each subsystem defines its own error with miette `#[diagnostic]` derives;
//! [`QuillError`] wraps them transparently so codes and help text reach the
//! user unchanged.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::ingest::IngestError;
use crate::llm::InvokeError;
use crate::paths::PathError;
use crate::prompt::PromptError;
use crate::session::SessionError;

#[derive(Debug, Error, Diagnostic)]
pub enum QuillError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),
}

/// Coarse failure classes used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something we refuse to act on.
    InputShape,
    /// An upload could not be turned into a fragment.
    Normalization,
    /// The inference call failed.
    Boundary,
    /// Anything else: config, filesystem, policy loading.
    Internal,
}

impl QuillError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Prompt(
                PromptError::UnknownRequestType { .. } | PromptError::MissingField { .. },
            ) => ErrorKind::InputShape,
            Self::Ingest(_) => ErrorKind::Normalization,
            Self::Invoke(_) => ErrorKind::Boundary,
            Self::Prompt(_) | Self::Config(_) | Self::Path(_) | Self::Session(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Convenience alias for crate-level results.
pub type QuillResult<T> = std::result::Result<T, QuillError>;
