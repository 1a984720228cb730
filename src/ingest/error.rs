//! Rich diagnostic error types for document normalization.

use miette::Diagnostic;
use thiserror::Error;

/// Errors from turning an uploaded resource into a prompt fragment.
#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("\"{name}\" is declared as {kind} but is not valid UTF-8: {message}")]
    #[diagnostic(
        code(quill::ingest::decode),
        help(
            "Text and HTML uploads must be UTF-8 encoded. Re-save the file as UTF-8 \
             or paste its content into the context field instead."
        )
    )]
    Decode {
        name: String,
        kind: String,
        message: String,
    },

    #[error("failed to extract text from PDF \"{name}\": {message}")]
    #[diagnostic(
        code(quill::ingest::pdf_extract),
        help(
            "The PDF could not be read locally. Switch `ingest.pdf_mode` to `attach` \
             so the model reads the document itself, or paste the text manually."
        )
    )]
    PdfExtract { name: String, message: String },
}

/// Convenience alias for normalization results.
pub type IngestResult<T> = std::result::Result<T, IngestError>;
