//! Rich diagnostic error types for prompt assembly and style policies.

use miette::Diagnostic;
use thiserror::Error;

/// Errors from request-type parsing, policy loading and prompt assembly.
#[derive(Debug, Error, Diagnostic)]
pub enum PromptError {
    #[error("unknown request type: \"{value}\"")]
    #[diagnostic(
        code(quill::prompt::unknown_type),
        help("Valid request types are: discussion, paper, response, batch-item.")
    )]
    UnknownRequestType { value: String },

    #[error("missing required field \"{field}\" for request type \"{request_type}\"")]
    #[diagnostic(
        code(quill::prompt::missing_field),
        help("Reply requests need the post being answered in `discussionPost`.")
    )]
    MissingField { field: String, request_type: String },

    #[error("no style policy for request type \"{request_type}\"")]
    #[diagnostic(
        code(quill::prompt::missing_policy),
        help(
            "Every request type needs a `[policies.<type>]` table. \
             Run `quill policies` to print the bundled table as a starting point."
        )
    )]
    MissingPolicy { request_type: String },

    #[error("failed to parse style policies from {origin}: {message}")]
    #[diagnostic(
        code(quill::prompt::policy_parse),
        help("Check the TOML syntax and that every policy has banned_terms, length, system_block and task_directive.")
    )]
    PolicyParse { origin: String, message: String },

    #[error("failed to read style policies: {path}")]
    #[diagnostic(
        code(quill::prompt::policy_read),
        help("Ensure the `policies` path in config.toml points to a readable file.")
    )]
    PolicyRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for prompt results.
pub type PromptResult<T> = std::result::Result<T, PromptError>;
