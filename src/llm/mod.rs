//! Inference boundary: one assembled prompt in, completion text out.
//!
//! The hosted model is a black box behind the [`Boundary`] trait. The
//! [`GenerationInvoker`] issues exactly one call per prompt: no retry, no
//! timeout beyond what the HTTP client enforces.

pub mod openai;

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::ingest::PromptFragment;
use crate::prompt::AssembledPrompt;

pub use openai::{OpenAiClient, ProviderConfig};

/// Typed failures of a single inference call.
#[derive(Debug, Error, Diagnostic)]
pub enum InvokeError {
    #[error("inference provider unreachable at {url}: {message}")]
    #[diagnostic(
        code(quill::llm::unreachable),
        help("Check network access and `provider.base_url` in config.toml.")
    )]
    Unreachable { url: String, message: String },

    #[error("inference provider rejected the request ({status}): {message}")]
    #[diagnostic(
        code(quill::llm::rejected),
        help(
            "The provider refused the call. Check the API key environment variable, \
             the model name, and that attachments are supported by the model."
        )
    )]
    Rejected { status: u16, message: String },

    #[error("malformed response from inference provider: {message}")]
    #[diagnostic(
        code(quill::llm::malformed_response),
        help("The provider answered, but not in the expected shape.")
    )]
    MalformedResponse { message: String },
}

pub type InvokeResult<T> = std::result::Result<T, InvokeError>;

/// One outbound completion call.
///
/// `content` is the ordered user content: text blocks and embedded documents
/// exactly as the assembler produced them.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub content: &'a [PromptFragment],
}

/// A request/response text-completion capability.
pub trait Boundary: Send + Sync {
    fn complete(&self, request: &CompletionRequest<'_>) -> InvokeResult<String>;
}

/// Issues assembled prompts to a [`Boundary`] with a default model.
#[derive(Clone)]
pub struct GenerationInvoker {
    boundary: Arc<dyn Boundary>,
    model: String,
}

impl GenerationInvoker {
    pub fn new(boundary: Arc<dyn Boundary>, model: impl Into<String>) -> Self {
        Self {
            boundary,
            model: model.into(),
        }
    }

    /// The model used when no override is given.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one prompt. A blank override falls back to the default model.
    pub fn invoke(
        &self,
        prompt: &AssembledPrompt,
        model_override: Option<&str>,
    ) -> InvokeResult<String> {
        let model = model_override
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.model);

        tracing::debug!(
            model,
            request_type = %prompt.request_type,
            blocks = prompt.content.len(),
            attachments = prompt.attachment_count(),
            "invoking inference boundary"
        );

        let request = CompletionRequest {
            model,
            system: &prompt.system_instructions,
            content: &prompt.content,
        };
        self.boundary.complete(&request).inspect_err(|e| {
            tracing::warn!(model, error = %e, "inference call failed");
        })
    }
}

impl std::fmt::Debug for GenerationInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationInvoker")
            .field("model", &self.model)
            .finish()
    }
}
