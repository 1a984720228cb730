//! Prompt assembly: request type + fragments → system and task instructions.
//!
//! Per-type wording lives in a [`PolicyTable`] (data, not branches). The
//! [`PromptAssembler`] looks the policy up, resolves length targets and
//! appends the references directive when a [`CitationSet`] is non-empty.

pub mod assemble;
pub mod citation;
pub mod error;
pub mod policy;
pub mod request;

pub use assemble::{AssembledPrompt, PromptAssembler, PromptInput, resolve_pages};
pub use citation::{Citation, CitationSet, FileSource, parse_file_sources};
pub use error::{PromptError, PromptResult};
pub use policy::{LengthPolicy, PolicyTable, StylePolicy};
pub use request::RequestType;
