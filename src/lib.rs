// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # quill
//!
//! Turns course material into prompts for a hosted language model and
//! sends them off: discussion posts, papers, replies to classmates, and
//! batches of replies.
//!
//! ## Architecture
//!
//! - **Ingestion** (`ingest`): uploads → ordered prompt fragments (text, HTML, PDF)
//! - **Prompting** (`prompt`): per-type style policies, citations, prompt assembly
//! - **Inference** (`llm`): the [`llm::Boundary`] trait and an OpenAI Responses client
//! - **Batch** (`batch`): delimiter parsing and sequential, failure-isolated runs
//! - **Surfaces**: the `quill` CLI and, with the `server` feature, an axum HTTP API
//!
//! ## Library usage
//!
//! ```no_run
//! use quill::config::QuillConfig;
//! use quill::generate::{GenerationForm, Generator};
//!
//! let generator = Generator::from_config(&QuillConfig::default()).unwrap();
//! let request = GenerationForm {
//!     request_type: "discussion".into(),
//!     context: "Week 3: chain of custody".into(),
//!     ..Default::default()
//! }
//! .into_request()
//! .unwrap();
//! let output = generator.generate(&request).unwrap();
//! println!("{}", output.content);
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod generate;
pub mod ingest;
pub mod llm;
pub mod paths;
pub mod prompt;
#[cfg(feature = "server")]
pub mod server;
pub mod session;
