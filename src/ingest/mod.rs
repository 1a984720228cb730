//! Content ingestion: uploaded documents → ordered prompt fragments.
//!
//! Each upload is sniffed into a [`MediaKind`] and converted by the
//! [`Normalizer`]: plain text verbatim, HTML stripped to text, PDFs according
//! to the deployment's [`PdfMode`], anything else skipped or noted.

pub mod detect;
pub mod error;
pub mod markup;
pub mod model;
pub mod normalize;
pub mod pdf;

pub use error::{IngestError, IngestResult};
pub use model::{FragmentKind, MediaKind, PromptFragment, UploadedResource};
pub use normalize::{IngestConfig, Normalizer, UnsupportedPolicy};
pub use pdf::PdfMode;
