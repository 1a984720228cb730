//! Resource → fragment normalization.

use serde::{Deserialize, Serialize};

use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::markup::strip_markup;
use crate::ingest::model::{MediaKind, PromptFragment, UploadedResource};
use crate::ingest::pdf::{PdfMode, pdf_fragment};

/// What to do with uploads of a kind we cannot read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedPolicy {
    /// Drop the resource without a trace in the prompt.
    #[default]
    Skip,
    /// Emit a one-line note so the model knows something is missing.
    Note,
}

/// Normalization settings, fixed for the lifetime of a deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub pdf_mode: PdfMode,
    #[serde(default)]
    pub unsupported: UnsupportedPolicy,
}

/// Header line that prefixes every text fragment derived from a file.
pub fn source_header(name: &str) -> String {
    format!("--- Content from {name} ---")
}

/// Converts uploaded resources into prompt fragments. Pure over bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: IngestConfig,
}

impl Normalizer {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> IngestConfig {
        self.config
    }

    /// Normalize one resource.
    ///
    /// Returns `Ok(None)` only for unsupported kinds under
    /// [`UnsupportedPolicy::Skip`]; a PDF always yields a fragment.
    pub fn normalize(&self, resource: &UploadedResource) -> IngestResult<Option<PromptFragment>> {
        match resource.media_kind {
            MediaKind::Pdf => pdf_fragment(self.config.pdf_mode, resource).map(Some),
            MediaKind::PlainText => {
                let text = decode_utf8(resource)?;
                Ok(Some(PromptFragment::text(format!(
                    "{}\n{text}",
                    source_header(&resource.name)
                ))))
            }
            MediaKind::Markup => {
                let html = decode_utf8(resource)?;
                Ok(Some(PromptFragment::text(format!(
                    "{}\n{}",
                    source_header(&resource.name),
                    strip_markup(html)
                ))))
            }
            MediaKind::Unsupported => match self.config.unsupported {
                UnsupportedPolicy::Skip => {
                    tracing::debug!(name = %resource.name, content_type = %resource.content_type, "skipping unsupported upload");
                    Ok(None)
                }
                UnsupportedPolicy::Note => Ok(Some(PromptFragment::text(format!(
                    "[Uploaded file \"{}\" has an unsupported format and was not included.]",
                    resource.name
                )))),
            },
        }
    }

    /// Normalize every resource in upload order, dropping skipped ones.
    pub fn normalize_all(&self, resources: &[UploadedResource]) -> IngestResult<Vec<PromptFragment>> {
        let mut fragments = Vec::with_capacity(resources.len());
        for resource in resources {
            if let Some(fragment) = self.normalize(resource)? {
                fragments.push(fragment);
            }
        }
        Ok(fragments)
    }
}

fn decode_utf8(resource: &UploadedResource) -> IngestResult<&str> {
    std::str::from_utf8(&resource.bytes).map_err(|e| IngestError::Decode {
        name: resource.name.clone(),
        kind: resource.media_kind.to_string(),
        message: e.to_string(),
    })
}
