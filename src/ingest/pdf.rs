//! PDF handling.
//!
//! Which behaviour applies is a deployment decision made once in the config:
//!
//! - `attach`: forward the bytes to the inference boundary as an embedded
//!   document. Requires a provider with native document understanding.
//! - `placeholder`: never read the PDF; emit a note telling the model the
//!   content is missing and the user should paste it. Always safe.
//! - `extract`: pull the text locally with `pdf-extract` and send it as text.
//!   Works with any provider but loses layout, and scanned PDFs come out empty.

use serde::{Deserialize, Serialize};

use crate::ingest::detect::default_media_type;
use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::model::{MediaKind, PromptFragment, UploadedResource};
use crate::ingest::normalize::source_header;

/// How PDF uploads become prompt fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfMode {
    #[default]
    Attach,
    Placeholder,
    Extract,
}

impl PdfMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attach => "attach",
            Self::Placeholder => "placeholder",
            Self::Extract => "extract",
        }
    }
}

impl std::fmt::Display for PdfMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produce the fragment for one PDF resource under `mode`.
pub fn pdf_fragment(mode: PdfMode, resource: &UploadedResource) -> IngestResult<PromptFragment> {
    match mode {
        PdfMode::Attach => Ok(PromptFragment::Document {
            filename: resource.name.clone(),
            media_type: default_media_type(MediaKind::Pdf).to_string(),
            data: resource.bytes.clone(),
        }),
        PdfMode::Placeholder => Ok(placeholder(resource, "its content was not extracted")),
        PdfMode::Extract => {
            let text = pdf_extract::extract_text_from_mem(&resource.bytes).map_err(|e| {
                IngestError::PdfExtract {
                    name: resource.name.clone(),
                    message: e.to_string(),
                }
            })?;
            let text = text.trim();
            if text.is_empty() {
                tracing::debug!(name = %resource.name, "pdf has no extractable text");
                return Ok(placeholder(resource, "it contains no extractable text"));
            }
            Ok(PromptFragment::text(format!(
                "{}\n{text}",
                source_header(&resource.name)
            )))
        }
    }
}

fn placeholder(resource: &UploadedResource, reason: &str) -> PromptFragment {
    PromptFragment::text(format!(
        "{}\n[PDF document \"{}\" was uploaded but {reason}. \
         Its material is NOT available to you. If it is needed, tell the user \
         to paste the relevant text manually.]",
        source_header(&resource.name),
        resource.name,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UploadedResource {
        UploadedResource::new("reading.pdf", "application/pdf", b"%PDF-1.4 fake".to_vec())
    }

    #[test]
    fn attach_forwards_bytes_verbatim() {
        let frag = pdf_fragment(PdfMode::Attach, &sample()).unwrap();
        assert_eq!(
            frag,
            PromptFragment::Document {
                filename: "reading.pdf".into(),
                media_type: "application/pdf".into(),
                data: b"%PDF-1.4 fake".to_vec(),
            }
        );
    }

    #[test]
    fn placeholder_names_file_and_asks_for_paste() {
        let frag = pdf_fragment(PdfMode::Placeholder, &sample()).unwrap();
        let text = frag.as_text().unwrap();
        assert!(text.starts_with("--- Content from reading.pdf ---"));
        assert!(text.contains("not extracted"));
        assert!(text.contains("paste"));
    }

    #[test]
    fn extract_reports_garbage_as_error() {
        let err = pdf_fragment(PdfMode::Extract, &sample()).unwrap_err();
        assert!(matches!(err, IngestError::PdfExtract { .. }));
    }

    #[test]
    fn mode_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: PdfMode,
        }
        let w: Wrapper = toml::from_str("mode = \"placeholder\"").unwrap();
        assert_eq!(w.mode, PdfMode::Placeholder);
        assert_eq!(PdfMode::default(), PdfMode::Attach);
    }
}
