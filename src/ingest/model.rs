//! Core data types for uploaded material.
//!
//! An [`UploadedResource`] is what the user handed us; a [`PromptFragment`] is
//! what the assembler and the inference boundary consume.

use serde::{Deserialize, Serialize};

use crate::ingest::detect::detect_media_kind;

/// Media kinds the normalizer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Pdf,
    PlainText,
    Markup,
    Unsupported,
}

impl MediaKind {
    /// Human-readable name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::PlainText => "text",
            Self::Markup => "html",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-supplied document.
///
/// Identity is positional: two resources may share a name, and callers address
/// them by their index in the upload list.
#[derive(Debug, Clone)]
pub struct UploadedResource {
    /// Display name (usually the original filename).
    pub name: String,
    /// Declared media type, possibly empty.
    pub content_type: String,
    /// Kind sniffed from `content_type` and `name`.
    pub media_kind: MediaKind,
    /// Raw content. Never mutated after upload.
    pub bytes: Vec<u8>,
    /// Citation URL supplied by the user. Empty means "not citable".
    pub source_url: String,
}

impl UploadedResource {
    /// Create a resource, sniffing its media kind from the declared type and name.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type.into();
        let media_kind = detect_media_kind(&content_type, &name);
        Self {
            name,
            content_type,
            media_kind,
            bytes,
            source_url: String::new(),
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Whether this resource belongs to the citation set right now.
    pub fn is_citable(&self) -> bool {
        !self.source_url.trim().is_empty()
    }
}

/// Discriminant of a [`PromptFragment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    RawText,
    EmbeddedDocument,
}

/// A normalized unit of prompt content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptFragment {
    /// Plain text sent to the model as-is.
    Text { text: String },
    /// An opaque document forwarded as a structured attachment.
    Document {
        filename: String,
        media_type: String,
        data: Vec<u8>,
    },
}

impl PromptFragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn kind(&self) -> FragmentKind {
        match self {
            Self::Text { .. } => FragmentKind::RawText,
            Self::Document { .. } => FragmentKind::EmbeddedDocument,
        }
    }

    /// The text payload, if this is a text fragment.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Document { .. } => None,
        }
    }
}
