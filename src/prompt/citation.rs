//! Citation sets and the references directive.
//!
//! A citation set is derived at generation time from the resources that
//! carry a non-empty source URL. It is never cached: URLs are user-editable
//! between calls.

use serde::{Deserialize, Serialize};

use crate::ingest::UploadedResource;

/// One `{filename, sourceUrl}` entry of the `fileSources` form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSource {
    pub filename: String,
    #[serde(default)]
    pub source_url: String,
}

/// Parse the `fileSources` JSON array.
///
/// Malformed or absent input recovers to an empty list; this is logged but
/// never surfaced to the user.
pub fn parse_file_sources(json: &str) -> Vec<FileSource> {
    let json = json.trim();
    if json.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(json) {
        Ok(sources) => sources,
        Err(e) => {
            tracing::warn!(error = %e, "malformed fileSources JSON, treating as empty");
            Vec::new()
        }
    }
}

/// A citable resource: display filename plus reference URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub filename: String,
    pub url: String,
}

/// The resources that may be cited in this generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationSet {
    entries: Vec<Citation>,
}

impl CitationSet {
    /// Collect every resource with a non-blank source URL, in upload order.
    pub fn from_resources(resources: &[UploadedResource]) -> Self {
        let entries = resources
            .iter()
            .filter(|r| r.is_citable())
            .map(|r| Citation {
                filename: r.name.clone(),
                url: r.source_url.trim().to_string(),
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Citation> {
        self.entries.iter()
    }

    /// The references directive, or `None` when nothing is citable.
    pub fn directive(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut out = String::from(
            "MANDATORY - APA7 CITATION REQUIREMENTS:\n\
             - When you use information from any of the uploaded materials, include an in-text citation\n\
             - At the VERY END of your response, include a \"References\" section\n\
             - For each source you cited, list it in APA7 format using the provided URL\n\
             - APA7 web format: Author (if known). (Year). Title. Retrieved from URL\n\
             - If author/date unknown, use the title and (n.d.)\n\
             - YOU MUST include the References section - do not skip it\n\n\
             SOURCE URLS FOR UPLOADED MATERIALS (include in References if you cite from them):\n",
        );
        for citation in &self.entries {
            out.push_str(&format!("- \"{}\": {}\n", citation.filename, citation.url));
        }
        out.push_str(
            "\nIf you reference content from any of these materials, \
             include the URL in your References section at the end.",
        );
        Some(out)
    }
}
