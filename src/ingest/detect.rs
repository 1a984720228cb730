//! Media-kind sniffing from declared content type and filename suffix.
//!
//! The declared type wins when it is recognized; otherwise the filename
//! suffix decides. Content bytes are never inspected.

use crate::ingest::model::MediaKind;

/// Detect the media kind from an HTTP Content-Type value.
pub fn detect_from_content_type(content_type: &str) -> Option<MediaKind> {
    let ct = content_type.to_lowercase();
    if ct.contains("application/pdf") {
        Some(MediaKind::Pdf)
    } else if ct.contains("text/plain") {
        Some(MediaKind::PlainText)
    } else if ct.contains("text/html") || ct.contains("application/xhtml") {
        Some(MediaKind::Markup)
    } else {
        None
    }
}

/// Detect the media kind from a filename extension.
pub fn detect_from_filename(name: &str) -> Option<MediaKind> {
    let lower = name.to_lowercase();
    if lower.ends_with(".pdf") {
        Some(MediaKind::Pdf)
    } else if lower.ends_with(".txt") {
        Some(MediaKind::PlainText)
    } else if lower.ends_with(".html") || lower.ends_with(".htm") {
        Some(MediaKind::Markup)
    } else {
        None
    }
}

/// Combined sniffing; anything unrecognized is [`MediaKind::Unsupported`].
pub fn detect_media_kind(content_type: &str, name: &str) -> MediaKind {
    detect_from_content_type(content_type)
        .or_else(|| detect_from_filename(name))
        .unwrap_or(MediaKind::Unsupported)
}

/// Media type to declare for a kind when the upload did not carry one.
pub fn default_media_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Pdf => "application/pdf",
        MediaKind::PlainText => "text/plain",
        MediaKind::Markup => "text/html",
        MediaKind::Unsupported => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_by_suffix() {
        assert_eq!(detect_from_filename("paper.PDF"), Some(MediaKind::Pdf));
        assert_eq!(detect_from_filename("notes.txt"), Some(MediaKind::PlainText));
        assert_eq!(detect_from_filename("page.htm"), Some(MediaKind::Markup));
        assert_eq!(detect_from_filename("slides.docx"), None);
    }

    #[test]
    fn detect_by_content_type() {
        assert_eq!(
            detect_from_content_type("text/html; charset=utf-8"),
            Some(MediaKind::Markup)
        );
        assert_eq!(
            detect_from_content_type("application/pdf"),
            Some(MediaKind::Pdf)
        );
        assert_eq!(detect_from_content_type("image/png"), None);
    }

    #[test]
    fn declared_type_wins_over_suffix() {
        assert_eq!(detect_media_kind("text/plain", "page.html"), MediaKind::PlainText);
        assert_eq!(
            detect_media_kind("application/octet-stream", "page.html"),
            MediaKind::Markup
        );
    }

    #[test]
    fn unknown_is_unsupported() {
        assert_eq!(
            detect_media_kind("application/msword", "essay.doc"),
            MediaKind::Unsupported
        );
        assert_eq!(detect_media_kind("", ""), MediaKind::Unsupported);
    }
}
